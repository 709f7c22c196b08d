pub mod api;
pub mod config;
pub mod dashboard;
pub mod humanize;
pub mod observability;
pub mod upstream;
