use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "jlib-dashboard")]
#[command(about = "JLib monitoring dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dashboard HTTP and WebSocket server
    Server(ServerArgs),
    /// Validate configuration and print the effective values
    CheckConfig,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Inspection server base URL (overrides upstream.base_url)
    #[arg(long)]
    pub upstream: Option<String>,
}
