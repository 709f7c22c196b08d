use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::Dashboard;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(config: Config, dashboard: Arc<Dashboard>) -> Self {
        Self {
            config: Arc::new(config),
            dashboard,
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.config.server.max_body_bytes.as_usize()
    }
}
