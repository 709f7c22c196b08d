use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "JLIB_DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/jlib-dashboard.toml";
const ENV_PREFIX: &str = "JLIB_DASHBOARD";
const ENV_SEPARATOR: &str = "__";
/// Single-variable form used by older dashboard deployments
const LEGACY_URL_VAR: &str = "JLIB_SERVER_URL";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    apply_legacy_env(&mut config);
    Ok(config)
}

/// `JLIB_SERVER_URL` keeps working for deployments of the old dashboard
fn apply_legacy_env(config: &mut Config) {
    if let Ok(url) = env::var(LEGACY_URL_VAR) {
        if !url.trim().is_empty() {
            tracing::info!(url = %url, "Using inspection server URL from {}", LEGACY_URL_VAR);
            config.upstream.base_url = url;
        }
    }
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // JLIB_DASHBOARD__UPSTREAM__BASE_URL -> upstream.base_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
