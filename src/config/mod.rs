// Configuration module entry point
// Loads layered configuration: built-in defaults, optional TOML file, FORMECHO_* environment

mod state;
mod types;

use config::builder::{ConfigBuilder, DefaultState};
use config::ConfigError;
use std::net::{IpAddr, SocketAddr};

// Re-export public types
pub use state::AppState;
pub use types::{Config, HealthConfig, LogLevel, LoggingConfig};

/// Environment variable prefix, e.g. `FORMECHO_SERVER__PORT=8080`
const ENV_PREFIX: &str = "FORMECHO";

/// Environment variable naming the config file when no argument is given
pub const CONFIG_PATH_ENV: &str = "FORMECHO_CONFIG";

/// Config file used when neither the first argument nor `FORMECHO_CONFIG` names one
const DEFAULT_CONFIG_PATH: &str = "config";

/// Pick the config file: command-line argument, then `FORMECHO_CONFIG`, then `config`
pub fn resolve_config_path(arg: Option<String>, env: Option<String>) -> String {
    arg.or(env)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Built-in defaults, lowest priority source
fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.max_connection_age", 600)?
        .set_default("performance.shutdown_grace", 10)?
        .set_default("http.server_name", "formecho")?
        .set_default("http.max_body_size", 1_048_576) // 1MB
}

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_settings(settings)
    }

    /// Load configuration from an in-memory TOML document layered over the defaults
    #[cfg(test)]
    pub fn load_from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings = defaults()?
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: config::Config) -> Result<Self, ConfigError> {
        let cfg: Self = settings.try_deserialize()?;
        cfg.get_socket_addr()?;
        if cfg.server.workers == Some(0) {
            return Err(ConfigError::Message(
                "server.workers must be at least 1 (omit it to use one per CPU core)".to_string(),
            ));
        }
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server.host.parse().map_err(|e| {
            ConfigError::Message(format!("Invalid server.host '{}': {e}", self.server.host))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
