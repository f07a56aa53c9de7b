use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub testing: TestingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Content testing switches
#[derive(Debug, Clone, Deserialize)]
pub struct TestingConfig {
    /// Global on/off switch for exposure evaluation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Site name of the authoring surface, never tested
    #[serde(default = "default_shell_site")]
    pub shell_site: String,
    /// Cookie carrying the client assignment token
    #[serde(default = "default_token_cookie")]
    pub token_cookie: String,
}

fn default_enabled() -> bool {
    true
}

fn default_shell_site() -> String {
    "shell".to_string()
}

fn default_token_cookie() -> String {
    "pmp_ct".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            shell_site: default_shell_site(),
            token_cookie: default_token_cookie(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
