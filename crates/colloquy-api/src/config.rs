use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Shared API credential; empty disables the auth check (dev mode).
    /// Loaded from COLLOQUY_API_KEY only, never from TOML.
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/colloquy.db".to_string(),
            pool_size: 5,
        }
    }
}

/// Which inference backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Http,
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    pub engine: EngineKind,
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Simulated,
            base_url: "http://localhost:8080".to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed COLLOQUY__ (double underscore as
    ///    section separator, e.g. COLLOQUY__SERVER__PORT)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("COLLOQUY")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secret from ENV only (not in TOML)
        cfg.api_key = std::env::var("COLLOQUY_API_KEY").unwrap_or_default();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [database]
            url = "sqlite://test.db"
            pool_size = 2

            [inference]
            engine = "simulated"
            base_url = "http://localhost:8080"
            connect_timeout_secs = 5
            read_timeout_secs = 60
            max_tokens = 512
            temperature = 0.5

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.inference.engine, EngineKind::Simulated);
    }

    #[test]
    fn test_config_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.inference.engine, EngineKind::Simulated);
        assert_eq!(config.inference.read_timeout_secs, 120);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_engine_kind_parses_http() {
        let config: Config = toml::from_str(
            r#"
            [inference]
            engine = "http"
            base_url = "http://inference:8080"
            connect_timeout_secs = 10
            read_timeout_secs = 120
            max_tokens = 1000
            temperature = 0.7
        "#,
        )
        .unwrap();
        assert_eq!(config.inference.engine, EngineKind::Http);
    }
}
