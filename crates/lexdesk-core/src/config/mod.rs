//! Configuration for the Lexdesk console.
//!
//! Everything lives in a single `lexdesk.yaml`:
//!
//! - `database`: store backend and Postgres connection
//! - `dashboard`: bind address, stats source and query cache
//! - `auth`: session cookie and bootstrap admin
//! - `observability`: log level and format
//!
//! Secrets can be referenced through `*_env` fields instead of being written
//! into the file.

pub mod auth;
pub mod dashboard;
pub mod database;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use auth::{AuthConfig, BootstrapAdmin, MAX_SESSION_TTL_HOURS};
pub use dashboard::{DashboardConfig, StatsSourceKind};
pub use database::{DatabaseBackend, DatabaseConfig, PoolConfig, SslMode};

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "lexdesk.yaml";

/// Starter file written by `lexdesk init`.
pub const STARTER_CONFIG: &str = r#"# Lexdesk configuration
project: my-office

database:
  backend: postgres        # or memory
  database_url_env: DATABASE_URL
  host: localhost
  port: 5432
  database: lexdesk
  username: postgres
  password_env: PGPASSWORD
  pool:
    max_connections: 10
    acquire_timeout_seconds: 30

dashboard:
  host: 127.0.0.1
  port: 5000
  stats_source: store      # or mock
  cache_ttl_seconds: 60

auth:
  cookie_name: lexdesk.sid
  session_ttl_hours: 168
  secure_cookie: false
  purge_interval_secs: 3600
  bootstrap_admin:
    email: admin@example.com
    password_env: LEXDESK_ADMIN_PASSWORD

observability:
  log_level: info
  log_format: text         # or json
"#;

/// Complete Lexdesk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexdeskConfig {
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LexdeskConfig {
    /// Load and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.port == 0 {
            return Err(ConfigError::Config("dashboard.port must not be 0".into()));
        }
        if self.auth.session_ttl().is_none() {
            return Err(ConfigError::Config(format!(
                "auth.session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
            )));
        }
        if self.auth.purge_interval_secs == 0 {
            return Err(ConfigError::Config(
                "auth.purge_interval_secs must be positive".into(),
            ));
        }
        if self.auth.cookie_name.trim().is_empty() {
            return Err(ConfigError::Config("auth.cookie_name must not be empty".into()));
        }
        if self.database.pool.max_connections == 0 {
            return Err(ConfigError::Config(
                "database.pool.max_connections must be positive".into(),
            ));
        }
        if let Some(admin) = &self.auth.bootstrap_admin
            && !admin.email.contains('@')
        {
            return Err(ConfigError::Config(format!(
                "auth.bootstrap_admin.email '{}' is not an email address",
                admin.email
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = LexdeskConfig::from_yaml("{}").unwrap();
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.dashboard.stats_source, StatsSourceKind::Store);
        assert_eq!(config.auth.cookie_name, "lexdesk.sid");
        assert_eq!(config.auth.session_ttl_hours, 168);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.observability.log_format, LogFormat::Text);
    }

    #[test]
    fn starter_config_parses() {
        let config = LexdeskConfig::from_yaml(STARTER_CONFIG).unwrap();
        assert_eq!(config.project.as_deref(), Some("my-office"));
        assert_eq!(
            config.auth.bootstrap_admin.map(|a| a.email),
            Some("admin@example.com".to_string())
        );
    }

    #[test]
    fn memory_backend_and_mock_stats() {
        let yaml = "database:\n  backend: memory\ndashboard:\n  stats_source: mock\n";
        let config = LexdeskConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.dashboard.stats_source, StatsSourceKind::Mock);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            LexdeskConfig::from_yaml("auth:\n  session_ttl_hours: 0\n"),
            Err(ConfigError::Config(_))
        ));
        assert!(matches!(
            LexdeskConfig::from_yaml("auth:\n  session_ttl_hours: -5\n"),
            Err(ConfigError::Config(_))
        ));
        assert!(matches!(
            LexdeskConfig::from_yaml("dashboard:\n  stats_source: random\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn session_ttl_is_capped() {
        let huge = format!("auth:\n  session_ttl_hours: {}\n", i64::MAX);
        assert!(matches!(LexdeskConfig::from_yaml(&huge), Err(ConfigError::Config(_))));

        let over = format!("auth:\n  session_ttl_hours: {}\n", MAX_SESSION_TTL_HOURS + 1);
        assert!(LexdeskConfig::from_yaml(&over).is_err());

        let year = format!("auth:\n  session_ttl_hours: {MAX_SESSION_TTL_HOURS}\n");
        let config = LexdeskConfig::from_yaml(&year).unwrap();
        assert_eq!(
            config.auth.session_ttl(),
            Some(chrono::Duration::hours(MAX_SESSION_TTL_HOURS))
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dashboard:\n  port: 8088").unwrap();
        let config = LexdeskConfig::from_file(file.path()).unwrap();
        assert_eq!(config.dashboard.bind_address(), "127.0.0.1:8088");
    }
}
