//! Web console configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Host to bind the console to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Where dashboard statistics come from.
    #[serde(default)]
    pub stats_source: StatsSourceKind,

    /// How long panel and list query results stay cached.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Name shown in the sidebar header.
    #[serde(default = "default_title")]
    pub title: String,
}

/// Dashboard statistics provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsSourceKind {
    /// Aggregate the live tables.
    #[default]
    Store,
    /// Fixed demonstration figures.
    Mock,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stats_source: StatsSourceKind::default(),
            cache_ttl_seconds: default_cache_ttl(),
            title: default_title(),
        }
    }
}

impl DashboardConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_title() -> String {
    "Lexdesk".to_string()
}
