//! CLI command implementations for the Lexdesk console.

pub mod check;
pub mod init;
pub mod migrate;
pub mod serve;
pub mod user;

use anyhow::{Context, Result};
use lexdesk_core::LexdeskConfig;
use lexdesk_core::config::DEFAULT_CONFIG_FILE;
use std::path::Path;

/// Load `path`, falling back to the defaults when the default file is absent.
pub fn load_config(path: &Path) -> Result<LexdeskConfig> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
        eprintln!(
            "⚠️  {} not found, using built-in defaults (run `lexdesk init` to create one)",
            DEFAULT_CONFIG_FILE
        );
        return Ok(LexdeskConfig::default());
    }
    LexdeskConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
