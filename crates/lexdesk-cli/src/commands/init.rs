//! `lexdesk init` command implementation.
//!
//! Writes a starter `lexdesk.yaml` with every section filled in.

use anyhow::{Context, Result};
use lexdesk_core::config::STARTER_CONFIG;
use std::fs;
use std::path::Path;

/// Run the `lexdesk init` command.
pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() {
        if !force {
            anyhow::bail!(
                "Configuration file '{}' already exists. Use --force to overwrite.",
                path.display()
            );
        }
        println!("⚠️  Overwriting existing configuration...");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Wrote {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point database.database_url_env at your Postgres instance");
    println!("  2. export LEXDESK_ADMIN_PASSWORD=...");
    println!("  3. lexdesk migrate && lexdesk serve");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_core::LexdeskConfig;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_a_valid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("lexdesk.yaml");
        run(&path, false).unwrap();

        let config = LexdeskConfig::from_file(&path).unwrap();
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.auth.cookie_name, "lexdesk.sid");
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lexdesk.yaml");
        fs::write(&path, "project: mine\n").unwrap();

        let err = run(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "project: mine\n");

        run(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
    }
}
