//! `lexdesk migrate` command implementation.

use anyhow::{Context, Result};
use lexdesk_core::{DatabaseBackend, LexdeskConfig};

/// Run the `lexdesk migrate` command.
pub async fn run(config: &LexdeskConfig) -> Result<()> {
    if config.database.backend == DatabaseBackend::Memory {
        println!("ℹ️  The memory backend has no schema to migrate.");
        return Ok(());
    }

    println!("🔌 Connecting to {}...", config.database.redacted_target());
    let store = lexdesk_store::create_store(&config.database)
        .await
        .context("Database connection failed")?;

    println!("📦 Applying migrations...");
    store.migrate().await.context("Migration failed")?;
    println!("   ✓ Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_is_a_no_op() {
        let mut config = LexdeskConfig::default();
        config.database.backend = DatabaseBackend::Memory;
        run(&config).await.unwrap();
    }
}
