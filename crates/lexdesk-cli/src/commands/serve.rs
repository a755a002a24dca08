//! `lexdesk serve` command implementation.
//!
//! Builds the store, prepares the schema and the admin account, then serves
//! the console until Ctrl-C.

use anyhow::{Context, Result};
use lexdesk_core::LexdeskConfig;
use lexdesk_dashboard::auth::bootstrap_admin;
use lexdesk_dashboard::{AppState, DashboardServer, spawn_session_purge};
use std::time::Duration;

/// Run the `lexdesk serve` command.
pub async fn run(config: LexdeskConfig) -> Result<()> {
    println!("🚀 Starting Lexdesk");
    if let Some(project) = &config.project {
        println!("   Project: {}", project);
    }

    println!("🔌 Connecting to {}...", config.database.redacted_target());
    let store = lexdesk_store::create_store(&config.database)
        .await
        .context("Database connection failed")?;

    if config.database.run_migrations {
        store.migrate().await.context("Migration failed")?;
        println!("   ✓ Schema is up to date");
    }

    bootstrap_admin(store.as_ref(), &config.auth)
        .await
        .context("Failed to create the bootstrap admin")?;

    let purge = spawn_session_purge(
        store.clone(),
        Duration::from_secs(config.auth.purge_interval_secs),
    );

    let state = AppState::new(config, store);
    let server = DashboardServer::new(state);
    println!("🌐 Listening on http://{}", server.bind_address());
    println!("   Press Ctrl-C to stop");

    let result = server.run(shutdown_signal()).await;
    purge.abort();
    result.context("Dashboard server failed")?;

    println!("👋 Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
    }
    tracing::info!("shutdown requested");
}
