//! `lexdesk check` command implementation.
//!
//! Loads and validates the configuration, then prints the resolved settings
//! with secrets redacted, followed by any warnings.

use anyhow::Result;
use lexdesk_core::{DatabaseBackend, LexdeskConfig};
use serde::Serialize;
use std::path::Path;

use super::load_config;

// ============================================================================
// Report Types
// ============================================================================

/// Resolved settings, safe to print.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub config_file: String,
    pub project: Option<String>,
    pub backend: DatabaseBackend,
    pub database: String,
    pub run_migrations: bool,
    pub bind_address: String,
    pub stats_source: lexdesk_core::StatsSourceKind,
    pub cache_ttl_seconds: u64,
    pub session_ttl_hours: i64,
    pub secure_cookie: bool,
    pub bootstrap_admin: Option<String>,
    pub log_level: String,
    pub log_format: lexdesk_core::LogFormat,
    pub warnings: Vec<String>,
}

impl CheckReport {
    pub fn new(path: &Path, config: &LexdeskConfig) -> Self {
        Self {
            config_file: path.display().to_string(),
            project: config.project.clone(),
            backend: config.database.backend,
            database: config.database.redacted_target(),
            run_migrations: config.database.run_migrations,
            bind_address: config.dashboard.bind_address(),
            stats_source: config.dashboard.stats_source,
            cache_ttl_seconds: config.dashboard.cache_ttl_seconds,
            session_ttl_hours: config.auth.session_ttl_hours,
            secure_cookie: config.auth.secure_cookie,
            bootstrap_admin: config.auth.bootstrap_admin.as_ref().map(|a| a.email.clone()),
            log_level: config.observability.log_level.clone(),
            log_format: config.observability.log_format,
            warnings: warnings(config),
        }
    }
}

/// Settings that load fine but will likely bite at runtime.
fn warnings(config: &LexdeskConfig) -> Vec<String> {
    let mut out = Vec::new();

    match &config.auth.bootstrap_admin {
        Some(admin) if admin.get_password().is_none() => out.push(format!(
            "bootstrap admin '{}' has no password; `lexdesk serve` will refuse to start",
            admin.email
        )),
        Some(_) => {}
        None => out.push(
            "no bootstrap admin configured; create one with `lexdesk user add --role admin`"
                .to_string(),
        ),
    }

    if config.database.backend == DatabaseBackend::Memory {
        out.push("memory backend: all data is lost when the server stops".to_string());
    }

    let loopback = matches!(config.dashboard.host.as_str(), "127.0.0.1" | "localhost" | "::1");
    if !loopback && !config.auth.secure_cookie {
        out.push(format!(
            "dashboard listens on {} without auth.secure_cookie",
            config.dashboard.host
        ));
    }

    out
}

/// Wire name of a config enum, as written in `lexdesk.yaml`.
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "?".to_string(),
    }
}

// ============================================================================
// Command
// ============================================================================

/// Run the `lexdesk check` command.
pub fn run(path: &Path, json: bool) -> Result<()> {
    let config = load_config(path)?;
    let report = CheckReport::new(path, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🔍 Checking {}", report.config_file);
    println!("   ✓ Configuration is valid");
    println!();
    if let Some(project) = &report.project {
        println!("   Project:        {}", project);
    }
    println!("   Store:          {} ({})", label(&report.backend), report.database);
    println!("   Migrations:     {}", if report.run_migrations { "on serve" } else { "manual" });
    println!("   Listen:         http://{}", report.bind_address);
    println!("   Stats source:   {}", label(&report.stats_source));
    println!("   Cache TTL:      {}s", report.cache_ttl_seconds);
    println!("   Session TTL:    {}h", report.session_ttl_hours);
    println!(
        "   Bootstrap admin: {}",
        report.bootstrap_admin.as_deref().unwrap_or("none")
    );
    println!("   Logging:        {} ({})", report.log_level, label(&report.log_format));

    if !report.warnings.is_empty() {
        println!();
        for warning in &report.warnings {
            println!("⚠️  {}", warning);
        }
    }
    Ok(())
}
