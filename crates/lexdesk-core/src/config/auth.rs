//! Session and login configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Lifetime of a session row.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,

    /// Mark the session cookie `Secure` (serve over HTTPS).
    #[serde(default)]
    pub secure_cookie: bool,

    /// How often expired sessions are deleted.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,

    /// Admin account created on startup when no user has that email yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Longest session a config may ask for: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

impl AuthConfig {
    /// Session lifetime, or `None` when `session_ttl_hours` is outside
    /// `1..=MAX_SESSION_TTL_HOURS`.
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return None;
        }
        chrono::Duration::try_hours(self.session_ttl_hours)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            session_ttl_hours: default_session_ttl(),
            secure_cookie: false,
            purge_interval_secs: default_purge_interval(),
            bootstrap_admin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password. Wins over `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

impl BootstrapAdmin {
    pub fn get_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

fn default_cookie_name() -> String {
    "lexdesk.sid".to_string()
}

fn default_session_ttl() -> i64 {
    24 * 7
}

fn default_purge_interval() -> u64 {
    3600
}
