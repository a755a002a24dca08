//! `lexdesk user` command implementation.

use anyhow::{Context, Result};
use lexdesk_core::{LexdeskConfig, NewUser, UserRole};
use lexdesk_dashboard::auth::register_user;

/// Arguments of `lexdesk user add`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewAccount {
    fn into_parts(self) -> Result<(NewUser, String)> {
        let role: UserRole = self.role.parse()?;
        let user = NewUser {
            email: Some(self.email),
            first_name: self.first_name,
            last_name: self.last_name,
            role: Some(role),
            ..Default::default()
        };
        Ok((user, self.password))
    }
}

/// Run `lexdesk user add`.
pub async fn add(config: &LexdeskConfig, account: NewAccount) -> Result<()> {
    let (input, password) = account.into_parts()?;

    let store = lexdesk_store::create_store(&config.database)
        .await
        .context("Database connection failed")?;
    if config.database.run_migrations {
        store.migrate().await.context("Migration failed")?;
    }

    let user = register_user(store.as_ref(), input, &password)
        .await
        .context("Failed to create user")?;

    println!("✅ Created user {}", user.id);
    println!("   Email: {}", user.email.as_deref().unwrap_or("-"));
    println!("   Role:  {}", user.role);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: &str) -> NewAccount {
        NewAccount {
            email: "ana@example.com".into(),
            password: "senha123".into(),
            role: role.into(),
            first_name: Some("Ana".into()),
            last_name: None,
        }
    }

    #[test]
    fn test_role_is_parsed() {
        let (user, password) = account("lawyer").into_parts().unwrap();
        assert_eq!(user.role, Some(UserRole::Lawyer));
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(password, "senha123");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = account("partner").into_parts().unwrap_err();
        assert!(err.to_string().contains("partner"));
    }

    #[tokio::test]
    async fn test_add_against_memory_store() {
        let mut config = LexdeskConfig::default();
        config.database.backend = lexdesk_core::DatabaseBackend::Memory;
        add(&config, account("admin")).await.unwrap();
    }
}
