//! # lexdesk-store
//!
//! Persistence for the Lexdesk console.
//!
//! The [`Store`] trait hands out one [`Repository`] per entity plus the
//! session and credential tables. Two backends implement it:
//!
//! - [`PgStore`]: Postgres through `sqlx`, schema in `migrations/`
//! - [`MemoryStore`]: process-local tables enforcing the same key rules
//!
//! [`create_store`] picks one from configuration.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexdesk_core::{
    Client, Contract, ContractClause, ContractTemplate, DatabaseBackend, DatabaseConfig, Document,
    ListQuery, Project, Record, Session, Transaction, User,
};
use std::sync::Arc;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// CRUD over one table.
#[async_trait]
pub trait Repository<R: Record>: Send + Sync {
    /// Rows matching `query`, newest first.
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<R>, StoreError>;

    /// Insert a validated payload. `owner` fills the creator/uploader column.
    async fn create(&self, input: R::Insert, owner: Option<&str>) -> Result<R, StoreError>;

    /// Apply a partial update and return the new row.
    async fn update(&self, id: &str, patch: R::Patch) -> Result<R, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Number of rows matching `query`, ignoring limit and offset.
    async fn count(&self, query: &ListQuery) -> Result<u64, StoreError>;
}

/// The `sessions` table.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> Result<(), StoreError>;

    /// The session if it exists and has not expired at `now`.
    async fn get(&self, sid: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError>;

    async fn delete(&self, sid: &str) -> Result<(), StoreError>;

    /// Delete sessions that expired before `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Password hashes, one per user.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StoreError>;

    async fn password_hash(&self, user_id: &str) -> Result<Option<String>, StoreError>;
}

/// Every table of the console.
#[async_trait]
pub trait Store: Send + Sync {
    fn users(&self) -> &dyn Repository<User>;
    fn clients(&self) -> &dyn Repository<Client>;
    fn contracts(&self) -> &dyn Repository<Contract>;
    fn contract_templates(&self) -> &dyn Repository<ContractTemplate>;
    fn contract_clauses(&self) -> &dyn Repository<ContractClause>;
    fn projects(&self) -> &dyn Repository<Project>;
    fn transactions(&self) -> &dyn Repository<Transaction>;
    fn documents(&self) -> &dyn Repository<Document>;
    fn sessions(&self) -> &dyn SessionStore;
    fn credentials(&self) -> &dyn CredentialStore;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Bring the schema up to date. A no-op for the memory backend.
    async fn migrate(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Entities that have a repository in every [`Store`].
pub trait Stored: Record {
    fn repository(store: &dyn Store) -> &dyn Repository<Self>;
}

macro_rules! stored {
    ($($entity:ty => $accessor:ident),+ $(,)?) => {
        $(
            impl Stored for $entity {
                fn repository(store: &dyn Store) -> &dyn Repository<Self> {
                    store.$accessor()
                }
            }
        )+
    };
}

stored! {
    User => users,
    Client => clients,
    Contract => contracts,
    ContractTemplate => contract_templates,
    ContractClause => contract_clauses,
    Project => projects,
    Transaction => transactions,
    Document => documents,
}

/// Build the store selected by `database.backend`.
pub async fn create_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.backend {
        DatabaseBackend::Postgres => Ok(Arc::new(PgStore::connect(config).await?)),
        DatabaseBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
