//! # lexdesk-core
//!
//! Shared types for the Lexdesk legal practice console.
//!
//! - [`model`]: entity rows, insert and patch payloads, closed enumerations
//! - [`validate`]: JSON payload parsing with field-level errors
//! - [`money`]: fixed-precision money helpers and dashboard formatting
//! - [`config`]: `lexdesk.yaml` configuration types

pub mod config;
pub mod error;
pub mod model;
pub mod money;
pub mod validate;

pub use config::{
    AuthConfig, BootstrapAdmin, ConfigError, DashboardConfig, DatabaseBackend, DatabaseConfig,
    LexdeskConfig, LogFormat, ObservabilityConfig, StatsSourceKind,
};
pub use error::ValidationError;
pub use model::{
    Client, ClientPatch, ClientType, Contract, ContractClause, ContractClausePatch,
    ContractPatch, ContractStatus, ContractTemplate, ContractTemplatePatch, Document,
    DocumentPatch, DocumentStatus, EntityKind, FieldValue, ListQuery, NewClient, NewContract,
    NewContractClause, NewContractTemplate, NewDocument, NewProject, NewTransaction, NewUser,
    Project, ProjectPatch, ProjectStatus, Record, Reference, Session, SessionData, Transaction,
    TransactionPatch, TransactionType, User, UserPatch, UserRole,
};
pub use validate::{Validate, parse_insert, parse_patch};

/// Generate a new primary key, matching the `gen_random_uuid()` column default.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
