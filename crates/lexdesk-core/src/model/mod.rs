//! Entity model for the legal practice console.
//!
//! Every table row is a [`Record`]. A record knows its insert shape (what a
//! client may submit on create), its patch shape (partial update), the column
//! values used to persist it, and the foreign keys it holds. Both storage
//! backends are written against this trait only.

mod client;
mod contract;
mod document;
mod enums;
mod project;
mod query;
mod session;
mod transaction;
mod user;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::error::ValidationError;
use crate::validate::Validate;

pub use client::{Client, ClientPatch, NewClient};
pub use contract::{
    Contract, ContractClause, ContractClausePatch, ContractPatch, ContractTemplate,
    ContractTemplatePatch, NewContract, NewContractClause, NewContractTemplate,
};
pub use document::{Document, DocumentPatch, NewDocument};
pub use enums::{
    ClientType, ContractStatus, DocumentStatus, ProjectStatus, TransactionType, UserRole,
};
pub use project::{NewProject, Project, ProjectPatch};
pub use query::{FilterValues, Filters, ListQuery};
pub use session::{Session, SessionData};
pub use transaction::{NewTransaction, Transaction, TransactionPatch};
pub use user::{NewUser, User, UserPatch};

/// The entities held by the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Client,
    Contract,
    ContractTemplate,
    ContractClause,
    Project,
    Transaction,
    Document,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Client,
        EntityKind::Contract,
        EntityKind::ContractTemplate,
        EntityKind::ContractClause,
        EntityKind::Project,
        EntityKind::Transaction,
        EntityKind::Document,
    ];

    /// Table name in the relational schema.
    pub fn table(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Client => "clients",
            Self::Contract => "contracts",
            Self::ContractTemplate => "contract_templates",
            Self::ContractClause => "contract_clauses",
            Self::Project => "projects",
            Self::Transaction => "transactions",
            Self::Document => "documents",
        }
    }

    /// Path segment used by the JSON API (`/api/{segment}`).
    pub fn segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Client => "clients",
            Self::Contract => "contracts",
            Self::ContractTemplate => "contract-templates",
            Self::ContractClause => "contract-clauses",
            Self::Project => "projects",
            Self::Transaction => "transactions",
            Self::Document => "documents",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.segment() == segment)
    }

    /// Human-readable singular name.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Client => "client",
            Self::Contract => "contract",
            Self::ContractTemplate => "contract template",
            Self::ContractClause => "contract clause",
            Self::Project => "project",
            Self::Transaction => "transaction",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A foreign key value held by a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Column holding the key (e.g. `client_id`).
    pub column: &'static str,
    /// Entity the key points at.
    pub target: EntityKind,
    /// Referenced primary key.
    pub id: String,
}

impl Reference {
    fn optional(column: &'static str, target: EntityKind, id: &Option<String>) -> Option<Self> {
        id.as_ref().map(|id| Self {
            column,
            target,
            id: id.clone(),
        })
    }
}

/// A column value ready to be bound into a SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    /// Value of a Postgres enum type (type name, wire value).
    Enum(&'static str, Option<&'static str>),
    Decimal(Option<Decimal>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
}

impl FieldValue {
    /// SQL cast required when binding this value as text.
    pub fn cast(&self) -> Option<&'static str> {
        match self {
            Self::Enum(type_name, _) => Some(type_name),
            _ => None,
        }
    }

    fn text(value: &Option<String>) -> Self {
        Self::Text(value.clone())
    }
}

/// A row of one of the console's tables.
pub trait Record:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Create payload. Omits the id, timestamps and the owner column.
    type Insert: Validate + DeserializeOwned + Serialize + Send + Sync;
    /// Partial update payload.
    type Patch: Validate + DeserializeOwned + Serialize + Default + Send + Sync;

    const KIND: EntityKind;

    /// Payload name of the creator/uploader column. Owned records cannot be
    /// stored without it.
    const OWNER_FIELD: Option<&'static str> = None;

    /// Enumerated payload fields and their allowed values.
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] = &[];

    /// Whether the table refreshes an `updated_at` column.
    const HAS_UPDATED_AT: bool = true;

    /// Which list filters the table supports.
    const FILTERS: Filters = Filters::NONE;

    fn id(&self) -> &str;

    /// Build a row from a validated insert payload, applying column defaults.
    fn from_insert(id: String, input: Self::Insert, owner: Option<&str>, now: DateTime<Utc>)
    -> Self;

    /// Apply a partial update and refresh `updated_at`.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// Every column of the row, `id` first.
    fn columns(&self) -> Vec<(&'static str, FieldValue)>;

    /// Columns touched by a patch (without `updated_at`).
    fn patch_columns(patch: &Self::Patch) -> Vec<(&'static str, FieldValue)>;

    /// Foreign keys present on the row.
    fn references(&self) -> Vec<Reference>;

    /// Values used to evaluate a [`ListQuery`] in memory.
    fn filter_values(&self) -> FilterValues<'_>;
}

/// Reject a create that names no owner for a record that requires one.
pub fn require_owner<R: Record>(owner: Option<&str>) -> Result<(), ValidationError> {
    match (R::OWNER_FIELD, owner.map(str::trim)) {
        (Some(field), None | Some("")) => Err(ValidationError::MissingField(field.to_string())),
        _ => Ok(()),
    }
}

/// Foreign keys a patch would introduce.
pub fn patch_references<R: Record>(patch: &R::Patch) -> Vec<Reference> {
    R::patch_columns(patch)
        .into_iter()
        .filter_map(|(column, value)| {
            let target = match column {
                "client_id" => EntityKind::Client,
                "project_id" => EntityKind::Project,
                "contract_id" => EntityKind::Contract,
                "assigned_to" | "created_by" | "uploaded_by" => EntityKind::User,
                _ => return None,
            };
            match value {
                FieldValue::Text(Some(id)) => Some(Reference { column, target, id }),
                _ => None,
            }
        })
        .collect()
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_records_need_an_owner() {
        assert_eq!(
            require_owner::<Contract>(None),
            Err(ValidationError::MissingField("createdBy".to_string()))
        );
        assert_eq!(
            require_owner::<Document>(Some(" ")),
            Err(ValidationError::MissingField("uploadedBy".to_string()))
        );
        assert!(require_owner::<Transaction>(Some("u1")).is_ok());
        assert!(require_owner::<Client>(None).is_ok());
        assert!(require_owner::<User>(None).is_ok());
    }

    #[test]
    fn segments_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_segment(kind.segment()), Some(kind));
        }
        assert_eq!(EntityKind::from_segment("suppliers"), None);
    }

    #[test]
    fn patch_references_only_lists_set_keys() {
        let patch = ProjectPatch {
            client_id: Some(Some("c1".to_string())),
            assigned_to: Some(None),
            ..Default::default()
        };
        let refs = patch_references::<Project>(&patch);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, EntityKind::Client);
        assert_eq!(refs[0].id, "c1");
    }
}
