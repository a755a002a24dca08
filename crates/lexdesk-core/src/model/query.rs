//! List filters shared by both storage backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::error::ValidationError;

/// Columns a table can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    /// Enumerated status column (`status`, or `role` for users).
    pub status: Option<&'static str>,
    /// Secondary type column (`type`).
    pub kind: Option<&'static str>,
    pub client: bool,
    pub project: bool,
    pub contract: bool,
    /// Timestamp column used for date windows and ordering.
    pub date: &'static str,
}

impl Filters {
    pub const NONE: Filters = Filters {
        status: None,
        kind: None,
        client: false,
        project: false,
        contract: false,
        date: "created_at",
    };
}

/// Per-row values matched against a [`ListQuery`].
#[derive(Debug, Clone, Default)]
pub struct FilterValues<'a> {
    pub status: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub client_id: Option<&'a str>,
    pub project_id: Option<&'a str>,
    pub contract_id: Option<&'a str>,
    pub date: DateTime<Utc>,
}

/// Filters accepted by list endpoints. Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
    /// Inclusive lower bound on the table's date column.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the table's date column.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl ListQuery {
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Reject filters the entity has no column for, and enum values outside
    /// the column's enumeration.
    pub fn check<R: Record>(&self) -> Result<(), ValidationError> {
        let unsupported = |filter: &str| ValidationError::UnsupportedFilter {
            entity: R::KIND.label().to_string(),
            filter: filter.to_string(),
        };
        let f = R::FILTERS;

        if let Some(status) = &self.status {
            let column = f.status.ok_or_else(|| unsupported("status"))?;
            check_enum::<R>(column, status)?;
        }
        if let Some(kind) = &self.kind {
            let column = f.kind.ok_or_else(|| unsupported("type"))?;
            check_enum::<R>(column, kind)?;
        }
        if self.client_id.is_some() && !f.client {
            return Err(unsupported("clientId"));
        }
        if self.project_id.is_some() && !f.project {
            return Err(unsupported("projectId"));
        }
        if self.contract_id.is_some() && !f.contract {
            return Err(unsupported("contractId"));
        }
        Ok(())
    }

    /// Whether a row passes every filter (pagination excluded).
    pub fn matches(&self, row: &FilterValues<'_>) -> bool {
        fn eq(wanted: &Option<String>, actual: Option<&str>) -> bool {
            wanted.as_deref().is_none_or(|w| actual == Some(w))
        }

        eq(&self.status, row.status)
            && eq(&self.kind, row.kind)
            && eq(&self.client_id, row.client_id)
            && eq(&self.project_id, row.project_id)
            && eq(&self.contract_id, row.contract_id)
            && self.since.is_none_or(|since| row.date >= since)
            && self.until.is_none_or(|until| row.date < until)
    }
}

fn check_enum<R: Record>(column: &str, value: &str) -> Result<(), ValidationError> {
    match R::ENUM_FIELDS.iter().find(|(field, _)| *field == column) {
        Some((field, allowed)) if !allowed.contains(&value) => {
            Err(ValidationError::invalid_enum(field, value, allowed))
        }
        _ => Ok(()),
    }
}
