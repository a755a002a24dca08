use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityKind, FieldValue, FilterValues, Filters, ProjectStatus, Record, Reference, apply};
use crate::error::ValidationError;
use crate::validate::{Validate, datetime, double_option, require_text};

/// A matter or case the office is working on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default, with = "datetime::opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "datetime::opt")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl Validate for NewProject {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, with = "datetime::patch", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "datetime::patch", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
}

impl Validate for ProjectPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => require_text("name", name),
            None => Ok(()),
        }
    }
}

impl Record for Project {
    type Insert = NewProject;
    type Patch = ProjectPatch;

    const KIND: EntityKind = EntityKind::Project;
    const OWNER_FIELD: Option<&'static str> = Some("createdBy");
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] =
        &[("status", ProjectStatus::VALUES)];
    const FILTERS: Filters = Filters {
        status: Some("status"),
        client: true,
        ..Filters::NONE
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(id: String, input: NewProject, owner: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            client_id: input.client_id,
            status: input.status.unwrap_or_default(),
            start_date: input.start_date,
            end_date: input.end_date,
            assigned_to: input.assigned_to,
            created_by: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        apply(&mut self.name, patch.name);
        apply(&mut self.description, patch.description);
        apply(&mut self.client_id, patch.client_id);
        apply(&mut self.status, patch.status);
        apply(&mut self.start_date, patch.start_date);
        apply(&mut self.end_date, patch.end_date);
        apply(&mut self.assigned_to, patch.assigned_to);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("name", FieldValue::Text(Some(self.name.clone()))),
            ("description", FieldValue::text(&self.description)),
            ("client_id", FieldValue::text(&self.client_id)),
            ("status", FieldValue::Enum(ProjectStatus::TYPE_NAME, Some(self.status.as_str()))),
            ("start_date", FieldValue::Timestamp(self.start_date)),
            ("end_date", FieldValue::Timestamp(self.end_date)),
            ("assigned_to", FieldValue::text(&self.assigned_to)),
            ("created_by", FieldValue::text(&self.created_by)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &ProjectPatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.name {
            cols.push(("name", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.description {
            cols.push(("description", FieldValue::text(v)));
        }
        if let Some(v) = &patch.client_id {
            cols.push(("client_id", FieldValue::text(v)));
        }
        if let Some(s) = patch.status {
            cols.push(("status", FieldValue::Enum(ProjectStatus::TYPE_NAME, Some(s.as_str()))));
        }
        if let Some(v) = patch.start_date {
            cols.push(("start_date", FieldValue::Timestamp(v)));
        }
        if let Some(v) = patch.end_date {
            cols.push(("end_date", FieldValue::Timestamp(v)));
        }
        if let Some(v) = &patch.assigned_to {
            cols.push(("assigned_to", FieldValue::text(v)));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("client_id", EntityKind::Client, &self.client_id),
            Reference::optional("assigned_to", EntityKind::User, &self.assigned_to),
            Reference::optional("created_by", EntityKind::User, &self.created_by),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            status: Some(self.status.as_str()),
            client_id: self.client_id.as_deref(),
            date: self.created_at,
            ..FilterValues::default()
        }
    }
}
