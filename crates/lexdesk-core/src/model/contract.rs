//! Contracts and the reusable material they are drafted from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    ContractStatus, EntityKind, FieldValue, FilterValues, Filters, Record, Reference, apply,
};
use crate::error::ValidationError;
use crate::money;
use crate::validate::{Validate, datetime, double_option, flag, require_text};

/// An agreement with a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "money::deserialize_opt")]
    pub value: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: ContractStatus,
    /// Full contract text.
    pub content: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default, with = "datetime::opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "datetime::opt")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<ContractStatus>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Validate for NewContract {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        if let Some(value) = &self.value {
            money::check("value", value)?;
        }
        check_range(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub value: Option<Option<Decimal>>,
    #[serde(default, with = "datetime::patch", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "datetime::patch", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
}

impl Validate for ContractPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(Some(value)) = &self.value {
            money::check("value", value)?;
        }
        check_range(self.start_date.flatten(), self.end_date.flatten())
    }
}

fn check_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::invalid(
            "endDate",
            "must not be before startDate",
        )),
        _ => Ok(()),
    }
}

impl Record for Contract {
    type Insert = NewContract;
    type Patch = ContractPatch;

    const KIND: EntityKind = EntityKind::Contract;
    const OWNER_FIELD: Option<&'static str> = Some("createdBy");
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] =
        &[("status", ContractStatus::VALUES)];
    const FILTERS: Filters = Filters {
        status: Some("status"),
        client: true,
        ..Filters::NONE
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(id: String, input: NewContract, owner: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            client_id: input.client_id,
            value: input.value.map(money::normalize),
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status.unwrap_or_default(),
            content: input.content,
            created_by: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ContractPatch, now: DateTime<Utc>) {
        apply(&mut self.title, patch.title);
        apply(&mut self.description, patch.description);
        apply(&mut self.client_id, patch.client_id);
        apply(&mut self.value, patch.value.map(|v| v.map(money::normalize)));
        apply(&mut self.start_date, patch.start_date);
        apply(&mut self.end_date, patch.end_date);
        apply(&mut self.status, patch.status);
        apply(&mut self.content, patch.content);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("title", FieldValue::Text(Some(self.title.clone()))),
            ("description", FieldValue::text(&self.description)),
            ("client_id", FieldValue::text(&self.client_id)),
            ("value", FieldValue::Decimal(self.value)),
            ("start_date", FieldValue::Timestamp(self.start_date)),
            ("end_date", FieldValue::Timestamp(self.end_date)),
            ("status", FieldValue::Enum(ContractStatus::TYPE_NAME, Some(self.status.as_str()))),
            ("content", FieldValue::text(&self.content)),
            ("created_by", FieldValue::text(&self.created_by)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &ContractPatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.title {
            cols.push(("title", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.description {
            cols.push(("description", FieldValue::text(v)));
        }
        if let Some(v) = &patch.client_id {
            cols.push(("client_id", FieldValue::text(v)));
        }
        if let Some(v) = patch.value {
            cols.push(("value", FieldValue::Decimal(v.map(money::normalize))));
        }
        if let Some(v) = patch.start_date {
            cols.push(("start_date", FieldValue::Timestamp(v)));
        }
        if let Some(v) = patch.end_date {
            cols.push(("end_date", FieldValue::Timestamp(v)));
        }
        if let Some(s) = patch.status {
            cols.push(("status", FieldValue::Enum(ContractStatus::TYPE_NAME, Some(s.as_str()))));
        }
        if let Some(v) = &patch.content {
            cols.push(("content", FieldValue::text(v)));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("client_id", EntityKind::Client, &self.client_id),
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

/// A reusable contract draft ("minuta").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTemplate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContractTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "flag::opt")]
    pub is_active: Option<bool>,
}

impl Validate for NewContractTemplate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("content", &self.content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTemplatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, with = "flag::opt", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for ContractTemplatePatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(content) = &self.content {
            require_text("content", content)?;
        }
        Ok(())
    }
}

impl Record for ContractTemplate {
    type Insert = NewContractTemplate;
    type Patch = ContractTemplatePatch;

    const KIND: EntityKind = EntityKind::ContractTemplate;
    const OWNER_FIELD: Option<&'static str> = Some("createdBy");

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(
        id: String,
        input: NewContractTemplate,
        owner: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            content: input.content,
            category: input.category,
            is_active: input.is_active.unwrap_or(true),
            created_by: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ContractTemplatePatch, now: DateTime<Utc>) {
        apply(&mut self.name, patch.name);
        apply(&mut self.description, patch.description);
        apply(&mut self.content, patch.content);
        apply(&mut self.category, patch.category);
        apply(&mut self.is_active, patch.is_active);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("name", FieldValue::Text(Some(self.name.clone()))),
            ("description", FieldValue::text(&self.description)),
            ("content", FieldValue::Text(Some(self.content.clone()))),
            ("category", FieldValue::text(&self.category)),
            ("is_active", FieldValue::Bool(Some(self.is_active))),
            ("created_by", FieldValue::text(&self.created_by)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &ContractTemplatePatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.name {
            cols.push(("name", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.description {
            cols.push(("description", FieldValue::text(v)));
        }
        if let Some(v) = &patch.content {
            cols.push(("content", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.category {
            cols.push(("category", FieldValue::text(v)));
        }
        if let Some(v) = patch.is_active {
            cols.push(("is_active", FieldValue::Bool(Some(v))));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        Reference::optional("created_by", EntityKind::User, &self.created_by)
            .into_iter()
            .collect()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            date: self.created_at,
            ..FilterValues::default()
        }
    }
}

/// A standard clause that can be pasted into contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractClause {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContractClause {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "flag::opt")]
    pub is_active: Option<bool>,
}

impl Validate for NewContractClause {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractClausePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, with = "flag::opt", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for ContractClausePatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(content) = &self.content {
            require_text("content", content)?;
        }
        Ok(())
    }
}

impl Record for ContractClause {
    type Insert = NewContractClause;
    type Patch = ContractClausePatch;

    const KIND: EntityKind = EntityKind::ContractClause;
    const OWNER_FIELD: Option<&'static str> = Some("createdBy");

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(
        id: String,
        input: NewContractClause,
        owner: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: input.title,
            content: input.content,
            category: input.category,
            is_active: input.is_active.unwrap_or(true),
            created_by: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ContractClausePatch, now: DateTime<Utc>) {
        apply(&mut self.title, patch.title);
        apply(&mut self.content, patch.content);
        apply(&mut self.category, patch.category);
        apply(&mut self.is_active, patch.is_active);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("title", FieldValue::Text(Some(self.title.clone()))),
            ("content", FieldValue::Text(Some(self.content.clone()))),
            ("category", FieldValue::text(&self.category)),
            ("is_active", FieldValue::Bool(Some(self.is_active))),
            ("created_by", FieldValue::text(&self.created_by)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &ContractClausePatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.title {
            cols.push(("title", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.content {
            cols.push(("content", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.category {
            cols.push(("category", FieldValue::text(v)));
        }
        if let Some(v) = patch.is_active {
            cols.push(("is_active", FieldValue::Bool(Some(v))));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        Reference::optional("created_by", EntityKind::User, &self.created_by)
            .into_iter()
            .collect()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            date: self.created_at,
            ..FilterValues::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn contract_owner_and_defaults() {
        let contract = Contract::from_insert(
            "k1".to_string(),
            NewContract {
                title: "Prestação de serviços".to_string(),
                client_id: Some("c1".to_string()),
                value: Some(Decimal::from_str("1500.005").unwrap()),
                ..Default::default()
            },
            Some("u1"),
            Utc::now(),
        );
        assert_eq!(contract.status, ContractStatus::Draft);
        assert_eq!(contract.created_by.as_deref(), Some("u1"));
        assert_eq!(contract.value, Some(Decimal::from_str("1500.01").unwrap()));

        let refs = contract.references();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().any(|r| r.target == EntityKind::Client && r.id == "c1"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let start = Utc::now();
        let input = NewContract {
            title: "Locação".to_string(),
            start_date: Some(start),
            end_date: Some(start - chrono::Duration::days(1)),
            ..Default::default()
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.field(), Some("endDate"));
    }

    #[test]
    fn templates_are_active_by_default() {
        let template = ContractTemplate::from_insert(
            "t1".to_string(),
            NewContractTemplate {
                name: "Honorários".to_string(),
                content: "Cláusula primeira...".to_string(),
                ..Default::default()
            },
            None,
            Utc::now(),
        );
        assert!(template.is_active);
        assert!(template.references().is_empty());
    }

    #[test]
    fn clause_patch_only_touches_given_columns() {
        let patch = ContractClausePatch {
            is_active: Some(false),
            ..Default::default()
        };
        let cols = ContractClause::patch_columns(&patch);
        assert_eq!(cols, vec![("is_active", FieldValue::Bool(Some(false)))]);
    }
}
