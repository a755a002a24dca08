use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    DocumentStatus, EntityKind, FieldValue, FilterValues, Filters, Record, Reference, apply,
};
use crate::error::ValidationError;
use crate::validate::{Validate, double_option, require_text};

/// A file attached to a client, project or contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    /// Free-text kind, e.g. "procuração" or "petição".
    #[serde(rename = "type")]
    pub document_type: String,
    pub file_path: Option<String>,
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub contract_id: Option<String>,
    pub status: DocumentStatus,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

impl Validate for NewDocument {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("type", &self.document_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
}

impl Validate for DocumentPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(kind) = &self.document_type {
            require_text("type", kind)?;
        }
        Ok(())
    }
}

impl Record for Document {
    type Insert = NewDocument;
    type Patch = DocumentPatch;

    const KIND: EntityKind = EntityKind::Document;
    const OWNER_FIELD: Option<&'static str> = Some("uploadedBy");
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] =
        &[("status", DocumentStatus::VALUES)];
    const FILTERS: Filters = Filters {
        status: Some("status"),
        kind: Some("type"),
        client: true,
        project: true,
        contract: true,
        ..Filters::NONE
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(id: String, input: NewDocument, owner: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            document_type: input.document_type,
            file_path: input.file_path,
            client_id: input.client_id,
            project_id: input.project_id,
            contract_id: input.contract_id,
            status: input.status.unwrap_or_default(),
            uploaded_by: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: DocumentPatch, now: DateTime<Utc>) {
        apply(&mut self.name, patch.name);
        apply(&mut self.document_type, patch.document_type);
        apply(&mut self.file_path, patch.file_path);
        apply(&mut self.client_id, patch.client_id);
        apply(&mut self.project_id, patch.project_id);
        apply(&mut self.contract_id, patch.contract_id);
        apply(&mut self.status, patch.status);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("name", FieldValue::Text(Some(self.name.clone()))),
            ("type", FieldValue::Text(Some(self.document_type.clone()))),
            ("file_path", FieldValue::text(&self.file_path)),
            ("client_id", FieldValue::text(&self.client_id)),
            ("project_id", FieldValue::text(&self.project_id)),
            ("contract_id", FieldValue::text(&self.contract_id)),
            // varchar column holding one of the document_status values
            ("status", FieldValue::Text(Some(self.status.as_str().to_string()))),
            ("uploaded_by", FieldValue::text(&self.uploaded_by)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &DocumentPatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.name {
            cols.push(("name", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.document_type {
            cols.push(("type", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.file_path {
            cols.push(("file_path", FieldValue::text(v)));
        }
        if let Some(v) = &patch.client_id {
            cols.push(("client_id", FieldValue::text(v)));
        }
        if let Some(v) = &patch.project_id {
            cols.push(("project_id", FieldValue::text(v)));
        }
        if let Some(v) = &patch.contract_id {
            cols.push(("contract_id", FieldValue::text(v)));
        }
        if let Some(s) = patch.status {
            cols.push(("status", FieldValue::Text(Some(s.as_str().to_string()))));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("client_id", EntityKind::Client, &self.client_id),
            Reference::optional("project_id", EntityKind::Project, &self.project_id),
            Reference::optional("contract_id", EntityKind::Contract, &self.contract_id),
            Reference::optional("uploaded_by", EntityKind::User, &self.uploaded_by),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            status: Some(self.status.as_str()),
            kind: Some(self.document_type.as_str()),
            client_id: self.client_id.as_deref(),
            project_id: self.project_id.as_deref(),
            contract_id: self.contract_id.as_deref(),
            date: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListQuery;

    #[test]
    fn uploader_comes_from_owner() {
        let doc = Document::from_insert(
            "d1".to_string(),
            NewDocument {
                name: "Procuração".to_string(),
                document_type: "procuracao".to_string(),
                project_id: Some("p1".to_string()),
                ..Default::default()
            },
            Some("u1"),
            Utc::now(),
        );
        assert_eq!(doc.status, DocumentStatus::Active);
        assert_eq!(doc.uploaded_by.as_deref(), Some("u1"));
        assert_eq!(doc.references().len(), 2);
    }

    #[test]
    fn list_query_matches_type_and_project() {
        let doc = Document::from_insert(
            "d1".to_string(),
            NewDocument {
                name: "Petição inicial".to_string(),
                document_type: "peticao".to_string(),
                project_id: Some("p1".to_string()),
                ..Default::default()
            },
            None,
            Utc::now(),
        );
        let q = ListQuery {
            project_id: Some("p1".to_string()),
            ..ListQuery::default().with_kind("peticao")
        };
        assert!(q.matches(&doc.filter_values()));
        assert!(!ListQuery::default().with_status("archived").matches(&doc.filter_values()));
    }
}
