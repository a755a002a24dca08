use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientType, EntityKind, FieldValue, FilterValues, Filters, Record, Reference, apply};
use crate::error::ValidationError;
use crate::validate::{Validate, double_option, require_text};

/// A person or company the office works for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    /// CNPJ, for companies.
    pub company_document: Option<String>,
    /// CPF, for individuals.
    pub personal_document: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// The identifier document matching the client type.
    pub fn document(&self) -> Option<&str> {
        match self.client_type {
            ClientType::Company => self.company_document.as_deref(),
            ClientType::Individual => self.personal_document.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "type")]
    pub client_type: Option<ClientType>,
    #[serde(default)]
    pub company_document: Option<String>,
    #[serde(default)]
    pub personal_document: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for NewClient {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub company_document: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub personal_document: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Validate for ClientPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => require_text("name", name),
            None => Ok(()),
        }
    }
}

impl Record for Client {
    type Insert = NewClient;
    type Patch = ClientPatch;

    const KIND: EntityKind = EntityKind::Client;
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] =
        &[("type", ClientType::VALUES)];
    const FILTERS: Filters = Filters {
        kind: Some("type"),
        ..Filters::NONE
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(id: String, input: NewClient, _owner: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            client_type: input.client_type.unwrap_or_default(),
            company_document: input.company_document,
            personal_document: input.personal_document,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ClientPatch, now: DateTime<Utc>) {
        apply(&mut self.name, patch.name);
        apply(&mut self.email, patch.email);
        apply(&mut self.phone, patch.phone);
        apply(&mut self.address, patch.address);
        apply(&mut self.client_type, patch.client_type);
        apply(&mut self.company_document, patch.company_document);
        apply(&mut self.personal_document, patch.personal_document);
        apply(&mut self.notes, patch.notes);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("name", FieldValue::Text(Some(self.name.clone()))),
            ("email", FieldValue::text(&self.email)),
            ("phone", FieldValue::text(&self.phone)),
            ("address", FieldValue::text(&self.address)),
            ("type", FieldValue::Enum(ClientType::TYPE_NAME, Some(self.client_type.as_str()))),
            ("company_document", FieldValue::text(&self.company_document)),
            ("personal_document", FieldValue::text(&self.personal_document)),
            ("notes", FieldValue::text(&self.notes)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &ClientPatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.name {
            cols.push(("name", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = &patch.email {
            cols.push(("email", FieldValue::text(v)));
        }
        if let Some(v) = &patch.phone {
            cols.push(("phone", FieldValue::text(v)));
        }
        if let Some(v) = &patch.address {
            cols.push(("address", FieldValue::text(v)));
        }
        if let Some(t) = patch.client_type {
            cols.push(("type", FieldValue::Enum(ClientType::TYPE_NAME, Some(t.as_str()))));
        }
        if let Some(v) = &patch.company_document {
            cols.push(("company_document", FieldValue::text(v)));
        }
        if let Some(v) = &patch.personal_document {
            cols.push(("personal_document", FieldValue::text(v)));
        }
        if let Some(v) = &patch.notes {
            cols.push(("notes", FieldValue::text(v)));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            kind: Some(self.client_type.as_str()),
            date: self.created_at,
            ..FilterValues::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_follows_client_type() {
        let mut client = Client::from_insert(
            "c1".to_string(),
            NewClient {
                name: "Acme Ltda".to_string(),
                client_type: Some(ClientType::Company),
                company_document: Some("12.345.678/0001-90".to_string()),
                personal_document: Some("123.456.789-00".to_string()),
                ..Default::default()
            },
            None,
            Utc::now(),
        );
        assert_eq!(client.document(), Some("12.345.678/0001-90"));
        client.client_type = ClientType::Individual;
        assert_eq!(client.document(), Some("123.456.789-00"));
    }

    #[test]
    fn patch_clears_nullable_fields() {
        let now = Utc::now();
        let mut client = Client::from_insert(
            "c1".to_string(),
            NewClient {
                name: "Maria".to_string(),
                phone: Some("11 99999-0000".to_string()),
                ..Default::default()
            },
            None,
            now,
        );
        let later = now + chrono::Duration::minutes(5);
        client.apply_patch(
            ClientPatch {
                phone: Some(None),
                ..Default::default()
            },
            later,
        );
        assert_eq!(client.phone, None);
        assert_eq!(client.name, "Maria");
        assert_eq!(client.updated_at, later);
        assert_eq!(client.created_at, now);
    }
}
