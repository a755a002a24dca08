use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityKind, FieldValue, FilterValues, Filters, Record, Reference, UserRole, apply};
use crate::error::ValidationError;
use crate::validate::{Validate, double_option};

/// A person who signs in to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Full name, falling back to the email and then the id.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            name
        } else if let Some(email) = &self.email {
            email.clone()
        } else {
            self.id.clone()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(email) = &self.email
            && !email.contains('@')
        {
            return Err(ValidationError::invalid("email", "must be an email address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(Some(email)) = &self.email
            && !email.contains('@')
        {
            return Err(ValidationError::invalid("email", "must be an email address"));
        }
        Ok(())
    }
}

impl Record for User {
    type Insert = NewUser;
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] =
        &[("role", UserRole::VALUES)];
    const FILTERS: Filters = Filters {
        status: Some("role"),
        ..Filters::NONE
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(id: String, input: NewUser, _owner: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            profile_image_url: input.profile_image_url,
            role: input.role.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: UserPatch, now: DateTime<Utc>) {
        apply(&mut self.email, patch.email);
        apply(&mut self.first_name, patch.first_name);
        apply(&mut self.last_name, patch.last_name);
        apply(&mut self.profile_image_url, patch.profile_image_url);
        apply(&mut self.role, patch.role);
        self.updated_at = now;
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("email", FieldValue::text(&self.email)),
            ("first_name", FieldValue::text(&self.first_name)),
            ("last_name", FieldValue::text(&self.last_name)),
            ("profile_image_url", FieldValue::text(&self.profile_image_url)),
            ("role", FieldValue::Enum(UserRole::TYPE_NAME, Some(self.role.as_str()))),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at))),
        ]
    }

    fn patch_columns(patch: &UserPatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.email {
            cols.push(("email", FieldValue::text(v)));
        }
        if let Some(v) = &patch.first_name {
            cols.push(("first_name", FieldValue::text(v)));
        }
        if let Some(v) = &patch.last_name {
            cols.push(("last_name", FieldValue::text(v)));
        }
        if let Some(v) = &patch.profile_image_url {
            cols.push(("profile_image_url", FieldValue::text(v)));
        }
        if let Some(role) = patch.role {
            cols.push(("role", FieldValue::Enum(UserRole::TYPE_NAME, Some(role.as_str()))));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            status: Some(self.role.as_str()),
            date: self.created_at,
            ..FilterValues::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::from_insert(
            "u1".to_string(),
            NewUser {
                email: Some("ana@example.com".to_string()),
                first_name: Some("Ana".to_string()),
                last_name: Some("Souza".to_string()),
                ..Default::default()
            },
            None,
            Utc::now(),
        )
    }

    #[test]
    fn role_defaults_to_assistant() {
        assert_eq!(user().role, UserRole::Assistant);
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut u = user();
        assert_eq!(u.display_name(), "Ana Souza");
        u.first_name = None;
        u.last_name = None;
        assert_eq!(u.display_name(), "ana@example.com");
    }
}
