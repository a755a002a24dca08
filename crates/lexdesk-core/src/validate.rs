//! Payload parsing.
//!
//! API handlers receive loosely typed JSON (or HTML form fields converted to
//! JSON strings). [`parse_insert`] and [`parse_patch`] turn such a payload into
//! the typed insert or patch shape of a [`Record`], reporting the first
//! offending field. Fields the shape does not know about are ignored.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::model::Record;

/// Semantic checks that run after a payload decoded successfully.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Reject empty or whitespace-only text.
pub fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field.to_string()));
    }
    Ok(())
}

/// Parse a create payload for `R`.
///
/// Nulls and blank strings count as absent, so an empty optional form field
/// leaves the column at its default and an empty required one is reported
/// as blank.
pub fn parse_insert<R: Record>(payload: Value) -> Result<R::Insert, ValidationError> {
    let mut map = into_object(payload)?;
    let blanked = strip_blank(&mut map, Blank::Remove);
    check_enums::<R>(&map)?;
    let input: R::Insert = serde_json::from_value(Value::Object(map))
        .map_err(|e| map_serde_error(e, &blanked))?;
    input.validate()?;
    Ok(input)
}

/// Parse a partial update payload for `R`.
///
/// Blank strings become `null`, clearing nullable columns. An explicit
/// `null` on a required column is treated as absent.
pub fn parse_patch<R: Record>(payload: Value) -> Result<R::Patch, ValidationError> {
    let mut map = into_object(payload)?;
    strip_blank(&mut map, Blank::Null);
    check_enums::<R>(&map)?;
    let patch: R::Patch =
        serde_json::from_value(Value::Object(map)).map_err(|e| map_serde_error(e, &[]))?;
    patch.validate()?;
    Ok(patch)
}

fn into_object(payload: Value) -> Result<Map<String, Value>, ValidationError> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::Malformed(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Clone, Copy)]
enum Blank {
    Remove,
    Null,
}

/// Returns the keys that held blank strings.
fn strip_blank(map: &mut Map<String, Value>, mode: Blank) -> Vec<String> {
    let blanked: Vec<String> = map
        .iter()
        .filter(|(_, v)| matches!(v, Value::String(s) if s.trim().is_empty()))
        .map(|(k, _)| k.clone())
        .collect();
    match mode {
        Blank::Remove => {
            map.retain(|_, v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            });
        }
        Blank::Null => {
            for key in &blanked {
                map.insert(key.clone(), Value::Null);
            }
        }
    }
    blanked
}

fn check_enums<R: Record>(map: &Map<String, Value>) -> Result<(), ValidationError> {
    for (field, allowed) in R::ENUM_FIELDS {
        match map.get(*field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
            Some(Value::String(s)) => return Err(ValidationError::invalid_enum(field, s, allowed)),
            Some(other) => {
                return Err(ValidationError::invalid(
                    field,
                    format!("expected a string, got {}", kind_of(other)),
                ));
            }
        }
    }
    Ok(())
}

fn map_serde_error(err: serde_json::Error, blanked: &[String]) -> ValidationError {
    let msg = err.to_string();
    if let Some(field) = msg
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return if blanked.iter().any(|b| b == field) {
            ValidationError::Blank(field.to_string())
        } else {
            ValidationError::MissingField(field.to_string())
        };
    }
    ValidationError::Malformed(msg)
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Timestamps as submitted by the API or by HTML date inputs.
pub mod datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    /// Accepts RFC 3339, `datetime-local` (`2025-03-01T14:30`) and plain
    /// dates, the latter taken as midnight UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub mod opt {
        use chrono::{DateTime, Utc};
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.serialize(serializer)
        }

        pub fn deserialize<'de, De: Deserializer<'de>>(
            deserializer: De,
        ) -> Result<Option<DateTime<Utc>>, De::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(s) if s.trim().is_empty() => Ok(None),
                Some(s) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| De::Error::custom(format!("invalid date `{s}`"))),
            }
        }
    }

    pub mod patch {
        use chrono::{DateTime, Utc};
        use serde::{Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Option<DateTime<Utc>>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.serialize(serializer)
        }

        pub fn deserialize<'de, De: Deserializer<'de>>(
            deserializer: De,
        ) -> Result<Option<Option<DateTime<Utc>>>, De::Error> {
            super::opt::deserialize(deserializer).map(Some)
        }
    }
}

/// Booleans that may arrive as checkbox values.
pub mod flag {
    /// `true`/`false`, `on`/`off`, `1`/`0`, `yes`/`no`.
    pub fn parse(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Some(true),
            "false" | "off" | "0" | "no" => Some(false),
            _ => None,
        }
    }

    pub mod opt {
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Text(String),
        }

        pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
            value.serialize(serializer)
        }

        pub fn deserialize<'de, De: Deserializer<'de>>(
            deserializer: De,
        ) -> Result<Option<bool>, De::Error> {
            match Option::<Raw>::deserialize(deserializer)? {
                None => Ok(None),
                Some(Raw::Bool(b)) => Ok(Some(b)),
                Some(Raw::Int(0)) => Ok(Some(false)),
                Some(Raw::Int(1)) => Ok(Some(true)),
                Some(Raw::Int(n)) => Err(De::Error::custom(format!("invalid flag `{n}`"))),
                Some(Raw::Text(s)) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| De::Error::custom(format!("invalid flag `{s}`"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Client, ClientType, Contract, ContractStatus, ContractTemplate, Project, Transaction,
        TransactionType, User,
    };
    use serde_json::json;

    #[test]
    fn contract_without_title_is_rejected() {
        let err = parse_insert::<Contract>(json!({ "description": "x" })).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("title".to_string()));
    }

    #[test]
    fn blank_required_field_is_reported_as_blank() {
        let err = parse_insert::<Client>(json!({ "name": "   " })).unwrap_err();
        assert_eq!(err, ValidationError::Blank("name".to_string()));
    }

    #[test]
    fn transaction_without_amount_is_rejected() {
        let err = parse_insert::<Transaction>(json!({
            "description": "Custas",
            "type": "expense"
        }))
        .unwrap_err();
        assert_eq!(err.field(), Some("amount"));
    }

    #[test]
    fn status_outside_enumeration_is_rejected() {
        let err = parse_insert::<Contract>(json!({ "title": "A", "status": "archived" }))
            .unwrap_err();
        assert_eq!(err.field(), Some("status"));

        let err = parse_patch::<Project>(json!({ "status": "paused" })).unwrap_err();
        assert_eq!(err.field(), Some("status"));

        let err = parse_patch::<User>(json!({ "role": "owner" })).unwrap_err();
        assert_eq!(err.field(), Some("role"));
    }

    #[test]
    fn form_strings_are_coerced() {
        let input = parse_insert::<Contract>(json!({
            "title": "Consultoria",
            "clientId": "",
            "value": "1500.50",
            "startDate": "2025-03-01",
            "status": "active",
            "unknownField": "ignored"
        }))
        .unwrap();
        assert_eq!(input.client_id, None);
        assert_eq!(input.status, Some(ContractStatus::Active));
        assert_eq!(input.value.map(|v| v.to_string()), Some("1500.50".to_string()));
        assert_eq!(
            input.start_date.map(|d| d.to_rfc3339()),
            Some("2025-03-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn checkbox_values_become_booleans() {
        let input = parse_insert::<ContractTemplate>(json!({
            "name": "Procuração",
            "content": "Outorgante...",
            "isActive": "off"
        }))
        .unwrap();
        assert_eq!(input.is_active, Some(false));
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch = parse_patch::<Client>(json!({ "phone": null, "email": "" })).unwrap();
        assert_eq!(patch.phone, Some(None));
        assert_eq!(patch.email, Some(None));
        assert_eq!(patch.address, None);
        assert_eq!(patch.client_type, None);

        let patch = parse_patch::<Client>(json!({ "type": "company" })).unwrap();
        assert_eq!(patch.client_type, Some(ClientType::Company));
    }

    #[test]
    fn amount_precision_is_enforced() {
        let err = parse_insert::<Transaction>(json!({
            "description": "Acordo",
            "amount": "99999999999.00",
            "type": "income"
        }))
        .unwrap_err();
        assert_eq!(err.field(), Some("amount"));

        let ok = parse_insert::<Transaction>(json!({
            "description": "Acordo",
            "amount": 1200.5,
            "type": "income"
        }))
        .unwrap();
        assert_eq!(ok.transaction_type, TransactionType::Income);
    }

    #[test]
    fn non_object_payload_is_malformed() {
        assert!(matches!(
            parse_insert::<Client>(json!(["name"])),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn datetime_formats() {
        assert!(datetime::parse("2025-03-01T14:30").is_some());
        assert!(datetime::parse("2025-03-01T14:30:00-03:00").is_some());
        assert!(datetime::parse("01/03/2025").is_none());
    }
}
