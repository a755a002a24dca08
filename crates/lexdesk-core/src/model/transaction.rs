use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    EntityKind, FieldValue, FilterValues, Filters, Record, Reference, TransactionType, apply,
};
use crate::error::ValidationError;
use crate::money;
use crate::validate::{Validate, datetime, double_option, require_text};

/// An income or expense entry in the office ledger.
///
/// Transactions are append-mostly: the table has no `updated_at` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    #[serde(deserialize_with = "money::deserialize")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub contract_id: Option<String>,
    /// When the money moved. Defaults to the insert time.
    pub date: DateTime<Utc>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with its sign: expenses are negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default, with = "datetime::opt")]
    pub date: Option<DateTime<Utc>>,
}

impl Validate for NewTransaction {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("description", &self.description)?;
        money::check("amount", &self.amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<Option<String>>,
    #[serde(default, with = "datetime::opt", skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl Validate for TransactionPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(amount) = &self.amount {
            money::check("amount", amount)?;
        }
        Ok(())
    }
}

impl Record for Transaction {
    type Insert = NewTransaction;
    type Patch = TransactionPatch;

    const KIND: EntityKind = EntityKind::Transaction;
    const OWNER_FIELD: Option<&'static str> = Some("createdBy");
    const ENUM_FIELDS: &'static [(&'static str, &'static [&'static str])] =
        &[("type", TransactionType::VALUES)];
    const HAS_UPDATED_AT: bool = false;
    const FILTERS: Filters = Filters {
        kind: Some("type"),
        client: true,
        project: true,
        contract: true,
        date: "date",
        ..Filters::NONE
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn from_insert(
        id: String,
        input: NewTransaction,
        owner: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description: input.description,
            amount: money::normalize(input.amount),
            transaction_type: input.transaction_type,
            client_id: input.client_id,
            project_id: input.project_id,
            contract_id: input.contract_id,
            date: input.date.unwrap_or(now),
            created_by: owner.map(str::to_string),
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TransactionPatch, _now: DateTime<Utc>) {
        apply(&mut self.description, patch.description);
        apply(&mut self.amount, patch.amount.map(money::normalize));
        apply(&mut self.transaction_type, patch.transaction_type);
        apply(&mut self.client_id, patch.client_id);
        apply(&mut self.project_id, patch.project_id);
        apply(&mut self.contract_id, patch.contract_id);
        apply(&mut self.date, patch.date);
    }

    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", FieldValue::Text(Some(self.id.clone()))),
            ("description", FieldValue::Text(Some(self.description.clone()))),
            ("amount", FieldValue::Decimal(Some(self.amount))),
            // Plain varchar in the schema, so no enum cast.
            ("type", FieldValue::Text(Some(self.transaction_type.as_str().to_string()))),
            ("client_id", FieldValue::text(&self.client_id)),
            ("project_id", FieldValue::text(&self.project_id)),
            ("contract_id", FieldValue::text(&self.contract_id)),
            ("date", FieldValue::Timestamp(Some(self.date))),
            ("created_by", FieldValue::text(&self.created_by)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at))),
        ]
    }

    fn patch_columns(patch: &TransactionPatch) -> Vec<(&'static str, FieldValue)> {
        let mut cols = Vec::new();
        if let Some(v) = &patch.description {
            cols.push(("description", FieldValue::Text(Some(v.clone()))));
        }
        if let Some(v) = patch.amount {
            cols.push(("amount", FieldValue::Decimal(Some(money::normalize(v)))));
        }
        if let Some(t) = patch.transaction_type {
            cols.push(("type", FieldValue::Text(Some(t.as_str().to_string()))));
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
        if let Some(v) = patch.date {
            cols.push(("date", FieldValue::Timestamp(Some(v))));
        }
        cols
    }

    fn references(&self) -> Vec<Reference> {
        [
            Reference::optional("client_id", EntityKind::Client, &self.client_id),
            Reference::optional("project_id", EntityKind::Project, &self.project_id),
            Reference::optional("contract_id", EntityKind::Contract, &self.contract_id),
            Reference::optional("created_by", EntityKind::User, &self.created_by),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn filter_values(&self) -> FilterValues<'_> {
        FilterValues {
            kind: Some(self.transaction_type.as_str()),
            client_id: self.client_id.as_deref(),
            project_id: self.project_id.as_deref(),
            contract_id: self.contract_id.as_deref(),
            date: self.date,
            ..FilterValues::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn input(amount: &str, kind: TransactionType) -> NewTransaction {
        NewTransaction {
            description: "Honorários".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            transaction_type: kind,
            client_id: None,
            project_id: None,
            contract_id: None,
            date: None,
        }
    }

    #[test]
    fn date_defaults_to_insert_time() {
        let now = Utc::now();
        let tx = Transaction::from_insert(
            "t1".to_string(),
            input("100", TransactionType::Income),
            None,
            now,
        );
        assert_eq!(tx.date, now);
        assert_eq!(tx.filter_values().date, now);
    }

    #[test]
    fn expenses_are_negative_when_signed() {
        let tx = Transaction::from_insert(
            "t1".to_string(),
            input("250.50", TransactionType::Expense),
            None,
            Utc::now(),
        );
        assert_eq!(tx.signed_amount(), Decimal::from_str("-250.50").unwrap());
    }

    #[test]
    fn numeric_column_reads_back_at_two_places() {
        let row = serde_json::json!({
            "id": "t1",
            "description": "Honorários",
            "amount": 1500.00,
            "type": "income",
            "clientId": null,
            "projectId": null,
            "contractId": null,
            "date": "2026-03-01T12:00:00Z",
            "createdBy": "u1",
            "createdAt": "2026-03-01T12:00:00Z",
        });
        let tx: Transaction = serde_json::from_value(row).unwrap();
        assert_eq!(tx.amount.to_string(), "1500.00");
        assert_eq!(serde_json::to_value(&tx).unwrap()["amount"], "1500.00");
    }

    #[test]
    fn amount_beyond_precision_is_rejected() {
        let err = input("12345678901", TransactionType::Income).validate().unwrap_err();
        assert_eq!(err.field(), Some("amount"));
        assert!(input("9999999999.99", TransactionType::Income).validate().is_ok());
    }
}
