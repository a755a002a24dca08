//! Closed enumerations backed by Postgres enum types.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $type_name:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $value)] $variant),+
        }

        impl $name {
            /// Name of the Postgres enum type.
            pub const TYPE_NAME: &'static str = $type_name;
            /// Allowed wire values, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($value),+];
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn from_db_value(value: &str) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_value(s)
                    .ok_or_else(|| ValidationError::invalid_enum($type_name, s, Self::VALUES))
            }
        }
    };
}

closed_enum! {
    /// Access level of a console user.
    pub enum UserRole as "user_role" {
        Admin = "admin",
        Lawyer = "lawyer",
        Assistant = "assistant",
    }
}

closed_enum! {
    /// Whether a client is a person (CPF) or a company (CNPJ).
    pub enum ClientType as "client_type" {
        Individual = "individual",
        Company = "company",
    }
}

closed_enum! {
    pub enum ContractStatus as "contract_status" {
        Draft = "draft",
        Active = "active",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

closed_enum! {
    pub enum ProjectStatus as "project_status" {
        Planning = "planning",
        Active = "active",
        OnHold = "on_hold",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

closed_enum! {
    /// Direction of a financial transaction.
    pub enum TransactionType as "transaction_type" {
        Income = "income",
        Expense = "expense",
    }
}

closed_enum! {
    pub enum DocumentStatus as "document_status" {
        Active = "active",
        Archived = "archived",
        Draft = "draft",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Assistant
    }
}

impl Default for ClientType {
    fn default() -> Self {
        Self::Individual
    }
}

impl Default for ContractStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Planning
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl ProjectStatus {
    /// Projects that still have work to do.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Planning | Self::Active | Self::OnHold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_serde() {
        for status in ProjectStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::from_str::<ProjectStatus>("\"on_hold\"").unwrap(),
            ProjectStatus::OnHold
        );
    }

    #[test]
    fn rejects_values_outside_enumeration() {
        assert!(serde_json::from_str::<ContractStatus>("\"archived\"").is_err());
        let err = "archived".parse::<ContractStatus>().unwrap_err();
        assert_eq!(err.field(), Some("contract_status"));
        assert!(err.to_string().contains("draft, active, completed, cancelled"));
    }

    #[test]
    fn defaults_follow_schema() {
        assert_eq!(UserRole::default(), UserRole::Assistant);
        assert_eq!(ContractStatus::default(), ContractStatus::Draft);
        assert_eq!(ProjectStatus::default(), ProjectStatus::Planning);
        assert_eq!(DocumentStatus::default(), DocumentStatus::Active);
        assert_eq!(ClientType::default(), ClientType::Individual);
    }
}
