//! Dashboard figures and alerts.
//!
//! [`StatsSource`] is the seam the dashboard reads its headline numbers
//! from. [`StoreStats`] aggregates the store; [`MockStats`] serves a fixed
//! payload for demos and tests.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use lexdesk_core::{
    ContractStatus, ListQuery, ProjectStatus, StatsSourceKind, Transaction, TransactionType,
};
use lexdesk_store::{Store, StoreError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::DashboardError;

/// Period the dashboard figures are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatsRange {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl StatsRange {
    pub const ALL: [StatsRange; 4] = [Self::Week, Self::Month, Self::Quarter, Self::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "7 dias",
            Self::Month => "30 dias",
            Self::Quarter => "90 dias",
            Self::Year => "1 ano",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::Quarter => Duration::days(90),
            Self::Year => Duration::days(365),
        }
    }

    /// Parse an optional `range` query parameter, defaulting to 30 days.
    pub fn from_param(raw: Option<&str>) -> Result<Self, DashboardError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for StatsRange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                DashboardError::InvalidRequest(format!(
                    "invalid range '{s}', expected one of 7d, 30d, 90d, 1y"
                ))
            })
    }
}

/// Headline figures shown on the overview cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub active_contracts: u64,
    pub total_clients: u64,
    pub pending_tasks: u64,
    pub revenue_growth: f64,
    pub contracts_growth: f64,
    pub clients_growth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn stats(&self, range: StatsRange) -> Result<DashboardStats, StoreError>;

    async fn alerts(&self) -> Result<Vec<Alert>, StoreError>;

    fn name(&self) -> &'static str;
}

/// Build the source selected by `dashboard.stats_source`.
pub fn create_stats_source(kind: StatsSourceKind, store: Arc<dyn Store>) -> Arc<dyn StatsSource> {
    match kind {
        StatsSourceKind::Store => Arc::new(StoreStats::new(store)),
        StatsSourceKind::Mock => Arc::new(MockStats),
    }
}

/// Fixed figures, independent of the range.
pub struct MockStats;

#[async_trait]
impl StatsSource for MockStats {
    async fn stats(&self, _range: StatsRange) -> Result<DashboardStats, StoreError> {
        Ok(DashboardStats {
            total_revenue: Decimal::from(1_250_000),
            active_contracts: 24,
            total_clients: 156,
            pending_tasks: 8,
            revenue_growth: 18.7,
            contracts_growth: 12.5,
            clients_growth: 8.3,
        })
    }

    async fn alerts(&self) -> Result<Vec<Alert>, StoreError> {
        let now = Utc::now();
        Ok(vec![
            Alert {
                id: "1".to_string(),
                kind: AlertKind::Warning,
                title: "Prazo próximo".to_string(),
                message: "3 contratos vencem nos próximos 7 dias".to_string(),
                date: now,
            },
            Alert {
                id: "2".to_string(),
                kind: AlertKind::Info,
                title: "Nova atualização".to_string(),
                message: "Sistema atualizado com novas funcionalidades".to_string(),
                date: now,
            },
        ])
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Figures aggregated from the store.
///
/// Revenue is the sum of income transactions inside the range; growth
/// compares each figure with the range immediately before it.
pub struct StoreStats {
    store: Arc<dyn Store>,
}

impl StoreStats {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn income_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Decimal, StoreError> {
        let query = ListQuery::default()
            .with_kind(TransactionType::Income.as_str())
            .between(since, until);
        let rows = self.store.transactions().list(&query).await?;
        Ok(rows.iter().map(|t| t.amount).sum())
    }
}

#[async_trait]
impl StatsSource for StoreStats {
    async fn stats(&self, range: StatsRange) -> Result<DashboardStats, StoreError> {
        let now = Utc::now();
        let start = now - range.duration();
        let previous = start - range.duration();

        let revenue = self.income_between(start, now).await?;
        let revenue_before = self.income_between(previous, start).await?;

        let active = ListQuery::default().with_status(ContractStatus::Active.as_str());
        let active_contracts = self.store.contracts().count(&active).await?;
        let total_clients = self.store.clients().count(&ListQuery::default()).await?;

        let mut pending_tasks = 0;
        for status in [ProjectStatus::Planning, ProjectStatus::OnHold] {
            let q = ListQuery::default().with_status(status.as_str());
            pending_tasks += self.store.projects().count(&q).await?;
        }

        let window = ListQuery::default().between(start, now);
        let window_before = ListQuery::default().between(previous, start);
        let contracts_now = self.store.contracts().count(&window).await?;
        let contracts_before = self.store.contracts().count(&window_before).await?;
        let clients_now = self.store.clients().count(&window).await?;
        let clients_before = self.store.clients().count(&window_before).await?;

        Ok(DashboardStats {
            total_revenue: revenue,
            active_contracts,
            total_clients,
            pending_tasks,
            revenue_growth: growth(
                revenue.to_f64().unwrap_or_default(),
                revenue_before.to_f64().unwrap_or_default(),
            ),
            contracts_growth: growth(contracts_now as f64, contracts_before as f64),
            clients_growth: growth(clients_now as f64, clients_before as f64),
        })
    }

    async fn alerts(&self) -> Result<Vec<Alert>, StoreError> {
        let now = Utc::now();
        let mut alerts = Vec::new();

        let active = ListQuery::default().with_status(ContractStatus::Active.as_str());
        let contracts = self.store.contracts().list(&active).await?;
        let due_soon = contracts
            .iter()
            .filter(|c| c.end_date.is_some_and(|end| end >= now && end <= now + Duration::days(7)))
            .count();
        if due_soon > 0 {
            let message = if due_soon == 1 {
                "1 contrato vence nos próximos 7 dias".to_string()
            } else {
                format!("{due_soon} contratos vencem nos próximos 7 dias")
            };
            alerts.push(Alert {
                id: "contracts-due".to_string(),
                kind: AlertKind::Warning,
                title: "Prazo próximo".to_string(),
                message,
                date: now,
            });
        }

        let running = ListQuery::default().with_status(ProjectStatus::Active.as_str());
        let projects = self.store.projects().list(&running).await?;
        let overdue = projects
            .iter()
            .filter(|p| p.end_date.is_some_and(|end| end < now))
            .count();
        if overdue > 0 {
            alerts.push(Alert {
                id: "projects-overdue".to_string(),
                kind: AlertKind::Error,
                title: "Projetos atrasados".to_string(),
                message: format!("{overdue} projeto(s) passaram da data de término"),
                date: now,
            });
        }

        Ok(alerts)
    }

    fn name(&self) -> &'static str {
        "store"
    }
}

/// Percentage change from `previous` to `current`, one decimal place.
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    (((current - previous) / previous) * 1000.0).round() / 10.0
}

/// Income and expenses of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotal {
    /// `mm/yyyy`
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Totals for the `months` calendar months ending with the one containing `now`, oldest first.
pub fn monthly_totals(rows: &[Transaction], now: DateTime<Utc>, months: u32) -> Vec<MonthTotal> {
    let current = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or_default();
    let firsts: Vec<NaiveDate> = (0..months)
        .rev()
        .filter_map(|back| current.checked_sub_months(chrono::Months::new(back)))
        .collect();

    firsts
        .iter()
        .map(|first| {
            let in_month = rows
                .iter()
                .filter(|t| t.date.year() == first.year() && t.date.month() == first.month());
            let (mut income, mut expense) = (Decimal::ZERO, Decimal::ZERO);
            for t in in_month {
                match t.transaction_type {
                    TransactionType::Income => income += t.amount,
                    TransactionType::Expense => expense += t.amount,
                }
            }
            MonthTotal {
                label: format!("{:02}/{}", first.month(), first.year()),
                income,
                expense,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_core::{Client, NewClient, NewTransaction, Record};
    use lexdesk_store::MemoryStore;

    fn transaction(amount: i64, kind: TransactionType, date: DateTime<Utc>) -> Transaction {
        let input = NewTransaction {
            description: "Honorários".to_string(),
            amount: Decimal::from(amount),
            transaction_type: kind,
            client_id: None,
            project_id: None,
            contract_id: None,
            date: Some(date),
        };
        Transaction::from_insert(lexdesk_core::new_id(), input, None, date)
    }

    #[test]
    fn range_parsing() {
        assert_eq!(StatsRange::from_param(None).unwrap(), StatsRange::Month);
        assert_eq!(StatsRange::from_param(Some("1y")).unwrap(), StatsRange::Year);
        assert!(StatsRange::from_param(Some("2w")).is_err());
    }

    #[test]
    fn growth_is_rounded_percentage() {
        assert_eq!(growth(118.7, 100.0), 18.7);
        assert_eq!(growth(50.0, 100.0), -50.0);
        assert_eq!(growth(0.0, 0.0), 0.0);
        assert_eq!(growth(10.0, 0.0), 100.0);
    }

    #[tokio::test]
    async fn mock_payload_is_fixed() {
        let stats = MockStats.stats(StatsRange::Week).await.unwrap();
        assert_eq!(stats.total_revenue, Decimal::from(1_250_000));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalRevenue"], 1250000.0);
        assert_eq!(json["revenueGrowth"], 18.7);

        let alerts = MockStats.alerts().await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::Warning);
        assert_eq!(alerts[0].title, "Prazo próximo");
    }

    #[tokio::test]
    async fn store_stats_count_rows() {
        let store = Arc::new(MemoryStore::new());
        for name in ["Ana", "Bruno"] {
            let input = NewClient {
                name: name.to_string(),
                ..Default::default()
            };
            let _: Client = store.clients().create(input, None).await.unwrap();
        }
        let stats = StoreStats::new(store).stats(StatsRange::Month).await.unwrap();
        assert_eq!(stats.total_clients, 2);
        assert_eq!(stats.clients_growth, 100.0);
        assert_eq!(stats.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn monthly_totals_bucket_by_month() {
        let now = DateTime::parse_from_rfc3339("2026-03-15T12:00:00Z").unwrap().with_timezone(&Utc);
        let feb = DateTime::parse_from_rfc3339("2026-02-10T09:00:00Z").unwrap().with_timezone(&Utc);
        let rows = vec![
            transaction(1000, TransactionType::Income, now),
            transaction(300, TransactionType::Expense, now),
            transaction(500, TransactionType::Income, feb),
        ];
        let totals = monthly_totals(&rows, now, 3);
        let labels: Vec<_> = totals.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["01/2026", "02/2026", "03/2026"]);
        assert_eq!(totals[1].income, Decimal::from(500));
        assert_eq!(totals[2].income, Decimal::from(1000));
        assert_eq!(totals[2].expense, Decimal::from(300));
    }
}
