//! Dashboard tab panels.
//!
//! Each tab is fetched on its own (`/dashboard/panels/{tab}`) the first time
//! it is shown and then stays in the page, so switching tabs does not fetch
//! again. Server side the rendered data is cached per tab and range.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use lexdesk_core::money::{format_brl, format_growth, format_thousands};
use lexdesk_core::{
    Client, Contract, Document, ListQuery, Project, ProjectStatus, Transaction, TransactionType,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::cache::QueryCache;
use crate::calendar::{CalendarEvent, EventKind, MonthGrid, events_from, upcoming};
use crate::error::DashboardError;
use crate::state::AppState;
use crate::stats::{DashboardStats, MonthTotal, StatsRange, monthly_totals};
use crate::templates::{badge, card, escape, row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Overview,
    Calendar,
    Financial,
    Activities,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Self::Overview, Self::Calendar, Self::Financial, Self::Activities];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Calendar => "calendar",
            Self::Financial => "financial",
            Self::Activities => "activities",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "Visão Geral",
            Self::Calendar => "Calendário",
            Self::Financial => "Financeiro",
            Self::Activities => "Atividades",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Overview => "chart-line",
            Self::Calendar => "calendar",
            Self::Financial => "chart-column",
            Self::Activities => "clock",
        }
    }
}

impl FromStr for Panel {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DashboardError::NotFound(format!("unknown dashboard panel '{s}'")))
    }
}

/// Something that recently happened in the office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub date: DateTime<Utc>,
    pub icon: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Productivity {
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
}

/// Everything a panel renders. Only the parts the panel needs are filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelData {
    pub stats: Option<DashboardStats>,
    pub upcoming: Vec<CalendarEvent>,
    pub month_events: Vec<CalendarEvent>,
    pub activities: Vec<Activity>,
    pub revenue: Vec<MonthTotal>,
    pub productivity: Option<Productivity>,
}

const CHART_MONTHS: u32 = 6;

/// Panel data for `range`, through the query cache.
pub async fn load(state: &AppState, panel: Panel, range: StatsRange) -> Result<PanelData, DashboardError> {
    let key = QueryCache::key(
        &format!("/dashboard/panels/{}", panel.as_str()),
        &[("range", range.as_str())],
    );
    state
        .cache()
        .get_or_fetch(&key, || fetch(state, panel, range))
        .await
}

async fn fetch(state: &AppState, panel: Panel, range: StatsRange) -> Result<PanelData, DashboardError> {
    let now = Utc::now();
    let mut data = PanelData::default();
    match panel {
        Panel::Overview => {
            data.revenue = revenue(state, now).await?;
            data.upcoming = upcoming(&events(state).await?, now, 5);
            data.activities = activities(state, 6).await?;
        }
        Panel::Calendar => {
            let all = events(state).await?;
            let grid = MonthGrid::new(now.year(), now.month());
            data.month_events = all
                .iter()
                .filter(|e| grid.as_ref().is_some_and(|g| g.contains(e.date)))
                .cloned()
                .collect();
            data.upcoming = upcoming(&all, now, 5);
        }
        Panel::Financial => {
            data.stats = Some(state.dashboard_stats(range).await?);
            data.revenue = revenue(state, now).await?;
        }
        Panel::Activities => {
            let stats = state.dashboard_stats(range).await?;
            data.activities = activities(state, 10).await?;
            data.upcoming = upcoming(&events(state).await?, now, 5);
            data.productivity = Some(Productivity {
                completed: count_projects(state, ProjectStatus::Completed).await?,
                in_progress: count_projects(state, ProjectStatus::Active).await?,
                pending: stats.pending_tasks,
            });
        }
    }
    Ok(data)
}

async fn events(state: &AppState) -> Result<Vec<CalendarEvent>, DashboardError> {
    let contracts = state.list::<Contract>(&ListQuery::default()).await?;
    let projects = state.list::<Project>(&ListQuery::default()).await?;
    Ok(events_from(&contracts, &projects))
}

async fn revenue(state: &AppState, now: DateTime<Utc>) -> Result<Vec<MonthTotal>, DashboardError> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.checked_sub_months(chrono::Months::new(CHART_MONTHS - 1)))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or(now - Duration::days(183));
    let query = ListQuery {
        since: Some(first),
        ..Default::default()
    };
    let rows = state.list::<Transaction>(&query).await?;
    Ok(monthly_totals(&rows, now, CHART_MONTHS))
}

async fn count_projects(state: &AppState, status: ProjectStatus) -> Result<u64, DashboardError> {
    let query = ListQuery::default().with_status(status.as_str());
    Ok(state.store().projects().count(&query).await?)
}

async fn activities(state: &AppState, limit: usize) -> Result<Vec<Activity>, DashboardError> {
    let recent = ListQuery {
        limit: Some(limit),
        ..Default::default()
    };
    let mut feed = Vec::new();
    for c in state.list::<Client>(&recent).await? {
        feed.push(activity(c.created_at, "user-plus", format!("Novo cliente: {}", c.name)));
    }
    for c in state.list::<Contract>(&recent).await? {
        feed.push(activity(c.created_at, "file-signature", format!("Contrato criado: {}", c.title)));
    }
    for p in state.list::<Project>(&recent).await? {
        feed.push(activity(p.created_at, "briefcase", format!("Projeto criado: {}", p.name)));
    }
    for d in state.list::<Document>(&recent).await? {
        feed.push(activity(d.created_at, "file-arrow-up", format!("Documento enviado: {}", d.name)));
    }
    for t in state.list::<Transaction>(&recent).await? {
        let what = match t.transaction_type {
            TransactionType::Income => "Receita registrada",
            TransactionType::Expense => "Despesa registrada",
        };
        feed.push(activity(
            t.created_at,
            "money-bill-wave",
            format!("{what}: {} ({})", t.description, format_brl(t.amount)),
        ));
    }
    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed.truncate(limit);
    Ok(feed)
}

fn activity(date: DateTime<Utc>, icon: &str, text: String) -> Activity {
    Activity {
        date,
        icon: icon.to_string(),
        text,
    }
}

/// Render a panel body.
pub fn render(panel: Panel, data: &PanelData, now: DateTime<Utc>) -> String {
    match panel {
        Panel::Overview => format!(
            r##"<div class="grid gap-6 lg:grid-cols-2">
                <div class="space-y-6">{chart}{actions}</div>
                <div class="space-y-6">{events}{feed}</div>
            </div>"##,
            chart = revenue_chart(&data.revenue),
            actions = quick_actions(),
            events = upcoming_card(&data.upcoming),
            feed = activities_card(&data.activities),
        ),
        Panel::Calendar => {
            let grid = MonthGrid::new(now.year(), now.month());
            let grid_html = grid
                .as_ref()
                .map(|g| month_grid(g, &data.month_events))
                .unwrap_or_default();
            format!(
                r##"<div class="grid gap-6 lg:grid-cols-3">
                    <div class="lg:col-span-2">{grid_html}</div>
                    <div class="space-y-6">{events}{month}</div>
                </div>"##,
                events = upcoming_card(&data.upcoming),
                month = month_stats_card(&data.month_events),
            )
        }
        Panel::Financial => format!(
            r##"<div class="grid gap-6 lg:grid-cols-3">
                <div class="lg:col-span-2">{chart}</div>
                <div class="space-y-6">{summary}{actions}</div>
            </div>"##,
            chart = revenue_chart(&data.revenue),
            summary = financial_summary(data.stats.as_ref()),
            actions = quick_actions(),
        ),
        Panel::Activities => format!(
            r##"<div class="grid gap-6 lg:grid-cols-2">
                {feed}
                <div class="space-y-6">{events}{productivity}</div>
            </div>"##,
            feed = activities_card(&data.activities),
            events = upcoming_card(&data.upcoming),
            productivity = productivity_card(data.productivity),
        ),
    }
}

fn revenue_chart(months: &[MonthTotal]) -> String {
    let peak = months
        .iter()
        .flat_map(|m| [m.income, m.expense])
        .max()
        .filter(|p| !p.is_zero())
        .unwrap_or(Decimal::ONE);
    let pct = |v: Decimal| {
        let share = (v * Decimal::ONE_HUNDRED / peak).round();
        share.to_string()
    };
    let bars: String = months
        .iter()
        .map(|m| {
            format!(
                r##"<div class="flex flex-col items-center gap-1 flex-1">
                    <div class="flex items-end gap-1 h-40 w-full justify-center">
                        <div class="w-3 bg-green-500 rounded-t" style="height: {inc}%" title="Receitas {inc_brl}"></div>
                        <div class="w-3 bg-red-400 rounded-t" style="height: {exp}%" title="Despesas {exp_brl}"></div>
                    </div>
                    <span class="text-xs text-gray-500">{label}</span>
                </div>"##,
                inc = pct(m.income),
                exp = pct(m.expense),
                inc_brl = format_brl(m.income),
                exp_brl = format_brl(m.expense),
                label = m.label,
            )
        })
        .collect();
    card(
        "Receitas e Despesas",
        "chart-column",
        &format!(r#"<div class="flex gap-2">{bars}</div>"#),
    )
}

fn quick_actions() -> String {
    const ACTIONS: [(&str, &str, &str); 4] = [
        ("/clients", "user-plus", "Novo cliente"),
        ("/contracts", "file-signature", "Novo contrato"),
        ("/projects", "briefcase", "Novo projeto"),
        ("/financial", "money-bill-wave", "Lançamento"),
    ];
    let links: String = ACTIONS
        .iter()
        .map(|(href, icon, label)| {
            format!(
                r#"<a href="{href}" class="flex flex-col items-center gap-2 p-4 rounded-lg border border-gray-200 hover:bg-primary-50 text-sm text-gray-700"><i class="fas fa-{icon} text-primary-600 text-lg"></i>{label}</a>"#
            )
        })
        .collect();
    card("Ações Rápidas", "bolt", &format!(r#"<div class="grid grid-cols-2 gap-3">{links}</div>"#))
}

fn upcoming_card(events: &[CalendarEvent]) -> String {
    let body = if events.is_empty() {
        r#"<p class="text-sm text-gray-500">Nenhum compromisso agendado.</p>"#.to_string()
    } else {
        events
            .iter()
            .map(|e| {
                format!(
                    r#"<a href="{link}" class="flex items-center gap-3 py-2"><span class="text-xs font-medium text-gray-500 w-20">{date}</span>{badge} <span class="text-sm text-gray-900">{title}</span></a>"#,
                    link = e.kind.link(),
                    date = e.date.format("%d/%m/%Y"),
                    badge = badge(e.kind.label(), e.kind.color()),
                    title = escape(&e.title),
                )
            })
            .collect()
    };
    card("Próximos Compromissos", "calendar-check", &body)
}

fn activities_card(feed: &[Activity]) -> String {
    let body = if feed.is_empty() {
        r#"<p class="text-sm text-gray-500">Nenhuma atividade recente.</p>"#.to_string()
    } else {
        feed.iter()
            .map(|a| {
                format!(
                    r#"<div class="flex items-start gap-3 py-2"><i class="fas fa-{icon} text-primary-600 mt-1"></i><div><p class="text-sm text-gray-900">{text}</p><p class="text-xs text-gray-500">{date}</p></div></div>"#,
                    icon = a.icon,
                    text = escape(&a.text),
                    date = a.date.format("%d/%m/%Y %H:%M"),
                )
            })
            .collect()
    };
    card("Atividades Recentes", "clock-rotate-left", &body)
}

fn financial_summary(stats: Option<&DashboardStats>) -> String {
    let (revenue, contracts, growth) = match stats {
        Some(s) => (
            format_thousands(s.total_revenue),
            s.active_contracts.to_string(),
            format_growth(s.revenue_growth),
        ),
        None => ("R$ 0k".to_string(), "0".to_string(), format_growth(0.0)),
    };
    let body = [
        row("Receita do Período", &format!(r#"<span class="font-semibold text-green-600">{revenue}</span>"#)),
        row("Contratos Ativos", &format!(r#"<span class="font-semibold">{contracts}</span>"#)),
        row("Crescimento", &badge(&growth, "green")),
    ]
    .join("");
    card("Resumo Financeiro", "dollar-sign", &format!(r#"<div class="space-y-4">{body}</div>"#))
}

fn productivity_card(p: Option<Productivity>) -> String {
    let p = p.unwrap_or(Productivity {
        completed: 0,
        in_progress: 0,
        pending: 0,
    });
    let body = [
        row("Projetos Concluídos", &badge(&p.completed.to_string(), "green")),
        row("Em Andamento", &badge(&p.in_progress.to_string(), "blue")),
        row("Pendentes", &badge(&p.pending.to_string(), "yellow")),
    ]
    .join("");
    card("Produtividade", "list-check", &format!(r#"<div class="space-y-4">{body}</div>"#))
}

fn month_stats_card(events: &[CalendarEvent]) -> String {
    let count = |kind: EventKind| events.iter().filter(|e| e.kind == kind).count().to_string();
    let body = [
        row("Vencimentos de contrato", &badge(&count(EventKind::ContractEnd), "yellow")),
        row("Inícios de contrato", &badge(&count(EventKind::ContractStart), "blue")),
        row("Entregas de projeto", &badge(&count(EventKind::ProjectEnd), "purple")),
        row("Total de Compromissos", &badge(&events.len().to_string(), "blue")),
    ]
    .join("");
    card("Estatísticas do Mês", "clock", &format!(r#"<div class="space-y-4">{body}</div>"#))
}

/// Month grid with the day's events in each cell.
pub fn month_grid(grid: &MonthGrid, events: &[CalendarEvent]) -> String {
    const WEEKDAYS: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];
    let header: String = WEEKDAYS
        .iter()
        .map(|d| format!(r#"<div class="text-xs font-semibold text-gray-500 text-center py-2">{d}</div>"#))
        .collect();
    let cells: String = grid
        .weeks
        .iter()
        .flatten()
        .map(|day| match day {
            None => r#"<div class="min-h-20 bg-gray-50 rounded"></div>"#.to_string(),
            Some(day) => {
                let items: String = grid
                    .events_on(events, *day)
                    .iter()
                    .map(|e| {
                        format!(
                            r#"<div class="text-xs truncate px-1 rounded bg-{c}-100 text-{c}-800" title="{label}">{title}</div>"#,
                            c = e.kind.color(),
                            label = e.kind.label(),
                            title = escape(&e.title),
                        )
                    })
                    .collect();
                format!(
                    r#"<div class="min-h-20 border border-gray-100 rounded p-1 space-y-1"><div class="text-xs text-gray-700">{day}</div>{items}</div>"#
                )
            }
        })
        .collect();
    card(
        &grid.title(),
        "calendar",
        &format!(r#"<div class="grid grid-cols-7 gap-1">{header}{cells}</div>"#),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_names() {
        assert_eq!("financial".parse::<Panel>().unwrap(), Panel::Financial);
        assert!(matches!("reports".parse::<Panel>(), Err(DashboardError::NotFound(_))));
    }

    #[test]
    fn financial_panel_shows_thousands_and_growth() {
        let data = PanelData {
            stats: Some(DashboardStats {
                total_revenue: Decimal::from(1_250_000),
                active_contracts: 24,
                total_clients: 156,
                pending_tasks: 8,
                revenue_growth: 18.7,
                contracts_growth: 12.5,
                clients_growth: 8.3,
            }),
            ..Default::default()
        };
        let html = render(Panel::Financial, &data, Utc::now());
        assert!(html.contains("R$ 1250k"));
        assert!(html.contains("+18.7%"));
        assert!(html.contains("Resumo Financeiro"));
    }

    #[test]
    fn empty_panels_render_placeholders() {
        let html = render(Panel::Activities, &PanelData::default(), Utc::now());
        assert!(html.contains("Nenhuma atividade recente."));
        assert!(html.contains("Nenhum compromisso agendado."));
    }
}
