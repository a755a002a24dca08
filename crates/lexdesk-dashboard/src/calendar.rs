//! Calendar events derived from contract and project dates.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use lexdesk_core::{Contract, ContractStatus, Project, ProjectStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ContractStart,
    ContractEnd,
    ProjectStart,
    ProjectEnd,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ContractStart => "Início de contrato",
            Self::ContractEnd => "Vencimento de contrato",
            Self::ProjectStart => "Início de projeto",
            Self::ProjectEnd => "Entrega de projeto",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::ContractStart => "blue",
            Self::ContractEnd => "yellow",
            Self::ProjectStart => "green",
            Self::ProjectEnd => "purple",
        }
    }

    pub fn link(self) -> &'static str {
        match self {
            Self::ContractStart | Self::ContractEnd => "/contracts",
            Self::ProjectStart | Self::ProjectEnd => "/projects",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: DateTime<Utc>,
    pub kind: EventKind,
    pub title: String,
}

/// Events for every dated contract and project, ordered by date.
/// Cancelled rows are left out.
pub fn events_from(contracts: &[Contract], projects: &[Project]) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    for c in contracts.iter().filter(|c| c.status != ContractStatus::Cancelled) {
        push(&mut events, c.start_date, EventKind::ContractStart, &c.title);
        push(&mut events, c.end_date, EventKind::ContractEnd, &c.title);
    }
    for p in projects.iter().filter(|p| p.status != ProjectStatus::Cancelled) {
        push(&mut events, p.start_date, EventKind::ProjectStart, &p.name);
        push(&mut events, p.end_date, EventKind::ProjectEnd, &p.name);
    }
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.title.cmp(&b.title)));
    events
}

fn push(events: &mut Vec<CalendarEvent>, date: Option<DateTime<Utc>>, kind: EventKind, title: &str) {
    if let Some(date) = date {
        events.push(CalendarEvent {
            date,
            kind,
            title: title.to_string(),
        });
    }
}

/// The next `limit` events from `now` on.
pub fn upcoming(events: &[CalendarEvent], now: DateTime<Utc>, limit: usize) -> Vec<CalendarEvent> {
    events
        .iter()
        .filter(|e| e.date >= now)
        .take(limit)
        .cloned()
        .collect()
}

/// A month laid out in Sunday-first weeks.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    pub first: NaiveDate,
    /// Day of month per cell, `None` for padding.
    pub weeks: Vec<[Option<u32>; 7]>,
}

impl MonthGrid {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = first.checked_add_months(Months::new(1))?;
        let days = next.signed_duration_since(first).num_days() as u32;
        let offset = first.weekday().num_days_from_sunday() as usize;

        let mut weeks = Vec::new();
        let mut week = [None; 7];
        let mut col = offset;
        for day in 1..=days {
            week[col] = Some(day);
            col += 1;
            if col == 7 {
                weeks.push(week);
                week = [None; 7];
                col = 0;
            }
        }
        if col > 0 {
            weeks.push(week);
        }
        Some(Self { first, weeks })
    }

    /// Parse `yyyy-mm`, falling back to the month containing `now`.
    pub fn from_param(raw: Option<&str>, now: DateTime<Utc>) -> Self {
        raw.and_then(|s| {
            let (y, m) = s.split_once('-')?;
            Self::new(y.parse().ok()?, m.parse().ok()?)
        })
        .or_else(|| Self::new(now.year(), now.month()))
        .unwrap_or_else(|| Self {
            first: NaiveDate::default(),
            weeks: Vec::new(),
        })
    }

    pub fn title(&self) -> String {
        format!("{} de {}", month_name(self.first.month()), self.first.year())
    }

    /// `yyyy-mm` of the neighbouring months.
    pub fn prev_param(&self) -> String {
        let prev = self.first.checked_sub_months(Months::new(1)).unwrap_or(self.first);
        format!("{}-{:02}", prev.year(), prev.month())
    }

    pub fn next_param(&self) -> String {
        let next = self.first.checked_add_months(Months::new(1)).unwrap_or(self.first);
        format!("{}-{:02}", next.year(), next.month())
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date.year() == self.first.year() && date.month() == self.first.month()
    }

    pub fn events_on<'a>(&self, events: &'a [CalendarEvent], day: u32) -> Vec<&'a CalendarEvent> {
        events
            .iter()
            .filter(|e| self.contains(e.date) && e.date.day() == day)
            .collect()
    }
}

pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
        "Outubro", "Novembro", "Dezembro",
    ];
    NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lexdesk_core::{NewContract, NewProject, Record};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn february_2026_fills_four_weeks() {
        let grid = MonthGrid::new(2026, 2).unwrap();
        assert_eq!(grid.weeks.len(), 4);
        assert_eq!(grid.weeks[0][0], Some(1));
        assert_eq!(grid.weeks[3][6], Some(28));
        assert_eq!(grid.title(), "Fevereiro de 2026");
    }

    #[test]
    fn padding_before_first_day() {
        // 1 March 2026 is a Sunday, 1 April a Wednesday.
        let grid = MonthGrid::new(2026, 4).unwrap();
        assert_eq!(grid.weeks[0], [None, None, None, Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(grid.prev_param(), "2026-03");
        assert_eq!(grid.next_param(), "2026-05");
    }

    #[test]
    fn bad_month_param_falls_back_to_now() {
        let grid = MonthGrid::from_param(Some("2026-13"), at(2025, 7, 4));
        assert_eq!(grid.title(), "Julho de 2025");
    }

    #[test]
    fn events_skip_cancelled_and_sort_by_date() {
        let contract = Contract::from_insert(
            "c1".into(),
            NewContract {
                title: "Consultoria".into(),
                start_date: Some(at(2026, 1, 10)),
                end_date: Some(at(2026, 6, 30)),
                ..Default::default()
            },
            None,
            at(2026, 1, 1),
        );
        let mut cancelled = Project::from_insert(
            "p1".into(),
            NewProject {
                name: "Arquivado".into(),
                start_date: Some(at(2026, 1, 5)),
                ..Default::default()
            },
            None,
            at(2026, 1, 1),
        );
        cancelled.status = ProjectStatus::Cancelled;
        let active = Project::from_insert(
            "p2".into(),
            NewProject {
                name: "Due diligence".into(),
                end_date: Some(at(2026, 3, 1)),
                ..Default::default()
            },
            None,
            at(2026, 1, 1),
        );

        let events = events_from(&[contract], &[cancelled, active]);
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [EventKind::ContractStart, EventKind::ProjectEnd, EventKind::ContractEnd]
        );

        let next = upcoming(&events, at(2026, 2, 1), 5);
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].title, "Due diligence");

        let grid = MonthGrid::new(2026, 3).unwrap();
        assert_eq!(grid.events_on(&events, 1).len(), 1);
    }
}
