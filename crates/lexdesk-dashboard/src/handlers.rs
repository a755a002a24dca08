//! Request handlers for the dashboard.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use lexdesk_core::{
    Client, Contract, ContractClause, ContractTemplate, Document, ListQuery, Project, Transaction,
    User,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::CurrentUser;
use crate::calendar::{MonthGrid, events_from};
use crate::error::DashboardError;
use crate::pages;
use crate::panels::{self, Panel};
use crate::state::AppState;
use crate::stats::{Alert, DashboardStats, StatsRange};

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    #[serde(default)]
    pub month: Option<String>,
}

// =============================================================================
// Page Handlers (HTML responses)
// =============================================================================

/// `/`: the landing page for visitors, the dashboard once signed in.
pub async fn home(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(query): Query<HomeQuery>,
) -> Result<Html<String>, DashboardError> {
    let Some(CurrentUser(user)) = user else {
        return Ok(Html(pages::landing_page(query.notice.as_deref())));
    };
    let range = StatsRange::from_param(query.range.as_deref())?;
    let stats = state.dashboard_stats(range).await?;
    let alerts = state.dashboard_alerts().await?;
    Ok(Html(pages::dashboard_page(&user, &stats, &alerts, range)))
}

pub async fn clients(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, DashboardError> {
    let clients = state.list::<Client>(&ListQuery::default()).await?;
    Ok(Html(pages::clients_page(&user, &clients)))
}

pub async fn contracts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, DashboardError> {
    let all = ListQuery::default();
    let contracts = state.list::<Contract>(&all).await?;
    let templates = state.list::<ContractTemplate>(&all).await?;
    let clauses = state.list::<ContractClause>(&all).await?;
    let clients = state.list::<Client>(&all).await?;
    Ok(Html(pages::contracts_page(&user, &contracts, &templates, &clauses, &clients)))
}

pub async fn projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, DashboardError> {
    let all = ListQuery::default();
    let projects = state.list::<Project>(&all).await?;
    let clients = state.list::<Client>(&all).await?;
    let users = state.list::<User>(&all).await?;
    Ok(Html(pages::projects_page(&user, &projects, &clients, &users)))
}

pub async fn documents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, DashboardError> {
    let all = ListQuery::default();
    let documents = state.list::<Document>(&all).await?;
    let clients = state.list::<Client>(&all).await?;
    let projects = state.list::<Project>(&all).await?;
    Ok(Html(pages::documents_page(&user, &documents, &clients, &projects)))
}

pub async fn financial(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, DashboardError> {
    let all = ListQuery::default();
    let transactions = state.list::<Transaction>(&all).await?;
    let clients = state.list::<Client>(&all).await?;
    Ok(Html(pages::financial_page(&user, &transactions, &clients)))
}

pub async fn suppliers(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(pages::suppliers_page(&user))
}

pub async fn employees(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, DashboardError> {
    let users = state.list::<User>(&ListQuery::default()).await?;
    Ok(Html(pages::employees_page(&user, &users)))
}

pub async fn settings(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Html<String> {
    Html(pages::settings_page(&user, state.config(), state.store().backend_name()))
}

pub async fn profile(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(pages::profile_page(&user))
}

pub async fn calendar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Html<String>, DashboardError> {
    let grid = MonthGrid::from_param(query.month.as_deref(), Utc::now());
    let all = ListQuery::default();
    let contracts = state.list::<Contract>(&all).await?;
    let projects = state.list::<Project>(&all).await?;
    let events = events_from(&contracts, &projects);
    Ok(Html(pages::calendar_page(&user, &grid, &events)))
}

/// `/dashboard/panels/{tab}`: one tab of the dashboard, as an HTML fragment.
pub async fn dashboard_panel(
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Html<String>, DashboardError> {
    let panel: Panel = tab.parse()?;
    let range = StatsRange::from_param(query.range.as_deref())?;
    let data = panels::load(&state, panel, range).await?;
    Ok(Html(panels::render(panel, &data, Utc::now())))
}

// =============================================================================
// Data endpoints (JSON responses)
// =============================================================================

pub async fn advanced_stats(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DashboardStats>, DashboardError> {
    let range = StatsRange::from_param(query.range.as_deref())?;
    Ok(Json(state.dashboard_stats(range).await?))
}

pub async fn alerts(State(state): State<AppState>) -> Result<Json<Vec<Alert>>, DashboardError> {
    Ok(Json(state.dashboard_alerts().await?))
}

/// Liveness check, including the store.
pub async fn health(State(state): State<AppState>) -> Response {
    let store = state.store();
    match store.ping().await {
        Ok(()) => Json(json!({ "status": "ok", "store": store.backend_name() })).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "store": store.backend_name() })),
            )
                .into_response()
        }
    }
}

/// Fallback for unknown paths.
pub async fn not_found(user: Option<CurrentUser>, uri: Uri) -> Response {
    let path = uri.path();
    if path.starts_with("/api/") {
        return DashboardError::NotFound(format!("no route for {path}")).into_response();
    }
    let user = user.map(|CurrentUser(u)| u);
    (StatusCode::NOT_FOUND, Html(pages::not_found_page(user.as_ref(), path))).into_response()
}
