//! Route definitions for the dashboard.

use axum::{Router, middleware, routing::get};
use lexdesk_core::{
    Client, Contract, ContractClause, ContractTemplate, Document, Project, Transaction, User,
};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::assets;
use crate::auth;
use crate::handlers;
use crate::state::AppState;

/// Create the dashboard router.
///
/// Everything except the landing page, login, health and static files sits
/// behind [`auth::require_auth`].
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        // Pages
        .route("/clients", get(handlers::clients))
        .route("/contracts", get(handlers::contracts))
        .route("/projects", get(handlers::projects))
        .route("/documents", get(handlers::documents))
        .route("/financial", get(handlers::financial))
        .route("/suppliers", get(handlers::suppliers))
        .route("/employees", get(handlers::employees))
        .route("/settings", get(handlers::settings))
        .route("/profile", get(handlers::profile))
        .route("/calendar", get(handlers::calendar))
        .route("/dashboard/panels/{tab}", get(handlers::dashboard_panel))
        // Data endpoints
        .route("/api/dashboard/advanced-stats", get(handlers::advanced_stats))
        .route("/api/dashboard/alerts", get(handlers::alerts))
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/users", get(api::list::<User>).post(auth::create_user))
        .route(
            "/api/users/{id}",
            get(api::fetch::<User>)
                .patch(api::update::<User>)
                .delete(api::remove::<User>),
        );

    let protected = [
        api::crud::<Client>,
        api::crud::<Contract>,
        api::crud::<ContractTemplate>,
        api::crud::<ContractClause>,
        api::crud::<Project>,
        api::crud::<Transaction>,
        api::crud::<Document>,
    ]
    .into_iter()
    .fold(protected, |router, register| register(router))
    .route_layer(middleware::from_fn(auth::require_auth));

    let public = Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/api/login", get(auth::login_page).post(auth::login_submit))
        .route("/api/logout", get(auth::logout))
        .route("/static/{*path}", get(assets::serve));

    public
        .merge(protected)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth::resolve_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
