//! # lexdesk-dashboard
//!
//! Web console for the Lexdesk legal practice manager.
//!
//! This crate provides:
//! - Server-rendered pages for clients, contracts, projects, documents,
//!   finances, the team and the calendar
//! - A dashboard with headline figures, alerts and lazily loaded tab panels
//! - A JSON CRUD API per entity under `/api/{entity}`
//! - Session cookie authentication with Argon2 password hashes
//!
//! ## Tech Stack
//!
//! - Axum for HTTP server
//! - Static assets bundled via `rust-embed`
//! - HTMX + Alpine.js for interactivity (minimal JS)
//! - Tailwind CSS for styling

pub mod api;
pub mod assets;
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod panels;
pub mod routes;
pub mod server;
pub mod state;
pub mod stats;
pub mod templates;

pub use error::DashboardError;
pub use routes::create_router;
pub use server::{DashboardServer, spawn_session_purge};
pub use state::AppState;
pub use stats::{DashboardStats, StatsRange, StatsSource};
