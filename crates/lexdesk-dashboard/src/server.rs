//! Dashboard server implementation.

use chrono::Utc;
use lexdesk_store::Store;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::DashboardError;
use crate::routes;
use crate::state::AppState;

/// The dashboard server.
pub struct DashboardServer {
    state: AppState,
}

impl DashboardServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<(), DashboardError> {
        let addr = self.state.config().dashboard.bind_address();
        let app = routes::create_router(self.state);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DashboardError::StartupFailed(format!("{addr}: {e}")))?;
        tracing::info!(address = %addr, "Starting Lexdesk dashboard");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DashboardError::StartupFailed(e.to_string()))?;

        tracing::info!("dashboard stopped");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        self.state.config().dashboard.bind_address()
    }
}

/// Delete expired sessions every `interval`.
pub fn spawn_session_purge(store: Arc<dyn Store>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match store.sessions().purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired sessions purged"),
                Err(err) => tracing::warn!(error = %err, "session purge failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_core::{LexdeskConfig, NewUser, Session};
    use lexdesk_store::MemoryStore;

    #[test]
    fn test_server_creation() {
        let state = AppState::new(LexdeskConfig::default(), Arc::new(MemoryStore::new()));
        let server = DashboardServer::new(state);
        assert_eq!(server.bind_address(), "127.0.0.1:5000");
    }

    #[tokio::test]
    async fn test_purge_task_drops_expired_sessions() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let user = store.users().create(NewUser::default(), None).await.unwrap();
        let past = Utc::now() - chrono::Duration::hours(2);
        let expired = Session::new("old".into(), &user.id, past, chrono::Duration::hours(1));
        store.sessions().create(expired).await.unwrap();

        let task = spawn_session_purge(store.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert!(store.sessions().get("old", past).await.unwrap().is_none());
    }
}
