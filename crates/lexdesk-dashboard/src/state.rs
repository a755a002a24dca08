//! Dashboard application state.

use lexdesk_core::{AuthConfig, EntityKind, LexdeskConfig, ListQuery};
use lexdesk_store::{Store, Stored};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::QueryCache;
use crate::error::DashboardError;
use crate::stats::{Alert, DashboardStats, StatsRange, StatsSource, create_stats_source};

/// Shared application state for the dashboard.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: LexdeskConfig,
    store: Arc<dyn Store>,
    stats: Arc<dyn StatsSource>,
    cache: QueryCache,
}

impl AppState {
    /// State with the stats source named by `dashboard.stats_source`.
    pub fn new(config: LexdeskConfig, store: Arc<dyn Store>) -> Self {
        let stats = create_stats_source(config.dashboard.stats_source, store.clone());
        Self::with_stats(config, store, stats)
    }

    pub fn with_stats(
        config: LexdeskConfig,
        store: Arc<dyn Store>,
        stats: Arc<dyn StatsSource>,
    ) -> Self {
        let cache = QueryCache::new(Duration::from_secs(config.dashboard.cache_ttl_seconds));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                stats,
                cache,
            }),
        }
    }

    pub fn config(&self) -> &LexdeskConfig {
        &self.inner.config
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.inner.config.auth
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub fn stats(&self) -> &dyn StatsSource {
        self.inner.stats.as_ref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Rows of `R` matching `query`, through the query cache.
    pub async fn list<R: Stored>(&self, query: &ListQuery) -> Result<Vec<R>, DashboardError> {
        query.check::<R>()?;
        let key = list_key(R::KIND, query);
        let rows = self
            .cache()
            .get_or_fetch(&key, || R::repository(self.store().as_ref()).list(query))
            .await?;
        Ok(rows)
    }

    pub async fn dashboard_stats(&self, range: StatsRange) -> Result<DashboardStats, DashboardError> {
        let key = QueryCache::key("/api/dashboard/advanced-stats", &[("range", range.as_str())]);
        let stats = self
            .cache()
            .get_or_fetch(&key, || self.stats().stats(range))
            .await?;
        Ok(stats)
    }

    pub async fn dashboard_alerts(&self) -> Result<Vec<Alert>, DashboardError> {
        let key = QueryCache::key("/api/dashboard/alerts", &[]);
        let alerts = self
            .cache()
            .get_or_fetch(&key, || self.stats().alerts())
            .await?;
        Ok(alerts)
    }

    /// Forget cached results that may include rows of `kind`.
    pub fn invalidate(&self, kind: EntityKind) {
        let cache = self.cache();
        let dropped = cache.invalidate_prefix(&format!("/api/{}?", kind.segment()))
            + cache.invalidate_prefix("/api/dashboard/")
            + cache.invalidate_prefix("/dashboard/panels/");
        tracing::debug!(entity = %kind, dropped, "query cache invalidated");
    }
}

fn list_key(kind: EntityKind, query: &ListQuery) -> String {
    let since = query.since.map(|d| d.to_rfc3339()).unwrap_or_default();
    let until = query.until.map(|d| d.to_rfc3339()).unwrap_or_default();
    let limit = query.limit.map(|n| n.to_string()).unwrap_or_default();
    let offset = query.offset.map(|n| n.to_string()).unwrap_or_default();
    QueryCache::key(
        &format!("/api/{}", kind.segment()),
        &[
            ("status", query.status.as_deref().unwrap_or_default()),
            ("type", query.kind.as_deref().unwrap_or_default()),
            ("clientId", query.client_id.as_deref().unwrap_or_default()),
            ("projectId", query.project_id.as_deref().unwrap_or_default()),
            ("contractId", query.contract_id.as_deref().unwrap_or_default()),
            ("since", since.as_str()),
            ("until", until.as_str()),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_core::{Client, NewClient};
    use lexdesk_store::MemoryStore;

    fn state() -> AppState {
        AppState::new(LexdeskConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn list_keys_share_the_entity_prefix() {
        let all = list_key(EntityKind::Contract, &ListQuery::default());
        let active = list_key(EntityKind::Contract, &ListQuery::default().with_status("active"));
        assert_eq!(all, "/api/contracts?");
        assert_eq!(active, "/api/contracts?status=active");
    }

    #[tokio::test]
    async fn mutation_invalidates_cached_lists() {
        let state = state();
        assert!(state.list::<Client>(&ListQuery::default()).await.unwrap().is_empty());

        let input = NewClient {
            name: "Ana".into(),
            ..Default::default()
        };
        state.store().clients().create(input, None).await.unwrap();
        // Still served from the cache.
        assert!(state.list::<Client>(&ListQuery::default()).await.unwrap().is_empty());

        state.invalidate(EntityKind::Client);
        assert_eq!(state.list::<Client>(&ListQuery::default()).await.unwrap().len(), 1);
    }
}
