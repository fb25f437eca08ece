//! Search service / 搜索服务
//!
//! Entry point for every search call:
//! 1. parse the caller id (fail fast, before any backend)
//! 2. normalize the query (short queries return empty)
//! 3. dispatch to the backend chosen once from the deployment flags
//! 4. drop foreign rows and project to `FigureSummary`

use std::sync::Arc;

use super::backend::SearchBackend;
use super::error::{Result, SearchError};
use super::local::{FigureFilter, LocalMatcher};
use super::managed::{HttpIndexClient, IndexClient, ManagedIndex};
use super::mode::{select_mode, DeploymentFlags, SearchMode};
use super::projector::{project_all, FigureSummary, Timestamps};
use super::query::{NormalizedQuery, UserId, Window};
use crate::config::SearchConfig;
use crate::models::Figure;
use crate::store::FigureStore;

pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    local: LocalMatcher,
}

impl SearchService {
    /// Build from configuration, opening the index client only in managed mode / 根据配置构建
    pub fn from_config(config: &SearchConfig, store: Arc<dyn FigureStore>) -> Result<Self> {
        let client: Option<Arc<dyn IndexClient>> = match select_mode(&config.deployment) {
            SearchMode::Managed => Some(Arc::new(HttpIndexClient::new(&config.index)?)),
            SearchMode::Local => None,
        };
        Self::with_client(&config.deployment, &config.index.index_name, store, client)
    }

    /// Managed mode requires a client, local mode ignores it / 托管模式必须提供索引客户端
    pub fn with_client(
        flags: &DeploymentFlags,
        index_name: &str,
        store: Arc<dyn FigureStore>,
        client: Option<Arc<dyn IndexClient>>,
    ) -> Result<Self> {
        let backend: Arc<dyn SearchBackend> = match (select_mode(flags), client) {
            (SearchMode::Managed, Some(client)) => {
                Arc::new(ManagedIndex::new(client, index_name, LocalMatcher::new(store.clone())))
            }
            (SearchMode::Managed, None) => {
                return Err(SearchError::Index(
                    "managed search selected but no index client configured".to_string(),
                ));
            }
            (SearchMode::Local, _) => Arc::new(LocalMatcher::new(store.clone())),
        };
        tracing::info!("Search backend: {}", backend.mode());

        Ok(Self {
            backend,
            local: LocalMatcher::new(store),
        })
    }

    pub fn mode(&self) -> SearchMode {
        self.backend.mode()
    }

    pub async fn autocomplete(&self, query: &str, user_id: &str, limit: Option<usize>) -> Result<Vec<FigureSummary>> {
        let user = UserId::parse(user_id)?;
        let query = match NormalizedQuery::parse(query) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };
        let hits = self.backend.autocomplete(&query, &user, Window::limit(limit)).await?;
        Ok(finish(hits, &user, Timestamps::Omit))
    }

    pub async fn partial(
        &self,
        query: &str,
        user_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<FigureSummary>> {
        let user = UserId::parse(user_id)?;
        let query = match NormalizedQuery::parse(query) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };
        let hits = self.backend.partial(&query, &user, Window::new(limit, offset)).await?;
        Ok(finish(hits, &user, Timestamps::Omit))
    }

    pub async fn search(&self, query: &str, user_id: &str) -> Result<Vec<FigureSummary>> {
        let user = UserId::parse(user_id)?;
        let query = match NormalizedQuery::parse(query) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };
        let hits = self.backend.search(&query, &user).await?;
        tracing::debug!("search {:?}: {} hits via {}", query.text(), hits.len(), self.backend.mode());
        Ok(finish(hits, &user, Timestamps::Include))
    }

    /// Per-field filter, always served locally / 按字段过滤（始终本地执行）
    pub async fn filter(
        &self,
        filter: &FigureFilter,
        user_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<FigureSummary>> {
        let user = UserId::parse(user_id)?;
        let hits = self.local.filter(filter, &user, Window::new(limit, offset)).await?;
        Ok(finish(hits, &user, Timestamps::Include))
    }
}

fn finish(mut hits: Vec<Figure>, user: &UserId, timestamps: Timestamps) -> Vec<FigureSummary> {
    let before = hits.len();
    hits.retain(|f| user.owns(&f.user_id));
    if hits.len() != before {
        tracing::warn!("Dropped {} search rows not owned by {}", before - hits.len(), user);
    }
    project_all(&hits, timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::mode::DeploymentTier;
    use crate::search::testing::{collection, summary_ids};
    use crate::store::MemoryFigureStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PRODUCTION: DeploymentFlags = DeploymentFlags {
        tier: DeploymentTier::Production,
        test_mode: false,
        integration_test: false,
    };
    const TESTING: DeploymentFlags = DeploymentFlags {
        tier: DeploymentTier::Production,
        test_mode: true,
        integration_test: false,
    };

    /// Index client that either fails or returns every document it was given
    struct FakeIndex {
        docs: Option<Vec<Value>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndexClient for FakeIndex {
        async fn aggregate(&self, _pipeline: Vec<Value>) -> Result<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.docs.clone().ok_or_else(|| SearchError::Index("index down".to_string()))
        }
    }

    fn doc(f: &Figure) -> Value {
        json!({
            "_id": f.id, "manufacturer": f.manufacturer, "name": f.name, "scale": f.scale,
            "link": f.link, "location": f.location, "boxNumber": f.box_number,
            "userId": f.user_id, "createdAt": f.created_at, "updatedAt": f.updated_at,
        })
    }

    struct Fixture {
        service: SearchService,
        store: Arc<MemoryFigureStore>,
        index: Arc<FakeIndex>,
        alice: String,
        bob: String,
    }

    /// `leak_all_docs` makes the index ignore its user filter, `index_up: false` makes it fail
    fn fixture(flags: DeploymentFlags, leak_all_docs: bool, index_up: bool) -> Fixture {
        let alice = UserId::new_v4();
        let bob = UserId::new_v4();
        let figures = collection(&alice, &bob);
        let docs = if index_up {
            let all: Vec<Value> = figures.iter().map(doc).collect();
            Some(if leak_all_docs { all } else { Vec::new() })
        } else {
            None
        };
        let store = Arc::new(MemoryFigureStore::new(figures));
        let index = Arc::new(FakeIndex { docs, calls: AtomicUsize::new(0) });
        let service = SearchService::with_client(&flags, "figures", store.clone(), Some(index.clone())).unwrap();
        Fixture {
            service,
            store,
            index,
            alice: alice.to_string(),
            bob: bob.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mode_follows_flags() {
        assert_eq!(fixture(PRODUCTION, false, true).service.mode(), SearchMode::Managed);
        assert_eq!(fixture(TESTING, false, true).service.mode(), SearchMode::Local);

        let store = Arc::new(MemoryFigureStore::new(Vec::new()));
        let service = SearchService::with_client(&TESTING, "figures", store, None).unwrap();
        assert_eq!(service.mode(), SearchMode::Local);
    }

    #[test]
    fn test_managed_mode_without_client_is_rejected() {
        let store = Arc::new(MemoryFigureStore::new(Vec::new()));
        match SearchService::with_client(&PRODUCTION, "figures", store, None) {
            Err(SearchError::Index(msg)) => assert!(msg.contains("no index client")),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(service) => panic!("silently built a {} backend", service.mode()),
        }
    }

    #[tokio::test]
    async fn test_local_mode_never_touches_index() {
        let fx = fixture(TESTING, true, true);
        let hits = fx.service.autocomplete("Mik", &fx.alice, None).await.unwrap();
        assert_eq!(summary_ids(&hits), vec!["a1", "a2"]);
        let hits = fx.service.partial("kasa", &fx.alice, None, None).await.unwrap();
        assert_eq!(summary_ids(&hits), vec!["a2"]);
        let hits = fx.service.search("Good Smile", &fx.alice).await.unwrap();
        assert_eq!(summary_ids(&hits), vec!["a1", "a3", "a4"]);
        assert_eq!(fx.index.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_queries_are_empty_in_both_modes() {
        for flags in [PRODUCTION, TESTING] {
            let fx = fixture(flags, true, true);
            for raw in ["", " ", "m", "  k  "] {
                assert!(fx.service.autocomplete(raw, &fx.alice, None).await.unwrap().is_empty());
                assert!(fx.service.partial(raw, &fx.alice, Some(5), Some(0)).await.unwrap().is_empty());
                assert!(fx.service.search(raw, &fx.alice).await.unwrap().is_empty());
            }
            assert_eq!(fx.store.calls(), 0);
            assert_eq!(fx.index.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_invalid_identifier_fails_fast() {
        for flags in [PRODUCTION, TESTING] {
            let fx = fixture(flags, true, true);
            for bad in ["", "alice", "{\"$gt\": \"\"}", "123"] {
                let errs = [
                    fx.service.autocomplete("Miku", bad, None).await.unwrap_err(),
                    fx.service.partial("Miku", bad, None, None).await.unwrap_err(),
                    fx.service.search("Miku", bad).await.unwrap_err(),
                    fx.service.filter(&FigureFilter::default(), bad, None, None).await.unwrap_err(),
                ];
                for err in errs {
                    assert!(matches!(err, SearchError::InvalidIdentifier(_)), "{:?}", err);
                }
            }
            assert_eq!(fx.store.calls(), 0);
            assert_eq!(fx.index.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_foreign_rows_from_index_are_dropped() {
        // the index ignores its user filter and returns everything
        let fx = fixture(PRODUCTION, true, true);
        for user in [&fx.alice, &fx.bob] {
            let lists = [
                fx.service.autocomplete("Mik", user, None).await.unwrap(),
                fx.service.partial("Mik", user, None, None).await.unwrap(),
                fx.service.search("Mik", user).await.unwrap(),
            ];
            for hits in lists {
                assert!(!hits.is_empty());
                assert!(hits.iter().all(|h| &h.user_id == user));
            }
        }
    }

    #[tokio::test]
    async fn test_managed_failure_policy() {
        let fx = fixture(PRODUCTION, false, false);

        // autocomplete / partial degrade to local results
        let auto = fx.service.autocomplete("Mik", &fx.alice, None).await.unwrap();
        assert_eq!(summary_ids(&auto), vec!["a1", "a2"]);
        let part = fx.service.partial("mi", &fx.alice, Some(2), Some(1)).await.unwrap();
        assert_eq!(summary_ids(&part), vec!["a2", "a3"]);

        // general search surfaces the failure
        let err = fx.service.search("Good Smile", &fx.alice).await.unwrap_err();
        assert!(matches!(err, SearchError::Index(_)));
        assert_eq!(fx.index.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_injection_query_is_safe_in_both_modes() {
        for (flags, index_up) in [(PRODUCTION, true), (PRODUCTION, false), (TESTING, true)] {
            let fx = fixture(flags, false, index_up);
            let auto = fx.service.autocomplete("a.b*c(", &fx.alice, None).await.unwrap();
            let part = fx.service.partial("a.b*c(", &fx.alice, None, None).await.unwrap();
            if fx.service.mode() == SearchMode::Local || !index_up {
                assert_eq!(summary_ids(&auto), vec!["a5"]);
                assert_eq!(summary_ids(&part), vec!["a5"]);
            }
            // search has no fallback, only check it does not blow up when the index is up
            if index_up {
                fx.service.search("a.b*c(", &fx.alice).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_projection_per_operation() {
        let fx = fixture(TESTING, false, true);
        let auto = fx.service.autocomplete("Mik", &fx.alice, None).await.unwrap();
        assert!(auto.iter().all(|h| h.created_at.is_none()));
        let all = fx.service.search("Mikasa", &fx.alice).await.unwrap();
        assert_eq!(all[0].created_at.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(all[0].box_number, "BOX-a2");
    }

    #[tokio::test]
    async fn test_filter_runs_locally_in_managed_mode() {
        let fx = fixture(PRODUCTION, false, false);
        let filter = FigureFilter {
            manufacturer: Some("kotobukiya".to_string()),
            ..Default::default()
        };
        let hits = fx.service.filter(&filter, &fx.bob, None, None).await.unwrap();
        assert_eq!(summary_ids(&hits), vec!["b2"]);
        assert_eq!(fx.index.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryFigureStore::unreachable());
        let service = SearchService::with_client(&TESTING, "figures", store, None).unwrap();
        let user = UserId::new_v4().to_string();
        let err = service.partial("Miku", &user, None, None).await.unwrap_err();
        assert!(matches!(err, SearchError::Store(_)));
    }

    #[test]
    fn test_from_config_local_needs_no_endpoint() {
        let store = Arc::new(MemoryFigureStore::new(Vec::new()));
        let service = SearchService::from_config(&SearchConfig::default(), store).unwrap();
        assert_eq!(service.mode(), SearchMode::Local);
    }

    #[test]
    fn test_from_config_managed_requires_endpoint() {
        let store = Arc::new(MemoryFigureStore::new(Vec::new()));
        let mut config = SearchConfig::default();
        config.deployment = PRODUCTION;
        assert!(SearchService::from_config(&config, store.clone()).is_err());

        config.index.endpoint = "https://data.example.com/app/figbox/endpoint/data/v1".to_string();
        let service = SearchService::from_config(&config, store).unwrap();
        assert_eq!(service.mode(), SearchMode::Managed);
    }
}
