//! Search session state for map clients.
//!
//! Each client owns one `SearchSession`. Its view moves through
//! cleared -> in-flight -> resolved | failed. Each search takes a request
//! token; a result is applied only if its token is still the latest one
//! issued, so an older search that finishes late cannot overwrite a newer one.
//! `SessionStore` keys sessions by id so clients never share a view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::autocomplete::suggest_states;
use crate::models::{Bounds, LatLon, RenderableBoundary};
use crate::resolver::{BoundaryProvider, BoundaryResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Cleared,
    InFlight,
    Resolved,
    Failed,
}

/// Snapshot of everything the map page renders
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionView {
    pub search: String,
    pub suggestions: Vec<String>,
    pub phase: SearchPhase,
    pub loading: bool,
    pub place_name: String,
    pub boundary: RenderableBoundary,
    pub marker: Option<LatLon>,
    /// Where the map should fit its view
    pub bounds: Option<Bounds>,
    pub last_error: Option<String>,
    /// Token of the latest search started
    pub request: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct SearchSession<P> {
    resolver: Arc<BoundaryResolver<P>>,
    view: RwLock<SessionView>,
    next_request: AtomicU64,
}

impl<P: BoundaryProvider> SearchSession<P> {
    pub fn new(resolver: impl Into<Arc<BoundaryResolver<P>>>) -> Self {
        Self {
            resolver: resolver.into(),
            view: RwLock::new(SessionView::default()),
            next_request: AtomicU64::new(0),
        }
    }

    pub fn view(&self) -> SessionView {
        self.read().clone()
    }

    /// Update the search text and its suggestions
    pub fn set_search_text(&self, text: &str) -> SessionView {
        let mut view = self.write();
        view.search = text.to_string();
        view.suggestions = suggest_states(text)
            .into_iter()
            .map(String::from)
            .collect();
        view.clone()
    }

    /// Take a suggestion as the search text and hide the list
    pub fn select_suggestion(&self, suggestion: &str) -> SessionView {
        let mut view = self.write();
        view.search = suggestion.to_string();
        view.suggestions.clear();
        view.clone()
    }

    /// Set the search text and resolve it
    pub async fn search_for(&self, text: &str) -> SessionView {
        self.select_suggestion(text);
        self.search().await
    }

    /// Resolve the current search text.
    ///
    /// The previous boundary and marker are cleared before the lookup starts.
    /// An empty search text leaves the view untouched.
    pub async fn search(&self) -> SessionView {
        let (query, token) = {
            let mut view = self.write();
            if view.search.is_empty() {
                return view.clone();
            }

            let token = self.next_request.fetch_add(1, Ordering::SeqCst) + 1;
            view.request = token;
            view.phase = SearchPhase::InFlight;
            view.loading = true;
            view.boundary = RenderableBoundary::default();
            view.marker = None;
            view.bounds = None;
            view.last_error = None;
            view.updated_at = Some(Utc::now());
            (view.search.clone(), token)
        };

        let result = self.resolver.resolve(&query).await;

        let mut view = self.write();
        if view.request != token {
            debug!(
                "Discarding result of search {} for '{}', latest is {}",
                token, query, view.request
            );
            return view.clone();
        }

        match result {
            Ok(resolution) => {
                info!("Search {} resolved '{}'", token, resolution.display_name);
                view.phase = SearchPhase::Resolved;
                view.place_name = resolution.display_name;
                view.marker = Some(resolution.centroid);
                view.bounds = Some(resolution.bounds);
                view.boundary = resolution.boundary;
            }
            Err(e) => {
                error!("State boundary search for '{}' failed: {}", query, e);
                view.phase = SearchPhase::Failed;
                view.last_error = Some(e.to_string());
            }
        }
        view.loading = false;
        view.updated_at = Some(Utc::now());
        view.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionView> {
        self.view.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionView> {
        self.view.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct StoredSession<P> {
    session: Arc<SearchSession<P>>,
    last_seen: Instant,
}

/// Per-client sessions sharing one resolver.
///
/// Sessions idle for longer than `idle_ttl` are dropped when a new one is
/// created. A search already running keeps its session alive until it ends.
pub struct SessionStore<P> {
    resolver: Arc<BoundaryResolver<P>>,
    sessions: Mutex<HashMap<Uuid, StoredSession<P>>>,
    idle_ttl: Duration,
}

impl<P: BoundaryProvider> SessionStore<P> {
    pub fn new(resolver: impl Into<Arc<BoundaryResolver<P>>>, idle_ttl: Duration) -> Self {
        Self {
            resolver: resolver.into(),
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Resolver for stateless lookups
    pub fn resolver(&self) -> &BoundaryResolver<P> {
        &self.resolver
    }

    /// Start a session with a cleared view
    pub fn create(&self) -> (Uuid, Arc<SearchSession<P>>) {
        let now = Instant::now();
        let id = Uuid::new_v4();
        let session = Arc::new(SearchSession::new(Arc::clone(&self.resolver)));

        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, stored| now.duration_since(stored.last_seen) <= self.idle_ttl);
        if sessions.len() < before {
            debug!("Dropped {} idle sessions", before - sessions.len());
        }

        sessions.insert(
            id,
            StoredSession {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        info!("Created session {} ({} active)", id, sessions.len());
        (id, session)
    }

    /// Look up a session and mark it as used
    pub fn get(&self, id: &Uuid) -> Option<Arc<SearchSession<P>>> {
        let mut sessions = self.lock();
        let stored = sessions.get_mut(id)?;
        stored.last_seen = Instant::now();
        Some(Arc::clone(&stored.session))
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, StoredSession<P>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundaryFeature, GeocodeMatch};
    use crate::resolver::tests::{feature, kerala_provider, kerala_ring, FakeProvider};
    use crate::resolver::ResolutionError;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_typing_updates_suggestions() {
        let session = SearchSession::new(BoundaryResolver::new(FakeProvider::default()));

        let view = session.set_search_text("ut");
        assert_eq!(view.suggestions, vec!["Uttar Pradesh", "Uttarakhand"]);

        let view = session.set_search_text("");
        assert!(view.suggestions.is_empty());

        session.set_search_text("ker");
        let view = session.select_suggestion("Kerala");
        assert_eq!(view.search, "Kerala");
        assert!(view.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_is_ignored() {
        let session = SearchSession::new(BoundaryResolver::new(kerala_provider()));
        let view = session.search().await;
        assert_eq!(view.phase, SearchPhase::Cleared);
        assert_eq!(view.request, 0);
    }

    #[tokio::test]
    async fn test_successful_search() {
        let session = SearchSession::new(BoundaryResolver::new(kerala_provider()));
        let view = session.search_for("Kerala").await;

        assert_eq!(view.phase, SearchPhase::Resolved);
        assert!(!view.loading);
        assert_eq!(view.place_name, "Kerala");
        assert_eq!(view.boundary.rings().len(), 1);
        assert!(view.bounds.unwrap().contains(view.marker.unwrap()));
        assert_eq!(view.request, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_view_cleared() {
        let mut provider = kerala_provider();
        provider.features.clear();
        let session = SearchSession::new(BoundaryResolver::new(provider));

        let view = session.search_for("Kerala").await;
        assert_eq!(view.phase, SearchPhase::Failed);
        assert!(!view.loading);
        assert!(view.marker.is_none());
        assert!(view.boundary.is_empty());
        assert_eq!(
            view.last_error,
            Some(
                ResolutionError::NoBoundaries {
                    lat: 10.85,
                    lon: 76.27
                }
                .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_failed_search_drops_previous_result() {
        let session = SearchSession::new(BoundaryResolver::new(SlowProvider));
        let view = session.search_for("Goa").await;
        assert!(view.marker.is_some());

        let view = session.search_for("Atlantis").await;
        assert_eq!(view.phase, SearchPhase::Failed);
        assert!(view.marker.is_none());
        assert!(view.bounds.is_none());
        assert!(view.boundary.is_empty());
        assert_eq!(view.place_name, "Goa");
        assert_eq!(view.request, 2);
    }

    /// Knows every place except Atlantis; Kerala takes a while to geocode
    struct SlowProvider;

    impl BoundaryProvider for SlowProvider {
        async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>, ResolutionError> {
            let delay = if query == "Kerala" { 300 } else { 0 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if query == "Atlantis" {
                return Ok(None);
            }
            Ok(Some(GeocodeMatch {
                name: Some(query.to_string()),
                lat: Some(10.0),
                lon: Some(76.0),
            }))
        }

        async fn boundaries_around(
            &self,
            _point: LatLon,
        ) -> Result<Vec<BoundaryFeature>, ResolutionError> {
            Ok(vec![feature("any", 4, kerala_ring())])
        }
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let session = Arc::new(SearchSession::new(BoundaryResolver::new(SlowProvider)));

        let slow = {
            let session = session.clone();
            tokio::spawn(async move { session.search_for("Kerala").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = session.search_for("Goa").await;
        assert_eq!(fast.place_name, "Goa");
        assert_eq!(fast.request, 2);

        let late = slow.await.unwrap();
        assert_eq!(late.place_name, "Goa");
        assert_eq!(late.phase, SearchPhase::Resolved);
        assert_eq!(session.view().place_name, "Goa");
    }

    #[tokio::test]
    async fn test_store_sessions_are_independent() {
        let store = Arc::new(SessionStore::new(
            BoundaryResolver::new(SlowProvider),
            Duration::from_secs(60),
        ));
        let (first_id, first) = store.create();
        let (second_id, second) = store.create();
        assert_ne!(first_id, second_id);
        assert_eq!(store.len(), 2);

        let slow = tokio::spawn(async move { first.search_for("Kerala").await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = second.search_for("Goa").await;

        let late = slow.await.unwrap();
        assert_eq!(late.place_name, "Kerala");
        assert_eq!(late.request, 1);
        assert_eq!(fast.place_name, "Goa");
        assert_eq!(fast.request, 1);
        assert_eq!(store.get(&first_id).unwrap().view().place_name, "Kerala");
    }

    #[test]
    fn test_store_lookup_and_removal() {
        let store = SessionStore::new(BoundaryResolver::new(SlowProvider), Duration::from_secs(60));
        let (id, _) = store.create();

        assert!(store.get(&id).is_some());
        assert!(store.get(&Uuid::new_v4()).is_none());
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_idle_sessions_are_dropped() {
        let store = SessionStore::new(BoundaryResolver::new(SlowProvider), Duration::ZERO);
        let (stale, _) = store.create();
        std::thread::sleep(Duration::from_millis(5));
        let (fresh, _) = store.create();

        assert!(store.get(&stale).is_none());
        assert!(store.get(&fresh).is_some());
        assert_eq!(store.len(), 1);
    }
}
