//! Session-scoped response cache
//!
//! Two stores behind one lock: search results keyed by the full query
//! parameters, and manifests keyed by package id. Entries live for the
//! process lifetime; there is no TTL and no eviction short of [`clear`].
//! A failed or empty upstream fetch is cached too, so identical queries
//! within one session never repeat a failing network call.
//!
//! [`clear`]: ResponseCache::clear

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::lookup::error::FetchError;
use crate::lookup::types::PackageCandidate;

/// Composite key for the search store, case- and whitespace-insensitive
/// over (term, publisher filter, package-id filter)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey(String);

impl SearchKey {
    pub fn new(term: &str, publisher: Option<&str>, package_id: Option<&str>) -> Self {
        Self(format!(
            "{}|{}|{}",
            normalize(term),
            publisher.map(normalize).unwrap_or_default(),
            package_id.map(normalize).unwrap_or_default(),
        ))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Default)]
struct CacheState {
    search: HashMap<SearchKey, Vec<PackageCandidate>>,
    /// `None` is the cached not-found sentinel
    manifests: HashMap<String, Option<PackageCandidate>>,
    hits: u64,
    misses: u64,
}

/// Non-mutating snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub search_entries: usize,
    pub manifest_entries: usize,
}

impl CacheStatistics {
    /// Hit ratio as a percentage rounded to two decimals, 0 when no
    /// requests have been made yet
    pub fn efficiency(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        let pct = self.hits as f64 / total as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

/// In-memory search-result and manifest cache
#[derive(Debug, Default)]
pub struct ResponseCache {
    state: Mutex<CacheState>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached candidate list for `key`, or run `fetch` and cache
    /// whatever comes back. A fetch failure is cached as an empty list.
    pub async fn search_or_fetch<F, Fut>(&self, key: &SearchKey, fetch: F) -> Vec<PackageCandidate>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PackageCandidate>, FetchError>>,
    {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            if let Some(cached) = state.search.get(key) {
                state.hits += 1;
                debug!(?key, "search cache hit");
                return cached.clone();
            }
            state.misses += 1;
        }

        // Lock released during the fetch; two racing callers may both fetch
        // and the later write wins
        let candidates = match fetch().await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(?key, error = %err, "search fetch failed, caching empty result");
                Vec::new()
            }
        };

        self.lock().search.insert(key.clone(), candidates.clone());
        candidates
    }

    /// Return the cached manifest for `package_id`, or run `fetch` and cache
    /// the outcome. Both "not found" and a failed fetch are cached as `None`.
    pub async fn manifest_or_fetch<F, Fut>(
        &self,
        package_id: &str,
        fetch: F,
    ) -> Option<PackageCandidate>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<PackageCandidate>, FetchError>>,
    {
        let key = normalize(package_id);
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            if let Some(cached) = state.manifests.get(&key) {
                state.hits += 1;
                debug!(package_id, "manifest cache hit");
                return cached.clone();
            }
            state.misses += 1;
        }

        let manifest = match fetch().await {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(package_id, error = %err, "manifest fetch failed, caching not-found");
                None
            }
        };

        self.lock().manifests.insert(key, manifest.clone());
        manifest
    }

    /// Non-counting probe used by the prewarm path
    pub fn contains_search(&self, key: &SearchKey) -> bool {
        self.lock().search.contains_key(key)
    }

    /// Drop both stores and reset both counters
    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.search.clear();
        guard.manifests.clear();
        guard.hits = 0;
        guard.misses = 0;
        debug!("cache cleared");
    }

    pub fn stats(&self) -> CacheStatistics {
        let guard = self.lock();
        CacheStatistics {
            hits: guard.hits,
            misses: guard.misses,
            search_entries: guard.search.len(),
            manifest_entries: guard.manifests.len(),
        }
    }

    // A poisoned lock only means another caller panicked mid-update; the
    // counters are still usable
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
