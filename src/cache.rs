//! Per-manager name→URI cache with TTL.
//!
//! Populated by listing all of a manager's resources at once — so `N`
//! lookups of distinct names within one TTL window cost exactly one
//! `list` call — and evicted wholesale on TTL expiry or explicit
//! `invalidate`/`refresh`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Default TTL: 3 seconds, the mid-point of a short 1-5s band that keeps
/// repeated name lookups cheap without letting the cache go stale for long.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, String>,
    last_refresh: Option<Instant>,
}

/// A name→URI cache for one [`crate::manager::Manager`].
#[derive(Debug)]
pub struct NameUriCache {
    ttl: Duration,
    case_insensitive: bool,
    state: RwLock<CacheState>,
}

impl NameUriCache {
    #[must_use]
    pub fn new(ttl: Duration, case_insensitive: bool) -> Self {
        Self {
            ttl,
            case_insensitive,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn normalize(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    fn is_stale(state: &CacheState, ttl: Duration) -> bool {
        match state.last_refresh {
            Some(t) => t.elapsed() > ttl,
            None => true,
        }
    }

    /// True if the cache currently has no usable (non-stale) population.
    pub async fn needs_population(&self) -> bool {
        let state = self.state.read().await;
        Self::is_stale(&state, self.ttl)
    }

    /// Look up `name`, returning `None` if the cache is stale/empty or the
    /// name isn't present. Callers repopulate via [`Self::populate`] on a miss.
    pub async fn get(&self, name: &str) -> Option<String> {
        let state = self.state.read().await;
        if Self::is_stale(&state, self.ttl) {
            return None;
        }
        state.entries.get(&self.normalize(name)).cloned()
    }

    /// Replace the cache contents wholesale (used after a fresh `list`).
    /// Empty names are never stored.
    pub async fn populate(&self, entries: impl IntoIterator<Item = (String, String)>) {
        let mut state = self.state.write().await;
        state.entries.clear();
        for (name, uri) in entries {
            if name.is_empty() {
                continue;
            }
            state.entries.insert(self.normalize(&name), uri);
        }
        state.last_refresh = Some(Instant::now());
    }

    /// Insert or update a single entry without touching the rest of the cache
    /// or the refresh timestamp. Empty/absent names are ignored.
    pub async fn update(&self, name: &str, uri: &str) {
        if name.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        state.entries.insert(self.normalize(name), uri.to_string());
    }

    /// Remove a single entry, if present.
    pub async fn delete(&self, name: &str) {
        let mut state = self.state.write().await;
        state.entries.remove(&self.normalize(name));
    }

    /// Empty the cache; the next `get` will report a miss and force repopulation.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.last_refresh = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_cache_is_stale() {
        let cache = NameUriCache::new(Duration::from_secs(5), false);
        assert!(cache.needs_population().await);
        assert_eq!(cache.get("cpc1").await, None);
    }

    #[tokio::test]
    async fn populate_then_get_within_ttl() {
        let cache = NameUriCache::new(Duration::from_secs(5), false);
        cache
            .populate([("cpc1".to_string(), "/api/cpcs/1".to_string())])
            .await;
        assert_eq!(cache.get("cpc1").await.as_deref(), Some("/api/cpcs/1"));
        assert_eq!(cache.get("cpc2").await, None);
    }

    #[tokio::test]
    async fn stale_after_ttl_expiry() {
        let cache = NameUriCache::new(Duration::from_millis(10), false);
        cache
            .populate([("cpc1".to_string(), "/api/cpcs/1".to_string())])
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("cpc1").await, None);
        assert!(cache.needs_population().await);
    }

    #[tokio::test]
    async fn empty_names_never_stored() {
        let cache = NameUriCache::new(Duration::from_secs(5), false);
        cache.populate([(String::new(), "/api/cpcs/1".to_string())]).await;
        assert_eq!(cache.get("").await, None);
        cache.update("", "/api/cpcs/2").await;
        assert_eq!(cache.get("").await, None);
    }

    #[tokio::test]
    async fn invalidate_forces_repopulation() {
        let cache = NameUriCache::new(Duration::from_secs(5), false);
        cache
            .populate([("cpc1".to_string(), "/api/cpcs/1".to_string())])
            .await;
        cache.invalidate().await;
        assert_eq!(cache.get("cpc1").await, None);
        assert!(cache.needs_population().await);
    }

    #[tokio::test]
    async fn case_insensitive_lookup() {
        let cache = NameUriCache::new(Duration::from_secs(5), true);
        cache
            .populate([("CPC1".to_string(), "/api/cpcs/1".to_string())])
            .await;
        assert_eq!(cache.get("cpc1").await.as_deref(), Some("/api/cpcs/1"));
    }

    #[tokio::test]
    async fn update_and_delete_single_entry() {
        let cache = NameUriCache::new(Duration::from_secs(5), false);
        cache
            .populate([("cpc1".to_string(), "/api/cpcs/1".to_string())])
            .await;
        cache.update("cpc2", "/api/cpcs/2").await;
        assert_eq!(cache.get("cpc2").await.as_deref(), Some("/api/cpcs/2"));
        cache.delete("cpc1").await;
        assert_eq!(cache.get("cpc1").await, None);
    }
}
