//! Regeneration cache for rendered pages
//!
//! Every route keeps its last rendered HTML and when it was generated. Once a
//! route's revalidation interval has passed the entry turns stale: it is
//! still served, and one background regeneration may run for it at a time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Most not-found markers kept at once; the oldest goes first
pub const MAX_NOT_FOUND_MARKERS: usize = 256;

/// How long a not-found marker waits for the loading page to come back
pub const NOT_FOUND_TTL: Duration = Duration::from_secs(60);

/// A rendered page
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub html: Arc<str>,
    pub generated_at: Instant,
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Younger than the revalidation interval
    Fresh(Arc<str>),
    /// Older than the interval; serve it and regenerate
    Stale(Arc<str>),
    Missing,
}

/// Rendered pages keyed by route
#[derive(Debug, Default)]
pub struct PageCache {
    pages: RwLock<HashMap<String, CachedPage>>,
    /// Routes with a background regeneration in flight
    refreshing: Mutex<HashSet<String>>,
    /// Routes whose last background generation found nothing, and when
    not_found: Mutex<HashMap<String, Instant>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, route: &str, revalidate: Duration) -> Lookup {
        self.lookup_at(route, revalidate, Instant::now()).await
    }

    /// Classify the entry for `route` as seen at `now`
    pub async fn lookup_at(&self, route: &str, revalidate: Duration, now: Instant) -> Lookup {
        let pages = self.pages.read().await;
        match pages.get(route) {
            Some(page) if now.saturating_duration_since(page.generated_at) < revalidate => {
                Lookup::Fresh(page.html.clone())
            }
            Some(page) => Lookup::Stale(page.html.clone()),
            None => Lookup::Missing,
        }
    }

    pub async fn store(&self, route: &str, html: String) {
        self.store_at(route, html, Instant::now()).await
    }

    pub async fn store_at(&self, route: &str, html: String, generated_at: Instant) {
        tracing::debug!("Cached {}", route);
        self.pages.write().await.insert(
            route.to_string(),
            CachedPage {
                html: html.into(),
                generated_at,
            },
        );
    }

    pub async fn remove(&self, route: &str) {
        if self.pages.write().await.remove(route).is_some() {
            tracing::debug!("Evicted {}", route);
        }
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }

    /// Claim the regeneration of `route`; `false` if one is already running
    pub async fn begin_refresh(&self, route: &str) -> bool {
        self.refreshing.lock().await.insert(route.to_string())
    }

    pub async fn end_refresh(&self, route: &str) {
        self.refreshing.lock().await.remove(route);
    }

    /// Remember that a background generation of `route` found no document
    pub async fn mark_not_found(&self, route: &str) {
        self.mark_not_found_at(route, Instant::now()).await
    }

    /// Record a marker at `now`, dropping expired ones and keeping the set bounded
    pub async fn mark_not_found_at(&self, route: &str, now: Instant) {
        let mut markers = self.not_found.lock().await;
        markers.retain(|_, at| now.saturating_duration_since(*at) < NOT_FOUND_TTL);

        if markers.len() >= MAX_NOT_FOUND_MARKERS && !markers.contains_key(route) {
            let oldest = markers
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(route, _)| route.clone());
            if let Some(oldest) = oldest {
                markers.remove(&oldest);
            }
        }
        markers.insert(route.to_string(), now);
    }

    /// Consume a not-found marker left by a background generation
    pub async fn take_not_found(&self, route: &str) -> bool {
        self.take_not_found_at(route, Instant::now()).await
    }

    pub async fn take_not_found_at(&self, route: &str, now: Instant) -> bool {
        self.not_found
            .lock()
            .await
            .remove(route)
            .is_some_and(|at| now.saturating_duration_since(at) < NOT_FOUND_TTL)
    }

    /// Number of not-found markers currently held
    pub async fn not_found_len(&self) -> usize {
        self.not_found.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_fresh_then_stale() {
        let cache = PageCache::new();
        let start = Instant::now();
        assert_eq!(cache.lookup_at("/", HOUR, start).await, Lookup::Missing);

        cache.store_at("/", "<p>home</p>".to_string(), start).await;
        let html: Arc<str> = Arc::from("<p>home</p>");
        assert_eq!(
            cache.lookup_at("/", HOUR, start + Duration::from_secs(10)).await,
            Lookup::Fresh(html.clone())
        );
        assert_eq!(
            cache.lookup_at("/", HOUR, start + HOUR).await,
            Lookup::Stale(html)
        );
    }

    #[tokio::test]
    async fn test_routes_are_independent() {
        let cache = PageCache::new();
        cache.store("/post/a", "a".to_string()).await;
        assert_eq!(cache.lookup("/post/b", HOUR).await, Lookup::Missing);
        assert_eq!(cache.len().await, 1);

        cache.remove("/post/a").await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_single_refresh_per_route() {
        let cache = PageCache::new();
        assert!(cache.begin_refresh("/").await);
        assert!(!cache.begin_refresh("/").await);
        assert!(cache.begin_refresh("/post/a").await);
        cache.end_refresh("/").await;
        assert!(cache.begin_refresh("/").await);
    }

    #[tokio::test]
    async fn test_not_found_marker_is_consumed() {
        let cache = PageCache::new();
        assert!(!cache.take_not_found("/post/x").await);
        cache.mark_not_found("/post/x").await;
        assert!(cache.take_not_found("/post/x").await);
        assert!(!cache.take_not_found("/post/x").await);
    }

    #[tokio::test]
    async fn test_not_found_markers_stay_bounded() {
        let cache = PageCache::new();
        let start = Instant::now();
        for i in 0..MAX_NOT_FOUND_MARKERS + 100 {
            let at = start + Duration::from_millis(i as u64);
            cache.mark_not_found_at(&format!("/post/junk-{}", i), at).await;
        }
        assert_eq!(cache.not_found_len().await, MAX_NOT_FOUND_MARKERS);

        // The oldest markers made room for the newest
        let now = start + Duration::from_secs(1);
        assert!(!cache.take_not_found_at("/post/junk-0", now).await);
        let newest = format!("/post/junk-{}", MAX_NOT_FOUND_MARKERS + 99);
        assert!(cache.take_not_found_at(&newest, now).await);
    }

    #[tokio::test]
    async fn test_not_found_markers_expire() {
        let cache = PageCache::new();
        let start = Instant::now();
        cache.mark_not_found_at("/post/old", start).await;
        assert!(!cache.take_not_found_at("/post/old", start + NOT_FOUND_TTL).await);

        cache.mark_not_found_at("/post/a", start).await;
        cache.mark_not_found_at("/post/b", start + NOT_FOUND_TTL).await;
        assert_eq!(cache.not_found_len().await, 1);
    }
}
