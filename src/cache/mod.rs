//! Per-title metadata cache
//!
//! Players request the same title several times within a few seconds (different
//! headers, different protocol paths). The cache only exists to collapse those
//! requests into a single upstream fetch, so it is a pure expiry cache:
//! no size bound, no LRU, no negative caching.
//!
//! Expired entries are logically absent immediately but are only physically
//! removed by [`TtlCache::sweep`], which the background sweeper calls on a
//! fixed interval.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::defaults::DEFAULT_SWEEP_INTERVAL;
use crate::models::Title;

/// Source of "now" for expiry decisions
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; for deterministic expiry in tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Time-to-live map guarded by a reader/writer lock.
///
/// The lock is held only for the map operation itself, never across I/O.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

/// Cache of fetched title metadata keyed by public title id
pub type MetadataCache = TtlCache<Arc<Title>>;

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Cache backed by the wall clock
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Fetch a live entry; expired entries read as absent
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Insert or overwrite the entry for `key`
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.write().await;
        entries.insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Remove every entry whose expiry is at or before `now`; returns the count removed
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Sweep against the cache's own clock
    pub async fn sweep_expired(&self) -> usize {
        self.sweep(self.clock.now()).await
    }

    /// Physically stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Run [`TtlCache::sweep_expired`] every `every` until `cancellation_token` fires.
/// A zero interval is replaced by the default one.
pub fn spawn_sweeper<V>(
    cache: Arc<TtlCache<V>>,
    every: Duration,
    cancellation_token: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let every = if every.is_zero() {
        warn!(
            "Cache sweep interval must be positive, using {:?}",
            DEFAULT_SWEEP_INTERVAL
        );
        DEFAULT_SWEEP_INTERVAL
    } else {
        every
    };

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        ticker.tick().await;

        info!("Starting cache sweeper with interval: {:?}", every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.sweep_expired().await;
                    if removed > 0 {
                        debug!(removed, "Cache cleanup completed");
                    } else {
                        trace!("Cache cleanup completed");
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("Cache sweeper received cancellation signal, shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const TTL: Duration = Duration::from_secs(300);

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn cache() -> (Arc<ManualClock>, TtlCache<String>) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = TtlCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_get_after_put_returns_value_until_ttl() {
        let (clock, cache) = cache();
        cache.put("BV1", "meta".to_string(), TTL).await;

        assert_eq!(cache.get("BV1").await.as_deref(), Some("meta"));

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get("BV1").await.as_deref(), Some("meta"));

        // expiry instant itself is already expired
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("BV1").await, None);
        // still physically present until swept
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let (_, cache) = cache();
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn test_put_overwrites_and_resets_expiry() {
        let (clock, cache) = cache();
        cache.put("BV1", "old".to_string(), TTL).await;
        clock.advance(Duration::from_secs(200));
        cache.put("BV1", "new".to_string(), TTL).await;
        clock.advance(Duration::from_secs(200));

        assert_eq!(cache.get("BV1").await.as_deref(), Some("new"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_exactly_expired_entries() {
        let (clock, cache) = cache();
        cache.put("a", "a".to_string(), Duration::from_secs(60)).await;
        cache.put("b", "b".to_string(), Duration::from_secs(120)).await;
        cache.put("c", "c".to_string(), Duration::from_secs(180)).await;
        cache.put("d", "d".to_string(), Duration::from_secs(600)).await;

        // at exactly b's expiry: a and b go, c and d stay
        let now = clock.now() + chrono::Duration::seconds(120);
        let before = cache.len().await;
        let removed = cache.sweep(now).await;

        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, before - removed);
        assert_eq!(cache.get("c").await.as_deref(), Some("c"));
        assert_eq!(cache.get("d").await.as_deref(), Some("d"));
    }

    #[tokio::test]
    async fn test_sweep_on_empty_cache() {
        let (clock, cache) = cache();
        assert_eq!(cache.sweep(clock.now()).await, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_cancellation() {
        let (clock, cache) = cache();
        let cache = Arc::new(cache);
        cache.put("a", "a".to_string(), Duration::from_secs(30)).await;

        let token = CancellationToken::new();
        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(60), token.clone());

        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(cache.len().await, 0);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_sweeper_with_zero_interval_uses_default() {
        let (clock, cache) = cache();
        let cache = Arc::new(cache);
        cache.put("a", "a".to_string(), Duration::from_secs(30)).await;

        let token = CancellationToken::new();
        let handle = spawn_sweeper(cache.clone(), Duration::ZERO, token.clone());
        assert!(logs_contain("Cache sweep interval must be positive"));

        clock.advance(DEFAULT_SWEEP_INTERVAL);
        tokio::time::sleep(DEFAULT_SWEEP_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(cache.len().await, 0);

        token.cancel();
        handle.await.unwrap();
    }
}
