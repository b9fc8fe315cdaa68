//! TTL response caches with stale-serve.
//!
//! Each resource class gets its own [`TtlCache`]. Entries are stamped when stored and
//! are fresh while `now - captured_at < ttl`. Expired entries are kept (moka is built
//! without a time-to-live) so they can stand in when a refresh fails; they are only
//! replaced by a newer value or dropped by the capacity bound.

use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;
use tokio::time::Instant;

use crate::config::CacheTtls;
use crate::errors::parse_status;
use crate::models::{
    Branch, Contract, ContractSummary, CostCenter, Employee, EmployeeDetail, JobTitle,
    LeaveRecord, VacationBalance, VacationSummary,
};

/// Default bound on the number of keys a single cache may hold.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// A cached value and the moment it was captured.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub captured_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            captured_at: Instant::now(),
        }
    }

    pub fn is_fresh_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) < ttl
    }
}

/// Concurrent map of `key -> (value, captured_at)` with a per-class freshness window.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    name: &'static str,
    ttl: Duration,
    entries: Cache<K, CacheEntry<V>>,
}

/// Cache holding a single value, e.g. a full list snapshot.
pub type SnapshotCache<V> = TtlCache<(), V>;

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_capacity(name, ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(name: &'static str, ttl: Duration, max_entries: u64) -> Self {
        Self {
            name,
            ttl,
            entries: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Returns the stored entry, fresh or not.
    pub async fn entry(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.get(key).await
    }

    /// Returns the value only while it is fresh.
    pub async fn get_fresh(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .await
            .filter(|entry| entry.is_fresh_at(Instant::now(), self.ttl))
            .map(|entry| entry.value)
    }

    /// Replaces the entry for `key` with `value`, stamped now.
    pub async fn insert(&self, key: K, value: V) {
        self.entries.insert(key, CacheEntry::new(value)).await;
    }

    /// Fresh hit, or fetch-and-store, or stale-serve on failure.
    ///
    /// `force` treats the entry as expired. The fetch runs without any lock held; two
    /// concurrent refreshes of the same key both fetch and the last one stored wins.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, force: bool, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let previous = self.entries.get(&key).await;
        if !force {
            if let Some(entry) = &previous {
                if entry.is_fresh_at(Instant::now(), self.ttl) {
                    tracing::debug!("{} cache HIT for {:?}", self.name, key);
                    return Ok(entry.value.clone());
                }
            }
        }

        tracing::debug!(
            "{} cache {} for {:?}",
            self.name,
            if force { "FORCED REFRESH" } else { "MISS" },
            key
        );
        match fetch().await {
            Ok(value) => {
                self.entries
                    .insert(key, CacheEntry::new(value.clone()))
                    .await;
                Ok(value)
            }
            Err(err) => {
                // Another task may have stored a newer value while we were fetching
                let latest = self.entries.get(&key).await.or(previous);
                match latest {
                    Some(entry) => {
                        let message = err.to_string();
                        tracing::warn!(
                            upstream_status = ?parse_status(&message),
                            "{} refresh failed for {:?}, serving value captured {:?} ago: {}",
                            self.name,
                            key,
                            entry.captured_at.elapsed(),
                            message
                        );
                        Ok(entry.value)
                    }
                    None => Err(err),
                }
            }
        }
    }
}

/// One cache per Talana resource class.
#[derive(Clone)]
pub struct TalanaCaches {
    pub employees: SnapshotCache<Vec<Employee>>,
    pub cost_centers: SnapshotCache<Vec<CostCenter>>,
    pub branches: SnapshotCache<Vec<Branch>>,
    pub job_titles: SnapshotCache<Vec<JobTitle>>,
    pub active_contracts: SnapshotCache<Vec<ContractSummary>>,
    pub person_detail: TtlCache<i64, EmployeeDetail>,
    pub contract_by_employee: TtlCache<i64, Contract>,
    /// Keyed by the lower-cased national id.
    pub contract_by_rut: TtlCache<String, Contract>,
    pub vacation_balance: TtlCache<i64, VacationBalance>,
    pub licenses: TtlCache<i64, Vec<LeaveRecord>>,
    pub vacation_detail: TtlCache<i64, Vec<LeaveRecord>>,
    pub vacation_summary: TtlCache<i64, Vec<VacationSummary>>,
}

impl TalanaCaches {
    pub fn new(ttls: &CacheTtls) -> Self {
        Self {
            employees: TtlCache::new("employees", ttls.employees),
            cost_centers: TtlCache::new("cost_centers", ttls.catalogs),
            branches: TtlCache::new("branches", ttls.catalogs),
            job_titles: TtlCache::new("job_titles", ttls.catalogs),
            active_contracts: TtlCache::new("active_contracts", ttls.active_contracts),
            person_detail: TtlCache::new("person_detail", ttls.details),
            contract_by_employee: TtlCache::new("contract_by_employee", ttls.details),
            contract_by_rut: TtlCache::new("contract_by_rut", ttls.details),
            vacation_balance: TtlCache::new("vacation_balance", ttls.details),
            licenses: TtlCache::new("licenses", ttls.details),
            vacation_detail: TtlCache::new("vacation_detail", ttls.details),
            vacation_summary: TtlCache::new("vacation_summary", ttls.details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch() {
        let cache: TtlCache<i64, String> = TtlCache::new("test", Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, String> = cache
                .get_or_fetch(1, false, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("v1".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "v1");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let cache: TtlCache<i64, u32> = TtlCache::new("test", Duration::ZERO);
        let first: Result<u32, String> = cache.get_or_fetch(7, false, || async { Ok(1) }).await;
        let second: Result<u32, String> = cache.get_or_fetch(7, false, || async { Ok(2) }).await;
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
        assert_eq!(cache.entry(&7).await.unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_stale_value_served_when_refresh_fails() {
        let cache: SnapshotCache<Vec<u32>> = TtlCache::new("test", Duration::ZERO);
        let _: Result<_, String> = cache.get_or_fetch((), false, || async { Ok(vec![1, 2]) }).await;

        let served: Result<Vec<u32>, String> = cache
            .get_or_fetch((), false, || async { Err("HTTP 500 calling x".to_string()) })
            .await;
        assert_eq!(served.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_error_propagates_without_prior_value() {
        let cache: TtlCache<i64, u32> = TtlCache::new("test", Duration::from_secs(60));
        let result: Result<u32, String> =
            cache.get_or_fetch(3, false, || async { Err("boom".to_string()) }).await;
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.entry(&3).await.is_none());
    }

    #[tokio::test]
    async fn test_force_bypasses_fresh_entry_but_stale_serves() {
        let cache: TtlCache<i64, u32> = TtlCache::new("test", Duration::from_secs(60));
        let _: Result<_, String> = cache.get_or_fetch(1, false, || async { Ok(10) }).await;

        let forced: Result<u32, String> = cache.get_or_fetch(1, true, || async { Ok(11) }).await;
        assert_eq!(forced.unwrap(), 11);

        let failed: Result<u32, String> =
            cache.get_or_fetch(1, true, || async { Err("down".to_string()) }).await;
        assert_eq!(failed.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_get_fresh_ignores_expired_entries() {
        let cache: TtlCache<i64, u32> = TtlCache::new("test", Duration::ZERO);
        cache.insert(1, 5).await;
        assert_eq!(cache.get_fresh(&1).await, None);
        assert_eq!(cache.entry(&1).await.map(|e| e.value), Some(5));
    }

    #[tokio::test]
    async fn test_concurrent_keys_are_independent() {
        let cache: Arc<TtlCache<i64, i64>> =
            Arc::new(TtlCache::new("test", Duration::from_secs(60)));
        let mut handles = vec![];
        for key in 0..32i64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let v: Result<i64, String> =
                    cache.get_or_fetch(key, false, || async move { Ok(key * 10) }).await;
                v.unwrap()
            }));
        }
        for (key, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), key as i64 * 10);
        }
        for key in 0..32i64 {
            assert_eq!(cache.get_fresh(&key).await, Some(key * 10));
        }
    }
}
