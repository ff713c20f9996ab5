//! Memoising layer for location resolution.
//!
//! Resolution is keyed by normalised name, so " Pier A" and "pier a" share
//! one entry. Failed resolutions are not cached.

use std::time::Duration;

use moka::sync::Cache as MokaCache;

use crate::domain::{Location, normalize_place};

use super::LocationResolver;
use super::error::LocationError;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Location resolver with caching.
///
/// Wraps any [`LocationResolver`] and memoises its answers.
pub struct CachedResolver<R> {
    inner: R,
    cache: MokaCache<String, Location>,
}

impl<R: LocationResolver> CachedResolver<R> {
    /// Create a new cached resolver.
    pub fn new(inner: R, config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    /// Access the underlying resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of names currently cached.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

impl<R: LocationResolver> LocationResolver for CachedResolver<R> {
    fn resolve(&self, name: &str) -> Result<Location, LocationError> {
        let key = normalize_place(name);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let location = self.inner.resolve(&key)?;
        self.cache.insert(key, location.clone());
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingResolver {
        calls: Cell<usize>,
    }

    impl LocationResolver for CountingResolver {
        fn resolve(&self, name: &str) -> Result<Location, LocationError> {
            self.calls.set(self.calls.get() + 1);
            if name.is_empty() {
                return Err(LocationError::EmptyName);
            }
            Ok(Location::named(name))
        }
    }

    fn resolver() -> CachedResolver<CountingResolver> {
        CachedResolver::new(
            CountingResolver {
                calls: Cell::new(0),
            },
            &CacheConfig::default(),
        )
    }

    #[test]
    fn repeated_names_hit_the_cache() {
        let cached = resolver();
        let a = cached.resolve("Pier A").unwrap();
        let b = cached.resolve("  pier a ").unwrap();
        assert_eq!(a, b);
        assert_eq!(cached.inner().calls.get(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cached = resolver();
        assert!(cached.resolve("").is_err());
        assert!(cached.resolve("").is_err());
        assert_eq!(cached.inner().calls.get(), 2);
    }

    #[test]
    fn invalidate_forces_a_fresh_lookup() {
        let cached = resolver();
        cached.resolve("Downtown").unwrap();
        cached.invalidate_cache();
        cached.resolve("Downtown").unwrap();
        assert_eq!(cached.inner().calls.get(), 2);
    }

    #[test]
    fn entry_count_tracks_distinct_names() {
        let cached = resolver();
        cached.resolve("Pier A").unwrap();
        cached.resolve("pier a").unwrap();
        cached.resolve("Downtown").unwrap();
        assert_eq!(cached.cache_entry_count(), 2);
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.max_capacity, 10_000);
    }
}
