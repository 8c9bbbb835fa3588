use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::schema::errors::SchemaError;
use crate::schema::validator::Validator;

/// Thread-safe cache of compiled [`Validator`]s.
///
/// Compiling a validator walks the schema graph and compiles every regex it
/// contains, so it is worth doing once per `(method, route, part)` rather
/// than per request. Reads take a shared lock; a miss compiles outside any
/// lock and inserts with a double check, so two threads racing on the same
/// key both end up with the same entry.
///
/// The cache is owned by whoever validates (the OpenAPI middleware holds
/// one per instance); there is no process-global state.
#[derive(Clone, Default)]
pub struct ValidatorCache {
    cache: Arc<RwLock<HashMap<String, Validator>>>,
}

impl ValidatorCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the validator cached under `key`, building and inserting it on
    /// a miss.
    pub fn get_or_build(
        &self,
        key: &str,
        build: impl FnOnce() -> Result<Validator, SchemaError>,
    ) -> Result<Validator, SchemaError> {
        {
            let cache = self.cache.read().expect("validator cache lock poisoned");
            if let Some(validator) = cache.get(key) {
                debug!(cache_key = %key, "validator cache hit");
                return Ok(validator.clone());
            }
        }

        let built = build()?;
        let mut cache = self.cache.write().expect("validator cache lock poisoned");
        // Another thread might have built the validator while we compiled.
        if let Some(validator) = cache.get(key) {
            debug!(cache_key = %key, "validator built by another thread");
            return Ok(validator.clone());
        }
        debug!(cache_key = %key, cache_size = cache.len() + 1, "validator compiled and cached");
        cache.insert(key.to_string(), built.clone());
        Ok(built)
    }

    /// Number of cached validators.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cache.read().expect("validator cache lock poisoned").len()
    }

    /// Drop every cached validator. Mainly useful in tests.
    pub fn clear(&self) {
        self.cache
            .write()
            .expect("validator cache lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn trivial_validator() -> Validator {
        Validator::from_fn(Ok)
    }

    #[test]
    fn test_builder_runs_once_per_key() {
        let cache = ValidatorCache::new();
        let builds = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_build("GET /pets:body", || {
                    builds.fetch_add(1, Ordering::Relaxed);
                    Ok(trivial_validator())
                })
                .expect("builds");
        }

        assert_eq!(builds.load(Ordering::Relaxed), 1);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_build_failure_is_not_cached() {
        let cache = ValidatorCache::new();
        let result = cache.get_or_build("GET /pets:body", || {
            Err(SchemaError::CannotBuild("broken".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(cache.size(), 0);

        // A later successful build for the same key is accepted.
        cache
            .get_or_build("GET /pets:body", || Ok(trivial_validator()))
            .expect("builds");
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = ValidatorCache::new();
        cache
            .get_or_build("a", || Ok(trivial_validator()))
            .expect("builds");
        cache
            .get_or_build("b", || Ok(trivial_validator()))
            .expect("builds");
        assert_eq!(cache.size(), 2);
        cache.clear();
        assert_eq!(cache.size(), 0);
    }
}
