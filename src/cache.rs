//! Time-bounded memoization of provider responses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::ProviderError;
use crate::traits::{DistanceMatrixProvider, MatrixRequest, ProviderMatrix};

/// Traffic-aware durations go stale quickly.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Wraps a provider and reuses successful responses for the same travel
/// mode and location list until `ttl` has passed. Errors are not cached.
/// Expired entries are dropped whenever a new response is stored.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, ProviderMatrix)>>,
}

impl<P> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of entries held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn cache_key(request: &MatrixRequest<'_>) -> String {
    let places = request
        .locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|");
    format!("{}:{}", request.mode.as_str(), places)
}

impl<P: DistanceMatrixProvider> DistanceMatrixProvider for CachedProvider<P> {
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        let key = cache_key(request);
        {
            let mut entries = self.entries.lock();
            let fresh = entries
                .get(&key)
                .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
                .map(|(_, matrix)| matrix.clone());
            if let Some(matrix) = fresh {
                debug!(locations = request.locations.len(), "distance matrix cache hit");
                return Ok(matrix);
            }
            entries.remove(&key);
        }

        // The lock is not held across the provider call.
        let matrix = self.inner.matrix_for(request)?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, (fetched_at, _)| fetched_at.elapsed() < self.ttl);
        if entries.len() < before {
            debug!(purged = before - entries.len(), "expired distance matrices dropped");
        }
        entries.insert(key, (Instant::now(), matrix.clone()));
        Ok(matrix)
    }
}
