//! Memoized journey aggregation keyed by dataset fingerprint and query.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use cubo_core::types::SaleRecord;
use cubo_core::OfferLookup;

use crate::aggregator::aggregate_journeys;
use crate::types::{CustomerJourney, JourneyQuery};

/// Caches aggregation results per dataset fingerprint.
///
/// The fingerprint must be derived from the rows and lookup inputs, so any
/// change in fetched data misses the cache. Entries for other fingerprints
/// are evicted the next time the cache fills up.
pub struct JourneyCache {
    entries: DashMap<(String, JourneyQuery), Arc<Vec<CustomerJourney>>>,
    capacity: usize,
}

impl JourneyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Return the cached journeys for `(fingerprint, query)` or aggregate them.
    pub fn get_or_compute(
        &self,
        fingerprint: &str,
        rows: &[SaleRecord],
        lookup: &OfferLookup,
        query: &JourneyQuery,
    ) -> Arc<Vec<CustomerJourney>> {
        let key = (fingerprint.to_string(), query.clone());
        if let Some(hit) = self.entries.get(&key) {
            debug!(fingerprint, "Journey cache hit");
            return Arc::clone(hit.value());
        }

        let journeys = Arc::new(aggregate_journeys(rows, lookup, query));
        if self.entries.len() >= self.capacity {
            self.evict(fingerprint);
        }
        self.entries.insert(key, Arc::clone(&journeys));
        debug!(fingerprint, cached = self.entries.len(), "Journey cache miss");
        journeys
    }

    /// Drop entries from other datasets; clear everything if still full.
    fn evict(&self, current: &str) {
        self.entries.retain(|(fingerprint, _), _| fingerprint == current);
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for JourneyCache {
    fn default() -> Self {
        Self::new(64)
    }
}
