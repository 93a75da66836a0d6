//! Visits and the location-keyed visit cache.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use url::Url;

use crate::dom::Document;

/// One navigable document instance.
#[derive(Debug, Clone)]
pub struct Visit {
    /// Identity key.
    pub location: Url,
    /// Detached copy of the document; never aliases the live page.
    pub document: Document,
    pub title: String,
    /// Vertical offset restored when re-entered through history.
    pub scroll_position: f64,
    /// Monotonic creation time, used for expiry.
    pub timestamp: Instant,
    /// Wall-clock creation time, for reporting.
    pub created_at: DateTime<Utc>,
    /// True only when served from a pre-existing cache entry this pass.
    pub loaded_from_cache: bool,
}

impl Visit {
    pub fn new(location: Url, document: Document, scroll_position: f64) -> Self {
        let title = document.title();
        Self {
            location,
            document,
            title,
            scroll_position,
            timestamp: Instant::now(),
            created_at: Utc::now(),
            loaded_from_cache: false,
        }
    }

    pub fn summary(&self) -> VisitSummary {
        VisitSummary {
            location: self.location.to_string(),
            title: self.title.clone(),
            scroll_position: self.scroll_position,
            created_at: self.created_at,
            loaded_from_cache: self.loaded_from_cache,
        }
    }
}

/// Serializable view of a visit without its document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitSummary {
    pub location: String,
    pub title: String,
    pub scroll_position: f64,
    pub created_at: DateTime<Utc>,
    pub loaded_from_cache: bool,
}

/// Location-keyed cache of visits with age-based expiry.
#[derive(Debug)]
pub struct VisitCache {
    entries: HashMap<Url, Visit>,
    enabled: bool,
    timeout: Duration,
}

impl VisitCache {
    pub fn new(enabled: bool, timeout: Duration) -> Self {
        Self { entries: HashMap::new(), enabled, timeout }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn is_fresh(&self, visit: &Visit, now: Instant) -> bool {
        now.saturating_duration_since(visit.timestamp) < self.timeout
    }

    /// Drop every visit whose age has reached the timeout.
    ///
    /// Returns the number of evicted entries.
    pub fn prune_stale(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        let timeout = self.timeout;
        self.entries
            .retain(|_, visit| now.saturating_duration_since(visit.timestamp) < timeout);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "pruned stale visits");
        }
        evicted
    }

    pub fn flag_all_as_cached(&mut self) {
        for visit in self.entries.values_mut() {
            visit.loaded_from_cache = true;
        }
    }

    /// Prune, then flag. Runs once at the start of each navigation pass.
    pub fn organize(&mut self) {
        self.prune_stale();
        self.flag_all_as_cached();
    }

    /// Look up a fresh visit for `location`.
    pub fn get(&self, location: &Url) -> Option<&Visit> {
        self.entries
            .get(location)
            .filter(|visit| self.is_fresh(visit, Instant::now()))
    }

    pub fn get_mut(&mut self, location: &Url) -> Option<&mut Visit> {
        self.entries.get_mut(location)
    }

    /// Insert or replace the visit for its location. No-op when disabled.
    pub fn insert(&mut self, visit: Visit) -> bool {
        if !self.enabled {
            return false;
        }
        self.entries.insert(visit.location.clone(), visit);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached locations, sorted for stable output.
    pub fn locations(&self) -> Vec<Url> {
        let mut locations: Vec<Url> = self.entries.keys().cloned().collect();
        locations.sort();
        locations
    }
}
