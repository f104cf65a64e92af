//! Session-scoped response cache keyed by API path.
//!
//! Entries for a completed gameweek's live scores or picks are permanent.
//! Everything else lives for [`CACHE_TTL`] and is overwritten by the next
//! successful fetch once stale.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    fetched_at: Instant,
    permanent: bool,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.permanent || now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Shared path → payload store. Created per session and handed to the
/// fetcher; never evicts on its own.
#[derive(Debug)]
pub struct FetchCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::with_ttl(CACHE_TTL)
    }
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.get_at(path, Instant::now())
    }

    /// Look up `path` as of `now`. Stale entries read as absent.
    pub fn get_at(&self, path: &str, now: Instant) -> Option<Value> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(path)
            .filter(|e| e.is_fresh(now, self.ttl))
            .map(|e| e.payload.clone())
    }

    pub fn put(&self, path: &str, payload: Value, permanent: bool) {
        self.put_at(path, payload, permanent, Instant::now());
    }

    /// Store `payload` for `path`. A permanent entry is never replaced by a
    /// non-permanent one.
    pub fn put_at(&self, path: &str, payload: Value, permanent: bool, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !permanent && entries.get(path).is_some_and(|e| e.permanent) {
            return;
        }
        entries.insert(
            path.to_owned(),
            CacheEntry { payload, fetched_at: now, permanent },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a fetched `path` may be cached forever, given the session's
/// current gameweek. Only `event/{gw}/live` and
/// `entry/{id}/event/{gw}/picks` for `gw < current` qualify.
pub fn is_permanent(path: &str, current_event: Option<u32>) -> bool {
    let Some(current) = current_event else {
        return false;
    };
    gameweek_of(path).is_some_and(|gw| gw < current)
}

fn gameweek_of(path: &str) -> Option<u32> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["event", gw, "live"] => gw.parse().ok(),
        ["entry", id, "event", gw, "picks"] if id.chars().all(|c| c.is_ascii_digit()) => {
            gw.parse().ok()
        }
        _ => None,
    }
}
