//! Application display-name cache.
//!
//! Maps an app identifier (e.g. `com.apple.mobilephone`) to the display
//! name the peer reported for it, so each app is looked up once rather
//! than once per notification.  Keys are compared byte for byte.
//!
//! Eviction is by insertion order (ring discipline): once full, storing a
//! new app drops the entry stored longest ago, regardless of how often it
//! has been read.

use heapless::Deque;
use log::debug;

/// Number of app names kept.
pub const APP_NAME_CACHE_CAPACITY: usize = 30;

struct CacheEntry {
    app_id: Box<[u8]>,
    app_name: Box<[u8]>,
}

/// Bounded app-id → display-name cache.
pub struct AppNameCache {
    entries: Deque<CacheEntry, APP_NAME_CACHE_CAPACITY>,
}

impl Default for AppNameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AppNameCache {
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Look up the display name for `app_id`.
    pub fn get(&self, app_id: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| *e.app_id == *app_id)
            .map(|e| &*e.app_name)
    }

    pub fn contains(&self, app_id: &[u8]) -> bool {
        self.get(app_id).is_some()
    }

    /// Insert or overwrite.  Overwriting keeps the entry's original age.
    pub fn store(&mut self, app_id: &[u8], app_name: &[u8]) {
        if let Some(existing) = self.entries.iter_mut().find(|e| *e.app_id == *app_id) {
            existing.app_name = app_name.into();
            return;
        }

        if self.entries.is_full() {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(
                    "AppNameCache: evicted '{}'",
                    String::from_utf8_lossy(&evicted.app_id)
                );
            }
        }

        let entry = CacheEntry {
            app_id: app_id.into(),
            app_name: app_name.into(),
        };
        // Cannot fail: a slot was freed above.
        let _ = self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        APP_NAME_CACHE_CAPACITY
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
