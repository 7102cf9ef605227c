//! Runtime configuration for the response cache

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::KeyPolicy;

const DEFAULT_MAX_ENTRIES: usize = 100;
const DEFAULT_FLUSH_DEBOUNCE_MS: u64 = 1000;

/// Cache settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Use the cache at all. When off, every request goes to the network.
    pub enabled: bool,
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// Delay before a write is persisted; further writes restart the wait
    pub flush_debounce_ms: u64,
    /// How request URLs are reduced to cache keys
    pub key_policy: KeyPolicy,
    /// Largest persisted cache accepted by storage, unlimited when `None`
    pub storage_quota_bytes: Option<usize>,
    /// Storage directory, XDG cache dir when `None`
    pub cache_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            flush_debounce_ms: DEFAULT_FLUSH_DEBOUNCE_MS,
            key_policy: KeyPolicy::default(),
            storage_quota_bytes: None,
            cache_dir: None,
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }
}
