//! Time-limited advice cache keyed by context fingerprint
//!
//! Entries expire after a fixed TTL (six hours by default) and are dropped the
//! first time a lookup finds them stale. The cache can be persisted as JSON so
//! repeated CLI runs reuse advice.

use super::AdviceError;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Default time-to-live for cached advice
pub const DEFAULT_ADVICE_TTL_SECONDS: i64 = 6 * 60 * 60;

/// One cached advice response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAdvice {
    pub advice: String,
    /// Model that produced the advice
    pub model: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedAdvice {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub total_lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub expirations: u64,
}

impl CacheMetrics {
    /// Get hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        if self.total_lookups == 0 {
            return 0.0;
        }
        (self.cache_hits as f64 / self.total_lookups as f64) * 100.0
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    entries: HashMap<String, CachedAdvice>,
}

/// Advice cache with TTL expiry
#[derive(Debug, Clone)]
pub struct AdviceCache {
    entries: HashMap<String, CachedAdvice>,
    ttl: Duration,
    metrics: CacheMetrics,
}

impl AdviceCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_ADVICE_TTL_SECONDS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            metrics: CacheMetrics::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
    }

    /// Look up fresh advice for a fingerprint
    pub fn get(&mut self, fingerprint: &str) -> Option<CachedAdvice> {
        self.get_at(fingerprint, Utc::now())
    }

    /// Look up fresh advice as of `now`, dropping the entry if it has expired
    pub fn get_at(&mut self, fingerprint: &str, now: DateTime<Utc>) -> Option<CachedAdvice> {
        self.metrics.total_lookups += 1;

        let expired = match self.entries.get(fingerprint) {
            Some(entry) if !entry.is_expired(now) => {
                self.metrics.cache_hits += 1;
                debug!(fingerprint, model = %entry.model, "Advice cache hit");
                return Some(entry.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(fingerprint);
            self.metrics.expirations += 1;
            debug!(fingerprint, "Advice cache entry expired");
        }
        self.metrics.cache_misses += 1;
        None
    }

    /// Store advice produced by `model`
    pub fn insert(&mut self, fingerprint: &str, model: &str, advice: &str) -> CachedAdvice {
        self.insert_at(fingerprint, model, advice, Utc::now())
    }

    pub fn insert_at(
        &mut self,
        fingerprint: &str,
        model: &str,
        advice: &str,
        now: DateTime<Utc>,
    ) -> CachedAdvice {
        let entry = CachedAdvice {
            advice: advice.to_string(),
            model: model.to_string(),
            cached_at: now,
            expires_at: now + self.ttl,
        };
        self.entries.insert(fingerprint.to_string(), entry.clone());
        entry
    }

    /// Drop one entry; returns whether it existed
    pub fn invalidate(&mut self, fingerprint: &str) -> bool {
        self.entries.remove(fingerprint).is_some()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        info!(removed, "Cleared advice cache");
    }

    /// Remove stale entries; returns how many were removed
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.metrics.expirations += removed as u64;
        removed
    }

    /// Load a cache file, starting empty if it does not exist
    pub fn load(path: &Path, ttl: Duration) -> Result<Self, AdviceError> {
        let mut cache = Self::with_ttl(ttl);
        if !path.exists() {
            return Ok(cache);
        }

        let content = std::fs::read_to_string(path)?;
        let file: CacheFile = serde_json::from_str(&content)?;
        cache.entries = file.entries;
        debug!(path = %path.display(), entries = cache.entries.len(), "Loaded advice cache");
        Ok(cache)
    }

    /// Write the cache as JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let file = CacheFile {
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write advice cache: {}", path.display()))?;
        Ok(())
    }
}

impl Default for AdviceCache {
    fn default() -> Self {
        Self::new()
    }
}
