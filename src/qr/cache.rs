// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for rendered QR images.
//!
//! Rendering is deterministic per token and tokens never change, so
//! entries never go stale. Eviction is purely least-recently-used.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

pub const DEFAULT_QR_CACHE_CAPACITY: usize = 512;

/// In-process LRU cache of token → image data URL.
pub struct QrCache {
    cache: Mutex<LruCache<String, String>>,
}

impl QrCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn get(&self, token: &str) -> Option<String> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(token).cloned()
    }

    pub fn put(&self, token: &str, image: String) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(token.to_string(), image);
        }
    }

    /// Cached image for `token`, rendering and storing it on a miss.
    pub fn get_or_encode(&self, token: &str) -> Option<String> {
        if let Some(image) = self.get(token) {
            return Some(image);
        }
        let image = super::encode(token)?;
        self.put(token, image.clone());
        Some(image)
    }
}

impl Default for QrCache {
    fn default() -> Self {
        Self::new(DEFAULT_QR_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_put_get() {
        let cache = QrCache::new(4);
        assert!(cache.get("tAAA").is_none());

        cache.put("tAAA", "image-a".to_string());
        assert_eq!(cache.get("tAAA").as_deref(), Some("image-a"));
        assert!(cache.get("tBBB").is_none());
    }

    #[test]
    fn cache_evicts_least_recent() {
        let cache = QrCache::new(2);
        cache.put("a", "1".to_string());
        cache.put("b", "2".to_string());
        cache.get("a");
        cache.put("c", "3".to_string());

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn get_or_encode_fills_cache() {
        let cache = QrCache::new(4);
        let image = cache.get_or_encode("tBBB").unwrap();
        assert_eq!(cache.get("tBBB"), Some(image));

        assert!(cache.get_or_encode(&"x".repeat(4000)).is_none());
    }
}
