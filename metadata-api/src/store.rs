use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use hyper::body::Bytes;
use moka::sync::Cache;
use std::io::{Read, Write};
use std::time::Duration;

/// Byte-oriented response cache.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Bytes>;
    fn set(&self, key: &str, payload: Bytes);
}

/// In-process cache with a fixed TTL and bounded capacity.
pub struct MemoryCache {
    cache: Cache<String, Bytes>,
}

impl MemoryCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        MemoryCache { cache }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        self.cache.get(key)
    }

    fn set(&self, key: &str, payload: Bytes) {
        self.cache.insert(key.to_string(), payload);
    }
}

/// Wraps a store so payloads are gzip-compressed at rest.
///
/// An entry that no longer decompresses is discarded and reported as a miss,
/// letting the caller recompute it.
pub struct GzipCache<S> {
    inner: S,
}

impl<S> GzipCache<S> {
    pub fn new(inner: S) -> Self {
        GzipCache { inner }
    }
}

impl<S: CacheStore> CacheStore for GzipCache<S> {
    fn get(&self, key: &str) -> Option<Bytes> {
        let compressed = self.inner.get(key)?;

        let mut decoder = GzDecoder::new(compressed.as_ref());
        let mut payload = Vec::new();
        match decoder.read_to_end(&mut payload) {
            Ok(_) => Some(Bytes::from(payload)),
            Err(error) => {
                tracing::warn!(
                    key = %key,
                    error = %error,
                    "Discarding cache entry that failed to decompress"
                );
                None
            }
        }
    }

    fn set(&self, key: &str, payload: Bytes) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        if let Err(error) = encoder.write_all(&payload) {
            tracing::warn!(key = %key, error = %error, "Failed to compress cache entry");
            return;
        }
        match encoder.finish() {
            Ok(compressed) => self.inner.set(key, Bytes::from(compressed)),
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Failed to compress cache entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new(Duration::from_secs(60), 100);
        cache.set("key", Bytes::from_static(b"payload"));

        assert_eq!(cache.get("key"), Some(Bytes::from_static(b"payload")));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_memory_cache_expires_entries() {
        let cache = MemoryCache::new(Duration::from_millis(50), 100);
        cache.set("key", Bytes::from_static(b"payload"));
        assert!(cache.get("key").is_some());

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.get("key"), None);
    }

    #[test]
    fn test_gzip_round_trip() {
        let cache = GzipCache::new(MemoryCache::new(Duration::from_secs(60), 100));
        cache.set("key", Bytes::from_static(b"{\"a.html\":[]}"));

        assert_eq!(
            cache.get("key"),
            Some(Bytes::from_static(b"{\"a.html\":[]}"))
        );
    }

    #[test]
    fn test_gzip_overwrite_keeps_latest() {
        let cache = GzipCache::new(MemoryCache::new(Duration::from_secs(60), 100));
        cache.set("key", Bytes::from_static(b"first"));
        cache.set("key", Bytes::from_static(b"second"));

        assert_eq!(cache.get("key"), Some(Bytes::from_static(b"second")));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let inner = MemoryCache::new(Duration::from_secs(60), 100);
        inner.set("bad", Bytes::from_static(b"definitely not gzip"));

        let cache = GzipCache::new(inner);
        assert_eq!(cache.get("bad"), None);
    }
}
