use crate::cache_key::KeyDeriver;
use crate::handler::RequestHandler;
use crate::metrics_defs::{CACHE_HIT, CACHE_MISS};
use crate::store::CacheStore;
use async_trait::async_trait;
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use shared::counter;
use std::sync::Arc;

/// Serves responses from the cache, delegating misses to the inner handler.
///
/// Only 200 responses are stored, so transient failures are retried on the
/// next request. Concurrent misses for the same key may each recompute; the
/// last write wins.
pub struct CachingDispatcher<H> {
    inner: H,
    store: Arc<dyn CacheStore>,
    keys: KeyDeriver,
}

impl<H> CachingDispatcher<H> {
    pub fn new(inner: H, store: Arc<dyn CacheStore>, keys: KeyDeriver) -> Self {
        CachingDispatcher { inner, store, keys }
    }
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for CachingDispatcher<H> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let key = self
            .keys
            .derive(request.method(), request.uri(), request.body());

        if let Some(payload) = self.store.get(&key) {
            counter!(CACHE_HIT).increment(1);
            tracing::debug!(key = %key, "Serving metadata from cache");

            let mut response = Response::new(payload);
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            return response;
        }
        counter!(CACHE_MISS).increment(1);

        let response = self.inner.handle(request).await;
        if response.status() == StatusCode::OK {
            self.store.set(&key, response.body().clone());
        }
        response
    }
}
