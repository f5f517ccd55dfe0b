use crate::http::{box_response, make_boxed_error_response, make_message_response};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Health and readiness probe surface, served on its own listener.
pub struct AdminService<E> {
    ready: Arc<AtomicBool>,
    _error: PhantomData<E>,
}

impl<E> AdminService<E> {
    pub fn new(ready: Arc<AtomicBool>) -> Self {
        Self {
            ready,
            _error: PhantomData,
        }
    }
}

impl<E> Service<Request<Incoming>> for AdminService<E>
where
    E: Send + Sync + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let ready = self.ready.clone();

        Box::pin(async move {
            let ok = || box_response(make_message_response(StatusCode::OK, "ok"));

            let res = match req.uri().path() {
                "/health" => ok(),
                "/ready" => match ready.load(Ordering::Acquire) {
                    true => ok(),
                    false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                },
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
