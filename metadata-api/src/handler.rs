use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{Request, Response};

/// A request handler for a fully buffered request.
///
/// Handlers always produce a response; failures are mapped to error responses
/// rather than bubbling up, so the service layer never sees a handler error.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, request: Request<Bytes>) -> Response<Bytes>;
}
