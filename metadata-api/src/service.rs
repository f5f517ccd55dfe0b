use crate::errors::MetadataApiError;
use crate::handler::RequestHandler;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{box_response, make_boxed_error_response, make_message_response};
use std::pin::Pin;
use std::sync::Arc;

/// Routes requests to the metadata and triage handlers.
///
/// Bodies are buffered here, once, so handlers and the cache layer all see the
/// same `Bytes` and never re-read the stream.
pub struct ApiService {
    metadata: Arc<dyn RequestHandler>,
    triage: Arc<dyn RequestHandler>,
}

impl ApiService {
    pub fn new(metadata: Arc<dyn RequestHandler>, triage: Arc<dyn RequestHandler>) -> Self {
        ApiService { metadata, triage }
    }
}

impl Service<Request<Incoming>> for ApiService {
    type Response = Response<BoxBody<Bytes, MetadataApiError>>;
    type Error = MetadataApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = match req.uri().path() {
            "/metadata" => {
                // The method gate lives in front of the cache so an odd method
                // can never be answered from a cached entry.
                if req.method() != Method::GET && req.method() != Method::POST {
                    return Box::pin(async move {
                        Ok(box_response(MetadataApiError::InvalidMethod.to_response()))
                    });
                }
                self.metadata.clone()
            }
            "/metadata/triage" => self.triage.clone(),
            _ => {
                return Box::pin(
                    async move { Ok(make_boxed_error_response(StatusCode::NOT_FOUND)) },
                );
            }
        };

        Box::pin(async move {
            let (parts, body) = req.into_parts();

            // GET bodies never participate in handling; skip reading them.
            let body = if parts.method == Method::GET {
                Bytes::new()
            } else {
                match body.collect().await {
                    Ok(collected) => collected.to_bytes(),
                    Err(error) => {
                        tracing::error!(error = %error, "Failed to read request body");
                        let message = if parts.method == Method::PATCH {
                            "Failed to read PATCH request body"
                        } else {
                            "Failed to read request body"
                        };
                        return Ok(box_response(make_message_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            message,
                        )));
                    }
                }
            };

            let request = Request::from_parts(parts, body);
            let response = handler.handle(request).await;
            Ok(box_response(response))
        })
    }
}
