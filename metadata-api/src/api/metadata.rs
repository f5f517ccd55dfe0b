use crate::api::utils::json_response;
use crate::errors::{MetadataApiError, Result};
use crate::fetch::MetadataFetcher;
use crate::handler::RequestHandler;
use crate::query::ExistsQuery;
use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use shared::metadata::{MetadataResults, parse_product_params};
use std::sync::Arc;

/// Handler for `/metadata` lookups.
///
/// GET returns every annotation for the requested products. POST additionally
/// carries a link search query and narrows the result to tests with a matching
/// annotation.
pub struct MetadataHandler {
    fetcher: Arc<dyn MetadataFetcher>,
}

impl MetadataHandler {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        MetadataHandler { fetcher }
    }

    async fn try_handle(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        // Reject bad queries before fetching anything.
        let pattern = if request.method() == Method::POST {
            Some(extract_link_pattern(request.body())?)
        } else {
            None
        };

        let products = parse_product_params(request.uri().query())?;
        if products.is_empty() {
            return Err(MetadataApiError::MissingProducts);
        }

        let mut results = self.fetcher.fetch(&products).await?;
        if let Some(pattern) = pattern {
            results = filter_metadata(&pattern, &results);
        }

        json_response(&results)
    }
}

#[async_trait]
impl RequestHandler for MetadataHandler {
    fn name(&self) -> &'static str {
        "Metadata"
    }

    async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(e) => {
                if e.status().is_server_error() {
                    tracing::error!(error = %e, "Metadata request failed");
                } else {
                    tracing::warn!(error = %e, "Metadata request rejected");
                }
                e.to_response()
            }
        }
    }
}

fn extract_link_pattern(body: &Bytes) -> Result<String> {
    let query: ExistsQuery = serde_json::from_slice(body)
        .map_err(|e| MetadataApiError::MalformedQuery(e.to_string()))?;

    match query.link_pattern() {
        Some(pattern) => Ok(pattern.to_string()),
        None => Err(MetadataApiError::NonLinkQuery),
    }
}

/// Keeps the tests that have at least one annotation whose URL contains
/// `pattern`. A matching test keeps all of its annotations, not just the
/// matching ones.
pub fn filter_metadata(pattern: &str, metadata: &MetadataResults) -> MetadataResults {
    metadata
        .iter()
        .filter(|(_, links)| links.iter().any(|link| link.url.contains(pattern)))
        .map(|(test, links)| (test.clone(), links.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FakeFetcher, sample_metadata};
    use hyper::StatusCode;
    use shared::metadata::Link;

    fn get_request(uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn post_request(uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test]
    fn test_filter_keeps_matching_tests() {
        let filtered = filter_metadata("github.com", &sample_metadata());

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["test1"][0].url, "https://github.com/issue/1");
    }

    #[test]
    fn test_filter_keeps_all_links_of_a_matching_test() {
        let mut metadata = MetadataResults::new();
        metadata.insert(
            "a.html".to_string(),
            vec![
                Link::new("https://github.com/issue/7"),
                Link::new("https://crbug.com/42"),
            ],
        );

        let filtered = filter_metadata("github.com", &metadata);

        // The whole annotation list comes along, not just the matching link.
        assert_eq!(filtered["a.html"].len(), 2);
        assert_eq!(filtered["a.html"][1].url, "https://crbug.com/42");
    }

    #[test]
    fn test_filter_empty_pattern_keeps_annotated_tests() {
        let mut metadata = sample_metadata();
        metadata.insert("unannotated.html".to_string(), Vec::new());

        let filtered = filter_metadata("", &metadata);

        assert_eq!(filtered.len(), 2);
        assert!(!filtered.contains_key("unannotated.html"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let metadata = sample_metadata();

        let once = filter_metadata("github.com", &metadata);
        let twice = filter_metadata("github.com", &once);

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_get_returns_fetched_metadata() {
        let fetcher = Arc::new(FakeFetcher::returning(sample_metadata()));
        let handler = MetadataHandler::new(fetcher.clone());

        let response = handler.handle(get_request("/metadata?product=chrome")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let results: MetadataResults = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(results, sample_metadata());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(
            fetcher.requested(),
            vec![vec!["chrome".parse().unwrap()]]
        );
    }

    #[tokio::test]
    async fn test_get_without_products_rejected() {
        let fetcher = Arc::new(FakeFetcher::returning(sample_metadata()));
        let handler = MetadataHandler::new(fetcher.clone());

        let response = handler.handle(get_request("/metadata")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body().as_ref(),
            b"Missing required 'product' param\n"
        );
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_invalid_product_spec_rejected() {
        let fetcher = Arc::new(FakeFetcher::returning(sample_metadata()));
        let handler = MetadataHandler::new(fetcher);

        let response = handler
            .handle(get_request("/metadata?product=chrome-"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            response
                .body()
                .as_ref()
                .starts_with(b"Invalid product spec:")
        );
    }

    #[tokio::test]
    async fn test_post_filters_results() {
        let fetcher = Arc::new(FakeFetcher::returning(sample_metadata()));
        let handler = MetadataHandler::new(fetcher);

        let response = handler
            .handle(post_request(
                "/metadata?product=chrome",
                r#"{"exists": [{"link": "github.com/issue/1"}]}"#,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let results: MetadataResults = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("test1"));
    }

    #[tokio::test]
    async fn test_post_malformed_query_rejected() {
        let fetcher = Arc::new(FakeFetcher::returning(sample_metadata()));
        let handler = MetadataHandler::new(fetcher.clone());

        let response = handler
            .handle(post_request("/metadata?product=chrome", "not json"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_post_non_link_query_rejected() {
        let fetcher = Arc::new(FakeFetcher::returning(sample_metadata()));
        let handler = MetadataHandler::new(fetcher.clone());

        for body in [
            r#"{"exists": [{"pattern": "canvas"}]}"#,
            r#"{"exists": [{"link": "a"}, {"link": "b"}]}"#,
            r#"{"exists": []}"#,
        ] {
            let response = handler
                .handle(post_request("/metadata?product=chrome", body))
                .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.body().as_ref(),
                b"Error from request: non-link search query for /metadata\n"
            );
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_a_server_error() {
        let fetcher = Arc::new(FakeFetcher::failing("source down"));
        let handler = MetadataHandler::new(fetcher);

        let response = handler.handle(get_request("/metadata?product=chrome")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body().as_ref(),
            b"Metadata fetch failed: source down\n"
        );
    }
}
