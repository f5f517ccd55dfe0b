use crate::metrics_defs::FETCH_DURATION;
use async_trait::async_trait;
use http::StatusCode;
use shared::histogram;
use shared::metadata::{MetadataResults, ProductSpec};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Metadata fetch failed: {0}")]
    Transport(String),

    #[error("Metadata source returned status {0}")]
    Status(StatusCode),

    #[error("Failed to decode metadata: {0}")]
    Decode(String),
}

/// Fetches the metadata set for the requested products from the source of
/// truth.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, products: &[ProductSpec]) -> Result<MetadataResults, FetchError>;
}

pub struct HttpMetadataFetcher {
    client: reqwest::Client,
    source_url: String,
}

impl HttpMetadataFetcher {
    pub fn new(source_url: String) -> Self {
        HttpMetadataFetcher {
            client: reqwest::Client::new(),
            source_url,
        }
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, products: &[ProductSpec]) -> Result<MetadataResults, FetchError> {
        let query: Vec<(&str, String)> = products
            .iter()
            .map(|product| ("product", product.to_string()))
            .collect();

        let started = Instant::now();
        let response = self
            .client
            .get(&self.source_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        histogram!(FETCH_DURATION).record(started.elapsed().as_secs_f64());

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status()));
        }

        response
            .json::<MetadataResults>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::{Bytes, Incoming};
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioExecutor;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    async fn start_source_server(
        status: StatusCode,
        body: &'static str,
        queries: Arc<Mutex<Vec<String>>>,
    ) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");

        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = hyper_util::rt::TokioIo::new(stream);
                let queries = queries.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let queries = queries.clone();
                        async move {
                            queries
                                .lock()
                                .unwrap()
                                .push(req.uri().query().unwrap_or("").to_string());

                            let mut response = Response::new(Full::new(Bytes::from_static(
                                body.as_bytes(),
                            )));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });

                    if let Err(err) =
                        hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                            .serve_connection(io, service)
                            .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        port
    }

    fn products(specs: &[&str]) -> Vec<ProductSpec> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_fetch_sends_product_params() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let port = start_source_server(
            StatusCode::OK,
            r#"{"a.html": [{"URL": "https://github.com/wpt/issues/1"}]}"#,
            queries.clone(),
        )
        .await;

        let fetcher = HttpMetadataFetcher::new(format!("http://127.0.0.1:{port}/metadata"));
        let results = fetcher
            .fetch(&products(&["chrome-90", "firefox"]))
            .await
            .unwrap();

        assert_eq!(
            queries.lock().unwrap().as_slice(),
            ["product=chrome-90&product=firefox"]
        );
        assert_eq!(results["a.html"][0].url, "https://github.com/wpt/issues/1");
    }

    #[tokio::test]
    async fn test_fetch_source_error_status() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let port = start_source_server(StatusCode::SERVICE_UNAVAILABLE, "", queries).await;

        let fetcher = HttpMetadataFetcher::new(format!("http://127.0.0.1:{port}/metadata"));
        let result = fetcher.fetch(&products(&["chrome"])).await;

        assert!(matches!(
            result.unwrap_err(),
            FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)
        ));
    }

    #[tokio::test]
    async fn test_fetch_decode_error() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let port = start_source_server(StatusCode::OK, "not json", queries).await;

        let fetcher = HttpMetadataFetcher::new(format!("http://127.0.0.1:{port}/metadata"));
        let result = fetcher.fetch(&products(&["chrome"])).await;

        assert!(matches!(result.unwrap_err(), FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = HttpMetadataFetcher::new(format!("http://127.0.0.1:{port}/metadata"));
        let result = fetcher.fetch(&products(&["chrome"])).await;

        assert!(matches!(result.unwrap_err(), FetchError::Transport(_)));
    }
}
