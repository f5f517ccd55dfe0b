use crate::fetch::{FetchError, MetadataFetcher};
use crate::service::ApiService;
use async_trait::async_trait;
use hyper_util::rt::{TokioExecutor, TokioIo};
use shared::metadata::{Link, MetadataResults, ProductSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// In-memory [`MetadataFetcher`] double that records what was asked of it.
pub struct FakeFetcher {
    results: MetadataResults,
    fail: Option<String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<ProductSpec>>>,
}

impl FakeFetcher {
    pub fn returning(results: MetadataResults) -> Self {
        FakeFetcher {
            results,
            fail: None,
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        FakeFetcher {
            results: MetadataResults::new(),
            fail: Some(message.to_string()),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Product lists passed to [`MetadataFetcher::fetch`], in call order.
    pub fn requested(&self) -> Vec<Vec<ProductSpec>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataFetcher for FakeFetcher {
    async fn fetch(&self, products: &[ProductSpec]) -> Result<MetadataResults, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(products.to_vec());

        match &self.fail {
            Some(message) => Err(FetchError::Transport(message.clone())),
            None => Ok(self.results.clone()),
        }
    }
}

pub fn sample_metadata() -> MetadataResults {
    let mut results = MetadataResults::new();
    results.insert(
        "test1".to_string(),
        vec![Link::new("https://github.com/issue/1")],
    );
    results.insert("test2".to_string(), vec![Link::new("https://other.com")]);
    results
}

/// Serves `service` on an ephemeral port and returns the port.
pub async fn spawn_api(service: ApiService) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let service = Arc::new(service);

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let svc = service.clone();

            tokio::spawn(async move {
                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, svc)
                    .await;
            });
        }
    });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    port
}
