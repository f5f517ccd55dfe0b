pub mod api;
pub mod cache_key;
pub mod caching;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod handler;
pub mod metrics_defs;
pub mod query;
pub mod service;
pub mod store;
pub mod testutils;

use crate::api::metadata::MetadataHandler;
use crate::api::triage::TriageHandler;
use crate::cache_key::KeyDeriver;
use crate::caching::CachingDispatcher;
use crate::errors::MetadataApiError;
use crate::fetch::HttpMetadataFetcher;
use crate::service::ApiService;
use crate::store::{CacheStore, GzipCache, MemoryCache};
use forge::client::HttpForge;
use forge::session::MemorySessionStore;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use shared::secrets::MemorySecretStore;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Wires up the handler stack from `config` and serves it until one of the
/// listeners fails.
pub async fn run(config: config::Config) -> Result<(), MetadataApiError> {
    let store: Arc<dyn CacheStore> = Arc::new(GzipCache::new(MemoryCache::new(
        Duration::from_secs(config.metadata.cache_ttl_secs),
        config.metadata.cache_capacity,
    )));
    let fetcher = Arc::new(HttpMetadataFetcher::new(
        config.metadata.source_url.to_string(),
    ));
    let metadata = CachingDispatcher::new(MetadataHandler::new(fetcher), store, KeyDeriver::new());

    let forge_client = Arc::new(HttpForge::new(
        config.forge.api_url.to_string(),
        config.forge.repo.clone(),
        Duration::from_secs(config.forge.http_timeout_secs),
    )?);
    let sessions = Arc::new(MemorySessionStore::new());
    let secrets = Arc::new(MemorySecretStore::new(config.secrets.clone()));
    let triage = TriageHandler::new(
        forge_client,
        sessions,
        secrets,
        config.forge.required_org.clone(),
    );

    let api_service = ApiService::new(Arc::new(metadata), Arc::new(triage));

    let ready = Arc::new(AtomicBool::new(true));
    let admin_service: AdminService<MetadataApiError> = AdminService::new(ready);

    let api_task = run_http_service(&config.listener.host, config.listener.port, api_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );
    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
