pub mod admin_service;
pub mod http;
pub mod metadata;
pub mod metrics_defs;
pub mod secrets;
