use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Cache TTL cannot be 0")]
    ZeroTtl,

    #[error("Required organization cannot be empty")]
    EmptyOrg,

    #[error("Repository must be owner/name: {0}")]
    InvalidRepo(String),
}

/// Service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for API requests
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Where metadata comes from and how long responses stay cached
    pub metadata: MetadataConfig,
    /// The forge hosting the metadata repository
    pub forge: ForgeConfig,
    /// Named secrets, e.g. the bot account token
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}

impl Config {
    /// Validates the service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.metadata.validate()?;
        self.forge.validate()?;
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Metadata source and cache configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetadataConfig {
    /// URL serving the metadata archive
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub source_url: Url,
    /// How long a computed response may be served from cache
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum number of cached responses
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl MetadataConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_ttl_secs == 0 {
            return Err(ValidationError::ZeroTtl);
        }
        Ok(())
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    10_000
}

/// Forge API configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ForgeConfig {
    /// Base URL of the forge's REST API
    pub api_url: Url,
    /// Organization a user must belong to before triaging
    pub required_org: String,
    /// Repository receiving triaged metadata, as owner/name
    pub repo: String,
    /// Timeout for forge requests, in seconds
    #[serde(default = "default_forge_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl ForgeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.required_org.is_empty() {
            return Err(ValidationError::EmptyOrg);
        }

        match self.repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(())
            }
            _ => Err(ValidationError::InvalidRepo(self.repo.clone())),
        }
    }
}

fn default_forge_timeout_secs() -> u64 {
    30
}
