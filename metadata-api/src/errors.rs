use crate::fetch::FetchError;
use forge::errors::ForgeError;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use shared::http::make_message_response;
use shared::metadata::ProductSpecError;
use thiserror::Error;

/// Result type alias for metadata-api operations
pub type Result<T, E = MetadataApiError> = std::result::Result<T, E>;

/// Errors that can occur while serving metadata requests
#[derive(Error, Debug)]
pub enum MetadataApiError {
    #[error("Invalid HTTP method")]
    InvalidMethod,

    #[error("{0}")]
    Product(#[from] ProductSpecError),

    #[error("Missing required 'product' param")]
    MissingProducts,

    #[error("{0}")]
    MalformedQuery(String),

    #[error("Error from request: non-link search query for /metadata")]
    NonLinkQuery,

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Forge(#[from] ForgeError),

    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataApiError {
    /// Malformed requests are the client's fault; everything else is ours or
    /// an upstream's.
    pub fn status(&self) -> StatusCode {
        match self {
            MetadataApiError::InvalidMethod
            | MetadataApiError::Product(_)
            | MetadataApiError::MissingProducts
            | MetadataApiError::MalformedQuery(_)
            | MetadataApiError::NonLinkQuery => StatusCode::BAD_REQUEST,
            MetadataApiError::Fetch(_)
            | MetadataApiError::Forge(_)
            | MetadataApiError::Serialization(_)
            | MetadataApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> Response<Bytes> {
        make_message_response(self.status(), &self.to_string())
    }
}
