use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Forge request failed for {0}: {1}")]
    Transport(String, String),

    #[error("Change submission rejected with status {0}")]
    ChangeRejected(StatusCode),

    #[error("Failed to build forge client: {0}")]
    ClientBuild(String),
}
