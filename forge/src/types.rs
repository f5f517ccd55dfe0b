use serde::{Deserialize, Serialize};

/// OAuth token belonging to a logged-in user. Only ever used to verify the
/// user's identity and organization membership, never to perform writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken(String);

impl UserToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token of the service's own bot account, used to author changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceToken(String);

impl ServiceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who a submitted change is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub email: String,
}
