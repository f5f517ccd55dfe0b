use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),
}

/// Read access to named secrets (bot tokens and the like).
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Result<String, SecretError>;
}

/// Secrets loaded once from configuration.
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        MemorySecretStore { secrets }
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, name: &str) -> Result<String, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_secret() {
        let store = MemorySecretStore::new(HashMap::from([(
            "bot-token".to_string(),
            "s3cret".to_string(),
        )]));

        assert_eq!(store.get("bot-token").unwrap(), "s3cret");
    }

    #[test]
    fn test_get_missing_secret() {
        let store = MemorySecretStore::new(HashMap::new());

        let err = store.get("bot-token").unwrap_err();
        assert_eq!(err.to_string(), "secret not found: bot-token");
    }
}
