use crate::client::ForgeApi;
use crate::errors::ForgeError;
use crate::types::{Attribution, ServiceToken, UserToken};
use async_trait::async_trait;
use http::StatusCode;
use shared::metadata::MetadataResults;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedChange {
    pub metadata: MetadataResults,
    pub attribution: Attribution,
    pub token: String,
}

/// In-memory [`ForgeApi`] double. Responses can be swapped out per test; an
/// `Err` string turns into a transport error for the matching operation.
pub struct FakeForge {
    pub token_response: Result<StatusCode, String>,
    pub membership_response: Result<StatusCode, String>,
    pub submit_response: Result<(), String>,
    calls: Mutex<Vec<&'static str>>,
    submitted: Mutex<Vec<RecordedChange>>,
}

impl FakeForge {
    /// A forge that accepts every token and submission.
    pub fn permissive() -> Self {
        FakeForge {
            token_response: Ok(StatusCode::OK),
            membership_response: Ok(StatusCode::OK),
            submit_response: Ok(()),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Changes that made it through [`ForgeApi::submit_change`].
    pub fn submitted(&self) -> Vec<RecordedChange> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForgeApi for FakeForge {
    async fn check_token(&self, _token: &UserToken) -> Result<StatusCode, ForgeError> {
        self.calls.lock().unwrap().push("check_token");
        self.token_response
            .clone()
            .map_err(|cause| ForgeError::Transport("check_token".to_string(), cause))
    }

    async fn check_org_membership(
        &self,
        _org: &str,
        _token: &UserToken,
    ) -> Result<StatusCode, ForgeError> {
        self.calls.lock().unwrap().push("check_org_membership");
        self.membership_response
            .clone()
            .map_err(|cause| ForgeError::Transport("check_org_membership".to_string(), cause))
    }

    async fn submit_change(
        &self,
        metadata: &MetadataResults,
        attribution: &Attribution,
        token: &ServiceToken,
    ) -> Result<(), ForgeError> {
        self.calls.lock().unwrap().push("submit_change");
        self.submit_response
            .clone()
            .map_err(|cause| ForgeError::Transport("submit_change".to_string(), cause))?;

        self.submitted.lock().unwrap().push(RecordedChange {
            metadata: metadata.clone(),
            attribution: attribution.clone(),
            token: token.as_str().to_string(),
        });
        Ok(())
    }
}
