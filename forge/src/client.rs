use crate::errors::ForgeError;
use crate::types::{Attribution, ServiceToken, UserToken};
use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;
use shared::metadata::MetadataResults;
use std::time::Duration;

/// Client side of the forge's REST API.
///
/// The token and membership checks report the upstream status code rather than
/// applying policy; deciding what counts as logged in is the caller's job.
#[async_trait]
pub trait ForgeApi: Send + Sync {
    async fn check_token(&self, token: &UserToken) -> Result<StatusCode, ForgeError>;

    async fn check_org_membership(
        &self,
        org: &str,
        token: &UserToken,
    ) -> Result<StatusCode, ForgeError>;

    async fn submit_change(
        &self,
        metadata: &MetadataResults,
        attribution: &Attribution,
        token: &ServiceToken,
    ) -> Result<(), ForgeError>;
}

#[derive(Serialize)]
struct ChangeRequest<'a> {
    author_name: &'a str,
    author_email: &'a str,
    metadata: &'a MetadataResults,
}

pub struct HttpForge {
    client: reqwest::Client,
    api_url: String,
    repo: String,
}

impl HttpForge {
    pub fn new(api_url: String, repo: String, timeout: Duration) -> Result<Self, ForgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::ClientBuild(e.to_string()))?;

        Ok(HttpForge {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

#[async_trait]
impl ForgeApi for HttpForge {
    async fn check_token(&self, token: &UserToken) -> Result<StatusCode, ForgeError> {
        let response = self
            .client
            .get(self.endpoint("/user"))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| ForgeError::Transport("check_token".to_string(), e.to_string()))?;

        Ok(response.status())
    }

    async fn check_org_membership(
        &self,
        org: &str,
        token: &UserToken,
    ) -> Result<StatusCode, ForgeError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/user/memberships/orgs/{org}")))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| ForgeError::Transport("check_org_membership".to_string(), e.to_string()))?;

        Ok(response.status())
    }

    async fn submit_change(
        &self,
        metadata: &MetadataResults,
        attribution: &Attribution,
        token: &ServiceToken,
    ) -> Result<(), ForgeError> {
        let response = self
            .client
            .post(self.endpoint(&format!("/repos/{}/changes", self.repo)))
            .bearer_auth(token.as_str())
            .json(&ChangeRequest {
                author_name: &attribution.name,
                author_email: &attribution.email,
                metadata,
            })
            .send()
            .await
            .map_err(|e| ForgeError::Transport("submit_change".to_string(), e.to_string()))?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(()),
            status => Err(ForgeError::ChangeRejected(status)),
        }
    }
}
