use crate::handler::RequestHandler;
use crate::metrics_defs::{TRIAGE_REJECTED, TRIAGE_SUBMITTED};
use async_trait::async_trait;
use forge::client::ForgeApi;
use forge::errors::ForgeError;
use forge::session::{Session, SessionStore, User, session_id_from_headers};
use forge::types::{Attribution, ServiceToken};
use http::header::CONTENT_TYPE;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use shared::counter;
use shared::http::make_message_response;
use shared::metadata::MetadataResults;
use shared::secrets::{SecretError, SecretStore};
use std::sync::Arc;
use thiserror::Error;

/// Secret under which the bot account's forge token is stored.
pub const BOT_TOKEN_SECRET: &str = "forge-bot-token";

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid HTTP method; only accept PATCH request")]
    InvalidMethod,

    #[error("Invalid content-type: {0}")]
    InvalidContentType(String),

    #[error("Failed to parse JSON: {0}")]
    MalformedPayload(String),

    #[error("User is not logged in")]
    NotLoggedIn,

    #[error("Failed to validate user token: {0}")]
    TokenCheckFailed(ForgeError),

    #[error("User token invalid; please log in again")]
    TokenInvalid,

    #[error("Failed to validate {0} membership: {1}")]
    MembershipCheckFailed(String, ForgeError),

    #[error("User is not a part of {0}")]
    NotOrgMember(String),

    #[error("Unable to get forge bot token: {0}")]
    BotToken(#[from] SecretError),

    #[error("Unable to triage metadata: {0}")]
    Submission(ForgeError),
}

impl TriageError {
    pub fn status(&self) -> StatusCode {
        match self {
            TriageError::InvalidMethod
            | TriageError::InvalidContentType(_)
            | TriageError::MalformedPayload(_)
            | TriageError::NotLoggedIn
            | TriageError::TokenInvalid
            | TriageError::NotOrgMember(_) => StatusCode::BAD_REQUEST,
            TriageError::TokenCheckFailed(_)
            | TriageError::MembershipCheckFailed(_, _)
            | TriageError::BotToken(_)
            | TriageError::Submission(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> Response<Bytes> {
        make_message_response(self.status(), &self.to_string())
    }
}

/// Handler for `PATCH /metadata/triage`.
///
/// The user's own token is only ever used to verify identity and org
/// membership. The write to the forge happens under the service's bot
/// credential, with the user recorded as the change's attribution.
pub struct TriageHandler {
    forge: Arc<dyn ForgeApi>,
    sessions: Arc<dyn SessionStore>,
    secrets: Arc<dyn SecretStore>,
    required_org: String,
}

impl TriageHandler {
    pub fn new(
        forge: Arc<dyn ForgeApi>,
        sessions: Arc<dyn SessionStore>,
        secrets: Arc<dyn SecretStore>,
        required_org: String,
    ) -> Self {
        TriageHandler {
            forge,
            sessions,
            secrets,
            required_org,
        }
    }

    async fn try_handle(&self, request: Request<Bytes>) -> Result<Response<Bytes>, TriageError> {
        if request.method() != Method::PATCH {
            return Err(TriageError::InvalidMethod);
        }

        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if content_type != "application/json" {
            return Err(TriageError::InvalidContentType(content_type.to_string()));
        }

        let payload: MetadataResults = serde_json::from_slice(request.body())
            .map_err(|e| TriageError::MalformedPayload(e.to_string()))?;

        let session = session_id_from_headers(request.headers())
            .and_then(|id| self.sessions.resolve(&id))
            .ok_or(TriageError::NotLoggedIn)?;

        self.authorize(&session).await?;
        self.submit(&payload, &session.user).await?;

        let mut response = Response::new(Bytes::new());
        *response.status_mut() = StatusCode::CREATED;
        Ok(response)
    }

    async fn authorize(&self, session: &Session) -> Result<(), TriageError> {
        let status = self
            .forge
            .check_token(&session.token)
            .await
            .map_err(TriageError::TokenCheckFailed)?;
        if status != StatusCode::OK {
            return Err(TriageError::TokenInvalid);
        }

        let status = self
            .forge
            .check_org_membership(&self.required_org, &session.token)
            .await
            .map_err(|e| TriageError::MembershipCheckFailed(self.required_org.clone(), e))?;
        if status != StatusCode::OK {
            return Err(TriageError::NotOrgMember(self.required_org.clone()));
        }

        Ok(())
    }

    async fn submit(&self, payload: &MetadataResults, user: &User) -> Result<(), TriageError> {
        let bot_token = self.secrets.get(BOT_TOKEN_SECRET)?;

        let attribution = Attribution {
            name: user.handle.clone(),
            email: user.email.clone(),
        };
        self.forge
            .submit_change(payload, &attribution, &ServiceToken::new(bot_token))
            .await
            .map_err(TriageError::Submission)?;

        counter!(TRIAGE_SUBMITTED).increment(1);
        tracing::info!(
            author = %attribution.name,
            tests = payload.len(),
            "Metadata triage submitted"
        );
        Ok(())
    }
}

#[async_trait]
impl RequestHandler for TriageHandler {
    fn name(&self) -> &'static str {
        "Triage"
    }

    async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(e) => {
                counter!(TRIAGE_REJECTED).increment(1);
                if e.status().is_server_error() {
                    tracing::error!(error = %e, "Triage request failed");
                } else {
                    tracing::warn!(error = %e, "Triage request rejected");
                }
                e.to_response()
            }
        }
    }
}
