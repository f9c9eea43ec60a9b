//! Session bridge client.
//!
//! The bridge keeps its session in an httpOnly cookie, so this client owns a
//! cookie-storing `reqwest::Client`; the cookie never surfaces to callers.

use std::time::Duration;

use reqwest::Url;

use super::api::{endpoint, parse_base_url};
use super::types::{SessionLoginRequest, SessionStatus};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("session bridge rejected the identity token")]
    Unauthorized,
    #[error("invalid bridge URL: {0}")]
    InvalidUrl(String),
    #[error("bridge request failed: {0}")]
    Request(String),
    #[error("bridge response error: status {status}")]
    Response { status: u16 },
    #[error("bridge response parse failed: {0}")]
    Parse(String),
}

/// Client-side view of the session bridge.
#[async_trait::async_trait]
pub trait SessionExchange: Send + Sync {
    /// Trade an identity token for a server-side session cookie.
    async fn establish(&self, id_token: &str) -> Result<(), BridgeError>;

    /// Clear the server-side session.
    async fn clear(&self) -> Result<(), BridgeError>;

    async fn status(&self) -> Result<SessionStatus, BridgeError>;
}

pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BridgeClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, BridgeError> {
        let base_url = parse_base_url(base_url).map_err(|e| BridgeError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BridgeError::Request(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, BridgeError> {
        endpoint(&self.base_url, &[path]).map_err(|e| BridgeError::InvalidUrl(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SessionExchange for BridgeClient {
    async fn establish(&self, id_token: &str) -> Result<(), BridgeError> {
        let body = SessionLoginRequest { id_token: id_token.to_owned() };
        let response = self
            .http
            .post(self.url("sessionLogin")?)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::Request(e.to_string()))?;
        check_status(response.status().as_u16())
    }

    async fn clear(&self) -> Result<(), BridgeError> {
        let response = self
            .http
            .post(self.url("sessionLogout")?)
            .send()
            .await
            .map_err(|e| BridgeError::Request(e.to_string()))?;
        check_status(response.status().as_u16())
    }

    async fn status(&self) -> Result<SessionStatus, BridgeError> {
        let response = self
            .http
            .get(self.url("session-status")?)
            .send()
            .await
            .map_err(|e| BridgeError::Request(e.to_string()))?;
        check_status(response.status().as_u16())?;
        response
            .json::<SessionStatus>()
            .await
            .map_err(|e| BridgeError::Parse(e.to_string()))
    }
}

pub(crate) fn check_status(status: u16) -> Result<(), BridgeError> {
    match status {
        200..=299 => Ok(()),
        401 => Err(BridgeError::Unauthorized),
        _ => Err(BridgeError::Response { status }),
    }
}
