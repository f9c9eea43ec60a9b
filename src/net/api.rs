//! Backend API client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend owns profiles, patients and therapy sessions. Every request
//! carries the caller's identity token in `x-endpoint-api-userinfo` when a
//! token is available; the backend verifies it server-side.
//!
//! ERROR HANDLING
//! ==============
//! A 404 on the profile lookup is `ApiError::NotFound`; callers treat it as a
//! profile inconsistency. Everything else is a transport or response error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{NewPatient, NewTherapySession, NewUser, Patient, TherapySession, User};
use crate::identity::TokenSource;

pub const IDENTITY_HEADER: &str = "x-endpoint-api-userinfo";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("backend response error: status {status}")]
    Response { status: u16, body: String },
    #[error("backend response parse failed: {0}")]
    Parse(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// SEAM
// =============================================================================

/// Profile lookups and creation, shared by the auth store and the bridge.
#[async_trait::async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Resolve the profile for a provider identity. The returned `id` is `uid`.
    async fn fetch_profile(&self, uid: &str, email: &str) -> Result<User, ApiError>;

    async fn create_profile(&self, profile: &NewUser) -> Result<User, ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse or the HTTP client cannot be built.
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, tokens })
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.id_token().await {
            Some(token) => builder.header(IDENTITY_HEADER, token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, segments)?;
        let request = self.authorized(self.http.get(url)).await;
        read_json(request.send().await).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, segments)?;
        let request = self.authorized(self.http.post(url).json(body)).await;
        read_json(request.send().await).await
    }

    /// `GET /api/v1/users/{email}`.
    pub async fn user_by_email(&self, email: &str) -> Result<User, ApiError> {
        self.get_json(&["api", "v1", "users", email]).await
    }

    /// `POST /api/v1/users/`.
    pub async fn create_user(&self, profile: &NewUser) -> Result<User, ApiError> {
        self.post_json(&["api", "v1", "users", ""], profile).await
    }

    /// `GET /api/v1/patients/by-guardian/{id}`.
    pub async fn patients_by_guardian(&self, guardian_id: &str) -> Result<Vec<Patient>, ApiError> {
        self.get_json(&["api", "v1", "patients", "by-guardian", guardian_id])
            .await
    }

    /// `GET /api/v1/patients/{id}`.
    pub async fn patient(&self, patient_id: &str) -> Result<Patient, ApiError> {
        self.get_json(&["api", "v1", "patients", patient_id]).await
    }

    /// `POST /api/v1/patients/`.
    pub async fn create_patient(&self, patient: &NewPatient) -> Result<Patient, ApiError> {
        self.post_json(&["api", "v1", "patients", ""], patient).await
    }

    /// `GET /api/v1/sessions/by-patient/{id}`.
    pub async fn sessions_by_patient(&self, patient_id: &str) -> Result<Vec<TherapySession>, ApiError> {
        self.get_json(&["api", "v1", "sessions", "by-patient", patient_id])
            .await
    }

    /// `POST /api/v1/sessions/`.
    pub async fn create_session(&self, session: &NewTherapySession) -> Result<TherapySession, ApiError> {
        self.post_json(&["api", "v1", "sessions", ""], session).await
    }
}

#[async_trait::async_trait]
impl ProfileDirectory for BackendClient {
    async fn fetch_profile(&self, uid: &str, email: &str) -> Result<User, ApiError> {
        let mut user = self.user_by_email(email).await?;
        user.id = uid.to_owned();
        Ok(user)
    }

    async fn create_profile(&self, profile: &NewUser) -> Result<User, ApiError> {
        self.create_user(profile).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(raw.to_owned()));
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`. An empty final segment
/// yields a trailing slash.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(base.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

pub(crate) fn classify_status(status: u16, body: String) -> ApiError {
    if status == 404 {
        ApiError::NotFound
    } else {
        ApiError::Response { status, body }
    }
}

async fn read_json<T: DeserializeOwned>(sent: Result<reqwest::Response, reqwest::Error>) -> Result<T, ApiError> {
    let response = sent.map_err(|e| ApiError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    if !(200..300).contains(&status) {
        return Err(classify_status(status, text));
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
