//! Identity Toolkit REST client.
//!
//! Thin HTTP wrapper for `accounts:*` and the secure-token exchange. Pure
//! parsing lives in the `parse_*` functions for testability.

use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::watch;

use super::types::{Identity, IdentityError, IdentityProvider, TokenSource, TokenVerifier, VerifiedToken};
use crate::config::IdentityConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Refresh this long before the provider-declared expiry.
const REFRESH_MARGIN: time::Duration = time::Duration::seconds(60);

// =============================================================================
// CLIENT
// =============================================================================

pub struct FirebaseIdentity {
    http: reqwest::Client,
    config: IdentityConfig,
    current: watch::Sender<Option<Identity>>,
}

impl FirebaseIdentity {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        let (current, _) = watch::channel(None);
        Ok(Self { http, config, current })
    }

    fn accounts_url(&self, method: &str) -> String {
        format!("{}/accounts:{method}?key={}", self.config.base_url, self.config.api_key)
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<String, IdentityError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        if status != 200 {
            return Err(parse_error_body(status, &text));
        }
        Ok(text)
    }

    async fn password_call(&self, method: &str, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let body = serde_json::json!({ "email": email, "password": password, "returnSecureToken": true });
        let text = self.post(&self.accounts_url(method), &body).await?;
        parse_auth_response(&text, OffsetDateTime::now_utc())
    }

    /// Exchange the current refresh token for a fresh identity token and
    /// publish the refreshed identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] when nobody is signed in or the
    /// refresh token was rejected.
    pub async fn refresh(&self) -> Result<Identity, IdentityError> {
        let Some(current) = self.current() else {
            return Err(IdentityError::InvalidToken);
        };
        let url = format!("{}/token?key={}", self.config.token_url, self.config.api_key);
        let body = serde_json::json!({ "grant_type": "refresh_token", "refresh_token": current.refresh_token });
        let text = self.post(&url, &body).await?;
        let refreshed = parse_refresh_response(&text, &current.email, OffsetDateTime::now_utc())?;
        self.current.send_replace(Some(refreshed.clone()));
        tracing::debug!(uid = %refreshed.uid, "identity token refreshed");
        Ok(refreshed)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let identity = self.password_call("signInWithPassword", email, password).await?;
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.current.send_replace(None);
        Ok(())
    }

    async fn delete_account(&self, identity: &Identity) -> Result<(), IdentityError> {
        let body = serde_json::json!({ "idToken": identity.id_token });
        self.post(&self.accounts_url("delete"), &body).await?;
        let signed_in_as_deleted = matches!(&*self.current.borrow(), Some(c) if c.uid == identity.uid);
        if signed_in_as_deleted {
            self.current.send_replace(None);
        }
        Ok(())
    }

    fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

#[async_trait::async_trait]
impl TokenVerifier for FirebaseIdentity {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedToken, IdentityError> {
        let body = serde_json::json!({ "idToken": id_token });
        let text = self.post(&self.accounts_url("lookup"), &body).await?;
        parse_lookup_response(&text)
    }
}

#[async_trait::async_trait]
impl TokenSource for FirebaseIdentity {
    async fn id_token(&self) -> Option<String> {
        let current = self.current()?;
        if current.is_expired(OffsetDateTime::now_utc() + REFRESH_MARGIN) {
            return match self.refresh().await {
                Ok(refreshed) => Some(refreshed.id_token),
                Err(e) => {
                    tracing::warn!(error = %e, "identity token refresh failed");
                    None
                }
            };
        }
        Some(current.id_token)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    /// Milliseconds since the epoch, as a string.
    #[serde(default)]
    last_login_at: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn expiry(now: OffsetDateTime, expires_in: &str) -> Result<OffsetDateTime, IdentityError> {
    let secs: i64 = expires_in
        .trim()
        .parse()
        .map_err(|_| IdentityError::Parse(format!("bad expiresIn: {expires_in}")))?;
    now.checked_add(time::Duration::seconds(secs))
        .ok_or_else(|| IdentityError::Parse(format!("expiresIn out of range: {expires_in}")))
}

pub(crate) fn parse_auth_response(text: &str, now: OffsetDateTime) -> Result<Identity, IdentityError> {
    let resp: AuthResponse = serde_json::from_str(text).map_err(|e| IdentityError::Parse(e.to_string()))?;
    Ok(Identity {
        expires_at: expiry(now, &resp.expires_in)?,
        uid: resp.local_id,
        email: resp.email,
        id_token: resp.id_token,
        refresh_token: resp.refresh_token,
    })
}

pub(crate) fn parse_refresh_response(text: &str, email: &str, now: OffsetDateTime) -> Result<Identity, IdentityError> {
    let resp: RefreshResponse = serde_json::from_str(text).map_err(|e| IdentityError::Parse(e.to_string()))?;
    Ok(Identity {
        expires_at: expiry(now, &resp.expires_in)?,
        uid: resp.user_id,
        email: email.to_owned(),
        id_token: resp.id_token,
        refresh_token: resp.refresh_token,
    })
}

pub(crate) fn parse_lookup_response(text: &str) -> Result<VerifiedToken, IdentityError> {
    let resp: LookupResponse = serde_json::from_str(text).map_err(|e| IdentityError::Parse(e.to_string()))?;
    let user = resp.users.into_iter().next().ok_or(IdentityError::InvalidToken)?;
    if user.disabled {
        return Err(IdentityError::UserDisabled);
    }
    let email = user.email.ok_or(IdentityError::InvalidToken)?;
    let last_sign_in = user
        .last_login_at
        .as_deref()
        .and_then(|ms| ms.parse::<i128>().ok())
        .and_then(|ms| ms.checked_mul(1_000_000))
        .and_then(|nanos| OffsetDateTime::from_unix_timestamp_nanos(nanos).ok());
    Ok(VerifiedToken { uid: user.local_id, email, last_sign_in })
}

pub(crate) fn parse_error_body(status: u16, text: &str) -> IdentityError {
    match serde_json::from_str::<ErrorEnvelope>(text) {
        Ok(envelope) => IdentityError::from_code(&envelope.error.message),
        Err(_) => IdentityError::Request(format!("status {status}: {text}")),
    }
}

#[cfg(test)]
#[path = "firebase_test.rs"]
mod tests;
