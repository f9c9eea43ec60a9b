//! Identity types — provider-neutral identities, errors and seam traits.

use time::OffsetDateTime;
use tokio::sync::watch;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by identity-provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Unknown email, wrong password, or the provider's merged credential error.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed email address")]
    InvalidEmail,

    #[error("password too weak")]
    WeakPassword,

    #[error("email already registered")]
    EmailExists,

    #[error("account disabled")]
    UserDisabled,

    /// The identity token is malformed, expired, or belongs to no account.
    #[error("invalid identity token")]
    InvalidToken,

    /// The token is valid but the sign-in is older than the accepted window.
    #[error("sign-in is not recent enough")]
    StaleSignIn,

    /// The provider rejected the request with a code we do not map.
    #[error("provider rejected request: {code}")]
    Rejected { code: String },

    /// The HTTP request did not complete.
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl IdentityError {
    /// Map a provider error code (`EMAIL_NOT_FOUND`, `WEAK_PASSWORD : ...`) to a variant.
    #[must_use]
    pub fn from_code(raw: &str) -> Self {
        let code = raw.split([' ', ':']).next().unwrap_or_default();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => Self::InvalidCredentials,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => Self::WeakPassword,
            "EMAIL_EXISTS" => Self::EmailExists,
            "USER_DISABLED" => Self::UserDisabled,
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "INVALID_REFRESH_TOKEN" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
                Self::InvalidToken
            }
            _ => Self::Rejected { code: raw.to_owned() },
        }
    }
}

// =============================================================================
// IDENTITIES
// =============================================================================

/// A signed-in provider identity held by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Short-lived token sent to the bridge and the backend.
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: OffsetDateTime,
}

impl Identity {
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Admin-side result of verifying an identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub uid: String,
    pub email: String,
    pub last_sign_in: Option<OffsetDateTime>,
}

// =============================================================================
// SEAMS
// =============================================================================

/// Client-side identity provider.
///
/// Implementations publish the current identity through a `watch` channel:
/// `sign_in`, `sign_out` and token refresh each emit a notification. `sign_up`
/// creates the account without making it current.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Permanently delete the account behind `identity`.
    async fn delete_account(&self, identity: &Identity) -> Result<(), IdentityError>;

    fn current(&self) -> Option<Identity>;

    /// Subscribe to identity changes. The receiver's initial value is the current identity.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Admin-side verification of identity tokens.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedToken, IdentityError>;
}

/// Source of the identity token attached to backend requests.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn id_token(&self) -> Option<String>;
}

/// A fixed token, or none. Used by the bridge for server-side backend lookups.
pub struct StaticToken(pub Option<String>);

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn id_token(&self) -> Option<String> {
        self.0.clone()
    }
}
