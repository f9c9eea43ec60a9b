//! Bridge session storage.
//!
//! ARCHITECTURE
//! ============
//! The session cookie is an opaque 32-byte hex token. Stores keep only its
//! SHA-256 digest, keyed to the provider uid and email the token was minted
//! for. Deleting a record revokes the session; expired records are invisible
//! to `validate` and removed by the sweeper.
//!
//! TRADE-OFFS
//! ==========
//! `MemorySessionStore` loses every session on restart. It is selected when no
//! database is configured, which suits local development and tests only.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Storage key for a session token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// A live bridge session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub uid: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Mint a session for `uid`, returning the cookie token.
    async fn create(&self, uid: &str, email: &str, ttl: time::Duration) -> Result<String, SessionStoreError>;

    /// Return the live session for `token`, or `None` if unknown, revoked or expired.
    async fn validate(&self, token: &str) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Delete one session. Unknown tokens are not an error.
    async fn delete(&self, token: &str) -> Result<(), SessionStoreError>;

    /// Delete every session belonging to `uid`. Returns the number removed.
    async fn revoke_user(&self, uid: &str) -> Result<u64, SessionStoreError>;

    /// Delete expired sessions. Returns the number removed.
    async fn purge_expired(&self) -> Result<u64, SessionStoreError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, uid: &str, email: &str, ttl: time::Duration) -> Result<String, SessionStoreError> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + ttl;
        sqlx::query("INSERT INTO sessions (token_hash, uid, email, expires_at) VALUES ($1, $2, $3, $4)")
            .bind(hash_token(&token))
            .bind(uid)
            .bind(email)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn validate(&self, token: &str) -> Result<Option<SessionRecord>, SessionStoreError> {
        let row = sqlx::query(
            r"SELECT uid, email, created_at, expires_at
              FROM sessions
              WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SessionRecord {
            uid: r.get("uid"),
            email: r.get("email"),
            created_at: r.get("created_at"),
            expires_at: r.get("expires_at"),
        }))
    }

    async fn delete(&self, token: &str) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_user(&self, uid: &str) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, uid: &str, email: &str, ttl: time::Duration) -> Result<String, SessionStoreError> {
        let token = generate_token();
        let now = OffsetDateTime::now_utc();
        let record = SessionRecord { uid: uid.to_owned(), email: email.to_owned(), created_at: now, expires_at: now + ttl };
        self.sessions.write().await.insert(hash_token(&token), record);
        Ok(token)
    }

    async fn validate(&self, token: &str) -> Result<Option<SessionRecord>, SessionStoreError> {
        let now = OffsetDateTime::now_utc();
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&hash_token(token))
            .filter(|record| record.expires_at > now)
            .cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(&hash_token(token));
        Ok(())
    }

    async fn revoke_user(&self, uid: &str) -> Result<u64, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.uid != uid);
        Ok((before - sessions.len()) as u64)
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

// =============================================================================
// SWEEPER
// =============================================================================

/// Spawn the background task that purges expired sessions every `interval`.
pub fn spawn_session_sweeper(store: Arc<dyn SessionStore>, interval: Duration) -> JoinHandle<()> {
    tracing::info!(interval_secs = interval.as_secs(), "session sweeper configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired sessions purged"),
                Err(e) => tracing::warn!(error = %e, "session purge failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
