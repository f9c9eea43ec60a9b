//! Session bridge handlers: identity token in, httpOnly cookie out.
//!
//! ERROR HANDLING
//! ==============
//! Only `/sessionLogin` reports failure to the caller (401 on a rejected
//! token, 500 on a store failure). Logout and revoke always succeed, and
//! `/session-status` folds every verification failure into
//! `{isAuthenticated: false}`; those failures are logged at `warn`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::config::BridgeConfig;
use crate::identity::{IdentityError, VerifiedToken};
use crate::net::types::{SessionLoginRequest, SessionStatus, StatusAck};
use crate::services::session::SessionRecord;
use crate::state::AppState;

pub const COOKIE_NAME: &str = "session";
const UNAUTHORIZED_BODY: &str = "UNAUTHORIZED REQUEST!";

fn session_cookie(token: String, config: &BridgeConfig) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(config.session_ttl)
        .build()
}

fn cleared_cookie(config: &BridgeConfig) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

fn cookie_token(jar: &CookieJar) -> Option<&str> {
    jar.get(COOKIE_NAME).map(Cookie::value).filter(|v| !v.is_empty())
}

/// Reject tokens whose sign-in is older than `window`. Tokens without a
/// recorded sign-in time are treated as stale.
pub(crate) fn check_recent_sign_in(
    token: &VerifiedToken,
    now: OffsetDateTime,
    window: Duration,
) -> Result<(), IdentityError> {
    match token.last_sign_in {
        Some(at) if now - at <= window => Ok(()),
        _ => Err(IdentityError::StaleSignIn),
    }
}

/// Live session record for the request's cookie, if any.
async fn current_session(state: &AppState, jar: &CookieJar) -> Option<SessionRecord> {
    let token = cookie_token(jar)?;
    match state.sessions.validate(token).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "session validation failed");
            None
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /sessionLogin` — verify the identity token and set the session cookie.
pub async fn session_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SessionLoginRequest>,
) -> Response {
    let verified = match state.verifier.verify_id_token(&body.id_token).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "identity token rejected");
            return (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response();
        }
    };

    if let Err(e) = check_recent_sign_in(&verified, OffsetDateTime::now_utc(), state.config.recent_sign_in) {
        tracing::warn!(uid = %verified.uid, error = %e, "identity token rejected");
        return (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response();
    }

    let token = match state.sessions.create(&verified.uid, &verified.email, state.config.session_ttl).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(uid = %verified.uid, error = %e, "session creation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };

    tracing::info!(uid = %verified.uid, "session established");
    let jar = jar.add(session_cookie(token, &state.config));
    (jar, Json(StatusAck::success())).into_response()
}

/// `POST /sessionLogout` — delete the session if present and clear the cookie.
pub async fn session_logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = cookie_token(&jar) {
        if let Err(e) = state.sessions.delete(token).await {
            tracing::warn!(error = %e, "session delete failed");
        }
    }
    let jar = jar.add(cleared_cookie(&state.config));
    (jar, Json(StatusAck::success()))
}

/// `POST /sessionRevoke` — delete every session of the cookie's owner.
pub async fn session_revoke(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(record) = current_session(&state, &jar).await {
        match state.sessions.revoke_user(&record.uid).await {
            Ok(revoked) => tracing::info!(uid = %record.uid, revoked, "sessions revoked"),
            Err(e) => tracing::warn!(uid = %record.uid, error = %e, "session revoke failed"),
        }
    }
    let jar = jar.add(cleared_cookie(&state.config));
    (jar, Json(StatusAck::success()))
}

/// `GET /session-status` — always 200.
pub async fn session_status(State(state): State<AppState>, jar: CookieJar) -> Json<SessionStatus> {
    let Some(record) = current_session(&state, &jar).await else {
        return Json(SessionStatus::unauthenticated());
    };

    match state.profiles.fetch_profile(&record.uid, &record.email).await {
        Ok(user) => Json(SessionStatus::authenticated(user)),
        Err(e) => {
            tracing::warn!(uid = %record.uid, error = %e, "profile lookup for session failed");
            Json(SessionStatus::unauthenticated())
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
