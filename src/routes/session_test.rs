use super::*;
use axum::body::to_bytes;
use axum::http::header::SET_COOKIE;
use time::macros::datetime;

use crate::services::session::SessionStore;
use crate::state::test_helpers::{test_app_state, test_user};

fn login_body(token: &str) -> Json<SessionLoginRequest> {
    Json(SessionLoginRequest { id_token: token.into() })
}

fn jar_with(token: &str) -> CookieJar {
    CookieJar::new().add(Cookie::new(COOKIE_NAME, token.to_owned()))
}

/// Extract the session token from a `Set-Cookie` header.
fn set_cookie_token(response: &Response) -> Option<String> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let cookie = Cookie::parse(header.to_owned()).ok()?;
    Some(cookie.value().to_owned())
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn status_of(state: &AppState, jar: CookieJar) -> SessionStatus {
    let Json(status) = session_status(State(state.clone()), jar).await;
    status
}

// =============================================================================
// check_recent_sign_in
// =============================================================================

#[test]
fn recent_sign_in_window() {
    let now = datetime!(2026-01-01 12:00 UTC);
    let token = |at| VerifiedToken { uid: "u".into(), email: "e".into(), last_sign_in: at };
    let window = Duration::minutes(5);

    assert!(check_recent_sign_in(&token(Some(datetime!(2026-01-01 11:58 UTC))), now, window).is_ok());
    assert!(check_recent_sign_in(&token(Some(datetime!(2026-01-01 11:55 UTC))), now, window).is_ok());
    assert_eq!(
        check_recent_sign_in(&token(Some(datetime!(2026-01-01 11:54 UTC))), now, window),
        Err(IdentityError::StaleSignIn)
    );
    assert_eq!(check_recent_sign_in(&token(None), now, window), Err(IdentityError::StaleSignIn));
}

// =============================================================================
// /sessionLogin
// =============================================================================

#[tokio::test]
async fn login_sets_http_only_cookie() {
    let (state, store) = test_app_state();
    let response = session_login(State(state), CookieJar::new(), login_body("valid:uid-1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_owned();
    assert!(header.starts_with("session="));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Max-Age=432000"));
    assert!(!header.contains("Secure"));

    assert_eq!(store.len().await, 1);
    assert_eq!(body_text(response).await, r#"{"status":"success"}"#);
}

#[tokio::test]
async fn login_rejects_invalid_token() {
    let (state, store) = test_app_state();
    let response = session_login(State(state), CookieJar::new(), login_body("garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_text(response).await, UNAUTHORIZED_BODY);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn login_rejects_stale_sign_in() {
    let (state, store) = test_app_state();
    let response = session_login(State(state), CookieJar::new(), login_body("stale:uid-1")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn secure_cookie_in_production() {
    let (mut state, _) = test_app_state();
    let mut config = (*state.config).clone();
    config.cookie_secure = true;
    state.config = std::sync::Arc::new(config);

    let response = session_login(State(state), CookieJar::new(), login_body("valid:uid-1")).await;
    let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(header.contains("Secure"));
}

// =============================================================================
// /session-status
// =============================================================================

#[tokio::test]
async fn status_without_cookie_is_unauthenticated() {
    let (state, _) = test_app_state();
    assert_eq!(status_of(&state, CookieJar::new()).await, SessionStatus::unauthenticated());
}

#[tokio::test]
async fn status_with_unknown_cookie_is_unauthenticated() {
    let (state, _) = test_app_state();
    assert_eq!(status_of(&state, jar_with("not-a-session")).await, SessionStatus::unauthenticated());
}

#[tokio::test]
async fn status_after_login_returns_profile() {
    let (state, _) = test_app_state();
    let response = session_login(State(state.clone()), CookieJar::new(), login_body("valid:uid-1")).await;
    let token = set_cookie_token(&response).unwrap();

    let status = status_of(&state, jar_with(&token)).await;
    assert!(status.is_authenticated);
    let user = status.user.unwrap();
    let expected = test_user("uid-1");
    assert_eq!(user.id, expected.id);
    assert_eq!(user.profile_type, expected.profile_type);
}

#[tokio::test]
async fn status_without_backend_profile_is_unauthenticated() {
    let (state, _) = test_app_state();
    let response = session_login(State(state.clone()), CookieJar::new(), login_body("valid:uid-2")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = set_cookie_token(&response).unwrap();

    assert_eq!(status_of(&state, jar_with(&token)).await, SessionStatus::unauthenticated());
}

#[tokio::test]
async fn status_body_is_camel_case() {
    let (state, _) = test_app_state();
    let response = session_status(State(state), CookieJar::new()).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"isAuthenticated":false}"#);
}

// =============================================================================
// /sessionLogout and /sessionRevoke
// =============================================================================

#[tokio::test]
async fn logout_twice_is_idempotent() {
    let (state, store) = test_app_state();
    let response = session_login(State(state.clone()), CookieJar::new(), login_body("valid:uid-1")).await;
    let token = set_cookie_token(&response).unwrap();

    for _ in 0..2 {
        let response = session_logout(State(state.clone()), jar_with(&token)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_owned();
        assert!(header.contains("Max-Age=0"));
        assert_eq!(body_text(response).await, r#"{"status":"success"}"#);
    }

    assert!(store.is_empty().await);
    assert_eq!(status_of(&state, jar_with(&token)).await, SessionStatus::unauthenticated());
}

#[tokio::test]
async fn logout_without_cookie_succeeds() {
    let (state, _) = test_app_state();
    let response = session_logout(State(state), CookieJar::new()).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn revoke_removes_every_session_of_owner() {
    let (state, store) = test_app_state();
    let first = session_login(State(state.clone()), CookieJar::new(), login_body("valid:uid-1")).await;
    let second = session_login(State(state.clone()), CookieJar::new(), login_body("valid:uid-1")).await;
    let other = session_login(State(state.clone()), CookieJar::new(), login_body("valid:uid-3")).await;
    let first = set_cookie_token(&first).unwrap();
    let second = set_cookie_token(&second).unwrap();
    let other = set_cookie_token(&other).unwrap();
    assert_eq!(store.len().await, 3);

    let response = session_revoke(State(state.clone()), jar_with(&first)).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(store.len().await, 1);
    assert!(!status_of(&state, jar_with(&second)).await.is_authenticated);
    assert!(store.validate(&other).await.unwrap().is_some());
}

#[tokio::test]
async fn revoke_without_session_succeeds() {
    let (state, _) = test_app_state();
    let response = session_revoke(State(state), jar_with("unknown")).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn router_rejects_invalid_cors_origin() {
    let (mut state, _) = test_app_state();
    let mut config = (*state.config).clone();
    config.cors_origin = "bad\norigin".into();
    state.config = std::sync::Arc::new(config);
    assert!(crate::routes::app(state).is_err());
}
