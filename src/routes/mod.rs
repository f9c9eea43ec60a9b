//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The bridge serves a browser app on another origin, so CORS is restricted
//! to the configured origin with credentials allowed; the session cookie is
//! never sent otherwise.

pub mod session;

use axum::Router;
use axum::http::header::{CONTENT_TYPE, InvalidHeaderValue};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the bridge router.
///
/// # Errors
///
/// Returns an error if the configured CORS origin is not a valid header value.
pub fn app(state: AppState) -> Result<Router, InvalidHeaderValue> {
    let origin = HeaderValue::from_str(&state.config.cors_origin)?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/sessionLogin", post(session::session_login))
        .route("/sessionLogout", post(session::session_logout))
        .route("/sessionRevoke", post(session::session_revoke))
        .route("/session-status", get(session::session_status))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
