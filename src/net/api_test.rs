use super::*;
use crate::identity::StaticToken;

fn base(raw: &str) -> Url {
    parse_base_url(raw).unwrap()
}

#[test]
fn endpoint_appends_segments() {
    let url = endpoint(&base("https://api.test"), &["api", "v1", "patients", "by-guardian", "g-1"]).unwrap();
    assert_eq!(url.as_str(), "https://api.test/api/v1/patients/by-guardian/g-1");
}

#[test]
fn endpoint_trailing_empty_segment_keeps_slash() {
    let url = endpoint(&base("https://api.test"), &["api", "v1", "users", ""]).unwrap();
    assert_eq!(url.as_str(), "https://api.test/api/v1/users/");
}

#[test]
fn endpoint_percent_encodes_email() {
    let url = endpoint(&base("https://api.test"), &["api", "v1", "users", "ana maria/x@example.com"]).unwrap();
    assert_eq!(url.as_str(), "https://api.test/api/v1/users/ana%20maria%2Fx@example.com");
}

#[test]
fn endpoint_respects_base_path_prefix() {
    let url = endpoint(&base("https://api.test/prefix/"), &["api", "v1", "patients", "p-1"]).unwrap();
    assert_eq!(url.as_str(), "https://api.test/prefix/api/v1/patients/p-1");
}

#[test]
fn parse_base_url_rejects_garbage() {
    assert!(matches!(parse_base_url("not a url"), Err(ApiError::InvalidUrl(_))));
    assert!(matches!(parse_base_url("mailto:someone@example.com"), Err(ApiError::InvalidUrl(_))));
}

#[test]
fn classify_status_maps_not_found() {
    assert_eq!(classify_status(404, String::new()), ApiError::NotFound);
}

#[test]
fn classify_status_keeps_other_failures() {
    assert_eq!(
        classify_status(503, "down".into()),
        ApiError::Response { status: 503, body: "down".into() }
    );
}

#[test]
fn client_builds_with_static_token() {
    let client = BackendClient::new("https://api.test", Arc::new(StaticToken(Some("svc".into()))));
    assert!(client.is_ok());
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let client = BackendClient::new("http://127.0.0.1:9", Arc::new(StaticToken(None))).unwrap();
    let err = client.fetch_profile("uid", "a@b.com").await.unwrap_err();
    assert!(matches!(err, ApiError::Request(_)), "got {err:?}");
}
