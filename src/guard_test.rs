use super::*;
use crate::net::types::NewUser;

fn snapshot(user: Option<User>, loading: bool) -> AuthSnapshot {
    AuthSnapshot { user, loading, action_loading: false, error: None }
}

fn user(profile_type: ProfileType) -> User {
    NewUser::new("uid-1".into(), "Ana".into(), "ana@example.com".into(), profile_type, "000".into()).into_user()
}

#[test]
fn parse_known_paths() {
    assert_eq!(Route::parse("/login"), Route::Login);
    assert_eq!(Route::parse("/register/"), Route::Register);
    assert_eq!(Route::parse("/"), Route::Dashboard);
    assert_eq!(Route::parse("/dashboard"), Route::Dashboard);
    assert_eq!(Route::parse("/add-patient"), Route::AddPatient);
    assert_eq!(Route::parse("/patient/p-1"), Route::Patient("p-1".into()));
    assert_eq!(Route::parse("/patient/"), Route::Unknown("/patient/".into()));
    assert_eq!(Route::parse("/nope"), Route::Unknown("/nope".into()));
}

#[test]
fn paths_round_trip() {
    for route in [Route::Login, Route::Register, Route::Dashboard, Route::AddPatient, Route::Patient("x".into())] {
        assert_eq!(Route::parse(&route.path()), route);
    }
}

#[test]
fn resolving_blocks_every_route() {
    let snap = snapshot(None, true);
    for path in ["/login", "/dashboard", "/patient/p1", "/whatever"] {
        assert_eq!(resolve(&snap, &Route::parse(path)), RouteDecision::Render(Page::Resolving));
    }
}

#[test]
fn public_routes_redirect_authenticated_users() {
    let snap = snapshot(Some(user(ProfileType::Guardian)), false);
    assert_eq!(resolve(&snap, &Route::Login), RouteDecision::Redirect(Route::Dashboard));
    assert_eq!(resolve(&snap, &Route::Register), RouteDecision::Redirect(Route::Dashboard));

    let anon = snapshot(None, false);
    assert_eq!(resolve(&anon, &Route::Login), RouteDecision::Render(Page::Login));
    assert_eq!(resolve(&anon, &Route::Register), RouteDecision::Render(Page::Register));
}

#[test]
fn protected_routes_redirect_to_login() {
    let anon = snapshot(None, false);
    for route in [Route::Dashboard, Route::AddPatient, Route::Patient("p1".into())] {
        assert_eq!(resolve(&anon, &route), RouteDecision::Redirect(Route::Login));
    }
}

#[test]
fn dashboard_dispatches_on_profile_type() {
    let cases = [
        (ProfileType::Guardian, Dashboard::Guardian),
        (ProfileType::Professional, Dashboard::Professional),
        (ProfileType::Organization, Dashboard::Organization),
    ];
    for (profile_type, expected) in cases {
        let snap = snapshot(Some(user(profile_type)), false);
        assert_eq!(resolve(&snap, &Route::Dashboard), RouteDecision::Render(Page::Dashboard(expected)));
    }
}

#[test]
fn unknown_paths_fall_back_by_auth_state() {
    let route = Route::parse("/settings");
    assert_eq!(resolve(&snapshot(None, false), &route), RouteDecision::Redirect(Route::Login));
    assert_eq!(
        resolve(&snapshot(Some(user(ProfileType::Professional)), false), &route),
        RouteDecision::Redirect(Route::Dashboard)
    );
}

#[test]
fn authenticated_user_reaches_patient_page() {
    let snap = snapshot(Some(user(ProfileType::Professional)), false);
    assert_eq!(resolve(&snap, &Route::Patient("p1".into())), RouteDecision::Render(Page::Patient("p1".into())));
}
