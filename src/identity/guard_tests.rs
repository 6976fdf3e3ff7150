use super::*;
use crate::console::navigator::HistoryNavigator;
use crate::identity::clock::FixedClock;
use crate::identity::roles::{ADMIN, LAWYER, MANAGER};
use crate::identity::storage::MemoryStorage;
use crate::identity::test_support::token_for;
use crate::identity::token::decode;

const NOW: i64 = 1_750_000_000;

fn ready(sub: &str, role: &str) -> SessionSnapshot {
    let tok = token_for(sub, role, NOW + 60);
    SessionSnapshot { identity: Some(decode(&tok).unwrap()), raw_token: Some(tok), loading_state: LoadingState::Ready }
}

fn anonymous() -> SessionSnapshot {
    SessionSnapshot { raw_token: None, identity: None, loading_state: LoadingState::Ready }
}

fn new_store() -> SessionStore {
    SessionStore::new(Arc::new(MemoryStorage::new()), Arc::new(FixedClock::at(NOW)))
}

#[test]
fn initializing_never_renders_or_redirects() {
    let loading = SessionSnapshot { raw_token: None, identity: None, loading_state: LoadingState::Initializing };
    for req in [
        AuthorizationRequirement::roles([ADMIN]),
        AuthorizationRequirement::roles(Vec::<&str>::new()),
        AuthorizationRequirement::owner("u1"),
    ] {
        assert_eq!(evaluate(&req, &loading), GuardDecision::Pending);
    }
}

#[test]
fn anonymous_goes_to_login_regardless_of_roles() {
    let req = AuthorizationRequirement::roles([ADMIN, LAWYER, MANAGER]);
    assert_eq!(evaluate(&req, &anonymous()), GuardDecision::Redirect("/login".into()));
    let custom = AuthorizationRequirement::roles(Vec::<&str>::new()).redirect_unauthenticated_to("/signin");
    assert_eq!(evaluate(&custom, &anonymous()), GuardDecision::Redirect("/signin".into()));
}

#[test]
fn role_in_allow_list_renders() {
    let req = AuthorizationRequirement::roles([LAWYER, MANAGER]);
    assert_eq!(evaluate(&req, &ready("u1", LAWYER)), GuardDecision::Render);
}

#[test]
fn role_outside_allow_list_redirects_to_unauthorized() {
    let req = AuthorizationRequirement::roles([ADMIN]).redirect_unauthorized_to("/forbidden");
    assert_eq!(evaluate(&req, &ready("u1", LAWYER)), GuardDecision::Redirect("/forbidden".into()));
    let default_target = AuthorizationRequirement::roles([ADMIN]);
    assert_eq!(evaluate(&default_target, &ready("u1", LAWYER)), GuardDecision::Redirect("/dashboard".into()));
}

#[test]
fn owner_match_renders_without_any_role() {
    let req = AuthorizationRequirement::owner("u1");
    assert_eq!(evaluate(&req, &ready("u1", LAWYER)), GuardDecision::Render);
    assert_eq!(evaluate(&req, &ready("u2", LAWYER)), GuardDecision::Redirect("/dashboard".into()));
}

#[test]
fn owner_path_requires_the_flag_and_an_id() {
    let mut req = AuthorizationRequirement::owner("u1");
    req.owner_access = false;
    assert!(!evaluate(&req, &ready("u1", LAWYER)).renders());

    let mut no_id = AuthorizationRequirement::owner("u1");
    no_id.owner_id = None;
    assert!(!evaluate(&no_id, &ready("u1", LAWYER)).renders());
}

#[test]
fn empty_owner_id_never_matches() {
    let req = AuthorizationRequirement::roles([ADMIN]).with_owner("");
    assert_eq!(evaluate(&req, &ready("", LAWYER)), GuardDecision::Redirect("/dashboard".into()));
}

#[test]
fn role_or_owner_is_sufficient() {
    let req = AuthorizationRequirement::roles([ADMIN]).with_owner("u9");
    assert!(evaluate(&req, &ready("u1", ADMIN)).renders());
    assert!(evaluate(&req, &ready("u9", LAWYER)).renders());
    assert!(!evaluate(&req, &ready("u1", LAWYER)).renders());
}

#[test]
fn mounted_guard_waits_for_bootstrap_then_redirects() {
    let store = new_store();
    let nav = Arc::new(HistoryNavigator::new("/cases"));
    let guard = RouteGuard::mount(&store, AuthorizationRequirement::roles([LAWYER]), nav.clone());
    assert_eq!(guard.decision(), GuardDecision::Pending);
    assert!(nav.history().len() == 1);

    store.bootstrap();
    assert_eq!(guard.decision(), GuardDecision::Redirect("/login".into()));
    assert_eq!(nav.current(), "/login");
}

#[test]
fn mounted_guard_stops_rendering_after_logout() {
    let store = new_store();
    store.login(&token_for("u1", LAWYER, NOW + 60)).unwrap();
    let nav = Arc::new(HistoryNavigator::new("/cases"));
    let guard = RouteGuard::mount(&store, AuthorizationRequirement::roles([LAWYER, MANAGER]), nav.clone());
    assert!(guard.renders());
    assert_eq!(nav.current(), "/cases");

    store.logout();
    assert!(!guard.renders());
    assert_eq!(nav.current(), "/login");
}

#[test]
fn mounted_guard_reacts_to_requirement_changes() {
    let store = new_store();
    store.login(&token_for("u1", LAWYER, NOW + 60)).unwrap();
    let nav = Arc::new(HistoryNavigator::new("/profile/u1"));
    let guard = RouteGuard::mount(&store, AuthorizationRequirement::roles([ADMIN]).with_owner("u1"), nav.clone());
    assert!(guard.renders());

    guard.set_requirement(AuthorizationRequirement::roles([ADMIN]).with_owner("u2"));
    assert_eq!(guard.decision(), GuardDecision::Redirect("/dashboard".into()));
    assert_eq!(nav.current(), "/dashboard");
}

#[test]
fn latest_identity_wins_the_navigation_target() {
    let store = new_store();
    let nav = Arc::new(HistoryNavigator::new("/insurance-management"));
    let _guard = RouteGuard::mount(&store, AuthorizationRequirement::roles([MANAGER]), nav.clone());
    store.login(&token_for("u1", LAWYER, NOW + 60)).unwrap();
    store.logout();
    assert_eq!(nav.current(), "/login");
}

#[test]
fn guard_ends_on_the_final_state_when_an_earlier_observer_logs_out() {
    let store = new_store();
    store.bootstrap();
    let writer = store.clone();
    let _kill = store.subscribe(move |snap| {
        if snap.identity.is_some() {
            writer.logout();
        }
    });
    let nav = Arc::new(HistoryNavigator::new("/cases"));
    let guard = RouteGuard::mount(&store, AuthorizationRequirement::roles([LAWYER]), nav.clone());
    nav.push("/cases");

    store.login(&token_for("u1", LAWYER, NOW + 60)).unwrap();
    assert!(store.identity().is_none());
    assert!(!guard.renders());
    assert_eq!(guard.decision(), GuardDecision::Redirect("/login".into()));
    assert_eq!(nav.current(), "/login");
}

#[test]
fn dropped_guard_no_longer_navigates() {
    let store = new_store();
    store.login(&token_for("u1", LAWYER, NOW + 60)).unwrap();
    let nav = Arc::new(HistoryNavigator::new("/cases"));
    let guard = RouteGuard::mount(&store, AuthorizationRequirement::roles([LAWYER]), nav.clone());
    drop(guard);
    store.logout();
    assert_eq!(nav.current(), "/cases");
}
