use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::roles;
use super::session::{LoadingState, SessionSnapshot, SessionStore, Subscription};

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_UNAUTHORIZED_PATH: &str = "/dashboard";

/// Access policy a protected page declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequirement {
    pub allowed_roles: BTreeSet<String>,
    pub owner_access: bool,
    pub owner_id: Option<String>,
    pub redirect_unauthenticated: String,
    pub redirect_unauthorized: String,
}

impl Default for AuthorizationRequirement {
    fn default() -> Self {
        Self {
            allowed_roles: BTreeSet::new(),
            owner_access: false,
            owner_id: None,
            redirect_unauthenticated: DEFAULT_LOGIN_PATH.to_string(),
            redirect_unauthorized: DEFAULT_UNAUTHORIZED_PATH.to_string(),
        }
    }
}

impl AuthorizationRequirement {
    pub fn roles<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { allowed_roles: roles::set(allowed), ..Default::default() }
    }

    /// Owner-only page: no role grants access, only a matching subject id.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self::default().with_owner(owner_id)
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_access = true;
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn redirect_unauthenticated_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_unauthenticated = path.into();
        self
    }

    pub fn redirect_unauthorized_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_unauthorized = path.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading: render nothing and do not redirect.
    Pending,
    Render,
    Redirect(String),
}

impl GuardDecision {
    pub fn renders(&self) -> bool { matches!(self, GuardDecision::Render) }
}

pub fn evaluate(req: &AuthorizationRequirement, session: &SessionSnapshot) -> GuardDecision {
    if session.loading_state == LoadingState::Initializing {
        return GuardDecision::Pending;
    }
    let Some(identity) = &session.identity else {
        return GuardDecision::Redirect(req.redirect_unauthenticated.clone());
    };
    let authorized_by_role = req.allowed_roles.contains(&identity.role);
    let owner_id = req.owner_id.as_deref().filter(|id| !id.is_empty());
    let is_owner = req.owner_access && owner_id == Some(identity.subject_id.as_str());
    if authorized_by_role || is_owner {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(req.redirect_unauthorized.clone())
    }
}

/// Sink for redirects issued by a guard. Navigation is fire and forget.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

struct GuardState {
    requirement: AuthorizationRequirement,
    decision: GuardDecision,
}

/// A mounted guard for one page. It re-evaluates whenever the session changes and
/// whenever the requirement is replaced, and forwards every redirect to the navigator.
pub struct RouteGuard {
    state: Arc<RwLock<GuardState>>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    _subscription: Subscription,
}

impl RouteGuard {
    pub fn mount(store: &SessionStore, requirement: AuthorizationRequirement, navigator: Arc<dyn Navigator>) -> Self {
        let state = Arc::new(RwLock::new(GuardState { requirement, decision: GuardDecision::Pending }));
        let observer_state = state.clone();
        let observer_nav = navigator.clone();
        let subscription = store.subscribe(move |snap| {
            apply(&observer_state, snap, observer_nav.as_ref());
        });
        let guard = Self { state, store: store.clone(), navigator, _subscription: subscription };
        guard.reevaluate();
        guard
    }

    pub fn set_requirement(&self, requirement: AuthorizationRequirement) {
        let changed = {
            let mut st = self.state.write();
            let changed = st.requirement != requirement;
            st.requirement = requirement;
            changed
        };
        if changed {
            self.reevaluate();
        }
    }

    pub fn requirement(&self) -> AuthorizationRequirement { self.state.read().requirement.clone() }

    pub fn decision(&self) -> GuardDecision { self.state.read().decision.clone() }

    pub fn renders(&self) -> bool { self.state.read().decision.renders() }

    fn reevaluate(&self) {
        apply(&self.state, &self.store.snapshot(), self.navigator.as_ref());
    }
}

fn apply(state: &RwLock<GuardState>, snap: &SessionSnapshot, navigator: &dyn Navigator) {
    let decision = {
        let mut st = state.write();
        st.decision = evaluate(&st.requirement, snap);
        st.decision.clone()
    };
    debug!(target: "reg_console::guard", "guard decision {:?}", decision);
    if let GuardDecision::Redirect(path) = decision {
        navigator.navigate(&path);
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
