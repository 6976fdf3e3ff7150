use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::tprintln;

use super::clock::Clock;
use super::storage::{DurableStorage, ACCESS_TOKEN_KEY, SESSION_SCOPED_KEYS};
use super::token::{decode, DecodeError, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    /// Persisted state has not been read yet; consumers must not act on the empty session.
    Initializing,
    Ready,
}

/// Point-in-time view of the session handed to readers and observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub raw_token: Option<String>,
    pub identity: Option<Identity>,
    pub loading_state: LoadingState,
}

impl SessionSnapshot {
    fn initializing() -> Self {
        Self { raw_token: None, identity: None, loading_state: LoadingState::Initializing }
    }

    fn empty() -> Self {
        Self { raw_token: None, identity: None, loading_state: LoadingState::Ready }
    }

    pub fn is_active(&self) -> bool { self.identity.is_some() }

    pub fn is_authorized(&self, allowed_roles: &BTreeSet<String>) -> bool {
        match &self.identity {
            Some(id) => allowed_roles.contains(&id.role),
            None => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("issued token could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("token could not be persisted: {0}")]
    Storage(#[source] anyhow::Error),
}

type Observer = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

struct Inner {
    state: RwLock<SessionSnapshot>,
    storage: Arc<dyn DurableStorage>,
    clock: Arc<dyn Clock>,
    observers: Mutex<Vec<(u64, Observer)>>,
    next_observer: AtomicU64,
}

/// Single owner of the console's authentication state.
///
/// Cloning yields another handle to the same session. Every mutation goes through
/// `bootstrap`, `login` or `logout`; readers get snapshots or subscribe for changes.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("state", &*self.inner.state.read()).finish()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn DurableStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(SessionSnapshot::initializing()),
                storage,
                clock,
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(1),
            }),
        }
    }

    /// Read the persisted token once at startup. Every failure collapses to "no session".
    pub fn bootstrap(&self) {
        let stored = match self.inner.storage.get(ACCESS_TOKEN_KEY) {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "reg_console::session", "bootstrap: state unreadable, starting without a session: {e:#}");
                None
            }
        };
        let Some(raw) = stored else {
            debug!(target: "reg_console::session", "bootstrap: no persisted token");
            self.replace(SessionSnapshot::empty());
            return;
        };
        let now = self.inner.clock.now_epoch_millis();
        match decode(&raw) {
            Ok(identity) if identity.is_valid_at(now) => {
                info!(target: "reg_console::session", "bootstrap: restored session sub={} role={}", identity.subject_id, identity.role);
                self.replace(SessionSnapshot { raw_token: Some(raw), identity: Some(identity), loading_state: LoadingState::Ready });
            }
            Ok(identity) => {
                info!(target: "reg_console::session", "bootstrap: persisted token expired at {}ms (now {now}ms)", identity.expires_at_epoch_millis);
                self.logout();
            }
            Err(e) => {
                warn!(target: "reg_console::session", "bootstrap: discarding malformed token: {e}");
                self.logout();
            }
        }
    }

    /// Install a freshly issued token. A token the issuer just handed out that fails to
    /// decode is a broken collaborator, so the error is returned rather than absorbed.
    pub fn login(&self, token: &str) -> Result<Identity, SessionError> {
        let identity = decode(token)?;
        self.inner.storage.set(ACCESS_TOKEN_KEY, token).map_err(SessionError::Storage)?;
        info!(target: "reg_console::session", "login sub={} role={}", identity.subject_id, identity.role);
        self.replace(SessionSnapshot {
            raw_token: Some(token.to_string()),
            identity: Some(identity.clone()),
            loading_state: LoadingState::Ready,
        });
        Ok(identity)
    }

    /// Drop the session and every session-scoped key. Safe to call with no session.
    pub fn logout(&self) {
        for key in SESSION_SCOPED_KEYS {
            if let Err(e) = self.inner.storage.remove(key) {
                warn!(target: "reg_console::session", "logout: could not remove '{key}': {e:#}");
            }
        }
        let had_session = self.inner.state.read().is_active();
        if had_session {
            info!(target: "reg_console::session", "logout");
        }
        self.replace(SessionSnapshot::empty());
    }

    /// Log out if the active identity has passed its expiry. Returns true when it did.
    pub fn expire_if_stale(&self) -> bool {
        let now = self.inner.clock.now_epoch_millis();
        let stale = match &self.inner.state.read().identity {
            Some(id) => !id.is_valid_at(now),
            None => false,
        };
        if stale {
            info!(target: "reg_console::session", "session expired (now {now})");
            self.logout();
        }
        stale
    }

    pub fn is_authorized(&self, allowed_roles: &BTreeSet<String>) -> bool {
        self.inner.state.read().is_authorized(allowed_roles)
    }

    pub fn snapshot(&self) -> SessionSnapshot { self.inner.state.read().clone() }

    pub fn token(&self) -> Option<String> { self.inner.state.read().raw_token.clone() }

    pub fn identity(&self) -> Option<Identity> { self.inner.state.read().identity.clone() }

    pub fn loading_state(&self) -> LoadingState { self.inner.state.read().loading_state }

    pub fn storage(&self) -> &Arc<dyn DurableStorage> { &self.inner.storage }

    /// Register an observer for every subsequent state change.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let id = self.inner.next_observer.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().push((id, Arc::new(observer)));
        tprintln!("session.subscribe id={}", id);
        Subscription { id, store: Arc::downgrade(&self.inner) }
    }

    // Swap the whole snapshot under one write lock, then notify with the lock released
    // so observers may read or change the store again. Each observer gets the state as
    // it is at call time: an earlier observer may already have replaced `next`.
    fn replace(&self, next: SessionSnapshot) {
        *self.inner.state.write() = next;
        let observers: Vec<Observer> = self.inner.observers.lock().iter().map(|(_, o)| o.clone()).collect();
        for o in observers {
            let current = self.inner.state.read().clone();
            o(&current);
        }
    }
}

/// Keeps an observer registered; dropping it unsubscribes.
#[must_use = "dropping the subscription unregisters the observer"]
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.observers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
