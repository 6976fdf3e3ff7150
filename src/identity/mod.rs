//! Session lifecycle and role-gated page authorization for the console.
//! Keep the public surface thin and split implementation across sub-modules.

mod clock;
mod guard;
pub mod roles;
mod session;
mod storage;
mod token;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use guard::{
    evaluate, AuthorizationRequirement, GuardDecision, Navigator, RouteGuard, DEFAULT_LOGIN_PATH,
    DEFAULT_UNAUTHORIZED_PATH,
};
pub use session::{LoadingState, SessionError, SessionSnapshot, SessionStore, Subscription};
pub use storage::{
    DurableStorage, FileStorage, MemoryStorage, ACCESS_TOKEN_KEY, AUTH_EMAIL_KEY, SESSION_SCOPED_KEYS, USER_ID_KEY,
};
pub use token::{decode, DecodeError, Identity};
