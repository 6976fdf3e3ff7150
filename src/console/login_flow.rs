//! Two-step sign-in: credentials first, then the one-time password mailed to the operator.
//! Only the second step produces a token and touches the session.

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::identity::{Identity, SessionStore, AUTH_EMAIL_KEY, USER_ID_KEY};

use super::auth_client::AuthClient;

pub const VERIFY_OTP_PATH: &str = "/verify-otp";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

/// Where the console goes after a login step, and what it learned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// Credentials accepted; the operator must now supply an OTP or reset the password.
    Pending { next: String },
    SignedIn { identity: Identity, next: String },
    /// No email pending verification; start over at the login page.
    Restart { next: String },
}

impl LoginStep {
    pub fn next(&self) -> &str {
        match self {
            LoginStep::Pending { next } | LoginStep::SignedIn { next, .. } | LoginStep::Restart { next } => next,
        }
    }
}

pub struct LoginFlow {
    client: AuthClient,
    store: SessionStore,
    login_path: String,
    home_path: String,
}

impl LoginFlow {
    pub fn new(client: AuthClient, store: SessionStore, login_path: impl Into<String>, home_path: impl Into<String>) -> Self {
        Self { client, store, login_path: login_path.into(), home_path: home_path.into() }
    }

    pub async fn submit_credentials(&self, email: &str, password: &str) -> AppResult<LoginStep> {
        let accepted = self.client.login(email, password).await.map_err(|e| {
            warn!(target: "reg_console::login", "credentials rejected for {email}: {e}");
            AppError::auth("invalid_credentials", "Invalid credentials")
        })?;
        let storage = self.store.storage();
        storage.set(AUTH_EMAIL_KEY, email)?;
        match &accepted.user_id {
            Some(uid) => storage.set(USER_ID_KEY, uid)?,
            None => storage.remove(USER_ID_KEY)?,
        }
        let next = if accepted.reset_password { RESET_PASSWORD_PATH } else { VERIFY_OTP_PATH };
        info!(target: "reg_console::login", "credentials accepted for {email}, next {next}");
        Ok(LoginStep::Pending { next: next.to_string() })
    }

    pub async fn verify_otp(&self, otp: &str) -> AppResult<LoginStep> {
        let Some(email) = self.pending_email()? else {
            return Ok(LoginStep::Restart { next: self.login_path.clone() });
        };
        let verified = self.client.verify_otp(&email, otp.trim()).await.map_err(|e| {
            warn!(target: "reg_console::login", "otp rejected for {email}: {e}");
            AppError::auth("invalid_otp", "Invalid or expired OTP.")
        })?;
        let identity = self.store.login(&verified.access_token)?;
        let next = if verified.must_reset_password { RESET_PASSWORD_PATH.to_string() } else { self.home_path.clone() };
        Ok(LoginStep::SignedIn { identity, next })
    }

    pub async fn resend_otp(&self) -> AppResult<LoginStep> {
        let Some(email) = self.pending_email()? else {
            return Ok(LoginStep::Restart { next: self.login_path.clone() });
        };
        self.client
            .resend_otp(&email)
            .await
            .map_err(|_| AppError::backend("otp_resend_failed", "Failed to resend OTP."))?;
        info!(target: "reg_console::login", "otp resent to {email}");
        Ok(LoginStep::Pending { next: VERIFY_OTP_PATH.to_string() })
    }

    pub fn pending_email(&self) -> AppResult<Option<String>> {
        Ok(self.store.storage().get(AUTH_EMAIL_KEY)?)
    }
}
