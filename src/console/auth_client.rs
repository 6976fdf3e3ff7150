//! Client for the authentication service: password check, OTP verification, OTP resend.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialsAccepted {
    #[serde(rename = "resetPassword", default)]
    pub reset_password: bool,
    #[serde(rename = "userId", default, deserialize_with = "opt_string_or_integer")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OtpVerified {
    pub access_token: String,
    #[serde(rename = "mustResetPassword", default)]
    pub must_reset_password: bool,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct OtpSubmission<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    base: Url,
    http: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base = parse_base(base_url)?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self { base, http })
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<CredentialsAccepted> {
        self.post("auth/login", &Credentials { email, password }).await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> AppResult<OtpVerified> {
        self.post("auth/verify-otp", &OtpSubmission { email, otp }).await
    }

    pub async fn resend_otp(&self, email: &str) -> AppResult<serde_json::Value> {
        self.post("auth/resend-otp", &json!({ "email": email })).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.base.join(path).map_err(|e| AppError::user("bad_url", e.to_string().as_str()))?;
        debug!(target: "reg_console::auth", "POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::from_status(status.as_u16(), text));
        }
        resp.json::<T>().await.map_err(|e| AppError::backend("bad_response", e.to_string().as_str()))
    }
}

/// Normalize the base so relative joins append rather than replace the last segment.
pub(crate) fn parse_base(base_url: &str) -> AppResult<Url> {
    let mut s = base_url.trim().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    Url::parse(&s).map_err(|e| AppError::user("bad_url", format!("invalid API base URL '{base_url}': {e}").as_str()))
}

fn opt_string_or_integer<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(de)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
