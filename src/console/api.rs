use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::identity::SessionStore;

use super::auth_client::parse_base;

/// Read-only access to the backend's JSON resources on behalf of the signed-in operator.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base: Url,
    http: reqwest::Client,
    store: SessionStore,
}

impl BackendClient {
    pub fn new(base_url: &str, store: SessionStore) -> AppResult<Self> {
        Ok(Self { base: parse_base(base_url)?, http: reqwest::Client::builder().build()?, store })
    }

    pub async fn get_json(&self, path: &str) -> AppResult<Value> {
        let token = self
            .store
            .token()
            .ok_or_else(|| AppError::auth("no_session", "sign in before calling the backend"))?;
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::user("bad_url", e.to_string().as_str()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AppError::internal("bad_token_bytes", e.to_string().as_str()))?;
        debug!(target: "reg_console::api", "GET {}", url);
        let resp = self.http.get(url).header(AUTHORIZATION, bearer).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::from_status(status.as_u16(), text));
        }
        resp.json::<Value>().await.map_err(|e| AppError::backend("bad_response", e.to_string().as_str()))
    }
}
