#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const NOW: i64 = 1_750_000_000;
pub const PASSWORD: &str = "s3cret";
pub const OTP: &str = "482913";

pub fn unsigned_token(claims: &Value) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = enc.encode(json!({ "alg": "HS256", "typ": "JWT" }).to_string());
    format!("{header}.{}.c2ln", enc.encode(claims.to_string()))
}

pub fn token_for(sub: &str, role: &str, exp: i64) -> String {
    unsigned_token(&json!({
        "sub": sub, "email": format!("{sub}@reg.rw"), "role": role, "role_id": "9", "exp": exp
    }))
}

/// Behaviour of the in-process mock of the authentication service and backend.
pub struct MockBackend {
    pub issued_token: String,
    pub reset_password: bool,
    pub must_reset_password: bool,
    pub resends: AtomicUsize,
    pub case_reads: AtomicUsize,
}

impl MockBackend {
    pub fn issuing(token: String) -> Self {
        Self {
            issued_token: token,
            reset_password: false,
            must_reset_password: false,
            resends: AtomicUsize::new(0),
            case_reads: AtomicUsize::new(0),
        }
    }
}

async fn login(State(mock): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["password"] != PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({ "resetPassword": mock.reset_password, "userId": 7 })))
}

async fn verify_otp(State(mock): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["otp"] != OTP || body["email"].as_str().unwrap_or("").is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({ "access_token": mock.issued_token, "mustResetPassword": mock.must_reset_password })))
}

async fn resend_otp(State(mock): State<Arc<MockBackend>>) -> Json<Value> {
    mock.resends.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "message": "sent" }))
}

async fn cases(State(mock): State<Arc<MockBackend>>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let expected = format!("Bearer {}", mock.issued_token);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    mock.case_reads.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({
        "data": [ { "id": "c1", "title": "Land dispute" }, { "id": "c2", "title": "Claim appeal" } ],
        "meta": { "total": 2, "page": 1, "limit": 5, "totalPages": 1 }
    })))
}

/// Serve the mock on an ephemeral localhost port. Abort the handle to stop it.
pub async fn spawn_backend(mock: Arc<MockBackend>) -> (String, JoinHandle<()>) {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/resend-otp", post(resend_otp))
        .route("/cases", get(cases))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock backend error: {e:?}");
        }
    });
    (format!("http://{addr}"), handle)
}
