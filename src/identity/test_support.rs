use base64::Engine;
use serde_json::{json, Value};

/// Build an unsigned three-segment token around the given claims.
pub(crate) fn unsigned_token(claims: &Value) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = enc.encode(json!({ "alg": "HS256", "typ": "JWT" }).to_string());
    let payload = enc.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

pub(crate) fn token_for(sub: &str, role: &str, exp: i64) -> String {
    unsigned_token(&json!({
        "sub": sub,
        "email": format!("{sub}@reg.rw"),
        "role": role,
        "role_id": format!("{}-id", role.to_lowercase()),
        "exp": exp,
    }))
}
