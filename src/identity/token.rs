use base64::Engine;
use serde::{Deserialize, Deserializer};

/// Decoded claims of a bearer token describing the current operator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Claims")]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub role: String,
    pub role_id: String,
    /// `exp` in whole seconds, for display.
    pub expires_at_epoch_seconds: i64,
    /// `exp` at millisecond precision; expiry checks use this one.
    pub expires_at_epoch_millis: i64,
}

impl Identity {
    /// A token is only valid while its expiry lies strictly in the future.
    pub fn is_valid_at(&self, now_epoch_millis: i64) -> bool {
        self.expires_at_epoch_millis > now_epoch_millis
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(deserialize_with = "string_or_integer")]
    sub: String,
    email: String,
    role: String,
    #[serde(deserialize_with = "string_or_integer")]
    role_id: String,
    #[serde(deserialize_with = "epoch_millis")]
    exp: i64,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            subject_id: c.sub,
            email: c.email,
            role: c.role,
            role_id: c.role_id,
            expires_at_epoch_seconds: c.exp.div_euclid(1000),
            expires_at_epoch_millis: c.exp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),
    #[error("token payload is not base64url: {0}")]
    Base64(String),
    #[error("token payload does not carry the expected claims: {0}")]
    Claims(String),
}

/// Decode the payload segment of a signed token without verifying the signature.
/// Verification is the issuer's job; the console only reads the claims and `exp`.
pub fn decode(raw: &str) -> Result<Identity, DecodeError> {
    let segments: Vec<&str> = raw.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }
    // Issuers differ on padding; strip it and decode unpadded.
    let payload = segments[1].trim_end_matches('=');
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    serde_json::from_slice::<Identity>(&bytes).map_err(|e| DecodeError::Claims(e.to_string()))
}

fn string_or_integer<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

// NumericDate seconds, possibly fractional, kept to the millisecond.
fn epoch_millis<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(de)?;
    if let Some(i) = n.as_i64() {
        return i.checked_mul(1000).ok_or_else(|| serde::de::Error::custom("exp is out of range"));
    }
    n.as_f64()
        .map(|f| (f * 1000.0).floor())
        .filter(|ms| ms.is_finite() && ms.abs() < i64::MAX as f64)
        .map(|ms| ms as i64)
        .ok_or_else(|| serde::de::Error::custom("exp is not a finite number"))
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
