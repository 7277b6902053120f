use crate::error::ApiError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

/// Creates a hex-encoded HMAC-SHA256 signature of `payload`.
///
/// Binance requires every private API call to carry this signature of its full query string.
pub fn sign_request(secret: &str, payload: &str) -> Result<String, ApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Credentials(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Stamps `params` with `timestamp` (ms) and returns the query string with its signature appended.
pub fn signed_query(
    secret: &str,
    params: &mut BTreeMap<&'static str, String>,
    timestamp: i64,
) -> Result<String, ApiError> {
    params.insert("timestamp", timestamp.to_string());
    let query = serde_qs::to_string(params).map_err(|e| ApiError::InvalidData(e.to_string()))?;
    let signature = sign_request(secret, &query)?;
    Ok(format!("{query}&signature={signature}"))
}
