//! Signed-token fixtures shaped like the backend's playback credentials.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Seconds since epoch, now.
#[must_use]
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Three-segment token whose payload carries `exp` at the given epoch
/// second. The signature segment is filler; the client never verifies it.
#[must_use]
pub fn signed_token_at(exp_epoch_secs: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp_epoch_secs}}}"#));
    let signature = URL_SAFE_NO_PAD.encode(b"fixture-signature");
    format!("{header}.{payload}.{signature}")
}

/// Token expiring `ttl` from now.
#[must_use]
pub fn signed_token(ttl: Duration) -> String {
    signed_token_at(now_epoch() + ttl.as_secs())
}
