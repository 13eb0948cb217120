//! Signed stream URL handling.
//!
//! Stream URLs carry a short-lived JWT in a query parameter. The token is
//! never validated here; only its `exp` claim is read so the session can
//! fetch a fresh URL shortly before the current one stops working.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::{SessionError, SessionResult};

/// Expiry claim read from the credential in a signed stream URL.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StreamToken {
    expires_at: SystemTime,
}

impl StreamToken {
    /// How long to wait before refreshing, leaving `grace` before expiry.
    ///
    /// Already-expired tokens yield a zero delay.
    pub(crate) fn refresh_delay(&self, grace: Duration) -> Duration {
        self.refresh_delay_from(grace, SystemTime::now())
    }

    fn refresh_delay_from(&self, grace: Duration, now: SystemTime) -> Duration {
        self.expires_at
            .duration_since(now)
            .unwrap_or_default()
            .saturating_sub(grace)
    }
}

/// Pulls the signed token out of `url` and decodes its expiry claim.
pub(crate) fn extract(url: &Url, param: &str) -> SessionResult<StreamToken> {
    let raw = url
        .query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| SessionError::TokenMissing {
            detail: format!("stream url carries no `{param}` query parameter"),
        })?;

    let expires_at = decode_expiry(&raw)?;
    Ok(StreamToken { expires_at })
}

fn decode_expiry(raw: &str) -> SessionResult<SystemTime> {
    let mut parts = raw.split('.');
    let payload = match (parts.next(), parts.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => {
            return Err(SessionError::TokenMissing {
                detail: "token is not a well-formed JWT".to_owned(),
            })
        }
    };

    // Issuers are inconsistent about padding the payload segment.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .map_err(|_| SessionError::TokenMissing {
            detail: "token payload is not base64url".to_owned(),
        })?;

    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| SessionError::TokenMissing {
            detail: "token payload is not valid JSON".to_owned(),
        })?;

    let exp = claims.get("exp");
    let seconds = exp
        .and_then(serde_json::Value::as_u64)
        .map(Duration::from_secs)
        .or_else(|| {
            // Fallible: rejects negative, NaN, and out-of-range floats.
            exp.and_then(serde_json::Value::as_f64)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        })
        .ok_or_else(|| SessionError::TokenMissing {
            detail: "token payload has no usable `exp` claim".to_owned(),
        })?;

    Ok(UNIX_EPOCH + seconds)
}

/// Fired when the armed refresh timer elapses.
///
/// The generation ties the message to the timer that produced it; stale
/// messages from superseded timers are dropped by the receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RefreshDue {
    pub generation: u64,
}

/// One-shot refresh timer.
///
/// At most one timer is pending; arming a new one cancels the previous, so
/// each armed timer fires at most once.
#[derive(Debug)]
pub(crate) struct RefreshScheduler {
    tx: mpsc::Sender<RefreshDue>,
    grace: Duration,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl RefreshScheduler {
    pub(crate) fn new(grace: Duration) -> (Self, mpsc::Receiver<RefreshDue>) {
        let (tx, rx) = mpsc::channel(4);
        (
            Self {
                tx,
                grace,
                generation: 0,
                pending: None,
            },
            rx,
        )
    }

    /// Arms the timer for `token`, replacing any pending one.
    pub(crate) fn schedule(&mut self, token: &StreamToken) {
        let delay = token.refresh_delay(self.grace);
        debug!(delay_secs = delay.as_secs(), "refresh timer armed");
        self.schedule_in(delay);
    }

    pub(crate) fn schedule_in(&mut self, delay: Duration) {
        self.cancel_pending();
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        self.pending = Some(cancel.clone());

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {
                    trace!(generation, "refresh timer cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(RefreshDue { generation }).await;
                }
            }
        });
    }

    pub(crate) fn cancel_pending(&mut self) {
        if let Some(cancel) = self.pending.take() {
            cancel.cancel();
        }
    }

    /// Whether `due` came from the currently armed timer.
    pub(crate) fn is_current(&self, due: RefreshDue) -> bool {
        due.generation == self.generation
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
