//! Fatal-fault recovery policy.
//!
//! Each fault kind gets one in-place recovery attempt per burst window.
//! A second fatal fault of the same kind inside the window means the
//! recovery did not take, and the session aborts instead of looping.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use zoetrope_engine::{EngineFault, FaultDomain};

/// Fatal fault classes the policy tracks separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum FaultKind {
    /// Network rejection that looks like an expired credential.
    AuthExpired,
    /// Any other network failure.
    Network,
    /// Decode or buffering failure.
    Media,
    Other,
}

/// Action the session takes for a fatal fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Recovery {
    /// Fetch a fresh signed URL and feed it to the existing engine.
    RefreshToken,
    /// Ask the engine to restart loading from the current position.
    RestartLoad,
    /// Ask the engine to flush and rebuild its media buffers.
    RecoverMedia,
    /// Tear the session down.
    Abort,
}

/// Maps a fatal engine fault onto a tracked kind.
///
/// Non-fatal faults are informational and yield `None`.
pub(crate) fn classify(fault: &EngineFault) -> Option<FaultKind> {
    if !fault.fatal {
        return None;
    }
    Some(match fault.domain {
        FaultDomain::Network { .. } if fault.is_auth_rejected() => FaultKind::AuthExpired,
        FaultDomain::Network { .. } => FaultKind::Network,
        FaultDomain::Media => FaultKind::Media,
        _ => FaultKind::Other,
    })
}

#[derive(Debug)]
pub(crate) struct RecoveryPolicy {
    window: Duration,
    last_attempt: HashMap<FaultKind, Instant>,
}

impl RecoveryPolicy {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            last_attempt: HashMap::new(),
        }
    }

    /// Picks the recovery for `kind`, spending that kind's retry budget.
    pub(crate) fn decide(&mut self, kind: FaultKind) -> Recovery {
        self.decide_at(kind, Instant::now())
    }

    fn decide_at(&mut self, kind: FaultKind, now: Instant) -> Recovery {
        if kind == FaultKind::Other {
            return Recovery::Abort;
        }
        if let Some(prev) = self.last_attempt.get(&kind) {
            if now.duration_since(*prev) < self.window {
                return Recovery::Abort;
            }
        }
        self.last_attempt.insert(kind, now);
        match kind {
            FaultKind::AuthExpired => Recovery::RefreshToken,
            FaultKind::Network => Recovery::RestartLoad,
            FaultKind::Media => Recovery::RecoverMedia,
            FaultKind::Other => Recovery::Abort,
        }
    }
}
