use thiserror::Error;

/// Broad fault domain reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FaultDomain {
    /// Manifest/segment request failure; `status` is the HTTP status when
    /// the engine saw one.
    Network { status: Option<u16> },
    /// Decode or buffer corruption.
    Media,
    Other,
}

/// Runtime fault payload carried by [`crate::EngineEvent::Fault`].
///
/// Mirrors the error data adaptive engines expose: a coarse domain, a
/// fatality flag, and a human-readable detail string. Non-fatal faults are
/// informational; the engine keeps running.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct EngineFault {
    pub domain: FaultDomain,
    pub fatal: bool,
    pub detail: String,
}

impl EngineFault {
    #[must_use]
    pub fn network(status: Option<u16>, fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            domain: FaultDomain::Network { status },
            fatal,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn media(fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            domain: FaultDomain::Media,
            fatal,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn other(fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            domain: FaultDomain::Other,
            fatal,
            detail: detail.into(),
        }
    }

    /// HTTP status of the underlying request, for network faults that saw a
    /// response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.domain {
            FaultDomain::Network { status } => status,
            _ => None,
        }
    }

    /// True when the response status indicates an expired or rejected
    /// credential.
    #[must_use]
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
