use thiserror::Error;

/// Errors raised while constructing an engine instance.
///
/// Runtime faults travel as [`crate::EngineFault`] events instead; once an
/// instance exists its methods never fail synchronously.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("engine construction failed: {reason}")]
    Construction { reason: String },
}
