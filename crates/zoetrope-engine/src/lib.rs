#![forbid(unsafe_code)]

//! Seam between the playback session layer and a third-party adaptive
//! streaming engine.
//!
//! The engine itself (manifest parsing, segment scheduling, bandwidth
//! estimation) lives behind [`StreamingEngine`]; this crate only fixes the
//! surface the session layer is allowed to touch: lifecycle calls, the
//! bitrate-ladder vocabulary, and a tagged event union delivered over a
//! broadcast channel.

mod error;
mod events;
mod fault;
mod traits;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::EngineError;
pub use events::{EngineEvent, EventEmitter};
pub use fault::{EngineFault, FaultDomain};
pub use traits::{EngineFactory, PlayerHost, StreamingEngine};
pub use types::{Capability, EngineOptions, LevelId, LevelInfo};
