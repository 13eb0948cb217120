#![forbid(unsafe_code)]

//! Adaptive playback session control.
//!
//! [`PlaybackController`] glues the pieces together: it fetches video
//! metadata and a signed stream URL from the backend, arms a streaming
//! engine on a host surface, keeps the signing token fresh, mirrors the
//! engine's bitrate ladder into a quality list, and recovers from fatal
//! engine faults where recovery is worth attempting. The UI talks to the
//! controller through intents and renders whatever comes back on the
//! event stream, never the other way around.

mod adapter;
mod error;
mod events;
mod options;
mod quality;
mod recovery;
mod session;
mod token;

pub use error::{SessionError, SessionResult};
pub use events::{PlaybackState, SessionEvent, SessionStatus};
pub use options::SessionOptions;
pub use quality::{QualityLevel, Selection};
pub use session::PlaybackController;
