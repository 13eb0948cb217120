#![forbid(unsafe_code)]
#![expect(
    clippy::unwrap_used,
    reason = "test utility crate — unwraps are acceptable"
)]

//! Shared test utilities for the zoetrope workspace.

pub mod engine;
pub mod fixtures;
pub mod http_server;
pub mod token;

pub use engine::{EngineCall, EngineProbe, ScriptedFactory, StubHost};
pub use fixtures::*;
pub use http_server::TestHttpServer;
pub use token::{signed_token, signed_token_at};
