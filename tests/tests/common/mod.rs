// Common fixtures and utilities for integration tests


pub use video_service::*;
