//! Replays recorded hand landmarks to a sign server.
pub mod recording;

/// Error type.
pub type Error = Box<dyn std::error::Error>;
