//! Common code shared between `sign_server` and `landmark_sender`.
pub mod protocol;

/// Error type.
pub type Error = Box<dyn std::error::Error>;
