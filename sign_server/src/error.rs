//! Error types of the translation pipeline.

use thiserror::Error;

/// Errors raised while turning landmark frames into labels.
///
/// All of them are local to a single frame or session: the caller rejects the
/// frame and keeps going.
#[derive(Error, Debug)]
pub enum SignError {
    /// Input of the wrong length reached the pipeline
    #[error("Invalid {what}: expected {expected} values, got {actual}")]
    InvalidInput {
        /// Kind of input that was rejected
        what: &'static str,
        /// Length the pipeline is configured for
        expected: usize,
        /// Length that was received
        actual: usize,
    },

    /// Pipeline configuration cannot be used to build a session
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The model failed to produce scores for a batch
    #[error("Inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

impl SignError {
    pub(crate) fn invalid_input(what: &'static str, expected: usize, actual: usize) -> Self {
        SignError::InvalidInput {
            what,
            expected,
            actual,
        }
    }
}
