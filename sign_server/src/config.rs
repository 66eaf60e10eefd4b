//! Configuration of a translation pipeline.

use crate::{
    error::SignError,
    features::{Normalization, FEATURE_SIZE},
};

/// Default number of frames fed to the model at once.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Default number of predictions the majority vote runs over.
pub const DEFAULT_BUFFER_SIZE: usize = 5;

/// Startup-time parameters of a pipeline session.
///
/// Sessions copy the config on creation, so changes never reach a running
/// session.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Frames per model input (default: 30)
    pub window_size: usize,

    /// Values per frame (default: 63, 21 landmarks x 3 coordinates)
    pub feature_size: usize,

    /// Predictions per majority vote (default: 5)
    pub buffer_size: usize,

    /// Landmark normalization before aggregation (default: none)
    pub normalization: Normalization,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            feature_size: FEATURE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            normalization: Normalization::None,
        }
    }
}

impl PipelineConfig {
    /// Check that every window has room for at least one element.
    pub fn validate(&self) -> Result<(), SignError> {
        for (name, value) in [
            ("window_size", self.window_size),
            ("feature_size", self.feature_size),
            ("buffer_size", self.buffer_size),
        ] {
            if value == 0 {
                return Err(SignError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }

        Ok(())
    }

    /// Check that frames built from hand landmarks fit the feature window.
    pub fn validate_for_landmarks(&self) -> Result<(), SignError> {
        self.validate()?;

        if self.feature_size != FEATURE_SIZE {
            return Err(SignError::InvalidConfig(format!(
                "feature_size {} does not match the {} values extracted per hand",
                self.feature_size, FEATURE_SIZE
            )));
        }

        Ok(())
    }

    /// Number of floats in one flattened batch.
    pub fn batch_len(&self) -> usize {
        self.window_size * self.feature_size
    }
}
