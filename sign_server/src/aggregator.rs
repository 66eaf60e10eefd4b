//! Sliding window of feature vectors feeding the model.
//!
//! The window fills up frame by frame. Once it holds `window_size` vectors,
//! every further push evicts the oldest vector and yields a new batch, so the
//! model sees a batch per frame in steady state.

use std::collections::VecDeque;

use crate::{config::PipelineConfig, error::SignError, features::FeatureVector};

/// Full window flattened into model input order.
///
/// Vectors are laid out oldest to newest, each in its original element order:
/// `batch[i * feature_size + j] == window[i][j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedBatch {
    data: Vec<f32>,
    window_size: usize,
    feature_size: usize,
}

impl FlattenedBatch {
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    /// Feature vector at position `index` of the window, oldest first.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        self.data.chunks_exact(self.feature_size).nth(index)
    }

    /// Encode as 32-bit floats in native byte order.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|value| value.to_ne_bytes()).collect()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Size-bounded FIFO of feature vectors.
#[derive(Debug)]
pub struct FeatureAggregator {
    window: VecDeque<FeatureVector>,
    window_size: usize,
    feature_size: usize,
}

impl FeatureAggregator {
    /// Create an empty window.
    ///
    /// Panics if either size is zero.
    pub fn new(window_size: usize, feature_size: usize) -> Self {
        assert!(window_size > 0, "window_size must be non-zero");
        assert!(feature_size > 0, "feature_size must be non-zero");

        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            feature_size,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.window_size, config.feature_size)
    }

    /// Add the newest vector, evicting the oldest one if the window is full.
    ///
    /// Returns the flattened window whenever it is full after the push.
    /// Vectors of the wrong length are rejected without touching the window.
    pub fn push(&mut self, vector: FeatureVector) -> Result<Option<FlattenedBatch>, SignError> {
        if vector.len() != self.feature_size {
            return Err(SignError::invalid_input(
                "feature vector",
                self.feature_size,
                vector.len(),
            ));
        }

        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(vector);

        if self.is_full() {
            Ok(Some(self.flatten()))
        } else {
            Ok(None)
        }
    }

    fn flatten(&self) -> FlattenedBatch {
        let mut data = Vec::with_capacity(self.window_size * self.feature_size);
        for vector in self.window.iter() {
            data.extend_from_slice(vector);
        }

        FlattenedBatch {
            data,
            window_size: self.window_size,
            feature_size: self.feature_size,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.window_size
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
