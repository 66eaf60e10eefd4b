//! Translation sessions.
//!
//! A session is the full pipeline for one landmark stream: feature extraction,
//! the sliding feature window, the model and the prediction smoother. It owns
//! both windows exclusively and shares the model and labels read-only. The
//! windows are released when the session is dropped.

use std::sync::Arc;

use common::protocol::Landmark;

use crate::{
    aggregator::{FeatureAggregator, FlattenedBatch},
    config::PipelineConfig,
    error::SignError,
    features::{extract_features, FeatureVector, Normalization},
    labels::{argmax, LabelTable},
    nn::InferModel,
    stabilizer::PredictionStabilizer,
};

/// Shared, immutable ingredients of every session fed with hand landmarks.
pub struct SessionFactory<M> {
    config: PipelineConfig,
    labels: Arc<LabelTable>,
    model: Arc<M>,
}

impl<M: InferModel> SessionFactory<M> {
    /// Fails if the config cannot take the features of one hand per frame.
    pub fn new(
        config: PipelineConfig,
        labels: Arc<LabelTable>,
        model: Arc<M>,
    ) -> Result<Self, SignError> {
        config.validate_for_landmarks()?;

        Ok(Self {
            config,
            labels,
            model,
        })
    }

    /// Start a new session with empty windows.
    pub fn create(&self, name: &str) -> Result<TranslationSession<M>, SignError> {
        TranslationSession::new(
            name,
            &self.config,
            Arc::clone(&self.labels),
            Arc::clone(&self.model),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Landmark-to-label pipeline of one stream, owning its feature and prediction windows.
pub struct TranslationSession<M> {
    name: String,
    normalization: Normalization,
    aggregator: FeatureAggregator,
    stabilizer: PredictionStabilizer,
    labels: Arc<LabelTable>,
    model: Arc<M>,
}

impl<M: InferModel> TranslationSession<M> {
    pub fn new(
        name: &str,
        config: &PipelineConfig,
        labels: Arc<LabelTable>,
        model: Arc<M>,
    ) -> Result<Self, SignError> {
        config.validate()?;
        log::debug!("Starting session {}", name);

        Ok(Self {
            name: name.to_owned(),
            normalization: config.normalization,
            aggregator: FeatureAggregator::from_config(config),
            stabilizer: PredictionStabilizer::new(config.buffer_size, Arc::clone(&labels)),
            labels,
            model,
        })
    }

    /// Feed the landmarks of one camera frame.
    ///
    /// Frames without a hand leave the session untouched. Returns the new
    /// label if the frame completed a window.
    pub fn process_landmarks(
        &mut self,
        landmarks: Option<&[Landmark]>,
    ) -> Result<Option<&str>, SignError> {
        match landmarks {
            None => Ok(None),
            Some(landmarks) => {
                let features = extract_features(landmarks, self.normalization)?;
                self.process_features(features)
            }
        }
    }

    /// Feed one feature vector, running the model once the window is full.
    pub fn process_features(&mut self, vector: FeatureVector) -> Result<Option<&str>, SignError> {
        match self.aggregator.push(vector)? {
            None => Ok(None),
            Some(batch) => {
                let scores = self.infer(&batch)?;
                self.process_scores(&scores).map(Some)
            }
        }
    }

    /// Feed the model scores of one frame and return the stabilized label.
    ///
    /// Empty scores count as a frame without prediction. Scores that do not
    /// cover exactly the label table are rejected.
    pub fn process_scores(&mut self, scores: &[f32]) -> Result<&str, SignError> {
        if !scores.is_empty() && scores.len() != self.labels.len() {
            return Err(SignError::invalid_input(
                "score vector",
                self.labels.len(),
                scores.len(),
            ));
        }

        let label = self.stabilizer.push(argmax(scores));
        log::debug!("{}: {}", &self.name, label);

        Ok(label)
    }

    fn infer(&self, batch: &FlattenedBatch) -> Result<Vec<f32>, SignError> {
        Ok(self.model.run(batch)?)
    }

    /// Label of the current majority without feeding a frame.
    pub fn current_label(&self) -> &str {
        self.stabilizer.current()
    }

    /// Clear both windows, e.g. after the camera was switched.
    pub fn reset(&mut self) {
        log::debug!("Resetting session {}", &self.name);
        self.aggregator.clear();
        self.stabilizer.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffered_frames(&self) -> usize {
        self.aggregator.len()
    }

    pub fn buffered_predictions(&self) -> usize {
        self.stabilizer.len()
    }
}

impl<M> Drop for TranslationSession<M> {
    fn drop(&mut self) {
        self.aggregator.clear();
        self.stabilizer.clear();
        log::debug!("Closed session {}", &self.name);
    }
}
