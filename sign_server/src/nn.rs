use std::path::Path;

use anyhow::{bail, Context, Result};
use tract_onnx::prelude::*;

use crate::aggregator::FlattenedBatch;

type NnModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Classifier turning a full feature window into per-class scores.
pub trait InferModel: Send + Sync {
    fn run(&self, batch: &FlattenedBatch) -> Result<Vec<f32>>;
}

/// Hand sign classifier exported to ONNX.
///
/// The model takes a `[1, window_size, feature_size]` float tensor and returns
/// one score per label.
pub struct OnnxSignModel {
    model: NnModel,
    window_size: usize,
    feature_size: usize,
}

impl OnnxSignModel {
    pub fn new(path: impl AsRef<Path>, window_size: usize, feature_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let model = get_sign_model(path, window_size, feature_size)
            .with_context(|| format!("failed to load model {}", path.display()))?;
        log::info!(
            "Loaded model {} with input [1, {}, {}]",
            path.display(),
            window_size,
            feature_size
        );

        Ok(Self {
            model,
            window_size,
            feature_size,
        })
    }

    fn preproc(&self, batch: &FlattenedBatch) -> Result<Tensor> {
        if batch.window_size() != self.window_size || batch.feature_size() != self.feature_size {
            bail!(
                "batch of shape [{}, {}] does not fit model input [{}, {}]",
                batch.window_size(),
                batch.feature_size(),
                self.window_size,
                self.feature_size
            );
        }

        let tensor: Tensor = tract_ndarray::Array3::from_shape_vec(
            (1, self.window_size, self.feature_size),
            batch.as_slice().to_vec(),
        )?
        .into();

        Ok(tensor)
    }

    fn postproc(&self, output: &Tensor) -> Result<Vec<f32>> {
        // Quantized outputs are dequantized by the cast
        let scores = output.cast_to::<f32>()?;
        Ok(scores.as_slice::<f32>()?.to_vec())
    }
}

impl InferModel for OnnxSignModel {
    fn run(&self, batch: &FlattenedBatch) -> Result<Vec<f32>> {
        let valid_input = tvec!(self.preproc(batch)?.into());
        let raw_nn_out = self.model.run(valid_input)?;
        let scores = raw_nn_out
            .first()
            .context("model produced no outputs")?;

        self.postproc(scores)
    }
}

fn get_sign_model(path: &Path, window_size: usize, feature_size: usize) -> Result<NnModel> {
    let input_fact =
        InferenceFact::dt_shape(f32::datum_type(), tvec!(1, window_size, feature_size));
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, input_fact)?
        .into_optimized()?
        .into_runnable()?;

    Ok(model)
}
