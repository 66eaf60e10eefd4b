//! Class labels and score utilities.
//!
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Label shown while no confident prediction is available.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Labels of the hand sign model, in the order of its outputs.
pub const ASL_LABELS: [&str; 29] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "del", "nothing", "space",
];

/// Immutable mapping from class index to label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a label file with one label per line.
    ///
    /// Surrounding whitespace is trimmed and blank lines are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;

        let table = Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        if table.is_empty() {
            bail!("label file {} contains no labels", path.display());
        }

        log::info!("Loaded {} labels from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(ASL_LABELS)
    }
}

/// Index of the highest score, `None` if there is nothing to choose from.
///
/// The first of several equal maxima wins. NaN scores are never selected.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => (),
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}
