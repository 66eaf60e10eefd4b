//! Majority-vote smoothing of per-frame predictions.
//!
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::labels::{LabelTable, UNKNOWN_LABEL};

/// Size-bounded FIFO of class indices with a majority vote on top.
///
/// Ties are broken first-seen-wins: among indices with the same maximal count,
/// the one occurring earliest in the window (oldest first) is chosen.
#[derive(Debug)]
pub struct PredictionStabilizer {
    window: VecDeque<usize>,
    buffer_size: usize,
    labels: Arc<LabelTable>,
}

impl PredictionStabilizer {
    /// Create an empty window.
    ///
    /// Panics if `buffer_size` is zero.
    pub fn new(buffer_size: usize, labels: Arc<LabelTable>) -> Self {
        assert!(buffer_size > 0, "buffer_size must be non-zero");

        Self {
            window: VecDeque::with_capacity(buffer_size),
            buffer_size,
            labels,
        }
    }

    /// Record the prediction of one frame and return the stabilized label.
    ///
    /// `None` means the frame had no prediction; the window is left as is.
    pub fn push(&mut self, index: Option<usize>) -> &str {
        if let Some(index) = index {
            if self.window.len() == self.buffer_size {
                self.window.pop_front();
            }
            self.window.push_back(index);
        }

        self.current()
    }

    /// Label of the current majority, `"Unknown"` if there is none.
    pub fn current(&self) -> &str {
        self.majority()
            .and_then(|index| self.labels.get(index))
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Most frequent index in the window.
    pub fn majority(&self) -> Option<usize> {
        let mut counts: HashMap<usize, usize> = HashMap::with_capacity(self.window.len());
        for &index in self.window.iter() {
            *counts.entry(index).or_default() += 1;
        }

        let mut winner: Option<(usize, usize)> = None;
        for &index in self.window.iter() {
            let count = counts[&index];
            match winner {
                Some((_, best)) if count <= best => (),
                _ => winner = Some((index, count)),
            }
        }

        winner.map(|(index, _)| index)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
