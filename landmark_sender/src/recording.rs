//! Recordings module.
//!
//! A recording holds the detector output of consecutive camera frames as JSON
//! lines. Each line is either `null` (no hand in that frame) or a list of
//! landmarks, written as `{"x": .., "y": .., "z": ..}` or as `[x, y, z]`.
use std::path::Path;

use common::protocol::Landmark;

use crate::Error;

/// Landmarks per detected hand.
const HAND_LANDMARKS: usize = 21;

/// Detector output of one frame, `None` if no hand was found.
pub type Frame = Option<Vec<Landmark>>;

/// Recorded landmark frames in capture order.
#[derive(Debug, Default, PartialEq)]
pub struct Recording {
    frames: Vec<Frame>,
}

impl Recording {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let recording = Self::parse(&content)?;

        log::info!(
            "Loaded {} frames ({} with a hand) from {}",
            recording.len(),
            recording.frames_with_hand(),
            path.display()
        );

        Ok(recording)
    }

    /// Parse JSON lines, skipping blank lines.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let mut frames = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let frame: Frame = serde_json::from_str(line)
                .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
            if let Some(landmarks) = &frame {
                if landmarks.len() != HAND_LANDMARKS {
                    log::warn!(
                        "line {}: {} landmarks instead of {}, the server will reject it",
                        line_no + 1,
                        landmarks.len(),
                        HAND_LANDMARKS
                    );
                }
            }
            frames.push(frame);
        }

        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames_with_hand(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_some()).count()
    }
}
