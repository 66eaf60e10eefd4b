//! Per-channel frame statistics.
//!
//! Every data connection records what became of each landmark frame. A logger
//! task periodically drains the counts and reports one line per active channel.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::{task::JoinHandle, time::interval};

use crate::error::SignError;

/// What a session made of one landmark frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No hand was detected in the frame
    NoHand,
    /// The frame was buffered without completing a window
    Buffered,
    /// The frame produced a label
    Labelled,
    /// The frame did not have the configured shape
    Rejected,
    /// The model failed on the window ending with this frame
    Failed,
}

impl FrameOutcome {
    /// Classify the result of `TranslationSession::process_landmarks`.
    pub fn classify(has_hand: bool, res: &Result<Option<&str>, SignError>) -> Self {
        match res {
            Ok(Some(_)) => FrameOutcome::Labelled,
            Ok(None) if has_hand => FrameOutcome::Buffered,
            Ok(None) => FrameOutcome::NoHand,
            Err(SignError::Inference(_)) => FrameOutcome::Failed,
            Err(SignError::InvalidInput { .. } | SignError::InvalidConfig(_)) => {
                FrameOutcome::Rejected
            }
        }
    }
}

/// Frame counts of one channel since the last drain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelCounts {
    pub frames: u64,
    pub no_hand: u64,
    pub labelled: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl ChannelCounts {
    fn record(&mut self, outcome: FrameOutcome) {
        self.frames += 1;
        match outcome {
            FrameOutcome::NoHand => self.no_hand += 1,
            FrameOutcome::Buffered => (),
            FrameOutcome::Labelled => self.labelled += 1,
            FrameOutcome::Rejected => self.rejected += 1,
            FrameOutcome::Failed => self.failed += 1,
        }
    }
}

/// Frame counts of all channels.
#[derive(Debug, Default)]
pub struct Meter {
    channels: Mutex<HashMap<String, ChannelCounts>>,
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, channel: &str, outcome: FrameOutcome) {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };
        match channels.get_mut(channel) {
            Some(counts) => counts.record(outcome),
            None => {
                let mut counts = ChannelCounts::default();
                counts.record(outcome);
                channels.insert(channel.to_owned(), counts);
            }
        }
    }

    /// Take the counts recorded so far, sorted by channel name.
    pub fn drain(&self) -> Vec<(String, ChannelCounts)> {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut drained: Vec<_> = channels.drain().collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));
        drained
    }
}

pub fn spawn_meter_logger(meter: Arc<Meter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut log_interval = interval(Duration::from_secs(2));
        log_interval.tick().await;

        loop {
            let start = Instant::now();
            log_interval.tick().await;

            let elapsed = start.elapsed().as_secs_f32();
            for (channel, counts) in meter.drain() {
                log::info!(
                    "{channel}: {:.2} frames/s, {:.2} labels/s, {} without hand, {} rejected, {} failed",
                    counts.frames as f32 / elapsed,
                    counts.labelled as f32 / elapsed,
                    counts.no_hand,
                    counts.rejected,
                    counts.failed,
                );
            }
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify_session_results() {
        assert_eq!(
            FrameOutcome::classify(true, &Ok(Some("A"))),
            FrameOutcome::Labelled
        );
        assert_eq!(FrameOutcome::classify(true, &Ok(None)), FrameOutcome::Buffered);
        assert_eq!(FrameOutcome::classify(false, &Ok(None)), FrameOutcome::NoHand);
        assert_eq!(
            FrameOutcome::classify(true, &Err(SignError::invalid_input("landmark list", 21, 3))),
            FrameOutcome::Rejected
        );
        assert_eq!(
            FrameOutcome::classify(true, &Err(anyhow::anyhow!("no interpreter").into())),
            FrameOutcome::Failed
        );
    }

    #[test]
    fn test_counts_per_channel_reset_on_drain() {
        let meter = Meter::new();
        meter.record("simon", FrameOutcome::Buffered);
        meter.record("simon", FrameOutcome::Labelled);
        meter.record("simon", FrameOutcome::Rejected);
        meter.record("alice", FrameOutcome::NoHand);

        let drained = meter.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(
            drained[0],
            (
                "alice".to_owned(),
                ChannelCounts {
                    frames: 1,
                    no_hand: 1,
                    ..Default::default()
                }
            )
        );
        assert_eq!(
            drained[1],
            (
                "simon".to_owned(),
                ChannelCounts {
                    frames: 3,
                    labelled: 1,
                    rejected: 1,
                    ..Default::default()
                }
            )
        );

        assert!(meter.drain().is_empty());
    }
}
