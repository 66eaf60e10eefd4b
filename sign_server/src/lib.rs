//! Hand sign translation: landmark frames in, stabilized labels out.
//!
//! The core is a sliding window of per-frame feature vectors feeding a
//! classifier ([`aggregator`]) and a majority vote over its recent predictions
//! ([`stabilizer`]). [`session`] wires both around a model, and the remaining
//! modules serve sessions over the network.

pub mod aggregator;
pub mod config;
pub mod data_socket;
pub mod endpoints;
pub mod error;
pub mod features;
pub mod labels;
pub mod meter;
pub mod nn;
pub mod pubsub;
pub mod session;
pub mod stabilizer;

pub use error::SignError;
