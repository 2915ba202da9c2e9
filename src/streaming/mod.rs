//! Streaming Module
//!
//! Everything between the response body and the consumer:
//! - line reassembly over transport frames
//! - backend payload shapes and normalization into text deltas
//! - cumulative text accumulation
//! - the inference stream and its events

mod accumulator;
mod line_decoder;
mod normalizer;
mod payload;
mod types;

pub use accumulator::*;
pub use line_decoder::*;
pub use normalizer::*;
pub use payload::*;
pub use types::*;
