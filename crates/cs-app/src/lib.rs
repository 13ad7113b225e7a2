//! camscii application layer: command line, logging and render loop.

pub mod cli;
pub mod logging;
pub mod pipeline;

pub use pipeline::{IterationOutcome, LoopState, Pipeline, RunSummary, StopReason};
