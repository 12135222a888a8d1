//! Synthetic observations for exercising the evaluators end to end.

pub mod sample;

pub use sample::*;
