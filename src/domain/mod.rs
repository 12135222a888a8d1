//! Domain types shared by the evaluator, the batch harness and the CLI.
//!
//! This module defines:
//!
//! - the model tag (`ModelKind`) and the named rotated-Gaussian parameters
//! - the implicit square point grid (`GridShape`)
//! - run configuration (`EvalConfig`) and the exported evaluation file

pub mod types;

pub use types::*;
