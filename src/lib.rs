//! `rotgauss` library crate.
//!
//! Point-wise Gaussian spot models with analytic partial derivatives, plus the
//! harness around them (batch evaluation, gradient checks, synthetic data).
//!
//! The binary (`rotgauss`) is a thin wrapper around this library so that:
//!
//! - the evaluators are testable without spawning processes
//! - an external fitting engine can link the models directly

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod eval;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
