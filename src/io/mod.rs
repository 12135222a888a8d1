//! Input/output helpers.
//!
//! - evaluation JSON read/write, parameter and coordinate files (`eval_file`)
//! - per-point CSV exports (`export`)

pub mod eval_file;
pub mod export;

pub use eval_file::*;
pub use export::*;
