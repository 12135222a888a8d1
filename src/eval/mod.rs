//! Evaluation orchestration around the point-wise models.
//!
//! Responsibilities:
//!
//! - evaluate batches of independent fits (parallel over fits)
//! - check analytic partials against central finite differences

pub mod batch;
pub mod gradient_check;

pub use batch::*;
pub use gradient_check::*;
