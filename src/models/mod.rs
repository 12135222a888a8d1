//! Point-wise model functions.
//!
//! Every model shape is a small, pure evaluator behind the same interface, so
//! the batch loop (and any external fitting engine) can dispatch on a
//! `ModelKind` tag without knowing the shape.

pub mod gauss;
pub mod gauss_2d_rotated;
pub mod model;

pub use gauss::*;
pub use gauss_2d_rotated::*;
pub use model::*;
