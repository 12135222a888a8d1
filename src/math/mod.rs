//! Numerical layout helpers: parameter-major derivative views and Jacobians.

pub mod jacobian;

pub use jacobian::*;
