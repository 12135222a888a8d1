//! The shared model-function interface and dispatch by `ModelKind`.
//!
//! The per-call inputs are the same for every model shape:
//! - the fit's parameter vector (read-only)
//! - the fit count and per-fit point count
//! - this point's linear index
//! - fit and chunk selectors
//! - an opaque user-info blob
//!
//! A model writes exactly one value slot and one derivative slot per parameter,
//! and touches nothing else. Shapes that do not need some of the inputs simply
//! ignore them.

use crate::domain::{GridShape, ModelKind};
use crate::math::DerivativesMut;
use crate::models::{Gauss1D, Gauss2D, Gauss2DElliptic, RotatedGaussian2D};

/// Uniform per-point inputs of the model-function interface.
#[derive(Debug, Clone, Copy)]
pub struct PointContext<'a> {
    pub n_fits: usize,
    pub n_points: usize,
    pub point_index: usize,
    pub fit_index: usize,
    pub chunk_index: usize,
    /// Opaque per-run constants (e.g. fixed independent-variable coordinates).
    pub user_info: &'a [u8],
}

impl<'a> PointContext<'a> {
    /// Context for a single fit with no user info.
    pub fn single(n_points: usize, point_index: usize) -> Self {
        Self {
            n_fits: 1,
            n_points,
            point_index,
            fit_index: 0,
            chunk_index: 0,
            user_info: &[],
        }
    }
}

/// Model value and gradient at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointEval<const N: usize> {
    pub value: f32,
    /// Partials in parameter-vector order.
    pub gradient: [f32; N],
}

/// A model shape that can be evaluated one point at a time.
pub trait ModelFunction: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Evaluate the model at `ctx.point_index`.
    ///
    /// `values` is the fit's value region (indexed by point) and `derivatives` the
    /// fit's parameter-major derivative region (`k * n_points + point_index`).
    ///
    /// # Panics
    /// Panics if `params` is shorter than the model's parameter count, if the
    /// output slices are too small for `ctx.point_index`, or if `ctx.n_points == 0`
    /// for a 2D shape.
    fn evaluate_point(
        &self,
        params: &[f32],
        ctx: &PointContext<'_>,
        values: &mut [f32],
        derivatives: &mut [f32],
    );
}

/// Resolve the evaluator for a model tag.
pub fn model_function(kind: ModelKind) -> &'static dyn ModelFunction {
    match kind {
        ModelKind::Gauss1d => &Gauss1D,
        ModelKind::Gauss2d => &Gauss2D,
        ModelKind::Gauss2dElliptic => &Gauss2DElliptic,
        ModelKind::Gauss2dRotated => &RotatedGaussian2D,
    }
}

/// Evaluate one point of one fit for the given model kind.
pub fn evaluate_point(
    kind: ModelKind,
    params: &[f32],
    ctx: &PointContext<'_>,
    values: &mut [f32],
    derivatives: &mut [f32],
) {
    model_function(kind).evaluate_point(params, ctx, values, derivatives);
}

/// Coordinates a model evaluates `ctx.point_index` at.
///
/// 1D shapes report their resolved coordinate with `y = 0`; 2D shapes the
/// decoded grid position.
pub fn point_coordinates(kind: ModelKind, ctx: &PointContext<'_>) -> (f32, f32) {
    if kind.n_dimensions() == 1 {
        (Gauss1D::coordinate(ctx), 0.0)
    } else {
        let (x, y) = GridShape::implied(ctx.n_points).coords(ctx.point_index);
        (x as f32, y as f32)
    }
}

/// Place one point's value and gradient into the fit's output regions.
pub(crate) fn write_point<const N: usize>(
    eval: &PointEval<N>,
    ctx: &PointContext<'_>,
    values: &mut [f32],
    derivatives: &mut [f32],
) {
    values[ctx.point_index] = eval.value;
    DerivativesMut::unchecked(derivatives, N, ctx.n_points).set_point(ctx.point_index, &eval.gradient);
}

/// Encode coordinates as a user-info blob (native-endian `f32`s).
pub fn user_info_from_coords(coords: &[f32]) -> Vec<u8> {
    coords.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// Decode a user-info blob back into coordinates.
pub fn coords_from_user_info(user_info: &[u8]) -> Vec<f32> {
    (0..user_info_len(user_info))
        .map(|i| user_info_f32(user_info, i))
        .collect()
}

/// Number of `f32`s stored in a user-info blob.
pub(crate) fn user_info_len(user_info: &[u8]) -> usize {
    user_info.len() / std::mem::size_of::<f32>()
}

/// Read the `index`-th native-endian `f32` from a user-info blob.
pub(crate) fn user_info_f32(user_info: &[u8], index: usize) -> f32 {
    let start = index * std::mem::size_of::<f32>();
    let bytes = &user_info[start..start + 4];
    f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
