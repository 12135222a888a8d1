//! Batch evaluation of many independent fits.
//!
//! This is a CPU stand-in for the external dispatcher: it owns nothing but the
//! loop. Buffers are laid out fit by fit:
//!
//! - parameters: `n_fits × n_params`
//! - values: `n_fits × n_points`
//! - derivatives: `n_fits × n_params × n_points` (each fit parameter-major)
//!
//! Output buffers are split into per-fit regions before evaluation, so every fit
//! writes only to its own slots and fits run in parallel without locks.

use rayon::prelude::*;

use crate::domain::{GridShape, ModelKind};
use crate::error::AppError;
use crate::math::DerivativeView;
use crate::models::{PointContext, model_function};

/// Read-only inputs for one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchInput<'a> {
    pub kind: ModelKind,
    pub n_fits: usize,
    pub n_points: usize,
    pub chunk_index: usize,
    /// `n_fits × n_params` values, fit by fit.
    pub parameters: &'a [f32],
    pub user_info: &'a [u8],
    /// Skip the perfect-square check for 2D models.
    pub allow_non_square: bool,
}

impl<'a> BatchInput<'a> {
    /// Batch of `parameters.len() / n_params` fits with no user info.
    pub fn new(kind: ModelKind, n_points: usize, parameters: &'a [f32]) -> Self {
        Self {
            kind,
            n_fits: parameters.len() / kind.n_params().max(1),
            n_points,
            chunk_index: 0,
            parameters,
            user_info: &[],
            allow_non_square: false,
        }
    }

    pub fn fit_params(&self, fit_index: usize) -> &'a [f32] {
        let n_params = self.kind.n_params();
        &self.parameters[fit_index * n_params..(fit_index + 1) * n_params]
    }
}

/// Harness-owned output buffers for one batch.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub kind: ModelKind,
    pub n_fits: usize,
    pub n_points: usize,
    pub values: Vec<f32>,
    pub derivatives: Vec<f32>,
}

impl BatchOutput {
    /// Zeroed buffers sized for `n_fits` fits of `n_points` points.
    pub fn new(kind: ModelKind, n_fits: usize, n_points: usize) -> Result<Self, AppError> {
        let (n_values, n_derivatives) = buffer_lens(kind, n_fits, n_points)?;
        Ok(Self {
            kind,
            n_fits,
            n_points,
            values: vec![0.0; n_values],
            derivatives: vec![0.0; n_derivatives],
        })
    }

    /// Validate `input`, allocate outputs and evaluate every point of every fit.
    pub fn evaluate(input: &BatchInput<'_>) -> Result<Self, AppError> {
        validate_input(input)?;
        let mut out = Self::new(input.kind, input.n_fits, input.n_points)?;
        evaluate_batch(input, &mut out.values, &mut out.derivatives)?;
        Ok(out)
    }

    pub fn fit_values(&self, fit_index: usize) -> &[f32] {
        &self.values[fit_index * self.n_points..(fit_index + 1) * self.n_points]
    }

    pub fn fit_derivatives(&self, fit_index: usize) -> Result<DerivativeView<'_>, AppError> {
        let n_params = self.kind.n_params();
        let len = n_params * self.n_points;
        let region = self
            .derivatives
            .get(fit_index * len..(fit_index + 1) * len)
            .ok_or_else(|| AppError::invalid(format!("Fit index {fit_index} out of range.")))?;
        DerivativeView::new(region, n_params, self.n_points)
    }
}

/// Evaluate every point of every fit into caller-owned buffers.
pub fn evaluate_batch(
    input: &BatchInput<'_>,
    values: &mut [f32],
    derivatives: &mut [f32],
) -> Result<(), AppError> {
    let (expected_values, expected_derivatives) = validate_input(input)?;
    if values.len() != expected_values {
        return Err(AppError::invalid(format!(
            "Value buffer has {} slots, expected {expected_values}.",
            values.len()
        )));
    }
    if derivatives.len() != expected_derivatives {
        return Err(AppError::invalid(format!(
            "Derivative buffer has {} slots, expected {expected_derivatives}.",
            derivatives.len()
        )));
    }

    let kind = input.kind;
    let n_params = kind.n_params();
    let n_points = input.n_points;
    let model = model_function(kind);

    warn_on_degenerate_widths(input);
    tracing::debug!(
        model = ?kind,
        n_fits = input.n_fits,
        n_points,
        chunk_index = input.chunk_index,
        "evaluating batch"
    );

    values
        .par_chunks_mut(n_points)
        .zip(derivatives.par_chunks_mut(n_params * n_points))
        .zip(input.parameters.par_chunks(n_params))
        .enumerate()
        .for_each(|(fit_index, ((fit_values, fit_derivatives), fit_params))| {
            for point_index in 0..n_points {
                let ctx = PointContext {
                    n_fits: input.n_fits,
                    n_points,
                    point_index,
                    fit_index,
                    chunk_index: input.chunk_index,
                    user_info: input.user_info,
                };
                model.evaluate_point(fit_params, &ctx, fit_values, fit_derivatives);
            }
        });

    Ok(())
}

/// Checked `(values, derivatives)` buffer lengths for a batch.
fn buffer_lens(kind: ModelKind, n_fits: usize, n_points: usize) -> Result<(usize, usize), AppError> {
    let n_values = n_fits.checked_mul(n_points);
    let n_derivatives = n_values.and_then(|v| v.checked_mul(kind.n_params()));
    match (n_values, n_derivatives) {
        (Some(v), Some(d)) => Ok((v, d)),
        _ => Err(AppError::invalid(format!(
            "Batch of {n_fits} fits × {n_points} points × {} params overflows the address space.",
            kind.n_params()
        ))),
    }
}

/// Check everything but the output buffers; returns their expected lengths.
fn validate_input(input: &BatchInput<'_>) -> Result<(usize, usize), AppError> {
    let kind = input.kind;
    let n_params = kind.n_params();

    if input.n_fits == 0 {
        return Err(AppError::empty("No fits to evaluate."));
    }
    if input.n_points == 0 {
        return Err(AppError::empty("No points to evaluate."));
    }
    if kind.n_dimensions() == 2 && !input.allow_non_square {
        GridShape::square(input.n_points)?;
    }

    let expected_params = input.n_fits.checked_mul(n_params);
    if expected_params != Some(input.parameters.len()) {
        return Err(AppError::invalid(format!(
            "Parameter buffer has {} values, expected {} fits × {n_params} params.",
            input.parameters.len(),
            input.n_fits
        )));
    }
    let lens = buffer_lens(kind, input.n_fits, input.n_points)?;

    if input.user_info.len() % std::mem::size_of::<f32>() != 0 {
        return Err(AppError::invalid("User info must hold whole f32 values."));
    }
    let n_info = input.user_info.len() / std::mem::size_of::<f32>();
    if kind == ModelKind::Gauss1d && n_info > 0 {
        if n_info < input.n_points {
            return Err(AppError::invalid(format!(
                "User info holds {n_info} coordinates, fewer than the {} points per fit.",
                input.n_points
            )));
        }
        if n_info > input.n_points {
            let needed = (input.chunk_index + 1)
                .checked_mul(lens.0)
                .ok_or_else(|| AppError::invalid("Chunk index overflows the coordinate range."))?;
            if n_info < needed {
                return Err(AppError::invalid(format!(
                    "User info holds {n_info} coordinates, chunk {} needs {needed}.",
                    input.chunk_index
                )));
            }
        }
    }

    Ok(lens)
}

/// Zero or negative widths are a caller precondition; evaluation proceeds anyway.
fn warn_on_degenerate_widths(input: &BatchInput<'_>) {
    let n_params = input.kind.n_params();
    for (fit_index, params) in input.parameters.chunks(n_params).enumerate() {
        for &k in input.kind.width_indices() {
            let width = params[k];
            if !(width > 0.0) {
                tracing::warn!(
                    fit_index,
                    param = input.kind.param_names()[k],
                    width,
                    "non-positive width; outputs will be non-finite or meaningless"
                );
            }
        }
    }
}
