//! Reporting utilities: per-fit summaries and formatted terminal output.

use nalgebra::DMatrix;

use crate::domain::{EvalFile, FitEval};
use crate::error::AppError;
use crate::math::DerivativeView;

pub mod format;

pub use format::*;

/// Singular values below `max · RANK_TOL` count as zero.
const RANK_TOL: f64 = 1e-7;

/// Value range and Jacobian conditioning for one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub fit_index: usize,
    pub peak: f32,
    pub peak_point: usize,
    pub min: f32,
    /// Mean over the finite values.
    pub mean: f32,
    pub non_finite: usize,
    /// Numerical rank of the `n_points × n_params` Jacobian.
    pub jacobian_rank: usize,
    /// Ratio of largest to smallest singular value; `None` when rank deficient
    /// or when the Jacobian has non-finite entries.
    pub condition: Option<f64>,
}

/// Summarize every fit in an evaluation file.
pub fn summarize_fits(eval: &EvalFile) -> Result<Vec<FitSummary>, AppError> {
    eval.fits
        .iter()
        .map(|fit| summarize_fit(eval, fit))
        .collect()
}

fn summarize_fit(eval: &EvalFile, fit: &FitEval) -> Result<FitSummary, AppError> {
    if fit.values.is_empty() {
        return Err(AppError::empty(format!("Fit {} has no values.", fit.fit_index)));
    }

    let mut peak = f32::NEG_INFINITY;
    let mut peak_point = 0;
    let mut min = f32::INFINITY;
    let mut sum = 0.0_f64;
    let mut n_finite = 0_usize;
    for (i, &v) in fit.values.iter().enumerate().filter(|(_, v)| v.is_finite()) {
        if v > peak {
            peak = v;
            peak_point = i;
        }
        min = min.min(v);
        sum += f64::from(v);
        n_finite += 1;
    }
    if n_finite == 0 {
        return Err(AppError::numeric(format!(
            "Fit {} has no finite values.",
            fit.fit_index
        )));
    }
    let non_finite = fit.values.len() - n_finite;
    if non_finite > 0 {
        tracing::warn!(fit_index = fit.fit_index, non_finite, "fit has non-finite values");
    }

    let view = DerivativeView::new(&fit.derivatives, eval.model.n_params(), eval.grid.n_points)?;
    let (jacobian_rank, condition) = if fit.derivatives.iter().all(|d| d.is_finite()) {
        jacobian_conditioning(&view.to_jacobian())
    } else {
        (0, None)
    };

    Ok(FitSummary {
        fit_index: fit.fit_index,
        peak,
        peak_point,
        min,
        mean: (sum / n_finite as f64) as f32,
        non_finite,
        jacobian_rank,
        condition,
    })
}

/// Numerical rank and condition number from the singular values.
pub fn jacobian_conditioning(jacobian: &DMatrix<f64>) -> (usize, Option<f64>) {
    let sv = jacobian.singular_values();
    let max = sv.iter().copied().fold(0.0_f64, f64::max);
    if !(max.is_finite() && max > 0.0) {
        return (0, None);
    }
    let rank = sv.iter().filter(|&&s| s > max * RANK_TOL).count();
    let full = jacobian.nrows().min(jacobian.ncols());
    if rank < full {
        return (rank, None);
    }
    let min = sv.iter().copied().fold(f64::INFINITY, f64::min);
    (rank, Some(max / min))
}
