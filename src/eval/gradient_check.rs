//! Finite-difference check of the analytic partial derivatives.
//!
//! For every point and parameter `k`:
//!
//! ```text
//! numeric  = (V(p + h·e_k) - V(p - h·e_k)) / 2h,   h = step_rel · max(|p_k|, 1)
//! analytic = derivative row k at the point
//! pass     ⇔ |numeric - analytic| ≤ tolerance · max(|numeric|, |analytic|) + abs_floor
//! ```
//!
//! Angles are periodic, so the rotation uses `h = step_rel` regardless of its
//! magnitude.
//!
//! Values are evaluated through the same model-function interface as the batch
//! loop, in `f32`: below a step of about `1e-3` rounding noise dominates the
//! difference quotient.

use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::eval::{BatchInput, BatchOutput};

/// Step and tolerance settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientCheckConfig {
    /// Step size relative to `max(|p_k|, 1)`.
    pub step_rel: f32,
    /// Relative tolerance.
    pub tolerance: f32,
    /// Absolute slack added to the relative bound (covers near-zero partials).
    pub abs_floor: f32,
}

impl Default for GradientCheckConfig {
    fn default() -> Self {
        Self {
            step_rel: 1e-2,
            tolerance: 1e-3,
            abs_floor: 2e-3,
        }
    }
}

/// Worst-case agreement for one parameter across all points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamCheck {
    pub name: String,
    pub max_abs_err: f32,
    pub max_rel_err: f32,
    /// Point with the largest absolute error.
    pub worst_point: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientReport {
    pub model: ModelKind,
    pub n_points: usize,
    pub params: Vec<ParamCheck>,
}

impl GradientReport {
    pub fn passed(&self) -> bool {
        self.params.iter().all(|p| p.failures == 0)
    }

    pub fn total_failures(&self) -> usize {
        self.params.iter().map(|p| p.failures).sum()
    }
}

/// Compare analytic and central-difference partials at every point of one fit.
pub fn check_gradients(
    kind: ModelKind,
    params: &[f32],
    n_points: usize,
    user_info: &[u8],
    config: &GradientCheckConfig,
) -> Result<GradientReport, AppError> {
    let n_params = kind.n_params();
    if params.len() != n_params {
        return Err(AppError::invalid(format!(
            "{} expects {n_params} parameters, got {}.",
            kind.display_name(),
            params.len()
        )));
    }
    if !(config.step_rel.is_finite() && config.step_rel > 0.0) {
        return Err(AppError::invalid("Gradient check step must be finite and > 0."));
    }
    if !(config.tolerance.is_finite() && config.tolerance >= 0.0 && config.abs_floor >= 0.0) {
        return Err(AppError::invalid("Gradient check tolerances must be finite and >= 0."));
    }

    let evaluate = |p: &[f32]| -> Result<BatchOutput, AppError> {
        let input = BatchInput {
            user_info,
            allow_non_square: true,
            ..BatchInput::new(kind, n_points, p)
        };
        BatchOutput::evaluate(&input)
    };

    let base = evaluate(params)?;
    let analytic = base.fit_derivatives(0)?;

    let mut checks = Vec::with_capacity(n_params);
    for (k, name) in kind.param_names().iter().enumerate() {
        let h = if kind.angle_index() == Some(k) {
            config.step_rel
        } else {
            config.step_rel * params[k].abs().max(1.0)
        };
        let mut plus = params.to_vec();
        let mut minus = params.to_vec();
        plus[k] += h;
        minus[k] -= h;
        // Divide by the representable step, not the requested one.
        let span = plus[k] - minus[k];

        let v_plus = evaluate(&plus)?.values;
        let v_minus = evaluate(&minus)?.values;

        let mut check = ParamCheck {
            name: (*name).to_string(),
            max_abs_err: 0.0,
            max_rel_err: 0.0,
            worst_point: 0,
            failures: 0,
        };
        for point in 0..analytic.n_points() {
            let numeric = (v_plus[point] - v_minus[point]) / span;
            let exact = analytic.get(k, point);
            let abs_err = (numeric - exact).abs();
            let scale = numeric.abs().max(exact.abs());
            let rel_err = if scale > 0.0 { abs_err / scale } else { 0.0 };

            if abs_err > check.max_abs_err || !abs_err.is_finite() {
                check.max_abs_err = abs_err;
                check.worst_point = point;
            }
            check.max_rel_err = check.max_rel_err.max(rel_err);
            if !(abs_err <= config.tolerance * scale + config.abs_floor) {
                check.failures += 1;
            }
        }
        tracing::debug!(
            param = name,
            max_abs_err = check.max_abs_err,
            failures = check.failures,
            "gradient check"
        );
        checks.push(check);
    }

    Ok(GradientReport {
        model: kind,
        n_points,
        params: checks,
    })
}
