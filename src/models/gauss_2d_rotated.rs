//! Rotated elliptic 2D Gaussian.
//!
//! ```text
//! a = (x - x0)·cosθ - (y - y0)·sinθ
//! b = (x - x0)·sinθ + (y - y0)·cosθ
//! E = exp(-½·((a/σx)² + (b/σy)²))
//! V = A·E + B
//! ```
//!
//! Parameters: `[A, x0, y0, σx, σy, B, θ]`. `(x, y)` are the integer coordinates
//! of the point on the square grid implied by `n_points`.
//!
//! Partials (chain rule through the rotation, with `∂a/∂θ = -b`, `∂b/∂θ = a`):
//!
//! ```text
//! ∂V/∂A  = E
//! ∂V/∂x0 = (A·cosθ·a/σx² + A·sinθ·b/σy²)·E
//! ∂V/∂y0 = (-A·sinθ·a/σx² + A·cosθ·b/σy²)·E
//! ∂V/∂σx = A·a²/σx³·E
//! ∂V/∂σy = A·b²/σy³·E
//! ∂V/∂B  = 1
//! ∂V/∂θ  = A·a·b·(1/σx² - 1/σy²)·E
//! ```
//!
//! Widths must be strictly positive; zero or negative widths give non-finite or
//! meaningless output rather than an error.

use crate::domain::{GridShape, ModelKind, RotatedGaussianParams};
use crate::models::{ModelFunction, PointContext, PointEval, write_point};

#[derive(Debug, Clone, Copy, Default)]
pub struct RotatedGaussian2D;

impl RotatedGaussian2D {
    /// Value and gradient at grid coordinates `(x, y)`.
    pub fn evaluate_at(p: &RotatedGaussianParams, x: f32, y: f32) -> PointEval<7> {
        let (sin_t, cos_t) = p.rotation.sin_cos();

        let dx = x - p.center_x;
        let dy = y - p.center_y;
        let a = dx * cos_t - dy * sin_t;
        let b = dx * sin_t + dy * cos_t;

        let sx = p.width_x;
        let sy = p.width_y;
        let inv_sx2 = 1.0 / (sx * sx);
        let inv_sy2 = 1.0 / (sy * sy);

        let e = (-0.5 * (a * a * inv_sx2 + b * b * inv_sy2)).exp();
        let amp = p.amplitude;
        let amp_e = amp * e;

        PointEval {
            value: amp_e + p.offset,
            gradient: [
                e,
                (cos_t * a * inv_sx2 + sin_t * b * inv_sy2) * amp_e,
                (-sin_t * a * inv_sx2 + cos_t * b * inv_sy2) * amp_e,
                a * a / (sx * sx * sx) * amp_e,
                b * b / (sy * sy * sy) * amp_e,
                1.0,
                a * b * (inv_sx2 - inv_sy2) * amp_e,
            ],
        }
    }
}

impl ModelFunction for RotatedGaussian2D {
    fn kind(&self) -> ModelKind {
        ModelKind::Gauss2dRotated
    }

    fn evaluate_point(
        &self,
        params: &[f32],
        ctx: &PointContext<'_>,
        values: &mut [f32],
        derivatives: &mut [f32],
    ) {
        let (x, y) = GridShape::implied(ctx.n_points).coords(ctx.point_index);
        let p = RotatedGaussianParams::from_slice(params);
        let eval = Self::evaluate_at(&p, x as f32, y as f32);
        write_point(&eval, ctx, values, derivatives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(raw: [f32; 7]) -> RotatedGaussianParams {
        RotatedGaussianParams::from_slice(&raw)
    }

    fn eval_grid(raw: [f32; 7], n_points: usize) -> (Vec<f32>, Vec<f32>) {
        let mut values = vec![0.0; n_points];
        let mut derivs = vec![0.0; 7 * n_points];
        for i in 0..n_points {
            let ctx = PointContext::single(n_points, i);
            RotatedGaussian2D.evaluate_point(&raw, &ctx, &mut values, &mut derivs);
        }
        (values, derivs)
    }

    #[test]
    fn three_by_three_scenario() {
        let (values, derivs) = eval_grid([10.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0], 9);

        assert!((values[4] - 10.0).abs() < 1e-6, "center value {}", values[4]);

        let expected = 10.0 * (-1.0_f32).exp();
        assert!((values[0] - expected).abs() < 1e-5, "corner value {}", values[0]);
        assert!((values[0] - 3.6788).abs() < 1e-3);

        // Center: a = b = 0 so position and rotation partials vanish.
        assert_eq!(derivs[9 + 4], 0.0);
        assert_eq!(derivs[2 * 9 + 4], 0.0);
        assert_eq!(derivs[6 * 9 + 4], 0.0);
        assert_eq!(derivs[4], 1.0);
    }

    #[test]
    fn isotropic_center_gives_amplitude_plus_offset() {
        let p = params([3.5, 2.0, 3.0, 1.7, 1.7, 0.25, 0.0]);
        let eval = RotatedGaussian2D::evaluate_at(&p, 2.0, 3.0);
        assert!((eval.value - 3.75).abs() < 1e-6);
        assert_eq!(eval.gradient[RotatedGaussianParams::CENTER_X], 0.0);
        assert_eq!(eval.gradient[RotatedGaussianParams::CENTER_Y], 0.0);
        assert_eq!(eval.gradient[RotatedGaussianParams::ROTATION], 0.0);
    }

    #[test]
    fn offset_partial_is_exactly_one() {
        let (_, derivs) = eval_grid([4.0, 2.3, 1.1, 0.9, 2.2, -3.0, 1.3], 25);
        let offset_row = &derivs[5 * 25..6 * 25];
        assert!(offset_row.iter().all(|&d| d == 1.0));
    }

    #[test]
    fn rotating_by_pi_is_invariant() {
        let base = params([6.0, 2.2, 1.8, 1.4, 0.7, 0.5, 0.35]);
        let flipped = RotatedGaussianParams {
            rotation: base.rotation + std::f32::consts::PI,
            ..base
        };
        for y in 0..5 {
            for x in 0..5 {
                let e0 = RotatedGaussian2D::evaluate_at(&base, x as f32, y as f32);
                let e1 = RotatedGaussian2D::evaluate_at(&flipped, x as f32, y as f32);
                assert!((e0.value - e1.value).abs() < 1e-5);
                let d0 = e0.gradient[RotatedGaussianParams::ROTATION];
                let d1 = e1.gradient[RotatedGaussianParams::ROTATION];
                assert!((d0 - d1).abs() < 1e-4, "dθ at ({x},{y}): {d0} vs {d1}");
            }
        }
    }

    #[test]
    fn zero_rotation_matches_axis_aligned_form() {
        let p = params([5.0, 1.2, 2.6, 1.5, 0.8, 0.3, 0.0]);
        let (x, y) = (3.0_f32, 1.0_f32);
        let eval = RotatedGaussian2D::evaluate_at(&p, x, y);
        let dx = x - p.center_x;
        let dy = y - p.center_y;
        let e = (-0.5 * (dx * dx / (p.width_x * p.width_x) + dy * dy / (p.width_y * p.width_y))).exp();
        assert!((eval.value - (p.amplitude * e + p.offset)).abs() < 1e-6);
        assert!((eval.gradient[0] - e).abs() < 1e-7);
    }

    fn value_f64(p: &[f64; 7], x: f64, y: f64) -> f64 {
        let [amp, x0, y0, sx, sy, offset, theta] = *p;
        let (sin_t, cos_t) = theta.sin_cos();
        let (dx, dy) = (x - x0, y - y0);
        let a = dx * cos_t - dy * sin_t;
        let b = dx * sin_t + dy * cos_t;
        amp * (-0.5 * ((a / sx).powi(2) + (b / sy).powi(2))).exp() + offset
    }

    #[test]
    fn partials_match_double_precision_central_differences() {
        // h = 1e-3 (relative, absolute for θ), tolerance 1e-3 relative.
        let cases = [
            [8.0, 3.2, 2.7, 1.8, 1.1, 0.4, 0.6],
            [5.0, 2.5, 3.5, 2.2, 1.2, 1.0, -1.1],
            [10.0, 3.0, 3.0, 1.0, 2.5, 0.0, 2.7],
            [6.0, 2.2, 1.8, 1.4, 0.7, 0.5, 0.35],
        ];
        for raw in cases {
            let p = params(raw);
            let reference = raw.map(f64::from);
            for y in 0..7 {
                for x in 0..7 {
                    let eval = RotatedGaussian2D::evaluate_at(&p, x as f32, y as f32);
                    for k in 0..RotatedGaussianParams::LEN {
                        let h = if k == RotatedGaussianParams::ROTATION {
                            1e-3
                        } else {
                            1e-3 * reference[k].abs().max(1.0)
                        };
                        let (mut plus, mut minus) = (reference, reference);
                        plus[k] += h;
                        minus[k] -= h;
                        let numeric =
                            (value_f64(&plus, x as f64, y as f64) - value_f64(&minus, x as f64, y as f64)) / (2.0 * h);
                        let analytic = f64::from(eval.gradient[k]);
                        let bound = 1e-3 * numeric.abs().max(analytic.abs()) + 1e-5;
                        assert!(
                            (numeric - analytic).abs() <= bound,
                            "{raw:?} param {k} at ({x},{y}): numeric {numeric} vs analytic {analytic}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn zero_width_is_not_finite() {
        let p = params([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let eval = RotatedGaussian2D::evaluate_at(&p, 1.0, 0.0);
        assert!(!eval.gradient[RotatedGaussianParams::WIDTH_X].is_finite());
    }
}
