//! Sibling Gaussian shapes sharing the model-function interface.
//!
//! - `Gauss1D`: `[A, x0, σ, B]`, coordinate from user info or the point index
//! - `Gauss2D`: `[A, x0, y0, σ, B]`, isotropic
//! - `Gauss2DElliptic`: `[A, x0, y0, σx, σy, B]`, axis-aligned

use crate::domain::{GridShape, ModelKind};
use crate::models::{ModelFunction, PointContext, PointEval, user_info_f32, user_info_len, write_point};

#[derive(Debug, Clone, Copy, Default)]
pub struct Gauss1D;

#[derive(Debug, Clone, Copy, Default)]
pub struct Gauss2D;

#[derive(Debug, Clone, Copy, Default)]
pub struct Gauss2DElliptic;

impl Gauss1D {
    pub fn evaluate_at(params: &[f32], x: f32) -> PointEval<4> {
        let [amp, x0, sigma, offset] = [params[0], params[1], params[2], params[3]];
        let dx = x - x0;
        let inv_s2 = 1.0 / (sigma * sigma);
        let e = (-0.5 * dx * dx * inv_s2).exp();
        let amp_e = amp * e;
        PointEval {
            value: amp_e + offset,
            gradient: [e, amp_e * dx * inv_s2, amp_e * dx * dx * inv_s2 / sigma, 1.0],
        }
    }

    /// Independent-variable coordinate for this point.
    ///
    /// - user info holding exactly `n_points` values: one shared coordinate set
    /// - user info holding more: per-fit sets, laid out chunk by chunk
    /// - otherwise: the point index itself
    pub fn coordinate(ctx: &PointContext<'_>) -> f32 {
        let n_values = user_info_len(ctx.user_info);
        if n_values == ctx.n_points && n_values > 0 {
            user_info_f32(ctx.user_info, ctx.point_index)
        } else if n_values > ctx.n_points {
            let chunk_begin = ctx.chunk_index * ctx.n_fits * ctx.n_points;
            let fit_begin = ctx.fit_index * ctx.n_points;
            user_info_f32(ctx.user_info, chunk_begin + fit_begin + ctx.point_index)
        } else {
            ctx.point_index as f32
        }
    }
}

impl ModelFunction for Gauss1D {
    fn kind(&self) -> ModelKind {
        ModelKind::Gauss1d
    }

    fn evaluate_point(
        &self,
        params: &[f32],
        ctx: &PointContext<'_>,
        values: &mut [f32],
        derivatives: &mut [f32],
    ) {
        let eval = Self::evaluate_at(params, Self::coordinate(ctx));
        write_point(&eval, ctx, values, derivatives);
    }
}

impl Gauss2D {
    pub fn evaluate_at(params: &[f32], x: f32, y: f32) -> PointEval<5> {
        let [amp, x0, y0, sigma, offset] = [params[0], params[1], params[2], params[3], params[4]];
        let dx = x - x0;
        let dy = y - y0;
        let r2 = dx * dx + dy * dy;
        let inv_s2 = 1.0 / (sigma * sigma);
        let e = (-0.5 * r2 * inv_s2).exp();
        let amp_e = amp * e;
        PointEval {
            value: amp_e + offset,
            gradient: [
                e,
                amp_e * dx * inv_s2,
                amp_e * dy * inv_s2,
                amp_e * r2 * inv_s2 / sigma,
                1.0,
            ],
        }
    }
}

impl ModelFunction for Gauss2D {
    fn kind(&self) -> ModelKind {
        ModelKind::Gauss2d
    }

    fn evaluate_point(
        &self,
        params: &[f32],
        ctx: &PointContext<'_>,
        values: &mut [f32],
        derivatives: &mut [f32],
    ) {
        let (x, y) = GridShape::implied(ctx.n_points).coords(ctx.point_index);
        let eval = Self::evaluate_at(params, x as f32, y as f32);
        write_point(&eval, ctx, values, derivatives);
    }
}

impl Gauss2DElliptic {
    pub fn evaluate_at(params: &[f32], x: f32, y: f32) -> PointEval<6> {
        let [amp, x0, y0, sx, sy, offset] =
            [params[0], params[1], params[2], params[3], params[4], params[5]];
        let dx = x - x0;
        let dy = y - y0;
        let inv_sx2 = 1.0 / (sx * sx);
        let inv_sy2 = 1.0 / (sy * sy);
        let e = (-0.5 * (dx * dx * inv_sx2 + dy * dy * inv_sy2)).exp();
        let amp_e = amp * e;
        PointEval {
            value: amp_e + offset,
            gradient: [
                e,
                amp_e * dx * inv_sx2,
                amp_e * dy * inv_sy2,
                amp_e * dx * dx * inv_sx2 / sx,
                amp_e * dy * dy * inv_sy2 / sy,
                1.0,
            ],
        }
    }
}

impl ModelFunction for Gauss2DElliptic {
    fn kind(&self) -> ModelKind {
        ModelKind::Gauss2dElliptic
    }

    fn evaluate_point(
        &self,
        params: &[f32],
        ctx: &PointContext<'_>,
        values: &mut [f32],
        derivatives: &mut [f32],
    ) {
        let (x, y) = GridShape::implied(ctx.n_points).coords(ctx.point_index);
        let eval = Self::evaluate_at(params, x as f32, y as f32);
        write_point(&eval, ctx, values, derivatives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RotatedGaussianParams;
    use crate::models::{RotatedGaussian2D, user_info_from_coords};

    #[test]
    fn elliptic_agrees_with_rotated_at_zero_angle() {
        let raw = [7.0, 1.4, 2.1, 1.3, 0.9, 0.2];
        let rotated = RotatedGaussianParams::from_slice(&[raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], 0.0]);
        for y in 0..4 {
            for x in 0..4 {
                let e = Gauss2DElliptic::evaluate_at(&raw, x as f32, y as f32);
                let r = RotatedGaussian2D::evaluate_at(&rotated, x as f32, y as f32);
                assert!((e.value - r.value).abs() < 1e-5);
                for k in 0..6 {
                    assert!(
                        (e.gradient[k] - r.gradient[k]).abs() < 1e-5,
                        "param {k} at ({x},{y}): {} vs {}",
                        e.gradient[k],
                        r.gradient[k]
                    );
                }
            }
        }
    }

    #[test]
    fn isotropic_agrees_with_elliptic_value() {
        let iso = [3.0, 2.0, 2.0, 1.5, 0.5];
        let ell = [3.0, 2.0, 2.0, 1.5, 1.5, 0.5];
        let a = Gauss2D::evaluate_at(&iso, 0.0, 3.0);
        let b = Gauss2DElliptic::evaluate_at(&ell, 0.0, 3.0);
        assert!((a.value - b.value).abs() < 1e-6);
        // dσ for the isotropic shape is the sum of both elliptic width partials.
        assert!((a.gradient[3] - (b.gradient[3] + b.gradient[4])).abs() < 1e-5);
    }

    #[test]
    fn gauss_1d_peak_and_offset() {
        let eval = Gauss1D::evaluate_at(&[4.0, 3.0, 1.0, 0.5], 3.0);
        assert!((eval.value - 4.5).abs() < 1e-6);
        assert_eq!(eval.gradient[1], 0.0);
        assert_eq!(eval.gradient[3], 1.0);
    }

    #[test]
    fn gauss_1d_coordinate_sources() {
        // No user info: the point index is the coordinate.
        let ctx = PointContext::single(4, 2);
        assert_eq!(Gauss1D::coordinate(&ctx), 2.0);

        // Shared coordinates.
        let shared = user_info_from_coords(&[0.0, 0.5, 1.0, 1.5]);
        let ctx = PointContext {
            user_info: &shared,
            ..PointContext::single(4, 3)
        };
        assert_eq!(Gauss1D::coordinate(&ctx), 1.5);

        // Per-fit coordinates, two fits × two chunks.
        let coords: Vec<f32> = (0..16).map(|v| v as f32 * 10.0).collect();
        let per_fit = user_info_from_coords(&coords);
        let ctx = PointContext {
            n_fits: 2,
            n_points: 4,
            point_index: 1,
            fit_index: 1,
            chunk_index: 1,
            user_info: &per_fit,
        };
        // chunk 1 starts at 8, fit 1 at +4, point 1 at +1.
        assert_eq!(Gauss1D::coordinate(&ctx), 130.0);
    }
}
