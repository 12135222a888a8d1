//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed by value into the per-point evaluators
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which model shape to evaluate.
///
/// Every kind is evaluated through the same per-point interface
/// (`models::ModelFunction`), so a fitting engine can hold them in one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ModelKind {
    /// 1D Gaussian: `[A, x0, σ, B]`.
    #[serde(rename = "gauss-1d")]
    #[value(name = "gauss-1d")]
    Gauss1d,
    /// Isotropic 2D Gaussian: `[A, x0, y0, σ, B]`.
    #[serde(rename = "gauss-2d")]
    #[value(name = "gauss-2d")]
    Gauss2d,
    /// Axis-aligned elliptic 2D Gaussian: `[A, x0, y0, σx, σy, B]`.
    #[serde(rename = "gauss-2d-elliptic")]
    #[value(name = "gauss-2d-elliptic")]
    Gauss2dElliptic,
    /// Rotated elliptic 2D Gaussian: `[A, x0, y0, σx, σy, B, θ]`.
    #[serde(rename = "gauss-2d-rotated")]
    #[value(name = "gauss-2d-rotated")]
    Gauss2dRotated,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Gauss1d,
        ModelKind::Gauss2d,
        ModelKind::Gauss2dElliptic,
        ModelKind::Gauss2dRotated,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Gauss1d => "Gaussian 1D",
            ModelKind::Gauss2d => "Gaussian 2D",
            ModelKind::Gauss2dElliptic => "Gaussian 2D (elliptic)",
            ModelKind::Gauss2dRotated => "Gaussian 2D (rotated)",
        }
    }

    /// Number of model parameters (length of one fit's parameter vector).
    pub fn n_params(self) -> usize {
        self.param_names().len()
    }

    /// Number of grid dimensions the point index is decoded into.
    pub fn n_dimensions(self) -> usize {
        match self {
            ModelKind::Gauss1d => 1,
            ModelKind::Gauss2d | ModelKind::Gauss2dElliptic | ModelKind::Gauss2dRotated => 2,
        }
    }

    /// Indices of the width (σ) parameters, which must be strictly positive.
    pub fn width_indices(self) -> &'static [usize] {
        match self {
            ModelKind::Gauss1d => &[2],
            ModelKind::Gauss2d => &[3],
            ModelKind::Gauss2dElliptic | ModelKind::Gauss2dRotated => &[3, 4],
        }
    }

    /// Index of the rotation angle, if the model has one.
    pub fn angle_index(self) -> Option<usize> {
        match self {
            ModelKind::Gauss2dRotated => Some(RotatedGaussianParams::ROTATION),
            _ => None,
        }
    }

    /// Parameter names in vector order. Derivative row `k` belongs to `param_names()[k]`.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Gauss1d => &["amplitude", "center_x", "width", "offset"],
            ModelKind::Gauss2d => &["amplitude", "center_x", "center_y", "width", "offset"],
            ModelKind::Gauss2dElliptic => &[
                "amplitude",
                "center_x",
                "center_y",
                "width_x",
                "width_y",
                "offset",
            ],
            ModelKind::Gauss2dRotated => &[
                "amplitude",
                "center_x",
                "center_y",
                "width_x",
                "width_y",
                "offset",
                "rotation",
            ],
        }
    }
}

/// Named view of the 7-element rotated-Gaussian parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedGaussianParams {
    pub amplitude: f32,
    pub center_x: f32,
    pub center_y: f32,
    /// Standard deviation along the ellipse's own x axis. Expected > 0.
    pub width_x: f32,
    /// Standard deviation along the ellipse's own y axis. Expected > 0.
    pub width_y: f32,
    pub offset: f32,
    /// Rotation of the principal axes relative to the grid, in radians.
    pub rotation: f32,
}

impl RotatedGaussianParams {
    pub const AMPLITUDE: usize = 0;
    pub const CENTER_X: usize = 1;
    pub const CENTER_Y: usize = 2;
    pub const WIDTH_X: usize = 3;
    pub const WIDTH_Y: usize = 4;
    pub const OFFSET: usize = 5;
    pub const ROTATION: usize = 6;
    pub const LEN: usize = 7;

    /// Read the first seven values of `params`.
    ///
    /// # Panics
    /// Panics if `params` has fewer than 7 elements.
    pub fn from_slice(params: &[f32]) -> Self {
        Self {
            amplitude: params[Self::AMPLITUDE],
            center_x: params[Self::CENTER_X],
            center_y: params[Self::CENTER_Y],
            width_x: params[Self::WIDTH_X],
            width_y: params[Self::WIDTH_Y],
            offset: params[Self::OFFSET],
            rotation: params[Self::ROTATION],
        }
    }

    pub fn to_array(self) -> [f32; 7] {
        [
            self.amplitude,
            self.center_x,
            self.center_y,
            self.width_x,
            self.width_y,
            self.offset,
            self.rotation,
        ]
    }
}

/// The square point grid implied by a fit's point count.
///
/// Points are not materialized: a linear `point_index` decodes to
/// `y = point_index / side`, `x = point_index - y * side`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub n_points: usize,
    pub side: usize,
}

impl GridShape {
    /// Grid with `side = floor(sqrt(n_points))`, without validation.
    ///
    /// If `n_points` is not a perfect square the trailing points decode to
    /// rows past `side - 1`; this is the evaluator's native behavior.
    pub fn implied(n_points: usize) -> Self {
        Self {
            n_points,
            side: n_points.isqrt(),
        }
    }

    /// Grid for `n_points`, rejecting empty or non-square counts.
    pub fn square(n_points: usize) -> Result<Self, AppError> {
        if n_points == 0 {
            return Err(AppError::empty("Point count must be > 0."));
        }
        let grid = Self::implied(n_points);
        if !grid.is_square() {
            return Err(AppError::invalid(format!(
                "Point count {n_points} is not a perfect square (nearest side {}).",
                grid.side
            )));
        }
        Ok(grid)
    }

    pub fn is_square(&self) -> bool {
        self.side * self.side == self.n_points
    }

    /// Decode a linear point index into integer `(x, y)` grid coordinates.
    ///
    /// # Panics
    /// Panics if `side == 0` (i.e. `n_points == 0`).
    pub fn coords(&self, point_index: usize) -> (usize, usize) {
        let y = point_index / self.side;
        let x = point_index - y * self.side;
        (x, y)
    }
}

/// Where the per-fit parameter vectors come from.
#[derive(Debug, Clone)]
pub enum ParamSource {
    /// A single fit given inline.
    Inline(Vec<f32>),
    /// A JSON array of parameter arrays, one per fit.
    File(PathBuf),
}

/// A full `eval` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub model: ModelKind,
    pub params: ParamSource,
    pub n_points: usize,
    /// Chunk selector forwarded to every point evaluation.
    pub chunk_index: usize,
    /// Optional per-point coordinates passed as the user-info blob.
    pub user_info_path: Option<PathBuf>,
    /// Skip the perfect-square check for 2D models.
    pub allow_non_square: bool,

    pub plot: bool,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

/// One fit's evaluated outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitEval {
    pub fit_index: usize,
    pub params: Vec<f32>,
    pub values: Vec<f32>,
    /// Parameter-major: `derivatives[k * n_points + point_index]`.
    pub derivatives: Vec<f32>,
}

/// A saved evaluation file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub model: ModelKind,
    pub grid: GridShape,
    #[serde(default)]
    pub chunk_index: usize,
    /// User-info coordinates the run was evaluated with (1D models).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coords: Vec<f32>,
    pub fits: Vec<FitEval>,
}

impl EvalFile {
    /// Coordinates of every point of one fit, as the model resolved them.
    pub fn fit_coords(&self, fit_index: usize) -> Vec<(f32, f32)> {
        let user_info = crate::models::user_info_from_coords(&self.coords);
        (0..self.grid.n_points)
            .map(|point_index| {
                let ctx = crate::models::PointContext {
                    n_fits: self.fits.len(),
                    n_points: self.grid.n_points,
                    point_index,
                    fit_index,
                    chunk_index: self.chunk_index,
                    user_info: &user_info,
                };
                crate::models::point_coordinates(self.model, &ctx)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_counts_match_names() {
        assert_eq!(ModelKind::Gauss1d.n_params(), 4);
        assert_eq!(ModelKind::Gauss2d.n_params(), 5);
        assert_eq!(ModelKind::Gauss2dElliptic.n_params(), 6);
        assert_eq!(ModelKind::Gauss2dRotated.n_params(), RotatedGaussianParams::LEN);
    }

    #[test]
    fn implied_grid_truncates_square_root() {
        assert_eq!(GridShape::implied(9).side, 3);
        assert_eq!(GridShape::implied(10).side, 3);
        assert_eq!(GridShape::implied(15).side, 3);
        assert_eq!(GridShape::implied(16).side, 4);
        assert!(!GridShape::implied(10).is_square());
    }

    #[test]
    fn square_grid_rejects_non_squares() {
        assert!(GridShape::square(25).is_ok());
        assert_eq!(GridShape::square(0).unwrap_err().exit_code(), 3);
        assert_eq!(GridShape::square(24).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn coords_decode_row_major() {
        let grid = GridShape::implied(9);
        assert_eq!(grid.coords(0), (0, 0));
        assert_eq!(grid.coords(4), (1, 1));
        assert_eq!(grid.coords(5), (2, 1));
        assert_eq!(grid.coords(8), (2, 2));

        // Non-square counts spill into an extra row.
        let grid = GridShape::implied(10);
        assert_eq!(grid.coords(9), (0, 3));
    }

    #[test]
    fn rotated_params_round_trip_slice() {
        let raw = [10.0, 1.0, 2.0, 1.5, 2.5, 0.5, 0.3];
        let p = RotatedGaussianParams::from_slice(&raw);
        assert_eq!(p.width_y, 2.5);
        assert_eq!(p.rotation, 0.3);
        assert_eq!(p.to_array(), raw);
    }
}
