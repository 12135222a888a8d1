//! Synthetic spot images generated from a model on its point grid.
//!
//! The model is evaluated at every grid point and perturbed with:
//!
//! - read noise: `Normal(0, noise_sigma)`
//! - shot noise (optional): `Normal(0, 1) · sqrt(max(v, 0)) · shot_scale`
//!
//! Output is deterministic for a given seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{GridShape, ModelKind};
use crate::error::AppError;
use crate::eval::{BatchInput, BatchOutput};
use crate::models::{PointContext, point_coordinates};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    pub noise_sigma: f64,
    pub shot_scale: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            noise_sigma: 0.0,
            shot_scale: 0.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleStats {
    pub n_points: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Root-mean-square of `observed - model`.
    pub noise_rms: f32,
}

#[derive(Debug, Clone)]
pub struct SpotSample {
    pub model_kind: ModelKind,
    pub grid: GridShape,
    pub params: Vec<f32>,
    /// `(x, y)` each point was evaluated at.
    pub coords: Vec<(f32, f32)>,
    /// Noise-free model values.
    pub model: Vec<f32>,
    pub observed: Vec<f32>,
    pub stats: SampleStats,
}

pub fn generate_spot(
    kind: ModelKind,
    params: &[f32],
    n_points: usize,
    user_info: &[u8],
    config: &SampleConfig,
) -> Result<SpotSample, AppError> {
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(AppError::invalid("Noise sigma must be finite and >= 0."));
    }
    if !(config.shot_scale.is_finite() && config.shot_scale >= 0.0) {
        return Err(AppError::invalid("Shot noise scale must be finite and >= 0."));
    }
    if params.len() != kind.n_params() {
        return Err(AppError::invalid(format!(
            "{} expects {} parameters, got {}.",
            kind.display_name(),
            kind.n_params(),
            params.len()
        )));
    }

    let input = BatchInput {
        user_info,
        ..BatchInput::new(kind, n_points, params)
    };
    let model = BatchOutput::evaluate(&input)?.values;
    let coords = (0..n_points)
        .map(|point_index| {
            let ctx = PointContext {
                user_info,
                ..PointContext::single(n_points, point_index)
            };
            point_coordinates(kind, &ctx)
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::numeric(format!("Noise distribution error: {e}")))?;

    let observed: Vec<f32> = model
        .iter()
        .map(|&v| {
            let read = config.noise_sigma * normal.sample(&mut rng);
            let shot = if config.shot_scale > 0.0 {
                f64::from(v).max(0.0).sqrt() * config.shot_scale * normal.sample(&mut rng)
            } else {
                0.0
            };
            (f64::from(v) + read + shot) as f32
        })
        .collect();

    let stats = compute_stats(&model, &observed)
        .ok_or_else(|| AppError::numeric("Synthetic sample contains non-finite values."))?;
    tracing::debug!(
        model = ?kind,
        n_points,
        seed = config.seed,
        noise_rms = stats.noise_rms,
        "generated synthetic spot"
    );

    Ok(SpotSample {
        model_kind: kind,
        grid: GridShape::implied(n_points),
        params: params.to_vec(),
        coords,
        model,
        observed,
        stats,
    })
}

fn compute_stats(model: &[f32], observed: &[f32]) -> Option<SampleStats> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0_f64;
    let mut sq = 0.0_f64;

    for (&m, &o) in model.iter().zip(observed) {
        min = min.min(o);
        max = max.max(o);
        sum += f64::from(o);
        let r = f64::from(o - m);
        sq += r * r;
    }

    let n = observed.len();
    if n == 0 || !(min.is_finite() && max.is_finite() && sum.is_finite()) {
        return None;
    }

    Some(SampleStats {
        n_points: n,
        min,
        max,
        mean: (sum / n as f64) as f32,
        noise_rms: (sq / n as f64).sqrt() as f32,
    })
}
