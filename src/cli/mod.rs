//! Command-line parsing for the Gaussian spot evaluator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the model/evaluation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rotgauss", version, about = "Rotated 2D Gaussian model evaluator")]
pub struct Cli {
    /// Worker threads for batch evaluation (0 = one per core).
    #[arg(long, global = true, env = "ROTGAUSS_THREADS")]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate values and partial derivatives for one or more fits.
    Eval(EvalArgs),
    /// Compare analytic partials with central finite differences.
    Check(CheckArgs),
    /// Generate a noisy synthetic spot from a model.
    Sample(SampleArgs),
    /// Plot a previously exported evaluation JSON.
    Plot(PlotArgs),
}

/// Model, parameters and grid shared by every evaluating command.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Model shape to evaluate.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::Gauss2dRotated)]
    pub model: ModelKind,

    /// Parameters of a single fit, comma-separated (e.g. `10,1,1,1,1,0,0`).
    #[arg(
        short = 'p',
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        required = true
    )]
    pub params: Vec<f32>,

    /// Number of grid points per fit (a perfect square for 2D models).
    #[arg(short = 'n', long)]
    pub points: usize,

    /// JSON array of per-point x coordinates passed to 1D models.
    #[arg(long, value_name = "JSON")]
    pub coords: Option<PathBuf>,
}

/// Options for `eval`.
#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    /// Model shape to evaluate.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::Gauss2dRotated)]
    pub model: ModelKind,

    /// Parameters of a single fit, comma-separated.
    #[arg(
        short = 'p',
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        required_unless_present = "params_file",
        conflicts_with = "params_file"
    )]
    pub params: Vec<f32>,

    /// JSON array of parameter arrays, one per fit.
    #[arg(long, value_name = "JSON")]
    pub params_file: Option<PathBuf>,

    /// Number of grid points per fit.
    #[arg(short = 'n', long)]
    pub points: usize,

    /// Chunk index forwarded to the model (selects per-fit 1D coordinates).
    #[arg(long, default_value_t = 0)]
    pub chunk: usize,

    /// JSON array of x coordinates passed to 1D models.
    #[arg(long, value_name = "JSON")]
    pub coords: Option<PathBuf>,

    /// Accept point counts that are not perfect squares.
    #[arg(long)]
    pub allow_non_square: bool,

    /// Render an ASCII heatmap of the first fit.
    #[arg(long)]
    pub plot: bool,

    /// Export the full evaluation to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export per-point values and partials to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

/// Options for `check`.
#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Finite-difference step relative to `max(|p|, 1)`.
    #[arg(long, default_value_t = 1e-2)]
    pub step: f32,

    /// Relative tolerance.
    #[arg(long, default_value_t = 1e-3)]
    pub tolerance: f32,

    /// Absolute slack added to the relative bound.
    #[arg(long, default_value_t = 2e-3)]
    pub abs_floor: f32,
}

/// Options for `sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Gaussian read-noise standard deviation.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Shot-noise scale (σ = scale · sqrt(value)); 0 disables it.
    #[arg(long, default_value_t = 0.0)]
    pub shot_scale: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Render an ASCII heatmap of the observed values.
    #[arg(long)]
    pub plot: bool,

    /// Export `point,x,y,model,observed` rows to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for plotting a saved evaluation.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Evaluation JSON produced by `rotgauss eval --export-json`.
    #[arg(long, value_name = "JSON")]
    pub input: PathBuf,

    /// Which fit to plot.
    #[arg(long, default_value_t = 0)]
    pub fit: usize,

    /// Plot height (rows) for 1D profiles.
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}
