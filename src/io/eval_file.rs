//! Read/write evaluation JSON files.
//!
//! An evaluation file is the portable record of one `eval` run:
//! - model kind + grid shape
//! - per-fit parameters, values and parameter-major derivatives
//! - generation timestamp
//!
//! The schema is defined by `domain::EvalFile`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crate::domain::{EvalFile, FitEval, GridShape};
use crate::error::AppError;
use crate::eval::{BatchInput, BatchOutput};
use crate::models::coords_from_user_info;

/// Assemble the serializable record of a batch run.
pub fn build_eval_file(input: &BatchInput<'_>, output: &BatchOutput) -> EvalFile {
    let n_params = input.kind.n_params();
    let deriv_len = n_params * output.n_points;
    let fits = (0..output.n_fits)
        .map(|f| FitEval {
            fit_index: f,
            params: input.fit_params(f).to_vec(),
            values: output.fit_values(f).to_vec(),
            derivatives: output.derivatives[f * deriv_len..(f + 1) * deriv_len].to_vec(),
        })
        .collect();

    EvalFile {
        tool: "rotgauss".to_string(),
        generated_at: Utc::now(),
        model: input.kind,
        grid: GridShape::implied(output.n_points),
        chunk_index: input.chunk_index,
        coords: if input.kind.n_dimensions() == 1 {
            coords_from_user_info(input.user_info)
        } else {
            Vec::new()
        },
        fits,
    }
}

/// Write an evaluation JSON file.
pub fn write_eval_json(path: &Path, file: &EvalFile) -> Result<(), AppError> {
    if file
        .fits
        .iter()
        .any(|f| f.values.iter().chain(&f.derivatives).any(|v| !v.is_finite()))
    {
        return Err(AppError::numeric(
            "Refusing to write evaluation JSON with non-finite values (JSON has no NaN/Inf).",
        ));
    }

    let out = File::create(path)
        .map_err(|e| AppError::invalid(format!("Failed to create evaluation JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut writer, file)
        .map_err(|e| AppError::invalid(format!("Failed to write evaluation JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::invalid(format!("Failed to write evaluation JSON: {e}")))?;

    tracing::info!(path = %path.display(), n_fits = file.fits.len(), "wrote evaluation JSON");
    Ok(())
}

/// Read an evaluation JSON file.
pub fn read_eval_json(path: &Path) -> Result<EvalFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid(format!("Failed to open evaluation JSON '{}': {e}", path.display())))?;
    let eval: EvalFile = serde_json::from_reader(file)
        .map_err(|e| AppError::invalid(format!("Invalid evaluation JSON: {e}")))?;

    let n_params = eval.model.n_params();
    for fit in &eval.fits {
        if fit.values.len() != eval.grid.n_points || fit.derivatives.len() != n_params * eval.grid.n_points {
            return Err(AppError::invalid(format!(
                "Evaluation JSON fit {} does not match its grid ({} points, {n_params} params).",
                fit.fit_index, eval.grid.n_points
            )));
        }
    }
    check_coords(&eval)?;
    Ok(eval)
}

/// Saved coordinates must cover every point the 1D model resolves.
fn check_coords(eval: &EvalFile) -> Result<(), AppError> {
    let (n_coords, n_points) = (eval.coords.len(), eval.grid.n_points);
    if eval.model.n_dimensions() != 1 || n_coords == 0 || n_coords == n_points {
        return Ok(());
    }
    let needed = (eval.chunk_index + 1)
        .checked_mul(eval.fits.len())
        .and_then(|n| n.checked_mul(n_points));
    if n_coords < n_points || needed.is_none_or(|n| n_coords < n) {
        return Err(AppError::invalid(format!(
            "Evaluation JSON holds {n_coords} coordinates, which do not cover its {} fits × {n_points} points.",
            eval.fits.len()
        )));
    }
    Ok(())
}

/// Read per-fit parameter vectors from a JSON array of arrays.
pub fn read_params_json(path: &Path) -> Result<Vec<Vec<f32>>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid(format!("Failed to open parameter file '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::invalid(format!("Invalid parameter file: {e}")))
}

/// Read a JSON array of coordinates to pass as user info.
pub fn read_coords_json(path: &Path) -> Result<Vec<f32>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid(format!("Failed to open coordinate file '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::invalid(format!("Invalid coordinate file: {e}")))
}
