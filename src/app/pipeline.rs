//! The `eval` command's pipeline:
//! load parameters -> load coordinates -> evaluate batch -> build the record
//!
//! `check` and `sample` reuse only the coordinate loader; the handlers focus on
//! presentation (printing vs exporting).

use std::path::Path;

use crate::domain::{EvalConfig, EvalFile, ParamSource};
use crate::error::AppError;
use crate::eval::{BatchInput, BatchOutput};
use crate::io::{build_eval_file, read_coords_json, read_params_json};
use crate::models::user_info_from_coords;
use crate::report::{FitSummary, summarize_fits};

/// All computed outputs of a single `rotgauss eval` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub eval: EvalFile,
    pub summaries: Vec<FitSummary>,
}

/// Load the flat `n_fits × n_params` parameter buffer.
pub fn load_parameters(config: &EvalConfig) -> Result<Vec<f32>, AppError> {
    let n_params = config.model.n_params();
    let fits = match &config.params {
        ParamSource::Inline(p) => vec![p.clone()],
        ParamSource::File(path) => read_params_json(path)?,
    };
    if fits.is_empty() {
        return Err(AppError::empty("Parameter source contains no fits."));
    }

    let mut flat = Vec::with_capacity(fits.len() * n_params);
    for (i, p) in fits.iter().enumerate() {
        if p.len() != n_params {
            return Err(AppError::invalid(format!(
                "Fit {i}: {} expects {n_params} parameters ({}), got {}.",
                config.model.display_name(),
                config.model.param_names().join(", "),
                p.len()
            )));
        }
        if p.iter().any(|v| !v.is_finite()) {
            return Err(AppError::invalid(format!("Fit {i}: parameters must be finite.")));
        }
        flat.extend_from_slice(p);
    }
    Ok(flat)
}

/// Load the optional coordinate file as a user-info blob.
pub fn load_user_info(path: Option<&Path>) -> Result<Vec<u8>, AppError> {
    match path {
        Some(path) => Ok(user_info_from_coords(&read_coords_json(path)?)),
        None => Ok(Vec::new()),
    }
}

/// Execute the evaluation pipeline and return the computed outputs.
pub fn run_eval(config: &EvalConfig) -> Result<RunOutput, AppError> {
    // 1) Inputs.
    let parameters = load_parameters(config)?;
    let user_info = load_user_info(config.user_info_path.as_deref())?;

    // 2) Evaluate all fits.
    let input = BatchInput {
        chunk_index: config.chunk_index,
        user_info: &user_info,
        allow_non_square: config.allow_non_square,
        ..BatchInput::new(config.model, config.n_points, &parameters)
    };
    let output = BatchOutput::evaluate(&input)?;

    // 3) Record + per-fit summaries.
    let eval = build_eval_file(&input, &output);
    let summaries = summarize_fits(&eval)?;
    tracing::info!(
        model = ?config.model,
        n_fits = eval.fits.len(),
        n_points = config.n_points,
        "evaluation complete"
    );

    Ok(RunOutput { eval, summaries })
}
