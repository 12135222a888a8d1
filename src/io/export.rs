//! Export per-point results to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per (fit, point), with the coordinates the model was
//! evaluated at (grid position for 2D shapes, resolved x for 1D shapes).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::SpotSample;
use crate::domain::EvalFile;
use crate::error::AppError;

fn create(path: &Path, what: &str) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::invalid(format!("Failed to create {what} '{}': {e}", path.display())))
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::invalid(format!("Failed to write export CSV: {e}"))
}

/// Write values and partial derivatives, one row per (fit, point).
///
/// Header: `fit,point,x,y,value,d_<param>...`
pub fn write_points_csv(path: &Path, eval: &EvalFile) -> Result<(), AppError> {
    let mut out = create(path, "export CSV")?;

    let names = eval.model.param_names();
    let mut header = String::from("fit,point,x,y,value");
    for name in names {
        header.push_str(",d_");
        header.push_str(name);
    }
    writeln!(out, "{header}").map_err(write_err)?;

    let n_points = eval.grid.n_points;
    for fit in &eval.fits {
        for (point, (x, y)) in eval.fit_coords(fit.fit_index).into_iter().enumerate() {
            let mut row = format!("{},{point},{x},{y},{:.8e}", fit.fit_index, fit.values[point]);
            for k in 0..names.len() {
                row.push_str(&format!(",{:.8e}", fit.derivatives[k * n_points + point]));
            }
            writeln!(out, "{row}").map_err(write_err)?;
        }
    }

    out.flush().map_err(write_err)?;
    tracing::info!(path = %path.display(), "wrote point CSV");
    Ok(())
}

/// Write a synthetic sample: `point,x,y,model,observed`.
pub fn write_sample_csv(path: &Path, sample: &SpotSample) -> Result<(), AppError> {
    let mut out = create(path, "sample CSV")?;
    writeln!(out, "point,x,y,model,observed").map_err(write_err)?;

    let rows = sample.coords.iter().zip(sample.model.iter().zip(&sample.observed));
    for (point, ((x, y), (m, o))) in rows.enumerate() {
        writeln!(out, "{point},{x},{y},{m:.6},{o:.6}").map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    tracing::info!(path = %path.display(), "wrote sample CSV");
    Ok(())
}
