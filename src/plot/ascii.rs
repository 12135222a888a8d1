//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (one character per point), optimized for:
//! - quick visual sanity checks of a spot's shape and orientation
//! - deterministic output (helpful for golden tests)
//!
//! 2D models render as a heatmap with row `y = 0` at the top. 1D models render
//! as a profile: model values `o` joined by a `-` line.

use crate::domain::{EvalFile, GridShape};
use crate::error::AppError;

/// Intensity ramp, darkest first.
pub const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Render one fit of a saved evaluation.
pub fn render_fit(eval: &EvalFile, fit_index: usize, height: usize) -> Result<String, AppError> {
    let fit = eval.fits.get(fit_index).ok_or_else(|| {
        AppError::invalid(format!(
            "Fit index {fit_index} out of range ({} fits).",
            eval.fits.len()
        ))
    })?;
    if eval.model.n_dimensions() == 1 {
        Ok(render_profile(&fit.values, height))
    } else {
        Ok(render_heatmap(&fit.values, eval.grid))
    }
}

/// Heatmap of `values` laid out on `grid`. Non-finite cells show as `?`.
pub fn render_heatmap(values: &[f32], grid: GridShape) -> String {
    let Some((v_min, v_max)) = value_range(values) else {
        return "Heatmap: no finite values\n".to_string();
    };
    let side = grid.side.max(1);
    let rows = values.len().div_ceil(side);

    let mut cells = vec![vec![' '; side]; rows];
    for (i, &v) in values.iter().enumerate() {
        let (x, y) = GridShape { side, ..grid }.coords(i);
        cells[y][x] = shade(v, v_min, v_max);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Heatmap: {side}x{rows} | value=[{v_min:.4}, {v_max:.4}]\n"
    ));
    for row in cells {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Profile plot of a 1D model: one column per point.
pub fn render_profile(values: &[f32], height: usize) -> String {
    let Some((v_min, v_max)) = value_range(values) else {
        return "Profile: no finite values\n".to_string();
    };
    let width = values.len();
    let height = height.max(2);
    let (lo, hi) = pad_range(f64::from(v_min), f64::from(v_max), 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let rows: Vec<Option<usize>> = values
        .iter()
        .map(|&v| v.is_finite().then(|| map_y(f64::from(v), lo, hi, height)))
        .collect();

    let mut prev = None;
    for (x, row) in rows.iter().enumerate() {
        if let (Some((x0, y0)), Some(y1)) = (prev, *row) {
            draw_line(&mut grid, x0, y0, x, y1, '-');
        }
        prev = row.map(|y| (x, y));
    }
    for (x, row) in rows.iter().enumerate() {
        if let Some(y) = row {
            grid[*y][x] = 'o';
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Profile: n_points={width} | value=[{v_min:.4}, {v_max:.4}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn value_range(values: &[f32]) -> Option<(f32, f32)> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    (min <= max).then_some((min, max))
}

fn shade(v: f32, min: f32, max: f32) -> char {
    if !v.is_finite() {
        return '?';
    }
    let span = f64::from(max) - f64::from(min);
    if span <= 0.0 {
        return RAMP[RAMP.len() - 1];
    }
    let u = ((f64::from(v) - f64::from(min)) / span).clamp(0.0, 1.0);
    RAMP[(u * (RAMP.len() - 1) as f64).round() as usize]
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish); only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
