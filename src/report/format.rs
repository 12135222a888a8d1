//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the evaluation code stays clean and testable
//! - output changes are localized (see the snapshot-style tests below)

use crate::data::SpotSample;
use crate::domain::EvalFile;
use crate::eval::GradientReport;
use crate::report::FitSummary;

/// Format the `eval` run summary: model, grid and one line per fit.
pub fn format_eval_summary(eval: &EvalFile, summaries: &[FitSummary]) -> String {
    let mut out = String::new();

    out.push_str("=== rotgauss - model evaluation ===\n");
    out.push_str(&format!(
        "Model: {} ({} params)\n",
        eval.model.display_name(),
        eval.model.n_params()
    ));
    out.push_str(&format!(
        "Grid: n_points={} | side={}{}\n",
        eval.grid.n_points,
        eval.grid.side,
        if eval.grid.is_square() { "" } else { " (not square)" }
    ));
    out.push_str(&format!("Fits: {}\n", eval.fits.len()));

    out.push('\n');
    out.push_str(
        format!(
            "{:>5} {:>12} {:>9} {:>12} {:>12} {:>6} {:>12}\n",
            "fit", "peak", "at", "min", "mean", "rank", "cond"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:->5} {:->12} {:->9} {:->12} {:->12} {:->6} {:->12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for s in summaries {
        let (x, y) = eval
            .fit_coords(s.fit_index)
            .get(s.peak_point)
            .copied()
            .unwrap_or_default();
        let cond = match s.condition {
            Some(c) => format!("{c:.3e}"),
            None => "singular".to_string(),
        };
        out.push_str(&format!(
            "{:>5} {:>12.5} {:>9} {:>12.5} {:>12.5} {:>6} {:>12}\n",
            s.fit_index,
            s.peak,
            format!("({x},{y})"),
            s.min,
            s.mean,
            s.jacobian_rank,
            cond
        ));
    }

    for fit in &eval.fits {
        out.push_str(&format!("\nfit {} params:\n", fit.fit_index));
        for (name, v) in eval.model.param_names().iter().zip(&fit.params) {
            out.push_str(&format!("- {:<10} {}\n", truncate(name, 10), fmt_f32(*v)));
        }
    }

    out
}

/// Format a gradient check as a per-parameter table plus a verdict line.
pub fn format_gradient_report(report: &GradientReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Gradient check: {} | n_points={}\n",
        report.model.display_name(),
        report.n_points
    ));
    out.push_str(
        format!(
            "{:<10} {:>12} {:>12} {:>8} {:>8}\n",
            "param", "max_abs", "max_rel", "worst", "fails"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<12} {:-<12} {:-<8} {:-<8}\n",
            "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for p in &report.params {
        out.push_str(&format!(
            "{:<10} {:>12.3e} {:>12.3e} {:>8} {:>8}\n",
            truncate(&p.name, 10),
            p.max_abs_err,
            p.max_rel_err,
            p.worst_point,
            p.failures
        ));
    }

    if report.passed() {
        out.push_str("Result: PASS\n");
    } else {
        out.push_str(&format!("Result: FAIL ({} mismatches)\n", report.total_failures()));
    }

    out
}

/// Format the synthetic sample statistics.
pub fn format_sample_summary(sample: &SpotSample) -> String {
    let s = &sample.stats;
    let mut out = String::new();
    out.push_str(&format!(
        "Sample: {} | n_points={} | side={}\n",
        sample.model_kind.display_name(),
        s.n_points,
        sample.grid.side
    ));
    out.push_str(&format!("- params    : {}\n", fmt_vec(&sample.params)));
    out.push_str(&format!(
        "- observed  : min={:.4} max={:.4} mean={:.4}\n",
        s.min, s.max, s.mean
    ));
    out.push_str(&format!("- noise rms : {:.4}\n", s.noise_rms));
    out
}

fn fmt_f32(v: f32) -> String {
    format!("{v:.6}")
}

fn fmt_vec(v: &[f32]) -> String {
    let parts: Vec<String> = v.iter().map(|&x| fmt_f32(x)).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_spot};
    use crate::domain::ModelKind;
    use crate::eval::{GradientCheckConfig, ParamCheck, check_gradients};
    use crate::eval::{BatchInput, BatchOutput};
    use crate::io::build_eval_file;
    use crate::report::summarize_fits;

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("offset", 10), "offset");
        assert_eq!(truncate("amplitude_x", 6), "ampli.");
    }

    #[test]
    fn eval_summary_lists_each_fit() {
        let params = [
            10.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, //
            5.0, 0.5, 1.5, 1.2, 0.8, 1.0, 0.3,
        ];
        let input = BatchInput::new(ModelKind::Gauss2dRotated, 9, &params);
        let output = BatchOutput::evaluate(&input).unwrap();
        let eval = build_eval_file(&input, &output);
        let text = format_eval_summary(&eval, &summarize_fits(&eval).unwrap());

        assert!(text.contains("Model: Gaussian 2D (rotated) (7 params)"));
        assert!(text.contains("Grid: n_points=9 | side=3\n"));
        assert!(text.contains("Fits: 2"));
        assert!(text.contains("(1,1)"));
        assert!(text.contains("fit 1 params:"));
        assert!(text.contains("- rotation   0.300000"));
    }

    #[test]
    fn gradient_table_reports_verdict() {
        let report = check_gradients(
            ModelKind::Gauss2dElliptic,
            &[5.0, 2.2, 2.6, 1.6, 1.2, 1.0],
            25,
            &[],
            &GradientCheckConfig::default(),
        )
        .unwrap();
        let text = format_gradient_report(&report);
        assert!(text.ends_with("Result: PASS\n"));
        assert_eq!(text.lines().count(), 3 + 6 + 1);

        let mut failing = report.clone();
        failing.params[0] = ParamCheck {
            failures: 3,
            ..failing.params[0].clone()
        };
        assert!(format_gradient_report(&failing).ends_with("Result: FAIL (3 mismatches)\n"));
    }

    #[test]
    fn sample_summary_shows_stats() {
        let sample = generate_spot(
            ModelKind::Gauss2d,
            &[10.0, 1.0, 1.0, 1.0, 0.0],
            9,
            &[],
            &SampleConfig::default(),
        )
        .unwrap();
        let text = format_sample_summary(&sample);
        assert!(text.starts_with("Sample: Gaussian 2D | n_points=9 | side=3\n"));
        assert!(text.contains("max=10.0000"));
        assert!(text.contains("noise rms : 0.0000"));
    }
}
