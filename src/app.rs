//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments and sizes the worker pool
//! - runs evaluations, gradient checks and sample generation
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, Command, EvalArgs, PlotArgs, SampleArgs};
use crate::data::{SampleConfig, generate_spot};
use crate::domain::{EvalConfig, ParamSource};
use crate::error::AppError;
use crate::eval::{GradientCheckConfig, check_gradients};
use crate::io::{read_eval_json, write_eval_json, write_points_csv, write_sample_csv};

pub mod pipeline;

/// Entry point for the `rotgauss` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    configure_threads(cli.threads)?;

    match cli.command {
        Command::Eval(args) => handle_eval(args),
        Command::Check(args) => handle_check(args),
        Command::Sample(args) => handle_sample(args),
        Command::Plot(args) => handle_plot(args),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn configure_threads(threads: Option<usize>) -> Result<(), AppError> {
    let Some(n) = threads.filter(|&n| n > 0) else {
        return Ok(());
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global()
        .map_err(|e| AppError::invalid(format!("Failed to configure {n} worker threads: {e}")))?;
    tracing::debug!(threads = n, "configured worker pool");
    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let config = eval_config_from_args(&args);
    let run = pipeline::run_eval(&config)?;

    println!(
        "{}",
        crate::report::format_eval_summary(&run.eval, &run.summaries)
    );

    if config.plot {
        println!("{}", crate::plot::render_fit(&run.eval, 0, 12)?);
    }

    // Optional exports.
    if let Some(path) = &config.export_json {
        write_eval_json(path, &run.eval)?;
    }
    if let Some(path) = &config.export_csv {
        write_points_csv(path, &run.eval)?;
    }

    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let user_info = pipeline::load_user_info(args.model.coords.as_deref())?;
    let config = GradientCheckConfig {
        step_rel: args.step,
        tolerance: args.tolerance,
        abs_floor: args.abs_floor,
    };

    let report = check_gradients(
        args.model.model,
        &args.model.params,
        args.model.points,
        &user_info,
        &config,
    )?;
    print!("{}", crate::report::format_gradient_report(&report));

    if report.passed() {
        Ok(())
    } else {
        Err(AppError::numeric(format!(
            "Analytic partials disagree with finite differences at {} entries.",
            report.total_failures()
        )))
    }
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        noise_sigma: args.noise,
        shot_scale: args.shot_scale,
        seed: args.seed,
    };
    let user_info = pipeline::load_user_info(args.model.coords.as_deref())?;
    let sample = generate_spot(
        args.model.model,
        &args.model.params,
        args.model.points,
        &user_info,
        &config,
    )?;

    println!("{}", crate::report::format_sample_summary(&sample));

    if args.plot {
        let plot = if sample.model_kind.n_dimensions() == 1 {
            crate::plot::render_profile(&sample.observed, 12)
        } else {
            crate::plot::render_heatmap(&sample.observed, sample.grid)
        };
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        write_sample_csv(path, &sample)?;
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let eval = read_eval_json(&args.input)?;
    let plot = crate::plot::render_fit(&eval, args.fit, args.height)?;
    println!("{plot}");
    Ok(())
}

pub fn eval_config_from_args(args: &EvalArgs) -> EvalConfig {
    let params = match &args.params_file {
        Some(path) => ParamSource::File(path.clone()),
        None => ParamSource::Inline(args.params.clone()),
    };
    EvalConfig {
        model: args.model,
        params,
        n_points: args.points,
        chunk_index: args.chunk,
        user_info_path: args.coords.clone(),
        allow_non_square: args.allow_non_square,
        plot: args.plot,
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn eval_args_map_to_config() {
        let cli = Cli::try_parse_from([
            "rotgauss", "eval", "-m", "gauss-1d", "-p", "5,4,1.5,1", "-n", "16", "--chunk", "2",
            "--coords", "x.json", "--export-csv", "out.csv",
        ])
        .unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        let config = eval_config_from_args(&args);
        assert_eq!(config.n_points, 16);
        assert_eq!(config.chunk_index, 2);
        assert!(matches!(&config.params, ParamSource::Inline(p) if p.len() == 4));
        assert_eq!(config.user_info_path.as_deref(), Some(std::path::Path::new("x.json")));
        assert!(config.export_json.is_none());
    }

    #[test]
    fn sample_accepts_coordinate_file() {
        let cli = Cli::try_parse_from([
            "rotgauss", "sample", "-m", "gauss-1d", "-p", "5,20,3,0", "-n", "4", "--coords", "x.json",
        ])
        .unwrap();
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.model.coords.as_deref(), Some(std::path::Path::new("x.json")));
        assert_eq!(args.model.params, vec![5.0, 20.0, 3.0, 0.0]);
    }

    #[test]
    fn params_file_wins_over_empty_inline() {
        let cli = Cli::try_parse_from(["rotgauss", "eval", "--params-file", "fits.json", "-n", "9"]).unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert!(matches!(eval_config_from_args(&args).params, ParamSource::File(_)));
    }
}
