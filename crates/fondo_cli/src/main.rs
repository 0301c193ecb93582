// crates/fondo_cli/src/main.rs
//
// Exit codes, error mapping, logging init, the validate-only short-circuit and
// the full run path (load → pipeline → canonical artifacts → optional report).

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    pub const VALIDATION: u8 = 2;
    pub const SELF_VERIFY: u8 = 3;
    pub const IO: u8 = 4;
    pub const COMPUTE: u8 = 5;
}

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fondo_io::canonical_json::write_canonical_file;
use fondo_io::loader;
use fondo_io::manifest::FormulaSource;
use fondo_pipeline::{run_with_ctx, validate_only, PipelineCtx, PipelineError, PipelineOutputs};

use args::{parse_and_validate, Args};

/// CLI-level error, one variant per exit code bucket.
#[derive(Debug)]
enum MainError {
    Validation(String),
    SelfVerify(String),
    Io(String),
    Compute(String),
}

impl fmt::Display for MainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::SelfVerify(m) => write!(f, "verify: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Compute(m) => write!(f, "compute: {m}"),
        }
    }
}

impl MainError {
    fn exit_code(&self) -> u8 {
        use exitcodes::*;
        match self {
            MainError::Validation(_) => VALIDATION,
            MainError::SelfVerify(_) => SELF_VERIFY,
            MainError::Io(_) => IO,
            MainError::Compute(_) => COMPUTE,
        }
    }
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        use PipelineError::*;
        let msg = e.to_string();
        match e {
            Validate(_) | MissingIndicator(_) => MainError::Validation(msg),
            Verify(_) => MainError::SelfVerify(msg),
            Io(_) => MainError::Io(msg),
            Normalize(_) | Aggregate(_) | Shift(_) | Allocate(_) | Build(_) => MainError::Compute(msg),
        }
    }
}

impl From<fondo_io::IoError> for MainError {
    fn from(e: fondo_io::IoError) -> Self {
        PipelineError::from(e).into()
    }
}

/// `FONDO_LOG` drives the filter (default `info`); `--quiet` pins it to `error`.
fn init_tracing(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("FONDO_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("fondo: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION);
        }
    };
    init_tracing(args.quiet);

    let outcome = if args.validate_only { run_validate_only(&args) } else { run_once(&args) };
    match outcome {
        Ok(()) => ExitCode::from(exitcodes::OK),
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Load inputs and layer the CLI overrides into a pipeline context.
fn load_ctx(args: &Args) -> Result<PipelineCtx, MainError> {
    let mut ctx = if let Some(manifest) = &args.manifest {
        let (loaded, resolved) = loader::load_all_from_manifest(manifest)?;
        PipelineCtx {
            expect: resolved.expect,
            ..PipelineCtx::new(loaded)
        }
    } else {
        let dataset = args.dataset.as_deref().ok_or_else(|| MainError::Validation("--dataset is required".into()))?;
        let source = match (&args.formula, &args.preset) {
            (Some(f), _) => FormulaSource::File(f.clone()),
            (None, Some(p)) => FormulaSource::Preset(p.clone()),
            (None, None) => return Err(MainError::Validation("--formula or --preset is required".into())),
        };
        PipelineCtx::new(loader::load_inputs(dataset, &source)?)
    };
    ctx.overrides = args.overrides();
    ctx.timestamp_utc = args.timestamp.clone();
    Ok(ctx)
}

/// Print the validation report to stdout; exit 2 when it doesn't pass.
fn run_validate_only(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let (formula, report) = validate_only(&ctx)?;

    for issue in &report.issues {
        warn!(code = issue.code, "{}", issue.message);
    }
    let out = serde_json::json!({ "formula": formula.name, "validation": report });
    println!("{}", serde_json::to_string_pretty(&out).map_err(|e| MainError::Io(e.to_string()))?);

    if report.pass {
        info!("validate-only: inputs OK");
        Ok(())
    } else {
        report.into_result().map_err(MainError::from)
    }
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let outs = run_with_ctx(ctx)?;

    write_artifacts(&args.out, &outs)?;
    if args.render.is_some() {
        render_report(&args.out, &outs)?;
    }

    info!(out = %args.out.display(), "artifacts written");
    if !args.quiet {
        println!("result: {}", outs.result.id);
        println!("run:    {}", outs.run_record.id);
    }
    Ok(())
}

fn to_value<T: serde::Serialize>(label: &str, v: &T) -> Result<Value, MainError> {
    serde_json::to_value(v).map_err(|e| MainError::Compute(format!("{label} to JSON: {e}")))
}

fn write_json(out_dir: &Path, name: &str, v: &Value) -> Result<(), MainError> {
    write_canonical_file(&out_dir.join(name), v).map_err(|e| MainError::Io(format!("write {name}: {e}")))
}

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;
    write_json(out_dir, "result.json", &to_value("result", &outs.result)?)?;
    write_json(out_dir, "run_record.json", &to_value("run_record", &outs.run_record)?)?;
    Ok(())
}

fn render_report(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    let result = to_value("result", &outs.result)?;
    let run = to_value("run_record", &outs.run_record)?;
    let model = fondo_report::build_model(&result, &run).map_err(|e| MainError::Compute(format!("report: {e}")))?;
    render_json_report(out_dir, &model)
}

#[cfg(feature = "report-json")]
fn render_json_report(out_dir: &Path, model: &fondo_report::ReportModel) -> Result<(), MainError> {
    let v = fondo_report::render_value(model).map_err(|e| MainError::Compute(format!("report: {e}")))?;
    write_json(out_dir, "report.json", &v)
}

#[cfg(not(feature = "report-json"))]
fn render_json_report(_out_dir: &Path, _model: &fondo_report::ReportModel) -> Result<(), MainError> {
    Err(MainError::Validation("json renderer not enabled (build with feature `report-json`)".into()))
}
