// crates/fondo_cli/src/args.rs
//
// Offline CLI argument surface.
// - Exactly one of: --manifest  XOR  (--dataset + (--formula XOR --preset))
// - No networked paths (anything with a scheme is rejected)
// - Formula overrides layer over the preset/file: budget, epsilon, bands,
//   weights, redistribution mode
// - --validate-only loads and checks inputs without computing

use std::path::{Path, PathBuf};

use clap::Parser;

use fondo_core::presets::PRESET_NAMES;
use fondo_core::RedistributionMode;
use fondo_io::looks_like_url_strict;
use fondo_pipeline::{Overrides, EPOCH_TIMESTAMP};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "fondo",
    version,
    disable_help_subcommand = true,
    about = "Index-based budget allocation: normalize, aggregate, shift, allocate within a prior-year band"
)]
pub struct Args {
    // --- Mode selection ---
    /// Manifest JSON naming the dataset and formula (mutually exclusive with --dataset/--formula/--preset).
    #[arg(long, conflicts_with_all = ["dataset", "formula", "preset"])]
    pub manifest: Option<PathBuf>,

    /// Dataset JSON: {"entities": [{"entity": ..., "values": {...}}]}.
    #[arg(long)]
    pub dataset: Option<PathBuf>,
    /// Formula JSON path (mutually exclusive with --preset).
    #[arg(long, conflicts_with = "preset")]
    pub formula: Option<PathBuf>,
    /// Built-in formula.
    #[arg(long, value_parser = PRESET_NAMES)]
    pub preset: Option<String>,

    // --- Overrides ---
    #[arg(long)]
    pub budget: Option<f64>,
    /// Shift applied to the composite index, in (0, 0.5).
    #[arg(long)]
    pub epsilon: Option<f64>,
    /// Allowed decrease below the prior-year allocation, as a fraction (0.1 = 10%).
    #[arg(long)]
    pub lower_band: Option<f64>,
    /// Allowed increase above the prior-year allocation, as a fraction.
    #[arg(long)]
    pub upper_band: Option<f64>,
    /// Indicator weight, `ID=VALUE`. Repeatable.
    #[arg(long = "weight", value_parser = parse_weight)]
    pub weights: Vec<(String, f64)>,
    /// Remainder redistribution: single-pass (default) or water-fill.
    #[arg(long, value_parser = parse_redistribution)]
    pub redistribution: Option<RedistributionMode>,

    // --- Output ---
    /// Output directory.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Also emit report.json.
    #[arg(long, value_parser = ["json"])]
    pub render: Option<String>,
    /// RFC3339 UTC timestamp recorded in the run record.
    #[arg(long, default_value = EPOCH_TIMESTAMP)]
    pub timestamp: String,

    // --- Control ---
    /// Validate inputs only; print the validation report and exit.
    #[arg(long)]
    pub validate_only: bool,
    /// Only log errors.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, PartialEq)]
pub enum CliError {
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

/// `ID=VALUE`; the id may itself contain spaces ("Gasto por Hab=0.4").
pub fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (id, value) = s.rsplit_once('=').ok_or_else(|| format!("expected ID=VALUE, got '{s}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err("empty indicator id".into());
    }
    let w: f64 = value.trim().parse().map_err(|_| format!("invalid weight '{value}'"))?;
    Ok((id.to_string(), w))
}

pub fn parse_redistribution(s: &str) -> Result<RedistributionMode, String> {
    s.parse::<RedistributionMode>().map_err(|e| e.to_string())
}

/// Path-like flags, for the scheme check.
fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.manifest.as_deref(),
        args.dataset.as_deref(),
        args.formula.as_deref(),
        Some(args.out.as_path()),
    ]
    .into_iter()
    .flatten()
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if looks_like_url_strict(s) => Err(CliError::NonLocalPath(s.to_string())),
        _ => Ok(()),
    }
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    match std::fs::metadata(p) {
        Ok(m) if m.is_file() => Ok(()),
        _ => Err(CliError::NotFound(format!("{label} {}", p.display()))),
    }
}

/// Mode and path checks that clap's declarative rules can't express.
pub fn validate(args: &Args) -> Result<(), CliError> {
    for p in iter_all_paths(args) {
        ensure_local_path(p)?;
    }
    if let Some(m) = &args.manifest {
        return ensure_local_exists(m, "--manifest");
    }
    let dataset = args.dataset.as_ref().ok_or(CliError::Missing("--dataset (or --manifest)"))?;
    ensure_local_exists(dataset, "--dataset")?;
    match (&args.formula, &args.preset) {
        (Some(f), None) => ensure_local_exists(f, "--formula"),
        (None, Some(_)) => Ok(()),
        _ => Err(CliError::Missing("--formula or --preset")),
    }
}

/// Entry point used by main.rs.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            budget: self.budget,
            epsilon: self.epsilon,
            lower_band: self.lower_band,
            upper_band: self.upper_band,
            weights: self.weights.iter().cloned().collect(),
            redistribution: self.redistribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("fondo").chain(argv.iter().copied()))
    }

    #[test]
    fn weight_pairs() {
        assert_eq!(parse_weight("Pob=0.125").unwrap(), ("Pob".to_string(), 0.125));
        assert_eq!(parse_weight("Gasto por Hab = 0.4").unwrap(), ("Gasto por Hab".to_string(), 0.4));
        assert!(parse_weight("Pob").is_err());
        assert!(parse_weight("=1").is_err());
        assert!(parse_weight("Pob=abc").is_err());
    }

    #[test]
    fn manifest_conflicts_with_explicit_inputs() {
        assert!(parse(&["--manifest", "m.json", "--dataset", "d.json"]).is_err());
        assert!(parse(&["--formula", "f.json", "--preset", "fasp"]).is_err());
        assert!(parse(&["--preset", "nope"]).is_err());
    }

    #[test]
    fn overrides_collect_flags() {
        let a = parse(&[
            "--dataset", "d.json", "--preset", "fasp",
            "--budget", "1000", "--weight", "Pob=0.2", "--weight", "Base=0",
            "--redistribution", "water-fill",
        ])
        .unwrap();
        let o = a.overrides();
        assert_eq!(o.budget, Some(1000.0));
        assert_eq!(o.weights.get("Pob"), Some(&0.2));
        assert_eq!(o.weights.len(), 2);
        assert_eq!(o.redistribution, Some(RedistributionMode::WaterFill));
        assert_eq!(a.timestamp, EPOCH_TIMESTAMP);
    }

    #[test]
    fn explicit_mode_needs_a_formula_and_local_paths() {
        let a = parse(&["--dataset", "Cargo.toml"]).unwrap();
        assert_eq!(validate(&a), Err(CliError::Missing("--formula or --preset")));
        let a = parse(&["--dataset", "https://example.org/d.json", "--preset", "demo"]).unwrap();
        assert!(matches!(validate(&a), Err(CliError::NonLocalPath(_))));
        let a = parse(&["--dataset", "does/not/exist.json", "--preset", "demo"]).unwrap();
        assert!(matches!(validate(&a), Err(CliError::NotFound(_))));
    }
}
