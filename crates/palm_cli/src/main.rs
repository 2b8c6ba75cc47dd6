//! Palm forest collapse simulator CLI
//!
//! Runs the rodent-only and rodent-and-human scenarios and prints the results
//! as JSON on stdout. Logs go to stderr.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use palm_core::comparison::{first_crossing_below, ThresholdCrossing, DEFAULT_THRESHOLDS};
use palm_core::seasonal::{senescence_onset, SeasonalProfile};
use palm_core::simulation::DEFAULT_TOLERANCE;
use palm_core::{
    simulate, ComparisonStatistics, IntegratorKind, ScenarioComparison, ScenarioSummary,
    Trajectory,
};
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::RunConfig;

/// Seasonal windows reported for every run: the first two decades after
/// landfall and the century of fastest decline.
const EARLY_WINDOW: (f64, f64) = (0.0, 20.0);
const LATE_WINDOW: (f64, f64) = (200.0, 300.0);

const DEFAULT_RK4_SUBSTEPS: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Rodent-only and rodent-and-human runs side by side
    Compare,
    /// A single run
    Single,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Method {
    Tsit5,
    Rk4,
}

#[derive(Parser, Debug)]
#[command(name = "palm-sim")]
#[command(about = "Simulate palm forest collapse under invasive rodents and human settlement", long_about = None)]
struct Args {
    /// JSON file with params, initial_state and settings sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "compare")]
    mode: Mode,

    /// Simulated years after landfall
    #[arg(short, long)]
    years: Option<f64>,

    /// Output samples per simulated year
    #[arg(long)]
    samples_per_year: Option<usize>,

    #[arg(long, value_enum)]
    integrator: Option<Method>,

    /// Relative tolerance (tsit5)
    #[arg(long)]
    rtol: Option<f64>,

    /// Absolute tolerance (tsit5)
    #[arg(long)]
    atol: Option<f64>,

    /// Substeps per output interval (rk4, default 2)
    #[arg(long, conflicts_with_all = ["rtol", "atol"])]
    substeps: Option<usize>,

    /// Disable human disturbance in single mode
    #[arg(long)]
    rodents_only: bool,

    /// Include full trajectories in the output
    #[arg(short, long)]
    trajectories: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        apply_overrides(self, &mut config)?;
        Ok(config)
    }
}

/// Command-line flags take precedence over the config file. Integrator
/// flags must match the integrator they end up configuring.
fn apply_overrides(args: &Args, config: &mut RunConfig) -> Result<()> {
    let settings = &mut config.settings;
    if let Some(years) = args.years {
        settings.horizon_years = years;
    }
    if let Some(samples) = args.samples_per_year {
        settings.samples_per_year = samples;
    }

    let method = args.integrator.unwrap_or(match settings.integrator {
        IntegratorKind::Tsit5 { .. } => Method::Tsit5,
        IntegratorKind::Rk4 { .. } => Method::Rk4,
    });
    settings.integrator = match (method, settings.integrator) {
        (Method::Rk4, current) => {
            if args.rtol.is_some() || args.atol.is_some() {
                bail!("--rtol and --atol only apply to the tsit5 integrator");
            }
            let configured = match current {
                IntegratorKind::Rk4 { substeps } => substeps,
                IntegratorKind::Tsit5 { .. } => DEFAULT_RK4_SUBSTEPS,
            };
            IntegratorKind::Rk4 {
                substeps: args.substeps.unwrap_or(configured),
            }
        }
        (Method::Tsit5, current) => {
            if args.substeps.is_some() {
                bail!("--substeps only applies to the rk4 integrator");
            }
            let (rtol, atol) = match current {
                IntegratorKind::Tsit5 { rtol, atol } => (rtol, atol),
                IntegratorKind::Rk4 { .. } => (DEFAULT_TOLERANCE, DEFAULT_TOLERANCE),
            };
            IntegratorKind::Tsit5 {
                rtol: args.rtol.unwrap_or(rtol),
                atol: args.atol.unwrap_or(atol),
            }
        }
    };

    if args.rodents_only {
        config.params.disturbance = false;
    }
    Ok(())
}

#[derive(Serialize)]
struct SeasonalReport {
    early: SeasonalProfile,
    late: SeasonalProfile,
    senescence_onset: Option<f64>,
}

impl SeasonalReport {
    fn of(trajectory: &Trajectory) -> Self {
        Self {
            early: SeasonalProfile::over(trajectory, EARLY_WINDOW.0, EARLY_WINDOW.1),
            late: SeasonalProfile::over(trajectory, LATE_WINDOW.0, LATE_WINDOW.1),
            senescence_onset: senescence_onset(trajectory),
        }
    }
}

#[derive(Serialize)]
struct CompareReport<'a> {
    statistics: &'a ComparisonStatistics,
    undisturbed_seasonal: SeasonalReport,
    disturbed_seasonal: SeasonalReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    trajectories: Option<(&'a Trajectory, &'a Trajectory)>,
}

#[derive(Serialize)]
struct SingleReport<'a> {
    summary: ScenarioSummary,
    /// Times at which the total palm count first fell below each milestone.
    milestones: Vec<(f64, Option<f64>)>,
    seasonal: SeasonalReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    trajectory: Option<&'a Trajectory>,
}

fn run(args: &Args, config: &RunConfig) -> Result<serde_json::Value> {
    match args.mode {
        Mode::Compare => {
            let comparison =
                ScenarioComparison::run(&config.params, &config.initial_state, &config.settings)?;
            log_milestones(&comparison.statistics.milestones);
            let report = CompareReport {
                statistics: &comparison.statistics,
                undisturbed_seasonal: SeasonalReport::of(&comparison.undisturbed),
                disturbed_seasonal: SeasonalReport::of(&comparison.disturbed),
                trajectories: args
                    .trajectories
                    .then_some((&comparison.undisturbed, &comparison.disturbed)),
            };
            serde_json::to_value(&report).context("Failed to serialize comparison")
        }
        Mode::Single => {
            let trajectory = simulate(&config.params, &config.initial_state, &config.settings)?;
            let summary = ScenarioSummary::from_trajectory(&trajectory);
            info!(
                "Run finished with {:.0} palms ({:.2}% remaining)",
                summary.final_total, summary.percent_remaining
            );
            let report = SingleReport {
                summary,
                milestones: DEFAULT_THRESHOLDS
                    .iter()
                    .map(|&th| (th, first_crossing_below(&trajectory, th)))
                    .collect(),
                seasonal: SeasonalReport::of(&trajectory),
                trajectory: args.trajectories.then_some(&trajectory),
            };
            serde_json::to_value(&report).context("Failed to serialize run")
        }
    }
}

fn log_milestones(milestones: &[ThresholdCrossing]) {
    for m in milestones {
        debug!(
            "{:>12.0} palms: rodents only {:?}, with humans {:?}",
            m.threshold, m.undisturbed, m.disturbed
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = args.resolve()?;
    info!(
        "Simulating {} years from {} CE ({:?})",
        config.settings.horizon_years, config.settings.start_year, args.mode
    );

    let output = run(&args, &config)?;
    let text = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}
