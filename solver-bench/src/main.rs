//! Replay driver for the simplex pricing analysis.
//!
//! Feeds a synthetic dual simplex iteration stream through the analysis,
//! printing iteration rows and the end-of-solve summary, and optionally
//! saving the summary as JSON.

mod output;
mod replay;
mod scenario;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use solver_analysis::{AnalysisSettings, EdgeWeightStrategy, MessageLevel, TraceOverflow};

use crate::replay::{replay, ReplayConfig};
use crate::scenario::Scenario;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Level {
    Off,
    Minimal,
    Detailed,
    Full,
}

impl From<Level> for MessageLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Off => MessageLevel::Off,
            Level::Minimal => MessageLevel::Minimal,
            Level::Detailed => MessageLevel::Detailed,
            Level::Full => MessageLevel::Full,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "solver-bench", about = "Replay synthetic dual simplex runs through the pricing analysis")]
struct Args {
    /// Iteration stream to replay
    #[arg(long, value_enum, default_value = "dense-dse")]
    scenario: Scenario,

    /// Number of rows
    #[arg(long, default_value_t = 2000)]
    rows: usize,

    /// Number of columns
    #[arg(long, default_value_t = 3000)]
    cols: usize,

    /// Number of iterations
    #[arg(long, default_value_t = 5000)]
    iterations: usize,

    /// Random seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Message level (overrides SIMPLEX_ANALYSIS_LEVEL)
    #[arg(long, value_enum)]
    level: Option<Level>,

    /// Forbid the switch from steepest edge to Devex
    #[arg(long)]
    no_switch: bool,

    /// Trace capacity (overrides SIMPLEX_ANALYSIS_TRACE_CAPACITY)
    #[arg(long)]
    trace_capacity: Option<usize>,

    /// Grow the trace instead of dropping its oldest records
    #[arg(long)]
    trace_grow: bool,

    /// Iterations between trace records
    #[arg(long)]
    trace_interval: Option<usize>,

    /// Write the summary as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

fn settings_from_args(args: &Args) -> AnalysisSettings {
    let mut settings = AnalysisSettings::from_env();
    if let Some(level) = args.level {
        settings.message_level = level.into();
    }
    if args.no_switch {
        settings.edge_weight_strategy = EdgeWeightStrategy::SteepestEdge;
    }
    if let Some(capacity) = args.trace_capacity {
        settings.trace_capacity = capacity;
    }
    if args.trace_grow {
        settings.trace_overflow = TraceOverflow::Grow;
    }
    if let Some(interval) = args.trace_interval {
        settings.trace_interval = interval;
    }
    settings
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = settings_from_args(&args);

    let config = ReplayConfig {
        scenario: args.scenario,
        num_row: args.rows,
        num_col: args.cols,
        num_iter: args.iterations,
        seed: args.seed,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(
        out,
        "Replaying {:?}: {} rows, {} columns, {} iterations",
        config.scenario, config.num_row, config.num_col, config.num_iter
    )?;

    let outcome = replay(&config, settings, &mut out)?;
    match outcome.switched_at {
        Some(iteration) => writeln!(out, "Switched from DSE to Devex at iteration {}", iteration)?,
        None => writeln!(out, "No switch from DSE to Devex")?,
    }
    out.flush()?;

    if let Some(path) = &args.json {
        output::save_json(&outcome.summary, path)?;
        log::info!("summary written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_settings() {
        let args = Args::parse_from([
            "solver-bench",
            "--scenario",
            "sparse",
            "--level",
            "full",
            "--no-switch",
            "--trace-capacity",
            "8",
            "--trace-grow",
        ]);
        assert_eq!(args.scenario, Scenario::Sparse);
        let s = settings_from_args(&args);
        assert_eq!(s.message_level, MessageLevel::Full);
        assert_eq!(s.edge_weight_strategy, EdgeWeightStrategy::SteepestEdge);
        assert_eq!(s.trace_capacity, 8);
        assert_eq!(s.trace_overflow, TraceOverflow::Grow);
    }
}
