//! Steepest edge to Devex switch decision.
//!
//! Two triggers are evaluated in order:
//!
//! 1. **Cost**: the DSE forward solve is much denser than the other
//!    per-iteration solves for a sufficient fraction of a sufficiently long
//!    run of iterations.
//! 2. **Accuracy**: the running log errors of the updated weights are large.
//!
//! The decision itself is a pure function of the recorded statistics. The
//! caller owns the pricing mode and treats a positive answer as final.

use std::fmt;

use serde::Serialize;

use crate::context::SolveContext;
use crate::density::{update_density, DensityTracker, OperationType};
use crate::weight::WeightErrorStats;

/// Per-iteration bookkeeping of costly DSE iterations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostlyDseTracker {
    /// Costly iterations since the analysis window started.
    pub num_costly: u64,
    /// Running average of the costly indicator.
    pub frequency: f64,
    /// Most recent costly DSE measure.
    pub measure: f64,
    /// Whether the most recently recorded iteration was costly.
    pub last_costly: bool,
}

impl CostlyDseTracker {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluate the current iteration's cost and fold it into the running statistics.
    pub fn record(&mut self, ctx: &SolveContext, densities: &DensityTracker) -> bool {
        let settings = ctx.settings();
        self.measure = densities.costly_dse_measure();
        let costly = self.measure > settings.costly_dse_measure_limit
            && densities.get(OperationType::FtranDse) > settings.costly_dse_min_density;
        update_density(ctx.alpha(), if costly { 1.0 } else { 0.0 }, &mut self.frequency);
        if costly {
            self.num_costly += 1;
        }
        self.last_costly = costly;
        costly
    }
}

/// Why a switch to Devex is recommended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SwitchReason {
    /// Too many iterations had an expensive DSE forward solve.
    CostlyDse {
        num_costly: u64,
        iterations: usize,
    },
    /// The updated weights have become inaccurate.
    WeightError {
        measure: f64,
        threshold: f64,
    },
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SwitchReason::CostlyDse { num_costly, iterations } => write!(
                f,
                "{} costly DSE iterations of {}",
                num_costly, iterations
            ),
            SwitchReason::WeightError { measure, threshold } => write!(
                f,
                "log error measure of {} > {} = threshold",
                measure, threshold
            ),
        }
    }
}

/// Decide whether steepest edge pricing should give way to Devex.
///
/// `iterations` counts the iterations since the start of the analysis window.
pub fn switch_to_devex(
    ctx: &SolveContext,
    costly: &CostlyDseTracker,
    weights: &WeightErrorStats,
    iterations: usize,
) -> Option<SwitchReason> {
    let settings = ctx.settings();
    if !settings.edge_weight_strategy.allows_devex_switch() {
        return None;
    }

    let iters = iterations as f64;
    if costly.last_costly
        && costly.num_costly as f64 > settings.costly_dse_fraction * iters
        && iters > settings.min_iteration_fraction * ctx.num_tot() as f64
    {
        return Some(SwitchReason::CostlyDse { num_costly: costly.num_costly, iterations });
    }

    let measure = weights.log_error_measure();
    if measure > settings.weight_log_error_threshold {
        return Some(SwitchReason::WeightError {
            measure,
            threshold: settings.weight_log_error_threshold,
        });
    }
    None
}
