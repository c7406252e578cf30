//! Configuration settings for the simplex analysis core.

use std::env;

use crate::error::{AnalysisError, AnalysisResult};

/// Dual edge weight strategy requested by the solver options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeWeightStrategy {
    /// Dantzig pricing throughout.
    Dantzig,

    /// Devex pricing throughout.
    Devex,

    /// Dual steepest edge with exactly computed initial weights.
    SteepestEdge,

    /// Dual steepest edge with unit initial weights.
    SteepestEdgeUnitInitial,

    /// Dual steepest edge, allowing a one-way switch to Devex.
    #[default]
    SteepestEdgeToDevexSwitch,
}

impl EdgeWeightStrategy {
    /// Whether any steepest-edge variant is in use.
    pub fn is_steepest_edge(self) -> bool {
        matches!(
            self,
            Self::SteepestEdge | Self::SteepestEdgeUnitInitial | Self::SteepestEdgeToDevexSwitch
        )
    }

    /// Whether the steepest edge to Devex switch is permitted.
    pub fn allows_devex_switch(self) -> bool {
        self == Self::SteepestEdgeToDevexSwitch
    }
}

/// Message verbosity level.
///
/// Levels are ordered: anything enabled at a level is enabled at every
/// higher level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum MessageLevel {
    /// No output.
    Off,

    /// Summary output only.
    #[default]
    Minimal,

    /// Per-iteration rows with iteration, phase and dual objective.
    Detailed,

    /// Extended iteration rows plus operation recording.
    Full,
}

impl MessageLevel {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "off" | "none" => Some(Self::Off),
            "1" | "minimal" => Some(Self::Minimal),
            "2" | "detailed" => Some(Self::Detailed),
            "3" | "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// What the trace buffer does when a snapshot arrives at full capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceOverflow {
    /// Evict the oldest snapshot, keeping the capacity fixed.
    #[default]
    DropOldest,

    /// Double the capacity.
    Grow,
}

/// Analysis settings.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    // === Pricing ===
    /// Edge weight strategy; decides whether the Devex switch is permitted.
    pub edge_weight_strategy: EdgeWeightStrategy,

    /// Switch when low + high average log weight error exceeds this.
    pub weight_log_error_threshold: f64,

    // === Running averages ===
    /// Smoothing factor α shared by every running average, in (0, 1).
    pub running_average_multiplier: f64,

    /// Updated weight is accepted if `updated >= threshold * computed`.
    pub accept_weight_threshold: f64,

    /// Weight ratio above which an updated weight counts as wrong (> 1).
    pub weight_error_threshold: f64,

    // === Costly DSE detection ===
    /// Squared DSE/other density ratio above which an iteration is costly.
    pub costly_dse_measure_limit: f64,

    /// DSE density below which an iteration is never costly.
    pub costly_dse_min_density: f64,

    /// Fraction of iterations that must be costly before switching.
    pub costly_dse_fraction: f64,

    /// Fraction of rows + columns that must have been iterated before switching.
    pub min_iteration_fraction: f64,

    // === Hyper-sparsity thresholds ===
    /// Input density at or below which a solve may go hyper-sparse.
    pub hyper_cancel: f64,

    /// Historical density limit for hyper-sparse FTRAN.
    pub hyper_ftran_l: f64,

    /// Historical density limit for hyper-sparse BTRAN.
    pub hyper_btran_u: f64,

    /// Result density at or below which a result counts as hyper-sparse.
    pub hyper_result: f64,

    // === Trace ===
    /// Number of snapshots the trace holds before its overflow policy applies.
    pub trace_capacity: usize,

    /// Overflow policy of the trace.
    pub trace_overflow: TraceOverflow,

    /// Iterations between trace snapshots.
    pub trace_interval: usize,

    // === Output ===
    /// Message verbosity.
    pub message_level: MessageLevel,

    /// Log large DSE weight errors as they are observed.
    pub report_weight_errors: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            // Pricing
            edge_weight_strategy: EdgeWeightStrategy::default(),
            weight_log_error_threshold: 10.0,

            // Running averages
            running_average_multiplier: 0.05,
            accept_weight_threshold: 0.25,
            weight_error_threshold: 4.0,

            // Costly DSE
            costly_dse_measure_limit: 1000.0,
            costly_dse_min_density: 0.01,
            costly_dse_fraction: 0.05,
            min_iteration_fraction: 0.1,

            // Hyper-sparsity
            hyper_cancel: 0.05,
            hyper_ftran_l: 0.15,
            hyper_btran_u: 0.10,
            hyper_result: 0.10,

            // Trace
            trace_capacity: 20,
            trace_overflow: TraceOverflow::default(),
            trace_interval: 100,

            // Output
            message_level: MessageLevel::default(),
            report_weight_errors: false,
        }
    }
}

impl AnalysisSettings {
    /// Default settings with overrides from the environment.
    ///
    /// - `SIMPLEX_ANALYSIS_LEVEL`: `off|minimal|detailed|full` or `0..=3`
    /// - `SIMPLEX_ANALYSIS_TRACE_CAPACITY`: positive integer
    /// - `SIMPLEX_ANALYSIS_SWITCH`: `0`/`false` disables the Devex switch
    pub fn from_env() -> Self {
        let mut s = Self::default();

        if let Some(level) = env::var("SIMPLEX_ANALYSIS_LEVEL")
            .ok()
            .and_then(|v| MessageLevel::parse(&v))
        {
            s.message_level = level;
        }

        if let Some(capacity) = env::var("SIMPLEX_ANALYSIS_TRACE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&v| v > 0)
        {
            s.trace_capacity = capacity;
        }

        let switch_disabled = env::var("SIMPLEX_ANALYSIS_SWITCH")
            .map(|v| v == "0" || v.to_lowercase() == "false")
            .unwrap_or(false);
        if switch_disabled {
            s.edge_weight_strategy = EdgeWeightStrategy::SteepestEdge;
        }

        s
    }

    /// Set the edge weight strategy.
    pub fn with_strategy(mut self, strategy: EdgeWeightStrategy) -> Self {
        self.edge_weight_strategy = strategy;
        self
    }

    /// Set the message level.
    pub fn with_message_level(mut self, level: MessageLevel) -> Self {
        self.message_level = level;
        self
    }

    /// Set the trace capacity and overflow policy.
    pub fn with_trace(mut self, capacity: usize, overflow: TraceOverflow) -> Self {
        self.trace_capacity = capacity;
        self.trace_overflow = overflow;
        self
    }

    /// Set the iterations between trace snapshots.
    pub fn with_trace_interval(mut self, interval: usize) -> Self {
        self.trace_interval = interval;
        self
    }

    /// Set the log weight error switch threshold.
    pub fn with_log_error_threshold(mut self, threshold: f64) -> Self {
        self.weight_log_error_threshold = threshold;
        self
    }

    /// Check that every setting lies in its valid range.
    pub fn validate(&self) -> AnalysisResult<()> {
        fn fail(msg: String) -> AnalysisResult<()> {
            Err(AnalysisError::InvalidSettings(msg))
        }

        let alpha = self.running_average_multiplier;
        if !(alpha > 0.0 && alpha < 1.0) {
            return fail(format!("running_average_multiplier {} not in (0, 1)", alpha));
        }
        if !(self.accept_weight_threshold > 0.0 && self.accept_weight_threshold < 1.0) {
            return fail(format!(
                "accept_weight_threshold {} not in (0, 1)",
                self.accept_weight_threshold
            ));
        }
        if !(self.weight_error_threshold > 1.0) || !self.weight_error_threshold.is_finite() {
            return fail(format!("weight_error_threshold {} must exceed 1", self.weight_error_threshold));
        }
        if self.weight_log_error_threshold.is_nan() {
            return fail("weight_log_error_threshold is NaN".to_string());
        }
        for (name, v) in [
            ("costly_dse_fraction", self.costly_dse_fraction),
            ("min_iteration_fraction", self.min_iteration_fraction),
            ("costly_dse_min_density", self.costly_dse_min_density),
            ("hyper_cancel", self.hyper_cancel),
            ("hyper_ftran_l", self.hyper_ftran_l),
            ("hyper_btran_u", self.hyper_btran_u),
            ("hyper_result", self.hyper_result),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return fail(format!("{} {} not in [0, 1]", name, v));
            }
        }
        if !(self.costly_dse_measure_limit >= 0.0) {
            return fail(format!(
                "costly_dse_measure_limit {} must be nonnegative",
                self.costly_dse_measure_limit
            ));
        }
        if self.trace_capacity < 2 {
            return fail(format!("trace_capacity {} must be at least 2", self.trace_capacity));
        }
        if self.trace_interval == 0 {
            return fail("trace_interval must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AnalysisSettings::default().validate().is_ok());
    }

    #[test]
    fn test_multiplier_out_of_range() {
        let mut s = AnalysisSettings::default();
        s.running_average_multiplier = 1.0;
        assert!(matches!(s.validate(), Err(AnalysisError::InvalidSettings(_))));

        s.running_average_multiplier = f64::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_weight_error_threshold_must_exceed_one() {
        let mut s = AnalysisSettings::default();
        s.weight_error_threshold = 1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_trace_capacity_minimum() {
        let s = AnalysisSettings::default().with_trace(1, TraceOverflow::Grow);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_strategy_switch_permission() {
        assert!(EdgeWeightStrategy::SteepestEdgeToDevexSwitch.allows_devex_switch());
        assert!(!EdgeWeightStrategy::SteepestEdge.allows_devex_switch());
        assert!(EdgeWeightStrategy::SteepestEdgeUnitInitial.is_steepest_edge());
        assert!(!EdgeWeightStrategy::Devex.is_steepest_edge());
    }

    #[test]
    fn test_message_level_parse_and_order() {
        assert_eq!(MessageLevel::parse("FULL"), Some(MessageLevel::Full));
        assert_eq!(MessageLevel::parse("2"), Some(MessageLevel::Detailed));
        assert_eq!(MessageLevel::parse("loud"), None);
        assert!(MessageLevel::Full > MessageLevel::Detailed);
        assert!(MessageLevel::Minimal > MessageLevel::Off);
    }
}
