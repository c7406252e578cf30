//! Per-solve analysis context.
//!
//! [`SimplexAnalysis`] owns every statistic gathered during one solve. The
//! simplex loop creates it with [`SimplexAnalysis::setup`], calls
//! [`initialise`](SimplexAnalysis::initialise) when the analysis window
//! starts, feeds it operation results and iteration data, queries the Devex
//! switch, and finally asks for a summary.
//!
//! ```ignore
//! let mut analysis = SimplexAnalysis::setup(num_row, num_col, settings)?;
//! analysis.initialise(0);
//! loop {
//!     analysis.update_density(OperationType::Btran, row_ep.density());
//!     // ...
//!     analysis.record_iteration(&data);
//!     if mode == EdgeWeightMode::SteepestEdge && analysis.apply_devex_switch() {
//!         mode = EdgeWeightMode::Devex;
//!     }
//!     analysis.iteration_report(&mut out, &data)?;
//! }
//! analysis.summary_report(&mut out)?;
//! ```

use std::io::{self, Write};

use sprs::CsVecView;

use crate::context::SolveContext;
use crate::density::{DensityTracker, OperationType, NUM_OPERATION_TYPE};
use crate::error::AnalysisResult;
use crate::iteration::{EdgeWeightMode, InvertHint, IterationData, PriceVariant, NUM_INVERT_HINT};
use crate::recorder::OperationRecorder;
use crate::report::IterationReporter;
use crate::settings::{AnalysisSettings, EdgeWeightStrategy, MessageLevel};
use crate::summary::{
    percent, InvertShare, ModeShare, OperationSummary, PriceShare, SpeedRow, SummaryReport,
    SPEED_TABLE_MIN_RECORDS,
};
use crate::switch::{switch_to_devex, CostlyDseTracker, SwitchReason};
use crate::trace::{Clock, InstantClock, TraceBuffer, TraceRecord};
use crate::weight::{WeightAccuracyMonitor, WeightErrorStats};

/// Analysis state for one simplex solve.
pub struct SimplexAnalysis<C: Clock = InstantClock> {
    ctx: SolveContext,
    densities: DensityTracker,
    weights: WeightAccuracyMonitor,
    costly: CostlyDseTracker,
    reporter: IterationReporter,
    recorder: OperationRecorder,
    trace: TraceBuffer,
    clock: C,

    window_start: usize,
    iteration_count: usize,
    last_trace_iteration: usize,
    edge_weight_mode: EdgeWeightMode,
    monitor_weights: bool,
    devex_switch_applied: bool,

    num_edge_weight_iter: [u64; 3],
    num_invert: [u64; NUM_INVERT_HINT],
    num_primal_degenerate: u64,
    num_dual_degenerate: u64,
    num_price: [u64; 4],
}

impl SimplexAnalysis<InstantClock> {
    /// Create the analysis for a problem with `num_row` rows and `num_col` columns.
    pub fn setup(num_row: usize, num_col: usize, settings: AnalysisSettings) -> AnalysisResult<Self> {
        Self::with_clock(num_row, num_col, settings, InstantClock::default())
    }
}

impl<C: Clock> SimplexAnalysis<C> {
    /// Like [`setup`](SimplexAnalysis::setup), with a caller-supplied clock.
    pub fn with_clock(
        num_row: usize,
        num_col: usize,
        settings: AnalysisSettings,
        clock: C,
    ) -> AnalysisResult<Self> {
        let ctx = SolveContext::setup(num_row, num_col, settings)?;
        let s = ctx.settings();
        let weights =
            WeightAccuracyMonitor::new(ctx.alpha(), s.accept_weight_threshold, s.weight_error_threshold)
                .with_error_reporting(s.report_weight_errors);
        let trace = TraceBuffer::with_capacity(s.trace_capacity, s.trace_overflow);
        let edge_weight_mode = initial_mode(s.edge_weight_strategy);
        let recorder = OperationRecorder::new(&ctx);

        let mut analysis = Self {
            densities: DensityTracker::new(),
            weights,
            costly: CostlyDseTracker::default(),
            reporter: IterationReporter::new(),
            recorder,
            trace,
            clock,
            window_start: 0,
            iteration_count: 0,
            last_trace_iteration: 0,
            edge_weight_mode,
            monitor_weights: false,
            devex_switch_applied: false,
            num_edge_weight_iter: [0; 3],
            num_invert: [0; NUM_INVERT_HINT],
            num_primal_degenerate: 0,
            num_dual_degenerate: 0,
            num_price: [0; 4],
            ctx,
        };
        analysis.initialise(0);
        Ok(analysis)
    }

    /// Zero every statistic and start the analysis window at `iteration_count`.
    pub fn initialise(&mut self, iteration_count: usize) {
        self.densities.reset();
        self.weights.reset();
        self.costly.reset();
        self.reporter.reset();
        self.recorder = OperationRecorder::new(&self.ctx);
        self.trace.clear();
        self.clock.reset();

        self.monitor_weights = self.ctx.settings().edge_weight_strategy.is_steepest_edge();
        self.window_start = iteration_count;
        self.iteration_count = iteration_count;
        self.last_trace_iteration = iteration_count;
        self.num_edge_weight_iter = [0; 3];
        self.num_invert = [0; NUM_INVERT_HINT];
        self.num_primal_degenerate = 0;
        self.num_dual_degenerate = 0;
        self.num_price = [0; 4];

        let start = self.snapshot();
        self.trace.append(start);
    }

    pub fn context(&self) -> &SolveContext {
        &self.ctx
    }

    pub fn densities(&self) -> &DensityTracker {
        &self.densities
    }

    pub fn weight_stats(&self) -> &WeightErrorStats {
        self.weights.stats()
    }

    pub fn costly(&self) -> &CostlyDseTracker {
        &self.costly
    }

    pub fn recorder(&self) -> &OperationRecorder {
        &self.recorder
    }

    pub fn trace(&self) -> &TraceBuffer {
        &self.trace
    }

    pub fn edge_weight_mode(&self) -> EdgeWeightMode {
        self.edge_weight_mode
    }

    /// Iterations since the analysis window started.
    pub fn iterations(&self) -> usize {
        self.iteration_count.saturating_sub(self.window_start)
    }

    /// Fold an operation's result density into its running average.
    pub fn update_density(&mut self, op: OperationType, local_density: f64) {
        self.densities.update(self.ctx.alpha(), op, local_density);
    }

    /// Compare a freshly computed DSE weight with its updated value.
    ///
    /// Returns whether the updated weight is accepted. Comparisons are only
    /// recorded under a steepest edge strategy; otherwise every weight is accepted.
    pub fn record_weight(&mut self, computed: f64, updated: f64) -> bool {
        if !self.monitor_weights {
            return true;
        }
        self.weights.record(computed, updated)
    }

    fn recording_operations(&self) -> bool {
        self.ctx.settings().message_level >= MessageLevel::Full
    }

    /// Count a call of `op` before it runs. No-op below [`MessageLevel::Full`].
    pub fn operation_record_before(&mut self, op: OperationType, local_density: f64, historical_density: f64) {
        if self.recording_operations() {
            self.recorder.record_before(op, local_density, historical_density);
        }
    }

    /// Count the result of `op`. No-op below [`MessageLevel::Full`].
    pub fn operation_record_after(&mut self, op: OperationType, result_nnz: usize) {
        if self.recording_operations() {
            self.recorder.record_after(op, result_nnz);
        }
    }

    /// [`operation_record_before`](Self::operation_record_before) for a sparse input vector.
    pub fn operation_record_before_vector(
        &mut self,
        op: OperationType,
        input: CsVecView<'_, f64>,
        historical_density: f64,
    ) {
        if self.recording_operations() {
            self.recorder.record_before_vector(op, input, historical_density);
        }
    }

    /// [`operation_record_after`](Self::operation_record_after) for a sparse result vector.
    pub fn operation_record_after_vector(&mut self, op: OperationType, result: CsVecView<'_, f64>) {
        if self.recording_operations() {
            self.recorder.record_after_vector(op, result);
        }
    }

    /// Count one pricing operation.
    pub fn record_price(&mut self, variant: PriceVariant) {
        self.num_price[variant.index()] += 1;
    }

    /// Close out one simplex iteration.
    ///
    /// Updates the costly DSE statistics (when steepest edge is active), the
    /// per-mode, invert and degeneracy counters, and samples the trace.
    pub fn record_iteration(&mut self, data: &IterationData) {
        self.iteration_count = data.iteration.max(self.window_start);
        self.edge_weight_mode = data.edge_weight_mode;
        self.num_edge_weight_iter[data.edge_weight_mode.index()] += 1;

        if data.edge_weight_mode == EdgeWeightMode::SteepestEdge {
            self.costly.record(&self.ctx, &self.densities);
        } else {
            self.costly.last_costly = false;
        }

        if let Some(hint) = data.invert_hint {
            self.num_invert[hint.index()] += 1;
        }
        if data.is_primal_degenerate() {
            self.num_primal_degenerate += 1;
        }
        if data.is_dual_degenerate() {
            self.num_dual_degenerate += 1;
        }

        let interval = self.ctx.settings().trace_interval;
        if self.iteration_count >= self.last_trace_iteration + interval {
            let record = self.snapshot();
            self.trace.append(record);
            self.last_trace_iteration = self.iteration_count;
        }
    }

    /// Why steepest edge should give way to Devex, if it should.
    pub fn switch_reason(&self) -> Option<SwitchReason> {
        switch_to_devex(&self.ctx, &self.costly, self.weights.stats(), self.iterations())
    }

    /// Whether the caller should switch from steepest edge to Devex pricing.
    ///
    /// Depends only on the recorded statistics; repeated calls agree.
    pub fn should_switch_to_devex(&self) -> bool {
        self.switch_reason().is_some()
    }

    /// Commit to Devex pricing if a switch is recommended.
    ///
    /// Returns true, and logs the reason, only on the call that applies the
    /// switch. Later calls return false for the rest of the solve.
    pub fn apply_devex_switch(&mut self) -> bool {
        if self.devex_switch_applied {
            return false;
        }
        let Some(reason) = self.switch_reason() else {
            return false;
        };
        log::info!(
            "Switch from DSE to Devex after {}: C_Aq density {:.4e}; R_Ep density {:.4e}; DSE density {:.4e}",
            reason,
            self.densities.get(OperationType::Ftran),
            self.densities.get(OperationType::Btran),
            self.densities.get(OperationType::FtranDse),
        );
        self.devex_switch_applied = true;
        true
    }

    /// Whether [`apply_devex_switch`](Self::apply_devex_switch) has switched this solve to Devex.
    pub fn devex_switch_applied(&self) -> bool {
        self.devex_switch_applied
    }

    /// Write an iteration row, with a header when one is due.
    pub fn iteration_report<W: Write + ?Sized>(&mut self, out: &mut W, data: &IterationData) -> io::Result<()> {
        let level = self.ctx.settings().message_level;
        self.reporter.report(out, level, data, &self.densities)
    }

    /// Snapshot of the current iteration state.
    pub fn snapshot(&self) -> TraceRecord {
        let mut densities = [0.0; NUM_OPERATION_TYPE];
        for op in OperationType::ALL {
            densities[op.index()] = self.densities.get(op);
        }
        let steepest_edge = self.edge_weight_mode == EdgeWeightMode::SteepestEdge;
        if !steepest_edge {
            densities[OperationType::FtranDse.index()] = 0.0;
        }
        TraceRecord {
            iteration: self.iteration_count,
            time: self.clock.elapsed_secs(),
            densities,
            aux0: if steepest_edge { self.costly.measure } else { 0.0 },
            edge_weight_mode: self.edge_weight_mode,
        }
    }

    /// Gather the end-of-solve statistics.
    pub fn summary(&self) -> SummaryReport {
        let iterations = self.iterations();
        let num_iter = iterations as u64;

        let edge_weight_modes = EdgeWeightMode::ALL
            .iter()
            .map(|&mode| {
                let n = self.num_edge_weight_iter[mode.index()];
                ModeShare { mode, iterations: n, percent: percent(n, num_iter) }
            })
            .collect();

        let num_invert: u64 = self.num_invert.iter().sum();
        let inverts = InvertHint::ALL
            .iter()
            .map(|&hint| {
                let count = self.num_invert[hint.index()];
                InvertShare { hint, count, percent: percent(count, num_invert) }
            })
            .collect();

        let num_price: u64 = self.num_price.iter().sum();
        let prices = PriceVariant::ALL
            .iter()
            .map(|&variant| {
                let count = self.num_price[variant.index()];
                PriceShare { variant, count, percent: percent(count, num_price) }
            })
            .collect();

        // The closing snapshot is not stored, so the trace stays within capacity.
        let closing = self.snapshot();
        let speed = if self.trace.len() + 1 >= SPEED_TABLE_MIN_RECORDS {
            SpeedRow::table(self.trace.records().chain(std::iter::once(&closing)))
        } else {
            Vec::new()
        };

        SummaryReport {
            iterations,
            first_iteration: self.window_start + 1,
            last_iteration: self.iteration_count,
            edge_weight_modes,
            operations: self.recorder.records().map(OperationSummary::from).collect(),
            num_invert,
            inverts,
            primal_degenerate: self.num_primal_degenerate,
            dual_degenerate: self.num_dual_degenerate,
            num_price,
            prices,
            costly_dse_iterations: self.costly.num_costly,
            costly_dse_frequency: self.costly.frequency,
            weight_errors: self.weights.stats().clone(),
            trace_evicted: self.trace.num_evicted(),
            speed,
        }
    }

    /// Write the summary. Silent at [`MessageLevel::Off`].
    pub fn summary_report<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        if self.ctx.settings().message_level == MessageLevel::Off {
            return Ok(());
        }
        write!(out, "{}", self.summary())
    }
}

fn initial_mode(strategy: EdgeWeightStrategy) -> EdgeWeightMode {
    match strategy {
        EdgeWeightStrategy::Dantzig => EdgeWeightMode::Dantzig,
        EdgeWeightStrategy::Devex => EdgeWeightMode::Devex,
        _ => EdgeWeightMode::SteepestEdge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Clock advanced by hand.
    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<f64>>);

    impl Clock for ManualClock {
        fn elapsed_secs(&self) -> f64 {
            self.0.get()
        }

        fn reset(&mut self) {
            self.0.set(0.0);
        }
    }

    fn analysis(settings: AnalysisSettings) -> (SimplexAnalysis<ManualClock>, Rc<Cell<f64>>) {
        let clock = ManualClock::default();
        let time = clock.0.clone();
        (SimplexAnalysis::with_clock(20, 80, settings, clock).unwrap(), time)
    }

    fn iter(iteration: usize) -> IterationData {
        IterationData { iteration, phase: 2, primal_step: 1.0, dual_step: 1.0, ..Default::default() }
    }

    #[test]
    fn test_initialise_seeds_trace() {
        let (mut a, _) = analysis(AnalysisSettings::default());
        a.initialise(7);
        assert_eq!(a.trace().len(), 1);
        assert_eq!(a.trace().last().map(|r| r.iteration), Some(7));
        assert_eq!(a.iterations(), 0);
    }

    #[test]
    fn test_record_iteration_counters() {
        let (mut a, _) = analysis(AnalysisSettings::default());
        let mut d = iter(1);
        d.invert_hint = Some(InvertHint::UpdateLimitReached);
        d.primal_step = 0.0;
        a.record_iteration(&d);
        let mut d = iter(2);
        d.dual_step = 0.0;
        d.edge_weight_mode = EdgeWeightMode::Devex;
        a.record_iteration(&d);
        a.record_price(PriceVariant::Row);
        a.record_price(PriceVariant::Col);

        let s = a.summary();
        assert_eq!(s.iterations, 2);
        assert_eq!(s.num_invert, 1);
        assert_eq!(s.primal_degenerate, 1);
        assert_eq!(s.dual_degenerate, 1);
        assert_eq!(s.num_price, 2);
        let dse = s.edge_weight_modes.iter().find(|m| m.mode == EdgeWeightMode::SteepestEdge).unwrap();
        assert_eq!((dse.iterations, dse.percent), (1, 50));
        assert_eq!(a.edge_weight_mode(), EdgeWeightMode::Devex);
    }

    #[test]
    fn test_trace_sampled_at_interval() {
        let settings = AnalysisSettings::default().with_trace_interval(10);
        let (mut a, time) = analysis(settings);
        for it in 1..=35 {
            time.set(it as f64 * 0.125);
            a.record_iteration(&iter(it));
        }
        let iters: Vec<usize> = a.trace().records().map(|r| r.iteration).collect();
        assert_eq!(iters, vec![0, 10, 20, 30]);

        let s = a.summary();
        assert_eq!(s.speed.len(), 4);
        assert_eq!(s.speed[0].iterations_per_sec, 8);
        assert_eq!(s.speed.last().map(|r| r.to_iteration), Some(35));
        assert_eq!(a.trace().len(), 4);
    }

    #[test]
    fn test_operation_recording_gated_by_level() {
        let (mut a, _) = analysis(AnalysisSettings::default());
        a.operation_record_before(OperationType::Btran, 0.01, 0.01);
        assert_eq!(a.recorder().record(OperationType::Btran).num_call, 0);

        let settings = AnalysisSettings::default().with_message_level(MessageLevel::Full);
        let (mut a, _) = analysis(settings);
        a.operation_record_before(OperationType::Btran, 0.01, 0.01);
        a.operation_record_after(OperationType::Btran, 2);
        let rec = a.recorder().record(OperationType::Btran);
        assert_eq!((rec.num_call, rec.num_hyper_op, rec.num_hyper_result), (1, 1, 1));
    }

    #[test]
    fn test_switch_on_weight_error() {
        let settings = AnalysisSettings::default().with_log_error_threshold(0.1);
        let (mut a, _) = analysis(settings);
        assert!(!a.should_switch_to_devex());
        for _ in 0..5 {
            a.record_weight(1.0, 100.0);
        }
        assert!(a.should_switch_to_devex());
        assert!(a.should_switch_to_devex());
    }

    #[test]
    fn test_devex_switch_applied_once() {
        let settings = AnalysisSettings::default().with_log_error_threshold(0.1);
        let (mut a, _) = analysis(settings);
        assert!(!a.apply_devex_switch());
        for _ in 0..5 {
            a.record_weight(1.0, 100.0);
        }
        assert!(a.apply_devex_switch());
        assert!(a.devex_switch_applied());
        assert!(!a.apply_devex_switch());
        // The query still reports the recommendation.
        assert!(a.should_switch_to_devex());
    }

    #[test]
    fn test_weights_ignored_without_steepest_edge() {
        let settings = AnalysisSettings::default().with_strategy(EdgeWeightStrategy::Devex);
        let (mut a, _) = analysis(settings);
        assert!(a.record_weight(1.0, 0.01));
        assert_eq!(a.weight_stats().num_check, 0);

        let (mut a, _) = analysis(AnalysisSettings::default());
        assert!(!a.record_weight(1.0, 0.01));
        assert_eq!(a.weight_stats().num_check, 1);
    }

    #[test]
    fn test_costly_not_counted_outside_dse() {
        let (mut a, _) = analysis(AnalysisSettings::default());
        a.update_density(OperationType::Ftran, 0.001);
        a.update_density(OperationType::FtranDse, 1.0);
        let mut d = iter(1);
        d.edge_weight_mode = EdgeWeightMode::Devex;
        a.record_iteration(&d);
        assert_eq!(a.costly().num_costly, 0);
        a.record_iteration(&iter(2));
        assert_eq!(a.costly().num_costly, 1);

        let s = a.summary();
        assert!((s.costly_dse_frequency - 0.05).abs() < 1e-12);
        assert!(s.to_string().contains("costly DSE        iterations: average frequency = 0.0500"));
    }

    #[test]
    fn test_summary_report_silent_when_off() {
        let settings = AnalysisSettings::default().with_message_level(MessageLevel::Off);
        let (a, _) = analysis(settings);
        let mut out = Vec::new();
        a.summary_report(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
