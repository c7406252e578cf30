//! End-of-solve summary report.

use std::fmt;

use serde::Serialize;

use crate::density::OperationType;
use crate::iteration::{EdgeWeightMode, InvertHint, PriceVariant};
use crate::recorder::OperationRecord;
use crate::report::log10_indicator;
use crate::trace::TraceRecord;
use crate::weight::WeightErrorStats;

/// Minimum trace records (including the closing snapshot) for a speed table.
pub const SPEED_TABLE_MIN_RECORDS: usize = 3;

/// Integer percentage, zero when the total is zero.
#[inline]
pub fn percent(count: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (100 * count) / total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeShare {
    pub mode: EdgeWeightMode,
    pub iterations: u64,
    pub percent: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    pub op: OperationType,
    pub calls: u64,
    pub hyper_ops: u64,
    pub hyper_ops_percent: u64,
    pub hyper_results: u64,
    pub hyper_results_percent: u64,
    pub result_dim: usize,
    /// Geometric mean result density.
    pub mean_density: f64,
    pub mean_nnz: usize,
    pub max_nnz: usize,
    pub max_density: f64,
}

impl From<&OperationRecord> for OperationSummary {
    fn from(rec: &OperationRecord) -> Self {
        let mean_density = rec.mean_result_density();
        Self {
            op: rec.op,
            calls: rec.num_call,
            hyper_ops: rec.num_hyper_op,
            hyper_ops_percent: percent(rec.num_hyper_op, rec.num_call),
            hyper_results: rec.num_hyper_result,
            hyper_results_percent: percent(rec.num_hyper_result, rec.num_call),
            result_dim: rec.result_dim,
            mean_density,
            mean_nnz: (mean_density * rec.result_dim as f64) as usize,
            max_nnz: rec.result_max_nnz,
            max_density: rec.max_result_density(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvertShare {
    pub hint: InvertHint,
    pub count: u64,
    pub percent: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceShare {
    pub variant: PriceVariant,
    pub count: u64,
    pub percent: u64,
}

/// Iteration speed between two consecutive trace records.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedRow {
    pub iterations: usize,
    pub from_iteration: usize,
    pub to_iteration: usize,
    pub time: f64,
    pub iterations_per_sec: u64,
    pub log10_ftran: i32,
    pub log10_btran: i32,
    pub log10_price: i32,
    pub log10_dse: i32,
    pub mode: EdgeWeightMode,
    pub log10_aux0: i32,
}

impl SpeedRow {
    /// Build the rows between successive records.
    pub fn table<'a>(records: impl IntoIterator<Item = &'a TraceRecord>) -> Vec<SpeedRow> {
        let mut rows = Vec::new();
        let mut iter = records.into_iter();
        let Some(first) = iter.next() else {
            return rows;
        };
        let (mut from_iteration, mut from_time) = (first.iteration, first.time);
        for rec in iter {
            let iterations = rec.iteration.saturating_sub(from_iteration);
            let time = rec.time - from_time;
            let iterations_per_sec = if time > 0.0 { (iterations as f64 / time) as u64 } else { 0 };
            let d = |op: OperationType| log10_indicator(rec.densities[op.index()]);
            rows.push(SpeedRow {
                iterations,
                from_iteration,
                to_iteration: rec.iteration,
                time,
                iterations_per_sec,
                log10_ftran: d(OperationType::Ftran),
                log10_btran: d(OperationType::Btran),
                log10_price: d(OperationType::Price),
                log10_dse: d(OperationType::FtranDse),
                mode: rec.edge_weight_mode,
                log10_aux0: log10_indicator(rec.aux0),
            });
            from_iteration = rec.iteration;
            from_time = rec.time;
        }
        rows
    }
}

/// Everything reported at the end of a solve.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub iterations: usize,
    pub first_iteration: usize,
    pub last_iteration: usize,
    pub edge_weight_modes: Vec<ModeShare>,
    pub operations: Vec<OperationSummary>,
    pub num_invert: u64,
    pub inverts: Vec<InvertShare>,
    pub primal_degenerate: u64,
    pub dual_degenerate: u64,
    pub num_price: u64,
    pub prices: Vec<PriceShare>,
    pub costly_dse_iterations: u64,
    /// Running average of the costly DSE indicator at the end of the window.
    pub costly_dse_frequency: f64,
    pub weight_errors: WeightErrorStats,
    pub trace_evicted: u64,
    pub speed: Vec<SpeedRow>,
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\nAnalysis of {} iterations ({} to {})",
            self.iterations, self.first_iteration, self.last_iteration
        )?;
        if self.iterations == 0 {
            return Ok(());
        }
        let num_iter = self.iterations as u64;

        for share in self.edge_weight_modes.iter().filter(|s| s.iterations > 0) {
            writeln!(
                f,
                "{} for {:12} ({:3}%) iterations",
                share.mode.tag(),
                share.iterations,
                share.percent
            )?;
        }
        writeln!(f)?;

        for op in &self.operations {
            writeln!(f, "\n{:<9} performed {} times", op.op.name(), op.calls)?;
            if op.calls == 0 {
                continue;
            }
            writeln!(f, "{:12} hyper-sparse operations ({:3}%)", op.hyper_ops, op.hyper_ops_percent)?;
            writeln!(f, "{:12} hyper-sparse results    ({:3}%)", op.hyper_results, op.hyper_results_percent)?;
            writeln!(
                f,
                "{:12.4e} density of result ({} / {} nonzeros)",
                op.mean_density, op.mean_nnz, op.result_dim
            )?;
            writeln!(
                f,
                "{:12.4e} density of result with max ({} / {}) nonzeros",
                op.max_density, op.max_nnz, op.result_dim
            )?;
        }

        if self.num_invert > 0 {
            writeln!(
                f,
                "\nInvert    performed {} times: average frequency = {}",
                self.num_invert,
                num_iter / self.num_invert
            )?;
            for share in self.inverts.iter().filter(|s| s.count > 0) {
                writeln!(
                    f,
                    "{:12} ({:3}%) Invert operations due to {}",
                    share.count,
                    share.percent,
                    share.hint.description()
                )?;
            }
        }

        writeln!(
            f,
            "\n{:12} ({:3}%) primal degenerate iterations",
            self.primal_degenerate,
            percent(self.primal_degenerate, num_iter)
        )?;
        writeln!(
            f,
            "{:12} ({:3}%)   dual degenerate iterations",
            self.dual_degenerate,
            percent(self.dual_degenerate, num_iter)
        )?;

        if self.num_price > 0 {
            writeln!(f, "\n{:12} Price operations:", self.num_price)?;
            for share in &self.prices {
                writeln!(f, "{:12} {:<14} ({:3}%)", share.count, share.variant.label(), share.percent)?;
            }
        }

        writeln!(
            f,
            "\n{:12} ({:3}%) costly DSE        iterations: average frequency = {:.4}",
            self.costly_dse_iterations,
            percent(self.costly_dse_iterations, num_iter),
            self.costly_dse_frequency
        )?;

        if self.weight_errors.num_check > 0 {
            let w = &self.weight_errors;
            writeln!(
                f,
                "\n{:12} DSE weight checks: {} rejected, {} low, {} high",
                w.num_check, w.num_reject, w.num_wrong_low, w.num_wrong_high
            )?;
            writeln!(
                f,
                "{:12.4e} max average log error (low {:.4e}, high {:.4e})",
                w.max_sum_average_log_error, w.max_average_log_low_error, w.max_average_log_high_error
            )?;
        }

        if !self.speed.is_empty() {
            writeln!(f, "\n Iteration speed analysis")?;
            writeln!(
                f,
                "        Iter (      FmIter:      ToIter)      Time      Iter/sec | C_Aq R_Ep R_Ap  DSE | EdWt | Aux0"
            )?;
            for row in &self.speed {
                writeln!(
                    f,
                    "{:12} ({:12}:{:12}) {:9.4}  {:12} | {:4} {:4} {:4} {:4} |  {:>3} | {:4}",
                    row.iterations,
                    row.from_iteration,
                    row.to_iteration,
                    row.time,
                    row.iterations_per_sec,
                    row.log10_ftran,
                    row.log10_btran,
                    row.log10_price,
                    row.log10_dse,
                    row.mode.tag(),
                    row.log10_aux0,
                )?;
            }
            if self.trace_evicted > 0 {
                writeln!(f, "({} earlier trace records dropped)", self.trace_evicted)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::NUM_OPERATION_TYPE;

    fn rec(iteration: usize, time: f64) -> TraceRecord {
        let mut densities = [0.0; NUM_OPERATION_TYPE];
        densities[OperationType::Ftran.index()] = 0.02;
        TraceRecord { iteration, time, densities, aux0: 0.0, edge_weight_mode: EdgeWeightMode::Devex }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(5, 0), 0);
        assert_eq!(percent(7, 7), 100);
    }

    #[test]
    fn test_speed_table() {
        let records = vec![rec(0, 0.0), rec(100, 0.5), rec(150, 0.5)];
        let rows = SpeedRow::table(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].from_iteration, rows[0].to_iteration), (0, 100));
        assert_eq!(rows[0].iterations_per_sec, 200);
        assert_eq!(rows[0].log10_ftran, -1);
        assert_eq!(rows[0].log10_dse, -99);
        // No elapsed time: speed reported as zero.
        assert_eq!(rows[1].iterations_per_sec, 0);
    }

    #[test]
    fn test_speed_table_empty() {
        assert!(SpeedRow::table(&Vec::<TraceRecord>::new()).is_empty());
    }
}
