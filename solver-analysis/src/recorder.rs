//! Hyper-sparsity counters per operation type.
//!
//! These counters are used to tune the thresholds at which the solver's
//! triangular solves switch to their hyper-sparse code paths.

use serde::Serialize;
use sprs::CsVecView;

use crate::context::SolveContext;
use crate::density::{density_of, OperationType, NUM_OPERATION_TYPE};

/// Counters for one operation type.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub op: OperationType,
    /// Dimension of the operation's result vector.
    pub result_dim: usize,
    /// Input density at or below which the operation may go hyper-sparse.
    pub hyper_cancel: f64,
    /// Historical density at or below which the operation may go hyper-sparse.
    pub hyper_tran: f64,
    pub num_call: u64,
    pub num_hyper_op: u64,
    pub num_hyper_result: u64,
    pub result_max_nnz: usize,
    /// Sum of log10 of positive result densities.
    pub sum_log10_result_density: f64,
    /// Results with zero density; not included in the log sum.
    pub num_zero_result: u64,
}

impl OperationRecord {
    fn new(op: OperationType, ctx: &SolveContext) -> Self {
        let s = ctx.settings();
        let (hyper_cancel, hyper_tran, result_dim) = match op {
            OperationType::Price => (1.0, 1.0, ctx.num_col()),
            OperationType::Btran => (s.hyper_cancel, s.hyper_btran_u, ctx.num_row()),
            OperationType::Ftran | OperationType::FtranBfrt | OperationType::FtranDse => {
                (s.hyper_cancel, s.hyper_ftran_l, ctx.num_row())
            }
        };
        Self {
            op,
            result_dim,
            hyper_cancel,
            hyper_tran,
            num_call: 0,
            num_hyper_op: 0,
            num_hyper_result: 0,
            result_max_nnz: 0,
            sum_log10_result_density: 0.0,
            num_zero_result: 0,
        }
    }

    /// Geometric mean of the positive result densities over all calls.
    ///
    /// Zero when no result had a nonzero.
    pub fn mean_result_density(&self) -> f64 {
        if self.num_call == 0 || self.num_zero_result >= self.num_call {
            0.0
        } else {
            10f64.powf(self.sum_log10_result_density / self.num_call as f64)
        }
    }

    /// Density of the largest result seen.
    pub fn max_result_density(&self) -> f64 {
        density_of(self.result_max_nnz, self.result_dim)
    }
}

/// Table of operation records, one per [`OperationType`].
#[derive(Debug, Clone)]
pub struct OperationRecorder {
    records: [OperationRecord; NUM_OPERATION_TYPE],
    hyper_result: f64,
    num_row: usize,
}

impl OperationRecorder {
    pub fn new(ctx: &SolveContext) -> Self {
        Self {
            records: OperationType::ALL.map(|op| OperationRecord::new(op, ctx)),
            hyper_result: ctx.settings().hyper_result,
            num_row: ctx.num_row(),
        }
    }

    pub fn record(&self, op: OperationType) -> &OperationRecord {
        &self.records[op.index()]
    }

    pub fn records(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter()
    }

    /// Count a call, and a hyper-sparse operation if both densities permit one.
    pub fn record_before(&mut self, op: OperationType, local_density: f64, historical_density: f64) {
        let rec = &mut self.records[op.index()];
        rec.num_call += 1;
        if local_density <= rec.hyper_cancel && historical_density <= rec.hyper_tran {
            rec.num_hyper_op += 1;
        }
    }

    /// Count a result with `result_nnz` nonzeros.
    pub fn record_after(&mut self, op: OperationType, result_nnz: usize) {
        let hyper_result = self.hyper_result;
        let rec = &mut self.records[op.index()];
        let density = density_of(result_nnz, rec.result_dim);
        if density <= hyper_result {
            rec.num_hyper_result += 1;
        }
        rec.result_max_nnz = rec.result_max_nnz.max(result_nnz);
        if density > 0.0 {
            rec.sum_log10_result_density += density.log10();
        } else {
            rec.num_zero_result += 1;
            log::debug!("{} produced a result with no nonzeros", op.name());
        }
    }

    /// [`record_before`](Self::record_before) for an input vector, measured against the row count.
    pub fn record_before_vector(
        &mut self,
        op: OperationType,
        input: CsVecView<'_, f64>,
        historical_density: f64,
    ) {
        let local = density_of(input.nnz(), self.num_row);
        self.record_before(op, local, historical_density);
    }

    /// [`record_after`](Self::record_after) for a result vector.
    pub fn record_after_vector(&mut self, op: OperationType, result: CsVecView<'_, f64>) {
        self.record_after(op, result.nnz());
    }
}
