//! Running densities of the sparse operations performed each iteration.

use serde::Serialize;

/// Sparse operation performed during a dual simplex iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationType {
    /// Basis-transpose solve for the pivotal row of the inverse.
    Btran,
    /// Row-wise pricing of the pivotal row.
    Price,
    /// Forward solve for the entering column.
    Ftran,
    /// Forward solve in the bound-flipping ratio test.
    FtranBfrt,
    /// Forward solve for the steepest edge weight update.
    FtranDse,
}

/// Number of operation types.
pub const NUM_OPERATION_TYPE: usize = 5;

impl OperationType {
    /// Every operation type, in table order.
    pub const ALL: [OperationType; NUM_OPERATION_TYPE] = [
        OperationType::Btran,
        OperationType::Price,
        OperationType::Ftran,
        OperationType::FtranBfrt,
        OperationType::FtranDse,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            OperationType::Btran => 0,
            OperationType::Price => 1,
            OperationType::Ftran => 2,
            OperationType::FtranBfrt => 3,
            OperationType::FtranDse => 4,
        }
    }

    /// Name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            OperationType::Btran => "Btran",
            OperationType::Price => "Price",
            OperationType::Ftran => "Ftran",
            OperationType::FtranBfrt => "Ftran BFRT",
            OperationType::FtranDse => "Ftran_DSE",
        }
    }
}

/// Apply one step of the running average `density ← (1−α)·density + α·local`.
#[inline]
pub fn update_density(alpha: f64, local_density: f64, density: &mut f64) {
    *density = (1.0 - alpha) * *density + alpha * local_density;
}

/// Fraction of nonzeros in a result of dimension `dim`; zero for an empty dimension.
#[inline]
pub fn density_of(count: usize, dim: usize) -> f64 {
    if dim == 0 {
        0.0
    } else {
        (count as f64 / dim as f64).min(1.0)
    }
}

/// Running average density per operation type.
///
/// All densities start at zero, meaning "no data yet".
#[derive(Debug, Clone, Default, Serialize)]
pub struct DensityTracker {
    densities: [f64; NUM_OPERATION_TYPE],
}

impl DensityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all densities to zero.
    pub fn reset(&mut self) {
        self.densities = [0.0; NUM_OPERATION_TYPE];
    }

    /// Fold an observed density into the running average for `op`.
    ///
    /// The observation is clamped to [0, 1]; non-finite observations are ignored.
    pub fn update(&mut self, alpha: f64, op: OperationType, local_density: f64) {
        if !local_density.is_finite() {
            return;
        }
        let local = local_density.clamp(0.0, 1.0);
        let density = &mut self.densities[op.index()];
        update_density(alpha, local, density);
        debug_assert!((0.0..=1.0).contains(density));
    }

    #[inline]
    pub fn get(&self, op: OperationType) -> f64 {
        self.densities[op.index()]
    }

    /// Squared ratio of the DSE density to the largest other per-iteration density.
    ///
    /// Zero when no other density has been observed.
    pub fn costly_dse_measure(&self) -> f64 {
        let denom = self
            .get(OperationType::Price)
            .max(self.get(OperationType::Btran))
            .max(self.get(OperationType::Ftran));
        if denom > 0.0 {
            let ratio = self.get(OperationType::FtranDse) / denom;
            ratio * ratio
        } else {
            0.0
        }
    }
}
