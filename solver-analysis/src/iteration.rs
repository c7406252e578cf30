//! Per-iteration data supplied by the simplex loop.

use serde::Serialize;

/// Active dual edge weight mode. Owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum EdgeWeightMode {
    Dantzig,
    Devex,
    #[default]
    SteepestEdge,
}

impl EdgeWeightMode {
    pub const ALL: [EdgeWeightMode; 3] =
        [EdgeWeightMode::SteepestEdge, EdgeWeightMode::Devex, EdgeWeightMode::Dantzig];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            EdgeWeightMode::Dantzig => 0,
            EdgeWeightMode::Devex => 1,
            EdgeWeightMode::SteepestEdge => 2,
        }
    }

    /// Three-letter tag used in reports.
    pub fn tag(self) -> &'static str {
        match self {
            EdgeWeightMode::Dantzig => "Dan",
            EdgeWeightMode::Devex => "Dvx",
            EdgeWeightMode::SteepestEdge => "DSE",
        }
    }
}

/// Reason the basis was reinverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InvertHint {
    UpdateLimitReached,
    SyntheticClockSaysInvert,
    PossiblyOptimal,
    PossiblyPrimalUnbounded,
    PossiblyDualUnbounded,
    PossiblySingularBasis,
    PrimalInfeasibleInPrimalSimplex,
}

/// Number of invert hints.
pub const NUM_INVERT_HINT: usize = 7;

impl InvertHint {
    pub const ALL: [InvertHint; NUM_INVERT_HINT] = [
        InvertHint::UpdateLimitReached,
        InvertHint::SyntheticClockSaysInvert,
        InvertHint::PossiblyOptimal,
        InvertHint::PossiblyPrimalUnbounded,
        InvertHint::PossiblyDualUnbounded,
        InvertHint::PossiblySingularBasis,
        InvertHint::PrimalInfeasibleInPrimalSimplex,
    ];

    /// Code shown in the iteration report; zero means no invert.
    pub fn code(self) -> i32 {
        match self {
            InvertHint::UpdateLimitReached => 1,
            InvertHint::SyntheticClockSaysInvert => 2,
            InvertHint::PossiblyOptimal => 3,
            InvertHint::PossiblyPrimalUnbounded => 4,
            InvertHint::PossiblyDualUnbounded => 5,
            InvertHint::PossiblySingularBasis => 6,
            InvertHint::PrimalInfeasibleInPrimalSimplex => 7,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.code() as usize - 1
    }

    pub fn description(self) -> &'static str {
        match self {
            InvertHint::UpdateLimitReached => "update limit reached",
            InvertHint::SyntheticClockSaysInvert => "pseudo-clock",
            InvertHint::PossiblyOptimal => "possibly optimal",
            InvertHint::PossiblyPrimalUnbounded => "possibly primal unbounded",
            InvertHint::PossiblyDualUnbounded => "possibly dual unbounded",
            InvertHint::PossiblySingularBasis => "possibly singular basis",
            InvertHint::PrimalInfeasibleInPrimalSimplex => "primal infeasible in primal simplex",
        }
    }
}

/// Pricing variant used to form the pivotal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriceVariant {
    Col,
    Row,
    RowWithSwitch,
    RowUltra,
}

impl PriceVariant {
    pub const ALL: [PriceVariant; 4] =
        [PriceVariant::Col, PriceVariant::Row, PriceVariant::RowWithSwitch, PriceVariant::RowUltra];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            PriceVariant::Col => 0,
            PriceVariant::Row => 1,
            PriceVariant::RowWithSwitch => 2,
            PriceVariant::RowUltra => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceVariant::Col => "Col Price",
            PriceVariant::Row => "Row Price",
            PriceVariant::RowWithSwitch => "Row PriceWSw",
            PriceVariant::RowUltra => "Row PriceUltra",
        }
    }
}

/// Snapshot of one simplex iteration, filled in by the caller.
#[derive(Debug, Clone, Default)]
pub struct IterationData {
    /// Simplex iteration count.
    pub iteration: usize,
    /// Solve phase (1 or 2).
    pub phase: i32,
    /// Current dual objective value.
    pub objective: f64,
    /// Cause of a reinversion this iteration, if any.
    pub invert_hint: Option<InvertHint>,
    /// Scalar measure of numerical trouble in the update.
    pub numerical_trouble: f64,
    /// Pivotal row, leaving and entering variables (-1 when none).
    pub pivotal_row: i64,
    pub leaving: i64,
    pub entering: i64,
    /// Primal infeasibility of the leaving variable.
    pub primal_delta: f64,
    pub primal_step: f64,
    pub dual_step: f64,
    /// Pivot value computed from the entering column.
    pub pivot_value: f64,
    /// Edge weight mode active this iteration.
    pub edge_weight_mode: EdgeWeightMode,
}

impl IterationData {
    /// Zero primal step.
    pub fn is_primal_degenerate(&self) -> bool {
        self.primal_step == 0.0
    }

    /// Zero dual step.
    pub fn is_dual_degenerate(&self) -> bool {
        self.dual_step == 0.0
    }
}
