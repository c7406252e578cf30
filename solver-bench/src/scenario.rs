//! Synthetic iteration streams with controllable sparsity and weight accuracy.

use clap::ValueEnum;
use solver_analysis::density::density_of;
use solver_analysis::{InvertHint, PriceVariant};
use sprs::CsVec;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Every solve stays sparse and the DSE weights stay accurate.
    Sparse,
    /// The DSE forward solve is far denser than the other solves.
    DenseDse,
    /// Updated DSE weights drift far from their recomputed values.
    InaccurateWeights,
    /// Sparse for the first half, then the DSE solve fills in.
    Mixed,
}

/// Simple LCG random number generator.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1].
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((self.state >> 33) as f64) / (u32::MAX as f64)
    }

    pub fn below(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }
}

/// Results of the sparse operations of one synthetic iteration.
pub struct SyntheticIteration {
    pub btran: CsVec<f64>,
    pub price: CsVec<f64>,
    pub ftran: CsVec<f64>,
    pub ftran_bfrt: CsVec<f64>,
    pub ftran_dse: CsVec<f64>,
    pub weights: Option<(f64, f64)>,
    pub price_variant: PriceVariant,
    pub invert_hint: Option<InvertHint>,
    pub primal_step: f64,
    pub dual_step: f64,
    pub pivotal_row: usize,
    pub entering: usize,
}

/// Generates one synthetic iteration after another.
pub struct SyntheticSolve {
    scenario: Scenario,
    num_row: usize,
    num_col: usize,
    num_iter: usize,
    rng: Lcg,
}

impl SyntheticSolve {
    pub fn new(scenario: Scenario, num_row: usize, num_col: usize, num_iter: usize, seed: u64) -> Self {
        Self { scenario, num_row, num_col, num_iter, rng: Lcg::new(seed) }
    }

    fn random_vector(&mut self, dim: usize, density: f64) -> CsVec<f64> {
        let mut indices = Vec::new();
        let mut data = Vec::new();
        for i in 0..dim {
            if self.rng.next_f64() < density {
                indices.push(i);
                data.push(2.0 * self.rng.next_f64() - 1.0);
            }
        }
        CsVec::new(dim, indices, data)
    }

    /// Target density of the DSE forward solve at `iteration`.
    fn dse_density(&self, iteration: usize) -> f64 {
        match self.scenario {
            Scenario::Sparse | Scenario::InaccurateWeights => 0.02,
            Scenario::DenseDse => 0.6,
            Scenario::Mixed if iteration < self.num_iter / 2 => 0.02,
            Scenario::Mixed => 0.6,
        }
    }

    /// Ratio of updated to computed weight.
    fn weight_ratio(&mut self) -> f64 {
        let spread = match self.scenario {
            Scenario::InaccurateWeights => 24.0,
            _ => 0.5,
        };
        let log_ratio = spread * (2.0 * self.rng.next_f64() - 1.0);
        log_ratio.exp()
    }

    pub fn iteration(&mut self, iteration: usize, steepest_edge: bool) -> SyntheticIteration {
        let (num_row, num_col) = (self.num_row, self.num_col);
        let base = 0.002 + 0.006 * self.rng.next_f64();

        let btran = self.random_vector(num_row, base);
        let price = self.random_vector(num_col, base);
        let ftran = self.random_vector(num_row, base);
        let ftran_bfrt = self.random_vector(num_row, 0.5 * base);
        let ftran_dse = if steepest_edge {
            let density = self.dse_density(iteration);
            self.random_vector(num_row, density)
        } else {
            CsVec::empty(num_row)
        };

        let weights = if steepest_edge && self.rng.next_f64() < 0.2 {
            let computed = 1.0 + 10.0 * self.rng.next_f64();
            Some((computed, computed * self.weight_ratio()))
        } else {
            None
        };

        let btran_density = density_of(btran.nnz(), num_row);
        let price_variant = if btran_density > 0.1 {
            PriceVariant::Col
        } else if btran_density < 0.01 {
            PriceVariant::RowUltra
        } else if self.rng.next_f64() < 0.5 {
            PriceVariant::RowWithSwitch
        } else {
            PriceVariant::Row
        };

        let invert_hint = if iteration % 100 == 0 {
            Some(InvertHint::UpdateLimitReached)
        } else if self.rng.next_f64() < 0.002 {
            Some(InvertHint::PossiblySingularBasis)
        } else {
            None
        };

        let primal_step = if self.rng.next_f64() < 0.1 { 0.0 } else { self.rng.next_f64() };
        let dual_step = if self.rng.next_f64() < 0.05 { 0.0 } else { self.rng.next_f64() };

        SyntheticIteration {
            btran,
            price,
            ftran,
            ftran_bfrt,
            ftran_dse,
            weights,
            price_variant,
            invert_hint,
            primal_step,
            dual_step,
            pivotal_row: self.rng.below(num_row),
            entering: self.rng.below(num_col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_range_and_determinism() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..1000 {
            let x = a.next_f64();
            assert!((0.0..=1.0).contains(&x));
            assert_eq!(x, b.next_f64());
        }
        assert!(a.below(5) < 5);
    }

    #[test]
    fn test_devex_iteration_has_empty_dse_solve() {
        let mut s = SyntheticSolve::new(Scenario::DenseDse, 50, 80, 100, 1);
        let it = s.iteration(1, false);
        assert_eq!(it.ftran_dse.nnz(), 0);
        assert!(it.weights.is_none());
        assert_eq!(it.price.dim(), 80);
    }

    #[test]
    fn test_mixed_fills_in_late() {
        let s = SyntheticSolve::new(Scenario::Mixed, 50, 80, 100, 1);
        assert!(s.dse_density(10) < s.dse_density(90));
    }
}
