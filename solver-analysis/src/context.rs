//! Per-solve problem dimensions and validated settings.

use crate::error::AnalysisResult;
use crate::settings::AnalysisSettings;

/// Dimensions and configuration fixed for the lifetime of one solve.
#[derive(Debug, Clone)]
pub struct SolveContext {
    num_row: usize,
    num_col: usize,
    settings: AnalysisSettings,
}

impl SolveContext {
    /// Validate the settings and capture the problem size.
    ///
    /// Empty problems are accepted; their densities are all zero.
    pub fn setup(num_row: usize, num_col: usize, settings: AnalysisSettings) -> AnalysisResult<Self> {
        settings.validate()?;
        Ok(Self { num_row, num_col, settings })
    }

    #[inline]
    pub fn num_row(&self) -> usize {
        self.num_row
    }

    #[inline]
    pub fn num_col(&self) -> usize {
        self.num_col
    }

    /// Rows plus columns: the number of structural and logical variables.
    #[inline]
    pub fn num_tot(&self) -> usize {
        self.num_row + self.num_col
    }

    #[inline]
    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Shared smoothing factor of every running average.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.settings.running_average_multiplier
    }
}
