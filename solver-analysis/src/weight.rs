//! Accuracy of updated dual steepest edge weights.
//!
//! Each time the solver recomputes a DSE weight from scratch it can compare
//! it with the weight obtained by updating. The ratio between the two is
//! classified as LOW (updated weight too small) or HIGH (updated weight
//! correct or too large), and running averages of how often each branch is
//! badly wrong, and of its log error, feed the Devex switch decision.

use serde::Serialize;

use crate::density::update_density;

/// Which side of the computed weight the updated weight fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeightErrorBranch {
    /// Updated weight below the computed weight.
    Low,
    /// Updated weight at or above the computed weight.
    High,
}

/// Classify a (computed, updated) weight pair and return the error ratio (≥ 1).
///
/// Returns `None` unless both weights are positive and finite.
pub fn classify(computed: f64, updated: f64) -> Option<(WeightErrorBranch, f64)> {
    let usable = |w: f64| w.is_finite() && w > 0.0;
    if !usable(computed) || !usable(updated) {
        return None;
    }
    if updated < computed {
        Some((WeightErrorBranch::Low, computed / updated))
    } else {
        Some((WeightErrorBranch::High, updated / computed))
    }
}

/// Weight error statistics accumulated over one solve.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeightErrorStats {
    pub num_check: u64,
    pub num_reject: u64,
    pub num_wrong_low: u64,
    pub num_wrong_high: u64,

    pub average_frequency_low: f64,
    pub average_frequency_high: f64,
    pub average_log_low_error: f64,
    pub average_log_high_error: f64,

    pub max_average_frequency_low: f64,
    pub max_average_frequency_high: f64,
    pub max_sum_average_frequency: f64,
    pub max_average_log_low_error: f64,
    pub max_average_log_high_error: f64,
    pub max_sum_average_log_error: f64,
}

impl WeightErrorStats {
    /// Sum of the low and high average log errors.
    #[inline]
    pub fn log_error_measure(&self) -> f64 {
        self.average_log_low_error + self.average_log_high_error
    }
}

/// Monitors the accuracy of updated DSE weights.
#[derive(Debug, Clone)]
pub struct WeightAccuracyMonitor {
    alpha: f64,
    accept_threshold: f64,
    error_threshold: f64,
    report_errors: bool,
    stats: WeightErrorStats,
}

impl WeightAccuracyMonitor {
    pub fn new(alpha: f64, accept_threshold: f64, error_threshold: f64) -> Self {
        Self {
            alpha,
            accept_threshold,
            error_threshold,
            report_errors: false,
            stats: WeightErrorStats::default(),
        }
    }

    /// Log every observation whose error exceeds half the error threshold.
    pub fn with_error_reporting(mut self, report: bool) -> Self {
        self.report_errors = report;
        self
    }

    pub fn reset(&mut self) {
        self.stats = WeightErrorStats::default();
    }

    pub fn stats(&self) -> &WeightErrorStats {
        &self.stats
    }

    /// Record one comparison of a computed and an updated weight.
    ///
    /// Returns whether the updated weight is accepted. Only the log error
    /// average of the realised branch moves; the other keeps its value.
    pub fn record(&mut self, computed: f64, updated: f64) -> bool {
        let st = &mut self.stats;
        st.num_check += 1;

        let Some((branch, error)) = classify(computed, updated) else {
            st.num_reject += 1;
            log::warn!(
                "DSE weight check {} skipped: computed {} updated {}",
                st.num_check,
                computed,
                updated
            );
            return false;
        };

        let accepted = updated >= self.accept_threshold * computed;
        if !accepted {
            st.num_reject += 1;
        }

        let wrong = error > self.error_threshold;
        let (low_flag, high_flag) = match branch {
            WeightErrorBranch::Low => {
                update_density(self.alpha, error.ln(), &mut st.average_log_low_error);
                (wrong as u8 as f64, 0.0)
            }
            WeightErrorBranch::High => {
                update_density(self.alpha, error.ln(), &mut st.average_log_high_error);
                (0.0, wrong as u8 as f64)
            }
        };
        if wrong {
            match branch {
                WeightErrorBranch::Low => st.num_wrong_low += 1,
                WeightErrorBranch::High => st.num_wrong_high += 1,
            }
        }

        update_density(self.alpha, low_flag, &mut st.average_frequency_low);
        update_density(self.alpha, high_flag, &mut st.average_frequency_high);

        st.max_average_frequency_low = st.max_average_frequency_low.max(st.average_frequency_low);
        st.max_average_frequency_high = st.max_average_frequency_high.max(st.average_frequency_high);
        st.max_sum_average_frequency = st
            .max_sum_average_frequency
            .max(st.average_frequency_low + st.average_frequency_high);
        st.max_average_log_low_error = st.max_average_log_low_error.max(st.average_log_low_error);
        st.max_average_log_high_error = st.max_average_log_high_error.max(st.average_log_high_error);
        st.max_sum_average_log_error = st.max_sum_average_log_error.max(st.log_error_measure());

        if self.report_errors && error > 0.5 * self.error_threshold {
            log::debug!(
                "DSE weight check {:8} (rejects {:6}): accept={} computed {:10.4e} updated {:10.4e} \
                 error {:10.4e} {:?} | low (fq {:10.4e}, er {:10.4e}) high (fq {:10.4e}, er {:10.4e})",
                st.num_check,
                st.num_reject,
                accepted,
                computed,
                updated,
                error,
                branch,
                st.average_frequency_low,
                st.average_log_low_error,
                st.average_frequency_high,
                st.average_log_high_error,
            );
        }

        accepted
    }
}
