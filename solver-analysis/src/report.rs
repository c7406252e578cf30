//! Per-iteration report rows.

use std::io::{self, Write};

use crate::density::{DensityTracker, OperationType};
use crate::iteration::{EdgeWeightMode, IterationData};
use crate::settings::MessageLevel;

/// Iterations after the last header before the header is repeated.
pub const HEADER_SPAN: usize = 10;

/// Sentinel returned by [`log10_indicator`] for non-positive values.
pub const LOG10_SENTINEL: i32 = -99;

/// Integer part of `log10(v)`, truncated toward zero.
///
/// Returns [`LOG10_SENTINEL`] unless `v` is positive and finite. Truncation
/// differs from `floor` for values below one: `0.5` maps to `0`, not `-1`.
pub fn log10_indicator(v: f64) -> i32 {
    if v > 0.0 && v.is_finite() {
        v.log10().trunc() as i32
    } else {
        LOG10_SENTINEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReporterState {
    NeedHeader,
    Reporting { header_iteration: usize },
}

/// Writes iteration rows, repeating the column header every few iterations.
#[derive(Debug, Clone)]
pub struct IterationReporter {
    state: ReporterState,
}

impl Default for IterationReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IterationReporter {
    pub fn new() -> Self {
        Self { state: ReporterState::NeedHeader }
    }

    pub fn reset(&mut self) {
        self.state = ReporterState::NeedHeader;
    }

    fn needs_header(&self, iteration: usize) -> bool {
        match self.state {
            ReporterState::NeedHeader => true,
            ReporterState::Reporting { header_iteration } => {
                iteration > header_iteration.saturating_add(HEADER_SPAN)
            }
        }
    }

    /// Write a row for this iteration, preceded by a header when one is due.
    ///
    /// Nothing is written below [`MessageLevel::Detailed`]; extended columns
    /// appear at [`MessageLevel::Full`].
    pub fn report<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        level: MessageLevel,
        data: &IterationData,
        densities: &DensityTracker,
    ) -> io::Result<()> {
        if level < MessageLevel::Detailed {
            return Ok(());
        }
        let extended = level >= MessageLevel::Full;
        if self.needs_header(data.iteration) {
            writeln!(out, "{}", header_line(extended, data.edge_weight_mode))?;
            self.state = ReporterState::Reporting { header_iteration: data.iteration };
        }
        writeln!(out, "{}", row_line(extended, data, densities))
    }
}

/// Column header for iteration rows.
pub fn header_line(extended: bool, mode: EdgeWeightMode) -> String {
    let mut line = String::from(" Iteration Ph        DualObjective");
    if extended {
        line.push_str(
            " Inv       NumCk     LvR     LvC     EnC        DlPr        ThDu        ThPr          Aa",
        );
        line.push_str(" C_Aq R_Ep R_Ap");
        line.push_str(if mode == EdgeWeightMode::SteepestEdge { "  DSE" } else { "     " });
    }
    line
}

/// One iteration row.
///
/// The DSE density column is blank, not zero, when steepest edge is inactive.
pub fn row_line(extended: bool, data: &IterationData, densities: &DensityTracker) -> String {
    let mut line = format!(" {:9} {:2} {:20.10e}", data.iteration, data.phase, data.objective);
    if extended {
        line.push_str(&format!(
            " {:3} {:11.4e} {:7} {:7} {:7} {:11.4e} {:11.4e} {:11.4e} {:11.4e}",
            data.invert_hint.map_or(0, |h| h.code()),
            data.numerical_trouble,
            data.pivotal_row,
            data.leaving,
            data.entering,
            data.primal_delta,
            data.dual_step,
            data.primal_step,
            data.pivot_value,
        ));
        line.push_str(&format!(
            " {:4} {:4} {:4}",
            log10_indicator(densities.get(OperationType::Ftran)),
            log10_indicator(densities.get(OperationType::Btran)),
            log10_indicator(densities.get(OperationType::Price)),
        ));
        if data.edge_weight_mode == EdgeWeightMode::SteepestEdge {
            line.push_str(&format!(" {:4}", log10_indicator(densities.get(OperationType::FtranDse))));
        } else {
            line.push_str("     ");
        }
    }
    line
}
