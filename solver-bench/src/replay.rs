//! Drives the analysis with a synthetic iteration stream, as a dual simplex loop would.

use std::io::Write;

use anyhow::{Context, Result};
use solver_analysis::density::density_of;
use solver_analysis::{
    AnalysisSettings, EdgeWeightMode, IterationData, OperationType, SimplexAnalysis, SummaryReport,
};

use crate::scenario::{Scenario, SyntheticSolve};

/// What happened during a replay.
pub struct ReplayOutcome {
    pub summary: SummaryReport,
    /// Iteration at which the analysis recommended Devex, if it did.
    pub switched_at: Option<usize>,
}

pub struct ReplayConfig {
    pub scenario: Scenario,
    pub num_row: usize,
    pub num_col: usize,
    pub num_iter: usize,
    pub seed: u64,
}

pub fn replay<W: Write>(config: &ReplayConfig, settings: AnalysisSettings, out: &mut W) -> Result<ReplayOutcome> {
    let mut analysis = SimplexAnalysis::setup(config.num_row, config.num_col, settings)
        .context("Failed to set up analysis")?;
    let mut solve = SyntheticSolve::new(config.scenario, config.num_row, config.num_col, config.num_iter, config.seed);

    let mut mode = analysis.edge_weight_mode();
    let mut switched_at = None;
    let mut objective = 0.0;

    for iteration in 1..=config.num_iter {
        let steepest_edge = mode == EdgeWeightMode::SteepestEdge;
        let it = solve.iteration(iteration, steepest_edge);

        // BTRAN starts from a unit vector.
        let historical = analysis.densities().get(OperationType::Btran);
        analysis.operation_record_before(OperationType::Btran, density_of(1, config.num_row), historical);
        analysis.operation_record_after_vector(OperationType::Btran, it.btran.view());
        analysis.update_density(OperationType::Btran, density_of(it.btran.nnz(), config.num_row));

        let historical = analysis.densities().get(OperationType::Price);
        analysis.operation_record_before_vector(OperationType::Price, it.btran.view(), historical);
        analysis.operation_record_after_vector(OperationType::Price, it.price.view());
        analysis.update_density(OperationType::Price, density_of(it.price.nnz(), config.num_col));
        analysis.record_price(it.price_variant);

        for (op, result) in [
            (OperationType::Ftran, &it.ftran),
            (OperationType::FtranBfrt, &it.ftran_bfrt),
        ] {
            let historical = analysis.densities().get(op);
            analysis.operation_record_before(op, density_of(1, config.num_row), historical);
            analysis.operation_record_after_vector(op, result.view());
            analysis.update_density(op, density_of(result.nnz(), config.num_row));
        }

        if steepest_edge {
            let historical = analysis.densities().get(OperationType::FtranDse);
            analysis.operation_record_before_vector(OperationType::FtranDse, it.btran.view(), historical);
            analysis.operation_record_after_vector(OperationType::FtranDse, it.ftran_dse.view());
            analysis.update_density(OperationType::FtranDse, density_of(it.ftran_dse.nnz(), config.num_row));
            if let Some((computed, updated)) = it.weights {
                analysis.record_weight(computed, updated);
            }
        }

        objective += it.primal_step * it.dual_step;
        let data = IterationData {
            iteration,
            phase: 2,
            objective,
            invert_hint: it.invert_hint,
            numerical_trouble: 0.0,
            pivotal_row: it.pivotal_row as i64,
            leaving: it.pivotal_row as i64,
            entering: (config.num_row + it.entering) as i64,
            primal_delta: it.primal_step,
            primal_step: it.primal_step,
            dual_step: it.dual_step,
            pivot_value: 1.0,
            edge_weight_mode: mode,
        };
        analysis.record_iteration(&data);

        if steepest_edge && analysis.apply_devex_switch() {
            mode = EdgeWeightMode::Devex;
            switched_at = Some(iteration);
        }

        analysis
            .iteration_report(out, &data)
            .context("Failed to write iteration report")?;
    }

    analysis.summary_report(out).context("Failed to write summary")?;
    Ok(ReplayOutcome { summary: analysis.summary(), switched_at })
}
