//! End-to-end tests driving the analysis as a simplex loop would.

use solver_analysis::{
    AnalysisSettings, EdgeWeightMode, EdgeWeightStrategy, InvertHint, IterationData, MessageLevel,
    OperationType, PriceVariant, SimplexAnalysis, TraceOverflow,
};

const NUM_ROW: usize = 200;
const NUM_COL: usize = 300;

/// Feed one iteration whose DSE solve is `dse_density` dense and the others 1% dense.
fn iterate(analysis: &mut SimplexAnalysis, iteration: usize, mode: EdgeWeightMode, dse_density: f64) -> IterationData {
    for op in [OperationType::Btran, OperationType::Price, OperationType::Ftran] {
        analysis.update_density(op, 0.01);
    }
    if mode == EdgeWeightMode::SteepestEdge {
        analysis.update_density(OperationType::FtranDse, dse_density);
    }
    analysis.record_price(PriceVariant::Row);
    let data = IterationData {
        iteration,
        phase: 2,
        objective: -(iteration as f64),
        primal_step: 0.5,
        dual_step: 0.25,
        invert_hint: (iteration % 50 == 0).then_some(InvertHint::UpdateLimitReached),
        edge_weight_mode: mode,
        ..Default::default()
    };
    analysis.record_iteration(&data);
    data
}

#[test]
fn test_dense_dse_switches_to_devex_once() {
    let settings = AnalysisSettings::default().with_message_level(MessageLevel::Detailed);
    let mut analysis = SimplexAnalysis::setup(NUM_ROW, NUM_COL, settings).expect("setup failed");

    let mut mode = EdgeWeightMode::SteepestEdge;
    let mut switched_at = None;
    let mut out = Vec::new();
    for it in 1..=200 {
        let data = iterate(&mut analysis, it, mode, 0.9);
        if mode == EdgeWeightMode::SteepestEdge && analysis.should_switch_to_devex() {
            mode = EdgeWeightMode::Devex;
            switched_at = Some(it);
        }
        analysis.iteration_report(&mut out, &data).unwrap();
    }

    // 0.1 * (200 + 300) = 50 iterations must pass first.
    let switched_at = switched_at.expect("no switch recommended");
    assert_eq!(switched_at, 51);

    let summary = analysis.summary();
    assert_eq!(summary.iterations, 200);
    let share = |m: EdgeWeightMode| {
        summary.edge_weight_modes.iter().find(|s| s.mode == m).map(|s| s.iterations).unwrap()
    };
    assert_eq!(share(EdgeWeightMode::SteepestEdge), 51);
    assert_eq!(share(EdgeWeightMode::Devex), 149);
    assert!(summary.costly_dse_iterations > 0);
    assert!(summary.costly_dse_iterations <= 51);
    assert_eq!(summary.num_invert, 4);
    assert_eq!(summary.num_price, 200);

    let text = String::from_utf8(out).unwrap();
    let headers = text.lines().filter(|l| l.starts_with(" Iteration")).count();
    let rows = text.lines().count() - headers;
    assert_eq!(rows, 200);
    // First header at 1, then at 12, 23, ... every 11 iterations.
    assert_eq!(headers, 19);
}

#[test]
fn test_switch_disabled_never_recommends() {
    let settings = AnalysisSettings::default()
        .with_strategy(EdgeWeightStrategy::SteepestEdge)
        .with_log_error_threshold(0.0);
    let mut analysis = SimplexAnalysis::setup(NUM_ROW, NUM_COL, settings).unwrap();
    for it in 1..=300 {
        iterate(&mut analysis, it, EdgeWeightMode::SteepestEdge, 0.9);
        analysis.record_weight(1.0, 50.0);
        assert!(!analysis.should_switch_to_devex());
    }
}

#[test]
fn test_sparse_dse_keeps_steepest_edge() {
    let mut analysis = SimplexAnalysis::setup(NUM_ROW, NUM_COL, AnalysisSettings::default()).unwrap();
    for it in 1..=300 {
        iterate(&mut analysis, it, EdgeWeightMode::SteepestEdge, 0.02);
        analysis.record_weight(1.0, 1.1);
        assert!(!analysis.should_switch_to_devex());
    }
    assert_eq!(analysis.costly().num_costly, 0);
    assert_eq!(analysis.weight_stats().num_check, 300);
    assert_eq!(analysis.weight_stats().num_reject, 0);
}

#[test]
fn test_summary_text_and_speed_table() {
    let settings = AnalysisSettings::default()
        .with_message_level(MessageLevel::Full)
        .with_trace(4, TraceOverflow::DropOldest)
        .with_trace_interval(25);
    let mut analysis = SimplexAnalysis::setup(NUM_ROW, NUM_COL, settings).unwrap();
    for it in 1..=200 {
        analysis.operation_record_before(OperationType::Ftran, 0.01, 0.01);
        analysis.operation_record_after(OperationType::Ftran, 4);
        iterate(&mut analysis, it, EdgeWeightMode::SteepestEdge, 0.02);
    }

    assert_eq!(analysis.trace().len(), 4);
    assert_eq!(analysis.trace().capacity(), 4);
    assert_eq!(analysis.trace().num_evicted(), 5);

    let mut out = Vec::new();
    analysis.summary_report(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Analysis of 200 iterations (1 to 200)"));
    assert!(text.contains("DSE for          200 (100%) iterations"));
    assert!(text.contains("Ftran     performed 200 times"));
    assert!(text.contains("Invert operations due to update limit reached"));
    assert!(text.contains("Iteration speed analysis"));
    assert!(text.contains("(5 earlier trace records dropped)"));

    let summary = analysis.summary();
    let ftran = summary.operations.iter().find(|o| o.op == OperationType::Ftran).unwrap();
    assert_eq!(ftran.hyper_ops_percent, 100);
    assert!((ftran.mean_density - 0.02).abs() < 1e-9);
    assert_eq!(summary.speed.len(), 4);
}

#[test]
fn test_summary_serializes_to_json() {
    let mut analysis = SimplexAnalysis::setup(NUM_ROW, NUM_COL, AnalysisSettings::default()).unwrap();
    for it in 1..=10 {
        iterate(&mut analysis, it, EdgeWeightMode::SteepestEdge, 0.1);
    }
    let json = serde_json::to_value(analysis.summary()).unwrap();
    assert_eq!(json["iterations"], 10);
    assert_eq!(json["operations"].as_array().map(|a| a.len()), Some(5));
    assert!(json["costly_dse_frequency"].as_f64().is_some());
}

#[test]
fn test_empty_problem_degrades_to_zero_densities() {
    let settings = AnalysisSettings::default().with_message_level(MessageLevel::Full);
    let mut analysis = SimplexAnalysis::setup(0, 10, settings).expect("empty problem rejected");

    let mut out = Vec::new();
    for it in 1..=3 {
        for op in OperationType::ALL {
            analysis.operation_record_before(op, 0.0, 0.0);
            analysis.operation_record_after(op, 0);
            analysis.update_density(op, 0.0);
        }
        let data = IterationData { iteration: it, phase: 2, ..Default::default() };
        analysis.record_iteration(&data);
        assert!(!analysis.should_switch_to_devex());
        analysis.iteration_report(&mut out, &data).unwrap();
    }

    let summary = analysis.summary();
    assert_eq!(summary.iterations, 3);
    for op in &summary.operations {
        assert_eq!(op.calls, 3);
        assert_eq!(op.mean_density, 0.0);
        assert_eq!(op.max_density, 0.0);
    }
    for op in OperationType::ALL {
        assert_eq!(analysis.densities().get(op), 0.0);
    }
    let text = String::from_utf8(out).unwrap();
    assert!(text.lines().skip(1).all(|l| l.trim_end().ends_with("-99")));
    analysis.summary_report(&mut Vec::<u8>::new()).unwrap();
}

#[test]
fn test_initialise_restarts_window() {
    let mut analysis = SimplexAnalysis::setup(NUM_ROW, NUM_COL, AnalysisSettings::default()).unwrap();
    for it in 1..=20 {
        iterate(&mut analysis, it, EdgeWeightMode::SteepestEdge, 0.9);
    }
    analysis.initialise(20);
    assert_eq!(analysis.iterations(), 0);
    assert_eq!(analysis.costly().num_costly, 0);
    assert_eq!(analysis.densities().get(OperationType::FtranDse), 0.0);
    let summary = analysis.summary();
    assert_eq!(summary.iterations, 0);
    assert!(summary.to_string().trim_start().starts_with("Analysis of 0 iterations"));
}
