//! Pricing-strategy analysis for the dual simplex method.
//!
//! This crate gathers the online statistics a dual simplex solver needs to
//! choose its pricing rule and to explain its own performance:
//!
//! - **Running densities** of the sparse solves performed every iteration
//!   (BTRAN, PRICE, FTRAN, FTRAN_BFRT, FTRAN_DSE)
//! - **Steepest edge weight accuracy**: how often, and by how much, updated
//!   dual steepest edge weights differ from recomputed ones
//! - **Devex switch decision**: a one-way recommendation to abandon steepest
//!   edge when it is too costly or too inaccurate
//! - **Instrumentation**: iteration rows, hyper-sparsity counters, a bounded
//!   trace of iteration snapshots and an end-of-solve summary
//!
//! It performs no pivoting or factorization itself. All state lives in one
//! [`SimplexAnalysis`] per solve; nothing is shared between solves.
//!
//! # Example
//!
//! ```ignore
//! use solver_analysis::{AnalysisSettings, IterationData, OperationType, SimplexAnalysis};
//!
//! let mut analysis = SimplexAnalysis::setup(num_row, num_col, AnalysisSettings::default())?;
//! analysis.update_density(OperationType::FtranDse, 0.3);
//! analysis.record_iteration(&IterationData { iteration: 1, ..Default::default() });
//! if analysis.should_switch_to_devex() {
//!     // switch pricing, never back
//! }
//! ```

#![warn(clippy::all)]

pub mod analysis;
pub mod context;
pub mod density;
pub mod error;
pub mod iteration;
pub mod recorder;
pub mod report;
pub mod settings;
pub mod summary;
pub mod switch;
pub mod trace;
pub mod weight;

// Re-export main types
pub use analysis::SimplexAnalysis;
pub use context::SolveContext;
pub use density::{update_density, DensityTracker, OperationType};
pub use error::{AnalysisError, AnalysisResult};
pub use iteration::{EdgeWeightMode, InvertHint, IterationData, PriceVariant};
pub use recorder::{OperationRecord, OperationRecorder};
pub use report::{log10_indicator, IterationReporter};
pub use settings::{AnalysisSettings, EdgeWeightStrategy, MessageLevel, TraceOverflow};
pub use summary::SummaryReport;
pub use switch::{switch_to_devex, CostlyDseTracker, SwitchReason};
pub use trace::{Clock, InstantClock, TraceAppend, TraceBuffer, TraceRecord};
pub use weight::{WeightAccuracyMonitor, WeightErrorBranch, WeightErrorStats};
