//! Error types for the simplex analysis core.

use thiserror::Error;

/// Errors that can occur while setting up an analysis.
///
/// Per-iteration recording never fails; only construction validates input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Settings validation failed
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for analysis setup.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
