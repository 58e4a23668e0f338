//! Error taxonomy for the training pipeline and prediction service

use thiserror::Error;

/// Errors the system distinguishes at its boundaries.
///
/// An unseen categorical value at serving time is deliberately *not* an
/// error: the fitted encoder maps it to an all-zero block instead.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// Malformed or out-of-constraint request input. Reported to the caller
    /// immediately; the record never reaches the transform or classifier.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Artifact bundle missing, corrupt, or fitted on an incompatible
    /// schema; also raised when fitting is attempted on empty input.
    /// Fatal at service startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Training input missing required columns or empty after filtering.
    /// Fatal for the training run.
    #[error("data quality error: {0}")]
    DataQuality(String),
}
