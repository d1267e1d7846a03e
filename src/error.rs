use thiserror::Error;

/// Errors surfaced to callers of the crate.
///
/// The calculation engine itself never fails: degenerate numbers fall back to
/// straight-line estimates and over-amortization is clamped. These variants
/// cover caller-side validation, loading terms and exporting reports.
#[derive(Debug, Error)]
pub enum AmortizationError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AmortizationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AmortizationError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
