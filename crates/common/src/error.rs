//! Reconciliation failures

use thiserror::Error;

/// Result type alias using [`ReconcileError`]
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Ways the UI and the API can disagree.
///
/// Every variant carries both normalized lists so a failure can be diagnosed
/// from the report alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Invariant violation for '{query}': {reason}\n  ui:  {ui:?}\n  api: {api:?}")]
    InvariantViolation {
        query: String,
        reason: String,
        ui: Vec<String>,
        api: Vec<String>,
    },

    #[error("Count mismatch for '{query}': UI shows {ui_count} result(s), API has {api_count} unique title(s)\n  ui:  {ui:?}\n  api: {api:?}")]
    CountMismatch {
        query: String,
        ui_count: usize,
        api_count: usize,
        ui: Vec<String>,
        api: Vec<String>,
    },

    #[error("Content mismatch for '{query}': UI result(s) {unmatched:?} not found in API results\n  ui:  {ui:?}\n  api: {api:?}")]
    ContentMismatch {
        query: String,
        unmatched: Vec<String>,
        ui: Vec<String>,
        api: Vec<String>,
    },

    #[error("Order mismatch for '{query}' at position(s) {positions:?}\n  ui:  {ui:?}\n  api: {api:?}")]
    OrderMismatch {
        query: String,
        /// 1-based positions that disagree
        positions: Vec<usize>,
        ui: Vec<String>,
        api: Vec<String>,
    },
}

impl ReconcileError {
    /// Short name of the failure class, for reports
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::InvariantViolation { .. } => "invariant_violation",
            ReconcileError::CountMismatch { .. } => "count_mismatch",
            ReconcileError::ContentMismatch { .. } => "content_mismatch",
            ReconcileError::OrderMismatch { .. } => "order_mismatch",
        }
    }
}
