//! catalog-probe common library
//!
//! Search result types and the reconciler that cross-checks the results a
//! catalog page renders against the hits returned by the search API.

pub mod error;
pub mod normalize;
pub mod reconcile;
pub mod types;

// Re-export commonly used types
pub use error::{ReconcileError, Result};
pub use normalize::{normalize_text, normalize_title, strip_markup, titles_match};
pub use reconcile::Reconciler;
pub use types::*;

/// catalog-probe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
