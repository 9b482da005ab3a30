//! Error types for E2E runs

use catalog_probe_common::ReconcileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm i -D @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Action failed: {action} - {reason}")]
    ActionFailed { action: String, reason: String },

    #[error("Search API returned {status} for {url}: {body}")]
    Transport {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Short name of the failure class, for reports
    pub fn kind(&self) -> &'static str {
        match self {
            E2eError::PlaywrightNotFound | E2eError::Playwright(_) => "playwright",
            E2eError::ActionFailed { .. } => "action_failed",
            E2eError::Transport { .. } | E2eError::Http(_) => "transport",
            E2eError::ScenarioParse(_) | E2eError::Yaml(_) => "scenario",
            E2eError::Reconcile(e) => e.kind(),
            E2eError::Timeout(_) => "timeout",
            E2eError::Io(_) | E2eError::Json(_) => "io",
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
