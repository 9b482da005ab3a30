//! catalog-probe E2E runner
//!
//! Drives the catalog site with Playwright and checks what it renders
//! against the catalog search API:
//! - Page objects turn user-level interactions into browser steps
//! - Playwright runs each scenario in a fresh browser context
//! - The search client asks the API the same question
//! - The reconciler decides whether both answers agree
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TestRunner (one scenario at a time)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML) ──► actions_for() ──► BrowserSession       │
//! │                                          │ settle()         │
//! │                                          ▼                  │
//! │                                   PageSnapshot (UI titles)  │
//! │  Scenario::query() ──► SearchBackend::search() ──► API hits │
//! │                                          │                  │
//! │                      Reconciler::reconcile(query, ui, api)  │
//! │                                          ▼                  │
//! │                               ReconciliationOutcome         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod error;
pub mod extractor;
pub mod pages;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod selectors;

pub use client::{CatalogClient, SearchBackend};
pub use error::{E2eError, E2eResult};
pub use extractor::{PageSnapshot, ResultExtractor};
pub use runner::TestRunner;
pub use scenario::{CatalogData, Scenario};
