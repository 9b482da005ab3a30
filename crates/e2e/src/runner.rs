//! Scenario runner: drives the browser, queries the API, reconciles

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use catalog_probe_common::{ReconciliationOutcome, Reconciler, SearchQuery};

use crate::client::{CatalogClient, ClientConfig, SearchBackend};
use crate::error::{E2eError, E2eResult};
use crate::extractor::ResultExtractor;
use crate::pages::{self, CatalogPage, HeaderPage};
use crate::playwright::{Action, BrowserSession, Capture, PageDriver, PlaywrightConfig, PlaywrightDriver};
use crate::scenario::{CatalogData, Scenario};
use crate::selectors::SelectorMap;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub query: Option<SearchQuery>,
    pub enforce_order: bool,
    pub outcome: Option<ReconciliationOutcome>,
    pub failure_kind: Option<String>,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<ScenarioResult>, skipped: usize, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len() + skipped,
            passed,
            failed: results.len() - passed,
            skipped,
            duration_ms,
            results,
        }
    }
}

/// Retries per scenario: two on CI, one otherwise
pub fn default_retries() -> u32 {
    if std::env::var_os("CI").is_some() {
        2
    } else {
        1
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    pub client: ClientConfig,
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Selector map JSON; built-in defaults when absent
    pub selectors_path: Option<PathBuf>,
    /// Catalog test data JSON; built-in defaults when absent
    pub test_data_path: Option<PathBuf>,
    /// Upper bound on one scenario attempt
    pub scenario_timeout: Duration,
    pub retries: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            client: ClientConfig::default(),
            scenarios_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            selectors_path: None,
            test_data_path: None,
            scenario_timeout: Duration::from_secs(120),
            retries: default_retries(),
        }
    }
}

/// Runs search scenarios strictly one after another
pub struct TestRunner {
    driver: Arc<dyn PageDriver>,
    backend: Arc<dyn SearchBackend>,
    reconciler: Reconciler,
    selectors: SelectorMap,
    data: CatalogData,
    scenarios_dir: PathBuf,
    output_dir: PathBuf,
    scenario_timeout: Duration,
    retries: u32,
}

impl TestRunner {
    /// Create a runner from explicit collaborators, with default limits
    pub fn new(
        driver: Arc<dyn PageDriver>,
        backend: Arc<dyn SearchBackend>,
        selectors: SelectorMap,
        data: CatalogData,
    ) -> Self {
        let defaults = RunnerConfig::default();
        Self {
            driver,
            backend,
            reconciler: Reconciler::new(data.no_results_text.clone()),
            selectors,
            data,
            scenarios_dir: defaults.scenarios_dir,
            output_dir: defaults.output_dir,
            scenario_timeout: defaults.scenario_timeout,
            retries: defaults.retries,
        }
    }

    /// Create a runner backed by Playwright and the live search API
    pub fn from_config(config: RunnerConfig) -> E2eResult<Self> {
        let driver = PlaywrightDriver::new(config.playwright)?;
        let backend = CatalogClient::new(config.client)?;
        let selectors = SelectorMap::load(config.selectors_path.as_deref())?;
        let data = CatalogData::load(config.test_data_path.as_deref())?;

        Ok(Self::new(Arc::new(driver), Arc::new(backend), selectors, data)
            .with_scenarios_dir(config.scenarios_dir)
            .with_output_dir(config.output_dir)
            .with_timeout(config.scenario_timeout)
            .with_retries(config.retries))
    }

    pub fn with_scenarios_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scenarios_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.scenario_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Run all scenarios in the scenarios directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let scenarios = Scenario::load_all(&self.scenarios_dir)?;
        Ok(self.run_scenarios(&scenarios, 0).await)
    }

    /// Run scenarios carrying `tag`; the rest count as skipped
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let scenarios = Scenario::load_all(&self.scenarios_dir)?;
        let total = scenarios.len();
        let selected: Vec<Scenario> = scenarios.into_iter().filter(|s| s.has_tag(tag)).collect();
        let skipped = total - selected.len();
        Ok(self.run_scenarios(&selected, skipped).await)
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, name: &str) -> E2eResult<ScenarioResult> {
        let scenarios = Scenario::load_all(&self.scenarios_dir)?;
        let scenario = scenarios
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioParse(format!("Scenario not found: {}", name)))?;

        Ok(self.run_scenario(&scenario).await)
    }

    /// Run scenarios in order, never concurrently
    pub async fn run_scenarios(&self, scenarios: &[Scenario], skipped: usize) -> TestSuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite = TestSuiteResult::from_results(results, skipped, start.elapsed().as_millis() as u64);

        info!(
            "Scenario Results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );

        suite
    }

    /// Run one scenario, retrying failed attempts
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut result = ScenarioResult {
            name: scenario.name.clone(),
            success: false,
            attempts: 0,
            started_at,
            duration_ms: 0,
            query: None,
            enforce_order: scenario.enforce_order,
            outcome: None,
            failure_kind: None,
            error: None,
        };

        let resolved = match scenario.resolve(&self.data) {
            Ok(resolved) => resolved,
            Err(e) => {
                result.failure_kind = Some(e.kind().to_string());
                result.error = Some(e.to_string());
                result.duration_ms = start.elapsed().as_millis() as u64;
                return result;
            }
        };
        result.query = Some(resolved.query());

        let max_attempts = self.retries + 1;
        for attempt in 1..=max_attempts {
            result.attempts = attempt;
            debug!("Running scenario '{}' (attempt {}/{})", resolved.name, attempt, max_attempts);

            let outcome = match tokio::time::timeout(self.scenario_timeout, self.attempt(&resolved)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(E2eError::Timeout(format!(
                    "scenario '{}' after {:?}",
                    resolved.name, self.scenario_timeout
                ))),
            };

            match outcome {
                Ok(outcome) => {
                    result.success = true;
                    result.outcome = Some(outcome);
                    result.failure_kind = None;
                    result.error = None;
                    break;
                }
                Err(e) => {
                    if attempt < max_attempts {
                        warn!("'{}' attempt {} failed, retrying: {}", resolved.name, attempt, e);
                    }
                    result.failure_kind = Some(e.kind().to_string());
                    result.error = Some(e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    /// UI actions for a scenario, in the order they must happen
    pub fn actions_for(&self, scenario: &Scenario) -> Vec<Action> {
        let header = HeaderPage::new(&self.selectors);
        let catalog = CatalogPage::new(&self.selectors);

        let mut actions = vec![
            pages::launch(self.data.launch_page_title.as_deref()),
            header.catalog(),
            catalog.search(&scenario.search),
        ];
        if let Some(sort) = &scenario.sort {
            actions.push(catalog.sort_by_rating(sort));
        }
        if let Some(skill) = &scenario.skill {
            actions.push(catalog.skill_filter(&skill.input));
        }
        if let Some(level) = &scenario.level {
            actions.push(catalog.level_filter(&level.label));
        }
        actions
    }

    /// One pass: settle the UI, fetch API results, reconcile
    async fn attempt(&self, scenario: &Scenario) -> E2eResult<ReconciliationOutcome> {
        let mut session = BrowserSession::new(
            self.driver.as_ref(),
            scenario.name.clone(),
            Capture::from(&self.selectors),
        );
        for action in self.actions_for(scenario) {
            session.queue(action);
        }

        let snapshot = session.settle().await?;
        let ui = snapshot.extract_results();
        debug!(
            "ui: {} result(s), empty state visible: {}",
            ui.len(),
            snapshot.is_empty_state_visible()
        );

        let query = scenario.query();
        let api = self.backend.search(&query).await?;

        let outcome = self
            .reconciler
            .reconcile(&query, &ui, &api, scenario.enforce_order)?;
        Ok(outcome)
    }

    /// Write results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.output_dir, results)
    }
}

/// Write results as `test-results.json` under `output_dir`
pub fn write_results(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
