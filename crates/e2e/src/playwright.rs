//! Playwright browser automation
//!
//! Page objects queue [`Action`]s on a [`BrowserSession`]. Settling the
//! session renders every queued action into one Node script, runs it in a
//! fresh browser context through Playwright, and captures a [`PageSnapshot`]
//! of the result list once the last action has completed.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::extractor::PageSnapshot;
use crate::selectors::SelectorMap;

/// Stdout prefix of the captured page state
pub const SNAPSHOT_MARKER: &str = "__CATALOG_PROBE_SNAPSHOT__";

/// Stderr prefix of a failed action report
pub const FAILURE_MARKER: &str = "__CATALOG_PROBE_FAILURE__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Some(Browser::Chromium),
            "firefox" => Some(Browser::Firefox),
            "webkit" | "safari" => Some(Browser::Webkit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    Load,
    #[default]
    DomContentLoaded,
    NetworkIdle,
}

impl LoadState {
    fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// A single browser instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserStep {
    /// Navigate to a URL (relative to base)
    Navigate { url: String },
    WaitForLoadState(LoadState),
    Click { selector: String, force: bool },
    Fill { selector: String, value: String },
    /// Type text key by key
    Type { selector: String, text: String },
    Press { key: String },
    WaitFor { selector: String, state: WaitState },
    ScrollIntoView { selector: String },
    /// Fixed wait (use sparingly)
    Sleep { ms: u64 },
    ExpectTitle { title: String },
    ExpectVisible { selector: String },
    ExpectText { selector: String, contains: String },
    /// Decoded page URL contains `fragment`
    ExpectUrlContains { fragment: String },
}

impl BrowserStep {
    pub fn describe(&self) -> String {
        match self {
            BrowserStep::Navigate { url } => format!("navigate:{}", url),
            BrowserStep::WaitForLoadState(state) => format!("wait-load:{}", state.as_str()),
            BrowserStep::Click { selector, .. } => format!("click:{}", selector),
            BrowserStep::Fill { selector, .. } => format!("fill:{}", selector),
            BrowserStep::Type { selector, .. } => format!("type:{}", selector),
            BrowserStep::Press { key } => format!("press:{}", key),
            BrowserStep::WaitFor { selector, state } => {
                format!("wait:{}:{}", selector, state.as_str())
            }
            BrowserStep::ScrollIntoView { selector } => format!("scroll:{}", selector),
            BrowserStep::Sleep { ms } => format!("sleep:{}ms", ms),
            BrowserStep::ExpectTitle { title } => format!("expect-title:{}", title),
            BrowserStep::ExpectVisible { selector } => format!("expect-visible:{}", selector),
            BrowserStep::ExpectText { selector, .. } => format!("expect-text:{}", selector),
            BrowserStep::ExpectUrlContains { fragment } => format!("expect-url:{}", fragment),
        }
    }

    fn to_js(&self) -> String {
        match self {
            BrowserStep::Navigate { url } => {
                format!("    await page.goto(new URL({}, baseUrl).toString());", js_str(url))
            }
            BrowserStep::WaitForLoadState(state) => {
                format!("    await page.waitForLoadState({});", js_str(state.as_str()))
            }
            BrowserStep::Click { selector, force } => {
                if *force {
                    format!(
                        "    await page.locator({}).click({{ force: true, noWaitAfter: true }});",
                        js_str(selector)
                    )
                } else {
                    format!("    await page.locator({}).click();", js_str(selector))
                }
            }
            BrowserStep::Fill { selector, value } => {
                format!("    await page.locator({}).fill({});", js_str(selector), js_str(value))
            }
            BrowserStep::Type { selector, text } => format!(
                "    await page.locator({}).pressSequentially({});",
                js_str(selector),
                js_str(text)
            ),
            BrowserStep::Press { key } => {
                format!("    await page.keyboard.press({});", js_str(key))
            }
            BrowserStep::WaitFor { selector, state } => format!(
                "    await page.locator({}).waitFor({{ state: {} }});",
                js_str(selector),
                js_str(state.as_str())
            ),
            BrowserStep::ScrollIntoView { selector } => {
                format!("    await page.locator({}).scrollIntoViewIfNeeded();", js_str(selector))
            }
            BrowserStep::Sleep { ms } => format!("    await page.waitForTimeout({});", ms),
            BrowserStep::ExpectTitle { title } => {
                format!("    await expect(page).toHaveTitle({});", js_str(title))
            }
            BrowserStep::ExpectVisible { selector } => format!(
                "    await expect(page.locator({})).toBeVisible();",
                js_str(selector)
            ),
            BrowserStep::ExpectText { selector, contains } => format!(
                "    await expect(page.locator({})).toContainText({});",
                js_str(selector),
                js_str(contains)
            ),
            BrowserStep::ExpectUrlContains { fragment } => format!(
                "    expect(decodeURIComponent(page.url().replace(/\\+/g, ' '))).toContain({});",
                js_str(fragment)
            ),
        }
    }
}

/// A named group of steps, reported as one unit on failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub steps: Vec<BrowserStep>,
}

impl Action {
    pub fn new(name: impl Into<String>, steps: Vec<BrowserStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// Elements read when the page is captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub result_titles: String,
    pub no_results: String,
}

impl From<&SelectorMap> for Capture {
    fn from(selectors: &SelectorMap) -> Self {
        Self {
            result_titles: selectors.result_titles.clone(),
            no_results: selectors.no_results.clone(),
        }
    }
}

/// Executes queued actions in a browser and captures the settled page
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn run(
        &self,
        scenario: &str,
        actions: &[Action],
        capture: &Capture,
    ) -> E2eResult<PageSnapshot>;
}

/// One scenario's browser context: queued actions plus their capture
pub struct BrowserSession<'a> {
    driver: &'a dyn PageDriver,
    scenario: String,
    capture: Capture,
    actions: Vec<Action>,
}

impl<'a> BrowserSession<'a> {
    pub fn new(driver: &'a dyn PageDriver, scenario: impl Into<String>, capture: Capture) -> Self {
        Self {
            driver,
            scenario: scenario.into(),
            capture,
            actions: Vec::new(),
        }
    }

    pub fn queue(&mut self, action: Action) -> &mut Self {
        debug!("[{}] queued: {}", self.scenario, action.name);
        self.actions.push(action);
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Run every queued action and capture the page once it has settled
    pub async fn settle(&mut self) -> E2eResult<PageSnapshot> {
        let actions = std::mem::take(&mut self.actions);
        info!("[{}] running {} action(s)", self.scenario, actions.len());
        self.driver.run(&self.scenario, &actions, &self.capture).await
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    /// Capture a full-page screenshot when an action fails
    pub screenshot_on_failure: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: Option<String>,
    pub browser: Browser,
    pub headless: bool,
    /// Default timeout for every Playwright action
    pub action_timeout_ms: u64,
    /// Node executable that runs the generated scripts
    pub node_binary: PathBuf,
    /// `node_modules` directory holding `@playwright/test`
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.udacity.com/".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            screenshot_on_failure: true,
            viewport_width: 1280,
            viewport_height: 720,
            user_agent: None,
            browser: Browser::Chromium,
            headless: true,
            action_timeout_ms: 30_000,
            node_binary: PathBuf::from("node"),
            node_path: None,
        }
    }
}

/// [`PageDriver`] backed by the Playwright Node library
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        if config.screenshot_on_failure {
            std::fs::create_dir_all(&config.screenshot_dir)?;
        }

        Ok(Self { config })
    }

    /// Check if Playwright is installed
    pub fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for one scenario
    pub fn build_script(&self, scenario: &str, actions: &[Action], capture: &Capture) -> String {
        let mut script = String::new();

        let mut context_options = format!(
            "viewport: {{ width: {}, height: {} }}",
            self.config.viewport_width, self.config.viewport_height
        );
        if let Some(agent) = &self.config.user_agent {
            context_options.push_str(&format!(", userAgent: {}", js_str(agent)));
        }

        // Header
        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit, expect }} = require('@playwright/test');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{ {context_options} }});
  context.setDefaultTimeout({timeout});
  const page = await context.newPage();
  const baseUrl = {base_url};
  let action = 'setup';

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            context_options = context_options,
            timeout = self.config.action_timeout_ms,
            base_url = js_str(&self.config.base_url),
        ));

        for (i, action) in actions.iter().enumerate() {
            script.push_str(&format!("\n    // Action {}: {}\n", i + 1, action.name));
            script.push_str(&format!("    action = {};\n", js_str(&action.name)));
            for step in &action.steps {
                script.push_str(&step.to_js());
                script.push('\n');
            }
        }

        // Capture
        script.push_str(&format!(
            r#"
    action = 'capture results';
    const titles = (await page.locator({titles}).allTextContents()).map(t => t.trim());
    const noResults = page.locator({no_results}).first();
    const noResultsVisible = await noResults.isVisible();
    const noResultsText = noResultsVisible ? await noResults.textContent() : null;
    console.log({marker} + JSON.stringify({{ url: page.url(), titles, noResultsVisible, noResultsText }}));
  }} catch (error) {{
"#,
            titles = js_str(&capture.result_titles),
            no_results = js_str(&capture.no_results),
            marker = js_str(SNAPSHOT_MARKER),
        ));

        if self.config.screenshot_on_failure {
            let path = self.config.screenshot_dir.join(format!("{}.png", file_stem(scenario)));
            script.push_str(&format!(
                "    await page.screenshot({{ path: {}, fullPage: true }}).catch(() => {{}});\n",
                js_str(&path.to_string_lossy())
            ));
        }

        // Footer
        script.push_str(&format!(
            r#"    console.error({marker} + JSON.stringify({{ action, error: error.message }}));
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#,
            marker = js_str(FAILURE_MARKER),
        ));

        script
    }

    /// Execute a script via Node and capture the page snapshot it reports
    pub async fn run_script(&self, script: &str) -> E2eResult<PageSnapshot> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        // A timed-out scenario drops this future; the browser must go with it
        let mut cmd = TokioCommand::new(&self.config.node_binary);
        cmd.arg(&script_path)
            .current_dir(temp_dir.path())
            .kill_on_drop(true);
        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        parse_output(&stdout, &stderr)
    }
}

#[async_trait]
impl PageDriver for PlaywrightDriver {
    async fn run(
        &self,
        scenario: &str,
        actions: &[Action],
        capture: &Capture,
    ) -> E2eResult<PageSnapshot> {
        for action in actions {
            for step in &action.steps {
                debug!("[{}] {}: {}", scenario, action.name, step.describe());
            }
        }
        let script = self.build_script(scenario, actions, capture);
        self.run_script(&script).await
    }
}

#[derive(Debug, Deserialize)]
struct FailureReport {
    action: String,
    error: String,
}

/// Interpret the output of a scenario script
pub fn parse_output(stdout: &str, stderr: &str) -> E2eResult<PageSnapshot> {
    if let Some(line) = marked_line(stderr, FAILURE_MARKER) {
        let report: FailureReport = serde_json::from_str(line)?;
        warn!("Action '{}' failed: {}", report.action, report.error);
        return Err(E2eError::ActionFailed {
            action: report.action,
            reason: report.error,
        });
    }

    if let Some(line) = marked_line(stdout, SNAPSHOT_MARKER) {
        return Ok(serde_json::from_str(line)?);
    }

    Err(E2eError::Playwright(format!(
        "Script produced no snapshot:\nstdout: {}\nstderr: {}",
        stdout, stderr
    )))
}

fn marked_line<'a>(output: &'a str, marker: &str) -> Option<&'a str> {
    output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(marker))
}

/// Quote a value as a JavaScript string literal
fn js_str(value: &str) -> String {
    Value::from(value).to_string()
}

/// Scenario name reduced to a safe file name
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use test_case::test_case;

    fn driver(config: PlaywrightConfig) -> PlaywrightDriver {
        // Skip the installation check
        PlaywrightDriver { config }
    }

    fn capture() -> Capture {
        Capture::from(&SelectorMap::default())
    }

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str(r#"a[href*="/catalog"]"#), r#""a[href*=\"/catalog\"]""#);
        assert_eq!(js_str("it's"), r#""it's""#);
    }

    #[test]
    fn test_script_contains_actions_in_order() {
        let actions = vec![
            Action::new(
                "Broad Search",
                vec![
                    BrowserStep::Fill {
                        selector: "#q".to_string(),
                        value: "Cloud".to_string(),
                    },
                    BrowserStep::Press {
                        key: "Enter".to_string(),
                    },
                ],
            ),
            Action::new(
                "Level Filter",
                vec![BrowserStep::Sleep { ms: 1000 }],
            ),
        ];
        let script = driver(PlaywrightConfig::default()).build_script("smoke search", &actions, &capture());

        let fill = script.find(r##"page.locator("#q").fill("Cloud")"##).unwrap();
        let press = script.find(r#"page.keyboard.press("Enter")"#).unwrap();
        let sleep = script.find("page.waitForTimeout(1000)").unwrap();
        let capture_at = script.find("allTextContents()").unwrap();
        assert!(fill < press && press < sleep && sleep < capture_at);
        assert!(script.contains(r#"action = "Level Filter";"#));
        assert!(script.contains("chromium.launch({ headless: true })"));
        assert!(script.contains(SNAPSHOT_MARKER));
    }

    #[test]
    fn test_screenshot_only_when_enabled() {
        let with = driver(PlaywrightConfig::default()).build_script("a/b", &[], &capture());
        assert!(with.contains("page.screenshot"));
        assert!(with.contains("a_b.png"));

        let without = driver(PlaywrightConfig {
            screenshot_on_failure: false,
            ..Default::default()
        })
        .build_script("a/b", &[], &capture());
        assert!(!without.contains("page.screenshot"));
    }

    #[test]
    fn test_user_agent_and_browser() {
        let script = driver(PlaywrightConfig {
            browser: Browser::Firefox,
            headless: false,
            user_agent: Some("probe/1.0".to_string()),
            ..Default::default()
        })
        .build_script("ua", &[], &capture());
        assert!(script.contains("firefox.launch({ headless: false })"));
        assert!(script.contains(r#"userAgent: "probe/1.0""#));
    }

    #[test]
    fn test_parse_snapshot_output() {
        let stdout = format!(
            "some log line\n{}{{\"url\":\"https://x/catalog\",\"titles\":[\"A\",\"B\"],\"noResultsVisible\":false,\"noResultsText\":null}}\n",
            SNAPSHOT_MARKER
        );
        let snapshot = parse_output(&stdout, "").unwrap();
        assert_eq!(snapshot.titles, vec!["A", "B"]);
        assert_eq!(snapshot.url, "https://x/catalog");
    }

    #[test]
    fn test_parse_failure_output() {
        let stderr = format!(
            "{}{{\"action\":\"Broad Search\",\"error\":\"Timeout 30000ms exceeded\"}}",
            FAILURE_MARKER
        );
        match parse_output("", &stderr) {
            Err(E2eError::ActionFailed { action, reason }) => {
                assert_eq!(action, "Broad Search");
                assert!(reason.contains("Timeout"));
            }
            other => panic!("expected ActionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_output() {
        let err = parse_output("", "node: command crashed").unwrap_err();
        assert!(matches!(err, E2eError::Playwright(_)));
    }

    #[test_case("chromium", Some(Browser::Chromium) ; "chromium")]
    #[test_case("chrome", Some(Browser::Chromium) ; "chrome alias")]
    #[test_case("Firefox", Some(Browser::Firefox) ; "mixed case")]
    #[test_case("safari", Some(Browser::Webkit) ; "safari alias")]
    #[test_case("lynx", None ; "unknown")]
    fn test_browser_names(name: &str, expected: Option<Browser>) {
        assert_eq!(Browser::from_name(name), expected);
    }

    /// Running, as opposed to exited or reaped
    #[cfg(target_os = "linux")]
    fn process_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with(['Z', 'X']))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timed_out_script_process_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let driver = driver(PlaywrightConfig {
            node_binary: PathBuf::from("sh"),
            ..Default::default()
        });
        let script = format!("echo $$ > '{}'\nexec sleep 5\n", pid_file.display());

        let result = tokio::time::timeout(Duration::from_millis(500), driver.run_script(&script)).await;
        assert!(result.is_err(), "script should outlive the timeout");

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let mut running = true;
        for _ in 0..100 {
            running = process_running(&pid);
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!running, "process {} still running after timeout", pid);
    }

    struct RecordingDriver;

    #[async_trait]
    impl PageDriver for RecordingDriver {
        async fn run(
            &self,
            _scenario: &str,
            actions: &[Action],
            _capture: &Capture,
        ) -> E2eResult<PageSnapshot> {
            Ok(PageSnapshot {
                titles: actions.iter().map(|a| a.name.clone()).collect(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_settle_drains_queue() {
        let driver = RecordingDriver;
        let mut session = BrowserSession::new(&driver, "drain", capture());
        session
            .queue(Action::new("one", vec![]))
            .queue(Action::new("two", vec![]));
        assert_eq!(session.actions().len(), 2);

        let snapshot = session.settle().await.unwrap();
        assert_eq!(snapshot.titles, vec!["one", "two"]);
        assert!(session.actions().is_empty());
    }
}
