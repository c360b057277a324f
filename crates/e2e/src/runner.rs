//! Scenario runner
//!
//! Each scenario gets a fresh page from the [`PageFactory`], runs its suite
//! baseline and then its own steps strictly in order. Interactions wait until
//! their target is actionable and assertions wait until their predicate
//! holds; both poll the page at a fixed interval up to a fixed bound. The
//! first failing step ends the scenario. Scenarios run concurrently on a
//! bounded number of workers and never share anything but the fixture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult, FailureKind};
use crate::fixture::Fixture;
use crate::locator::Locator;
use crate::page::{Page, PageFactory};
use crate::predicate::{ElementState, Predicate};
use crate::scenario::{Scenario, Step, Suite, ValidationTrigger};

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Scheme and host relative `navigate` URLs are joined to
    pub base_url: String,
    /// Bound for every wait (interaction readiness or predicate)
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Scenarios in flight at once
    pub workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.douglas.de".to_string(),
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            workers: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Opening the page context
    Setup,
    Baseline,
    Scenario,
}

/// Trace entry for one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub phase: Phase,
    pub index: usize,
    pub step: String,
    /// Validation pass fired by this step (blur or submit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<ValidationTrigger>,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Why a scenario failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFailure {
    pub kind: FailureKind,
    pub phase: Phase,
    pub step: String,
    pub target: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub message: String,
}

impl ScenarioFailure {
    fn from_error(phase: Phase, step: String, err: &E2eError) -> Self {
        let (target, expected, actual) = match err {
            E2eError::Timeout { target, condition, .. } => {
                (Some(target.clone()), Some(condition.clone()), None)
            }
            E2eError::PredicateMismatch { target, expected, actual } => {
                (Some(target.clone()), Some(expected.clone()), Some(actual.clone()))
            }
            E2eError::NavigationFailure { url, .. } => (Some(url.clone()), None, None),
            _ => (None, None, None),
        };

        Self {
            kind: err.kind(),
            phase,
            step,
            target,
            expected,
            actual,
            message: err.to_string(),
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub suite: String,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
    pub failure: Option<ScenarioFailure>,
}

impl ScenarioResult {
    fn harness_failure(suite: &str, name: &str, message: String) -> Self {
        Self {
            suite: suite.to_string(),
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: Vec::new(),
            failure: Some(ScenarioFailure::from_error(
                Phase::Setup,
                "run".to_string(),
                &E2eError::Driver(message),
            )),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

/// Result of running every selected scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn count_kind(&self, kind: FailureKind) -> usize {
        self.results
            .iter()
            .filter(|r| r.failure_kind() == Some(kind))
            .count()
    }

    /// Write results to `<dir>/test-results.json`
    pub fn write(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Selects scenarios by suite, name substring and tag
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    pub suite: Option<String>,
    pub name: Option<String>,
    pub tag: Option<String>,
}

impl ScenarioFilter {
    pub fn matches(&self, suite: &Suite, scenario: &Scenario) -> bool {
        self.suite.as_deref().map_or(true, |s| suite.name == s)
            && self.name.as_deref().map_or(true, |n| scenario.name.contains(n))
            && self.tag.as_deref().map_or(true, |t| scenario.has_tag(t))
    }

    /// Selected (suite, scenario) pairs in definition order
    pub fn select<'a>(&self, suites: &'a [Suite]) -> Vec<(&'a Suite, &'a Scenario)> {
        suites
            .iter()
            .flat_map(|suite| suite.scenarios.iter().map(move |scenario| (suite, scenario)))
            .filter(|(suite, scenario)| self.matches(suite, scenario))
            .collect()
    }
}

/// Runs scenarios against pages produced by a [`PageFactory`]
#[derive(Clone)]
pub struct ScenarioRunner {
    config: RunnerConfig,
    pages: Arc<dyn PageFactory>,
    fixture: Arc<Fixture>,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig, pages: Arc<dyn PageFactory>, fixture: Arc<Fixture>) -> Self {
        Self {
            config,
            pages,
            fixture,
        }
    }

    /// Run the selected scenarios of `suites` on the worker pool
    pub async fn run_suites(&self, suites: &[Suite], filter: &ScenarioFilter) -> SuiteSummary {
        let started_at = Utc::now();
        let start = Instant::now();
        let selected = filter.select(suites);
        let workers = self.config.workers.max(1);

        info!("Running {} scenario(s) on {} worker(s)...", selected.len(), workers);

        let permits = Arc::new(Semaphore::new(workers));
        let mut handles = Vec::with_capacity(selected.len());

        for (suite, scenario) in selected {
            let runner = self.clone();
            let permits = permits.clone();
            let suite = Arc::new(Suite {
                scenarios: Vec::new(),
                ..suite.clone()
            });
            let scenario = scenario.clone();
            let key = (suite.name.clone(), scenario.name.clone());

            let handle = tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return ScenarioResult::harness_failure(&suite.name, &scenario.name, e.to_string())
                    }
                };
                runner.run_scenario(&suite, &scenario).await
            });
            handles.push((key, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for ((suite, name), handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => ScenarioResult::harness_failure(&suite, &name, format!("worker panicked: {}", e)),
            };
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteSummary {
            started_at,
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run one scenario in a fresh page context
    pub async fn run_scenario(&self, suite: &Suite, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        let mut steps = Vec::new();
        debug!("Running scenario: {}/{}", suite.name, scenario.name);

        let failure = match self.pages.new_page().await {
            Ok(mut page) => {
                let outcome = self.drive(page.as_mut(), suite, scenario, &mut steps).await;
                if let Err(e) = page.close().await {
                    warn!("Closing page for {}/{} failed: {}", suite.name, scenario.name, e);
                }
                outcome.err()
            }
            Err(e) => Some(ScenarioFailure::from_error(Phase::Setup, "open page".to_string(), &e)),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &failure {
            None => info!("✓ {}/{} ({} ms)", suite.name, scenario.name, duration_ms),
            Some(f) => error!("✗ {}/{} [{}] {}", suite.name, scenario.name, f.kind, f.message),
        }

        ScenarioResult {
            suite: suite.name.clone(),
            name: scenario.name.clone(),
            success: failure.is_none(),
            duration_ms,
            steps,
            failure,
        }
    }

    async fn drive(
        &self,
        page: &mut dyn Page,
        suite: &Suite,
        scenario: &Scenario,
        records: &mut Vec<StepRecord>,
    ) -> Result<(), ScenarioFailure> {
        let phases = [(Phase::Baseline, &suite.baseline), (Phase::Scenario, &scenario.steps)];

        for (phase, steps) in phases {
            for (index, step) in steps.iter().enumerate() {
                let started = Instant::now();
                let name = step.name();
                let trigger = step.validation_trigger();
                match trigger {
                    Some(trigger) => debug!("Executing step: {} ({:?} validation)", name, trigger),
                    None => debug!("Executing step: {}", name),
                }

                let result = self.execute_step(page, step).await;
                records.push(StepRecord {
                    phase,
                    index,
                    step: name.clone(),
                    trigger,
                    success: result.is_ok(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: result.as_ref().err().map(|e| e.to_string()),
                });

                if let Err(e) = result {
                    return Err(ScenarioFailure::from_error(phase, name, &e));
                }
            }
        }
        Ok(())
    }

    /// Execute a single step against `page`
    pub async fn execute_step(&self, page: &mut dyn Page, step: &Step) -> E2eResult<()> {
        match step {
            Step::Navigate { url } => page.goto(&self.url_for(url)).await,
            Step::Fill { target, value } => {
                let target = target.resolve(&self.fixture)?;
                let value = self.fixture.render(value)?;
                self.wait_actionable(page, &target).await?;
                page.fill(&target, &value).await
            }
            Step::Click { target } | Step::Submit { target } => {
                let target = target.resolve(&self.fixture)?;
                self.wait_actionable(page, &target).await?;
                page.click(&target).await
            }
            Step::Check { target } | Step::Uncheck { target } => {
                let target = target.resolve(&self.fixture)?;
                self.wait_actionable(page, &target).await?;
                page.set_checked(&target, matches!(step, Step::Check { .. })).await
            }
            Step::Blur { target } => {
                let target = target.resolve(&self.fixture)?;
                self.wait_until(page, &target, "visible", |s| s.present() && s.visible)
                    .await?;
                // Blur only fires on the focused element
                page.focus(&target).await?;
                page.blur(&target).await
            }
            Step::Assert { target, expect } => {
                let predicate = Predicate::new(target.clone(), expect.clone()).resolve(&self.fixture)?;
                self.assert_predicate(page, &predicate).await
            }
            Step::Log { message } => {
                info!("[SCENARIO LOG] {}", message);
                Ok(())
            }
        }
    }

    /// Join a relative path to the base URL
    pub fn url_for(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    /// Probe until `done` holds or the bound passes; returns the last state
    async fn poll_until<F>(
        &self,
        page: &mut dyn Page,
        target: &Locator,
        attribute: Option<&str>,
        done: F,
    ) -> E2eResult<(bool, ElementState)>
    where
        F: Fn(&ElementState) -> bool,
    {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            let state = page.probe(target, attribute).await?;
            if done(&state) {
                return Ok((true, state));
            }
            if Instant::now() >= deadline {
                return Ok((false, state));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn wait_until<F>(
        &self,
        page: &mut dyn Page,
        target: &Locator,
        condition: &str,
        done: F,
    ) -> E2eResult<ElementState>
    where
        F: Fn(&ElementState) -> bool,
    {
        let (ok, state) = self.poll_until(page, target, None, done).await?;
        if ok {
            Ok(state)
        } else {
            Err(E2eError::Timeout {
                target: target.to_string(),
                condition: condition.to_string(),
                waited_ms: self.config.timeout.as_millis() as u64,
            })
        }
    }

    async fn wait_actionable(&self, page: &mut dyn Page, target: &Locator) -> E2eResult<ElementState> {
        self.wait_until(page, target, "visible and enabled", ElementState::is_actionable)
            .await
    }

    async fn assert_predicate(&self, page: &mut dyn Page, predicate: &Predicate) -> E2eResult<()> {
        let expect = &predicate.expect;
        let (ok, state) = self
            .poll_until(page, &predicate.target, expect.attribute_name(), |s| expect.matches(s))
            .await?;

        if ok {
            Ok(())
        } else {
            Err(E2eError::PredicateMismatch {
                target: predicate.target.to_string(),
                expected: expect.to_string(),
                actual: expect.observed(&state),
            })
        }
    }
}
