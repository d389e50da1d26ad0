//! Suite orchestration: start the harness once, run every scenario in order,
//! stop the harness, aggregate.

use crate::catalog::default_catalog;
use crate::scenario::{Outcome, Scenario};
use chrono::Utc;
use mcpcheck_harness::{Harness, HarnessConfig, HarnessError};
use mcpcheck_types::{Category, TestResult, TestSuiteResult};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Name of the result recorded when the server cannot be spawned.
pub const HARNESS_STARTUP: &str = "Harness Startup";

/// Where a suite run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running(Category),
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::Starting => f.write_str("starting"),
            Phase::Running(category) => write!(f, "running {category}"),
            Phase::Stopped => f.write_str("stopped"),
        }
    }
}

/// Runs a scenario catalog against one server.
pub struct ComplianceSuite {
    config: HarnessConfig,
    scenarios: Vec<Scenario>,
    phase: Phase,
}

impl ComplianceSuite {
    /// A suite running the built-in catalog.
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_scenarios(config, default_catalog())
    }

    /// A suite running `scenarios` in the given order.
    pub fn with_scenarios(config: HarnessConfig, scenarios: Vec<Scenario>) -> Self {
        Self {
            config,
            scenarios,
            phase: Phase::Idle,
        }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run every scenario and produce the report. Never fails: errors become
    /// failed results.
    pub async fn run(mut self) -> TestSuiteResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let target = self.config.target();

        self.enter(Phase::Starting);
        let harness = match Harness::start(&self.config) {
            Ok(harness) => Arc::new(harness),
            Err(e) => {
                tracing::warn!("could not start '{target}': {e}");
                self.enter(Phase::Stopped);
                let result = TestResult::failed(
                    HARNESS_STARTUP,
                    Category::Startup,
                    clock.elapsed(),
                    e.to_string(),
                );
                return TestSuiteResult::new(target, started_at, vec![result], clock.elapsed());
            }
        };

        let scenarios = std::mem::take(&mut self.scenarios);
        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            if self.phase != Phase::Running(scenario.category) {
                self.enter(Phase::Running(scenario.category));
            }
            results.push(run_scenario(scenario, Arc::clone(&harness)).await);
        }

        harness.stop().await;
        self.enter(Phase::Stopped);

        let suite = TestSuiteResult::new(target, started_at, results, clock.elapsed());
        tracing::info!(
            "run {}: {} passed, {} failed, {} skipped in {:?}",
            suite.short_id(),
            suite.counts.passed,
            suite.counts.failed,
            suite.counts.skipped,
            suite.duration
        );
        suite
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!("suite phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}

/// Run one scenario in its own task so a panic is contained.
async fn run_scenario(scenario: &Scenario, harness: Arc<Harness>) -> TestResult {
    let clock = Instant::now();
    let outcome = tokio::spawn(scenario.start(harness)).await;
    let elapsed = clock.elapsed();

    match outcome {
        Ok(Ok(outcome)) => settled(scenario, elapsed, outcome),
        Ok(Err(e)) => failed(scenario, elapsed, &e),
        Err(join) => {
            tracing::warn!("scenario '{}' panicked: {join}", scenario.name);
            TestResult::failed(
                scenario.name,
                scenario.category,
                elapsed,
                format!("scenario panicked: {join}"),
            )
        }
    }
}

fn settled(scenario: &Scenario, elapsed: Duration, outcome: Outcome) -> TestResult {
    match outcome {
        Outcome::Passed(notes) => {
            tracing::debug!("'{}' passed", scenario.name);
            let mut result = TestResult::passed(scenario.name, scenario.category, elapsed);
            if !notes.is_empty() {
                result.note = Some(notes.join("; "));
            }
            result
        }
        Outcome::Skipped(reason) => {
            tracing::debug!("'{}' skipped: {reason}", scenario.name);
            TestResult::skipped(scenario.name, scenario.category, elapsed, reason)
        }
    }
}

fn failed(scenario: &Scenario, elapsed: Duration, error: &HarnessError) -> TestResult {
    tracing::warn!(
        "'{}' failed ({:?}): {error}",
        scenario.name,
        error.kind()
    );
    TestResult::failed(scenario.name, scenario.category, elapsed, error.to_string())
}
