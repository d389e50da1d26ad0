//! Compliance report records.
//!
//! These are the terminal artifacts of a suite run. They are assembled once by
//! the orchestrator and only read afterwards (rendered as text, dumped as JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Protocol capability area a scenario belongs to, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Startup,
    Handshake,
    Tools,
    Resources,
    Prompts,
    ErrorHandling,
    Envelope,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Startup => "startup",
            Category::Handshake => "handshake",
            Category::Tools => "tools",
            Category::Resources => "resources",
            Category::Prompts => "prompts",
            Category::ErrorHandling => "error handling",
            Category::Envelope => "envelope compliance",
        };
        f.pad(label)
    }
}

/// Outcome of a single scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Pending,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestStatus::Passed => "PASS",
            TestStatus::Failed => "FAIL",
            TestStatus::Skipped => "SKIP",
            TestStatus::Pending => "PENDING",
        };
        f.pad(label)
    }
}

/// Result of one named scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub category: Category,
    pub status: TestStatus,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Skip reason, or warnings collected by a passing scenario.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TestResult {
    pub fn passed(name: impl Into<String>, category: Category, duration: Duration) -> Self {
        Self::with_status(name, category, TestStatus::Passed, duration)
    }

    pub fn failed(
        name: impl Into<String>,
        category: Category,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(name, category, TestStatus::Failed, duration)
        }
    }

    pub fn skipped(
        name: impl Into<String>,
        category: Category,
        duration: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            note: Some(reason.into()),
            ..Self::with_status(name, category, TestStatus::Skipped, duration)
        }
    }

    /// A scenario that is registered but has not run yet.
    pub fn pending(name: impl Into<String>, category: Category) -> Self {
        Self::with_status(name, category, TestStatus::Pending, Duration::ZERO)
    }

    fn with_status(
        name: impl Into<String>,
        category: Category,
        status: TestStatus,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            status,
            duration,
            error: None,
            note: None,
        }
    }
}

/// Aggregate counts over a suite's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
}

impl SuiteCounts {
    /// Tally the statuses of `results`.
    pub fn tally(results: &[TestResult]) -> Self {
        let mut counts = SuiteCounts {
            total: results.len(),
            ..SuiteCounts::default()
        };
        for result in results {
            match result.status {
                TestStatus::Passed => counts.passed += 1,
                TestStatus::Failed => counts.failed += 1,
                TestStatus::Skipped => counts.skipped += 1,
                TestStatus::Pending => counts.pending += 1,
            }
        }
        counts
    }
}

/// The full outcome of one compliance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub run_id: Uuid,
    /// Command line of the server under test.
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub results: Vec<TestResult>,
    pub counts: SuiteCounts,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
}

impl TestSuiteResult {
    /// Assemble a finished suite. Counts are computed here, once.
    pub fn new(
        target: impl Into<String>,
        started_at: DateTime<Utc>,
        results: Vec<TestResult>,
        duration: Duration,
    ) -> Self {
        let counts = SuiteCounts::tally(&results);
        Self {
            run_id: Uuid::new_v4(),
            target: target.into(),
            started_at,
            results,
            counts,
            duration,
        }
    }

    /// True when nothing failed and nothing is left pending.
    pub fn is_success(&self) -> bool {
        self.counts.failed == 0 && self.counts.pending == 0
    }

    /// Results belonging to one category, in run order.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(move |r| r.category == category)
    }

    /// Look up a result by scenario name.
    pub fn get(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Short run id prefix for display.
    pub fn short_id(&self) -> String {
        self.run_id.to_string()[..8].to_string()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
