//! Scenario definitions and the helpers scenarios share.

use mcpcheck_harness::{Harness, HarnessError};
use mcpcheck_types::Category;
use mcpcheck_validate::{ValidationResult, check_envelope};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A running scenario.
pub type ScenarioFuture = Pin<Box<dyn Future<Output = Result<Outcome, HarnessError>> + Send>>;

/// How a scenario that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Passed; carries validator warnings and other remarks.
    Passed(Vec<String>),
    /// Nothing to check, e.g. the server declares no tools.
    Skipped(String),
}

impl Outcome {
    pub fn pass() -> Self {
        Outcome::Passed(Vec::new())
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Outcome::Skipped(reason.into())
    }
}

/// One named check within a category.
#[derive(Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub category: Category,
    run: fn(Arc<Harness>) -> ScenarioFuture,
}

impl Scenario {
    pub fn new(
        name: &'static str,
        category: Category,
        run: fn(Arc<Harness>) -> ScenarioFuture,
    ) -> Self {
        Self {
            name,
            category,
            run,
        }
    }

    pub fn start(&self, harness: Arc<Harness>) -> ScenarioFuture {
        (self.run)(harness)
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

/// Turn a validation result into warnings, or a validation error if invalid.
pub(crate) fn require(result: ValidationResult) -> Result<Vec<String>, HarnessError> {
    if result.valid {
        Ok(result.warnings().map(str::to_string).collect())
    } else {
        Err(HarnessError::Validation {
            diagnostics: result.errors().map(str::to_string).collect(),
        })
    }
}

/// Send a request, require a well-formed envelope, and settle it.
///
/// Returns the result together with any envelope warnings.
pub(crate) async fn exchange(
    harness: &Harness,
    method: &str,
    params: Option<Value>,
) -> Result<(Value, Vec<String>), HarnessError> {
    let response = harness.request(method, params).await?;
    let notes = require(check_envelope(response.envelope()))?;
    Ok((response.into_result()?, notes))
}
