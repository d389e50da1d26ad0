//! Validation outcomes.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Mandatory structure is missing or wrong. Makes the result invalid.
    Error,
    /// Optional metadata is missing. Reported, but the result stays valid.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// Outcome of a check: validity plus an ordered list of diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// A valid result with no diagnostics.
    pub fn ok() -> Self {
        Self {
            valid: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let valid = diagnostics.iter().all(|d| d.severity != Severity::Error);
        Self { valid, diagnostics }
    }

    /// Append `other`'s diagnostics after ours.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.valid &= other.valid;
        self.diagnostics.extend(other.diagnostics);
        self
    }

    /// Error-severity messages, in order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.with_severity(Severity::Error)
    }

    /// Warning-severity messages, in order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.with_severity(Severity::Warning)
    }

    /// Every diagnostic rendered as a string, in order.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
            .map(|d| d.message.as_str())
    }
}

/// Accumulates diagnostics for one check.
#[derive(Debug, Default)]
pub(crate) struct Checker {
    prefix: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Prefix every message, e.g. with the index of a list entry.
    pub(crate) fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub(crate) fn absorb(&mut self, result: ValidationResult) {
        for diagnostic in result.diagnostics {
            self.push(diagnostic.severity, diagnostic.message);
        }
    }

    pub(crate) fn finish(self) -> ValidationResult {
        let result = ValidationResult::from_diagnostics(self.diagnostics);
        if !result.diagnostics.is_empty() {
            tracing::trace!("validation diagnostics: {:?}", result.messages());
        }
        result
    }

    fn push(&mut self, severity: Severity, message: String) {
        let message = match &self.prefix {
            Some(prefix) => format!("{prefix}: {message}"),
            None => message,
        };
        self.diagnostics.push(Diagnostic { severity, message });
    }
}
