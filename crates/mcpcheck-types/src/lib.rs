//! Shared report records and error types for mcpcheck.

pub mod error;
pub mod report;

pub use error::ConfigError;
pub use report::{Category, SuiteCounts, TestResult, TestStatus, TestSuiteResult};
