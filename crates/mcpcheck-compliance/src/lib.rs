//! MCP compliance suite.
//!
//! A fixed catalog of scenarios, grouped by capability area, run in order
//! against one server process. Every scenario produces a [`TestResult`]; the
//! suite never aborts early except when the server cannot be spawned.
//!
//! [`TestResult`]: mcpcheck_types::TestResult

mod arguments;
pub mod capabilities;
pub mod catalog;
pub mod envelope;
pub mod error_handling;
pub mod handshake;
pub mod scenario;
pub mod suite;

pub use catalog::{default_catalog, plan};
pub use scenario::{Outcome, Scenario, ScenarioFuture};
pub use suite::{ComplianceSuite, HARNESS_STARTUP, Phase};
