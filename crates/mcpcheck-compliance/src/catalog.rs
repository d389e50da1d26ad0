//! The built-in scenario catalog.

use crate::scenario::Scenario;
use crate::{capabilities, envelope, error_handling, handshake};
use mcpcheck_types::{Category, TestResult};

/// Every built-in scenario, grouped by category in run order.
pub fn default_catalog() -> Vec<Scenario> {
    vec![
        Scenario::new(handshake::INITIALIZE, Category::Handshake, handshake::initialize),
        Scenario::new(
            handshake::INITIALIZED_NOTIFICATION,
            Category::Handshake,
            handshake::initialized_notification,
        ),
        Scenario::new(capabilities::LIST_TOOLS, Category::Tools, capabilities::list_tools),
        Scenario::new(capabilities::CALL_TOOL, Category::Tools, capabilities::call_tool),
        Scenario::new(
            capabilities::LIST_RESOURCES,
            Category::Resources,
            capabilities::list_resources,
        ),
        Scenario::new(
            capabilities::READ_RESOURCE,
            Category::Resources,
            capabilities::read_resource,
        ),
        Scenario::new(capabilities::LIST_PROMPTS, Category::Prompts, capabilities::list_prompts),
        Scenario::new(capabilities::GET_PROMPT, Category::Prompts, capabilities::get_prompt),
        Scenario::new(
            error_handling::INVALID_METHOD,
            Category::ErrorHandling,
            error_handling::invalid_method,
        ),
        Scenario::new(
            error_handling::INVALID_PARAMS,
            Category::ErrorHandling,
            error_handling::invalid_params,
        ),
        Scenario::new(
            envelope::RESPONSE_ENVELOPE,
            Category::Envelope,
            envelope::response_envelope,
        ),
        Scenario::new(
            envelope::NOTIFICATION_SILENCE,
            Category::Envelope,
            envelope::notification_silence,
        ),
        Scenario::new(
            envelope::CONCURRENT_REQUESTS,
            Category::Envelope,
            envelope::concurrent_requests,
        ),
        Scenario::new(
            envelope::SEQUENTIAL_BATCH,
            Category::Envelope,
            envelope::sequential_batch,
        ),
    ]
}

/// The results `scenarios` would produce, all still pending.
pub fn plan(scenarios: &[Scenario]) -> Vec<TestResult> {
    scenarios
        .iter()
        .map(|s| TestResult::pending(s.name, s.category))
        .collect()
}
