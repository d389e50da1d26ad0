//! Handshake scenarios: `initialize` and the `initialized` notification.

use crate::scenario::{Outcome, ScenarioFuture, require};
use mcpcheck_harness::{Harness, HarnessError};
use mcpcheck_validate::{PROTOCOL_VERSION, check_envelope, check_handshake};
use serde_json::{Value, json};
use std::sync::Arc;

pub const INITIALIZE: &str = "Initialize";
pub const INITIALIZED_NOTIFICATION: &str = "Initialized Notification";

/// Parameters the harness sends with `initialize`.
pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": "mcpcheck",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

pub fn initialize(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let params = initialize_params();
        let request = json!({
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": params.clone(),
        });

        let response = harness.initialize_with_retry(params).await?;
        let mut notes = require(check_envelope(response.envelope()))?;
        let result = response.into_result()?;
        notes.extend(require(check_handshake(&request, &result))?);

        tracing::info!(
            "server '{}' speaks protocol {}",
            result["serverInfo"]["name"].as_str().unwrap_or("?"),
            result["protocolVersion"].as_str().unwrap_or("?")
        );
        Ok(Outcome::Passed(notes))
    })
}

pub fn initialized_notification(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        match harness.notify("notifications/initialized", None).await {
            Ok(()) => Ok(Outcome::pass()),
            // Notifications carry no acknowledgement; a server that has already
            // closed its output has not broken the handshake
            Err(HarnessError::TransportClosed) => Ok(Outcome::Passed(vec![
                "server closed its output before the notification was delivered".into(),
            ])),
            Err(e) => Err(e),
        }
    })
}
