//! Envelope compliance: response shape, notification silence, concurrency and
//! ordering.

use crate::scenario::{Outcome, ScenarioFuture, require};
use futures_util::future::join_all;
use mcpcheck_harness::{BatchCall, Harness, HarnessError};
use mcpcheck_validate::{DeclarationKind, check_envelope, check_listing};
use std::collections::HashSet;
use std::sync::Arc;

pub const RESPONSE_ENVELOPE: &str = "Response Envelope";
pub const NOTIFICATION_SILENCE: &str = "Notification Silence";
pub const CONCURRENT_REQUESTS: &str = "Concurrent Requests";
pub const SEQUENTIAL_BATCH: &str = "Sequential Batch";

const CONCURRENT_PINGS: usize = 3;

const BATCH_KINDS: [DeclarationKind; 3] = [
    DeclarationKind::Tool,
    DeclarationKind::Resource,
    DeclarationKind::Prompt,
];

pub fn response_envelope(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let response = harness.request("ping", None).await?;
        let mut notes = require(check_envelope(response.envelope()))?;
        if let Some(Ok(error)) = response.error() {
            notes.push(format!("ping answered with error {}: {}", error.code, error.message));
        }
        Ok(Outcome::Passed(notes))
    })
}

pub fn notification_silence(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let before = harness.correlator().unmatched_responses();
        harness.notify("notifications/mcpcheck-silence", None).await?;
        // The ping response arrives after anything sent for the notification
        harness.request("ping", None).await?;

        let after = harness.correlator().unmatched_responses();
        if after > before {
            return Err(HarnessError::UnexpectedResponse(format!(
                "server answered a notification ({} unmatched response(s))",
                after - before
            )));
        }
        Ok(Outcome::pass())
    })
}

pub fn concurrent_requests(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let responses =
            join_all((0..CONCURRENT_PINGS).map(|_| harness.request("ping", None))).await;

        let mut notes = Vec::new();
        let mut ids = HashSet::new();
        for response in responses {
            let response = response?;
            notes.extend(require(check_envelope(response.envelope()))?);
            if !ids.insert(response.id()) {
                return Err(HarnessError::UnexpectedResponse(format!(
                    "id {} settled more than one request",
                    response.id()
                )));
            }
        }
        notes.dedup();
        Ok(Outcome::Passed(notes))
    })
}

pub fn sequential_batch(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let calls = BATCH_KINDS
            .iter()
            .map(|kind| BatchCall::new(kind.list_method(), None))
            .collect();
        let results = harness.call_batch(calls).await;
        if results.len() != BATCH_KINDS.len() {
            return Err(HarnessError::UnexpectedResponse(format!(
                "expected {} batch results, got {}",
                BATCH_KINDS.len(),
                results.len()
            )));
        }

        let mut notes = Vec::new();
        for (kind, result) in BATCH_KINDS.into_iter().zip(results) {
            match result {
                // A listing in the wrong slot fails its own kind's check
                Ok(result) => notes.extend(require(check_listing(kind, &result))?),
                Err(HarnessError::Protocol { code, .. }) => {
                    notes.push(format!("{} answered with error {code}", kind.list_method()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Outcome::Passed(notes))
    })
}
