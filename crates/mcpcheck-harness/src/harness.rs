//! The transport + correlator pair driven by the compliance suite.

use crate::config::HarnessConfig;
use crate::correlator::{BatchCall, Correlator};
use crate::error::HarnessError;
use crate::jsonrpc::Response;
use crate::retry::RetryPolicy;
use crate::transport::StdioTransport;
use serde_json::Value;
use std::time::Duration;

/// A live connection to one server under test.
///
/// Each run builds its own harness; nothing is shared between instances.
pub struct Harness {
    correlator: Correlator,
    retry: RetryPolicy,
}

impl Harness {
    /// Spawn the configured server and start correlating its output.
    pub fn start(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let transport = StdioTransport::new(
            config.command.clone(),
            config.args.clone(),
            config.env.clone(),
            config.debug,
        );
        let correlator = Correlator::start(transport, config.timeout())?;
        Ok(Self {
            correlator,
            retry: RetryPolicy::with_retries(config.retries),
        })
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub async fn request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Response, HarnessError> {
        self.correlator.request(method, params, None).await
    }

    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, HarnessError> {
        self.correlator.call(method, params, None).await
    }

    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, HarnessError> {
        self.correlator.call(method, params, Some(timeout)).await
    }

    /// [`request`](Self::request) with the configured retry count applied to timeouts.
    pub async fn request_with_retry(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Response, HarnessError> {
        self.correlator
            .request_with_retry(method, params, &self.retry)
            .await
    }

    /// [`call`](Self::call) with the configured retry count applied to timeouts.
    pub async fn call_with_retry(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, HarnessError> {
        self.correlator
            .call_with_retry(method, params, &self.retry)
            .await
    }

    /// Send `initialize`, retrying while a slow server has not answered yet.
    pub async fn initialize_with_retry(&self, params: Value) -> Result<Response, HarnessError> {
        self.request_with_retry("initialize", Some(params)).await
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), HarnessError> {
        self.correlator.notify(method, params).await
    }

    pub async fn call_batch(&self, calls: Vec<BatchCall>) -> Vec<Result<Value, HarnessError>> {
        self.correlator.call_batch(calls).await
    }

    pub fn is_live(&self) -> bool {
        self.correlator.is_live()
    }

    pub async fn stop(&self) {
        self.correlator.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_reports_spawn_errors() {
        let config = HarnessConfig::new("this_command_does_not_exist_xyz123");
        match Harness::start(&config) {
            Err(HarnessError::Spawn { command, .. }) => {
                assert_eq!(command, "this_command_does_not_exist_xyz123");
            }
            Err(other) => panic!("Expected Spawn, got: {other:?}"),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn timeout_fires_on_unresponsive_server() {
        // `sleep` never writes to stdout, so requests time out
        let config = HarnessConfig::new("sleep")
            .with_args(["10"])
            .with_timeout_ms(100)
            .with_retries(1);
        let harness = Harness::start(&config).unwrap();

        match harness.call_with_retry("initialize", None).await {
            Err(HarnessError::Timeout { timeout_ms, method }) => {
                assert_eq!(timeout_ms, 100);
                assert_eq!(method, "initialize");
            }
            other => panic!("Expected Timeout, got: {other:?}"),
        }
        assert_eq!(harness.correlator().pending_count(), 0);

        harness.stop().await;
    }
}
