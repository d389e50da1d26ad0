//! Request/response correlation over a [`StdioTransport`].
//!
//! Every request gets a fresh id and a pending entry. A background dispatch
//! task routes incoming responses to the waiter with the matching id. Each
//! pending entry is settled exactly once: by its response, its timeout, the
//! server closing stdout, or [`Correlator::stop`].

use crate::error::HarnessError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, Message, RequestId, Response};
use crate::retry::{RetryPolicy, calculate_delay, is_retryable};
use crate::transport::{FrameReceiver, StdioTransport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type Settle = oneshot::Sender<Result<Response, HarnessError>>;

struct PendingCall {
    method: String,
    issued_at: Instant,
    settle: Settle,
}

#[derive(Debug, Clone, Copy)]
enum CloseReason {
    /// The server closed its stdout.
    Eof,
    /// The harness was stopped.
    Stopped,
}

impl CloseReason {
    fn error(self) -> HarnessError {
        match self {
            CloseReason::Eof => HarnessError::TransportClosed,
            CloseReason::Stopped => HarnessError::HarnessStopped,
        }
    }
}

/// Outstanding calls keyed by id.
#[derive(Default)]
struct PendingTable {
    calls: HashMap<RequestId, PendingCall>,
    closed: Option<CloseReason>,
}

impl PendingTable {
    fn register(&mut self, id: RequestId, call: PendingCall) -> Result<(), HarnessError> {
        if self.closed.is_some() {
            return Err(HarnessError::TransportClosed);
        }
        self.calls.insert(id, call);
        Ok(())
    }

    fn remove(&mut self, id: RequestId) -> Option<PendingCall> {
        self.calls.remove(&id)
    }

    /// Refuse new calls and hand back everything still outstanding.
    /// The first close reason sticks.
    fn close(&mut self, reason: CloseReason) -> (CloseReason, Vec<PendingCall>) {
        let reason = *self.closed.get_or_insert(reason);
        (reason, self.calls.drain().map(|(_, call)| call).collect())
    }
}

/// One request in a [`Correlator::call_batch`].
#[derive(Debug, Clone)]
pub struct BatchCall {
    pub method: String,
    pub params: Option<Value>,
}

impl BatchCall {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Turns a transport into request/response semantics.
pub struct Correlator {
    transport: StdioTransport,
    pending: Arc<Mutex<PendingTable>>,
    next_id: AtomicU64,
    unmatched: Arc<AtomicU64>,
    default_timeout: Duration,
    dispatch_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Correlator {
    /// Start the transport and the dispatch task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(transport: StdioTransport, default_timeout: Duration) -> Result<Self, HarnessError> {
        let frames = transport.start()?;
        let pending = Arc::new(Mutex::new(PendingTable::default()));
        let unmatched = Arc::new(AtomicU64::new(0));

        let dispatch_handle = tokio::spawn(dispatch(
            frames,
            Arc::clone(&pending),
            Arc::clone(&unmatched),
        ));

        Ok(Self {
            transport,
            pending,
            next_id: AtomicU64::new(1),
            unmatched,
            default_timeout,
            dispatch_handle: Mutex::new(Some(dispatch_handle)),
        })
    }

    /// Send a request and wait for its response envelope.
    ///
    /// Error objects are returned inside the [`Response`], not as `Err`; use
    /// [`call`](Self::call) to have them converted.
    pub async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Response, HarnessError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let serialized = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        self.table().register(
            id,
            PendingCall {
                method: method.to_string(),
                issued_at: Instant::now(),
                settle: tx,
            },
        )?;

        // The deadline covers the write too: a server that stops reading
        // stdin eventually blocks the writer queue
        let timeout = timeout.unwrap_or(self.default_timeout);
        let exchange = async {
            self.transport.send(serialized).await?;
            // Settle sender dropped without an outcome: dispatch is gone
            rx.await.unwrap_or(Err(HarnessError::TransportClosed))
        };
        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                // No-op when dispatch already settled the entry
                self.table().remove(id);
                Err(e)
            }
            Err(_) => {
                // Clean up pending entry on timeout; a late response is ignored
                self.table().remove(id);
                Err(HarnessError::Timeout {
                    method: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Send a request and settle it into its result or a typed error.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, HarnessError> {
        self.request(method, params, timeout).await?.into_result()
    }

    /// [`request`](Self::request), retrying timeouts with backoff.
    pub async fn request_with_retry(
        &self,
        method: &str,
        params: Option<Value>,
        policy: &RetryPolicy,
    ) -> Result<Response, HarnessError> {
        let mut attempt = 0;
        loop {
            match self.request(method, params.clone(), None).await {
                Err(e) if is_retryable(&e) && attempt < policy.max_retries => {
                    let delay = calculate_delay(policy, attempt);
                    tracing::info!(
                        "'{method}' attempt {} failed ({e}), retrying in {delay}ms",
                        attempt + 1
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    /// [`call`](Self::call), retrying timeouts with backoff.
    pub async fn call_with_retry(
        &self,
        method: &str,
        params: Option<Value>,
        policy: &RetryPolicy,
    ) -> Result<Value, HarnessError> {
        self.request_with_retry(method, params, policy)
            .await?
            .into_result()
    }

    /// Send a notification (fire-and-forget, no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), HarnessError> {
        let serialized = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.transport.send(serialized).await
    }

    /// Issue requests one after another, collecting results in the same order.
    ///
    /// Each request is a separate frame; no JSON-RPC batch array is sent.
    pub async fn call_batch(&self, calls: Vec<BatchCall>) -> Vec<Result<Value, HarnessError>> {
        let mut results = Vec::with_capacity(calls.len());
        for BatchCall { method, params } in calls {
            results.push(self.call(&method, params, None).await);
        }
        results
    }

    /// Number of calls currently waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.table().calls.len()
    }

    /// Responses received whose id matched no outstanding call.
    pub fn unmatched_responses(&self) -> u64 {
        self.unmatched.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.transport.is_live()
    }

    /// Fail every outstanding call with [`HarnessError::HarnessStopped`] and
    /// stop the transport. Safe to call any number of times.
    pub async fn stop(&self) {
        let (reason, outstanding) = self.table().close(CloseReason::Stopped);
        if !outstanding.is_empty() {
            tracing::debug!("rejecting {} outstanding call(s) on stop", outstanding.len());
        }
        for call in outstanding {
            let _ = call.settle.send(Err(reason.error()));
        }

        let handle = self
            .dispatch_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.transport.stop().await;
    }

    fn table(&self) -> std::sync::MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Route frames to pending calls until the server's stdout closes.
async fn dispatch(
    mut frames: FrameReceiver,
    pending: Arc<Mutex<PendingTable>>,
    unmatched: Arc<AtomicU64>,
) {
    while let Some(frame) = frames.recv().await {
        match Message::classify(frame) {
            Message::Response(resp) => {
                let call = pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(resp.id());
                match call {
                    Some(call) => {
                        tracing::debug!(
                            "'{}' (id {}) answered in {:?}",
                            call.method,
                            resp.id(),
                            call.issued_at.elapsed()
                        );
                        let _ = call.settle.send(Ok(resp));
                    }
                    None => {
                        unmatched.fetch_add(1, Ordering::SeqCst);
                        tracing::debug!("ignoring response for unknown id {}", resp.id());
                    }
                }
            }
            Message::Request { id, method } => {
                tracing::debug!("ignoring server request '{method}' (id {id})");
            }
            Message::Notification { method } => {
                tracing::debug!("ignoring server notification '{method}'");
            }
            Message::Unroutable(frame) => {
                if frame.get("result").is_some() || frame.get("error").is_some() {
                    unmatched.fetch_add(1, Ordering::SeqCst);
                }
                tracing::debug!("ignoring unroutable frame: {frame}");
            }
        }
    }

    let (reason, outstanding) = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .close(CloseReason::Eof);
    for call in outstanding {
        tracing::debug!("'{}' abandoned: server closed stdout", call.method);
        let _ = call.settle.send(Err(reason.error()));
    }
}
