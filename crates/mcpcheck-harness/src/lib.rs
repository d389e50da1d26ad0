//! Drives an MCP server under test over its stdin/stdout.
//!
//! The [`StdioTransport`] owns the child process and frames newline-delimited
//! JSON. The [`Correlator`] turns it into request/response calls with
//! per-call timeouts. [`Harness`] bundles both for one run.

pub mod config;
pub mod correlator;
pub mod error;
pub mod harness;
pub mod jsonrpc;
pub mod retry;
pub mod transport;

pub use config::{HarnessConfig, TransportKind};
pub use correlator::{BatchCall, Correlator};
pub use error::{ErrorKind, HarnessError};
pub use harness::Harness;
pub use jsonrpc::{JsonRpcError, Message, RequestId, Response};
pub use retry::RetryPolicy;
pub use transport::StdioTransport;
