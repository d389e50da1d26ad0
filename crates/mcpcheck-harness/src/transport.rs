//! Stdio transport for the server under test.
//!
//! Spawns a child process and manages async communication over stdin/stdout
//! using newline-delimited JSON messages. Lines that are not JSON objects are
//! treated as stray diagnostic output and dropped.

use crate::error::HarnessError;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Frames read from the child's stdout. Closes on EOF or stop.
pub type FrameReceiver = mpsc::Receiver<Value>;

const CHANNEL_CAPACITY: usize = 64;

enum State {
    Idle,
    Live(LiveProcess),
    Dead,
}

struct LiveProcess {
    write_tx: mpsc::Sender<String>,
    child: Child,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
}

/// Owns one server process and its stdin/stdout pair.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    debug: bool,
    state: Mutex<State>,
    eof: Arc<AtomicBool>,
}

impl StdioTransport {
    /// Create an idle transport. Nothing is spawned until [`start`](Self::start).
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
        debug: bool,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            env,
            debug,
            state: Mutex::new(State::Idle),
            eof: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the child process and start background reader/writer tasks.
    pub fn start(&self) -> Result<FrameReceiver, HarnessError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, State::Idle) {
            return Err(HarnessError::AlreadyStarted);
        }

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if self.debug {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| HarnessError::Spawn {
            command: self.command.clone(),
            source: e,
        })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");

        // Writer task: drains channel and writes to child stdin
        let (write_tx, mut write_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                if stdin.write_all(msg.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
            tracing::debug!("writer task finished");
        });

        // Reader task: reads lines from stdout and forwards JSON objects
        let (frame_tx, frame_rx) = mpsc::channel::<Value>(CHANNEL_CAPACITY);
        let eof = Arc::clone(&self.eof);
        let debug = self.debug;
        let reader_handle = tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let Some(frame) = parse_frame(&line, debug) else {
                    continue;
                };
                tracing::trace!("<- {line}");
                if frame_tx.send(frame).await.is_err() {
                    break;
                }
            }
            eof.store(true, Ordering::SeqCst);
            tracing::debug!("server stdout closed");
        });

        tracing::info!("spawned server '{}' (pid {:?})", self.command, child.id());
        *state = State::Live(LiveProcess {
            write_tx,
            child,
            reader_handle,
            writer_handle,
        });
        Ok(frame_rx)
    }

    /// Queue one serialized frame for the child's stdin.
    ///
    /// Frames are written in the order `send` is called.
    pub async fn send(&self, frame: String) -> Result<(), HarnessError> {
        let write_tx = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &*state {
                State::Live(live) if !self.eof.load(Ordering::SeqCst) => live.write_tx.clone(),
                _ => return Err(HarnessError::TransportClosed),
            }
        };
        tracing::trace!("-> {frame}");
        write_tx
            .send(frame)
            .await
            .map_err(|_| HarnessError::TransportClosed)
    }

    /// True between a successful start and either stop or server EOF.
    pub fn is_live(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, State::Live(_)) && !self.eof.load(Ordering::SeqCst)
    }

    /// Kill the child and stop both I/O tasks. Safe to call any number of times.
    pub async fn stop(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, State::Dead)
        };
        let State::Live(live) = previous else {
            return;
        };
        let LiveProcess {
            write_tx,
            mut child,
            reader_handle,
            writer_handle,
        } = live;

        // Readers first, so nothing is delivered after stop returns
        reader_handle.abort();
        drop(write_tx);
        writer_handle.abort();

        if let Err(e) = child.kill().await {
            tracing::debug!("kill failed (process already gone?): {e}");
        }
        tracing::info!("stopped server '{}'", self.command);
    }
}

/// Parse one stdout line into a frame, or drop it.
fn parse_frame(line: &str, debug: bool) -> Option<Value> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(frame @ Value::Object(_)) => Some(frame),
        Ok(_) | Err(_) => {
            if debug {
                tracing::warn!("dropping non-protocol output: {trimmed}");
            } else {
                tracing::debug!("dropping non-protocol output: {trimmed}");
            }
            None
        }
    }
}
