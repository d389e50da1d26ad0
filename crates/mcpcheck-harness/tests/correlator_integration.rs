//! End-to-end correlation tests against small scripted child processes.
//!
//! Tests that need `python3` or `bash` return early when the interpreter is
//! not installed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use mcpcheck_harness::{BatchCall, Correlator, HarnessError, StdioTransport};
use serde_json::json;

fn has_program(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

fn start(command: &str, args: &[&str], timeout: Duration) -> Correlator {
    let transport = StdioTransport::new(
        command,
        args.iter().map(|a| a.to_string()).collect(),
        HashMap::new(),
        false,
    );
    Correlator::start(transport, timeout).unwrap()
}

fn python(script: &str, timeout: Duration) -> Option<Correlator> {
    if !has_program("python3") {
        return None;
    }
    Some(start("python3", &["-u", "-c", script], timeout))
}

/// Echoes every request's params back as its result, after some log noise.
const ECHO_SERVER: &str = r#"
import json, sys
print("echo server starting")
for line in sys.stdin:
    msg = json.loads(line)
    if "id" not in msg:
        continue
    print("handling " + msg["method"])
    print(json.dumps({"jsonrpc": "2.0", "id": msg["id"], "result": {"method": msg["method"], "params": msg.get("params")}}))
"#;

/// Reads three requests, then answers them in reverse order.
const REVERSE_SERVER: &str = r#"
import json, sys
held = []
for line in sys.stdin:
    held.append(json.loads(line))
    if len(held) == 3:
        for msg in reversed(held):
            print(json.dumps({"jsonrpc": "2.0", "id": msg["id"], "result": {"echo": msg["params"]["n"]}}))
        held = []
"#;

/// Records notification methods; `dump` returns them in arrival order.
const RECORDING_SERVER: &str = r#"
import json, sys
seen = []
for line in sys.stdin:
    msg = json.loads(line)
    if msg.get("method") == "dump":
        print(json.dumps({"jsonrpc": "2.0", "id": msg["id"], "result": {"seen": seen}}))
    elif "id" not in msg:
        seen.append(msg["method"])
"#;

/// Answers every request with an error object.
const ERROR_SERVER: &str = r#"
import json, sys
for line in sys.stdin:
    msg = json.loads(line)
    print(json.dumps({"jsonrpc": "2.0", "id": msg["id"], "error": {"code": -32601, "message": "Method not found"}}))
"#;

#[tokio::test]
async fn one_ms_timeout_settles_quickly_and_frees_the_slot() {
    let correlator = start("sleep", &["10"], Duration::from_secs(30));

    let started = Instant::now();
    let result = correlator
        .call("tools/list", None, Some(Duration::from_millis(1)))
        .await;
    assert!(matches!(result, Err(HarnessError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(correlator.pending_count(), 0);

    // The id space keeps working after a timeout
    let result = correlator
        .call("tools/list", None, Some(Duration::from_millis(1)))
        .await;
    assert!(matches!(result, Err(HarnessError::Timeout { .. })));
    assert_eq!(correlator.pending_count(), 0);

    correlator.stop().await;
}

#[tokio::test]
async fn timeout_holds_when_server_stops_reading_stdin() {
    // `sleep` never reads stdin: the pipe fills, then the writer queue
    let correlator = start("sleep", &["10"], Duration::from_secs(30));
    const N: usize = 80;
    let blob = "x".repeat(100_000);

    let calls = join_all((0..N).map(|_| {
        correlator.call(
            "tools/call",
            Some(json!({"blob": blob})),
            Some(Duration::from_millis(200)),
        )
    }));
    let results = tokio::time::timeout(Duration::from_secs(5), calls)
        .await
        .expect("blocked writes must still time out");

    for result in results {
        assert!(
            matches!(result, Err(HarnessError::Timeout { .. })),
            "got {result:?}"
        );
    }
    assert_eq!(correlator.pending_count(), 0);

    correlator.stop().await;
}

#[tokio::test]
async fn stop_rejects_every_outstanding_call() {
    let correlator = start("sleep", &["10"], Duration::from_secs(30));
    const N: usize = 5;

    let calls = join_all((0..N).map(|_| correlator.call("ping", None, None)));
    let stopper = async {
        while correlator.pending_count() < N {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        correlator.stop().await;
    };

    let (results, ()) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(calls, stopper)
    })
    .await
    .expect("stop must not hang");

    assert_eq!(results.len(), N);
    for result in results {
        assert!(
            matches!(result, Err(HarnessError::HarnessStopped)),
            "got {result:?}"
        );
    }
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn call_after_stop_is_transport_closed() {
    let correlator = start("cat", &[], Duration::from_secs(5));
    correlator.stop().await;
    correlator.stop().await;
    assert!(matches!(
        correlator.call("ping", None, None).await,
        Err(HarnessError::TransportClosed)
    ));
    assert!(matches!(
        correlator.notify("notifications/initialized", None).await,
        Err(HarnessError::TransportClosed)
    ));
}

#[tokio::test]
async fn unmatched_response_is_ignored() {
    if !has_program("bash") {
        return;
    }
    let script = r#"while IFS= read -r line; do echo '{"jsonrpc":"2.0","id":999999,"result":{}}'; done"#;
    let correlator = start("bash", &["-c", script], Duration::from_secs(5));

    let result = correlator
        .call("ping", None, Some(Duration::from_millis(300)))
        .await;
    assert!(matches!(result, Err(HarnessError::Timeout { .. })));
    assert!(correlator.unmatched_responses() >= 1);
    assert!(correlator.is_live());

    correlator.stop().await;
}

#[tokio::test]
async fn responses_match_by_id_not_arrival_order() {
    let Some(correlator) = python(REVERSE_SERVER, Duration::from_secs(10)) else {
        return;
    };

    let results = join_all(
        (0..3).map(|n| correlator.call("echo", Some(json!({"n": n})), None)),
    )
    .await;

    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap()["echo"], n);
    }
    assert_eq!(correlator.unmatched_responses(), 0);
    correlator.stop().await;
}

#[tokio::test]
async fn noise_lines_are_dropped() {
    let Some(correlator) = python(ECHO_SERVER, Duration::from_secs(10)) else {
        return;
    };

    let result = correlator
        .call("tools/list", Some(json!({"cursor": "a"})), None)
        .await
        .unwrap();
    assert_eq!(result["method"], "tools/list");
    assert_eq!(result["params"]["cursor"], "a");

    correlator.stop().await;
}

#[tokio::test]
async fn error_object_becomes_protocol_error() {
    let Some(correlator) = python(ERROR_SERVER, Duration::from_secs(10)) else {
        return;
    };

    let err = correlator.call("nope", None, None).await.unwrap_err();
    assert_eq!(err.protocol_code(), Some(-32601));

    // The raw envelope is still available through `request`
    let resp = correlator.request("nope", None, None).await.unwrap();
    assert_eq!(resp.envelope()["error"]["message"], "Method not found");

    correlator.stop().await;
}

#[tokio::test]
async fn notifications_arrive_in_issue_order() {
    let Some(correlator) = python(RECORDING_SERVER, Duration::from_secs(10)) else {
        return;
    };

    for method in ["a", "b", "c"] {
        correlator.notify(method, None).await.unwrap();
    }
    let result = correlator.call("dump", None, None).await.unwrap();
    assert_eq!(result["seen"], json!(["a", "b", "c"]));

    correlator.stop().await;
}

#[tokio::test]
async fn batch_results_keep_caller_order() {
    let Some(correlator) = python(ECHO_SERVER, Duration::from_secs(10)) else {
        return;
    };

    let results = correlator
        .call_batch(vec![
            BatchCall::new("tools/list", None),
            BatchCall::new("resources/list", None),
            BatchCall::new("prompts/list", None),
        ])
        .await;

    let methods: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap()["method"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(methods, ["tools/list", "resources/list", "prompts/list"]);

    correlator.stop().await;
}

#[tokio::test]
async fn server_exit_fails_outstanding_calls_with_transport_closed() {
    if !has_program("bash") {
        return;
    }
    // Read one request, then exit without answering
    let correlator = start("bash", &["-c", "read -r line; exit 0"], Duration::from_secs(10));

    let started = Instant::now();
    let result = correlator.call("initialize", None, None).await;
    assert!(
        matches!(result, Err(HarnessError::TransportClosed)),
        "got {result:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(5));

    // And later calls fail right away
    assert!(matches!(
        correlator.call("tools/list", None, None).await,
        Err(HarnessError::TransportClosed)
    ));
    assert!(!correlator.is_live());

    correlator.stop().await;
}
