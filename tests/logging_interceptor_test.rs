//! The debug interceptor logs request lifecycle events through `tracing`.

mod support;

use inference_stream::prelude::*;
use std::sync::Arc;
use support::*;
use tracing_test::traced_test;

#[traced_test]
#[tokio::test]
async fn http_debug_logs_request_and_response() {
    let transport = Arc::new(ScriptedTransport::ok(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n"]));
    let client = InferenceClient::builder()
        .transport(transport)
        .http_debug(true)
        .build()
        .unwrap();
    let request = streaming_request("http://backend.test/v1/chat/completions")
        .with_header("Authorization", "Bearer secret-token");

    let events = collect_events(client.invoke(request).stream).await;
    assert!(outcome(&events).is_completed());

    assert!(logs_contain("sending request"));
    assert!(logs_contain("response received"));
    assert!(logs_contain("request completed"));
    assert!(!logs_contain("secret-token"));
}

#[traced_test]
#[tokio::test]
async fn failures_are_logged() {
    let transport = Arc::new(ScriptedTransport::new(503, vec![r#"{"message":"unavailable"}"#]));
    let client = InferenceClient::builder()
        .transport(transport)
        .http_debug(true)
        .build()
        .unwrap();

    let events = collect_events(
        client
            .invoke(streaming_request("http://backend.test/v1/chat/completions"))
            .stream,
    )
    .await;
    assert!(matches!(outcome(&events), StreamOutcome::Failed(_)));
    assert!(logs_contain("request failed"));
    assert!(logs_contain("unavailable"));
}
