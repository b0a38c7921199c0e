use std::sync::Arc;

use futures::StreamExt;
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

use challenge_stream_core::api::{
    ControlConfig, GenerationRequest, GenerationTransport, RunController, RunOptions, RunStatus,
    TransportError,
};
use challenge_stream_core::config::HttpTransportConfig;
use challenge_stream_plugins::transport::HttpGenerationTransport;

const PATH: &str = "/api/generate-challenge-statements";

fn transport_for(server: &mockito::ServerGuard) -> HttpGenerationTransport {
    HttpGenerationTransport::new(&HttpTransportConfig {
        base_url: server.url(),
        ..HttpTransportConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn posts_json_and_streams_the_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("content-type", "application/json")
        .match_header("accept", "text/event-stream")
        .match_body(Matcher::Json(json!({
            "brief_text": "Reduce churn",
            "include_research": true,
            "selected_research_ids": ["r-1"],
            "generator_config": null
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"type\":\"complete\"}\n\n")
        .create_async()
        .await;

    let transport = transport_for(&server);
    let req = GenerationRequest::new("Reduce churn", true, vec!["r-1".into()], None);
    let mut stream = transport.open(&req).await.unwrap();

    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, b"data: {\"type\":\"complete\"}\n\n");
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_prefers_detail() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(422)
        .with_body(r#"{"detail":"brief_text must not be empty"}"#)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let req = GenerationRequest::new("x", false, Vec::new(), None);
    let err = transport.open(&req).await.err().unwrap();

    assert!(matches!(err, TransportError::Status { status: 422, .. }));
    assert_eq!(err.to_string(), "brief_text must not be empty");
}

#[tokio::test]
async fn error_status_without_detail_uses_generic_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(503)
        .with_body("upstream down")
        .create_async()
        .await;

    let transport = transport_for(&server);
    let req = GenerationRequest::new("x", false, Vec::new(), None);
    let err = transport.open(&req).await.err().unwrap();
    assert_eq!(err.to_string(), "API request failed: 503");
}

#[tokio::test]
async fn empty_success_body_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("")
        .create_async()
        .await;

    let transport = transport_for(&server);
    let req = GenerationRequest::new("x", false, Vec::new(), None);
    let err = transport.open(&req).await.err().unwrap();

    assert!(matches!(err, TransportError::EmptyBody));
    assert_eq!(err.to_string(), "Response body is empty");
}

#[tokio::test]
async fn controller_runs_against_http_backend() {
    let mut server = mockito::Server::new_async().await;
    let body = [
        json!({"type": "diagnostic", "data": {"diagnostic_summary": "ok", "diagnostic_path": []}}),
        json!({"type": "challenge_generation", "data": {
            "id": 1, "position": 1, "text": "How might we...", "selected_format": "hmw"}}),
        json!({"type": "challenge_evaluation", "data": {"id": 1, "evaluation": {"total_score": 22}}}),
        json!({"type": "complete", "session_id": 9}),
    ]
    .iter()
    .map(|v| format!("data: {v}\n\n"))
    .collect::<String>();
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let mut ctl = RunController::new(
        Arc::new(transport_for(&server)),
        ControlConfig {
            pacing_ms: 0,
            ..ControlConfig::default()
        },
    );
    ctl.start("brief", RunOptions::default()).await.unwrap();
    let view = ctl.wait().await.unwrap();

    assert_eq!(view.status, RunStatus::Succeeded);
    assert_eq!(view.session_id.as_deref(), Some("9"));
    assert_eq!(view.result.len(), 1);
    assert!(view.result.statement(1).unwrap().evaluation.is_some());
}
