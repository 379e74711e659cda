mod common;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::{analysis_json, segment_json};
use serde_json::{json, Value};

use text_critic::config::ProviderConfig;
use text_critic::provider::AnalysisProvider;
use text_critic::{analyze_text, AnalyzeError, HttpProvider};

/// Authorization header and JSON body of each request the fake endpoint saw.
type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn reply(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((auth, body));
    let content = analysis_json(json!([segment_json(None, 0, 3, "spelling")])).to_string();
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": format!("Aquí está:\n{content}") } }]
    }))
}

async fn unavailable() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "overloaded")
}

async fn garbage() -> &'static str {
    "<html>definitely not an envelope</html>"
}

async fn no_content() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn spawn_endpoint() -> (SocketAddr, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/ok", post(reply))
        .route("/down", post(unavailable))
        .route("/garbage", post(garbage))
        .route("/empty", post(no_content))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn provider(addr: SocketAddr, path: &str, api_key: Option<&str>) -> HttpProvider {
    HttpProvider::new(ProviderConfig {
        endpoint: format!("http://{addr}{path}"),
        model: "test/model".to_string(),
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(5),
        ..ProviderConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn successful_call_sends_rubric_and_parses_reply() {
    let (addr, seen) = spawn_endpoint().await;
    let provider = provider(addr, "/ok", Some("secret"));

    let result = analyze_text(&provider, "Ola mundo").await.expect("analysis");
    assert_eq!(result.segments.len(), 1);
    assert!(!result.segments[0].id.is_empty());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "exactly one outbound request");
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer secret"));
    assert_eq!(body["model"], "test/model");
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["max_tokens"], 4000);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("\"Ola mundo\""));
}

#[tokio::test]
async fn no_api_key_means_no_authorization_header() {
    let (addr, seen) = spawn_endpoint().await;
    let provider = provider(addr, "/ok", None);
    provider.complete("Hola").await.unwrap();
    assert_eq!(seen.lock().unwrap()[0].0, None);
}

#[tokio::test]
async fn non_success_status_is_provider_unavailable() {
    let (addr, _) = spawn_endpoint().await;
    let err = provider(addr, "/down", None).complete("Hola").await.unwrap_err();
    match err {
        AnalyzeError::ProviderUnavailable(detail) => {
            assert!(detail.contains("503"), "got {detail}")
        }
        other => panic!("expected ProviderUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_envelope_is_malformed() {
    let (addr, _) = spawn_endpoint().await;
    let err = provider(addr, "/garbage", None).complete("Hola").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::MalformedResponse(_)), "got {err:?}");

    let err = provider(addr, "/empty", None).complete("Hola").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_provider_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = provider(addr, "/ok", None).complete("Hola").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::ProviderUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn blank_text_never_reaches_the_endpoint() {
    let (addr, seen) = spawn_endpoint().await;
    let err = analyze_text(&provider(addr, "/ok", None), " \n ").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::EmptyInput));
    assert!(seen.lock().unwrap().is_empty());
}
