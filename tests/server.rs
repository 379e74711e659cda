mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{analysis_json, segment_json};
use serde_json::{json, Value};
use tower::ServiceExt;

use text_critic::provider::AnalysisProvider;
use text_critic::server::{router, AppState};
use text_critic::error::PreferenceError;
use text_critic::theme::{MemoryStore, PreferenceStore, ThemeContext};
use text_critic::AnalyzeError;

enum Stub {
    Reply(String),
    Down,
}

#[async_trait]
impl AnalysisProvider for Stub {
    async fn complete(&self, _text: &str) -> Result<String, AnalyzeError> {
        match self {
            Stub::Reply(raw) => Ok(raw.clone()),
            Stub::Down => Err(AnalyzeError::ProviderUnavailable(
                "provider returned 503 Service Unavailable".to_string(),
            )),
        }
    }
}

struct ReadOnlyStore;

impl PreferenceStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PreferenceError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

fn app_with_store(stub: Stub, store: Box<dyn PreferenceStore>) -> axum::Router {
    router(Arc::new(AppState::new(Arc::new(stub), ThemeContext::init(store))))
}

fn app(stub: Stub) -> axum::Router {
    app_with_store(stub, Box::new(MemoryStore::default()))
}

fn analysis_with(overall: f64, categories: &[&str]) -> Value {
    let segments: Vec<Value> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let id = format!("s{i}");
            segment_json(Some(id.as_str()), i, i + 1, c)
        })
        .collect();
    let mut payload = analysis_json(json!(segments));
    payload["overallScore"] = json!(overall);
    payload
}

async fn send(app: axum::Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn good_reply() -> String {
    let payload = analysis_json(json!([
        segment_json(None, 0, 3, "spelling"),
        segment_json(None, 11, 15, "clarity"),
    ]));
    format!("Aquí tienes el análisis:\n{payload}\nSaludos.")
}

#[tokio::test]
async fn analyze_returns_normalized_result() {
    let body = json!({ "text": "Ola mundo. Esto es un test." }).to_string();
    let (status, value) = send(app(Stub::Reply(good_reply())), "POST", "/api/analyze", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let segments = value["segments"].as_array().expect("segments array");
    assert_eq!(segments.len(), 2);
    assert!(segments.iter().all(|s| s["id"].as_str().is_some_and(|id| !id.is_empty())));
    assert_eq!(value["textPurpose"], "informative");
}

#[tokio::test]
async fn blank_text_is_a_bad_request() {
    let body = json!({ "text": "   \n\t" }).to_string();
    let (status, value) = send(app(Stub::Reply(good_reply())), "POST", "/api/analyze", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].is_string());
    assert!(value.get("details").is_none());
}

#[tokio::test]
async fn missing_text_is_a_bad_request() {
    let (status, _) = send(app(Stub::Reply(good_reply())), "POST", "/api/analyze", Some("{}".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(Stub::Reply(good_reply())), "POST", "/api/analyze", Some("not json".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_failure_is_a_server_error_with_details() {
    let body = json!({ "text": "Hola" }).to_string();
    let (status, value) = send(app(Stub::Down), "POST", "/api/analyze", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(value["error"].is_string());
    assert!(value["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn malformed_provider_output_is_a_server_error() {
    let body = json!({ "text": "Hola" }).to_string();
    let stub = Stub::Reply("I could not analyze this text.".to_string());
    let (status, value) = send(app(stub), "POST", "/api/analyze", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(value["details"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn layout_endpoint_returns_runs_and_html() {
    let body = json!({
        "text": "Ola mundo.",
        "segments": [segment_json(None, 0, 3, "spelling")],
    })
    .to_string();
    let (status, value) = send(app(Stub::Down), "POST", "/api/layout", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let runs = value["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["kind"], "annotated");
    assert_eq!(runs[0]["text"], "Ola");
    assert_eq!(runs[0]["category"], "spelling");
    assert_eq!(runs[1]["kind"], "plain");
    assert!(value["html"].as_str().unwrap().contains("<mark"));
}

#[tokio::test]
async fn report_endpoint_aggregates_counts() {
    let analysis = text_critic::parse_analysis(&good_reply()).unwrap();
    let body = serde_json::to_string(&analysis).unwrap();
    let (status, value) = send(app(Stub::Down), "POST", "/api/report", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["total_segments"], 2);
    assert_eq!(value["overall"]["band"], "good");
}

#[tokio::test]
async fn report_rejects_out_of_range_scores() {
    let body = analysis_with(42.0, &["tone"]).to_string();
    let (status, value) = send(app(Stub::Down), "POST", "/api/report", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        value["details"].as_str().unwrap().contains("overallScore"),
        "got {value}"
    );
}

#[tokio::test]
async fn saved_versions_are_listed_and_compared() {
    let app = app(Stub::Down);
    let (status, value) = send(app.clone(), "GET", "/api/versions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!([]));

    let first = json!({ "text": "borrador uno", "analysis": analysis_with(5.0, &["spelling", "spelling"]) });
    let (status, saved) = send(app.clone(), "POST", "/api/versions", Some(first.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["name"], "Version 1");
    assert_eq!(saved["overallScore"], 5.0);
    assert_eq!(saved["segments"], 2);
    let id = saved["id"].as_str().unwrap().to_string();

    let (_, listed) = send(app.clone(), "GET", "/api/versions", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let request = json!({
        "text": "borrador dos",
        "analysis": analysis_with(8.0, &["spelling"]),
        "versionId": id,
    });
    let (status, value) = send(app, "POST", "/api/compare", Some(request.to_string())).await;
    assert_eq!(status, StatusCode::OK, "got {value}");
    assert_eq!(value["version"]["name"], "Version 1");
    assert_eq!(value["comparison"]["score_diff"], -3.0);
    assert_eq!(value["comparison"]["is_improvement"], false);
    assert_eq!(value["comparison"]["changed"], json!(["spelling"]));
}

#[tokio::test]
async fn compare_against_unknown_version_is_not_found() {
    let request = json!({
        "text": "texto",
        "analysis": analysis_with(6.0, &[]),
        "versionId": "nope",
    });
    let (status, value) = send(app(Stub::Down), "POST", "/api/compare", Some(request.to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["error"], "unknown version");
}

#[tokio::test]
async fn saving_an_invalid_analysis_is_refused() {
    let app = app(Stub::Down);
    let body = json!({ "text": "t", "analysis": analysis_with(0.0, &[]) }).to_string();
    let (status, _) = send(app.clone(), "POST", "/api/versions", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, listed) = send(app, "GET", "/api/versions", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn unpersisted_theme_is_not_reported_afterwards() {
    let app = app_with_store(Stub::Down, Box::new(ReadOnlyStore));
    let body = json!({ "theme": "dark" }).to_string();
    let (status, value) = send(app.clone(), "PUT", "/api/theme", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(value["details"].as_str().unwrap().contains("read-only"));

    let (status, value) = send(app, "GET", "/api/theme", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["theme"], "system");
}

#[tokio::test]
async fn theme_round_trips_through_the_api() {
    let app = app(Stub::Down);
    let (status, value) = send(app.clone(), "GET", "/api/theme", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["theme"], "system");

    let body = json!({ "theme": "dark" }).to_string();
    let (status, value) = send(app.clone(), "PUT", "/api/theme", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["theme"], "dark");
    assert_eq!(value["resolved"], "dark");

    let (_, value) = send(app, "GET", "/api/theme", None).await;
    assert_eq!(value["theme"], "dark");
}

#[tokio::test]
async fn health_and_index_are_served() {
    let (status, value) = send(app(Stub::Down), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "healthy");

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app(Stub::Down).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
