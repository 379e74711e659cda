use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AnalyzeError;
use crate::layout::{layout, render_html, Run};
use crate::model::{AnalysisResult, TextSegment};
use crate::normalize::assign_segment_ids;
use crate::provider::{analyze_text, AnalysisProvider};
use crate::report::{build_report, DiagnosticReport};
use crate::session::{Comparison, ComparisonData, Workspace};
use crate::style::{legend, LegendEntry};
use crate::theme::{ResolvedTheme, ThemeContext, ThemePreference};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared by every request. The server is a single-user tool, so saved
/// versions live in one workspace for the whole process.
pub struct AppState {
    pub provider: Arc<dyn AnalysisProvider>,
    pub theme: Mutex<ThemeContext>,
    pub workspace: Mutex<Workspace>,
}

impl AppState {
    pub fn new(provider: Arc<dyn AnalysisProvider>, theme: ThemeContext) -> Self {
        Self {
            provider,
            theme: Mutex::new(theme),
            workspace: Mutex::new(Workspace::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Error responses
// ---------------------------------------------------------------------------

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        match self {
            AnalyzeError::EmptyInput => {
                error_body(StatusCode::BAD_REQUEST, &self.to_string(), None)
            }
            AnalyzeError::AnalysisInFlight => {
                error_body(StatusCode::CONFLICT, &self.to_string(), None)
            }
            AnalyzeError::ProviderUnavailable(_)
            | AnalyzeError::MalformedResponse(_)
            | AnalyzeError::ClientNetworkError(_) => error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error",
                Some(self.to_string()),
            ),
        }
    }
}

fn error_body(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

/// Analyses posted by the client get the same range checks as provider output.
fn check_posted(analysis: &AnalysisResult) -> Result<(), Response> {
    analysis.validate().map_err(|details| {
        warn!("rejected posted analysis: {details}");
        error_body(StatusCode::BAD_REQUEST, "invalid analysis", Some(details))
    })
}

fn poisoned() -> Response {
    error!("shared state lock poisoned");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `{ text }` -> AnalysisResult. A body that is not a JSON object with a
/// string `text` counts as empty input.
async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AnalyzeError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("rejected analyze body: {rejection}");
            return Err(AnalyzeError::EmptyInput);
        }
    };
    let text = body
        .get("text")
        .and_then(Value::as_str)
        .ok_or(AnalyzeError::EmptyInput)?;

    match analyze_text(state.provider.as_ref(), text).await {
        Ok(result) => {
            info!(
                chars = text.chars().count(),
                segments = result.segments.len(),
                "analysis complete"
            );
            Ok(Json(result))
        }
        Err(e) => {
            if !e.is_input_error() {
                error!("analysis failed: {e}");
            }
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TextSegment>,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse<'a> {
    pub runs: Vec<Run<'a>>,
    pub html: String,
}

async fn layout_runs(Json(mut request): Json<LayoutRequest>) -> Response {
    assign_segment_ids(&mut request.segments);
    let runs = layout(&request.text, &request.segments);
    let html = render_html(&runs);
    Json(LayoutResponse { runs, html }).into_response()
}

async fn report(Json(analysis): Json<AnalysisResult>) -> Result<Json<DiagnosticReport>, Response> {
    check_posted(&analysis)?;
    Ok(Json(build_report(&analysis)))
}

async fn legend_entries() -> Json<Vec<LegendEntry>> {
    Json(legend())
}

// ---------------------------------------------------------------------------
// Saved versions
// ---------------------------------------------------------------------------

/// A text and the analysis computed for it, as shown in the editor.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub text: String,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub overall_score: f64,
    pub segments: usize,
}

impl From<&ComparisonData> for VersionSummary {
    fn from(version: &ComparisonData) -> Self {
        Self {
            id: version.id.clone(),
            name: version.name.clone(),
            timestamp: version.timestamp,
            overall_score: version.analysis.overall_score,
            segments: version.analysis.segments.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub text: String,
    pub analysis: AnalysisResult,
    pub version_id: String,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub version: VersionSummary,
    pub comparison: Comparison,
}

async fn list_versions(State(state): State<Arc<AppState>>) -> Response {
    let Ok(workspace) = state.workspace.lock() else {
        return poisoned();
    };
    let versions: Vec<VersionSummary> = workspace.versions().iter().map(Into::into).collect();
    Json(versions).into_response()
}

async fn save_version(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<Snapshot>,
) -> Response {
    if let Err(rejection) = check_posted(&snapshot.analysis) {
        return rejection;
    }
    let Ok(mut workspace) = state.workspace.lock() else {
        return poisoned();
    };
    workspace.primary.load(snapshot.text, snapshot.analysis);
    match workspace.save_current_version() {
        Some(version) => {
            info!(id = %version.id, name = %version.name, "version saved");
            Json(VersionSummary::from(version)).into_response()
        }
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Compares the posted analysis against a saved version. The score diff is
/// `version - posted`.
async fn compare_version(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Response {
    if let Err(rejection) = check_posted(&request.analysis) {
        return rejection;
    }
    let Ok(mut workspace) = state.workspace.lock() else {
        return poisoned();
    };
    if !workspace.load_version(&request.version_id) {
        return error_body(StatusCode::NOT_FOUND, "unknown version", None);
    }
    workspace.primary.load(request.text, request.analysis);

    let version = workspace
        .versions()
        .iter()
        .find(|v| v.id == request.version_id)
        .map(VersionSummary::from);
    match (version, workspace.comparison()) {
        (Some(version), Some(comparison)) => {
            Json(CompareResponse { version, comparison }).into_response()
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: ThemePreference,
}

#[derive(Debug, Serialize)]
pub struct ThemeState {
    pub theme: ThemePreference,
    /// What `system` resolves to when the client has not said otherwise.
    pub resolved: ResolvedTheme,
}

fn theme_state(theme: &ThemeContext) -> ThemeState {
    ThemeState {
        theme: theme.preference(),
        resolved: theme.resolved(false),
    }
}

async fn get_theme(State(state): State<Arc<AppState>>) -> Response {
    match state.theme.lock() {
        Ok(theme) => Json(theme_state(&theme)).into_response(),
        Err(_) => poisoned(),
    }
}

async fn put_theme(State(state): State<Arc<AppState>>, Json(body): Json<ThemeBody>) -> Response {
    let Ok(mut theme) = state.theme.lock() else {
        return poisoned();
    };
    if let Err(e) = theme.set(body.theme) {
        error!("could not persist theme: {e}");
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
            Some(e.to_string()),
        );
    }
    info!(theme = %body.theme, "theme updated");
    Json(theme_state(&theme)).into_response()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/layout", post(layout_runs))
        .route("/api/report", post(report))
        .route("/api/legend", get(legend_entries))
        .route("/api/versions", get(list_versions).post(save_version))
        .route("/api/compare", post(compare_version))
        .route("/api/theme", get(get_theme).put(put_theme))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until ctrl-c.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("listening on http://{}", listener.local_addr()?);
    if let Some(path) = &config.preferences {
        info!("theme preference stored in {}", path.display());
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("could not listen for ctrl-c: {e}");
            }
        })
        .await
}
