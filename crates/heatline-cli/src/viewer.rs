//! Coverage viewer HTTP routes
//!
//! - `GET /heatline?path=<rel>`: sidebar plus heat-colored source
//! - `GET /heatline/reset?path=<rel>`: reset counters, redirect back
//! - `GET /heatline/summary.json`: summary and sidebar rows
//!
//! Every response carries `Cache-Control: no-cache`; the page is a live
//! view of counters that change between requests. Engine calls read and
//! parse files, so they run on the blocking pool.

use crate::render::{escape_html, render_page, viewer_url, VIEWER_PATH};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use heatline::{
    file_heats, CoverageEngine, FileHeat, FileReport, HeatlineError, HeatlineResult, Summary,
};
use serde::{Deserialize, Serialize};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

/// Shared state of the viewer routes
#[derive(Debug, Clone)]
pub struct ViewerState {
    engine: CoverageEngine,
}

/// `?path=` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    /// Project-relative path; empty means "hottest file"
    pub path: Option<String>,
}

impl ViewQuery {
    fn path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Body of `summary.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBody {
    /// Project aggregate
    pub summary: Summary,
    /// Sidebar rows in path order
    pub files: Vec<FileHeat>,
}

/// Build the viewer router
pub fn router(engine: CoverageEngine) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(VIEWER_PATH) }))
        .route(VIEWER_PATH, get(view))
        .route("/heatline/reset", get(reset))
        .route("/heatline/summary.json", get(summary_json))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(ViewerState { engine })
}

fn collector_unavailable(e: &HeatlineError) -> Response {
    warn!(error = %e, "Coverage snapshot unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(format!("<p>{}</p>", escape_html(&e.to_string()))),
    )
        .into_response()
}

async fn read_source(root: &str, path: &str) -> Vec<String> {
    tokio::fs::read_to_string(format!("{root}{path}"))
        .await
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn task_failed(e: &tokio::task::JoinError) -> Response {
    warn!(error = %e, "Viewer task failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

/// Run engine work off the async workers; collector errors become 503
async fn sample<T, F>(engine: &CoverageEngine, work: F) -> Result<T, Response>
where
    F: FnOnce(&CoverageEngine) -> HeatlineResult<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = engine.clone();
    match tokio::task::spawn_blocking(move || work(&engine)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(collector_unavailable(&e)),
        Err(e) => Err(task_failed(&e)),
    }
}

async fn view(State(state): State<ViewerState>, Query(query): Query<ViewQuery>) -> Response {
    let path = query.path().map(str::to_string);
    let sampled = sample(&state.engine, move |engine| {
        let snapshot = engine.snapshot()?;
        let summary = engine.summary(&snapshot);
        let files = file_heats(&snapshot, &summary);
        let report = engine.file_report(path.as_deref(), &snapshot, &summary);
        Ok((files, report))
    })
    .await;
    let (files, report) = match sampled {
        Ok(sampled) => sampled,
        Err(response) => return response,
    };
    let source = match &report {
        FileReport::Lines { path, .. } => read_source(state.engine.project_root(), path).await,
        _ => Vec::new(),
    };
    Html(render_page(&files, &report, &source)).into_response()
}

async fn reset(State(state): State<ViewerState>, Query(query): Query<ViewQuery>) -> Response {
    let engine = state.engine.clone();
    match tokio::task::spawn_blocking(move || engine.reset()).await {
        Ok(Ok(())) => {
            info!(path = query.path(), "Reset requested from viewer");
            (StatusCode::FOUND, [(header::LOCATION, viewer_url(query.path()))]).into_response()
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Reset failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => task_failed(&e),
    }
}

async fn summary_json(State(state): State<ViewerState>) -> Response {
    let sampled = sample(&state.engine, |engine| {
        let snapshot = engine.snapshot()?;
        let summary = engine.summary(&snapshot);
        let files = file_heats(&snapshot, &summary);
        Ok(SummaryBody { summary, files })
    })
    .await;
    match sampled {
        Ok(body) => Json(body).into_response(),
        Err(response) => response,
    }
}
