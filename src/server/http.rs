use crate::app::dto::*;
use crate::app::engine::AnalysisEngine;
use crate::domain::edge::RelationKind;
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Clone)]
pub struct HttpState {
    pub engine: AnalysisEngine,
}

#[derive(Debug, Clone, Serialize)]
struct ApiErrorBody {
    error: String,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ApiErrorBody { error: msg.into() })).into_response()
}

/// Run an engine call off the async runtime and turn its result into a JSON response.
async fn blocking<T, F>(engine: AnalysisEngine, error_status: StatusCode, f: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&AnalysisEngine) -> Result<T> + Send + 'static,
{
    match spawn_blocking(move || f(&engine)).await {
        Ok(Ok(res)) => Json(res).into_response(),
        Ok(Err(e)) => api_error(error_status, format!("{e:#}")),
        Err(e) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("task join error: {e}"),
        ),
    }
}

pub fn build_router(engine: AnalysisEngine) -> Router {
    let state = Arc::new(HttpState { engine });

    Router::new()
        .route("/health", get(health))
        .route("/summary", get(summary))
        .route("/entities", get(entities))
        .route("/connected", get(connected))
        .route("/edges/{name}", get(edges))
        .route("/inheritance", get(inheritance))
        .route("/entity/{name}", get(entity))
        .route("/export", get(export))
        .route("/reload", post(reload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(engine: AnalysisEngine, addr: SocketAddr) -> Result<()> {
    let app = build_router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<HttpState>>) -> Response {
    match state.engine.health() {
        Ok(res) => Json(res).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn summary(State(state): State<Arc<HttpState>>) -> Response {
    blocking(state.engine.clone(), StatusCode::INTERNAL_SERVER_ERROR, |e| {
        e.summary()
    })
    .await
}

async fn entities(State(state): State<Arc<HttpState>>) -> Response {
    blocking(state.engine.clone(), StatusCode::INTERNAL_SERVER_ERROR, |e| {
        e.entities()
    })
    .await
}

async fn connected(State(state): State<Arc<HttpState>>) -> Response {
    blocking(state.engine.clone(), StatusCode::INTERNAL_SERVER_ERROR, |e| {
        e.connected()
    })
    .await
}

/// Unknown names answer with empty edge sets and `known: false`, not 404.
async fn edges(
    State(state): State<Arc<HttpState>>,
    Path(name): Path<String>,
    Query(q): Query<EdgesQuery>,
) -> Response {
    let kind = match q.kind.as_deref() {
        None => None,
        Some(label) => match RelationKind::from_label(label) {
            Some(kind) => Some(kind),
            None => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown relation kind: {label}"),
                );
            }
        },
    };
    blocking(state.engine.clone(), StatusCode::INTERNAL_SERVER_ERROR, move |e| {
        let edges = e.edges_of(&name)?;
        Ok(match kind {
            Some(kind) => edges.only(kind),
            None => edges,
        })
    })
    .await
}

async fn inheritance(State(state): State<Arc<HttpState>>) -> Response {
    blocking(state.engine.clone(), StatusCode::INTERNAL_SERVER_ERROR, |e| {
        e.inheritance()
    })
    .await
}

async fn entity(State(state): State<Arc<HttpState>>, Path(name): Path<String>) -> Response {
    let engine = state.engine.clone();
    let lookup = name.clone();
    match spawn_blocking(move || engine.entity(&lookup)).await {
        Ok(Ok(Some(res))) => Json(res).into_response(),
        Ok(Ok(None)) => api_error(StatusCode::NOT_FOUND, format!("Entity not found: {name}")),
        Ok(Err(e)) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(e) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("task join error: {e}"),
        ),
    }
}

async fn export(State(state): State<Arc<HttpState>>, Query(q): Query<ExportQuery>) -> Response {
    let engine = state.engine.clone();
    let content_type = match q.format {
        ExportFormat::Json => "application/json",
        ExportFormat::Dot => "text/vnd.graphviz; charset=utf-8",
        ExportFormat::Text => "text/plain; charset=utf-8",
    };
    match spawn_blocking(move || engine.export(q.format)).await {
        Ok(Ok(body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Ok(Err(e)) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(e) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("task join error: {e}"),
        ),
    }
}

async fn reload(State(state): State<Arc<HttpState>>) -> Response {
    blocking(state.engine.clone(), StatusCode::INTERNAL_SERVER_ERROR, |e| {
        e.reload()
    })
    .await
}
