use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let documents = state.engine.corpus_count().await.unwrap_or(0);
    let recent: Vec<String> = state
        .engine
        .recent_documents(5)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|d| d.title)
        .collect();

    Ok(Json(json!({
        "status": "ok",
        "documents": documents,
        "recent": recent,
    })))
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// Optional ad-hoc topic; the configured standing topics are used when
    /// absent.
    pub topic: Option<String>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Option<Json<IngestRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = body.and_then(|Json(req)| req.topic);

    let report = match topic.as_deref() {
        Some(topic) => state.engine.ingest_topic(topic).await?,
        None => state.engine.ingest().await?,
    };

    Ok(Json(json!({
        "fetched": report.fetched,
        "added": report.added,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.engine.ask(&body.question).await?;

    Ok(Json(json!({
        "answer": result.answer,
        "grounded": result.grounded,
        "citations": result.citations,
    })))
}
