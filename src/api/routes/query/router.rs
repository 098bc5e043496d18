//! Router for the query API

use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, sse::Event, sse::KeepAlive, sse::Sse},
    routing::{get, post},
};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use crate::api::state::AppState;
use crate::sqlgen::{QueryEvent, generate_and_run};

type SharedState = Arc<RwLock<AppState>>;

/// Generate a guarded SQL query from a natural language prompt and
/// stream progress as server-sent events
async fn query_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::QueryRequest>,
) -> Result<impl IntoResponse, crate::api::public::ApiError> {
    if payload.prompt.trim().is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "Prompt is required").into_response());
    }

    let (db, sessions, llm_api_hostname, llm_api_key, llm_model) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.db.clone(),
            Arc::clone(&shared_state.sessions),
            shared_state.config.llm_api_hostname.clone(),
            shared_state.config.llm_api_key.clone(),
            shared_state.config.llm_model.clone(),
        )
    };

    let (tx, rx) = mpsc::unbounded_channel::<QueryEvent>();

    tokio::spawn(async move {
        let result = generate_and_run(
            tx.clone(),
            &sessions,
            &db,
            &payload.prompt,
            payload.confirm_update,
            &payload.session_id,
            &llm_api_hostname,
            &llm_api_key,
            &llm_model,
        )
        .await;

        // Once the stream has started every outcome is reported on
        // it, including unexpected failures, so the caller always
        // sees a single terminal frame
        if let Err(e) = result {
            tracing::error!("Query handler error: {}. Root cause: {}", e, e.root_cause());
            let _ = tx.send(QueryEvent::Fatal(format!("Something went wrong: {}", e)));
        }
    });

    let sse_stream = UnboundedReceiverStream::new(rx)
        .map(|event| futures::stream::iter(event.frames()))
        .flatten()
        .map(|frame| Ok::<Event, Infallible>(Event::default().data(frame)));

    let resp = Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_millis(100)),
        )
        .into_response();

    Ok(resp)
}

/// Get the in-memory transcript for a single session
async fn session_transcript(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, crate::api::public::ApiError> {
    let sessions = {
        let shared_state = state.read().expect("Unable to read shared state");
        Arc::clone(&shared_state.sessions)
    };

    match sessions.transcript(&id) {
        Some(transcript) => {
            Ok(axum::Json(public::TranscriptResponse { transcript }).into_response())
        }
        None => Ok((StatusCode::NOT_FOUND, format!("Session {} not found", id)).into_response()),
    }
}

/// List the session ids currently resident in memory
async fn session_list(
    State(state): State<SharedState>,
) -> Result<axum::Json<public::SessionsResponse>, crate::api::public::ApiError> {
    let sessions = {
        let shared_state = state.read().expect("Unable to read shared state");
        Arc::clone(&shared_state.sessions)
    };

    Ok(axum::Json(public::SessionsResponse {
        sessions: sessions.session_ids(),
    }))
}

/// Create the query router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(query_handler))
        .route("/sessions", get(session_list))
        .route("/{id}", get(session_transcript))
}
