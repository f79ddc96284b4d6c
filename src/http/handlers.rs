use super::state::AppState;
use crate::error::RelayError;
use crate::nats::{forward_utterances, publish_events};
use crate::pipeline::{
    RecognitionEvent, SessionConfig, SessionEvent, SessionStats, TranslationSession,
};
use crate::synthesis::{SilentSynthesizer, SpeechSynthesizer, VoiceParams};
use crate::timeline::{srt, PlacedClip, TimelineAssembler, TimelineClip};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Recognition language (e.g., "en-US")
    pub source_lang: Option<String>,

    /// Language synthesized and played back (e.g., "fr")
    pub primary_lang: Option<String>,

    /// Languages delivered as text only
    #[serde(default)]
    pub bridge_langs: Vec<String>,

    /// Voice override for the primary language
    pub voice: Option<VoiceParams>,

    /// Concurrent synthesis calls
    pub pool_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub session_id: String,
    pub sequence_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    /// Clips with opaque payloads (ids, paths, ...)
    pub clips: Vec<TimelineClip<serde_json::Value>>,

    /// Gap inserted after a shifted clip (defaults to the configured gap)
    pub min_gap: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AssembleResponse {
    pub placed: Vec<PlacedClip<serde_json::Value>>,
    pub total_secs: f64,
    pub srt: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/start
/// Start a new translation session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    info!("Starting translation session: {}", session_id);

    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} is already running", session_id),
            );
        }
    }

    let mut config = SessionConfig::from_settings(&state.config.pipeline);
    config.session_id = session_id.clone();
    if let Some(lang) = req.source_lang {
        config.source_lang = lang;
    }
    if let Some(lang) = req.primary_lang {
        config.primary_lang = lang;
    }
    config.bridge_langs = req.bridge_langs;
    config.voice = req.voice.unwrap_or_else(|| state.config.voice.clone());
    if let Some(size) = req.pool_size {
        config.pool_size = size;
    }

    let synthesizer: Arc<dyn SpeechSynthesizer> = match &state.nats {
        Some(nats) => {
            config.synthesis_timeout =
                Some(Duration::from_millis(state.config.nats.request_timeout_ms));
            Arc::new(nats.synthesizer())
        }
        None => {
            warn!("No NATS connection, session {} will synthesize silence", session_id);
            Arc::new(SilentSynthesizer::default())
        }
    };

    let (session, events) = TranslationSession::new(config, synthesizer);
    let session = Arc::new(session);

    if let Err(e) = session.start().await {
        error!("Failed to start session: {}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to start session: {}", e),
        );
    }

    match &state.nats {
        Some(nats) => {
            let subscriber = match nats.subscribe_utterances(&session_id).await {
                Ok(subscriber) => subscriber,
                Err(e) => {
                    error!("Failed to subscribe for session {}: {:#}", session_id, e);
                    session.stop().await;
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to subscribe to utterances: {}", e),
                    );
                }
            };
            tokio::spawn(forward_utterances(subscriber, Arc::clone(&session)));
            tokio::spawn(publish_events(events, Arc::clone(nats), session_id.clone()));
        }
        None => {
            tokio::spawn(log_events(events, session_id.clone()));
        }
    }

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session);
    }

    info!("Translation session started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "running".to_string(),
            message: format!("Session {} started", session_id),
        }),
    )
        .into_response()
}

/// POST /sessions/stop/:session_id
/// Stop a session; clips not yet released are discarded
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping translation session: {}", session_id);

    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match session {
        Some(session) => {
            let stats = session.stop().await;
            (
                StatusCode::OK,
                Json(StopSessionResponse {
                    session_id: session_id.clone(),
                    status: "stopped".to_string(),
                    message: "Session stopped".to_string(),
                    stats,
                }),
            )
                .into_response()
        }
        None => {
            error!("Session {} not found", session_id);
            error_response(StatusCode::NOT_FOUND, format!("Session {} not found", session_id))
        }
    }
}

/// GET /sessions/:session_id/status
/// Get statistics of a running session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => (StatusCode::OK, Json(session.get_stats())).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Session {} not found", session_id)),
    }
}

/// POST /sessions/:session_id/utterances
/// Push one finalized recognition result into a session
pub async fn ingest_utterance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(event): Json<RecognitionEvent>,
) -> impl IntoResponse {
    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    let Some(session) = session else {
        return error_response(StatusCode::NOT_FOUND, format!("Session {} not found", session_id));
    };

    match session.ingest(event).await {
        Ok(sequence_id) => (
            StatusCode::OK,
            Json(IngestResponse {
                session_id,
                sequence_id,
            }),
        )
            .into_response(),
        Err(RelayError::SessionStopped) => {
            error_response(StatusCode::CONFLICT, format!("Session {} is stopped", session_id))
        }
        Err(e) => {
            error!("Failed to ingest utterance: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /timeline/assemble
/// Place clips on a single non-overlapping timeline
pub async fn assemble_timeline(
    State(state): State<AppState>,
    Json(req): Json<AssembleRequest>,
) -> impl IntoResponse {
    let min_gap = req.min_gap.unwrap_or(state.config.timeline.min_gap_secs);
    if !min_gap.is_finite() || min_gap < 0.0 {
        let e = RelayError::InvalidTimeline(format!("min_gap must be >= 0, got {}", min_gap));
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let placed = TimelineAssembler::new(min_gap).assemble(req.clips);
    let total_secs = placed.iter().map(PlacedClip::end).fold(0.0, f64::max);
    let srt = srt::generate(&placed);

    info!("Assembled {} clips over {:.2}s", placed.len(), total_secs);

    (
        StatusCode::OK,
        Json(AssembleResponse {
            placed,
            total_secs,
            srt,
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Output sink for sessions running without NATS
async fn log_events(mut events: mpsc::Receiver<SessionEvent>, session_id: String) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Playback(item) => info!(
                "[{}] playback #{} ({:.2}s): {}",
                session_id, item.sequence_id, item.duration_secs, item.translated_text
            ),
            SessionEvent::Translation(item) => info!(
                "[{}] {} #{}: {}",
                session_id, item.metrics.language_code, item.sequence_id, item.translated_text
            ),
            SessionEvent::Error { message } => {
                error!("[{}] session error: {}", session_id, message)
            }
        }
    }
}
