//! REST API and SSE routes

use crate::error::ApiError;
use crate::replay::{apply_control, start_playback_task, stop_playback_task, ControlRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use rr_core::geometry::GeometryError;
use rr_core::provider::{EventSummary, SessionData, SessionKind, SessionSelection};
use rr_core::qualifying::{QualifyingResult, QualifyingSegment};
use rr_core::session::{FrameSnapshot, ReplaySession};
use rr_core::wire::{FramesPayload, MetadataPayload, QualifyingTelemetryPayload, TrackPayload};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/years", get(list_years))
        .route("/api/years/:year/events", get(list_events))
        .route("/api/years/:year/rounds/:round/sessions", get(list_sessions))
        .route(
            "/api/years/:year/rounds/:round/sessions/:session/metadata",
            get(session_metadata),
        )
        .route(
            "/api/years/:year/rounds/:round/sessions/:session/track",
            get(session_track),
        )
        .route(
            "/api/years/:year/rounds/:round/sessions/:session/frames",
            get(session_frames).layer(CompressionLayer::new()),
        )
        .route(
            "/api/years/:year/rounds/:round/sessions/:session/qualifying/results",
            get(qualifying_results),
        )
        .route(
            "/api/years/:year/rounds/:round/sessions/:session/qualifying/:driver/:segment",
            get(qualifying_telemetry).layer(CompressionLayer::new()),
        )
        // Replay endpoints
        .route(
            "/api/replay",
            get(replay_info).post(replay_start).delete(replay_delete),
        )
        .route("/api/replay/control", post(replay_control))
        .route("/api/replay/stream", get(replay_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Catalogue Endpoints ===

#[derive(Serialize)]
struct HealthInfo {
    status: &'static str,
    provider: String,
    replay_active: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthInfo> {
    let replay_active = state.replay.read().await.is_some();
    Json(HealthInfo {
        status: "ok",
        provider: state.provider.name().to_string(),
        replay_active,
    })
}

async fn list_years(State(state): State<AppState>) -> Json<Vec<i32>> {
    Json(state.provider.available_years())
}

async fn list_events(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    Ok(Json(state.provider.list_events(year)?))
}

async fn list_sessions(
    State(state): State<AppState>,
    Path((year, round)): Path<(i32, u32)>,
) -> Result<Json<Vec<SessionKind>>, ApiError> {
    Ok(Json(state.provider.available_sessions(year, round)?))
}

// === Session Endpoints ===

/// Load a session off the async runtime; providers may read files or simulate
async fn load_session(state: &AppState, selection: SessionSelection) -> Result<SessionData, ApiError> {
    let provider = state.provider.clone();
    let data = tokio::task::spawn_blocking(move || provider.load_session(&selection))
        .await
        .map_err(|e| ApiError::Internal(format!("Session load task failed: {e}")))??;
    tracing::debug!(session = %selection, frames = data.frames.len(), "Session loaded");
    Ok(data)
}

fn parse_selection(year: i32, round: u32, session: &str) -> Result<SessionSelection, ApiError> {
    let session: SessionKind = session.parse()?;
    Ok(SessionSelection::new(year, round, session))
}

async fn session_metadata(
    State(state): State<AppState>,
    Path((year, round, session)): Path<(i32, u32, String)>,
) -> Result<Json<MetadataPayload>, ApiError> {
    let selection = parse_selection(year, round, &session)?;
    let data = load_session(&state, selection).await?;
    Ok(Json(MetadataPayload::new(&data)))
}

async fn session_track(
    State(state): State<AppState>,
    Path((year, round, session)): Path<(i32, u32, String)>,
) -> Result<Json<TrackPayload>, ApiError> {
    let selection = parse_selection(year, round, &session)?;
    let data = load_session(&state, selection).await?;
    let lap = data.reference_lap.ok_or(GeometryError::NoValidLap)?;
    let payload = TrackPayload::from_reference_lap(&lap, state.replay_config.track_width)?;
    Ok(Json(payload))
}

#[derive(Debug, Default, Deserialize)]
struct FramesQuery {
    format: Option<String>,
}

async fn session_frames(
    State(state): State<AppState>,
    Path((year, round, session)): Path<(i32, u32, String)>,
    Query(query): Query<FramesQuery>,
) -> Result<Response, ApiError> {
    let selection = parse_selection(year, round, &session)?;
    if !selection.session.has_race_frames() {
        return Err(ApiError::BadRequest(format!(
            "Frames are only available for race (R) and sprint (S) sessions, got {}",
            selection.session
        )));
    }

    let payload = FramesPayload::from(load_session(&state, selection).await?);

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(payload).into_response()),
        Some("msgpack") => {
            let bytes = rmp_serde::to_vec_named(&payload)
                .map_err(|e| ApiError::Internal(format!("Failed to encode frames: {e}")))?;
            Ok(([(header::CONTENT_TYPE, "application/msgpack")], bytes).into_response())
        }
        Some(other) => Err(ApiError::BadRequest(format!(
            "Unknown format {other:?}, expected json or msgpack"
        ))),
    }
}

// === Qualifying Endpoints ===

fn parse_qualifying_selection(
    year: i32,
    round: u32,
    session: &str,
) -> Result<SessionSelection, ApiError> {
    let selection = parse_selection(year, round, session)?;
    if !selection.session.is_qualifying() {
        return Err(ApiError::BadRequest(format!(
            "Qualifying endpoints are only available for Q and SQ sessions, got {}",
            selection.session
        )));
    }
    Ok(selection)
}

async fn qualifying_results(
    State(state): State<AppState>,
    Path((year, round, session)): Path<(i32, u32, String)>,
) -> Result<Json<Vec<QualifyingResult>>, ApiError> {
    let selection = parse_qualifying_selection(year, round, &session)?;
    let data = load_session(&state, selection).await?;
    Ok(Json(data.qualifying.results))
}

async fn qualifying_telemetry(
    State(state): State<AppState>,
    Path((year, round, session, driver, segment)): Path<(i32, u32, String, String, String)>,
) -> Result<Json<QualifyingTelemetryPayload>, ApiError> {
    let selection = parse_qualifying_selection(year, round, &session)?;
    let segment: QualifyingSegment = segment.parse()?;
    let data = load_session(&state, selection).await?;

    let lap = data.qualifying.lap(&driver, segment).ok_or_else(|| {
        ApiError::NotFound(format!("No {segment} lap for driver {driver} in {selection}"))
    })?;
    Ok(Json(QualifyingTelemetryPayload::from(lap)))
}

// === Replay Endpoints ===

#[derive(Debug, Deserialize)]
struct ReplayStartRequest {
    year: i32,
    round: u32,
    session: String,
}

/// Load a session, create the replay and start playback
async fn replay_start(
    State(state): State<AppState>,
    Json(request): Json<ReplayStartRequest>,
) -> Result<(StatusCode, Json<FrameSnapshot>), ApiError> {
    {
        let replay = state.replay.read().await;
        if replay.is_some() {
            return Err(ApiError::Conflict(
                "A replay is already active. Delete it first.".to_string(),
            ));
        }
    }

    let selection = parse_selection(request.year, request.round, &request.session)?;
    let data = load_session(&state, selection).await?;
    let session = ReplaySession::new(data, &state.replay_config)?;
    let snapshot = session.snapshot();

    {
        let mut replay = state.replay.write().await;
        // another request may have won the race while we were loading
        if replay.is_some() {
            return Err(ApiError::Conflict(
                "A replay is already active. Delete it first.".to_string(),
            ));
        }
        *replay = Some(session);
    }

    tracing::info!(session = %selection, "Replay started");
    start_playback_task(state.clone()).await;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn replay_info(State(state): State<AppState>) -> Result<Json<FrameSnapshot>, ApiError> {
    let replay = state.replay.read().await;
    let session = replay.as_ref().ok_or_else(ApiError::no_replay)?;
    Ok(Json(session.snapshot()))
}

async fn replay_control(
    State(state): State<AppState>,
    Json(request): Json<ControlRequest>,
) -> Result<Json<FrameSnapshot>, ApiError> {
    let snapshot = {
        let mut replay = state.replay.write().await;
        let session = replay.as_mut().ok_or_else(ApiError::no_replay)?;
        apply_control(session, &request)?;
        session.snapshot()
    };

    state.publish(snapshot.clone());
    Ok(Json(snapshot))
}

async fn replay_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(snapshot) => match Event::default().json_data(&snapshot) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    tracing::error!("Failed to serialize snapshot: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Broadcast stream error: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn replay_delete(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    stop_playback_task(&state).await;

    {
        let mut replay = state.replay.write().await;
        if replay.take().is_none() {
            return Err(ApiError::no_replay());
        }
    }

    tracing::info!("Replay stopped and cleaned up");
    Ok(StatusCode::NO_CONTENT)
}
