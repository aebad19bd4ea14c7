//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for interview sessions.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use interviewer_core::{EngineError, NewSession, Variant};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{CreateSessionPayload, ErrorResponse, Report, SendMessagePayload, Session, TurnResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SessionNotFound(_) => Self::NotFound(err.to_string()),
            EngineError::SessionExists(_)
            | EngineError::SessionFinished(_)
            | EngineError::TurnPending(_) => Self::Conflict(err.to_string()),
            EngineError::InvalidSession(_) => Self::BadRequest(err.to_string()),
            other => Self::InternalServerError(other.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

/// Create a new interview session and run its opening turn.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionPayload,
    responses(
        (status = 201, description = "Session created; the greeting is in `replies`", body = TurnResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let variant: Variant = payload.variant.parse().map_err(ApiError::BadRequest)?;

    let curriculum = match variant {
        Variant::Fixed | Variant::Guided => state.question_bank.load().await?,
        Variant::Generated => Vec::new(),
    };
    let target_count = match variant {
        Variant::Fixed => None,
        Variant::Generated | Variant::Guided => {
            Some(payload.target_count.unwrap_or(state.config.default_target_count))
        }
    };

    let thread_id = Uuid::new_v4().to_string();
    info!(%thread_id, %variant, username = %payload.username, "Creating interview session");

    let outcome = state
        .engine
        .start_session(NewSession {
            thread_id,
            identity: payload.username,
            variant,
            curriculum,
            target_count,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TurnResponse::from(&outcome))))
}

/// Get a specific session by its ID.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = Session),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.engine.session(&id.to_string()).await?;
    Ok((StatusCode::OK, Json(Session::from(&session))))
}

/// Send the candidate's message and run the turn it triggers.
#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    request_body = SendMessagePayload,
    responses(
        (status = 200, description = "Turn completed", body = TurnResponse),
        (status = 400, description = "Empty message", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session finished or an interrupted turn must be resumed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Message content is empty".to_string()));
    }
    let outcome = state.engine.submit(&id.to_string(), &payload.content).await?;
    Ok((StatusCode::OK, Json(TurnResponse::from(&outcome))))
}

/// Re-run a turn that was interrupted by a model or persistence failure.
#[utoipa::path(
    post,
    path = "/sessions/{id}/resume",
    responses(
        (status = 200, description = "Turn completed", body = TurnResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn resume_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.engine.resume(&id.to_string()).await?;
    Ok((StatusCode::OK, Json(TurnResponse::from(&outcome))))
}

/// Get the per-question report and the final rating of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/report",
    responses(
        (status = 200, description = "Interview report", body = Report),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.engine.session(&id.to_string()).await?;
    Ok((StatusCode::OK, Json(Report::from(&session))))
}
