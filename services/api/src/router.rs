//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        CreateSessionPayload, ErrorResponse, Message, MessageRole, Report, ReportEntry,
        SendMessagePayload, Session, SessionStatus, TurnResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session,
        handlers::get_session,
        handlers::post_message,
        handlers::resume_session,
        handlers::get_report,
    ),
    components(
        schemas(Session, Message, TurnResponse, Report, ReportEntry, CreateSessionPayload, SendMessagePayload, ErrorResponse, SessionStatus, MessageRole)
    ),
    tags(
        (name = "Interviewer API", description = "Tool-driven technical interview sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{id}", get(handlers::get_session))
        .route("/sessions/{id}/messages", post(handlers::post_message))
        .route("/sessions/{id}/resume", post(handlers::resume_session))
        .route("/sessions/{id}/report", get(handlers::get_report))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
