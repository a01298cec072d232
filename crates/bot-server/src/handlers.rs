//! HTTP Handlers

use std::collections::HashMap;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use command_core::{CommandCall, CommandReply, CommandSchema};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub data_source: String,
    pub commands: usize,
    pub uptime_secs: u64,
}

/// Body of `POST /api/commands/{name}`; an empty body means no arguments
#[derive(Debug, Default, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/commands", get(list_commands))
        .route("/api/commands/{name}", post(run_command))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Banner for uptime pingers
pub async fn index() -> &'static str {
    "stock-bot is running 📈"
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        data_source: state.source.name().to_string(),
        commands: state.commands.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn list_commands(State(state): State<AppState>) -> Json<Vec<CommandSchema>> {
    Json(state.commands.schemas())
}

/// Run one slash command with JSON arguments
pub async fn run_command(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<CommandReply>) {
    let request: CommandRequest = if body.is_empty() {
        CommandRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(command = %name, error = %e, "malformed command body");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(CommandReply::failure(name, format!("Invalid request body: {e}"))),
                );
            }
        }
    };

    if state.commands.get(&name).is_none() {
        tracing::warn!(command = %name, "unknown command");
        return (
            StatusCode::NOT_FOUND,
            Json(CommandReply::failure(&name, format!("Unknown command: /{name}"))),
        );
    }

    let mut call = CommandCall::new(name);
    call.arguments = request.arguments;
    call.id = request.id;
    call.invoked_by = request.user;

    (StatusCode::OK, Json(state.commands.dispatch(&call).await))
}
