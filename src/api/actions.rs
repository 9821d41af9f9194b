//! Action listing, invocation and agent instructions

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;

use super::ApiState;
use crate::actions::ActionSummary;
use crate::prompt::AgentPrompt;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn list_actions(State(state): State<Arc<ApiState>>) -> Json<Vec<ActionSummary>> {
    Json(state.invoker.available_actions())
}

/// Run one action; an empty body means no arguments
async fn invoke_action(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    if state.session.is_shutting_down() {
        tracing::debug!(action = %name, "turn refused, session shutting down");
        return error(StatusCode::SERVICE_UNAVAILABLE, "session is shutting down");
    }

    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(serde_json::Map::new())
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                return error(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"));
            }
        }
    };

    Json(state.invoker.invoke(&name, &args).await).into_response()
}

async fn prompt(State(state): State<Arc<ApiState>>) -> Json<AgentPrompt> {
    Json(state.prompt.clone())
}

/// Build the `/api` router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/actions", get(list_actions))
        .route("/actions/{name}", post(invoke_action))
        .route("/prompt", get(prompt))
        .with_state(state)
}
