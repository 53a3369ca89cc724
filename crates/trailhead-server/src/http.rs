//! HTTP routes of the control surface

use crate::control::ControlSurface;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use trailhead_core::errors::{ExError, ExErrorKind};
use trailhead_engine::RefreshOutcome;

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RollbackBody {
    snapshot: Option<String>,
}

pub fn router(control: Arc<ControlSurface>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/admin/backups", get(backups))
        .route("/admin/rollback", post(rollback))
        .route("/admin/refresh", post(refresh))
        .with_state(control)
}

/// Map an error onto the response the admin API promises for it
fn error_response(err: &ExError) -> Response {
    let (status, body) = match err.kind() {
        ExErrorKind::Unauthorised => (StatusCode::UNAUTHORIZED, json!({"error": "unauthorized"})),
        ExErrorKind::NotFound => (StatusCode::NOT_FOUND, json!({"error": "snapshot_not_found"})),
        ExErrorKind::Concurrency => (
            StatusCode::CONFLICT,
            json!({"ok": false, "error": "refresh_in_progress"}),
        ),
        _ => {
            tracing::error!(component = module_path!(), error = %err, "admin call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"ok": false, "error": err.message()}),
            )
        }
    };
    (status, Json(body)).into_response()
}

async fn health(State(control): State<Arc<ControlSurface>>) -> Response {
    Json(control.freshness()).into_response()
}

async fn backups(
    State(control): State<Arc<ControlSurface>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match control.list_backups(query.token.as_deref()) {
        Ok(backups) => Json(json!({ "backups": backups })).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn rollback(
    State(control): State<Arc<ControlSurface>>,
    Query(query): Query<TokenQuery>,
    body: Option<Json<RollbackBody>>,
) -> Response {
    let name = body.and_then(|Json(b)| b.snapshot).unwrap_or_default();
    match control.rollback(query.token.as_deref(), &name).await {
        Ok(promoted) => Json(json!({ "ok": true, "promoted": promoted })).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn refresh(
    State(control): State<Arc<ControlSurface>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match control.force_refresh(query.token.as_deref()).await {
        Ok(outcome @ RefreshOutcome::Promoted(_)) => {
            Json(json!({ "ok": true, "ref": outcome })).into_response()
        }
        Ok(outcome @ RefreshOutcome::Rejected(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "ok": false,
                "ref": outcome,
                "message": "Using last known good snapshot."
            })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
