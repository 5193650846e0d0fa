use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::control::{CommandTransport, Direction, MoveRequest};
use crate::forms::{validate_signup, SignupForm};
use crate::state::{CellView, SharedState};

/// Handles shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: SharedState,
    pub transport: Arc<dyn CommandTransport>,
}

impl AppState {
    pub fn new(dashboard: SharedState, transport: Arc<dyn CommandTransport>) -> Self {
        Self {
            dashboard,
            transport,
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/grid", get(api_grid))
        .route("/api/grid/{row}/{col}/water", post(api_water))
        .route("/api/move", post(api_move))
        .route("/api/signup", post(api_signup))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let st = state.dashboard.read().await;
    Json(st.to_status())
}

async fn api_grid(State(state): State<AppState>) -> impl IntoResponse {
    let st = state.dashboard.read().await;
    Json(st.grid_view())
}

async fn api_water(
    State(state): State<AppState>,
    path: Result<Path<(usize, usize)>, PathRejection>,
) -> Response {
    let Path((row, col)) = match path {
        Ok(p) => p,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let mut st = state.dashboard.write().await;
    match st.water(row, col) {
        Ok(cell) => {
            tracing::info!(row, col, "cell watered");
            Json(CellView::new(row, col, &cell)).into_response()
        }
        Err(e) => {
            tracing::warn!(row, col, "water rejected: {e}");
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
    }
}

async fn api_move(
    State(state): State<AppState>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let direction = match Direction::parse(&req.command) {
        Ok(d) => d,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    match state.transport.send_move(direction) {
        Ok(ack) => {
            state.dashboard.write().await.record_move(&ack);
            Json(ack).into_response()
        }
        Err(e) => {
            tracing::error!(%direction, "move failed: {e}");
            state.dashboard.write().await.record_error(format!("move {direction} failed: {e}"));
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

async fn api_signup(body: Result<Json<SignupForm>, JsonRejection>) -> Response {
    let Json(form) = match body {
        Ok(b) => b,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    match validate_signup(&form) {
        Ok(()) => {
            tracing::debug!(name = %form.name, "signup form accepted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(errors) => {
            let details: Vec<_> = errors
                .iter()
                .map(|e| json!({ "code": e, "message": e.message() }))
                .collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": details })),
            )
                .into_response()
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Extractor failures keep axum's status code but use the JSON error body.
fn rejection_response(status: StatusCode, message: String) -> Response {
    tracing::warn!(%status, "request rejected: {message}");
    error_response(status, message)
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve<F>(state: AppState, port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind web port {port}: {e}"))?;

    tracing::info!("web api listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
