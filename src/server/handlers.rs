use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::board::{FeedPoller, RefreshOutcome};
use crate::feed::{ChannelRequest, FeedError};

#[must_use]
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

#[must_use]
pub(crate) fn feed_error_response(err: &FeedError) -> Response {
    let status = StatusCode::from_u16(err.kind().status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, err.to_string())
}

/// `POST /` with `{"channelId": "..."}`.
pub(crate) async fn fetch_videos(State(state): State<AppState>, body: Bytes) -> Response {
    let request: ChannelRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ChannelRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected unreadable request body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request body: {}", e),
                );
            }
        }
    };

    let channel_id = request.channel_id.unwrap_or_default();
    match state.client.fetch_channel_videos(&channel_id).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::error!(
                channel = %channel_id,
                kind = ?e.kind(),
                error = %e,
                "Error fetching YouTube feed"
            );
            feed_error_response(&e)
        }
    }
}

fn board_poller(state: &AppState) -> Result<&FeedPoller, Response> {
    state.poller.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            "No channel configured for the sermon board",
        )
    })
}

/// `GET /sermons`
pub(crate) async fn sermon_board(State(state): State<AppState>) -> Response {
    match board_poller(&state) {
        Ok(poller) => Json(poller.snapshot().await).into_response(),
        Err(resp) => resp,
    }
}

/// `POST /sermons/refresh`
pub(crate) async fn refresh_board(State(state): State<AppState>) -> Response {
    let poller = match board_poller(&state) {
        Ok(poller) => poller,
        Err(resp) => return resp,
    };

    match poller.refresh_now().await {
        RefreshOutcome::Refreshed { videos } => {
            Json(json!({ "status": "refreshed", "videos": videos })).into_response()
        }
        RefreshOutcome::Skipped => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "skipped" })),
        )
            .into_response(),
        RefreshOutcome::Failed(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "failed", "error": message })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedRequest {
    id: String,
}

/// `POST /sermons/featured` with `{"id": "..."}`.
pub(crate) async fn select_featured(State(state): State<AppState>, body: Bytes) -> Response {
    let poller = match board_poller(&state) {
        Ok(poller) => poller,
        Err(resp) => return resp,
    };

    let request: FeaturedRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", e),
            )
        }
    };

    if poller.select_featured(&request.id).await {
        Json(poller.snapshot().await).into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Video {} is not on the sermon board", request.id),
        )
    }
}

/// `GET /healthz`
pub(crate) async fn healthz() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

pub(crate) async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
