// HTTP API handlers

use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::CoreError;
use crate::types::{
    Asset, MatchParams, PlayerRequest, ReportResultRequest, StartMatchRequest, STAKE_PRESETS,
};
use crate::AppState;

fn error_response(e: CoreError) -> Response {
    let status = match &e {
        CoreError::InsufficientFunds { .. }
        | CoreError::InvalidAmount(_)
        | CoreError::InvalidStake(_)
        | CoreError::AssetUnavailable(_) => StatusCode::BAD_REQUEST,
        CoreError::IllegalTransition { .. } => StatusCode::CONFLICT,
        CoreError::Store(_) => {
            error!("Store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

fn validate_player(player_id: &str) -> Result<(), Response> {
    if player_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Player ID cannot be empty" })),
        ).into_response());
    }
    Ok(())
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "skillblitz",
        "sessions": state.sessions.session_count().await,
        "wallets": state.sessions.wallet_count().await,
        "timestamp": Utc::now()
    }))
}

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let escrow = state.sessions.escrow();
    Json(json!({
        "fee_rate": escrow.fee_rate(),
        "network_fee_usd": escrow.network_fee_usd(),
        "draw_policy": escrow.draw_policy(),
        "stake_presets": STAKE_PRESETS,
        "assets": escrow.assets().all(),
    }))
}

pub async fn get_platform_fees(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "fees_collected": state.sessions.escrow().fees_collected().await
    }))
}

pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    let wallet = state.sessions.connect_wallet(&request.player_id).await;
    (StatusCode::OK, Json(wallet)).into_response()
}

pub async fn disconnect_wallet(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    let wallet = state.sessions.disconnect_wallet(&request.player_id).await;
    (StatusCode::OK, Json(wallet)).into_response()
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    Json(state.sessions.wallet(&player_id).await)
}

pub async fn get_network_fee(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Response {
    let asset: Asset = match asset.parse() {
        Ok(asset) => asset,
        Err(e) => {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": e }))).into_response();
        }
    };

    let fee = state.sessions.escrow().get_estimated_network_fee(asset);
    (StatusCode::OK, Json(json!({
        "asset": asset,
        "network_fee": fee
    }))).into_response()
}

pub async fn start_match(
    State(state): State<AppState>,
    Json(request): Json<StartMatchRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    info!("Received match request from {}: {} {} on {}",
        request.player_id, request.stake, request.asset, request.game);

    let params = MatchParams::new(request.game, request.asset, request.stake);
    match state.sessions.start_match(&request.player_id, params).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn poll_match(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    match state.sessions.poll_match(&request.player_id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn cancel_match(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    match state.sessions.cancel_match(&request.player_id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn report_result(
    State(state): State<AppState>,
    Json(request): Json<ReportResultRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    info!("Result '{}' reported by {}", request.result, request.player_id);

    match state.sessions.report_result(&request.player_id, request.result).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn reset_match(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Response {
    if let Err(resp) = validate_player(&request.player_id) {
        return resp;
    }
    match state.sessions.reset(&request.player_id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    Json(state.sessions.session(&player_id).await)
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    Json(state.sessions.history(&player_id).await)
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(|socket| websocket_connection(socket, state))
}

async fn websocket_connection(socket: WebSocket, state: AppState) {
    info!("WebSocket connection established");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut broadcast_receiver = state.ws_broadcaster.subscribe();

    // The feed is one-way; client frames only matter for close/error
    let client_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(axum::extract::ws::Message::Close(_)) => {
                    info!("WebSocket connection closed by client");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    let broadcast_task = tokio::spawn(async move {
        while let Ok(event) = broadcast_receiver.recv().await {
            let json_message = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize service event: {}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(axum::extract::ws::Message::Text(json_message)).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    supervise_ws_tasks(client_task, broadcast_task).await;
    info!("WebSocket connection closed");
}

/// Waits for either side of a feed connection and aborts the other one
pub async fn supervise_ws_tasks(mut client_task: JoinHandle<()>, mut broadcast_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut client_task => {
            info!("WebSocket client task completed");
            broadcast_task.abort();
        }
        _ = &mut broadcast_task => {
            info!("WebSocket broadcast task completed");
            client_task.abort();
        }
    }
}
