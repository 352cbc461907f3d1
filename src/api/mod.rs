// HTTP surface consumed by the game UI

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::AppState;

pub mod handlers;

use handlers::{
    cancel_match, connect_wallet, disconnect_wallet, get_config, get_history, get_network_fee,
    get_platform_fees, get_session, get_wallet, health_check, poll_match, report_result,
    reset_match, start_match, websocket_handler,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/config", get(get_config))
        .route("/platform/fees", get(get_platform_fees))
        // Wallet
        .route("/wallet/connect", post(connect_wallet))
        .route("/wallet/disconnect", post(disconnect_wallet))
        .route("/wallet/:player_id", get(get_wallet))
        // Escrow
        .route("/escrow/fee/:asset", get(get_network_fee))
        // Match lifecycle
        .route("/matches/start", post(start_match))
        .route("/matches/poll", post(poll_match))
        .route("/matches/cancel", post(cancel_match))
        .route("/matches/result", post(report_result))
        .route("/matches/reset", post(reset_match))
        .route("/sessions/:player_id", get(get_session))
        .route("/history/:player_id", get(get_history))
        .route("/ws", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
