use crate::adapters::telegram::Update;
use crate::app::commands::{CommandDispatcher, IncomingCommand};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// 建立 webhook router：`POST /{secret_path}` 接收 Telegram update
pub fn build_router(dispatcher: Arc<CommandDispatcher>, secret_path: &str) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(&format!("/{}", secret_path), post(receive_update))
        .with_state(dispatcher)
}

/// 一律回 200，失敗只記 log，避免 Telegram 重送同一則 update
async fn receive_update(
    State(dispatcher): State<Arc<CommandDispatcher>>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update_id = update.update_id, "Got update");

    let Some(message) = update.message else {
        return StatusCode::OK;
    };
    let Some(text) = message.text else {
        tracing::debug!(update_id = update.update_id, "Ignoring message without text");
        return StatusCode::OK;
    };

    let requester = message.from.as_ref();
    let incoming = IncomingCommand {
        chat_id: message.chat.id,
        requester_id: requester.map(|u| u.id).unwrap_or(0),
        text,
    };
    if let Some(username) = requester.and_then(|u| u.username.as_deref()) {
        tracing::debug!(username, "Update sender");
    }

    if let Err(e) = dispatcher.handle(&incoming).await {
        tracing::error!(
            update_id = update.update_id,
            "❌ Failed to handle update: {} (Category: {:?})",
            e,
            e.category()
        );
    }
    StatusCode::OK
}
