//! Telegram update handlers.
//!
//! Each handler is a thin adapter that converts the teloxide update into the
//! transport-neutral model and hands it to the core dispatcher. Updates from
//! one chat are processed one at a time.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::debug;

use crate::router::AppState;

mod callback;
mod message;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = callback::to_update(&q) else {
        debug!("Dropping callback {} without data", q.id);
        return Ok(());
    };

    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id.0)
        .unwrap_or(q.from.id.0 as i64);
    let _guard = state.chat_locks.lock_chat(chat_id).await;

    // Failures are already reported to the user and logged by the dispatcher.
    let _ = state.app.handle(update).await;
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = message::to_update(&msg) else {
        return Ok(());
    };

    let _guard = state.chat_locks.lock_chat(msg.chat.id.0).await;
    let _ = state.app.handle(update).await;
    Ok(())
}
