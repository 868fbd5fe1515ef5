use teloxide::types::CallbackQuery;

use mdb_core::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::{self, IncomingUpdate},
};

use super::message::{chat_kind, profile};

/// Convert a button press. Presses without data cannot be routed and are dropped.
pub(crate) fn to_update(q: &CallbackQuery) -> Option<IncomingUpdate> {
    let data = q.data.clone().filter(|d| !d.is_empty())?;
    let message = q.message.as_ref();

    Some(IncomingUpdate::Callback(types::CallbackQuery {
        from: profile(&q.from),
        callback_id: q.id.clone(),
        data,
        message: message.map(|m| MessageRef {
            chat_id: ChatId(m.chat.id.0),
            message_id: MessageId(m.id.0),
        }),
        chat_kind: message.map(|m| chat_kind(&m.chat)),
    }))
}
