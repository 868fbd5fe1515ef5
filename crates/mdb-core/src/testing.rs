//! In-process messenger double shared by the async tests.

use std::{
    collections::HashSet,
    path::Path,
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Send {
        at: MessageRef,
        html: String,
        keyboard: Option<InlineKeyboard>,
    },
    Edit {
        msg: MessageRef,
        html: String,
        keyboard: Option<InlineKeyboard>,
    },
    Delete(MessageRef),
    Forward {
        to: ChatId,
        source: MessageRef,
    },
    Answer {
        id: String,
        text: Option<String>,
    },
}

#[derive(Default)]
pub(crate) struct FakeMessenger {
    next_id: Mutex<i32>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<i64>>,
    on_forward: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FakeMessenger {
    /// Every send or forward to `chat` fails with `Error::Delivery` from now on.
    pub(crate) fn fail_delivery_to(&self, chat: ChatId) {
        self.failing.lock().unwrap().insert(chat.0);
    }

    /// Run `hook` once, right after the next successful forward.
    pub(crate) fn on_first_forward(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_forward.lock().unwrap() = Some(Box::new(hook));
    }

    fn deliver(&self, chat: ChatId) -> Result<MessageRef> {
        if self.failing.lock().unwrap().contains(&chat.0) {
            return Err(Error::Delivery(format!("chat {} unreachable", chat.0)));
        }
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(*id),
        })
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Messages (text or photo captions) delivered to `chat`, in order.
    pub(crate) fn sent_to(&self, chat: ChatId) -> Vec<(MessageRef, String, Option<InlineKeyboard>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { at, html, keyboard } if at.chat_id == chat => {
                    Some((at, html, keyboard))
                }
                _ => None,
            })
            .collect()
    }

    pub(crate) fn forwards(&self) -> Vec<(ChatId, MessageRef)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Forward { to, source } => Some((to, source)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn edits(&self) -> Vec<(MessageRef, String, Option<InlineKeyboard>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit {
                    msg,
                    html,
                    keyboard,
                } => Some((msg, html, keyboard)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn answers(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Answer { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn record_send(
        &self,
        chat: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let at = self.deliver(chat)?;
        self.push(Call::Send {
            at,
            html: html.to_string(),
            keyboard,
        });
        Ok(at)
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.record_send(chat_id, html, None)
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.record_send(chat_id, html, Some(keyboard))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        _photo: &Path,
        caption_html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.record_send(chat_id, caption_html, keyboard)
    }

    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        self.push(Call::Edit {
            msg,
            html: html.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.push(Call::Delete(msg));
        Ok(())
    }

    async fn forward_message(&self, to: ChatId, source: MessageRef) -> Result<MessageRef> {
        let at = self.deliver(to)?;
        self.push(Call::Forward { to, source });
        let hook = self.on_forward.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(at)
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.push(Call::Answer {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}
