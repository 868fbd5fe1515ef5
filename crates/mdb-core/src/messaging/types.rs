use crate::domain::{ChatId, ChatKind, MessageRef, UserProfile};

/// Incoming update, already stripped of transport-specific fields.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Message(IncomingMessage),
    Callback(CallbackQuery),
}

impl IncomingUpdate {
    pub fn from_user(&self) -> &UserProfile {
        match self {
            IncomingUpdate::Command(c) => &c.from,
            IncomingUpdate::Message(m) => &m.from,
            IncomingUpdate::Callback(q) => &q.from,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub kind: ChatKind,
}

/// The message an update replies to, if any.
#[derive(Clone, Debug)]
pub struct RepliedMessage {
    pub message: MessageRef,
    pub from: Option<UserProfile>,
    pub from_bot: bool,
}

#[derive(Clone, Debug)]
pub struct Command {
    pub chat: ChatInfo,
    pub from: UserProfile,
    pub message: MessageRef,
    pub name: String,
    pub args: String,
    pub reply_to: Option<RepliedMessage>,
}

/// What a non-command message carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Photo, sticker, voice, ... named by kind only.
    Other(String),
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat: ChatInfo,
    pub from: UserProfile,
    pub message: MessageRef,
    pub content: Content,
    pub forwarded: bool,
    pub reply_to: Option<RepliedMessage>,
}

impl IncomingMessage {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(t) => Some(t.as_str()),
            Content::Other(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub from: UserProfile,
    pub callback_id: String,
    pub data: String,
    pub message: Option<MessageRef>,
    pub chat_kind: Option<ChatKind>,
}

/// Inline keyboard: rows of buttons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(d) => Some(d),
            ButtonAction::Url(_) => None,
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn single(button: InlineButton) -> Self {
        Self::one_per_row(vec![button])
    }

    pub fn push_row(&mut self, row: Vec<InlineButton>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }

    pub fn has_callback(&self, data: &str) -> bool {
        self.buttons().any(|b| b.callback_data() == Some(data))
    }
}
