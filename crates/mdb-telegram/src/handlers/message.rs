use teloxide::types::{Chat, Message, User};

use mdb_core::{
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId, UserProfile},
    messaging::types::{ChatInfo, Command, Content, IncomingMessage, IncomingUpdate, RepliedMessage},
};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub(crate) fn profile(user: &User) -> UserProfile {
    UserProfile {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        full_name: user.full_name(),
    }
}

pub(crate) fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    }
}

fn locator(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

fn content(msg: &Message) -> Content {
    if let Some(text) = msg.text() {
        return Content::Text(text.to_string());
    }
    let kind = if msg.photo().is_some() {
        "photo"
    } else if msg.video().is_some() {
        "video"
    } else if msg.document().is_some() {
        "document"
    } else if msg.voice().is_some() {
        "voice"
    } else if msg.sticker().is_some() {
        "sticker"
    } else {
        "other"
    };
    Content::Other(kind.to_string())
}

fn replied(msg: &Message) -> Option<RepliedMessage> {
    let reply = msg.reply_to_message()?;
    let from = reply.from();
    Some(RepliedMessage {
        message: locator(reply),
        from: from.map(profile),
        from_bot: from.is_some_and(|u| u.is_bot),
    })
}

/// Convert a Telegram message into a command or a plain message update.
///
/// Messages without a sender (channel posts) are dropped.
pub(crate) fn to_update(msg: &Message) -> Option<IncomingUpdate> {
    let from = profile(msg.from()?);
    let chat = ChatInfo {
        id: ChatId(msg.chat.id.0),
        kind: chat_kind(&msg.chat),
    };
    let forwarded = msg.forward_date().is_some();

    if let Some(text) = msg.text() {
        if text.starts_with('/') && !forwarded {
            let (name, args) = parse_command(text);
            return Some(IncomingUpdate::Command(Command {
                chat,
                from,
                message: locator(msg),
                name,
                args,
                reply_to: replied(msg),
            }));
        }
    }

    Some(IncomingUpdate::Message(IncomingMessage {
        chat,
        from,
        message: locator(msg),
        content: content(msg),
        forwarded,
        reply_to: replied(msg),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(v: serde_json::Value) -> Message {
        serde_json::from_value(v).unwrap()
    }

    fn private_text(text: &str) -> serde_json::Value {
        json!({
            "message_id": 7,
            "date": 1700000000,
            "chat": {"id": 42, "type": "private", "first_name": "Ann"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ann", "username": "ann"},
            "text": text
        })
    }

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/Ban@market_bot 50 2"),
            ("ban".to_string(), "50 2".to_string())
        );
        assert_eq!(parse_command("/start"), ("start".to_string(), String::new()));
    }

    #[test]
    fn private_text_becomes_message_update() {
        let update = to_update(&message(private_text("Astana sofa"))).unwrap();
        let IncomingUpdate::Message(m) = update else {
            panic!("expected a message");
        };
        assert_eq!(m.chat.kind, ChatKind::Private);
        assert_eq!(m.text(), Some("Astana sofa"));
        assert_eq!(m.from.handle(), "@ann");
        assert_eq!(m.message.message_id, MessageId(7));
        assert!(!m.forwarded);
        assert!(m.reply_to.is_none());
    }

    #[test]
    fn slash_text_becomes_command() {
        let update = to_update(&message(private_text("/unban 50"))).unwrap();
        let IncomingUpdate::Command(c) = update else {
            panic!("expected a command");
        };
        assert_eq!(c.name, "unban");
        assert_eq!(c.args, "50");
    }

    #[test]
    fn group_reply_to_bot_is_marked() {
        let msg = message(json!({
            "message_id": 9,
            "date": 1700000000,
            "chat": {"id": -100, "type": "supergroup", "title": "Express"},
            "from": {"id": 5, "is_bot": false, "first_name": "Staff"},
            "text": "Offer: 20k",
            "reply_to_message": {
                "message_id": 3,
                "date": 1700000000,
                "chat": {"id": -100, "type": "supergroup", "title": "Express"},
                "from": {"id": 777, "is_bot": true, "first_name": "Bot", "username": "market_bot"},
                "text": "#NewOrder"
            }
        }));
        let Some(IncomingUpdate::Message(m)) = to_update(&msg) else {
            panic!("expected a message");
        };
        assert_eq!(m.chat.kind, ChatKind::Supergroup);
        let reply = m.reply_to.unwrap();
        assert!(reply.from_bot);
        assert_eq!(reply.message.message_id, MessageId(3));
        assert_eq!(reply.message.chat_id, ChatId(-100));
    }
}
