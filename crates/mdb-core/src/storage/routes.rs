use chrono::Utc;
use rusqlite::OptionalExtension;

use super::{encode_ts, Database};
use crate::{
    conversation::FlowKind,
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    Result,
};

/// Correlation key stored for every message the bot relays between a user and a staff chat.
///
/// Replies are attributed through this table instead of by scanning rendered text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutedRecord {
    pub message: MessageRef,
    pub submitter: UserId,
    pub staff_chat: ChatId,
    pub flow: FlowKind,
}

impl Database {
    pub fn save_route(&self, record: RoutedRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO routed_records
                 (chat_id, message_id, submitter_id, staff_chat_id, flow, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    record.message.chat_id.0,
                    record.message.message_id.0,
                    record.submitter.0,
                    record.staff_chat.0,
                    record.flow.as_str(),
                    encode_ts(Utc::now()),
                ],
            )?;
            Ok(())
        })
    }

    pub fn find_route(&self, message: MessageRef) -> Result<Option<RoutedRecord>> {
        let row: Option<(i64, i64, String)> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT submitter_id, staff_chat_id, flow FROM routed_records
                     WHERE chat_id = ?1 AND message_id = ?2",
                    rusqlite::params![message.chat_id.0, message.message_id.0],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?)
        })?;

        let Some((submitter, staff_chat, flow)) = row else {
            return Ok(None);
        };
        let flow = FlowKind::parse(&flow)
            .ok_or_else(|| Error::External(format!("unknown flow in routed_records: {flow}")))?;

        Ok(Some(RoutedRecord {
            message,
            submitter: UserId(submitter),
            staff_chat: ChatId(staff_chat),
            flow,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_finds_correlation_by_message() {
        let db = Database::open_in_memory().unwrap();
        let msg = MessageRef {
            chat_id: ChatId(-100),
            message_id: MessageId(55),
        };
        let rec = RoutedRecord {
            message: msg,
            submitter: UserId(42),
            staff_chat: ChatId(-100),
            flow: FlowKind::Express,
        };
        db.save_route(rec).unwrap();

        assert_eq!(db.find_route(msg).unwrap(), Some(rec));
        let other = MessageRef {
            chat_id: ChatId(-200),
            message_id: MessageId(55),
        };
        assert_eq!(db.find_route(other).unwrap(), None);
    }
}
