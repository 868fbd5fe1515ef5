use rusqlite::Connection;
use tracing::debug;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            user_id     INTEGER PRIMARY KEY,
            username    TEXT,
            first_seen  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bans (
            user_id     INTEGER PRIMARY KEY,
            ban_until   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shop_clicks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            shop_name   TEXT NOT NULL,
            click_time  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_shop_clicks_name
            ON shop_clicks(shop_name);

        CREATE TABLE IF NOT EXISTS routed_records (
            chat_id        INTEGER NOT NULL,
            message_id     INTEGER NOT NULL,
            submitter_id   INTEGER NOT NULL,
            staff_chat_id  INTEGER NOT NULL,
            flow           TEXT NOT NULL,
            created_at     TEXT NOT NULL,
            PRIMARY KEY (chat_id, message_id)
        );
        ",
    )?;

    debug!("Database migrations complete");
    Ok(())
}
