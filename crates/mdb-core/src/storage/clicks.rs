use chrono::{DateTime, Utc};

use super::{encode_ts, Database};
use crate::{domain::UserId, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClickStat {
    pub name: String,
    pub clicks: u64,
}

impl Database {
    /// Append a catalog interaction. Events are never updated or deleted.
    pub fn record_click(&self, user: UserId, item_name: &str) -> Result<()> {
        self.record_click_at(user, item_name, Utc::now())
    }

    pub fn record_click_at(
        &self,
        user: UserId,
        item_name: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO shop_clicks (user_id, shop_name, click_time) VALUES (?1, ?2, ?3)",
                rusqlite::params![user.0, item_name, encode_ts(now)],
            )?;
            Ok(())
        })
    }

    /// Click counts grouped by item name, most clicked first.
    pub fn click_stats(&self) -> Result<Vec<ClickStat>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT shop_name, COUNT(*) AS n FROM shop_clicks
                 GROUP BY shop_name ORDER BY n DESC, shop_name ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ClickStat {
                    name: row.get(0)?,
                    clicks: row.get::<_, i64>(1)?.max(0) as u64,
                })
            })?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.record_click(UserId(1), "Harbor").unwrap();
        db.record_click(UserId(2), "Harbor").unwrap();
        db.record_click(UserId(1), "Anchor").unwrap();
        // Events for unknown users are fine: no referential integrity.
        db.record_click(UserId(404), "Anchor").unwrap();
        db.record_click(UserId(404), "Anchor").unwrap();

        let stats = db.click_stats().unwrap();
        assert_eq!(
            stats,
            vec![
                ClickStat {
                    name: "Anchor".into(),
                    clicks: 3
                },
                ClickStat {
                    name: "Harbor".into(),
                    clicks: 2
                },
            ]
        );
    }

    #[test]
    fn empty_ledger_has_no_stats() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.click_stats().unwrap().is_empty());
    }
}
