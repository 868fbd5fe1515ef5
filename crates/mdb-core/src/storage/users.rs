use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::{decode_ts, encode_ts, Database};
use crate::{domain::UserId, Result};

impl Database {
    /// Register a user on first contact. Existing rows are never touched.
    ///
    /// Returns `true` when the user was new.
    pub fn register_user(&self, user: UserId, username: Option<&str>) -> Result<bool> {
        self.register_user_at(user, username, Utc::now())
    }

    pub fn register_user_at(
        &self,
        user: UserId,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO users (user_id, username, first_seen) VALUES (?1, ?2, ?3)",
                rusqlite::params![user.0, username, encode_ts(now)],
            )?;
            Ok(n > 0)
        })
    }

    pub fn user_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        })
    }

    /// Snapshot of every registered id, in ascending id order.
    pub fn all_user_ids(&self) -> Result<Vec<UserId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM users ORDER BY user_id")?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            let mut out = Vec::new();
            for id in rows {
                out.push(UserId(id?));
            }
            Ok(out)
        })
    }

    pub fn first_seen(&self, user: UserId) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT first_seen FROM users WHERE user_id = ?1",
                    [user.0],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        raw.as_deref().map(decode_ts).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn first_seen_is_never_overwritten() {
        let db = Database::open_in_memory().unwrap();
        let t0 = Utc::now() - Duration::days(3);
        assert!(db.register_user_at(UserId(10), Some("alice"), t0).unwrap());
        assert!(!db
            .register_user_at(UserId(10), Some("renamed"), Utc::now())
            .unwrap());

        let seen = db.first_seen(UserId(10)).unwrap().unwrap();
        assert_eq!(seen.timestamp(), t0.timestamp());
        assert_eq!(db.user_count().unwrap(), 1);
    }

    #[test]
    fn snapshot_is_sorted_by_id() {
        let db = Database::open_in_memory().unwrap();
        for id in [30, 10, 20] {
            db.register_user(UserId(id), None).unwrap();
        }
        assert_eq!(
            db.all_user_ids().unwrap(),
            vec![UserId(10), UserId(20), UserId(30)]
        );
        assert_eq!(db.first_seen(UserId(99)).unwrap(), None);
    }
}
