use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tracing::info;

use super::{decode_ts, encode_ts, Database};
use crate::{domain::UserId, Result};

impl Database {
    /// Insert or replace the ban for `user`. The expiry is not validated.
    pub fn set_ban(&self, user: UserId, expires_at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO bans (user_id, ban_until) VALUES (?1, ?2)",
                rusqlite::params![user.0, encode_ts(expires_at)],
            )?;
            Ok(())
        })
    }

    /// Remove the ban for `user`; absent records are not an error.
    pub fn clear_ban(&self, user: UserId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM bans WHERE user_id = ?1", [user.0])?;
            Ok(())
        })
    }

    /// Whether `user` is currently banned. Expired records are deleted on read.
    pub fn is_banned(&self, user: UserId) -> Result<bool> {
        self.is_banned_at(user, Utc::now())
    }

    pub fn is_banned_at(&self, user: UserId, now: DateTime<Utc>) -> Result<bool> {
        let Some(raw) = self.ban_row(user)? else {
            return Ok(false);
        };
        let until = decode_ts(&raw)?;
        if now < until {
            return Ok(true);
        }

        // Only delete the row we observed, so a concurrent re-ban survives.
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM bans WHERE user_id = ?1 AND ban_until = ?2",
                rusqlite::params![user.0, raw],
            )?;
            Ok(())
        })?;
        info!("Ban for user {} expired at {until}, removed", user.0);
        Ok(false)
    }

    /// Raw expiry of the stored record, expired or not.
    pub fn ban_expiry(&self, user: UserId) -> Result<Option<DateTime<Utc>>> {
        self.ban_row(user)?.as_deref().map(decode_ts).transpose()
    }

    fn ban_row(&self, user: UserId) -> Result<Option<String>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT ban_until FROM bans WHERE user_id = ?1",
                    [user.0],
                    |row| row.get(0),
                )
                .optional()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn ban_is_active_until_expiry_then_lazily_reaped() {
        let db = Database::open_in_memory().unwrap();
        let u = UserId(7);
        let now = Utc::now();
        db.set_ban(u, now + Duration::hours(1)).unwrap();

        assert!(db.is_banned_at(u, now).unwrap());
        assert!(db.is_banned_at(u, now + Duration::minutes(59)).unwrap());

        // Exactly at expiry the ban is over.
        assert!(!db.is_banned_at(u, now + Duration::hours(1)).unwrap());
        assert_eq!(db.ban_expiry(u).unwrap(), None);
    }

    #[test]
    fn clear_ban_on_unknown_user_is_noop() {
        let db = Database::open_in_memory().unwrap();
        db.clear_ban(UserId(99)).unwrap();
        assert!(!db.is_banned(UserId(99)).unwrap());
    }

    #[test]
    fn set_ban_twice_with_same_expiry_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let u = UserId(3);
        let until = Utc::now() + Duration::hours(24);
        db.set_ban(u, until).unwrap();
        let first = db.ban_expiry(u).unwrap();
        db.set_ban(u, until).unwrap();
        assert_eq!(db.ban_expiry(u).unwrap(), first);
        assert!(db.is_banned(u).unwrap());
    }

    #[test]
    fn set_ban_replaces_previous_expiry() {
        let db = Database::open_in_memory().unwrap();
        let u = UserId(4);
        let now = Utc::now();
        db.set_ban(u, now + Duration::hours(24)).unwrap();
        db.set_ban(u, now - Duration::seconds(1)).unwrap();
        assert!(!db.is_banned_at(u, now).unwrap());
    }

    #[test]
    fn clear_ban_lifts_active_ban() {
        let db = Database::open_in_memory().unwrap();
        let u = UserId(5);
        db.set_ban(u, Utc::now() + Duration::hours(2)).unwrap();
        db.clear_ban(u).unwrap();
        assert!(!db.is_banned(u).unwrap());
    }
}
