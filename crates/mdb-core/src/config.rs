use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

const DEFAULT_CHANNEL_LINK: &str = "https://t.me/";

/// Typed configuration, loaded from the environment (plus an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub admins: Vec<i64>,
    pub express_group_id: ChatId,
    pub support_group_id: ChatId,
    pub channel_link: String,

    // Data files
    pub database_path: PathBuf,
    pub shops_file: PathBuf,
    pub jobs_file: PathBuf,
    pub media_dir: PathBuf,

    // Catalog
    pub catalog_page_size: usize,
    pub recommendations_limit: usize,

    // Moderation / broadcast
    pub ban_hours: i64,
    pub broadcast_delay: Duration,

    // Conversation
    pub timestamp_utc_offset_hours: i32,
    pub session_idle_timeout: Option<Duration>,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admins = parse_csv_i64(env_str("ADMINS"));
        let express_group_id = ChatId(env_i64("EXPRESS_GROUP_ID").ok_or_else(|| {
            Error::Config("EXPRESS_GROUP_ID environment variable is required".to_string())
        })?);
        let support_group_id = ChatId(env_i64("SUPPORT_GROUP_ID").ok_or_else(|| {
            Error::Config("SUPPORT_GROUP_ID environment variable is required".to_string())
        })?);

        let channel_link = normalize_channel_link(env_str("CHANNEL_LINK"));

        let database_path = env_path("DATABASE_PATH").unwrap_or_else(|| PathBuf::from("bot.db"));
        let shops_file = env_path("SHOPS_FILE").unwrap_or_else(|| PathBuf::from("shops.json"));
        let jobs_file = env_path("JOBS_FILE").unwrap_or_else(|| PathBuf::from("jobs.json"));
        let media_dir = env_path("MEDIA_DIR").unwrap_or_else(|| PathBuf::from("media"));

        let catalog_page_size = env_usize("CATALOG_PAGE_SIZE").unwrap_or(10).max(1);
        let recommendations_limit = env_usize("RECOMMENDATIONS_LIMIT").unwrap_or(5);

        let ban_hours = ban_window(env_i64("BAN_HOURS"));
        let broadcast_delay = Duration::from_millis(env_u64("BROADCAST_DELAY_MS").unwrap_or(50));

        let timestamp_utc_offset_hours = env_i64("TIMESTAMP_UTC_OFFSET_HOURS")
            .unwrap_or(5)
            .clamp(-12, 14) as i32;
        let session_idle_timeout = env_u64("SESSION_IDLE_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let audit_log_path =
            env_path("AUDIT_LOG_PATH").unwrap_or_else(|| PathBuf::from("audit.log"));
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(false);

        Ok(Self {
            bot_token,
            admins,
            express_group_id,
            support_group_id,
            channel_link,
            database_path,
            shops_file,
            jobs_file,
            media_dir,
            catalog_page_size,
            recommendations_limit,
            ban_hours,
            broadcast_delay,
            timestamp_utc_offset_hours,
            session_idle_timeout,
            audit_log_path,
            audit_log_json,
        })
    }

    /// Whether `chat_id` is one of the staff chats that receive routed records.
    pub fn is_staff_chat(&self, chat_id: ChatId) -> bool {
        chat_id == self.express_group_id || chat_id == self.support_group_id
    }

    /// Optional media file under `media_dir`, only if it exists on disk.
    pub fn media_file(&self, name: &str) -> Option<PathBuf> {
        if name.trim().is_empty() {
            return None;
        }
        let p = self.media_dir.join(name);
        p.is_file().then_some(p)
    }
}

fn normalize_channel_link(v: Option<String>) -> String {
    match v {
        Some(link) if link.starts_with("http://") || link.starts_with("https://") => link,
        Some(link) => {
            tracing::warn!(
                "CHANNEL_LINK '{link}' is not a valid URL, using {DEFAULT_CHANNEL_LINK}"
            );
            DEFAULT_CHANNEL_LINK.to_string()
        }
        None => DEFAULT_CHANNEL_LINK.to_string(),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    let quoted = val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')));
    if quoted {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

/// Ban windows are kept between one hour and roughly a century.
const MAX_BAN_HOURS: i64 = 24 * 366 * 100;

fn ban_window(hours: Option<i64>) -> i64 {
    hours.unwrap_or(24).clamp(1, MAX_BAN_HOURS)
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        bot_token: "test-token".to_string(),
        admins: vec![1],
        express_group_id: ChatId(-100),
        support_group_id: ChatId(-200),
        channel_link: DEFAULT_CHANNEL_LINK.to_string(),
        database_path: PathBuf::from(":memory:"),
        shops_file: PathBuf::from("shops.json"),
        jobs_file: PathBuf::from("jobs.json"),
        media_dir: PathBuf::from("/nonexistent-mdb-media"),
        catalog_page_size: 10,
        recommendations_limit: 5,
        ban_hours: 24,
        broadcast_delay: Duration::from_millis(0),
        timestamp_utc_offset_hours: 5,
        session_idle_timeout: None,
        audit_log_path: std::env::temp_dir()
            .join(format!("mdb-audit-test-{}.log", std::process::id())),
        audit_log_json: true,
    }
}
