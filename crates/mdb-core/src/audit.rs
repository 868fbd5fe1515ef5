//! Append-only audit log of moderation and broadcast actions.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, formatting::truncate_text, Result};

const AUDIT_MAX_TEXT: usize = 500;

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    /// `None` for the implicit system actor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AuditEvent {
    fn base(event: &str, actor_id: Option<i64>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            actor_id,
            target_id: None,
            hours: None,
            delivered: None,
            total: None,
            note: None,
        }
    }

    pub fn ban(actor_id: Option<i64>, target_id: i64, hours: i64, reason: &str) -> Self {
        Self {
            target_id: Some(target_id),
            hours: Some(hours),
            note: Some(reason.to_string()),
            ..Self::base("ban", actor_id)
        }
    }

    pub fn unban(actor_id: Option<i64>, target_id: i64, notified: bool) -> Self {
        Self {
            target_id: Some(target_id),
            note: Some(if notified { "notified" } else { "not notified" }.to_string()),
            ..Self::base("unban", actor_id)
        }
    }

    pub fn broadcast(actor_id: i64, delivered: usize, total: usize) -> Self {
        Self {
            delivered: Some(delivered),
            total: Some(total),
            ..Self::base("broadcast", Some(actor_id))
        }
    }

    pub fn escalation(user_id: i64, note: &str) -> Self {
        Self {
            target_id: Some(user_id),
            note: Some(note.to_string()),
            ..Self::base("escalation", None)
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.note {
            event.note = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }

    /// Write, logging instead of failing: the audited action already happened.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.write(event) {
            tracing::warn!("[AUDIT] Failed to write audit event: {e}");
        }
    }
}
