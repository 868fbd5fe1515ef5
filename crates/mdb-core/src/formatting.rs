//! Formatting helpers for Telegram HTML parse mode.

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wall-clock stamp for routed records, shifted to the staff's UTC offset.
pub fn record_timestamp(now: DateTime<Utc>, utc_offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Compact "3h 12m" rendering of a remaining duration.
pub fn format_remaining(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    if hours > 0 {
        return format!("{hours}h {mins}m");
    }
    if mins > 0 {
        return format!("{mins}m");
    }
    format!("{secs}s")
}

/// Truncate to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = s.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn stamps_with_offset() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 20, 30, 0).unwrap();
        assert_eq!(record_timestamp(now, 5), "2026-01-03 01:30:00");
        assert_eq!(record_timestamp(now, 0), "2026-01-02 20:30:00");
    }

    #[test]
    fn formats_remaining_time() {
        assert_eq!(format_remaining(Duration::seconds(3 * 3600 + 120)), "3h 2m");
        assert_eq!(format_remaining(Duration::seconds(61)), "1m");
        assert_eq!(format_remaining(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_text("héllo", 2), "hé...");
        assert_eq!(truncate_text("hi", 2), "hi");
    }
}
