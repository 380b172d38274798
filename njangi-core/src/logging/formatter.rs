//! Log line formatting

use chrono::{DateTime, Utc};

/// How log lines are rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// `2026-01-15 10:30:00.000 INFO  [njangi_core::ledger] message`
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse a config value; anything other than "json" renders as text
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Text => format_text(entry),
            LogFormat::Json => format_json(entry),
        }
    }
}

/// A captured log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub location: Option<(String, u32)>,
}

impl LogEntry {
    pub fn new(level: log::Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn from_record(record: &log::Record) -> Self {
        let location = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some((file.to_string(), line)),
            _ => None,
        };
        Self {
            timestamp: Utc::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            location,
        }
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();
    json.insert("timestamp".to_string(), entry.timestamp.to_rfc3339().into());
    json.insert("level".to_string(), entry.level.as_str().into());
    json.insert("target".to_string(), entry.target.clone().into());
    json.insert("message".to_string(), entry.message.clone().into());
    if let Some((file, line)) = &entry.location {
        json.insert("file".to_string(), file.clone().into());
        json.insert("line".to_string(), (*line).into());
    }

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

fn format_text(entry: &LogEntry) -> String {
    format!(
        "{} {:5} [{}] {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        entry.level.as_str(),
        entry.target,
        entry.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_format() {
        let entry = LogEntry::new(log::Level::Info, "njangi_core::ledger", "Contribution added");
        let formatted = LogFormat::Json.format_entry(&entry);

        let parsed: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(parsed["message"], "Contribution added");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["target"], "njangi_core::ledger");
        assert!(parsed.get("file").is_none());
    }

    #[test]
    fn test_text_format() {
        let entry = LogEntry::new(log::Level::Warn, "njangi_core::ledger", "Balance clamped");
        let formatted = LogFormat::Text.format_entry(&entry);

        assert!(formatted.contains("WARN "));
        assert!(formatted.contains("[njangi_core::ledger]"));
        assert!(formatted.ends_with("Balance clamped"));
    }

    #[test]
    fn test_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }
}
