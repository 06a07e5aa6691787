use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Severity of a log entry, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Four-letter code used on the wire: DEBU, INFO, WARN, ERRO
    pub fn code(self) -> &'static str {
        match self {
            Level::Debug => "DEBU",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERRO",
        }
    }

    /// Look up a level by its wire code. Matching is case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "DEBU" => Some(Level::Debug),
            "INFO" => Some(Level::Info),
            "WARN" => Some(Level::Warn),
            "ERRO" => Some(Level::Error),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single parsed log line. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    timestamp: DateTime<Utc>,
    level: Level,
    message: String,
}

impl Entry {
    pub fn new(timestamp: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_level_codes_roundtrip_through_lookup() {
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
            assert_eq!(Level::from_code(level.code()), Some(level));
        }
    }

    #[test]
    fn test_level_lookup_is_case_sensitive() {
        assert_eq!(Level::from_code("info"), None);
        assert_eq!(Level::from_code("Warn"), None);
        assert_eq!(Level::from_code("DEBUG"), None);
    }

    #[test]
    fn test_level_ordering_follows_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_entry_serializes_to_json() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let entry = Entry::new(ts, Level::Warn, "disk almost full");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["timestamp"], "2024-01-01T10:00:00Z");
        assert_eq!(json["level"], "WARN");
        assert_eq!(json["message"], "disk almost full");
    }
}
