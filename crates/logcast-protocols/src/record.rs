//! Log records relayed by the gateway.
//!
//! A [`Record`] is opaque to the gateway: it is produced upstream, relayed
//! verbatim to viewers and never inspected on the way through.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Severity levels understood by the viewer application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace = 10,
    Debug = 20,
    Info = 30,
    Warn = 40,
    Error = 50,
    Fatal = 60,
}

impl LogLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Build a record with the usual `src`/`level`/`msg`/`t` fields.
    pub fn log(src: impl Into<String>, level: LogLevel, msg: impl Into<String>) -> Self {
        Self(json!({
            "src": src.into(),
            "level": level.as_u8(),
            "msg": msg.into(),
            "t": chrono::Utc::now().timestamp_millis(),
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_record_fields() {
        let record = Record::log("app", LogLevel::Warn, "disk almost full");
        let value = record.as_value();
        assert_eq!(value["src"], "app");
        assert_eq!(value["level"], 40);
        assert_eq!(value["msg"], "disk almost full");
        assert!(value["t"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_record_is_transparent() {
        let record = Record::from(json!({"anything": [1, 2, 3]}));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"anything":[1,2,3]}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Fatal);
        assert_eq!(LogLevel::Info.as_u8(), 30);
    }
}
