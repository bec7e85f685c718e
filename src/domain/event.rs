//! Event records: one logged upload or verify attempt.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use utoipa::ToSchema;

/// Kind of attempt an event describes.
///
/// The wire format is an open string; the four known values get their own variant
/// and anything else is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Upload,
    UploadFailed,
    Verify,
    VerifyFailed,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Upload => "upload",
            EventKind::UploadFailed => "upload_failed",
            EventKind::Verify => "verify",
            EventKind::VerifyFailed => "verify_failed",
            EventKind::Other(s) => s,
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "upload" => EventKind::Upload,
            "upload_failed" => EventKind::UploadFailed,
            "verify" => EventKind::Verify,
            "verify_failed" => EventKind::VerifyFailed,
            _ => EventKind::Other(s),
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        EventKind::from(s.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger column text for the `verified` field of a record.
///
/// `verified` means "write succeeded" for uploads and "hash exists on-chain" for
/// verifications, so the text depends on the kind.
pub fn verified_display(kind: Option<&EventKind>, verified: Option<bool>) -> &'static str {
    match kind {
        Some(EventKind::Verify) => match verified {
            Some(true) => "Yes",
            Some(false) => "No",
            None => "-",
        },
        Some(EventKind::Upload) => "Uploaded",
        Some(EventKind::UploadFailed) => "Upload Failed",
        Some(EventKind::VerifyFailed) => "Verify Failed",
        Some(EventKind::Other(_)) | None => "-",
    }
}

/// Timestamps are kept at microsecond precision, the finest the store keeps.
pub fn storage_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

/// Reads a tri-state flag from loosely typed JSON: bool, number (non-zero is true)
/// or a boolean-ish string. An empty string is absent.
pub fn parse_flag(v: &JsonValue) -> Result<Option<bool>, String> {
    match v {
        JsonValue::Null => Ok(None),
        JsonValue::Bool(b) => Ok(Some(*b)),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => Ok(Some(f != 0.0)),
            None => Err(format!("expected bool, got {}", n)),
        },
        JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "true" | "t" | "1" => Ok(Some(true)),
            "false" | "f" | "0" => Ok(Some(false)),
            _ => Err(format!("expected bool, got '{}'", s)),
        },
        other => Err(format!("expected bool, got {}", other)),
    }
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(v) => parse_flag(&v).map_err(serde::de::Error::custom),
    }
}

/// An event as submitted for insertion. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewEvent {
    #[serde(rename = "type", default)]
    #[schema(value_type = Option<String>, example = "upload")]
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub user_address: Option<String>,
    #[serde(default)]
    pub document_hash: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub block_number: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn user_address(mut self, address: impl Into<String>) -> Self {
        self.user_address = Some(address.into());
        self
    }

    pub fn document_hash(mut self, hash: impl Into<String>) -> Self {
        self.document_hash = Some(hash.into());
        self
    }

    pub fn transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }

    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(storage_precision(at));
        self
    }

    /// Fills a missing timestamp with `now` and produces the stored shape.
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> EventRecord {
        EventRecord {
            id,
            kind: self.kind,
            user_address: self.user_address,
            document_hash: self.document_hash,
            transaction_hash: self.transaction_hash,
            verified: self.verified,
            error_msg: self.error_msg,
            block_number: self.block_number,
            timestamp: storage_precision(self.timestamp.unwrap_or(now)),
        }
    }
}

/// A stored, immutable event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    pub id: i64,
    #[serde(rename = "type")]
    #[schema(value_type = Option<String>, example = "verify")]
    pub kind: Option<EventKind>,
    pub user_address: Option<String>,
    pub document_hash: Option<String>,
    pub transaction_hash: Option<String>,
    /// Relational backends may hand this back as 0/1.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub verified: Option<bool>,
    pub error_msg: Option<String>,
    pub block_number: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn verified_display(&self) -> &'static str {
        verified_display(self.kind.as_ref(), self.verified)
    }

    /// Whether the on-chain write succeeded. `None` for non-upload records.
    pub fn action_succeeded(&self) -> Option<bool> {
        match self.kind {
            Some(EventKind::Upload) | Some(EventKind::UploadFailed) => self.verified,
            _ => None,
        }
    }

    /// Result of the existence check. `None` unless the check actually completed.
    pub fn document_verified(&self) -> Option<bool> {
        match self.kind {
            Some(EventKind::Verify) => self.verified,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_known_and_unknown_strings() {
        for s in ["upload", "upload_failed", "verify", "verify_failed", "audit"] {
            let kind = EventKind::from(s);
            assert_eq!(String::from(kind.clone()), s);
            assert_eq!(kind.as_str(), s);
        }
        assert_eq!(EventKind::from("audit"), EventKind::Other("audit".to_string()));
    }

    #[test]
    fn display_derivation_covers_every_kind() {
        assert_eq!(verified_display(Some(&EventKind::Verify), Some(true)), "Yes");
        assert_eq!(verified_display(Some(&EventKind::Verify), Some(false)), "No");
        assert_eq!(verified_display(Some(&EventKind::Upload), Some(true)), "Uploaded");
        assert_eq!(
            verified_display(Some(&EventKind::UploadFailed), Some(false)),
            "Upload Failed"
        );
        assert_eq!(
            verified_display(Some(&EventKind::VerifyFailed), Some(false)),
            "Verify Failed"
        );
        assert_eq!(verified_display(Some(&EventKind::from("audit")), Some(true)), "-");
        assert_eq!(verified_display(None, None), "-");
    }

    #[test]
    fn record_serializes_type_field() {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = NewEvent::new(EventKind::Upload)
            .user_address("0xabc")
            .verified(true)
            .timestamp(at)
            .into_record(7, Utc::now());

        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["id"], json!(7));
        assert_eq!(v["type"], json!("upload"));
        assert_eq!(v["verified"], json!(true));
        assert_eq!(v["transaction_hash"], json!(null));
        assert_eq!(v["timestamp"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn missing_timestamp_defaults_to_now() {
        let now = Utc::now();
        let record = NewEvent::default().into_record(1, now);
        assert_eq!(record.timestamp, now.trunc_subsecs(6));
        assert!(record.kind.is_none());
    }

    #[test]
    fn overloaded_verified_splits_by_kind() {
        let upload = NewEvent::new(EventKind::Upload).verified(true).into_record(1, Utc::now());
        assert_eq!(upload.action_succeeded(), Some(true));
        assert_eq!(upload.document_verified(), None);

        let negative = NewEvent::new(EventKind::Verify).verified(false).into_record(2, Utc::now());
        assert_eq!(negative.document_verified(), Some(false));
        assert_eq!(negative.action_succeeded(), None);

        let failed = NewEvent::new(EventKind::VerifyFailed)
            .verified(false)
            .into_record(3, Utc::now());
        assert_eq!(failed.document_verified(), None);
    }

    #[test]
    fn timestamps_are_kept_to_the_microsecond() {
        let at = DateTime::parse_from_rfc3339("2999-06-01T00:00:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = NewEvent::new(EventKind::Upload).timestamp(at);
        let expected = DateTime::parse_from_rfc3339("2999-06-01T00:00:00.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(event.timestamp, Some(expected));
        assert_eq!(event.into_record(1, Utc::now()).timestamp, expected);
    }

    #[test]
    fn record_accepts_integer_and_string_flags() {
        let records: Vec<EventRecord> = serde_json::from_value(json!([
            {"id": 2, "type": "verify", "verified": 0, "timestamp": "2024-01-01T00:00:01.000Z"},
            {"id": 1, "type": "upload", "user_address": "0xabc", "document_hash": "0x111",
             "transaction_hash": "0xdead", "verified": 1, "error_msg": null, "block_number": null,
             "timestamp": "2024-01-01T00:00:00.000Z"},
            {"id": 3, "type": "verify", "verified": "true", "timestamp": "2024-01-01T00:00:02Z"},
            {"id": 4, "timestamp": "2024-01-01T00:00:03Z"}
        ]))
        .unwrap();
        assert_eq!(records[0].verified, Some(false));
        assert_eq!(records[1].verified, Some(true));
        assert_eq!(records[1].verified_display(), "Uploaded");
        assert_eq!(records[2].verified, Some(true));
        assert_eq!(records[3].verified, None);

        let bad = serde_json::from_value::<EventRecord>(
            json!({"id": 5, "verified": "maybe", "timestamp": "2024-01-01T00:00:00Z"}),
        );
        assert!(bad.is_err());
    }
}
