use crate::domain::event::{parse_flag, storage_precision};
use crate::domain::{EventKind, NewEvent};
use crate::transport::http::types::LogTransactionRequest;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;

/// Optional text column. Empty strings and `null` are absent; scalars are stringified.
pub fn coerce_text(field: &str, v: Option<&JsonValue>) -> Result<Option<String>, String> {
    match v {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.is_empty() => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(format!("{}: expected string, got {}", field, other)),
    }
}

/// Tri-state flag; see [`parse_flag`].
pub fn coerce_bool(field: &str, v: Option<&JsonValue>) -> Result<Option<bool>, String> {
    match v {
        None => Ok(None),
        Some(v) => parse_flag(v).map_err(|e| format!("{}: {}", field, e)),
    }
}

pub fn coerce_int(field: &str, v: Option<&JsonValue>) -> Result<Option<i64>, String> {
    match v {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("{}: expected integer, got {}", field, n)),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("{}: expected integer, got '{}'", field, s)),
        Some(other) => Err(format!("{}: expected integer, got {}", field, other)),
    }
}

/// RFC3339 string or epoch milliseconds.
pub fn coerce_timestamp(field: &str, v: Option<&JsonValue>) -> Result<Option<DateTime<Utc>>, String> {
    match v {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Some(storage_precision(dt.with_timezone(&Utc))))
            .map_err(|_| format!("{}: expected RFC3339 timestamp, got '{}'", field, s)),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|dt| Some(storage_precision(dt)))
            .ok_or_else(|| format!("{}: expected epoch milliseconds, got {}", field, n)),
        Some(other) => Err(format!("{}: expected timestamp, got {}", field, other)),
    }
}

/// Decodes a request body. An empty body is an empty object; the content type is not checked.
pub fn parse_request(body: &[u8]) -> Result<LogTransactionRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LogTransactionRequest::default());
    }
    serde_json::from_slice(body)
}

/// Applies per-field coercion to a raw request.
pub fn coerce_event(req: &LogTransactionRequest) -> Result<NewEvent, String> {
    Ok(NewEvent {
        kind: coerce_text("type", req.kind.as_ref())?.map(EventKind::from),
        user_address: coerce_text("user_address", req.user_address.as_ref())?,
        document_hash: coerce_text("document_hash", req.document_hash.as_ref())?,
        transaction_hash: coerce_text("transaction_hash", req.transaction_hash.as_ref())?,
        verified: coerce_bool("verified", req.verified.as_ref())?,
        error_msg: coerce_text("error_msg", req.error_msg.as_ref())?,
        block_number: coerce_int("block_number", req.block_number.as_ref())?,
        timestamp: coerce_timestamp("timestamp", req.timestamp.as_ref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verified_accepts_numbers_bools_and_strings() {
        assert_eq!(coerce_bool("v", Some(&json!(1))).unwrap(), Some(true));
        assert_eq!(coerce_bool("v", Some(&json!(0))).unwrap(), Some(false));
        assert_eq!(coerce_bool("v", Some(&json!(true))).unwrap(), Some(true));
        assert_eq!(coerce_bool("v", Some(&json!("false"))).unwrap(), Some(false));
        assert_eq!(coerce_bool("v", Some(&json!(null))).unwrap(), None);
        assert_eq!(coerce_bool("v", None).unwrap(), None);
        assert!(coerce_bool("v", Some(&json!("maybe"))).is_err());
    }

    #[test]
    fn empty_strings_are_absent() {
        assert_eq!(coerce_text("t", Some(&json!(""))).unwrap(), None);
        assert_eq!(coerce_text("t", Some(&json!(42))).unwrap(), Some("42".to_string()));
        assert!(coerce_text("t", Some(&json!({"a": 1}))).is_err());
    }

    #[test]
    fn block_number_and_timestamp_coercion() {
        assert_eq!(coerce_int("b", Some(&json!("42"))).unwrap(), Some(42));
        assert_eq!(coerce_int("b", Some(&json!(7))).unwrap(), Some(7));
        assert!(coerce_int("b", Some(&json!(1.5))).is_err());

        let ts = coerce_timestamp("ts", Some(&json!("2024-01-01T00:00:00Z")))
            .unwrap()
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        let ms = coerce_timestamp("ts", Some(&json!(1_704_067_200_000i64)))
            .unwrap()
            .unwrap();
        assert_eq!(ms, ts);
        assert!(coerce_timestamp("ts", Some(&json!("yesterday"))).is_err());

        let fine = coerce_timestamp("ts", Some(&json!("2024-01-01T00:00:00.123456789Z")))
            .unwrap()
            .unwrap();
        assert_eq!(fine.timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn bodyless_request_is_an_empty_object() {
        let req = parse_request(b"").unwrap();
        assert_eq!(coerce_event(&req).unwrap(), NewEvent::default());
        assert!(parse_request(b"  \n").is_ok());
        assert!(parse_request(b"{not json").is_err());
        assert!(parse_request(b"[1, 2]").is_err());
    }

    #[test]
    fn empty_request_coerces_to_empty_event() {
        let event = coerce_event(&LogTransactionRequest::default()).unwrap();
        assert_eq!(event, NewEvent::default());
    }

    #[test]
    fn client_payload_shape_is_accepted() {
        let req: LogTransactionRequest = serde_json::from_value(json!({
            "type": "verify",
            "user_address": "0xabc",
            "document_hash": "0x111",
            "transaction_hash": null,
            "block_number": null,
            "verified": 0,
            "error_msg": null,
            "timestamp": "2024-05-01T10:00:00.123Z"
        }))
        .unwrap();
        let event = coerce_event(&req).unwrap();
        assert_eq!(event.kind, Some(EventKind::Verify));
        assert_eq!(event.verified, Some(false));
        assert_eq!(event.transaction_hash, None);
        assert!(event.timestamp.is_some());
    }
}
