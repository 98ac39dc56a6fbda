//! # Format Validators
//!
//! The table of `format` values the tester understands. OpenAPI allows any
//! format name, so formats missing from the table are accepted unchecked.

use std::net::{Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// Checks whether a value is well formed for one format.
pub type FormatCheck = fn(&Value) -> bool;

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").ok());

/// Every recognised format, with its check and a placeholder value that
/// passes the check (used for example derivation).
const FORMATS: &[(&str, FormatCheck, &str)] = &[
    ("date", is_date, "2024-01-01"),
    ("date-time", is_date_time, "2024-01-01T00:00:00Z"),
    ("time", is_time, "12:00:00"),
    ("byte", is_base64, "c3RyaW5n"),
    ("binary", is_string, "string"),
    ("email", is_email, "user@example.com"),
    ("uri", is_url, "https://example.com"),
    ("url", is_url, "https://example.com"),
    ("ipv4", is_ipv4, "127.0.0.1"),
    ("ipv6", is_ipv6, "::1"),
    ("uuid", is_uuid, "3fa85f64-5717-4562-b3fc-2c963f66afa6"),
    ("double", is_number, ""),
    ("float", is_number, ""),
    ("int32", is_int32, ""),
    ("int64", is_int64, ""),
];

/// The check for `format`, if the format is recognised.
pub fn lookup(format: &str) -> Option<FormatCheck> {
    FORMATS.iter().find(|(name, ..)| *name == format).map(|(_, check, _)| *check)
}

/// A string value that passes `format`, for string formats only.
pub fn placeholder(format: &str) -> Option<&'static str> {
    FORMATS
        .iter()
        .find(|(name, ..)| *name == format)
        .map(|(_, _, example)| *example)
        .filter(|example| !example.is_empty())
}

/// `Some(true|false)` for a recognised format, `None` otherwise.
pub fn validate(format: &str, data: &Value) -> Option<bool> {
    lookup(format).map(|check| check(data))
}

fn is_string(data: &Value) -> bool {
    data.is_string()
}

fn is_number(data: &Value) -> bool {
    data.is_number()
}

fn is_int32(data: &Value) -> bool {
    data.as_i64().is_some_and(|n| i32::try_from(n).is_ok())
}

fn is_int64(data: &Value) -> bool {
    data.is_i64()
}

fn is_date(data: &Value) -> bool {
    data.as_str()
        .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

fn is_date_time(data: &Value) -> bool {
    data.as_str().is_some_and(|s| {
        DateTime::parse_from_rfc3339(s).is_ok()
            || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
    })
}

fn is_time(data: &Value) -> bool {
    data.as_str().is_some_and(|s| {
        let local = strip_offset(s);
        NaiveTime::parse_from_str(local, "%H:%M:%S%.f").is_ok()
    })
}

/// Drop a trailing `Z` or `±hh:mm` offset from a time of day.
fn strip_offset(s: &str) -> &str {
    if let Some(stripped) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return stripped;
    }
    match s.rfind(&['+', '-'][..]) {
        Some(idx) if idx >= 8 => &s[..idx],
        _ => s,
    }
}

fn is_base64(data: &Value) -> bool {
    data.as_str().is_some_and(|s| BASE64.decode(s).is_ok())
}

fn is_email(data: &Value) -> bool {
    data.as_str()
        .is_some_and(|s| EMAIL.as_ref().is_some_and(|re| re.is_match(s)))
}

fn is_url(data: &Value) -> bool {
    data.as_str().is_some_and(|s| Url::parse(s).is_ok())
}

fn is_ipv4(data: &Value) -> bool {
    data.as_str().is_some_and(|s| s.parse::<Ipv4Addr>().is_ok())
}

fn is_ipv6(data: &Value) -> bool {
    data.as_str().is_some_and(|s| s.parse::<Ipv6Addr>().is_ok())
}

fn is_uuid(data: &Value) -> bool {
    data.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok())
}
