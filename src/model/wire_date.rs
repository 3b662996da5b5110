//! Calendar-date encoding used on the wire.
//!
//! The service accepts `YYYY-MM-DD` and answers with either that form or a
//! full RFC 3339 timestamp (midnight UTC). Both decode to the UTC date.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Result<Date, String> {
    let trimmed = raw.trim();
    if let Ok(date) = Date::parse(trimmed, DATE_FORMAT) {
        return Ok(date);
    }
    OffsetDateTime::parse(trimmed, &Rfc3339)
        .map(|stamp| stamp.to_offset(UtcOffset::UTC).date())
        .map_err(|err| format!("invalid date '{trimmed}': {err}"))
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub(crate) mod required {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(D::Error::custom)
    }
}

/// Optional dates; `null`, a missing field and `""` all mean absent.
pub(crate) mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&format_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_date(text).map(Some).map_err(D::Error::custom),
        }
    }
}

/// Update-only encoding: the outer `None` is skipped by the caller, `Some(None)`
/// is sent as `""` so the service clears the field.
pub(crate) mod clearable {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &Option<Option<Date>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(Some(date)) => serializer.serialize_str(&format_date(*date)),
            Some(None) => serializer.serialize_str(""),
            None => serializer.serialize_none(),
        }
    }
}
