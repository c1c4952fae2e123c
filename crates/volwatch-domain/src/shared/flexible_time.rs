//! Lenient timestamp parsing for persisted records.
//!
//! New records are written as RFC 3339. Older files may hold RFC 2822 strings
//! (`Mon, 15 Jun 2020 12:00:00 GMT`) or SQLite-style `2020-06-15 12:00:00`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::DomainError;

pub fn parse_datetime_flexible(s: &str) -> Result<DateTime<Utc>, DomainError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::Deserialization(format!("Invalid datetime '{s}': {e}")))
}

pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_datetime_flexible(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap();

        assert_eq!(parse_datetime_flexible("2020-06-15T12:00:00Z").unwrap(), expected);
        assert_eq!(
            parse_datetime_flexible("2020-06-15T15:00:00+03:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_datetime_flexible("Mon, 15 Jun 2020 12:00:00 GMT").unwrap(),
            expected
        );
        assert_eq!(parse_datetime_flexible("2020-06-15 12:00:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_datetime_flexible("yesterday").is_err());
    }
}
