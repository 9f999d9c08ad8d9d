use crate::error::{ReportError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open reporting period `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(ReportError::InvertedWindow {
                start: iso(&start),
                end: iso(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from ISO 8601 strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_iso8601(start)?, parse_iso8601(end)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", iso(&self.start), iso(&self.end))
    }
}

/// Parse an RFC 3339 timestamp, or a bare `yyyy-mm-dd` date taken as UTC midnight
pub fn parse_iso8601(value: &str) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(source) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| ReportError::InvalidTimestamp {
                value: value.to_string(),
                source,
            }),
    }
}

/// UTC timestamp with millisecond precision, e.g. `2021-10-01T00:00:00.000Z`
pub fn iso(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter writing timestamps with `iso`
pub mod iso_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::iso(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_iso8601(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_half_open_bounds() {
        let window = ReportWindow::parse("2021-10-01T00:00:00.000Z", "2021-11-01T00:00:00.000Z")
            .unwrap();

        assert!(window.contains(Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()));
        assert!(window.contains(Utc.with_ymd_and_hms(2021, 10, 31, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2021, 11, 1, 0, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2021, 9, 30, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_offsets_normalize_to_utc() {
        let window =
            ReportWindow::parse("2021-10-01T02:00:00+02:00", "2021-10-02T00:00:00Z").unwrap();
        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bare_date() {
        let parsed = parse_iso8601("2021-12-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 12, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_inverted_window() {
        let err = ReportWindow::parse("2021-11-01T00:00:00Z", "2021-10-01T00:00:00Z").unwrap_err();
        assert!(matches!(err, ReportError::InvertedWindow { .. }));
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = ReportWindow::parse("2021-13-45", "2021-10-01T00:00:00Z").unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_iso_rendering() {
        let time = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(iso(&time), "2021-10-01T00:00:00.000Z");
    }
}
