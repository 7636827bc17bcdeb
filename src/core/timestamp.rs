//! Timestamp recognition for the date/time column

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Layouts recognized in uploaded telemetry, in detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateFormat {
    /// `yyyy-MM-dd HH:mm:ss`
    IsoDateTime,
    /// `MM/dd/yyyy HH:mm:ss`
    UsDateTime,
    /// `dd/MM/yyyy HH:mm:ss`
    EuDateTime,
    /// `yyyy-MM-dd`
    IsoDate,
    /// `MM/dd/yyyy`
    UsDate,
    /// `dd/MM/yyyy`
    EuDate,
}

impl DateFormat {
    pub fn all() -> &'static [DateFormat] {
        &[
            DateFormat::IsoDateTime,
            DateFormat::UsDateTime,
            DateFormat::EuDateTime,
            DateFormat::IsoDate,
            DateFormat::UsDate,
            DateFormat::EuDate,
        ]
    }

    /// Human-readable pattern
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::IsoDateTime => "yyyy-MM-dd HH:mm:ss",
            DateFormat::UsDateTime => "MM/dd/yyyy HH:mm:ss",
            DateFormat::EuDateTime => "dd/MM/yyyy HH:mm:ss",
            DateFormat::IsoDate => "yyyy-MM-dd",
            DateFormat::UsDate => "MM/dd/yyyy",
            DateFormat::EuDate => "dd/MM/yyyy",
        }
    }

    fn chrono_format(&self) -> &'static str {
        match self {
            DateFormat::IsoDateTime => "%Y-%m-%d %H:%M:%S",
            DateFormat::UsDateTime => "%m/%d/%Y %H:%M:%S",
            DateFormat::EuDateTime => "%d/%m/%Y %H:%M:%S",
            DateFormat::IsoDate => "%Y-%m-%d",
            DateFormat::UsDate => "%m/%d/%Y",
            DateFormat::EuDate => "%d/%m/%Y",
        }
    }

    fn has_time(&self) -> bool {
        matches!(
            self,
            DateFormat::IsoDateTime | DateFormat::UsDateTime | DateFormat::EuDateTime
        )
    }

    /// Parse `text` strictly in this layout
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        if self.has_time() {
            NaiveDateTime::parse_from_str(text, self.chrono_format()).ok()
        } else {
            NaiveDate::parse_from_str(text, self.chrono_format())
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern())
    }
}

/// First known layout that parses `text`, if any.
///
/// Month-first is tried before day-first, so `03/04/2024` is read as
/// March 4th.
pub fn detect_date_format(text: &str) -> Option<DateFormat> {
    let text = text.trim();
    DateFormat::all()
        .iter()
        .copied()
        .find(|format| format.parse(text).is_some())
}

/// Parse a timestamp cell into a naive date-time
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(parsed) = detect_date_format(text).and_then(|f| f.parse(text)) {
        return Some(parsed);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }

    const DATE_TIMES: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M",
        "%d/%m/%Y %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    const DATES: &[&str] = &["%Y/%m/%d", "%b %d, %Y", "%B %d, %Y"];

    DATE_TIMES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATES.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(text, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
}

/// Whether a timestamp cell holds a valid date/time
pub fn is_valid_timestamp(text: &str) -> bool {
    parse_timestamp(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_iso_datetime() {
        assert_eq!(
            detect_date_format("2024-01-01 08:00:00"),
            Some(DateFormat::IsoDateTime)
        );
        assert_eq!(detect_date_format("2024-01-01"), Some(DateFormat::IsoDate));
    }

    #[test]
    fn test_detect_prefers_month_first() {
        assert_eq!(detect_date_format("03/04/2024"), Some(DateFormat::UsDate));
        assert_eq!(detect_date_format("25/12/2024"), Some(DateFormat::EuDate));
        assert_eq!(
            detect_date_format("25/12/2024 17:30:00"),
            Some(DateFormat::EuDateTime)
        );
    }

    #[test]
    fn test_detect_rejects_garbage() {
        assert_eq!(detect_date_format("yesterday"), None);
        assert_eq!(detect_date_format("2024-13-40"), None);
    }

    #[test]
    fn test_valid_timestamps() {
        assert!(is_valid_timestamp("2024-01-01 08:00:00"));
        assert!(is_valid_timestamp("2024-01-01T08:00:00Z"));
        assert!(is_valid_timestamp("2024-01-01T08:00:00.250"));
        assert!(is_valid_timestamp("Mon, 01 Jan 2024 08:00:00 +0000"));
        assert!(is_valid_timestamp(" 01/31/2024 "));
    }

    #[test]
    fn test_minute_precision_and_slash_iso_timestamps() {
        assert!(is_valid_timestamp("01/15/2024 08:30"));
        assert!(is_valid_timestamp("25/12/2024 17:30"));
        assert!(is_valid_timestamp("2024/01/15 08:30:00"));
        assert!(is_valid_timestamp("2024/01/15 08:30"));
        assert!(is_valid_timestamp("2024/01/15"));
        assert!(is_valid_timestamp("Jan 15, 2024"));
        assert!(is_valid_timestamp("January 15, 2024"));
        assert!(!is_valid_timestamp("2024/02/30"));
        assert!(!is_valid_timestamp("Foo 15, 2024"));
    }

    #[test]
    fn test_invalid_timestamps() {
        assert!(!is_valid_timestamp(""));
        assert!(!is_valid_timestamp("   "));
        assert!(!is_valid_timestamp("not a date"));
        assert!(!is_valid_timestamp("2024-02-30"));
    }
}
