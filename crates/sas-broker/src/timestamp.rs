//! timestamp

use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[derive(Debug, thiserror::Error)]
pub enum ParseTimestampError {
    #[error("time: {0}")]
    Time(#[from] time::error::Parse),
    #[error("empty timestamp")]
    Empty,
    #[error("timestamp overflow")]
    Overflow,
}

#[derive(Debug, thiserror::Error)]
pub enum FormatTimestampError {
    #[error("time: {0}")]
    Time(#[from] time::error::Format),
    #[error("timestamp overflow")]
    Overflow,
}

/// Signature timestamps carry whole seconds and a literal `Z`.
const SAS_TIME: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Offset-less form, read as UTC.
const NAIVE_TIME: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Parses a caller supplied expiry.
///
/// RFC 3339 is the canonical form. A date-time without an offset is also
/// accepted and taken as UTC.
///
/// # Errors
/// Returns an error if `s` is blank, in neither form, or lies past the
/// range of UTC date-times.
pub fn parse_expiry(s: &str) -> Result<OffsetDateTime, ParseTimestampError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseTimestampError::Empty);
    }
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(t) => t.checked_to_offset(UtcOffset::UTC).ok_or(ParseTimestampError::Overflow),
        Err(err) => match PrimitiveDateTime::parse(s, NAIVE_TIME) {
            Ok(t) => Ok(t.assume_utc()),
            Err(_) => Err(err.into()),
        },
    }
}

/// Formats `t` as `YYYY-MM-DDTHH:MM:SSZ` in UTC, dropping sub-seconds.
///
/// # Errors
/// Returns an error if `t` has no UTC equivalent or the year cannot be
/// written with four digits.
pub fn format_sas_time(t: OffsetDateTime) -> Result<String, FormatTimestampError> {
    let t = t.checked_to_offset(UtcOffset::UTC).ok_or(FormatTimestampError::Overflow)?;
    Ok(t.format(SAS_TIME)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use time::macros::datetime;

    #[test]
    fn parse_forms() {
        let expected = datetime!(2199-03-12 01:02:03 UTC);
        assert_eq!(parse_expiry("2199-03-12T01:02:03Z").unwrap(), expected);
        assert_eq!(parse_expiry("2199-03-12T03:02:03+02:00").unwrap(), expected);
        assert_eq!(parse_expiry("2199-03-12T01:02:03").unwrap(), expected);
        assert_eq!(parse_expiry(" 2199-03-12T01:02:03Z ").unwrap(), expected);
    }

    #[test]
    fn parse_rejects() {
        assert!(matches!(parse_expiry(""), Err(ParseTimestampError::Empty)));
        assert!(matches!(parse_expiry("  "), Err(ParseTimestampError::Empty)));
        assert!(matches!(parse_expiry("tomorrow"), Err(ParseTimestampError::Time(_))));
        assert!(parse_expiry("2199-13-12T01:02:03Z").is_err());
        assert!(matches!(
            parse_expiry("9999-12-31T23:59:59-01:00"),
            Err(ParseTimestampError::Overflow)
        ));
    }

    #[test]
    fn format() {
        let t = datetime!(2024-01-02 03:04:05.678 +01:00);
        assert_eq!(format_sas_time(t).unwrap(), "2024-01-02T02:04:05Z");

        let late = datetime!(9999-12-31 23:59:59 -01:00);
        assert!(matches!(format_sas_time(late), Err(FormatTimestampError::Overflow)));
    }
}
