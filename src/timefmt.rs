//! `H:MM:SS` formatting for ride durations.
//!
//! Hours never roll over into days, so a season's worth of riding reads
//! `253:25:45` rather than `10 days, 13:25:45`.

use thiserror::Error;

/// Errors from [`parse_duration`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("expected H:MM:SS, got {0:?}")]
    Format(String),

    #[error("invalid number {0:?}")]
    Number(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
}

/// Format seconds as `H:MM:SS` with at least two hour digits.
///
/// # Example
///
/// ```rust
/// use cycle_tracks::timefmt::format_duration;
///
/// assert_eq!(format_duration(0), "00:00:00");
/// assert_eq!(format_duration(3725), "01:02:05");
/// assert_eq!(format_duration(912_345), "253:25:45");
/// ```
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse `H:MM:SS` back into seconds.
pub fn parse_duration(s: &str) -> Result<u64, DurationParseError> {
    let mut parts = s.trim().split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(DurationParseError::Format(s.to_string()));
    };

    let hours = parse_field(h)?;
    let minutes = parse_field(m)?;
    let seconds = parse_field(sec)?;

    if m.len() != 2 || sec.len() != 2 {
        return Err(DurationParseError::Format(s.to_string()));
    }
    if minutes >= 60 {
        return Err(DurationParseError::OutOfRange { field: "minutes", value: minutes });
    }
    if seconds >= 60 {
        return Err(DurationParseError::OutOfRange { field: "seconds", value: seconds });
    }

    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or(DurationParseError::OutOfRange { field: "hours", value: hours })
}

fn parse_field(field: &str) -> Result<u64, DurationParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationParseError::Number(field.to_string()));
    }
    field
        .parse()
        .map_err(|_| DurationParseError::Number(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(3600), "01:00:00");
        assert_eq!(format_duration(86_399), "23:59:59");
        assert_eq!(format_duration(86_400), "24:00:00");
        assert_eq!(format_duration(912_345), "253:25:45");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("253:25:45"), Ok(912_345));
        assert_eq!(parse_duration("0:00:01"), Ok(1));
        assert_eq!(parse_duration(" 01:02:05 "), Ok(3725));
        assert_eq!(parse_duration(&format_duration(4_000_000)), Ok(4_000_000));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        assert!(matches!(parse_duration("12:34"), Err(DurationParseError::Format(_))));
        assert!(matches!(parse_duration("1:2:3"), Err(DurationParseError::Format(_))));
        assert!(matches!(parse_duration("1:00:00:00"), Err(DurationParseError::Format(_))));
        assert!(matches!(parse_duration("a:00:00"), Err(DurationParseError::Number(_))));
        assert!(matches!(parse_duration("-1:00:00"), Err(DurationParseError::Number(_))));
        assert_eq!(
            parse_duration("1:60:00"),
            Err(DurationParseError::OutOfRange { field: "minutes", value: 60 })
        );
    }
}
