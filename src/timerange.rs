use std::fmt;
use std::str::FromStr;

use crate::error::SubtitleError;

const RANGE_SEPARATOR: char = '-';
const FIELD_SEPARATOR: char = ':';

/// A window into the video timeline, in milliseconds, with `start < end`.
///
/// Both ends are inclusive when filtering captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start_ms: u64,
    end_ms: u64,
}

impl TimeRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Result<Self, SubtitleError> {
        if start_ms >= end_ms {
            return Err(SubtitleError::malformed_range(
                &format!("{start_ms}ms-{end_ms}ms"),
                "start must be before end",
            ));
        }
        Ok(Self { start_ms, end_ms })
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn contains(&self, offset_ms: u64) -> bool {
        (self.start_ms..=self.end_ms).contains(&offset_ms)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_clock(self.start_ms), format_clock(self.end_ms))
    }
}

impl FromStr for TimeRange {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse `"<start>-<end>"` where each side is `SS`, `MM:SS` or `HH:MM:SS`.
pub fn parse(input: &str) -> Result<TimeRange, SubtitleError> {
    let (start, end) = input.split_once(RANGE_SEPARATOR).ok_or_else(|| {
        SubtitleError::malformed_range(input, format!("expected '{RANGE_SEPARATOR}' between start and end"))
    })?;

    let start_ms = parse_offset(input, start)?;
    let end_ms = parse_offset(input, end)?;

    if start_ms >= end_ms {
        return Err(SubtitleError::malformed_range(input, "start must be before end"));
    }

    Ok(TimeRange { start_ms, end_ms })
}

fn parse_offset(input: &str, side: &str) -> Result<u64, SubtitleError> {
    let side = side.trim();
    let fields = side
        .split(FIELD_SEPARATOR)
        .map(|field| parse_field(input, field))
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match fields.as_slice() {
        [s] => (0, 0, *s),
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => {
            return Err(SubtitleError::malformed_range(
                input,
                format!("{side:?} is not SS, MM:SS or HH:MM:SS"),
            ));
        }
    };

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|t| t.checked_add(seconds))
        .and_then(|t| t.checked_mul(1000))
        .ok_or_else(|| SubtitleError::malformed_range(input, format!("{side:?} is out of range")))
}

fn parse_field(input: &str, field: &str) -> Result<u64, SubtitleError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubtitleError::malformed_range(
            input,
            format!("{field:?} is not a whole number"),
        ));
    }
    field
        .parse::<u64>()
        .map_err(|e| SubtitleError::malformed_range(input, format!("{field:?}: {e}")))
}

fn format_clock(ms: u64) -> String {
    let total = ms / 1000;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(r: &TimeRange) -> (u64, u64) {
        (r.start_ms(), r.end_ms())
    }

    fn assert_malformed(input: &str) {
        match parse(input) {
            Err(SubtitleError::MalformedTimeRange { .. }) => {}
            other => panic!("expected MalformedTimeRange for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(ms(&parse("30-90").unwrap()), (30_000, 90_000));
    }

    #[test]
    fn test_parse_minutes_seconds() {
        assert_eq!(ms(&parse("0:30-1:30").unwrap()), (30_000, 90_000));
    }

    #[test]
    fn test_parse_hours_minutes_seconds() {
        assert_eq!(ms(&parse("0:00:30-0:01:30").unwrap()), (30_000, 90_000));
    }

    #[test]
    fn test_parse_mixed_shapes() {
        assert_eq!(ms(&parse("45-1:00:00").unwrap()), (45_000, 3_600_000));
    }

    #[test]
    fn test_parse_tolerates_spaces() {
        assert_eq!(ms(&parse("1:00 - 2:00").unwrap()), (60_000, 120_000));
    }

    #[test]
    fn test_start_not_before_end() {
        assert_malformed("90-30");
        assert_malformed("30-30");
    }

    #[test]
    fn test_non_integer_field() {
        assert_malformed("abc-90");
        assert_malformed("1.5-90");
        assert_malformed("0:3x-1:00");
    }

    #[test]
    fn test_missing_separator() {
        assert_malformed("90");
        assert_malformed("");
    }

    #[test]
    fn test_empty_side() {
        assert_malformed("-90");
        assert_malformed("30-");
        assert_malformed("1:-2:00");
    }

    #[test]
    fn test_too_many_fields() {
        assert_malformed("1:00:00:00-2:00:00:00");
    }

    #[test]
    fn test_extra_separator() {
        assert_malformed("10-20-30");
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert_malformed("0-99999999999999999999");
        assert_malformed("0-18446744073709551615");
    }

    #[test]
    fn test_from_str() {
        let r: TimeRange = "1:30-2:00".parse().unwrap();
        assert_eq!(ms(&r), (90_000, 120_000));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = TimeRange::new(1000, 2000).unwrap();
        assert!(r.contains(1000));
        assert!(r.contains(2000));
        assert!(!r.contains(999));
        assert!(!r.contains(2001));
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert!(TimeRange::new(5, 5).is_err());
        assert!(TimeRange::new(6, 5).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(parse("90-3700").unwrap().to_string(), "1:30-1:01:40");
    }
}
