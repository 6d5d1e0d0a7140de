//! Fixed-width timestamp codec.
//!
//! Every log line starts with a 23-byte canonical prefix
//! `YYYY-MM-DDTHH:MM:SS.mmm`. The same string is used as the result cache key,
//! so [`Timestamp::format`] must be the exact inverse of [`Timestamp::parse`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};

use crate::error::{LogError, Result};

/// Length in bytes of the canonical timestamp prefix.
pub const TIMESTAMP_LEN: usize = 23;

/// chrono format string for the canonical form.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Expected byte at each separator position of the canonical form.
const SEPARATORS: [(usize, u8); 6] = [
    (4, b'-'),
    (7, b'-'),
    (10, b'T'),
    (13, b':'),
    (16, b':'),
    (19, b'.'),
];

/// A millisecond-precision instant, as written at the start of a log line.
///
/// Log lines carry no zone designator; instants are treated as UTC wall-clock
/// time. Anything finer than a millisecond is truncated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Wraps a naive date-time, truncating it to millisecond precision.
    #[must_use]
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime.trunc_subsecs(3))
    }

    /// Normalizes a zoned date-time to UTC and truncates it to milliseconds.
    ///
    /// Two equal instants produce equal timestamps regardless of the offset
    /// they were expressed in.
    #[must_use]
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self::new(datetime.with_timezone(&Utc).naive_utc())
    }

    /// Parses the timestamp prefix of a log line given as text.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidFormat`] if the line is shorter than
    /// [`TIMESTAMP_LEN`] or the prefix is not a valid canonical timestamp.
    pub fn parse(line: &str) -> Result<Self> {
        Self::parse_bytes(line.as_bytes())
    }

    /// Parses the timestamp prefix of a raw log line.
    ///
    /// # Errors
    ///
    /// Same as [`Timestamp::parse`].
    pub fn parse_bytes(line: &[u8]) -> Result<Self> {
        let Some(prefix) = line.get(..TIMESTAMP_LEN) else {
            return Err(LogError::InvalidFormat(format!(
                "line shorter than {TIMESTAMP_LEN} bytes"
            )));
        };

        if !has_canonical_shape(prefix) {
            return Err(LogError::InvalidFormat(format!(
                "prefix {:?} is not YYYY-MM-DDTHH:MM:SS.mmm",
                String::from_utf8_lossy(prefix)
            )));
        }

        // Shape check guarantees ASCII.
        let text = std::str::from_utf8(prefix)
            .map_err(|e| LogError::InvalidFormat(e.to_string()))?;

        NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|e| LogError::InvalidFormat(format!("{text}: {e}")))
    }

    /// Returns the canonical 23-character representation.
    #[must_use]
    pub fn format(&self) -> String {
        self.0.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Returns the underlying naive date-time.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns true if `self` is strictly earlier than `other`.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }
}

fn has_canonical_shape(prefix: &[u8]) -> bool {
    prefix.iter().enumerate().all(|(i, b)| {
        SEPARATORS
            .iter()
            .find(|(pos, _)| *pos == i)
            .map_or_else(|| b.is_ascii_digit(), |(_, sep)| b == sep)
    })
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = LogError;

    /// Parses a complete canonical timestamp; trailing text is rejected.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != TIMESTAMP_LEN {
            return Err(LogError::InvalidFormat(format!(
                "expected {TIMESTAMP_LEN} characters, got {}",
                s.len()
            )));
        }
        Self::parse(s)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::new(datetime)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(datetime: DateTime<Tz>) -> Self {
        Self::from_datetime(&datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use proptest::prelude::*;
    use test_case::test_case;

    fn ts(s: &str) -> Timestamp {
        s.parse().expect("valid timestamp")
    }

    #[test]
    fn parse_line_prefix() {
        let t = Timestamp::parse("2023-01-01T00:00:01.000 line2").expect("parse");
        assert_eq!(t.format(), "2023-01-01T00:00:01.000");
    }

    #[test]
    fn parse_exact_length_line() {
        let t = Timestamp::parse("2023-06-15T13:45:30.123").expect("parse");
        assert_eq!(t.format(), "2023-06-15T13:45:30.123");
    }

    #[test_case("" ; "empty")]
    #[test_case("2023-01-01T00:00:01" ; "no millis")]
    #[test_case("2023-01-01T00:00:01.00" ; "22 chars")]
    #[test_case("invalid log line" ; "garbage")]
    #[test_case("2023-01-01 00:00:01.000 msg" ; "space separator")]
    #[test_case("2023-13-01T00:00:01.000 msg" ; "month 13")]
    #[test_case("2023-02-30T00:00:01.000 msg" ; "february 30")]
    #[test_case("2023-01-01T24:00:01.000 msg" ; "hour 24")]
    #[test_case("+023-01-01T00:00:01.000 msg" ; "signed year")]
    #[test_case("2023-01-01T00:00:01,000 msg" ; "comma millis")]
    fn parse_rejects(line: &str) {
        let err = Timestamp::parse(line).expect_err("should fail");
        assert!(matches!(err, LogError::InvalidFormat(_)));
    }

    #[test]
    fn parse_rejects_multibyte_prefix_without_panicking() {
        let err = Timestamp::parse("2023-01-01T00:00:0é.000 x").expect_err("should fail");
        assert!(matches!(err, LogError::InvalidFormat(_)));
    }

    #[test]
    fn from_str_rejects_trailing_text() {
        assert!("2023-01-01T00:00:01.000 extra".parse::<Timestamp>().is_err());
        assert!("2023-01-01T00:00:01.000".parse::<Timestamp>().is_ok());
    }

    #[test]
    fn sub_millisecond_precision_is_truncated() {
        let naive = NaiveDate::from_ymd_opt(2023, 1, 1)
            .and_then(|d| d.and_hms_nano_opt(0, 0, 1, 999_999_999))
            .expect("valid date");
        let t = Timestamp::new(naive);
        assert_eq!(t.format(), "2023-01-01T00:00:01.999");
    }

    #[test]
    fn zoned_inputs_normalize_to_same_key() {
        let utc = Utc
            .with_ymd_and_hms(2023, 1, 1, 12, 0, 0)
            .single()
            .expect("valid");
        let plus_three = FixedOffset::east_opt(3 * 3600)
            .and_then(|tz| tz.with_ymd_and_hms(2023, 1, 1, 15, 0, 0).single())
            .expect("valid");

        let a = Timestamp::from(utc);
        let b = Timestamp::from(plus_three);
        assert_eq!(a, b);
        assert_eq!(a.format(), b.format());
        assert_eq!(a.format(), "2023-01-01T12:00:00.000");
    }

    #[test]
    fn ordering_follows_time() {
        let a = ts("2023-01-01T00:00:00.999");
        let b = ts("2023-01-01T00:00:01.000");
        assert!(a.is_before(&b));
        assert!(!b.is_before(&a));
        assert!(!a.is_before(&a));
    }

    #[test]
    fn display_matches_format() {
        let t = ts("2024-02-29T23:59:59.001");
        assert_eq!(t.to_string(), t.format());
    }

    proptest! {
        #[test]
        fn prop_format_inverts_parse(
            year in 1000i32..=9999,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
            millis in 0u32..1000,
            suffix in "[ -~]{0,40}",
        ) {
            let prefix = format!(
                "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{millis:03}"
            );
            let line = format!("{prefix}{suffix}");
            let parsed = Timestamp::parse(&line);
            prop_assert!(parsed.is_ok());
            if let Ok(t) = parsed {
                prop_assert_eq!(t.format(), prefix);
            }
        }

        #[test]
        fn prop_short_lines_rejected(line in "[ -~]{0,22}") {
            prop_assert!(Timestamp::parse(&line).is_err());
        }
    }
}
