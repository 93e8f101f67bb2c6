//! Signed time spans and the range expression parser.
//!
//! Range expressions use a Go-style duration grammar (`1h30m`, `250ms`,
//! `1.5h`, `-5m`) extended with a `d` suffix that means "24 hours" and is
//! applied to the whole expression, so `2d` is `48h` and `1.5d` is `36h`.

use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Unit suffix to nanoseconds multiplier.
const UNITS: &[(&str, u64)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
];

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Fraction digits beyond this are ignored; they are below nanosecond precision for every unit.
const MAX_FRACTION_DIGITS: usize = 18;

/// Errors produced while parsing a range expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The expression was empty (or only whitespace).
    #[error("empty duration")]
    Empty,

    /// The expression is not a valid duration literal.
    #[error("invalid duration {input:?}: {reason}")]
    Invalid {
        /// The expression as given.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A component used a unit outside `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`.
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit {
        /// The expression as given.
        input: String,
        /// The offending unit.
        unit: String,
    },

    /// The value does not fit in a signed 64-bit nanosecond count.
    #[error("duration {0:?} out of range")]
    Overflow(String),
}

/// A signed span of time with nanosecond resolution.
///
/// Unlike [`Duration`], a `TimeSpan` may be zero or negative. A negative
/// range simply inverts the query window; nothing rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan(i64);

impl TimeSpan {
    /// The empty span.
    pub const ZERO: TimeSpan = TimeSpan(0);

    /// Create from a signed nanosecond count.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create from whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * NANOS_PER_SEC as i64)
    }

    /// Create from whole minutes.
    pub const fn from_mins(mins: i64) -> Self {
        Self::from_secs(mins * 60)
    }

    /// Create from whole hours.
    pub const fn from_hours(hours: i64) -> Self {
        Self::from_secs(hours * 3_600)
    }

    /// Get the value in nanoseconds.
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Whether the span points backwards in time.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute length of the span.
    pub const fn unsigned_abs(&self) -> Duration {
        Duration::from_nanos(self.0.unsigned_abs())
    }

    /// Convert to a standard [`Duration`], or `None` if the span is negative.
    pub const fn to_duration(&self) -> Option<Duration> {
        if self.0 < 0 {
            None
        } else {
            Some(Duration::from_nanos(self.0 as u64))
        }
    }

    /// Multiply, returning `None` on overflow.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Parse a range expression such as `30d`, `12h`, `1h30m` or `-5m`.
    ///
    /// A trailing `d` turns the rest of the expression into hours and
    /// multiplies the result by 24. Everything else goes through the
    /// primitive duration grammar unchanged.
    ///
    /// ```rust
    /// use promstorm_types::TimeSpan;
    ///
    /// assert_eq!(TimeSpan::parse("2d").unwrap(), TimeSpan::from_hours(48));
    /// assert_eq!(TimeSpan::parse("90m").unwrap(), TimeSpan::from_mins(90));
    /// assert!(TimeSpan::parse("abc").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();

        if let Some(hours) = s.strip_suffix('d') {
            let span = parse_primitive(&format!("{hours}h"), s)?;
            return span
                .checked_mul(24)
                .ok_or_else(|| ParseError::Overflow(s.to_string()));
        }

        parse_primitive(s, s)
    }
}

impl FromStr for TimeSpan {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Duration> for TimeSpan {
    /// Saturates at the largest representable span.
    fn from(d: Duration) -> Self {
        Self(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0s");
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }

        let nanos = self.0.unsigned_abs();
        if nanos < NANOS_PER_SEC {
            return if nanos % 1_000_000 == 0 {
                write!(f, "{}ms", nanos / 1_000_000)
            } else if nanos % 1_000 == 0 {
                write!(f, "{}µs", nanos / 1_000)
            } else {
                write!(f, "{}ns", nanos)
            };
        }

        let total_secs = nanos / NANOS_PER_SEC;
        let sub_nanos = nanos % NANOS_PER_SEC;
        let (hours, mins, secs) = (total_secs / 3_600, total_secs / 60 % 60, total_secs % 60);

        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if mins > 0 {
            write!(f, "{}m", mins)?;
        }
        if sub_nanos > 0 {
            let fraction = format!("{:09}", sub_nanos);
            write!(f, "{}.{}s", secs, fraction.trim_end_matches('0'))?;
        } else if secs > 0 {
            write!(f, "{}s", secs)?;
        }
        Ok(())
    }
}

/// Parse the primitive grammar: `[+-]` followed by `0` or one or more
/// `<decimal><unit>` components. `expr` is only used in error messages.
fn parse_primitive(input: &str, expr: &str) -> Result<TimeSpan, ParseError> {
    let invalid = |reason| ParseError::Invalid {
        input: expr.to_string(),
        reason,
    };

    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    let (negative, mut rest) = match input.as_bytes()[0] {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(TimeSpan::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("missing value"));
    }

    // One past i64::MAX is allowed for negative spans.
    let limit = if negative {
        i64::MAX as u128 + 1
    } else {
        i64::MAX as u128
    };

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, after) = rest.split_at(int_len);

        let (frac_digits, after) = match after.strip_prefix('.') {
            Some(tail) => tail.split_at(tail.bytes().take_while(u8::is_ascii_digit).count()),
            None => ("", after),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }

        let multiplier = UNITS
            .iter()
            .find(|(suffix, _)| *suffix == unit)
            .map(|(_, multiplier)| *multiplier)
            .ok_or_else(|| ParseError::UnknownUnit {
                input: expr.to_string(),
                unit: unit.to_string(),
            })?;

        let overflow = || ParseError::Overflow(expr.to_string());
        let component = component_nanos(int_digits, frac_digits, multiplier).ok_or_else(overflow)?;
        total = total.checked_add(component).ok_or_else(overflow)?;
        if total > limit {
            return Err(overflow());
        }

        rest = tail;
    }

    let nanos = if negative {
        (total as i128).wrapping_neg() as i64
    } else {
        total as i64
    };
    Ok(TimeSpan(nanos))
}

/// Nanoseconds for one `<int>.<frac><unit>` component; `None` on overflow.
fn component_nanos(int_digits: &str, frac_digits: &str, multiplier: u64) -> Option<u128> {
    let whole = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse::<u128>().ok()?
    };
    let mut nanos = whole.checked_mul(multiplier as u128)?;

    let frac_digits = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
    if !frac_digits.is_empty() {
        let numerator: u128 = frac_digits.parse().ok()?;
        let scale = 10u128.pow(frac_digits.len() as u32);
        nanos = nanos.checked_add(numerator * multiplier as u128 / scale)?;
    }

    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(s: &str) -> TimeSpan {
        TimeSpan::parse(s).unwrap()
    }

    #[test]
    fn test_days_are_24_hours() {
        assert_eq!(span("2d"), span("48h"));
        assert_eq!(span("30d"), TimeSpan::from_hours(720));
        assert_eq!(span("1d"), TimeSpan::from_hours(24));
    }

    #[test]
    fn days_matches_hours_for_many_values() {
        for n in [0i64, 1, 7, 14, 90, 365] {
            assert_eq!(span(&format!("{n}d")), span(&format!("{}h", n * 24)), "{n}d");
        }
    }

    #[test]
    fn test_fractional_days() {
        assert_eq!(span("1.5d"), TimeSpan::from_hours(36));
    }

    #[test]
    fn test_plain_units_pass_through() {
        assert_eq!(span("90m"), TimeSpan::from_mins(90));
        assert_eq!(span("12h"), TimeSpan::from_hours(12));
        assert_eq!(span("45s"), TimeSpan::from_secs(45));
        assert_eq!(span("250ms"), TimeSpan::from_nanos(250_000_000));
        assert_eq!(span("16µs"), TimeSpan::from_nanos(16_000));
        assert_eq!(span("16us"), TimeSpan::from_nanos(16_000));
        assert_eq!(span("7ns"), TimeSpan::from_nanos(7));
    }

    #[test]
    fn test_combined_components() {
        assert_eq!(span("1h30m"), TimeSpan::from_mins(90));
        assert_eq!(span("1h30m15s"), TimeSpan::from_secs(5_415));
        assert_eq!(span("2h45m").as_nanos(), span("165m").as_nanos());
    }

    #[test]
    fn test_fractions() {
        assert_eq!(span("1.5h"), TimeSpan::from_mins(90));
        assert_eq!(span(".5s"), TimeSpan::from_nanos(500_000_000));
        assert_eq!(span("1.s"), TimeSpan::from_secs(1));
    }

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(span("0"), TimeSpan::ZERO);
        assert_eq!(span("0s"), TimeSpan::ZERO);
        assert_eq!(span("-5m"), TimeSpan::from_mins(-5));
        assert_eq!(span("-2d"), TimeSpan::from_hours(-48));
        assert_eq!(span("+3s"), TimeSpan::from_secs(3));
        assert!(span("-1s").is_negative());
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(span("  7d \n"), TimeSpan::from_hours(168));
    }

    #[test]
    fn test_malformed_inputs_fail() {
        for input in ["abc", "-d", "d", "5", "1x", "1h 30m", "h", "-", ".s", "1.5.5s", "1hd"] {
            assert!(TimeSpan::parse(input).is_err(), "{input:?} should fail");
        }
        assert_eq!(TimeSpan::parse(""), Err(ParseError::Empty));
        assert_eq!(TimeSpan::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_unknown_unit_is_reported() {
        match TimeSpan::parse("3w") {
            Err(ParseError::UnknownUnit { unit, input }) => {
                assert_eq!(unit, "w");
                assert_eq!(input, "3w");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_errors_mention_given_expression() {
        let err = TimeSpan::parse("xd").unwrap_err();
        assert!(err.to_string().contains("\"xd\""), "{err}");
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            TimeSpan::parse("9999999999h"),
            Err(ParseError::Overflow(_))
        ));
        assert!(matches!(
            TimeSpan::parse("200000d"),
            Err(ParseError::Overflow(_))
        ));
        assert!(matches!(
            TimeSpan::parse("99999999999999999999999999999999999999999s"),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_extremes_fit() {
        assert_eq!(span("9223372036854775807ns").as_nanos(), i64::MAX);
        assert_eq!(span("-9223372036854775808ns").as_nanos(), i64::MIN);
    }

    #[test]
    fn test_from_str() {
        let parsed: TimeSpan = "10m".parse().unwrap();
        assert_eq!(parsed, TimeSpan::from_mins(10));
    }

    #[test]
    fn test_duration_conversions() {
        assert_eq!(span("90s").to_duration(), Some(Duration::from_secs(90)));
        assert_eq!(span("-90s").to_duration(), None);
        assert_eq!(span("-90s").unsigned_abs(), Duration::from_secs(90));
        assert_eq!(TimeSpan::from(Duration::from_millis(1500)), span("1.5s"));
        assert_eq!(TimeSpan::from(Duration::MAX).as_nanos(), i64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(span("0").to_string(), "0s");
        assert_eq!(span("2d").to_string(), "48h");
        assert_eq!(span("90m").to_string(), "1h30m");
        assert_eq!(span("-5m").to_string(), "-5m");
        assert_eq!(span("250ms").to_string(), "250ms");
        assert_eq!(span("1.5s").to_string(), "1.5s");
        assert_eq!(span("1h0m5s").to_string(), "1h5s");
        assert_eq!(span("3us").to_string(), "3µs");
        assert_eq!(span("5ns").to_string(), "5ns");
    }

    #[test]
    fn test_display_reparses() {
        for input in ["48h", "1h30m", "-5m", "250ms", "1.5s", "3µs", "0s"] {
            assert_eq!(span(&span(input).to_string()), span(input));
        }
    }

    #[test]
    fn test_ordering() {
        assert!(span("1h") > span("59m"));
        assert!(span("-1s") < TimeSpan::ZERO);
    }
}
