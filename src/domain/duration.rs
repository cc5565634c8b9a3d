//! Time span written the way users type it: `90s`, `10m`, `1h30m`, `250ms`

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Units from largest to smallest; a written span must use them in this order
const UNITS: [(&str, u64); 4] = [("h", 3_600_000), ("m", 60_000), ("s", 1_000), ("ms", 1)];

/// A positive span with millisecond resolution, used for `watch_timeout`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(u64);

impl Duration {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.0)
    }
}

impl From<Duration> for StdDuration {
    fn from(d: Duration) -> Self {
        d.as_std()
    }
}

/// Split `"1h30m"` into `[(1, "h"), (30, "m")]`
fn components(input: &str) -> Option<Vec<(u64, &str)>> {
    let mut parts = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit())?;
        if digits == 0 {
            return None;
        }
        let value = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        parts.push((value, &rest[..unit_len]));
        rest = &rest[unit_len..];
    }
    Some(parts)
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_ascii_lowercase();
        let parts = components(&input).filter(|p| !p.is_empty()).ok_or_else(invalid)?;

        let mut total: u64 = 0;
        let mut next_unit = 0;
        for (value, unit) in parts {
            let offset = UNITS[next_unit..]
                .iter()
                .position(|(name, _)| *name == unit)
                .ok_or_else(invalid)?;
            let scale = UNITS[next_unit + offset].1;
            next_unit += offset + 1;
            total = value
                .checked_mul(scale)
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(invalid)?;
        }

        if total == 0 {
            return Err(invalid());
        }
        Ok(Self(total))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        for (name, scale) in UNITS {
            if rest >= scale {
                write!(f, "{}{}", rest / scale, name)?;
                rest %= scale;
            }
        }
        if self.0 == 0 {
            f.write_str("0s")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Option<u64> {
        s.parse::<Duration>().ok().map(|d| d.as_millis())
    }

    #[test]
    fn single_units() {
        assert_eq!(parse("30s"), Some(30_000));
        assert_eq!(parse("10m"), Some(600_000));
        assert_eq!(parse("2h"), Some(7_200_000));
        assert_eq!(parse("250ms"), Some(250));
    }

    #[test]
    fn compound_spans_in_descending_order() {
        assert_eq!(parse("2m30s"), Some(150_000));
        assert_eq!(parse("1h5m"), Some(3_900_000));
        assert_eq!(parse("  1M30S "), Some(90_000));
        assert_eq!(parse("30s2m"), None);
        assert_eq!(parse("1m1m"), None);
    }

    #[test]
    fn rejects_zero_bare_numbers_and_junk() {
        for input in ["", "0s", "30", "s", "30x", "1.5m", "-5s"] {
            assert_eq!(parse(input), None, "{input:?} should be rejected");
        }
    }

    #[test]
    fn rejects_overflow() {
        assert_eq!(parse("99999999999999999h"), None);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Duration::from_secs(30).to_string(), "30s");
        assert_eq!(Duration::from_secs(600).to_string(), "10m");
        assert_eq!(Duration::from_secs(3_690).to_string(), "1h1m30s");
        assert_eq!(Duration::from_millis(50).to_string(), "50ms");
    }

    #[test]
    fn converts_to_std() {
        assert_eq!(StdDuration::from(Duration::from_secs(30)), StdDuration::from_secs(30));
    }
}
