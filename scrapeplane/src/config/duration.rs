//! Human-readable durations (e.g., "15s", "1m30s", "500ms").

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error parsing a duration string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid duration '{input}' - expected format like '15s', '1m30s', '500ms' or '2h'")]
pub struct DurationParseError {
    input: String,
}

impl DurationParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a duration made of `<integer><unit>` segments.
///
/// Units: `ms`, `s`, `m`, `h`, `d` (case-insensitive). Segments may be
/// concatenated, largest unit first or not: `1h30m` and `30m1h` are both
/// accepted.
///
/// ```
/// use scrapeplane::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::new(s));
    }

    let lowered = trimmed.to_ascii_lowercase();
    let mut rest = lowered.as_str();
    let mut total_ms: u64 = 0;

    while !rest.is_empty() {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(DurationParseError::new(s));
        }
        let (number, tail) = rest.split_at(digits);
        let unit_len = tail.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let (unit, tail) = tail.split_at(unit_len);

        let value: u64 = number.parse().map_err(|_| DurationParseError::new(s))?;
        let multiplier = match unit {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            _ => return Err(DurationParseError::new(s)),
        };

        total_ms = value
            .checked_mul(multiplier)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| DurationParseError::new(s))?;
        rest = tail;
    }

    Ok(Duration::from_millis(total_ms))
}

/// Format a duration using the same units [`parse_duration`] accepts.
///
/// ```
/// use scrapeplane::config::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1s500ms");
/// assert_eq!(format_duration(Duration::ZERO), "0s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let mut ms = duration.as_millis();
    if ms == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [("d", 86_400_000u128), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)] {
        if ms >= size {
            out.push_str(&format!("{}{}", ms / size, unit));
            ms %= size;
        }
    }
    if ms > 0 {
        out.push_str(&format!("{}ms", ms));
    }
    out
}

/// A duration that parses from and displays as human-readable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl std::str::FromStr for HumanDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(HumanDuration)
    }
}

impl From<HumanDuration> for Duration {
    fn from(value: HumanDuration) -> Self {
        value.0
    }
}
