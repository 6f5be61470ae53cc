//! Parsing for `--working` values such as `1h`, `1.5h` or `2h45m`.

use thiserror::Error;
use time::Duration;

#[derive(Debug, Error, PartialEq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration '{0}': expected numbers with units like 1.5h or 2h45m")]
    Invalid(String),
    #[error("unknown unit '{unit}' in duration '{input}' (use ns, us, ms, s, m or h)")]
    UnknownUnit { unit: String, input: String },
    #[error("duration '{0}' is too large")]
    Overflow(String),
    #[error("duration '{0}' must be positive")]
    NotPositive(String),
}

fn unit_nanos(unit: &str) -> Option<f64> {
    let nanos = match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60.0 * 1e9,
        "h" => 3600.0 * 1e9,
        _ => return None,
    };
    Some(nanos)
}

/// Parse a sequence of decimal numbers, each with a unit suffix.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let (negative, mut rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        if unit.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;
        rest = &rest[unit_len..];

        total_nanos += value * scale;
    }

    if total_nanos > i64::MAX as f64 {
        return Err(DurationError::Overflow(input.to_string()));
    }

    let nanos = total_nanos.round() as i64;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

/// Like [`parse_duration`], but rejects zero and negative spans.
pub fn parse_working_duration(input: &str) -> Result<Duration, DurationError> {
    let duration = parse_duration(input)?;
    if !duration.is_positive() {
        return Err(DurationError::NotPositive(input.to_string()));
    }
    Ok(duration)
}
