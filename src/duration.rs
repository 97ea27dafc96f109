//! Resolving timeout delays from numbers, [`Duration`]s and human readable
//! strings.
//!
//! Strings use a small, forgiving grammar: a decimal number, optionally
//! followed by spaces and a unit. Units are case insensitive and a missing
//! unit means milliseconds.
//!
//! ```
//! use std::time::Duration;
//! use tower_request_timeout::duration::parse_duration;
//!
//! assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
//! assert_eq!(parse_duration("200ms").unwrap(), Duration::from_millis(200));
//! assert_eq!(parse_duration("2 days").unwrap(), Duration::from_secs(2 * 24 * 60 * 60));
//! assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(90 * 60));
//! assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
//! assert!(parse_duration("soon").is_err());
//! ```

use std::{convert::TryFrom, fmt, time::Duration};

/// The delay used when none, or a "falsy" one, is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const MAX_INPUT_LEN: usize = 100;

const SECOND: f64 = 1000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

/// Parse a human readable duration such as `"5s"`, `"200ms"` or `"2 days"`.
///
/// Negative values are accepted by the grammar but saturate to
/// [`Duration::ZERO`].
pub fn parse_duration(input: &str) -> Result<Duration, ParseDurationError> {
    parse_millis(input).map(millis_to_duration)
}

fn parse_millis(input: &str) -> Result<f64, ParseDurationError> {
    if input.is_empty() {
        return Err(ParseDurationError::new(input, ErrorKind::Empty));
    }

    if input.len() > MAX_INPUT_LEN {
        return Err(ParseDurationError::new(input, ErrorKind::TooLong));
    }

    let (number, unit) = split_number(input)
        .ok_or_else(|| ParseDurationError::new(input, ErrorKind::InvalidNumber))?;

    let number: f64 = number
        .parse()
        .map_err(|_| ParseDurationError::new(input, ErrorKind::InvalidNumber))?;

    let factor = unit_factor(unit.trim_start_matches(' '))
        .ok_or_else(|| ParseDurationError::new(input, ErrorKind::UnknownUnit))?;

    Ok(number * factor)
}

// Splits `-?(\d+)?\.?\d+` off the front of `input`.
fn split_number(input: &str) -> Option<(&str, &str)> {
    let unsigned = input.strip_prefix('-').unwrap_or(input);
    let sign_len = input.len() - unsigned.len();

    let len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..len];

    let well_formed = !digits.is_empty()
        && digits.matches('.').count() <= 1
        && digits.ends_with(|c: char| c.is_ascii_digit());

    if well_formed {
        Some(input.split_at(sign_len + len))
    } else {
        None
    }
}

fn unit_factor(unit: &str) -> Option<f64> {
    let factor = match unit.to_ascii_lowercase().as_str() {
        "years" | "year" | "yrs" | "yr" | "y" => YEAR,
        "weeks" | "week" | "w" => WEEK,
        "days" | "day" | "d" => DAY,
        "hours" | "hour" | "hrs" | "hr" | "h" => HOUR,
        "minutes" | "minute" | "mins" | "min" | "m" => MINUTE,
        "seconds" | "second" | "secs" | "sec" | "s" => SECOND,
        "milliseconds" | "millisecond" | "msecs" | "msec" | "ms" | "" => 1.0,
        _ => return None,
    };
    Some(factor)
}

fn millis_to_duration(millis: f64) -> Duration {
    if millis.is_nan() || millis <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(millis / SECOND).unwrap_or(Duration::MAX)
}

// Numeric zero is "no delay given".
pub(crate) fn or_default(delay: Duration) -> Duration {
    if delay.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        delay
    }
}

/// Resolve `delay`, falling back to [`DEFAULT_TIMEOUT`] if it doesn't parse.
pub(crate) fn resolve_or_default<D>(delay: D) -> Duration
where
    D: IntoDelay,
{
    delay.into_delay().unwrap_or_else(|err| {
        tracing::debug!(%err, default = ?DEFAULT_TIMEOUT, "using default timeout");
        DEFAULT_TIMEOUT
    })
}

/// Conversion into a timeout delay.
///
/// Numbers are milliseconds. Numeric zero, `NaN` and `None` are treated as
/// "not given" and resolve to [`DEFAULT_TIMEOUT`]. Negative numbers resolve
/// to [`Duration::ZERO`], so the deadline is hit right away.
///
/// Strings are parsed with [`parse_duration`], where an explicit zero such
/// as `"0ms"` is kept.
pub trait IntoDelay {
    /// Resolve `self` into a delay.
    fn into_delay(self) -> Result<Duration, ParseDurationError>;
}

impl IntoDelay for Duration {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        Ok(or_default(self))
    }
}

impl IntoDelay for u64 {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        Duration::from_millis(self).into_delay()
    }
}

impl IntoDelay for u32 {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        u64::from(self).into_delay()
    }
}

impl IntoDelay for i64 {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        match u64::try_from(self) {
            Ok(millis) => millis.into_delay(),
            // negative
            Err(_) => Ok(Duration::ZERO),
        }
    }
}

impl IntoDelay for i32 {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        i64::from(self).into_delay()
    }
}

impl IntoDelay for f64 {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        if self.is_nan() || self == 0.0 {
            return Ok(DEFAULT_TIMEOUT);
        }
        Ok(millis_to_duration(self))
    }
}

impl IntoDelay for &str {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        parse_duration(self)
    }
}

impl IntoDelay for String {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        parse_duration(&self)
    }
}

impl IntoDelay for &String {
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        parse_duration(self)
    }
}

impl<D> IntoDelay for Option<D>
where
    D: IntoDelay,
{
    fn into_delay(self) -> Result<Duration, ParseDurationError> {
        match self {
            Some(delay) => delay.into_delay(),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }
}

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDurationError {
    input: String,
    kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
    Empty,
    TooLong,
    InvalidNumber,
    UnknownUnit,
}

impl ParseDurationError {
    fn new(input: &str, kind: ErrorKind) -> Self {
        let input = match kind {
            ErrorKind::TooLong => format!("{}...", &input[..floor_char_boundary(input, 16)]),
            _ => input.to_owned(),
        };
        Self { input, kind }
    }

    /// The input that failed to parse. Overlong inputs are truncated.
    pub fn input(&self) -> &str {
        &self.input
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            ErrorKind::Empty => "empty string",
            ErrorKind::TooLong => "input too long",
            ErrorKind::InvalidNumber => "expected a number",
            ErrorKind::UnknownUnit => "unknown unit",
        };
        write!(f, "invalid duration {:?}: {}", self.input, reason)
    }
}

impl std::error::Error for ParseDurationError {}
