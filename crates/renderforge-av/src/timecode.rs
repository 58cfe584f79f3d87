//! Timecode conversion.
//!
//! The tools print durations as `HH:MM:SS.ff`, and callers pass timecodes in
//! the same loose family of shapes (`1:30`, `05`, `00:01:30.25`). The shape
//! is inferred from the string length alone, which assumes two-digit fields.
//! The thresholds are kept exactly as the tools' users expect them, so a
//! three-character string without a dot (`"123"`, `"1:3"`) is rejected.

use crate::{Error, Result};
use std::time::Duration;

/// Shape of a timecode string, chosen by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    HoursMinutesSeconds,
    MinutesSeconds,
    Seconds,
}

fn infer_shape(text: &str) -> Option<(Shape, bool)> {
    let len = text.len();
    if text.contains('.') {
        let shape = if len > 9 {
            Shape::HoursMinutesSeconds
        } else if len > 5 {
            Shape::MinutesSeconds
        } else if len > 3 {
            Shape::Seconds
        } else {
            return None;
        };
        Some((shape, true))
    } else {
        let shape = if len > 6 {
            Shape::HoursMinutesSeconds
        } else if len > 3 {
            Shape::MinutesSeconds
        } else if len == 1 || len == 2 {
            Shape::Seconds
        } else {
            return None;
        };
        Some((shape, false))
    }
}

/// Parse a 1-2 digit field bounded by `max`.
fn field(part: &str, max: u32) -> Option<u32> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok().filter(|v| *v <= max)
}

/// Parse 1-6 fractional digits into seconds, keeping leading zeros.
fn fraction(part: &str) -> Option<f64> {
    if part.is_empty() || part.len() > 6 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: u32 = part.parse().ok()?;
    Some(f64::from(digits) / 10f64.powi(part.len() as i32))
}

/// Convert a timecode string to seconds.
///
/// Accepted shapes: `H:M:S`, `M:S`, `S`, each optionally followed by `.f`
/// with 1-6 fractional digits. Fields hold 1-2 digits; hours run 0-23,
/// minutes and seconds 0-59.
///
/// # Errors
///
/// Returns [`Error::InvalidTimecode`] when the length selects no shape or the
/// string does not match the selected shape.
///
/// # Example
///
/// ```
/// use renderforge_av::timecode::to_seconds;
///
/// assert_eq!(to_seconds("01:30.25")?, 90.25);
/// assert_eq!(to_seconds("5")?, 5.0);
/// assert!(to_seconds("123").is_err());
/// # Ok::<(), renderforge_av::Error>(())
/// ```
pub fn to_seconds(text: &str) -> Result<f64> {
    let invalid = || Error::invalid_timecode(text);
    let (shape, fractional) = infer_shape(text).ok_or_else(invalid)?;

    let (whole, frac) = if fractional {
        let (whole, frac) = text.split_once('.').ok_or_else(invalid)?;
        (whole, fraction(frac).ok_or_else(invalid)?)
    } else {
        (text, 0.0)
    };

    let parts: Vec<&str> = whole.split(':').collect();
    let (hours, minutes, seconds) = match (shape, parts.as_slice()) {
        (Shape::HoursMinutesSeconds, [h, m, s]) => (field(h, 23), field(m, 59), field(s, 59)),
        (Shape::MinutesSeconds, [m, s]) => (Some(0), field(m, 59), field(s, 59)),
        (Shape::Seconds, [s]) => (Some(0), Some(0), field(s, 59)),
        _ => return Err(invalid()),
    };

    match (hours, minutes, seconds) {
        (Some(h), Some(m), Some(s)) => Ok(f64::from(h * 3600 + m * 60 + s) + frac),
        _ => Err(invalid()),
    }
}

/// Format seconds as `HH:MM:SS.ff`, the inverse of [`to_seconds`] at the
/// tools' two-digit fractional precision.
pub fn format_timecode(seconds: f64) -> String {
    let hundredths = (seconds.max(0.0) * 100.0).round() as u64;
    let frac = hundredths % 100;
    let total = hundredths / 100;
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        frac
    )
}

/// Human-readable duration of a render or scan.
///
/// Renders read "Over the course of 1 minute and 2.50 seconds." and scans
/// read "took 0.31 seconds to scan."
pub fn describe_elapsed(elapsed: Duration, scan: bool) -> String {
    let hundredths = (elapsed.as_secs_f64() * 100.0).round() as u64;
    let frac = hundredths % 100;
    let total = hundredths / 100;
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);

    let plural = |n: u64| if n == 1 { "" } else { "s" };
    let seconds_plural = if seconds == 1 && frac == 0 { "" } else { "s" };
    let suffix = if scan { " to scan" } else { "" };
    let begin = if scan { "took" } else { "Over the course of" };

    let sec = format!("{seconds}.{frac:02} second{seconds_plural}{suffix}.");
    let min = format!("{minutes} minute{}", plural(minutes));
    let hr = format!("{hours} hour{}", plural(hours));

    if hours >= 1 && minutes >= 1 {
        format!("{begin} {hr}, {min}, and {sec}")
    } else if hours >= 1 {
        format!("{begin} {hr} and {sec}")
    } else if minutes >= 1 {
        format!("{begin} {min} and {sec}")
    } else {
        format!("{begin} {sec}")
    }
}
