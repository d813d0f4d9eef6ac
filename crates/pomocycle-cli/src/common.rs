//! Argument parsing helpers shared by commands.

use std::time::Duration;

/// Parse a user-entered duration: `90s`, `25m`, `1h`, or a bare number of
/// minutes. Negative and non-numeric input is rejected here, before a
/// `Configuration` is ever built.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let (digits, unit_secs) = match input.char_indices().last() {
        Some((i, 's')) => (&input[..i], 1),
        Some((i, 'm')) => (&input[..i], 60),
        Some((i, 'h')) => (&input[..i], 60 * 60),
        Some(_) => (input, 60),
        None => return Err("duration must not be empty".to_string()),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{input}' (expected e.g. 90s, 25m, 1h)"))?;
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{input}' is too large"))
}

/// Milliseconds in `d`, saturating at `u64::MAX`.
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
