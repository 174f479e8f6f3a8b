use chrono::{DateTime, Local};
use std::time::Duration;

/// Whole seconds elapsed, truncated.
pub fn into_seconds(elapsed: Duration) -> u64 {
    elapsed.as_secs()
}

/// `"<d>d <h>h <m>m <s>s"`, each unit wrapped at the next one up.
pub fn readable_time(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    format!(
        "{}d {}h {}m {}s",
        days,
        hours % 24,
        minutes % 60,
        seconds % 60
    )
}

/// Local wall-clock timestamp for start/finish log lines.
pub fn readable_date(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Leading-integer parse in the forgiving style of spreadsheet IDs:
/// skips leading whitespace, accepts one sign, then consumes digits and
/// ignores whatever trails them (`"7abc"` → 7, `"3.9"` → 3).
/// Returns `None` when no digit follows.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }
    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Convert a 0-based column index into A1 letters (`0` → `A`, `26` → `AA`).
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
