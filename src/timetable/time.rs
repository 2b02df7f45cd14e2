// src/timetable/time.rs

use std::sync::LazyLock;

use regex::Regex;

static HHMM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2})(?::\d{2})?\s*$").expect("valid time regex")
});

/// Minutes since midnight for `HH:MM` (seconds, if present, are ignored).
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let caps = HHMM.captures(value)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Half-open overlap of `[start_a, end_a)` and `[start_b, end_b)`.
///
/// Any unparsable bound makes the ranges non-overlapping, so bad data
/// never blocks an assignment.
pub fn overlaps(start_a: &str, end_a: &str, start_b: &str, end_b: &str) -> bool {
    match (
        parse_hhmm(start_a),
        parse_hhmm(end_a),
        parse_hhmm(start_b),
        parse_hhmm(end_b),
    ) {
        (Some(sa), Some(ea), Some(sb), Some(eb)) => sa < eb && ea > sb,
        _ => false,
    }
}
