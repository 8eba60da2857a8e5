//! Timestamp parsing for the two wire formats. Every time field stored in
//! a document uses the single canonical shape `YYYY-MM-DDTHH:MM:SSZ`.

use chrono::{DateTime, NaiveDateTime};

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Build-system timestamps: `2017-01-05 14:32:55.123456`. Exactly six
/// fractional digits; anything after them is ignored.
pub(crate) fn parse_build(value: &str) -> Option<NaiveDateTime> {
    let (dt, rest) = NaiveDateTime::parse_and_remainder(value, "%Y-%m-%d %H:%M:%S").ok()?;
    let frac = rest.strip_prefix('.')?.as_bytes();
    if frac.len() < 6 || !frac[..6].iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(dt)
}

/// ISO-8601 UTC with a `T`, `t` or space separator, no fraction, trailing
/// `Z` required.
pub(crate) fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    let s = value.strip_suffix('Z')?;
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dt%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub(crate) fn canonical(dt: &NaiveDateTime) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Read a canonical value back, falling back to the Unix epoch when the
/// field is absent or does not parse.
pub(crate) fn canonical_or_epoch(value: Option<&str>) -> NaiveDateTime {
    value
        .and_then(|s| NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT).ok())
        .unwrap_or_else(|| DateTime::UNIX_EPOCH.naive_utc())
}
