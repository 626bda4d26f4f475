//! Serde helper for duration strings such as "500ms", "2s", "1m".
//!
//! Values are whole numbers followed by a unit; a bare number is seconds.

use serde::{Deserialize, Deserializer, de};
use std::time::Duration;

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

pub(crate) fn parse(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (value, unit) = raw.split_at(split);

    if value.is_empty() {
        return Err(format!("missing duration value in {:?}", raw));
    }
    let value: u64 = value
        .parse()
        .map_err(|_| format!("duration value out of range: {}", value))?;

    let millis_per_unit: u64 = match unit.trim() {
        "ms" => 1,
        "" | "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => return Err(format!("unknown duration unit: {}", other)),
    };

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration too large: {}", raw))
}
