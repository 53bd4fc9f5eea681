//! "Today" as seen from a time zone.
//!
//! Time zone databases are out of reach for this crate: [`SystemClock`] knows
//! `UTC` and fixed `±HH:MM` offsets and nothing else. Applications with real
//! zone rules plug in their own [`Clock`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::prelude::*;
use crate::{CalendarDate, DEFAULT_TIME_ZONE};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_PER_HOUR: i64 = 60;

/// Time zone identifier, e.g. `UTC`, `+05:30` or `America/New_York`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeZone(String);

impl TimeZone {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn utc() -> Self {
        Self::new(DEFAULT_TIME_ZONE)
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Offset from UTC in minutes for `UTC`/`Z`/`±HH:MM`/`±HHMM` ids.
    pub fn fixed_offset_minutes(&self) -> Option<i64> {
        let id = self.0.trim();
        if id.eq_ignore_ascii_case("utc") || id.eq_ignore_ascii_case("gmt") || id == "Z" {
            return Some(0);
        }

        let (sign, rest) = match id.as_bytes().first()? {
            b'+' => (1, &id[1..]),
            b'-' => (-1, &id[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours: i64 = digits[..2].parse().ok()?;
        let minutes: i64 = digits[2..].parse().ok()?;
        if hours > 23 || minutes >= MINUTES_PER_HOUR {
            return None;
        }
        Some(sign * (hours * MINUTES_PER_HOUR + minutes))
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl From<&str> for TimeZone {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Source of the current date.
pub trait Clock {
    fn today(&self, time_zone: &TimeZone) -> CalendarDate;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self, time_zone: &TimeZone) -> CalendarDate {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX));

        let offset_minutes = time_zone.fixed_offset_minutes().unwrap_or_else(|| {
            warn!(time_zone = %time_zone, "unknown time zone, falling back to UTC");
            0
        });

        date_at(seconds, offset_minutes)
    }
}

/// Always reports the same date. Useful for tests and server-side rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self, _time_zone: &TimeZone) -> CalendarDate {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn(&TimeZone) -> CalendarDate,
{
    fn today(&self, time_zone: &TimeZone) -> CalendarDate {
        self(time_zone)
    }
}

fn date_at(unix_seconds: i64, offset_minutes: i64) -> CalendarDate {
    let local = unix_seconds.saturating_add(offset_minutes * SECONDS_PER_MINUTE);
    CalendarDate::from_epoch_days(local.div_euclid(SECONDS_PER_DAY)).unwrap_or(CalendarDate::MAX)
}
