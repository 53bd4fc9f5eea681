//! The calendar date value type.

use crate::consts::{DATE_SEPARATOR, DAYS_PER_WEEK, DECEMBER, FEBRUARY, JANUARY, NOVEMBER, MAX_MONTH, MAX_YEAR, MIN_DAY, MIN_YEAR};
use crate::prelude::*;
use crate::types::{Day, Month, Weekday, Year, days_in_month};
use crate::DateError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Days from 0000-03-01 to 1970-01-01 in the proleptic Gregorian calendar.
const UNIX_EPOCH_SHIFT: i64 = 719_468;
/// Days in a full 400-year Gregorian cycle.
const DAYS_PER_ERA: i64 = 146_097;
/// 1970-01-01 was a Thursday.
const EPOCH_WEEKDAY: i64 = Weekday::Thursday as i64;

/// An immutable calendar date in the proleptic Gregorian calendar.
///
/// Every mutator returns a new value. Ordering and equality are by
/// `(year, month, day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{year}-{month}-{day}")]
pub struct CalendarDate {
    year: Year,
    month: Month,
    day: Day,
}

impl CalendarDate {
    /// Smallest representable date, 0001-01-01.
    pub const MIN: Self = match Self::from_parts(MIN_YEAR, JANUARY, MIN_DAY) {
        Some(date) => date,
        None => unreachable!(),
    };

    /// Largest representable date, 9999-12-31.
    pub const MAX: Self = match Self::from_parts(MAX_YEAR, DECEMBER, 31) {
        Some(date) => date,
        None => unreachable!(),
    };

    /// First day of the earliest month whose whole-week grid is representable.
    pub(crate) const FIRST_GRID_DATE: Self = match Self::from_parts(MIN_YEAR, FEBRUARY, MIN_DAY) {
        Some(date) => date,
        None => unreachable!(),
    };

    /// Last day of the latest month whose six-row grid is representable.
    pub(crate) const LAST_GRID_DATE: Self = match Self::from_parts(MAX_YEAR, NOVEMBER, 30) {
        Some(date) => date,
        None => unreachable!(),
    };

    /// Creates a date from raw components.
    ///
    /// # Errors
    /// Returns the `DateError` of the first invalid component.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, DateError> {
        Ok(Self {
            year: Year::new(year)?,
            month: Month::new(month)?,
            day: Day::new(day, year, month)?,
        })
    }

    const fn from_parts(year: u16, month: u8, day: u8) -> Option<Self> {
        if year < MIN_YEAR || year > MAX_YEAR || month == 0 || month > MAX_MONTH {
            return None;
        }
        if day == 0 || day > days_in_month(year, month) {
            return None;
        }
        match (Year::from_valid(year), Month::from_valid(month), Day::from_valid(day)) {
            (Some(year), Some(month), Some(day)) => Some(Self { year, month, day }),
            _ => None,
        }
    }

    /// Builds a date, clamping `day` to the length of the month.
    ///
    /// # Errors
    /// Returns an error if `year` or `month` is out of range.
    pub fn with_clamped_day(year: u16, month: u8, day: u8) -> Result<Self, DateError> {
        Month::new(month)?;
        Year::new(year)?;
        Self::new(year, month, day.clamp(MIN_DAY, days_in_month(year, month)))
    }

    #[inline]
    pub const fn year(&self) -> u16 {
        self.year.get()
    }

    #[inline]
    pub const fn month(&self) -> u8 {
        self.month.get()
    }

    #[inline]
    pub const fn day(&self) -> u8 {
        self.day.get()
    }

    pub const fn year_typed(&self) -> Year {
        self.year
    }

    pub const fn month_typed(&self) -> Month {
        self.month
    }

    pub const fn day_typed(&self) -> Day {
        self.day
    }

    pub const fn days_in_month(&self) -> u8 {
        days_in_month(self.year(), self.month())
    }

    /// Days since 1970-01-01 (negative before the epoch).
    pub const fn to_epoch_days(&self) -> i64 {
        let month = self.month() as i64;
        let year = self.year() as i64 - if month <= 2 { 1 } else { 0 };
        let era = year.div_euclid(400);
        let year_of_era = year - era * 400;
        let shifted_month = (month + 9) % 12;
        let day_of_year = (153 * shifted_month + 2) / 5 + self.day() as i64 - 1;
        let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
        era * DAYS_PER_ERA + day_of_era - UNIX_EPOCH_SHIFT
    }

    /// Inverse of [`CalendarDate::to_epoch_days`]; `None` outside 0001..=9999.
    pub fn from_epoch_days(days: i64) -> Option<Self> {
        let z = days + UNIX_EPOCH_SHIFT;
        let era = z.div_euclid(DAYS_PER_ERA);
        let day_of_era = z - era * DAYS_PER_ERA;
        let year_of_era =
            (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
        let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
        let mp = (5 * day_of_year + 2) / 153;
        let day = day_of_year - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = year_of_era + era * 400 + i64::from(month <= 2);

        let year = u16::try_from(year).ok()?;
        let month = u8::try_from(month).ok()?;
        let day = u8::try_from(day).ok()?;
        Self::new(year, month, day).ok()
    }

    pub const fn weekday(&self) -> Weekday {
        let index = (self.to_epoch_days() + EPOCH_WEEKDAY).rem_euclid(DAYS_PER_WEEK as i64);
        Weekday::from_index(index as u8)
    }

    /// Adds `days`, returning `None` if the result leaves the representable range.
    pub fn checked_add_days(&self, days: i64) -> Option<Self> {
        Self::from_epoch_days(self.to_epoch_days().checked_add(days)?)
    }

    /// Adds `days`, saturating at [`CalendarDate::MIN`] / [`CalendarDate::MAX`].
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        self.checked_add_days(days)
            .unwrap_or(if days < 0 { Self::MIN } else { Self::MAX })
    }

    /// Adds whole months, keeping the day-of-month clamped to the target month length.
    /// Saturates at the representable range.
    #[must_use]
    pub fn add_months(&self, months: i32) -> Self {
        let index = i64::from(self.year()) * 12 + i64::from(self.month()) - 1 + i64::from(months);
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) + 1;
        match (u16::try_from(year), u8::try_from(month)) {
            (Ok(year), Ok(month)) => Self::with_clamped_day(year, month, self.day())
                .unwrap_or(if months < 0 { Self::MIN } else { Self::MAX }),
            _ => {
                if months < 0 {
                    Self::MIN
                } else {
                    Self::MAX
                }
            }
        }
    }

    #[must_use]
    pub fn add_years(&self, years: i32) -> Self {
        self.add_months(years.saturating_mul(12))
    }

    /// Same day in another month, clamped to that month's length.
    ///
    /// # Errors
    /// Returns `DateError::InvalidMonth` for months outside 1..=12.
    pub fn with_month(&self, month: u8) -> Result<Self, DateError> {
        Self::with_clamped_day(self.year(), month, self.day())
    }

    /// Same month and day in another year, with Feb 29 clamped.
    ///
    /// # Errors
    /// Returns `DateError::InvalidYear` for years outside 1..=9999.
    pub fn with_year(&self, year: u16) -> Result<Self, DateError> {
        Self::with_clamped_day(year, self.month(), self.day())
    }

    #[must_use]
    pub fn start_of_month(&self) -> Self {
        Self {
            day: self.day_at(MIN_DAY),
            ..*self
        }
    }

    #[must_use]
    pub fn end_of_month(&self) -> Self {
        Self {
            day: self.day_at(self.days_in_month()),
            ..*self
        }
    }

    /// First date of the week containing `self`, for weeks starting on `first`.
    #[must_use]
    pub fn start_of_week(&self, first: Weekday) -> Self {
        self.add_days(-i64::from(self.weekday().days_since(first)))
    }

    /// Last date of the week containing `self`, for weeks starting on `first`.
    #[must_use]
    pub fn end_of_week(&self, first: Weekday) -> Self {
        self.start_of_week(first).add_days(i64::from(DAYS_PER_WEEK) - 1)
    }

    pub const fn is_same_month(&self, other: &Self) -> bool {
        self.year() == other.year() && self.month() == other.month()
    }

    /// Clamps into an optional inclusive `[min, max]`.
    #[must_use]
    pub fn clamp_to(&self, min: Option<Self>, max: Option<Self>) -> Self {
        let mut date = *self;
        if let Some(min) = min {
            date = date.max(min);
        }
        if let Some(max) = max {
            date = date.min(max);
        }
        date
    }

    fn day_at(&self, day: u8) -> Day {
        Day::new(day, self.year(), self.month()).unwrap_or(self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = DateError;

    /// Parses the ISO `YYYY-MM-DD` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DateError::EmptyInput);
        }

        let parts: Vec<&str> = trimmed.split(DATE_SEPARATOR).map(str::trim).collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(DateError::InvalidFormat(format!(
                "expected YYYY{DATE_SEPARATOR}MM{DATE_SEPARATOR}DD, got {trimmed}"
            )));
        };

        let year = year
            .parse::<u16>()
            .map_err(|_| DateError::InvalidFormat((*year).to_owned()))?;
        let month = month
            .parse::<u8>()
            .map_err(|_| DateError::InvalidFormat((*month).to_owned()))?;
        let day = day
            .parse::<u8>()
            .map_err(|_| DateError::InvalidFormat((*day).to_owned()))?;

        Self::new(year, month, day)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
