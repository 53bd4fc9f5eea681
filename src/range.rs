use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, DateError, RANGE_SEPARATOR, prelude::*};

/// An inclusive span of calendar dates.
/// The start date must be less than or equal to the end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{start}/{end}")]
pub struct DateRange {
    start: CalendarDate,
    end:   CalendarDate,
}

/// Error type for date range operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Start date is after end date.
    #[error("Invalid date range: start ({start}) is after end ({end})")]
    InvalidRange { start: CalendarDate, end: CalendarDate },

    /// Error parsing date component.
    #[error(transparent)]
    Date(#[from] DateError),

    /// Invalid range format.
    #[error("Invalid range format: {0}")]
    InvalidFormat(String),
}

impl DateRange {
    /// Creates a new date range with validation.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidRange` if start > end.
    pub fn new(start: CalendarDate, end: CalendarDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two dates in either order.
    pub fn ordered(a: CalendarDate, b: CalendarDate) -> Self {
        Self {
            start: a.min(b),
            end:   a.max(b),
        }
    }

    /// Callers guarantee `start <= end`.
    pub(crate) const fn from_ordered(start: CalendarDate, end: CalendarDate) -> Self {
        Self { start, end }
    }

    /// The whole month containing `date`.
    pub fn month_of(date: CalendarDate) -> Self {
        Self {
            start: date.start_of_month(),
            end:   date.end_of_month(),
        }
    }

    pub const fn start(&self) -> CalendarDate {
        self.start
    }

    pub const fn end(&self) -> CalendarDate {
        self.end
    }

    pub fn contains(&self, date: &CalendarDate) -> bool {
        self.start <= *date && *date <= self.end
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn is_within(&self, other: &Self) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// Number of days covered, counting both ends.
    pub const fn len_days(&self) -> i64 {
        self.end.to_epoch_days() - self.start.to_epoch_days() + 1
    }

    /// Every date of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        (0..self.len_days()).map(|offset| self.start.add_days(offset))
    }
}

impl FromStr for DateRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let separator_count = trimmed.matches(RANGE_SEPARATOR).count();

        match separator_count {
            0 => Err(RangeError::InvalidFormat(format!(
                "No range separator found (expected '{RANGE_SEPARATOR}'): {s}"
            ))),
            1 => {
                let (start_str, end_str) = trimmed.split_once(RANGE_SEPARATOR).ok_or_else(|| {
                    RangeError::InvalidFormat(format!("Separator '{RANGE_SEPARATOR}' not found: {s}"))
                })?;
                let start = start_str.trim().parse::<CalendarDate>()?;
                let end = end_str.trim().parse::<CalendarDate>()?;

                Self::new(start, end)
            },
            _ => Err(RangeError::InvalidFormat(format!(
                "Too many '{RANGE_SEPARATOR}' separators: expected 1, found {separator_count}"
            ))),
        }
    }
}

impl Serialize for DateRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_new_range_cases() {
        struct TestCase {
            start:          CalendarDate,
            end:            CalendarDate,
            should_succeed: bool,
            description:    &'static str,
        }

        let cases = [
            TestCase {
                start:          date(2024, 1, 1),
                end:            date(2024, 1, 31),
                should_succeed: true,
                description:    "valid range (start < end)",
            },
            TestCase {
                start:          date(2024, 2, 1),
                end:            date(2024, 1, 31),
                should_succeed: false,
                description:    "invalid range (start > end)",
            },
            TestCase {
                start:          date(2024, 1, 5),
                end:            date(2024, 1, 5),
                should_succeed: true,
                description:    "single-day range (start == end)",
            },
        ];

        for case in &cases {
            let range = DateRange::new(case.start, case.end);
            assert_eq!(range.is_ok(), case.should_succeed, "{}", case.description);
        }
    }

    #[test]
    fn test_ordered_swaps() {
        let range = DateRange::ordered(date(2024, 3, 15), date(2024, 3, 10));
        assert_eq!(range.start(), date(2024, 3, 10));
        assert_eq!(range.end(), date(2024, 3, 15));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::new(date(2024, 1, 10), date(2024, 1, 20)).expect("valid range");
        assert!(range.contains(&date(2024, 1, 10)));
        assert!(range.contains(&date(2024, 1, 20)));
        assert!(!range.contains(&date(2024, 1, 9)));
        assert!(!range.contains(&date(2024, 1, 21)));
    }

    #[test]
    fn test_overlaps_and_within() {
        let january = DateRange::month_of(date(2024, 1, 17));
        let late_jan = DateRange::new(date(2024, 1, 25), date(2024, 2, 3)).expect("valid range");
        let march = DateRange::month_of(date(2024, 3, 1));

        assert!(january.overlaps(&late_jan));
        assert!(late_jan.overlaps(&january));
        assert!(!january.overlaps(&march));
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 3)).expect("valid range").is_within(&january));
        assert!(!late_jan.is_within(&january));
    }

    #[test]
    fn test_month_of_and_days() {
        let february = DateRange::month_of(date(2024, 2, 14));
        assert_eq!(february.start(), date(2024, 2, 1));
        assert_eq!(february.end(), date(2024, 2, 29));
        assert_eq!(february.len_days(), 29);
        let days: Vec<_> = february.days().collect();
        assert_eq!(days.len(), 29);
        assert_eq!(days.last(), Some(&date(2024, 2, 29)));
    }

    #[test]
    fn test_parse_and_display() {
        let range = "2024-01-10/2024-01-20".parse::<DateRange>().expect("failed to parse range");
        assert_eq!(range.to_string(), "2024-01-10/2024-01-20");

        assert!("2024-01-20/2024-01-10".parse::<DateRange>().is_err());
        let err = "2024-01-10".parse::<DateRange>().expect_err("missing separator");
        assert!(err.to_string().contains("No range separator found"));
        let err = "2024-01-10/2024-01-11/2024-01-12"
            .parse::<DateRange>()
            .expect_err("too many separators");
        assert!(err.to_string().contains("expected 1, found 2"));
    }

    #[test]
    fn test_serde_string_format() {
        let range = DateRange::new(date(2024, 1, 10), date(2024, 1, 20)).expect("valid range");
        let json = serde_json::to_string(&range).expect("failed to serialize range");
        assert_eq!(json, r#""2024-01-10/2024-01-20""#);
        let parsed: DateRange = serde_json::from_str(&json).expect("failed to deserialize range");
        assert_eq!(parsed, range);
    }
}
