//! Single-date and date-range selection.

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::{CalendarDate, DateRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    #[display(fmt = "single")]
    Single,
    #[display(fmt = "range")]
    Range,
}

/// The picker's value.
///
/// A range with only `start` is in progress; `end` is never set without
/// `start`, and `start <= end` whenever both are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Single(Option<CalendarDate>),
    Range {
        start: Option<CalendarDate>,
        end: Option<CalendarDate>,
    },
}

impl Selection {
    pub const fn empty(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Single => Self::Single(None),
            SelectionMode::Range => Self::Range { start: None, end: None },
        }
    }

    pub fn clear(&mut self) {
        *self = Self::empty(self.mode());
    }

    /// The selection `date` alone would produce: a value, or a one-day range.
    pub const fn collapsed(mode: SelectionMode, date: CalendarDate) -> Self {
        match mode {
            SelectionMode::Single => Self::Single(Some(date)),
            SelectionMode::Range => Self::Range {
                start: Some(date),
                end: Some(date),
            },
        }
    }

    pub const fn from_range(range: DateRange) -> Self {
        Self::Range {
            start: Some(range.start()),
            end: Some(range.end()),
        }
    }

    pub const fn mode(&self) -> SelectionMode {
        match self {
            Self::Single(_) => SelectionMode::Single,
            Self::Range { .. } => SelectionMode::Range,
        }
    }

    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Single(None) | Self::Range { start: None, .. })
    }

    /// A single value is set, or both ends of a range are.
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Single(Some(_)) | Self::Range { start: Some(_), end: Some(_) })
    }

    /// The single value, or the start of a range.
    pub const fn start(&self) -> Option<CalendarDate> {
        match self {
            Self::Single(value) => *value,
            Self::Range { start, .. } => *start,
        }
    }

    /// The single value, or the end of a complete range.
    pub const fn end(&self) -> Option<CalendarDate> {
        match self {
            Self::Single(value) => *value,
            Self::Range { end, .. } => *end,
        }
    }

    /// The range start while the end is still being picked.
    pub const fn pending_start(&self) -> Option<CalendarDate> {
        match self {
            Self::Range { start: Some(start), end: None } => Some(*start),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<DateRange> {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        }
    }

    pub fn contains(&self, date: &CalendarDate) -> bool {
        match self {
            Self::Single(value) => value.as_ref() == Some(date),
            Self::Range { start: Some(start), end: None } => start == date,
            Self::Range { .. } => self.as_range().is_some_and(|range| range.contains(date)),
        }
    }

    /// # Panics
    /// If a range has an end without a start or its ends are out of order.
    pub fn check_invariant(&self) {
        if let Self::Range { start, end } = self {
            match (start, end) {
                (None, Some(end)) => panic!("range selection has end {end} without a start"),
                (Some(start), Some(end)) => {
                    assert!(start <= end, "range selection out of order: {start} > {end}");
                },
                _ => {},
            }
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::empty(SelectionMode::default())
    }
}

/// Applies a click on `date` to `current`.
///
/// Single mode replaces the value. Range mode sets the start first, then the
/// end (swapping if the second click is earlier), and a click on a complete
/// range starts a new one. A selection in the other mode is discarded.
pub fn select_date(current: &Selection, date: CalendarDate, mode: SelectionMode) -> Selection {
    if current.mode() != mode {
        return select_date(&Selection::empty(mode), date, mode);
    }

    match *current {
        Selection::Single(_) => Selection::Single(Some(date)),
        Selection::Range {
            start: Some(start),
            end: None,
        } => Selection::from_range(DateRange::ordered(start, date)),
        Selection::Range { .. } => Selection::Range {
            start: Some(date),
            end: None,
        },
    }
}
