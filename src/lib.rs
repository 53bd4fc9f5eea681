//! Headless date picker engine.
//!
//! The crate tracks a calendar's visible month, the selected date (or date
//! range), per-cell state flags, keyboard navigation across the month grid,
//! and a segmented `MM/DD/YYYY`-style text field edited digit by digit. It
//! renders nothing: a view layer reads the queries of [`DatePickerEngine`] and
//! forwards input as [`Event`]s.
//!
//! ```
//! use date_picker::{CalendarDate, DatePickerConfig, DatePickerEngine, Event, FixedClock};
//!
//! let today = CalendarDate::new(2024, 1, 28).unwrap();
//! let mut picker = DatePickerEngine::builder(DatePickerConfig::default())
//!     .clock(FixedClock(today))
//!     .build()
//!     .unwrap();
//!
//! picker.send(Event::FocusCell { date: today });
//! picker.send(Event::ArrowDown);
//! assert_eq!(picker.focused_value().to_string(), "2024-02-04");
//! assert_eq!(picker.visible_range().month_start().to_string(), "2024-02-01");
//! ```

mod cell;
mod clock;
mod config;
mod consts;
mod date;
mod engine;
mod format;
mod grid;
mod prelude;
mod range;
mod segment;
mod selection;
#[cfg(test)]
mod test_utils;
mod types;

pub use cell::{Cell, CellContext, CellState, resolve as resolve_cell, resolve_grid, selectable};
pub use clock::{Clock, FixedClock, SystemClock, TimeZone};
pub use config::{ConfigError, DatePickerConfig};
pub use consts::*;
pub use date::CalendarDate;
pub use engine::{
    DatePickerBuilder, DatePickerEngine, Dispatch, Event, FocusChange, IgnoreReason, Outcome, PickerState,
    UnavailablePredicate, ValueChange,
};
pub use format::{DateFormatter, FormatOptions, FormatterCache, FormatterFactory, PatternFormatter, PatternFormatterFactory};
pub use grid::{Bounds, Direction, GridNavigator, PageDirection, VisibleRange, move_focus, page};
pub use range::{DateRange, RangeError};
pub use segment::{
    AdvanceRule, DateField, DateSegment, DigitOutcome, FocusDirection, FormatError, HourCycle, SegmentFormat,
    SegmentKind, ValidSegments, decompose,
};
pub use selection::{Selection, SelectionMode, select_date};
pub use types::{Day, DayPeriod, Era, Month, TimeOfDay, Weekday, Year, days_in_month, is_leap_year};

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DateError {
    #[display(fmt = "Invalid date format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Invalid year: {} (must be {}-{})", "_0", MIN_YEAR, MAX_YEAR)]
    InvalidYear(u16),
    #[display(fmt = "Invalid month: {} (must be 1-{})", "_0", MAX_MONTH)]
    InvalidMonth(u8),
    #[display(fmt = "Invalid day {day} for month {year}-{month:02}")]
    InvalidDay { year: u16, month: u8, day: u8 },
    #[display(fmt = "Invalid time {hour:02}:{minute:02}")]
    InvalidTime { hour: u8, minute: u8 },
    #[display(fmt = "Empty date string")]
    EmptyInput,
}

impl std::error::Error for DateError {}
