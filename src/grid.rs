//! Month grid layout and keyboard navigation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DAYS_PER_WEEK, FIXED_WEEK_ROWS};
use crate::range::RangeError;
use crate::types::Weekday;
use crate::{CalendarDate, DateRange};

/// Arrow-key movement within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageDirection {
    Prev,
    Next,
}

/// Optional inclusive `[min, max]` limits on selectable dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    min: Option<CalendarDate>,
    max: Option<CalendarDate>,
}

impl Bounds {
    pub const UNBOUNDED: Self = Self { min: None, max: None };

    /// # Errors
    /// Returns `RangeError::InvalidRange` if `min` is after `max`.
    pub fn new(min: Option<CalendarDate>, max: Option<CalendarDate>) -> Result<Self, RangeError> {
        if let (Some(start), Some(end)) = (min, max)
            && start > end
        {
            return Err(RangeError::InvalidRange { start, end });
        }
        Ok(Self { min, max })
    }

    pub const fn min(&self) -> Option<CalendarDate> {
        self.min
    }

    pub const fn max(&self) -> Option<CalendarDate> {
        self.max
    }

    pub fn contains(&self, date: &CalendarDate) -> bool {
        self.min.is_none_or(|min| *date >= min) && self.max.is_none_or(|max| *date <= max)
    }

    pub fn clamp(&self, date: CalendarDate) -> CalendarDate {
        date.clamp_to(self.min, self.max)
    }

    /// `true` if no date of `range` lies within the bounds.
    pub fn excludes(&self, range: &DateRange) -> bool {
        self.min.is_some_and(|min| range.end() < min) || self.max.is_some_and(|max| range.start() > max)
    }
}

/// The dates a month view shows.
///
/// `start..=end` is the padded grid: whole weeks, `start` falling on the
/// first day of the week. The displayed month itself is `month_start..=month_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VisibleRange {
    start: CalendarDate,
    end: CalendarDate,
    month_start: CalendarDate,
    month_end: CalendarDate,
}

impl VisibleRange {
    pub const fn start(&self) -> CalendarDate {
        self.start
    }

    pub const fn end(&self) -> CalendarDate {
        self.end
    }

    pub const fn month_start(&self) -> CalendarDate {
        self.month_start
    }

    pub const fn month_end(&self) -> CalendarDate {
        self.month_end
    }

    /// `true` if `date` belongs to the displayed month.
    pub fn contains(&self, date: &CalendarDate) -> bool {
        self.month_start <= *date && *date <= self.month_end
    }

    /// `true` if `date` has a cell in the grid, padding included.
    pub fn grid_contains(&self, date: &CalendarDate) -> bool {
        self.start <= *date && *date <= self.end
    }

    pub const fn month(&self) -> DateRange {
        DateRange::from_ordered(self.month_start, self.month_end)
    }

    pub const fn grid(&self) -> DateRange {
        DateRange::from_ordered(self.start, self.end)
    }
}

/// Moves focus by one cell or one week.
pub fn move_focus(current: CalendarDate, direction: Direction) -> CalendarDate {
    let days = match direction {
        Direction::Left => -1,
        Direction::Right => 1,
        Direction::Up => -i64::from(DAYS_PER_WEEK),
        Direction::Down => i64::from(DAYS_PER_WEEK),
    };
    current.add_days(days)
}

/// Moves focus by a month, or by a year when `larger` is set. The day is
/// clamped to the target month.
pub fn page(current: CalendarDate, direction: PageDirection, larger: bool) -> CalendarDate {
    let step = if larger { 12 } else { 1 };
    match direction {
        PageDirection::Prev => current.add_months(-step),
        PageDirection::Next => current.add_months(step),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridNavigator {
    first_day_of_week: Weekday,
    fixed_weeks: bool,
}

impl GridNavigator {
    pub const fn new(first_day_of_week: Weekday, fixed_weeks: bool) -> Self {
        Self {
            first_day_of_week,
            fixed_weeks,
        }
    }

    pub const fn first_day_of_week(&self) -> Weekday {
        self.first_day_of_week
    }

    pub const fn fixed_weeks(&self) -> bool {
        self.fixed_weeks
    }

    /// `true` if the month of `date` can be laid out as whole weeks. The first
    /// and last representable months cannot.
    pub fn is_navigable(date: &CalendarDate) -> bool {
        (CalendarDate::FIRST_GRID_DATE..=CalendarDate::LAST_GRID_DATE).contains(date)
    }

    /// Clamps `date` into the months that have a full grid.
    pub fn clamp_to_grid(date: CalendarDate) -> CalendarDate {
        date.clamp_to(Some(CalendarDate::FIRST_GRID_DATE), Some(CalendarDate::LAST_GRID_DATE))
    }

    /// Grid for the month containing `date`, or the nearest month with a full grid.
    pub fn visible_range(&self, date: CalendarDate) -> VisibleRange {
        let date = Self::clamp_to_grid(date);
        let month_start = date.start_of_month();
        let month_end = date.end_of_month();
        let start = month_start.start_of_week(self.first_day_of_week);
        let end = if self.fixed_weeks {
            let days = FIXED_WEEK_ROWS * usize::from(DAYS_PER_WEEK);
            start.add_days(i64::try_from(days).unwrap_or(i64::MAX) - 1)
        } else {
            month_end.end_of_week(self.first_day_of_week)
        };
        VisibleRange {
            start,
            end,
            month_start,
            month_end,
        }
    }

    /// Grid rows of seven dates each.
    pub fn weeks(&self, visible: &VisibleRange) -> Vec<Vec<CalendarDate>> {
        let days: Vec<_> = visible.grid().days().collect();
        days.chunks(usize::from(DAYS_PER_WEEK)).map(<[_]>::to_vec).collect()
    }

    /// Weekdays in column order.
    pub fn week_days(&self) -> [Weekday; 7] {
        Weekday::week_from(self.first_day_of_week)
    }

    /// The visible range that shows `focused`; `visible` itself if it already does.
    pub fn repage(&self, focused: CalendarDate, visible: &VisibleRange) -> VisibleRange {
        if visible.contains(&focused) {
            return *visible;
        }
        let next = self.visible_range(focused);
        debug!(from = %visible.month_start, to = %next.month_start, "repaging visible range");
        next
    }

    /// `true` when paging in `direction` would show only out-of-bounds dates.
    pub fn is_range_at_boundary(&self, visible: &VisibleRange, bounds: &Bounds, direction: PageDirection) -> bool {
        let neighbour = match direction {
            PageDirection::Prev => visible.month_start.checked_add_days(-1),
            PageDirection::Next => visible.month_end.checked_add_days(1),
        }
        .filter(Self::is_navigable);
        neighbour.is_none_or(|date| bounds.excludes(&DateRange::month_of(date)))
    }

    /// First day of the focused week, for `Home`.
    pub fn week_start(&self, date: CalendarDate) -> CalendarDate {
        date.start_of_week(self.first_day_of_week)
    }

    /// Last day of the focused week, for `End`.
    pub fn week_end(&self, date: CalendarDate) -> CalendarDate {
        date.end_of_week(self.first_day_of_week)
    }
}
