//! Per-cell display and interaction flags.

use serde::Serialize;

use crate::grid::{Bounds, VisibleRange};
use crate::selection::Selection;
use crate::{CalendarDate, DateRange};

/// Everything a cell's flags depend on.
#[derive(Clone, Copy)]
pub struct CellContext<'a> {
    pub selection: &'a Selection,
    pub bounds: &'a Bounds,
    pub visible: &'a VisibleRange,
    pub focused: Option<CalendarDate>,
    pub today: CalendarDate,
    /// Cell under the pointer while a range end is being picked.
    pub hovered: Option<CalendarDate>,
    pub is_unavailable: Option<&'a dyn Fn(&CalendarDate) -> bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CellState {
    pub is_selected: bool,
    pub is_disabled: bool,
    pub is_unavailable: bool,
    pub is_outside_visible_range: bool,
    pub is_focused: bool,
    pub is_today: bool,
    /// Outside `[min, max]`.
    pub is_invalid: bool,
    pub is_range_start: bool,
    pub is_range_end: bool,
    /// Between the pending range start and the hovered cell.
    pub is_in_preview: bool,
    pub is_selectable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub date: CalendarDate,
    pub state: CellState,
}

pub const fn selectable(is_disabled: bool, is_unavailable: bool) -> bool {
    !is_disabled && !is_unavailable
}

/// Flags for one cell. `caller_disabled` marks a cell the view disabled on
/// its own. A disabled cell never also reports unavailable.
pub fn resolve(date: &CalendarDate, ctx: &CellContext<'_>, caller_disabled: bool) -> CellState {
    let out_of_bounds = !ctx.bounds.contains(date);
    let pending = ctx.selection.pending_start();
    let preview = pending.zip(ctx.hovered);

    let wrong_side = preview.is_some_and(|(start, hovered)| {
        (hovered > start && *date < start) || (hovered < start && *date > start)
    });
    let is_disabled = caller_disabled || out_of_bounds || wrong_side;

    let predicate = ctx.is_unavailable.is_some_and(|is_unavailable| is_unavailable(date));
    let is_unavailable = predicate && !is_disabled;
    let is_selected = ctx.selection.contains(date);

    let (is_range_start, is_range_end) = match ctx.selection {
        Selection::Range { start, end } => (start.as_ref() == Some(date), end.as_ref() == Some(date)),
        Selection::Single(_) => (false, false),
    };

    CellState {
        is_selected,
        is_disabled,
        is_unavailable,
        is_outside_visible_range: !ctx.visible.contains(date),
        is_focused: ctx.focused.as_ref() == Some(date),
        is_today: ctx.today == *date,
        is_invalid: out_of_bounds,
        is_range_start,
        is_range_end,
        is_in_preview: !is_disabled
            && preview.is_some_and(|(start, hovered)| DateRange::ordered(start, hovered).contains(date)),
        is_selectable: selectable(is_disabled, is_unavailable),
    }
}

/// Resolves a whole grid in one pass; the predicate runs once per cell.
pub fn resolve_grid(weeks: &[Vec<CalendarDate>], ctx: &CellContext<'_>) -> Vec<Vec<Cell>> {
    weeks
        .iter()
        .map(|week| {
            week.iter()
                .map(|date| Cell {
                    date: *date,
                    state: resolve(date, ctx, false),
                })
                .collect()
        })
        .collect()
}
