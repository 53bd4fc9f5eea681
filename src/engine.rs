//! The date picker state machine.
//!
//! [`DatePickerEngine`] consumes [`Event`]s and keeps the selection, the
//! focused date, the visible month and the segmented field consistent.
//! Every event runs to completion before the next one starts; listeners that
//! want to react with further events do so through a [`Dispatch`] handle, and
//! those events are queued behind the current one.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::cell::{self, Cell, CellContext, CellState};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, DatePickerConfig};
use crate::format::{FormatterCache, FormatterFactory, PatternFormatterFactory};
use crate::grid::{self, Bounds, Direction, GridNavigator, PageDirection, VisibleRange};
use crate::prelude::*;
use crate::segment::{DateField, DateSegment, DigitOutcome, FocusDirection, SegmentKind};
use crate::selection::{Selection, SelectionMode, select_date};
use crate::types::TimeOfDay;
use crate::{CalendarDate, DateRange, TimeZone};

/// Predicate marking dates that cannot be picked, e.g. fully booked days.
pub type UnavailablePredicate = Box<dyn Fn(&CalendarDate) -> bool>;

type Listener<T> = Box<dyn FnMut(&T, &mut Dispatch)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum PickerState {
    /// Closed, nothing focused.
    #[default]
    #[display(fmt = "idle")]
    Idle,
    /// The grid has keyboard focus.
    #[display(fmt = "focused")]
    Focused,
    /// A segment of the date field has input focus.
    #[display(fmt = "editing({_0})")]
    EditingSegment(SegmentKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    FocusCell { date: CalendarDate },
    ClickCell { date: CalendarDate },
    HoverCell { date: CalendarDate },
    HoverLeave,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    /// Previous month, or previous year when `larger`.
    PageUp { larger: bool },
    /// Next month, or next year when `larger`.
    PageDown { larger: bool },
    ClickPrev,
    ClickNext,
    ClickTrigger,
    Enter,
    FocusSegment { kind: SegmentKind },
    Digit(u8),
    Backspace,
    SetValue { date: CalendarDate },
    SetRange { range: DateRange },
    ClearValue,
    Blur,
}

impl Event {
    const fn mutates_selection(&self) -> bool {
        matches!(self, Self::ClickCell { .. } | Self::Enter | Self::Digit(_) | Self::Backspace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Applied,
    Ignored(IgnoreReason),
}

impl Outcome {
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum IgnoreReason {
    #[display(fmt = "picker is disabled")]
    Disabled,
    #[display(fmt = "picker is read-only")]
    Readonly,
    #[display(fmt = "no selectable dates beyond the boundary")]
    AtBoundary,
    #[display(fmt = "date is not selectable")]
    NotSelectable,
    #[display(fmt = "segment is not editable")]
    NotEditable,
    #[display(fmt = "event does not apply in this state")]
    WrongState,
    #[display(fmt = "nothing to change")]
    Unchanged,
    #[display(fmt = "input out of range")]
    InvalidInput,
}

/// Sent to value listeners when the selection becomes complete or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange {
    pub value: Selection,
    pub value_as_string: Option<String>,
}

/// Sent to focus listeners when the focused date or the visible month moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub focused: CalendarDate,
    pub visible: VisibleRange,
}

/// Lets a listener queue follow-up events.
#[derive(Debug, Default)]
pub struct Dispatch {
    events: Vec<Event>,
}

impl Dispatch {
    pub fn send(&mut self, event: Event) {
        self.events.push(event);
    }
}

pub struct DatePickerBuilder {
    config: DatePickerConfig,
    clock: Box<dyn Clock>,
    unavailable: Option<UnavailablePredicate>,
    factory: Box<dyn FormatterFactory>,
}

impl DatePickerBuilder {
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn unavailable(mut self, predicate: impl Fn(&CalendarDate) -> bool + 'static) -> Self {
        self.unavailable = Some(Box::new(predicate));
        self
    }

    #[must_use]
    pub fn formatter_factory(mut self, factory: impl FormatterFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// # Errors
    /// Returns a `ConfigError` if the configuration does not validate.
    pub fn build(self) -> Result<DatePickerEngine, ConfigError> {
        let Self {
            config,
            clock,
            unavailable,
            factory,
        } = self;
        config.validate()?;

        let bounds = config.bounds()?;
        let format = config.segment_format()?;
        let navigator = config.navigator();
        let mode = config.selection_mode;

        let today = clock.today(&config.time_zone);
        let value = config.value.map(|date| bounds.clamp(date));
        let focused = GridNavigator::clamp_to_grid(bounds.clamp(config.focused_value.or(value).unwrap_or(today)));

        let mut field = DateField::new(format, focused);
        if let Some(date) = value {
            field.set_date(date);
        }

        debug!(%mode, %focused, min = ?bounds.min(), max = ?bounds.max(), "date picker created");

        Ok(DatePickerEngine {
            state: PickerState::Idle,
            mode,
            selection: value.map_or(Selection::empty(mode), |date| Selection::collapsed(mode, date)),
            focused,
            visible: navigator.visible_range(focused),
            hovered: None,
            field,
            bounds,
            navigator,
            disabled: config.disabled,
            readonly: config.readonly,
            pattern: config.format,
            formatters: FormatterCache::new(factory, config.locale, config.time_zone),
            clock,
            unavailable,
            typing_base: None,
            value_listeners: Vec::new(),
            focus_listeners: Vec::new(),
            queue: VecDeque::new(),
        })
    }
}

pub struct DatePickerEngine {
    state: PickerState,
    mode: SelectionMode,
    selection: Selection,
    focused: CalendarDate,
    visible: VisibleRange,
    hovered: Option<CalendarDate>,
    field: DateField,
    bounds: Bounds,
    navigator: GridNavigator,
    disabled: bool,
    readonly: bool,
    pattern: String,
    formatters: FormatterCache,
    clock: Box<dyn Clock>,
    unavailable: Option<UnavailablePredicate>,
    /// Selection before the digits still being typed were first committed.
    typing_base: Option<Selection>,
    value_listeners: Vec<Listener<ValueChange>>,
    focus_listeners: Vec<Listener<FocusChange>>,
    queue: VecDeque<Event>,
}

#[derive(Clone, Copy)]
struct Snapshot {
    selection: Selection,
    focused: CalendarDate,
    visible: VisibleRange,
}

impl DatePickerEngine {
    /// Engine reading today's date from the system clock.
    ///
    /// # Errors
    /// Returns a `ConfigError` if the configuration does not validate.
    pub fn new(config: DatePickerConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn builder(config: DatePickerConfig) -> DatePickerBuilder {
        DatePickerBuilder {
            config,
            clock: Box::new(SystemClock),
            unavailable: None,
            factory: Box::new(PatternFormatterFactory),
        }
    }

    pub fn on_value_change(&mut self, listener: impl FnMut(&ValueChange, &mut Dispatch) + 'static) {
        self.value_listeners.push(Box::new(listener));
    }

    pub fn on_focus_change(&mut self, listener: impl FnMut(&FocusChange, &mut Dispatch) + 'static) {
        self.focus_listeners.push(Box::new(listener));
    }

    /// Processes `event` and then every event listeners queued in response.
    /// Returns the outcome of `event` itself.
    pub fn send(&mut self, event: Event) -> Outcome {
        self.queue.push_back(event);
        let mut first = None;
        while let Some(next) = self.queue.pop_front() {
            let outcome = self.process(next);
            first.get_or_insert(outcome);
        }
        first.unwrap_or(Outcome::Applied)
    }

    /// Moves the selected value to `month`. Ignored while nothing is selected.
    pub fn set_month(&mut self, month: u8) -> Outcome {
        let Some(base) = self.selection.start() else {
            debug!(month, "set_month ignored, no value");
            return Outcome::Ignored(IgnoreReason::Unchanged);
        };
        match base.with_month(month) {
            Ok(date) => self.send(Event::SetValue { date }),
            Err(err) => {
                debug!(%err, "set_month ignored");
                Outcome::Ignored(IgnoreReason::InvalidInput)
            },
        }
    }

    /// Moves the selected value to `year`. Ignored while nothing is selected.
    pub fn set_year(&mut self, year: u16) -> Outcome {
        let Some(base) = self.selection.start() else {
            debug!(year, "set_year ignored, no value");
            return Outcome::Ignored(IgnoreReason::Unchanged);
        };
        match base.with_year(year) {
            Ok(date) => self.send(Event::SetValue { date }),
            Err(err) => {
                debug!(%err, "set_year ignored");
                Outcome::Ignored(IgnoreReason::InvalidInput)
            },
        }
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.formatters.set_locale(locale);
    }

    pub fn set_time_zone(&mut self, time_zone: TimeZone) {
        self.formatters.set_time_zone(time_zone);
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub const fn state(&self) -> PickerState {
        self.state
    }

    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub const fn value(&self) -> Selection {
        self.selection
    }

    /// The selection as display text: one date, or `start - end` for a range.
    pub fn value_as_string(&self) -> Option<String> {
        let start = self.selection.start()?;
        match self.selection.end() {
            Some(end) if self.mode == SelectionMode::Range => {
                Some(format!("{} - {}", self.format_date(&start), self.format_date(&end)))
            },
            _ => Some(self.format_date(&start)),
        }
    }

    pub const fn focused_value(&self) -> CalendarDate {
        self.focused
    }

    pub fn focused_value_as_string(&self) -> String {
        self.format_date(&self.focused)
    }

    pub const fn visible_range(&self) -> VisibleRange {
        self.visible
    }

    pub fn weeks(&self) -> Vec<Vec<CalendarDate>> {
        self.navigator.weeks(&self.visible)
    }

    /// Column headers in grid order.
    pub fn week_days(&self) -> Vec<String> {
        let days = self.navigator.week_days();
        match self.formatters.get(&self.pattern) {
            Ok(formatter) => days.iter().map(|day| formatter.format_weekday(*day)).collect(),
            Err(_) => days.iter().map(|day| day.short_name().to_owned()).collect(),
        }
    }

    pub fn segments(&self) -> Vec<DateSegment> {
        self.field.segments()
    }

    pub const fn focused_segment(&self) -> Option<SegmentKind> {
        match self.state {
            PickerState::EditingSegment(kind) => Some(kind),
            PickerState::Idle | PickerState::Focused => None,
        }
    }

    /// The typed time, for patterns with time segments.
    pub fn time_value(&self) -> Option<TimeOfDay> {
        self.field.to_time()
    }

    /// Flags for one cell. `disabled` is the view's own per-cell flag.
    pub fn cell_state(&self, date: &CalendarDate, disabled: bool) -> CellState {
        let today = self.today();
        cell::resolve(date, &self.cell_context(today), disabled)
    }

    /// Every grid cell with its flags, resolved in one pass.
    pub fn cells(&self) -> Vec<Vec<Cell>> {
        let today = self.today();
        cell::resolve_grid(&self.weeks(), &self.cell_context(today))
    }

    pub fn is_prev_visible_range_valid(&self) -> bool {
        !self.navigator.is_range_at_boundary(&self.visible, &self.bounds, PageDirection::Prev)
    }

    pub fn is_next_visible_range_valid(&self) -> bool {
        !self.navigator.is_range_at_boundary(&self.visible, &self.bounds, PageDirection::Next)
    }

    /// `true` if a selected date is out of bounds or unavailable.
    pub fn is_value_invalid(&self) -> bool {
        [self.selection.start(), self.selection.end()]
            .into_iter()
            .flatten()
            .any(|date| !self.bounds.contains(&date) || self.is_unavailable(&date))
    }

    pub fn today(&self) -> CalendarDate {
        self.clock.today(self.formatters.time_zone())
    }

    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn locale(&self) -> &str {
        self.formatters.locale()
    }

    pub const fn time_zone(&self) -> &TimeZone {
        self.formatters.time_zone()
    }

    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub const fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn process(&mut self, event: Event) -> Outcome {
        trace!(?event, state = %self.state, "processing event");
        let before = Snapshot {
            selection: self.selection,
            focused: self.focused,
            visible: self.visible,
        };

        let outcome = if self.disabled {
            Outcome::Ignored(IgnoreReason::Disabled)
        } else if self.readonly && event.mutates_selection() {
            Outcome::Ignored(IgnoreReason::Readonly)
        } else {
            self.apply(event)
        };
        if !self.field.is_entering() {
            self.typing_base = None;
        }

        self.selection.check_invariant();
        debug_assert!(self.visible.start() <= self.visible.end());

        match outcome {
            Outcome::Applied => self.notify(before),
            Outcome::Ignored(reason) => debug!(?event, %reason, "event ignored"),
        }
        outcome
    }

    fn apply(&mut self, event: Event) -> Outcome {
        match event {
            Event::FocusCell { date } => {
                self.leave_segment();
                self.transition(PickerState::Focused);
                self.focus(date);
                Outcome::Applied
            },
            Event::ClickCell { date } => self.click_cell(date),
            Event::HoverCell { date } => self.hover(Some(date)),
            Event::HoverLeave => self.hover(None),
            Event::ArrowLeft => self.arrow(Direction::Left),
            Event::ArrowRight => self.arrow(Direction::Right),
            Event::ArrowUp => self.arrow(Direction::Up),
            Event::ArrowDown => self.arrow(Direction::Down),
            Event::Home => self.home_end(FocusDirection::Prev),
            Event::End => self.home_end(FocusDirection::Next),
            Event::PageUp { larger } => self.page(PageDirection::Prev, larger),
            Event::PageDown { larger } => self.page(PageDirection::Next, larger),
            Event::ClickPrev => self.shift_visible(PageDirection::Prev),
            Event::ClickNext => self.shift_visible(PageDirection::Next),
            Event::ClickTrigger => self.toggle(),
            Event::Enter => match self.state {
                PickerState::Focused => self.click_cell(self.focused),
                PickerState::Idle | PickerState::EditingSegment(_) => Outcome::Ignored(IgnoreReason::WrongState),
            },
            Event::FocusSegment { kind } => self.focus_segment(kind),
            Event::Digit(digit) => self.digit(digit),
            Event::Backspace => self.backspace(),
            Event::SetValue { date } => self.set_value(date),
            Event::SetRange { range } => self.set_range(range),
            Event::ClearValue => {
                self.transition(PickerState::Idle);
                self.selection.clear();
                self.field.clear();
                self.hovered = None;
                Outcome::Applied
            },
            Event::Blur => {
                self.leave_segment();
                self.transition(PickerState::Idle);
                self.hovered = None;
                Outcome::Applied
            },
        }
    }

    fn click_cell(&mut self, date: CalendarDate) -> Outcome {
        if !self.cell_state(&date, false).is_selectable {
            return Outcome::Ignored(IgnoreReason::NotSelectable);
        }
        self.transition(PickerState::Focused);
        self.selection = select_date(&self.selection, date, self.mode);
        if self.selection.is_complete() {
            self.hovered = None;
        }
        self.field.set_date(date);
        self.field.set_placeholder(date);
        self.focus(date);
        Outcome::Applied
    }

    fn hover(&mut self, date: Option<CalendarDate>) -> Outcome {
        if self.mode != SelectionMode::Range {
            return Outcome::Ignored(IgnoreReason::WrongState);
        }
        if self.hovered == date {
            return Outcome::Ignored(IgnoreReason::Unchanged);
        }
        self.hovered = date;
        Outcome::Applied
    }

    fn arrow(&mut self, direction: Direction) -> Outcome {
        match self.state {
            PickerState::Focused => {
                self.focus(grid::move_focus(self.focused, direction));
                Outcome::Applied
            },
            PickerState::EditingSegment(kind) => match direction {
                Direction::Left => self.move_segment(kind, FocusDirection::Prev),
                Direction::Right => self.move_segment(kind, FocusDirection::Next),
                Direction::Up => self.step_segment(kind, 1),
                Direction::Down => self.step_segment(kind, -1),
            },
            PickerState::Idle => Outcome::Ignored(IgnoreReason::WrongState),
        }
    }

    fn home_end(&mut self, direction: FocusDirection) -> Outcome {
        match (self.state, direction) {
            (PickerState::Focused, FocusDirection::Prev) => self.focus(self.navigator.week_start(self.focused)),
            (PickerState::Focused, FocusDirection::Next) => self.focus(self.navigator.week_end(self.focused)),
            (PickerState::EditingSegment(_), _) => {
                let target = match direction {
                    FocusDirection::Prev => self.field.first_editable(),
                    FocusDirection::Next => self.field.last_editable(),
                };
                let Some(kind) = target else {
                    return Outcome::Ignored(IgnoreReason::NotEditable);
                };
                self.leave_segment();
                self.transition(PickerState::EditingSegment(kind));
            },
            (PickerState::Idle, _) => return Outcome::Ignored(IgnoreReason::WrongState),
        }
        Outcome::Applied
    }

    fn page(&mut self, direction: PageDirection, larger: bool) -> Outcome {
        if self.state != PickerState::Focused {
            return Outcome::Ignored(IgnoreReason::WrongState);
        }
        let target = grid::page(self.focused, direction, larger);
        let visible = self.navigator.visible_range(target);
        let blocked = !GridNavigator::is_navigable(&target) || self.bounds.excludes(&visible.month());
        if target == self.focused || blocked {
            return Outcome::Ignored(IgnoreReason::AtBoundary);
        }
        debug!(from = %self.visible.month_start(), to = %visible.month_start(), "paging visible range");
        self.focused = target;
        self.visible = visible;
        Outcome::Applied
    }

    fn shift_visible(&mut self, direction: PageDirection) -> Outcome {
        if self.state == PickerState::Idle {
            return Outcome::Ignored(IgnoreReason::WrongState);
        }
        if self.navigator.is_range_at_boundary(&self.visible, &self.bounds, direction) {
            return Outcome::Ignored(IgnoreReason::AtBoundary);
        }
        let month = match direction {
            PageDirection::Prev => self.visible.month_start().add_months(-1),
            PageDirection::Next => self.visible.month_start().add_months(1),
        };
        self.visible = self.navigator.visible_range(month);
        Outcome::Applied
    }

    fn toggle(&mut self) -> Outcome {
        if self.state == PickerState::Idle {
            let target = self
                .selection
                .start()
                .unwrap_or_else(|| self.bounds.clamp(self.today()));
            self.transition(PickerState::Focused);
            self.focus(target);
        } else {
            self.leave_segment();
            self.transition(PickerState::Idle);
            self.hovered = None;
        }
        Outcome::Applied
    }

    fn focus_segment(&mut self, kind: SegmentKind) -> Outcome {
        if !self.field.is_editable(kind) {
            return Outcome::Ignored(IgnoreReason::NotEditable);
        }
        self.leave_segment();
        self.transition(PickerState::EditingSegment(kind));
        Outcome::Applied
    }

    fn move_segment(&mut self, from: SegmentKind, direction: FocusDirection) -> Outcome {
        match self.field.move_focus(from, direction, false) {
            Some(kind) if kind != from => {
                self.leave_segment();
                self.transition(PickerState::EditingSegment(kind));
                Outcome::Applied
            },
            _ => Outcome::Ignored(IgnoreReason::AtBoundary),
        }
    }

    fn step_segment(&mut self, kind: SegmentKind, delta: i32) -> Outcome {
        if self.readonly {
            return Outcome::Ignored(IgnoreReason::Readonly);
        }
        if !self.field.step(kind, delta) {
            return Outcome::Ignored(IgnoreReason::NotEditable);
        }
        self.commit_field();
        Outcome::Applied
    }

    fn digit(&mut self, digit: u8) -> Outcome {
        let PickerState::EditingSegment(kind) = self.state else {
            return Outcome::Ignored(IgnoreReason::WrongState);
        };
        if digit > 9 {
            return Outcome::Ignored(IgnoreReason::InvalidInput);
        }
        match self.field.apply_digit(kind, digit) {
            DigitOutcome::Ignored => return Outcome::Ignored(IgnoreReason::NotEditable),
            DigitOutcome::Pending => {},
            DigitOutcome::Advance => {
                if let Some(next) = self.field.move_focus(kind, FocusDirection::Next, false) {
                    self.transition(PickerState::EditingSegment(next));
                }
            },
        }
        self.commit_field();
        Outcome::Applied
    }

    fn backspace(&mut self) -> Outcome {
        let PickerState::EditingSegment(kind) = self.state else {
            return Outcome::Ignored(IgnoreReason::WrongState);
        };
        if !self.field.backspace(kind) {
            return Outcome::Ignored(IgnoreReason::Unchanged);
        }
        self.commit_field();
        Outcome::Applied
    }

    fn leave_segment(&mut self) {
        if self.field.is_entering() {
            self.field.end_entry();
            self.commit_field();
        }
    }

    /// Pushes a complete typed date into the selection.
    ///
    /// While a segment still buffers digits the commit is provisional: the
    /// next digit replaces it instead of selecting a second date. An out of
    /// bounds date is only clamped once the buffer is done, since more digits
    /// may still bring it into range.
    fn commit_field(&mut self) {
        let entering = self.field.is_entering();
        let Some(typed) = self.field.to_date() else {
            return;
        };
        let date = self.bounds.clamp(typed);
        if date != typed {
            if entering {
                return;
            }
            debug!(%typed, %date, "typed date clamped to bounds");
            self.field.set_date(date);
        }

        let base = self.typing_base.unwrap_or(self.selection);
        let already_selected = match self.mode {
            SelectionMode::Single => base.start() == Some(date),
            SelectionMode::Range => base.pending_start() == Some(date) || base.end() == Some(date),
        };
        self.selection = if already_selected {
            base
        } else {
            select_date(&base, date, self.mode)
        };
        self.typing_base = entering.then_some(base);
        self.focus(date);
    }

    fn set_value(&mut self, date: CalendarDate) -> Outcome {
        let date = self.bounds.clamp(date);
        self.transition(PickerState::Focused);
        self.selection = Selection::collapsed(self.mode, date);
        self.field.set_date(date);
        self.fill_time();
        self.field.set_placeholder(date);
        self.hovered = None;
        self.focused = GridNavigator::clamp_to_grid(date);
        self.visible = self.navigator.visible_range(date);
        Outcome::Applied
    }

    fn set_range(&mut self, range: DateRange) -> Outcome {
        if self.mode != SelectionMode::Range {
            return Outcome::Ignored(IgnoreReason::WrongState);
        }
        let start = self.bounds.clamp(range.start());
        let end = self.bounds.clamp(range.end());
        self.transition(PickerState::Focused);
        self.selection = Selection::from_range(DateRange::ordered(start, end));
        self.field.set_date(end);
        self.fill_time();
        self.field.set_placeholder(end);
        self.hovered = None;
        self.focused = GridNavigator::clamp_to_grid(start);
        self.visible = self.navigator.visible_range(start);
        Outcome::Applied
    }

    /// Keeps a typed time across programmatic date changes, midnight if none.
    fn fill_time(&mut self) {
        if self.field.format().contains(SegmentKind::Hour) {
            let time = self.field.to_time().unwrap_or(TimeOfDay::MIDNIGHT);
            self.field.set_time(time);
        }
    }

    fn focus(&mut self, date: CalendarDate) {
        let date = GridNavigator::clamp_to_grid(date);
        self.focused = date;
        self.visible = self.navigator.repage(date, &self.visible);
    }

    fn transition(&mut self, next: PickerState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }

    fn notify(&mut self, before: Snapshot) {
        let mut dispatch = Dispatch::default();

        let selection_settled = self.selection.is_complete() || self.selection.is_empty();
        if self.selection != before.selection && selection_settled {
            let change = ValueChange {
                value: self.selection,
                value_as_string: self.value_as_string(),
            };
            for listener in &mut self.value_listeners {
                listener(&change, &mut dispatch);
            }
        }

        if self.focused != before.focused || self.visible != before.visible {
            let change = FocusChange {
                focused: self.focused,
                visible: self.visible,
            };
            for listener in &mut self.focus_listeners {
                listener(&change, &mut dispatch);
            }
        }

        if !dispatch.events.is_empty() {
            trace!(count = dispatch.events.len(), "queueing listener events");
            self.queue.extend(dispatch.events);
        }
    }

    fn cell_context(&self, today: CalendarDate) -> CellContext<'_> {
        CellContext {
            selection: &self.selection,
            bounds: &self.bounds,
            visible: &self.visible,
            focused: Some(self.focused),
            today,
            hovered: self.hovered,
            is_unavailable: self.unavailable.as_deref(),
        }
    }

    fn is_unavailable(&self, date: &CalendarDate) -> bool {
        self.unavailable.as_ref().is_some_and(|predicate| predicate(date))
    }

    fn format_date(&self, date: &CalendarDate) -> String {
        match self.formatters.get(&self.pattern) {
            Ok(formatter) => formatter.format_date(date),
            Err(err) => {
                debug!(%err, "formatter unavailable, using ISO format");
                date.to_string()
            },
        }
    }
}

impl std::fmt::Debug for DatePickerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatePickerEngine")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("selection", &self.selection)
            .field("focused", &self.focused)
            .field("visible", &self.visible)
            .field("bounds", &self.bounds)
            .field("disabled", &self.disabled)
            .field("readonly", &self.readonly)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::FixedClock;
    use crate::segment::AdvanceRule;
    use crate::test_utils::{date, range};
    use crate::types::Weekday;

    fn engine(config: DatePickerConfig) -> DatePickerEngine {
        DatePickerEngine::builder(config)
            .clock(FixedClock(date(2024, 3, 14)))
            .build()
            .unwrap()
    }

    fn focused_engine(config: DatePickerConfig, at: CalendarDate) -> DatePickerEngine {
        let mut engine = engine(config);
        engine.send(Event::FocusCell { date: at });
        engine
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(DatePickerConfig::default());
        assert_eq!(engine.state(), PickerState::Idle);
        assert_eq!(engine.focused_value(), date(2024, 3, 14));
        assert_eq!(engine.visible_range().month_start(), date(2024, 3, 1));
        assert!(engine.value().is_empty());
        assert_eq!(engine.value_as_string(), None);
        assert_eq!(engine.week_days(), ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
    }

    #[test]
    fn test_initial_value_is_clamped() {
        let engine = engine(DatePickerConfig {
            min: Some(date(2024, 5, 1)),
            value: Some(date(2024, 4, 20)),
            ..DatePickerConfig::default()
        });
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 5, 1))));
        assert_eq!(engine.focused_value(), date(2024, 5, 1));
        assert_eq!(engine.value_as_string().as_deref(), Some("05/01/2024"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let err = DatePickerEngine::new(DatePickerConfig {
            min: Some(date(2024, 2, 1)),
            max: Some(date(2024, 1, 1)),
            ..DatePickerConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvertedBounds { .. }));
    }

    #[test]
    fn test_navigation_requires_focus() {
        let mut engine = engine(DatePickerConfig::default());
        assert_eq!(engine.send(Event::ArrowRight), Outcome::Ignored(IgnoreReason::WrongState));
        assert_eq!(engine.send(Event::ClickTrigger), Outcome::Applied);
        assert_eq!(engine.state(), PickerState::Focused);
        assert_eq!(engine.send(Event::ArrowRight), Outcome::Applied);
        assert_eq!(engine.focused_value(), date(2024, 3, 15));
        assert_eq!(engine.send(Event::ClickTrigger), Outcome::Applied);
        assert_eq!(engine.state(), PickerState::Idle);
    }

    #[test]
    fn test_arrow_keys() {
        struct TestCase {
            event:    Event,
            expected: CalendarDate,
        }

        let cases = [
            TestCase { event: Event::ArrowLeft, expected: date(2024, 3, 13) },
            TestCase { event: Event::ArrowRight, expected: date(2024, 3, 15) },
            TestCase { event: Event::ArrowUp, expected: date(2024, 3, 7) },
            TestCase { event: Event::ArrowDown, expected: date(2024, 3, 21) },
            TestCase { event: Event::Home, expected: date(2024, 3, 10) },
            TestCase { event: Event::End, expected: date(2024, 3, 16) },
            TestCase { event: Event::PageUp { larger: false }, expected: date(2024, 2, 14) },
            TestCase { event: Event::PageDown { larger: true }, expected: date(2025, 3, 14) },
        ];

        for case in &cases {
            let mut engine = focused_engine(DatePickerConfig::default(), date(2024, 3, 14));
            assert_eq!(engine.send(case.event), Outcome::Applied, "{:?}", case.event);
            assert_eq!(engine.focused_value(), case.expected, "{:?}", case.event);
            assert!(engine.visible_range().contains(&case.expected), "{:?}", case.event);
        }
    }

    #[test]
    fn test_click_prev_next_keep_focus() {
        let mut engine = focused_engine(DatePickerConfig::default(), date(2024, 3, 14));
        assert_eq!(engine.send(Event::ClickNext), Outcome::Applied);
        assert_eq!(engine.visible_range().month_start(), date(2024, 4, 1));
        assert_eq!(engine.focused_value(), date(2024, 3, 14));
        engine.send(Event::ClickPrev);
        engine.send(Event::ClickPrev);
        assert_eq!(engine.visible_range().month_start(), date(2024, 2, 1));
    }

    #[test]
    fn test_paging_stops_at_bounds() {
        let mut engine = focused_engine(
            DatePickerConfig {
                max: Some(date(2024, 4, 10)),
                ..DatePickerConfig::default()
            },
            date(2024, 3, 31),
        );
        assert_eq!(engine.send(Event::PageDown { larger: false }), Outcome::Applied);
        assert_eq!(engine.focused_value(), date(2024, 4, 30));
        assert!(!engine.is_next_visible_range_valid());
        assert_eq!(engine.send(Event::PageDown { larger: false }), Outcome::Ignored(IgnoreReason::AtBoundary));
        assert_eq!(engine.send(Event::ClickNext), Outcome::Ignored(IgnoreReason::AtBoundary));
        assert_eq!(engine.visible_range().month_start(), date(2024, 4, 1));
    }

    #[test]
    fn test_click_unavailable_is_ignored() {
        let mut engine = DatePickerEngine::builder(DatePickerConfig::default())
            .clock(FixedClock(date(2024, 3, 14)))
            .unavailable(|d: &CalendarDate| d.day() == 13)
            .build()
            .unwrap();
        engine.send(Event::ClickTrigger);
        assert_eq!(
            engine.send(Event::ClickCell { date: date(2024, 3, 13) }),
            Outcome::Ignored(IgnoreReason::NotSelectable)
        );
        assert!(engine.value().is_empty());
        assert!(engine.cell_state(&date(2024, 3, 13), false).is_unavailable);
    }

    #[test]
    fn test_enter_selects_focused_date() {
        let mut engine = focused_engine(DatePickerConfig::default(), date(2024, 3, 20));
        assert_eq!(engine.send(Event::Enter), Outcome::Applied);
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 20))));
        assert_eq!(engine.value_as_string().as_deref(), Some("03/20/2024"));
        assert!(engine.cell_state(&date(2024, 3, 20), false).is_selected);
        assert!(engine.cell_state(&date(2024, 3, 20), false).is_focused);
    }

    #[test]
    fn test_disabled_engine_is_inert() {
        let mut engine = engine(DatePickerConfig {
            disabled: true,
            ..DatePickerConfig::default()
        });
        for event in [
            Event::ClickTrigger,
            Event::SetValue { date: date(2024, 1, 1) },
            Event::FocusCell { date: date(2024, 1, 1) },
        ] {
            assert_eq!(engine.send(event), Outcome::Ignored(IgnoreReason::Disabled));
        }
        assert_eq!(engine.state(), PickerState::Idle);
        assert!(engine.value().is_empty());
    }

    #[test]
    fn test_readonly_allows_navigation_only() {
        let mut engine = focused_engine(
            DatePickerConfig {
                readonly: true,
                ..DatePickerConfig::default()
            },
            date(2024, 3, 14),
        );
        assert_eq!(engine.send(Event::ArrowRight), Outcome::Applied);
        assert_eq!(
            engine.send(Event::ClickCell { date: date(2024, 3, 15) }),
            Outcome::Ignored(IgnoreReason::Readonly)
        );
        engine.send(Event::FocusSegment { kind: SegmentKind::Month });
        assert_eq!(engine.send(Event::Digit(4)), Outcome::Ignored(IgnoreReason::Readonly));
        assert_eq!(engine.send(Event::ArrowUp), Outcome::Ignored(IgnoreReason::Readonly));
        assert!(engine.value().is_empty());
    }

    #[test]
    fn test_typing_a_date_commits_it() {
        let mut engine = engine(DatePickerConfig::default());
        engine.send(Event::FocusSegment { kind: SegmentKind::Month });
        for digit in [0, 3, 1, 5, 2, 0, 2, 4] {
            assert_eq!(engine.send(Event::Digit(digit)), Outcome::Applied);
        }
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 15))));
        assert_eq!(engine.focused_value(), date(2024, 3, 15));
        assert_eq!(engine.focused_segment(), Some(SegmentKind::Year));
    }

    #[test]
    fn test_typed_date_is_clamped_to_bounds() {
        let mut engine = engine(DatePickerConfig {
            format: "YYYY-MM-DD".to_owned(),
            max: Some(date(2024, 6, 30)),
            ..DatePickerConfig::default()
        });
        engine.send(Event::FocusSegment { kind: SegmentKind::Year });
        for digit in [2, 0, 2, 4, 1, 2, 2, 5] {
            engine.send(Event::Digit(digit));
        }
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 6, 30))));
        let text: String = engine.segments().into_iter().map(|s| s.text).collect();
        assert_eq!(text, "2024-06-30");
    }

    #[test]
    fn test_segment_arrows() {
        let mut engine = engine(DatePickerConfig {
            value: Some(date(2024, 3, 14)),
            ..DatePickerConfig::default()
        });
        engine.send(Event::FocusSegment { kind: SegmentKind::Day });
        assert_eq!(engine.send(Event::ArrowUp), Outcome::Applied);
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 15))));
        assert_eq!(engine.send(Event::ArrowRight), Outcome::Applied);
        assert_eq!(engine.focused_segment(), Some(SegmentKind::Year));
        assert_eq!(engine.send(Event::ArrowRight), Outcome::Ignored(IgnoreReason::AtBoundary));
        assert_eq!(engine.send(Event::Home), Outcome::Applied);
        assert_eq!(engine.focused_segment(), Some(SegmentKind::Month));
        assert_eq!(
            engine.send(Event::FocusSegment { kind: SegmentKind::Era }),
            Outcome::Ignored(IgnoreReason::NotEditable)
        );
    }

    #[test]
    fn test_backspace_keeps_last_complete_value() {
        let mut engine = engine(DatePickerConfig {
            value: Some(date(2024, 3, 14)),
            ..DatePickerConfig::default()
        });
        engine.send(Event::FocusSegment { kind: SegmentKind::Month });
        assert_eq!(engine.send(Event::Backspace), Outcome::Applied);
        assert!(engine.segments()[0].is_placeholder);
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 14))));
        assert_eq!(engine.send(Event::Backspace), Outcome::Ignored(IgnoreReason::Unchanged));
    }

    #[test]
    fn test_set_value_and_clear() {
        let mut engine = engine(DatePickerConfig::default());
        engine.send(Event::SetValue { date: date(2023, 11, 5) });
        assert_eq!(engine.state(), PickerState::Focused);
        assert_eq!(engine.visible_range().month_start(), date(2023, 11, 1));
        assert!(engine.segments().iter().all(|s| !s.is_placeholder));

        engine.send(Event::ClearValue);
        assert_eq!(engine.state(), PickerState::Idle);
        assert!(engine.value().is_empty());
        assert!(engine.segments().iter().filter(|s| s.is_editable).all(|s| s.is_placeholder));
    }

    #[test]
    fn test_set_month_and_year() {
        let mut engine = engine(DatePickerConfig {
            value: Some(date(2024, 1, 31)),
            ..DatePickerConfig::default()
        });
        assert_eq!(engine.set_month(2), Outcome::Applied);
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 2, 29))));
        assert_eq!(engine.set_year(2023), Outcome::Applied);
        assert_eq!(engine.value(), Selection::Single(Some(date(2023, 2, 28))));
        assert_eq!(engine.set_month(13), Outcome::Ignored(IgnoreReason::InvalidInput));
    }

    #[test]
    fn test_set_month_and_year_need_a_value() {
        let mut engine = engine(DatePickerConfig::default());
        assert_eq!(engine.set_month(5), Outcome::Ignored(IgnoreReason::Unchanged));
        assert_eq!(engine.set_year(2020), Outcome::Ignored(IgnoreReason::Unchanged));
        assert!(engine.value().is_empty());
        assert_eq!(engine.focused_value(), date(2024, 3, 14));
    }

    #[test]
    fn test_typed_date_commits_while_last_segment_buffers() {
        let mut engine = engine(DatePickerConfig {
            format: "YYYY-MM-DD".to_owned(),
            ..DatePickerConfig::default()
        });
        engine.send(Event::FocusSegment { kind: SegmentKind::Year });
        for digit in [2, 0, 2, 4, 0, 3, 1] {
            engine.send(Event::Digit(digit));
        }
        let text: String = engine.segments().into_iter().map(|s| s.text).collect();
        assert_eq!(text, "2024-03-1");
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 1))));
        assert_eq!(engine.focused_value(), date(2024, 3, 1));

        // Leaving the field through the grid ends the entry where it stands.
        assert_eq!(engine.send(Event::FocusCell { date: date(2024, 3, 20) }), Outcome::Applied);
        assert_eq!(engine.state(), PickerState::Focused);
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 1))));
        assert_eq!(engine.focused_value(), date(2024, 3, 20));

        engine.send(Event::Blur);
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 1))));
        assert_eq!(engine.focused_value(), date(2024, 3, 20));
    }

    #[test]
    fn test_refined_digits_replace_provisional_range_start() {
        let mut engine = engine(DatePickerConfig {
            selection_mode: SelectionMode::Range,
            format: "YYYY-MM-DD".to_owned(),
            ..DatePickerConfig::default()
        });
        engine.send(Event::FocusSegment { kind: SegmentKind::Year });
        for digit in [2, 0, 2, 4, 0, 3, 1] {
            engine.send(Event::Digit(digit));
        }
        assert_eq!(engine.value().pending_start(), Some(date(2024, 3, 1)));

        engine.send(Event::Digit(5));
        assert_eq!(
            engine.value(),
            Selection::Range {
                start: Some(date(2024, 3, 15)),
                end:   None,
            }
        );
    }

    #[test]
    fn test_focused_cell_reported_in_every_state() {
        let mut engine = engine(DatePickerConfig::default());
        assert_eq!(engine.state(), PickerState::Idle);
        assert!(engine.cell_state(&date(2024, 3, 14), false).is_focused);
        let focused: Vec<_> = engine.cells().into_iter().flatten().filter(|cell| cell.state.is_focused).collect();
        assert_eq!(focused.len(), 1);
        assert_eq!(focused[0].date, date(2024, 3, 14));

        engine.send(Event::FocusSegment { kind: SegmentKind::Day });
        assert!(engine.cell_state(&date(2024, 3, 14), false).is_focused);
    }

    #[test]
    fn test_advance_rule_from_config() {
        let mut engine = engine(DatePickerConfig {
            advance_rules: vec![(SegmentKind::Month, AdvanceRule::Digits(2))],
            ..DatePickerConfig::default()
        });
        engine.send(Event::FocusSegment { kind: SegmentKind::Month });
        engine.send(Event::Digit(4));
        assert_eq!(engine.state(), PickerState::EditingSegment(SegmentKind::Month));
        assert_eq!(engine.segments()[0].value, Some(4));

        // "41" overflows, so the 1 starts over and the segment is done.
        engine.send(Event::Digit(1));
        assert_eq!(engine.state(), PickerState::EditingSegment(SegmentKind::Day));
        assert_eq!(engine.segments()[0].value, Some(1));
    }

    #[test]
    fn test_grid_at_representable_limits() {
        let mut engine = engine(DatePickerConfig::default());
        engine.send(Event::SetValue { date: CalendarDate::MIN });
        assert_eq!(engine.value(), Selection::Single(Some(CalendarDate::MIN)));
        assert_eq!(engine.focused_value(), date(1, 2, 1));
        assert_eq!(engine.visible_range().month_start(), date(1, 2, 1));
        assert_eq!(engine.visible_range().start().weekday(), Weekday::Sunday);
        assert!(engine.weeks().iter().all(|week| week.len() == 7));
        assert!(!engine.is_prev_visible_range_valid());
        assert_eq!(engine.send(Event::PageUp { larger: false }), Outcome::Ignored(IgnoreReason::AtBoundary));
        engine.send(Event::ArrowLeft);
        assert_eq!(engine.focused_value(), date(1, 2, 1));

        engine.send(Event::SetValue { date: CalendarDate::MAX });
        assert_eq!(engine.visible_range().month_start(), date(9999, 11, 1));
        assert!(engine.weeks().iter().all(|week| week.len() == 7));
        assert!(!engine.is_next_visible_range_valid());
        assert_eq!(engine.send(Event::PageDown { larger: true }), Outcome::Ignored(IgnoreReason::AtBoundary));
    }

    #[test]
    fn test_set_value_fills_time_segments() {
        let mut engine = engine(DatePickerConfig {
            format: "MM/DD/YYYY HH:mm".to_owned(),
            ..DatePickerConfig::default()
        });
        engine.send(Event::SetValue { date: date(2024, 7, 4) });
        assert!(engine.segments().iter().all(|s| !s.is_placeholder));
        assert_eq!(engine.time_value(), Some(TimeOfDay::MIDNIGHT));

        engine.send(Event::FocusSegment { kind: SegmentKind::Hour });
        engine.send(Event::Digit(9));
        engine.send(Event::SetValue { date: date(2024, 7, 5) });
        assert_eq!(engine.time_value().map(|time| time.to_string()).as_deref(), Some("09:00"));
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 7, 5))));
    }

    #[test]
    fn test_range_hover_preview() {
        let mut engine = focused_engine(
            DatePickerConfig {
                selection_mode: SelectionMode::Range,
                ..DatePickerConfig::default()
            },
            date(2024, 3, 10),
        );
        engine.send(Event::ClickCell { date: date(2024, 3, 10) });
        engine.send(Event::HoverCell { date: date(2024, 3, 13) });
        assert!(engine.cell_state(&date(2024, 3, 12), false).is_in_preview);

        engine.send(Event::ClickCell { date: date(2024, 3, 13) });
        assert_eq!(engine.value(), Selection::from_range(range((2024, 3, 10), (2024, 3, 13))));
        assert_eq!(engine.value_as_string().as_deref(), Some("03/10/2024 - 03/13/2024"));
        assert!(!engine.cell_state(&date(2024, 3, 12), false).is_in_preview);
    }

    #[test]
    fn test_set_range() {
        let mut engine = engine(DatePickerConfig {
            selection_mode: SelectionMode::Range,
            min: Some(date(2024, 3, 5)),
            ..DatePickerConfig::default()
        });
        engine.send(Event::SetRange {
            range: range((2024, 3, 1), (2024, 3, 9)),
        });
        assert_eq!(engine.value(), Selection::from_range(range((2024, 3, 5), (2024, 3, 9))));

        let mut single = engine_with_default();
        assert_eq!(
            single.send(Event::SetRange {
                range: range((2024, 3, 1), (2024, 3, 9)),
            }),
            Outcome::Ignored(IgnoreReason::WrongState)
        );
    }

    fn engine_with_default() -> DatePickerEngine {
        engine(DatePickerConfig::default())
    }

    #[test]
    fn test_listener_events_run_after_current_event() {
        let mut engine = engine_with_default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        engine.on_value_change(move |change, dispatch| {
            log.borrow_mut().push(change.value);
            if change.value == Selection::Single(Some(date(2024, 3, 20))) {
                dispatch.send(Event::SetValue { date: date(2024, 3, 21) });
            }
        });

        engine.send(Event::SetValue { date: date(2024, 3, 20) });
        assert_eq!(engine.value(), Selection::Single(Some(date(2024, 3, 21))));
        assert_eq!(
            *seen.borrow(),
            [Selection::Single(Some(date(2024, 3, 20))), Selection::Single(Some(date(2024, 3, 21)))]
        );
    }

    #[test]
    fn test_focus_listener() {
        let mut engine = focused_engine(DatePickerConfig::default(), date(2024, 3, 31));
        let months = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&months);
        engine.on_focus_change(move |change, _| log.borrow_mut().push(change.visible.month_start()));

        engine.send(Event::ArrowRight);
        engine.send(Event::ArrowRight);
        assert_eq!(*months.borrow(), [date(2024, 4, 1), date(2024, 4, 1)]);
    }

    #[test]
    fn test_locale_change_keeps_output_for_pattern_formatter() {
        let mut engine = engine(DatePickerConfig {
            value: Some(date(2024, 3, 14)),
            ..DatePickerConfig::default()
        });
        let before = engine.value_as_string();
        engine.set_locale("de-DE");
        engine.set_time_zone(TimeZone::new("+01:00"));
        assert_eq!(engine.value_as_string(), before);
        assert_eq!(engine.locale(), "de-DE");
        assert_eq!(engine.time_zone().id(), "+01:00");
    }

    #[test]
    fn test_value_invalid_when_unavailable() {
        let engine = DatePickerEngine::builder(DatePickerConfig {
            value: Some(date(2024, 3, 16)),
            ..DatePickerConfig::default()
        })
        .clock(FixedClock(date(2024, 3, 14)))
        .unavailable(|d: &CalendarDate| d.weekday() == crate::Weekday::Saturday)
        .build()
        .unwrap();
        assert!(engine.is_value_invalid());
    }
}
