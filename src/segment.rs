//! Segmented text entry for a date (and optionally a time).
//!
//! A [`SegmentFormat`] is parsed once from a pattern such as `MM/DD/YYYY` or
//! `DD.MM.YYYY HH:mm`. A [`DateField`] holds the values typed so far together
//! with the [`ValidSegments`] set, and renders a `Vec<DateSegment>` for the view.
//!
//! Pattern tokens:
//!
//! | token  | segment                  |
//! |--------|--------------------------|
//! | `YYYY` | year                     |
//! | `MM`   | month                    |
//! | `DD`   | day                      |
//! | `G`    | era (fixed, not editable)|
//! | `HH`   | hour, 0-23               |
//! | `hh`   | hour, 1-12               |
//! | `mm`   | minute                   |
//! | `a`    | day period (AM/PM)       |
//!
//! Any other non-letter character is a literal.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::{DAYS_IN_MONTH, FEBRUARY, FEBRUARY_DAYS_LEAP, HOURS_PER_HALF_DAY, MAX_DAY, MAX_HOUR, MAX_MINUTE, MAX_MONTH, MAX_YEAR, MIN_DAY, MIN_YEAR};
use crate::prelude::*;
use crate::types::{DayPeriod, Era, TimeOfDay, days_in_month};
use crate::CalendarDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    #[display(fmt = "day")]
    Day,
    #[display(fmt = "month")]
    Month,
    #[display(fmt = "year")]
    Year,
    #[display(fmt = "era")]
    Era,
    #[display(fmt = "dayPeriod")]
    DayPeriod,
    #[display(fmt = "hour")]
    Hour,
    #[display(fmt = "minute")]
    Minute,
    #[display(fmt = "literal")]
    Literal,
}

impl SegmentKind {
    /// Segments that take digit input.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Day | Self::Month | Self::Year | Self::Hour | Self::Minute)
    }

    /// Segments a complete value can do without.
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::Era | Self::DayPeriod | Self::Literal)
    }

    pub const fn flag(self) -> ValidSegments {
        match self {
            Self::Day => ValidSegments::DAY,
            Self::Month => ValidSegments::MONTH,
            Self::Year => ValidSegments::YEAR,
            Self::Era => ValidSegments::ERA,
            Self::DayPeriod => ValidSegments::DAY_PERIOD,
            Self::Hour => ValidSegments::HOUR,
            Self::Minute => ValidSegments::MINUTE,
            Self::Literal => ValidSegments::empty(),
        }
    }

    const fn placeholder(self) -> &'static str {
        match self {
            Self::Day => "dd",
            Self::Month => "mm",
            Self::Year => "yyyy",
            Self::Hour | Self::Minute => "--",
            Self::DayPeriod => "AM",
            Self::Era | Self::Literal => "",
        }
    }
}

bitflags! {
    /// Segment kinds that received input since the field was last reset.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ValidSegments: u8 {
        const DAY        = 0b0000_0001;
        const MONTH      = 0b0000_0010;
        const YEAR       = 0b0000_0100;
        const ERA        = 0b0000_1000;
        const DAY_PERIOD = 0b0001_0000;
        const HOUR       = 0b0010_0000;
        const MINUTE     = 0b0100_0000;

        const DATE = Self::DAY.bits() | Self::MONTH.bits() | Self::YEAR.bits();
    }
}

impl ValidSegments {
    pub const fn has(self, kind: SegmentKind) -> bool {
        !kind.flag().is_empty() && self.contains(kind.flag())
    }
}

/// When a digit buffer counts as finished and focus moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceRule {
    /// Advance once another digit could only overflow the maximum, or the buffer
    /// holds as many digits as the maximum has.
    #[default]
    Auto,
    /// Advance exactly when the buffer holds this many digits.
    Digits(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HourCycle {
    #[default]
    H23,
    H12,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    Field { kind: SegmentKind, rule: AdvanceRule },
    Literal(String),
}

/// Error returned when a segment pattern cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Empty segment pattern")]
    Empty,

    #[error("Unknown pattern token '{token}' at position {position}")]
    UnknownToken { token: String, position: usize },

    #[error("Segment '{0}' appears more than once")]
    Duplicate(SegmentKind),

    #[error("Pattern is missing the '{0}' segment")]
    Missing(SegmentKind),
}

/// A parsed segment pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentFormat {
    tokens: Vec<Token>,
    hour_cycle: HourCycle,
}

impl SegmentFormat {
    /// Parses a pattern like `MM/DD/YYYY`.
    ///
    /// # Errors
    /// Returns a `FormatError` for unknown letters, repeated segments, or a
    /// pattern without day, month and year.
    pub fn parse(pattern: &str) -> Result<Self, FormatError> {
        if pattern.trim().is_empty() {
            return Err(FormatError::Empty);
        }

        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut hour_cycle = HourCycle::default();
        let mut seen = ValidSegments::empty();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let run = chars[i..].iter().take_while(|&&other| other == c).count();

            if !c.is_ascii_alphabetic() {
                match tokens.last_mut() {
                    Some(Token::Literal(text)) => text.push(c),
                    _ => tokens.push(Token::Literal(c.to_string())),
                }
                i += 1;
                continue;
            }

            let kind = match (c, run) {
                ('Y' | 'y', 4) => SegmentKind::Year,
                ('M', 1 | 2) => SegmentKind::Month,
                ('D' | 'd', 1 | 2) => SegmentKind::Day,
                ('G', 1) => SegmentKind::Era,
                ('H', 1 | 2) => SegmentKind::Hour,
                ('h', 1 | 2) => {
                    hour_cycle = HourCycle::H12;
                    SegmentKind::Hour
                },
                ('m', 1 | 2) => SegmentKind::Minute,
                ('a', 1) => SegmentKind::DayPeriod,
                _ => {
                    return Err(FormatError::UnknownToken {
                        token:    chars[i..i + run].iter().collect(),
                        position: i,
                    });
                },
            };

            if seen.contains(kind.flag()) {
                return Err(FormatError::Duplicate(kind));
            }
            seen |= kind.flag();
            tokens.push(Token::Field {
                kind,
                rule: AdvanceRule::default(),
            });
            i += run;
        }

        for kind in [SegmentKind::Day, SegmentKind::Month, SegmentKind::Year] {
            if !seen.has(kind) {
                return Err(FormatError::Missing(kind));
            }
        }

        Ok(Self { tokens, hour_cycle })
    }

    /// Overrides the advance rule of one segment.
    #[must_use]
    pub fn with_rule(mut self, kind: SegmentKind, rule: AdvanceRule) -> Self {
        for token in &mut self.tokens {
            if let Token::Field { kind: k, rule: r } = token
                && *k == kind
            {
                *r = rule;
            }
        }
        self
    }

    pub const fn hour_cycle(&self) -> HourCycle {
        self.hour_cycle
    }

    pub fn contains(&self, kind: SegmentKind) -> bool {
        self.kinds().any(|k| k == kind)
    }

    /// Field kinds in display order.
    pub fn kinds(&self) -> impl Iterator<Item = SegmentKind> + '_ {
        self.tokens.iter().filter_map(|token| match token {
            Token::Field { kind, .. } => Some(*kind),
            Token::Literal(_) => None,
        })
    }

    /// Kinds that must be filled before the field yields a value.
    pub fn required(&self) -> ValidSegments {
        self.kinds()
            .filter(|kind| !kind.is_optional())
            .fold(ValidSegments::empty(), |acc, kind| acc | kind.flag())
    }

    /// The pattern up to its last date segment, dropping trailing time fields.
    #[must_use]
    pub fn date_only(&self) -> Self {
        let last_date = self.tokens.iter().rposition(|token| {
            matches!(
                token,
                Token::Field {
                    kind: SegmentKind::Day | SegmentKind::Month | SegmentKind::Year | SegmentKind::Era,
                    ..
                }
            )
        });
        let tokens = last_date.map_or_else(Vec::new, |end| {
            self.tokens[..=end]
                .iter()
                .filter(|token| {
                    !matches!(
                        token,
                        Token::Field {
                            kind: SegmentKind::Hour | SegmentKind::Minute | SegmentKind::DayPeriod,
                            ..
                        }
                    )
                })
                .cloned()
                .collect()
        });
        Self {
            tokens,
            hour_cycle: self.hour_cycle,
        }
    }

    fn rule(&self, kind: SegmentKind) -> AdvanceRule {
        self.tokens
            .iter()
            .find_map(|token| match token {
                Token::Field { kind: k, rule } if *k == kind => Some(*rule),
                _ => None,
            })
            .unwrap_or_default()
    }

    const fn is_editable(kind: SegmentKind) -> bool {
        !matches!(kind, SegmentKind::Era | SegmentKind::Literal)
    }

    fn editable_kinds(&self) -> Vec<SegmentKind> {
        self.kinds().filter(|kind| Self::is_editable(*kind)).collect()
    }
}

/// One rendered segment of the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSegment {
    pub kind: SegmentKind,
    pub value: Option<u32>,
    pub text: String,
    pub min: u32,
    pub max: u32,
    pub is_placeholder: bool,
    pub is_editable: bool,
}

/// Result of feeding one digit to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitOutcome {
    /// The segment does not take digits; nothing changed.
    Ignored,
    /// Digit stored; more digits may follow.
    Pending,
    /// Digit stored and the segment is unambiguous; focus should advance.
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusDirection {
    Next,
    Prev,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    kind: SegmentKind,
    digits: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Values {
    year: Option<u16>,
    month: Option<u8>,
    day: Option<u8>,
    hour: Option<u8>,
    minute: Option<u8>,
    period: DayPeriod,
}

/// The in-progress segmented value of a date field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateField {
    format: SegmentFormat,
    values: Values,
    valid: ValidSegments,
    entry: Option<Entry>,
    placeholder: CalendarDate,
}

impl DateField {
    /// An empty field. `placeholder` seeds arrow-key stepping on blank segments.
    pub fn new(format: SegmentFormat, placeholder: CalendarDate) -> Self {
        Self {
            format,
            values: Values::default(),
            valid: ValidSegments::empty(),
            entry: None,
            placeholder,
        }
    }

    pub const fn format(&self) -> &SegmentFormat {
        &self.format
    }

    pub const fn valid(&self) -> ValidSegments {
        self.valid
    }

    pub fn set_placeholder(&mut self, placeholder: CalendarDate) {
        self.placeholder = placeholder;
    }

    /// Fills every date segment from `date` and marks them valid.
    pub fn set_date(&mut self, date: CalendarDate) {
        self.values.year = Some(date.year());
        self.values.month = Some(date.month());
        self.values.day = Some(date.day());
        self.valid |= ValidSegments::DATE | ValidSegments::ERA;
        self.entry = None;
    }

    /// Fills the time segments from `time` and marks them valid.
    pub fn set_time(&mut self, time: TimeOfDay) {
        self.values.hour = Some(match self.format.hour_cycle {
            HourCycle::H23 => time.hour(),
            HourCycle::H12 => to_12_hour(time.hour()),
        });
        self.values.minute = Some(time.minute());
        self.values.period = DayPeriod::of_hour(time.hour());
        self.valid |= ValidSegments::HOUR | ValidSegments::MINUTE | ValidSegments::DAY_PERIOD;
        self.entry = None;
    }

    /// Back to all placeholders.
    pub fn clear(&mut self) {
        self.values = Values::default();
        self.valid = ValidSegments::empty();
        self.entry = None;
    }

    /// Drops the digit buffer. Called when a segment loses focus.
    pub fn end_entry(&mut self) {
        self.entry = None;
    }

    /// `true` while a segment holds digits that may still grow.
    pub const fn is_entering(&self) -> bool {
        self.entry.is_some()
    }

    pub fn segments(&self) -> Vec<DateSegment> {
        render(&self.format, &self.values, self.valid, self.entry.as_ref())
    }

    /// The field as displayed, placeholders included.
    pub fn display_text(&self) -> String {
        self.segments().into_iter().map(|segment| segment.text).collect()
    }

    /// Feeds one digit to the segment `kind`.
    pub fn apply_digit(&mut self, kind: SegmentKind, digit: u8) -> DigitOutcome {
        if digit > 9 || !kind.is_numeric() || !self.format.contains(kind) {
            return DigitOutcome::Ignored;
        }

        let (min, max) = self.bounds(kind);
        let mut digits = match &self.entry {
            Some(entry) if entry.kind == kind => entry.digits.clone(),
            _ => String::new(),
        };
        digits.push(char::from(b'0' + digit));

        let number = digits.parse::<u32>().unwrap_or(u32::MAX);
        let value = if number > max { u32::from(digit) } else { number };
        let should_set = value != 0 || min == 0;
        if should_set {
            self.set_value(kind, value.clamp(min, max));
        }

        let complete = match self.format.rule(kind) {
            AdvanceRule::Auto => {
                number.saturating_mul(10) > max || digits.len() >= digit_count(max)
            },
            AdvanceRule::Digits(n) => digits.len() >= usize::from(n) || number > max,
        };

        if complete {
            self.entry = None;
            if should_set {
                return DigitOutcome::Advance;
            }
        } else {
            self.entry = Some(Entry { kind, digits });
        }
        DigitOutcome::Pending
    }

    /// Removes the last digit of a segment. Returns `false` when there was
    /// nothing to remove.
    pub fn backspace(&mut self, kind: SegmentKind) -> bool {
        if !kind.is_numeric() || !self.format.contains(kind) {
            return false;
        }

        let mut text = match &self.entry {
            Some(entry) if entry.kind == kind => entry.digits.clone(),
            _ => match self.value(kind) {
                Some(value) => format_value(kind, value),
                None => return false,
            },
        };
        text.pop();

        match text.parse::<u32>() {
            Ok(value) if value != 0 => {
                self.set_value(kind, value.clamp(self.bounds(kind).0, self.bounds(kind).1));
                self.entry = Some(Entry { kind, digits: text });
            },
            _ => {
                self.clear_value(kind);
                self.entry = None;
            },
        }
        true
    }

    /// Arrow up/down on a segment. Blank segments take the placeholder's value,
    /// filled ones cycle within their bounds. Returns `false` if `kind` cannot step.
    pub fn step(&mut self, kind: SegmentKind, delta: i32) -> bool {
        if !SegmentFormat::is_editable(kind) || !self.format.contains(kind) {
            return false;
        }
        self.entry = None;

        if kind == SegmentKind::DayPeriod {
            self.values.period = self.values.period.toggle();
            self.valid |= ValidSegments::DAY_PERIOD;
            return true;
        }

        let (min, max) = self.bounds(kind);
        let next = match self.value(kind) {
            None => self.placeholder_value(kind),
            Some(current) => {
                let span = i64::from(max - min + 1);
                let offset = (i64::from(current) - i64::from(min) + i64::from(delta)).rem_euclid(span);
                u32::try_from(offset).map_or(min, |offset| min + offset)
            },
        };
        self.set_value(kind, next.clamp(min, max));
        true
    }

    /// Next or previous editable segment from `from`. Stays on `from` at the
    /// ends unless `wrap` is set.
    pub fn move_focus(&self, from: SegmentKind, direction: FocusDirection, wrap: bool) -> Option<SegmentKind> {
        let kinds = self.format.editable_kinds();
        let Some(index) = kinds.iter().position(|kind| *kind == from) else {
            return kinds.first().copied();
        };
        let last = kinds.len() - 1;
        let target = match direction {
            FocusDirection::Next if index == last => {
                if wrap { 0 } else { last }
            },
            FocusDirection::Next => index + 1,
            FocusDirection::Prev if index == 0 => {
                if wrap { last } else { 0 }
            },
            FocusDirection::Prev => index - 1,
        };
        kinds.get(target).copied()
    }

    pub fn first_editable(&self) -> Option<SegmentKind> {
        self.format.editable_kinds().first().copied()
    }

    pub fn last_editable(&self) -> Option<SegmentKind> {
        self.format.editable_kinds().last().copied()
    }

    pub fn is_editable(&self, kind: SegmentKind) -> bool {
        SegmentFormat::is_editable(kind) && self.format.contains(kind)
    }

    pub fn is_complete(&self) -> bool {
        self.valid.contains(self.format.required())
    }

    /// The typed date, once every required segment is valid.
    pub fn to_date(&self) -> Option<CalendarDate> {
        if !self.is_complete() {
            return None;
        }
        let Values { year, month, day, .. } = self.values;
        CalendarDate::with_clamped_day(year?, month?, day?).ok()
    }

    /// The typed time, for patterns with time segments.
    pub fn to_time(&self) -> Option<TimeOfDay> {
        if !self.format.contains(SegmentKind::Hour) || !self.is_complete() {
            return None;
        }
        let hour = self.values.hour?;
        let minute = if self.format.contains(SegmentKind::Minute) {
            self.values.minute?
        } else {
            0
        };
        match self.format.hour_cycle {
            HourCycle::H23 => TimeOfDay::new(hour, minute).ok(),
            HourCycle::H12 => TimeOfDay::from_12_hour(hour, minute, self.values.period).ok(),
        }
    }

    fn value(&self, kind: SegmentKind) -> Option<u32> {
        value_of(&self.values, self.valid, kind)
    }

    fn bounds(&self, kind: SegmentKind) -> (u32, u32) {
        bounds_of(&self.values, self.format.hour_cycle, kind)
    }

    fn placeholder_value(&self, kind: SegmentKind) -> u32 {
        match kind {
            SegmentKind::Year => u32::from(self.placeholder.year()),
            SegmentKind::Month => u32::from(self.placeholder.month()),
            SegmentKind::Day => u32::from(self.placeholder.day()),
            SegmentKind::Hour => self.bounds(kind).0,
            _ => 0,
        }
    }

    fn set_value(&mut self, kind: SegmentKind, value: u32) {
        let narrow = u8::try_from(value).ok();
        match kind {
            SegmentKind::Year => self.values.year = u16::try_from(value).ok(),
            SegmentKind::Month => self.values.month = narrow,
            SegmentKind::Day => self.values.day = narrow,
            SegmentKind::Hour => self.values.hour = narrow,
            SegmentKind::Minute => self.values.minute = narrow,
            SegmentKind::Era | SegmentKind::DayPeriod | SegmentKind::Literal => return,
        }
        self.valid |= kind.flag();

        if matches!(kind, SegmentKind::Year | SegmentKind::Month) {
            self.clamp_day();
        }
    }

    fn clear_value(&mut self, kind: SegmentKind) {
        match kind {
            SegmentKind::Year => self.values.year = None,
            SegmentKind::Month => self.values.month = None,
            SegmentKind::Day => self.values.day = None,
            SegmentKind::Hour => self.values.hour = None,
            SegmentKind::Minute => self.values.minute = None,
            SegmentKind::Era | SegmentKind::DayPeriod | SegmentKind::Literal => {},
        }
        self.valid.remove(kind.flag());
    }

    fn clamp_day(&mut self) {
        let max = day_max(&self.values);
        if let Some(day) = self.values.day.as_mut() {
            *day = (*day).min(max);
        }
    }
}

/// Renders `date` as segments. Kinds missing from `valid` render as
/// placeholders even when `date` has a value for them.
pub fn decompose(date: Option<&CalendarDate>, valid: ValidSegments, format: &SegmentFormat) -> Vec<DateSegment> {
    let values = date.map_or_else(Values::default, |date| Values {
        year: Some(date.year()),
        month: Some(date.month()),
        day: Some(date.day()),
        ..Values::default()
    });
    render(format, &values, valid, None)
}

fn render(format: &SegmentFormat, values: &Values, valid: ValidSegments, entry: Option<&Entry>) -> Vec<DateSegment> {
    format
        .tokens
        .iter()
        .map(|token| match token {
            Token::Literal(text) => DateSegment {
                kind: SegmentKind::Literal,
                value: None,
                text: text.clone(),
                min: 0,
                max: 0,
                is_placeholder: false,
                is_editable: false,
            },
            Token::Field { kind, .. } => {
                let kind = *kind;
                let (min, max) = bounds_of(values, format.hour_cycle, kind);
                let value = value_of(values, valid, kind);
                let entry = entry.filter(|entry| entry.kind == kind);
                let text = match (entry, value) {
                    (Some(entry), _) => entry.digits.clone(),
                    (None, Some(value)) => display_value(kind, value),
                    (None, None) => kind.placeholder().to_owned(),
                };
                DateSegment {
                    kind,
                    value,
                    text,
                    min,
                    max,
                    is_placeholder: value.is_none() && entry.is_none(),
                    is_editable: SegmentFormat::is_editable(kind),
                }
            },
        })
        .collect()
}

fn value_of(values: &Values, valid: ValidSegments, kind: SegmentKind) -> Option<u32> {
    match kind {
        SegmentKind::Era => Some(0),
        SegmentKind::Literal => None,
        _ if !valid.has(kind) => None,
        SegmentKind::Year => values.year.map(u32::from),
        SegmentKind::Month => values.month.map(u32::from),
        SegmentKind::Day => values.day.map(u32::from),
        SegmentKind::Hour => values.hour.map(u32::from),
        SegmentKind::Minute => values.minute.map(u32::from),
        SegmentKind::DayPeriod => Some(match values.period {
            DayPeriod::Am => 0,
            DayPeriod::Pm => 1,
        }),
    }
}

fn bounds_of(values: &Values, hour_cycle: HourCycle, kind: SegmentKind) -> (u32, u32) {
    match kind {
        SegmentKind::Year => (u32::from(MIN_YEAR), u32::from(MAX_YEAR)),
        SegmentKind::Month => (1, u32::from(MAX_MONTH)),
        SegmentKind::Day => (u32::from(MIN_DAY), u32::from(day_max(values))),
        SegmentKind::Hour => match hour_cycle {
            HourCycle::H23 => (0, u32::from(MAX_HOUR)),
            HourCycle::H12 => (1, u32::from(HOURS_PER_HALF_DAY)),
        },
        SegmentKind::Minute => (0, u32::from(MAX_MINUTE)),
        SegmentKind::DayPeriod => (0, 1),
        SegmentKind::Era | SegmentKind::Literal => (0, 0),
    }
}

/// Longest day the known parts of the date allow.
fn day_max(values: &Values) -> u8 {
    match (values.year, values.month) {
        (Some(year), Some(month)) if (1..=MAX_MONTH).contains(&month) => days_in_month(year, month),
        (None, Some(FEBRUARY)) => FEBRUARY_DAYS_LEAP,
        (None, Some(month)) if (1..=MAX_MONTH).contains(&month) => DAYS_IN_MONTH[usize::from(month)],
        _ => MAX_DAY,
    }
}

fn display_value(kind: SegmentKind, value: u32) -> String {
    match kind {
        SegmentKind::Era => Era::Ad.to_string(),
        SegmentKind::DayPeriod if value == 0 => DayPeriod::Am.to_string(),
        SegmentKind::DayPeriod => DayPeriod::Pm.to_string(),
        _ => format_value(kind, value),
    }
}

fn format_value(kind: SegmentKind, value: u32) -> String {
    match kind {
        SegmentKind::Year => format!("{value:04}"),
        _ => format!("{value:02}"),
    }
}

const fn to_12_hour(hour: u8) -> u8 {
    match hour % HOURS_PER_HALF_DAY {
        0 => HOURS_PER_HALF_DAY,
        h => h,
    }
}

fn digit_count(mut value: u32) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}
