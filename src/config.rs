use serde::{Deserialize, Serialize};

use crate::grid::{Bounds, GridNavigator};
use crate::segment::{AdvanceRule, FormatError, SegmentFormat, SegmentKind};
use crate::selection::SelectionMode;
use crate::types::Weekday;
use crate::{CalendarDate, DEFAULT_FORMAT, DEFAULT_LOCALE, TimeZone};

/// Construction-time options of a [`crate::DatePickerEngine`].
///
/// Every field has a default, so partial JSON such as
/// `{"selection_mode": "range", "min": "2024-01-01"}` deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatePickerConfig {
    pub selection_mode: SelectionMode,
    pub min: Option<CalendarDate>,
    pub max: Option<CalendarDate>,
    pub first_day_of_week: Weekday,
    /// Always render six grid rows.
    pub fixed_weeks: bool,
    /// Segment pattern, e.g. `MM/DD/YYYY`.
    pub format: String,
    /// Per-segment overrides of when typed digits move focus on.
    pub advance_rules: Vec<(SegmentKind, AdvanceRule)>,
    pub locale: String,
    pub time_zone: TimeZone,
    pub disabled: bool,
    pub readonly: bool,
    /// Initial value; clamped into `[min, max]`.
    pub value: Option<CalendarDate>,
    /// Initial focus; defaults to the value, then to today.
    pub focused_value: Option<CalendarDate>,
}

impl Default for DatePickerConfig {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::default(),
            min: None,
            max: None,
            first_day_of_week: Weekday::default(),
            fixed_weeks: false,
            format: DEFAULT_FORMAT.to_owned(),
            advance_rules: Vec::new(),
            locale: DEFAULT_LOCALE.to_owned(),
            time_zone: TimeZone::default(),
            disabled: false,
            readonly: false,
            value: None,
            focused_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bounds: min ({min}) is after max ({max})")]
    InvertedBounds { min: CalendarDate, max: CalendarDate },

    #[error("Invalid format pattern '{pattern}': {source}")]
    Format {
        pattern: String,
        #[source]
        source:  FormatError,
    },

    #[error("Advance rule for '{0}' must take at least one digit")]
    ZeroDigitRule(SegmentKind),

    #[error("Locale must not be empty")]
    EmptyLocale,
}

impl DatePickerConfig {
    /// # Errors
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds()?;
        self.segment_format()?;
        if self.locale.trim().is_empty() {
            return Err(ConfigError::EmptyLocale);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigError::InvertedBounds` if `min > max`.
    pub fn bounds(&self) -> Result<Bounds, ConfigError> {
        Bounds::new(self.min, self.max).map_err(|_| ConfigError::InvertedBounds {
            min: self.min.unwrap_or(CalendarDate::MIN),
            max: self.max.unwrap_or(CalendarDate::MAX),
        })
    }

    /// The parsed pattern with `advance_rules` applied.
    ///
    /// # Errors
    /// Returns `ConfigError::Format` if the pattern does not parse and
    /// `ConfigError::ZeroDigitRule` for a `Digits(0)` rule.
    pub fn segment_format(&self) -> Result<SegmentFormat, ConfigError> {
        let format = SegmentFormat::parse(&self.format).map_err(|source| ConfigError::Format {
            pattern: self.format.clone(),
            source,
        })?;
        self.advance_rules.iter().try_fold(format, |format, &(kind, rule)| {
            if rule == AdvanceRule::Digits(0) {
                return Err(ConfigError::ZeroDigitRule(kind));
            }
            Ok(format.with_rule(kind, rule))
        })
    }

    pub const fn navigator(&self) -> GridNavigator {
        GridNavigator::new(self.first_day_of_week, self.fixed_weeks)
    }
}
