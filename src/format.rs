//! Date formatting collaborators.
//!
//! The engine never formats dates itself: it asks a [`DateFormatter`] built by
//! a [`FormatterFactory`]. Formatters are cached per `(pattern, locale, time
//! zone)` in a [`FormatterCache`], which drops everything on a locale or time
//! zone change.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::segment::{FormatError, SegmentFormat, ValidSegments, decompose};
use crate::types::Weekday;
use crate::{CalendarDate, DEFAULT_LOCALE, TimeZone};

/// Key a formatter is built and cached under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    pub pattern: String,
    pub locale: String,
    pub time_zone: TimeZone,
}

impl FormatOptions {
    /// Trims the pattern and canonicalizes the locale tag (`en_US` and
    /// `EN-us` both become `en-us`).
    fn normalized(pattern: &str, locale: &str, time_zone: &TimeZone) -> Self {
        Self {
            pattern: pattern.trim().to_owned(),
            locale: locale.trim().replace('_', "-").to_ascii_lowercase(),
            time_zone: time_zone.clone(),
        }
    }
}

pub trait DateFormatter {
    fn format_date(&self, date: &CalendarDate) -> String;

    /// Column header for a weekday.
    fn format_weekday(&self, weekday: Weekday) -> String {
        weekday.short_name().to_owned()
    }
}

pub trait FormatterFactory {
    /// # Errors
    /// Returns a `FormatError` if the pattern cannot be used.
    fn create(&self, options: &FormatOptions) -> Result<Box<dyn DateFormatter>, FormatError>;
}

/// Numeric formatter that renders the date segments of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormatter {
    format: SegmentFormat,
}

impl PatternFormatter {
    pub fn new(format: &SegmentFormat) -> Self {
        Self {
            format: format.date_only(),
        }
    }
}

impl DateFormatter for PatternFormatter {
    fn format_date(&self, date: &CalendarDate) -> String {
        decompose(Some(date), ValidSegments::all(), &self.format)
            .into_iter()
            .map(|segment| segment.text)
            .collect()
    }
}

/// Builds [`PatternFormatter`]s. Locale and time zone do not change the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternFormatterFactory;

impl FormatterFactory for PatternFormatterFactory {
    fn create(&self, options: &FormatOptions) -> Result<Box<dyn DateFormatter>, FormatError> {
        let format = SegmentFormat::parse(&options.pattern)?;
        Ok(Box::new(PatternFormatter::new(&format)))
    }
}

pub struct FormatterCache {
    factory: Box<dyn FormatterFactory>,
    locale: String,
    time_zone: TimeZone,
    entries: RefCell<HashMap<FormatOptions, Rc<dyn DateFormatter>>>,
}

impl FormatterCache {
    pub fn new(factory: Box<dyn FormatterFactory>, locale: impl Into<String>, time_zone: TimeZone) -> Self {
        Self {
            factory,
            locale: locale.into(),
            time_zone,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub const fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    /// Formatter for `pattern` under the current locale and time zone,
    /// built on first use.
    ///
    /// # Errors
    /// Propagates the factory's `FormatError`. Failures are not cached.
    pub fn get(&self, pattern: &str) -> Result<Rc<dyn DateFormatter>, FormatError> {
        let key = FormatOptions::normalized(pattern, &self.locale, &self.time_zone);
        if let Some(formatter) = self.entries.borrow().get(&key) {
            return Ok(Rc::clone(formatter));
        }

        debug!(pattern = %key.pattern, locale = %key.locale, time_zone = %key.time_zone, "building formatter");
        let formatter: Rc<dyn DateFormatter> = Rc::from(self.factory.create(&key)?);
        self.entries.borrow_mut().insert(key, Rc::clone(&formatter));
        Ok(formatter)
    }

    /// Returns `true` if the locale changed and the cache was dropped.
    pub fn set_locale(&mut self, locale: impl Into<String>) -> bool {
        let locale = locale.into();
        if locale == self.locale {
            return false;
        }
        debug!(from = %self.locale, to = %locale, "locale changed, clearing formatter cache");
        self.locale = locale;
        self.entries.get_mut().clear();
        true
    }

    /// Returns `true` if the time zone changed and the cache was dropped.
    pub fn set_time_zone(&mut self, time_zone: TimeZone) -> bool {
        if time_zone == self.time_zone {
            return false;
        }
        debug!(from = %self.time_zone, to = %time_zone, "time zone changed, clearing formatter cache");
        self.time_zone = time_zone;
        self.entries.get_mut().clear();
        true
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Default for FormatterCache {
    fn default() -> Self {
        Self::new(Box::new(PatternFormatterFactory), DEFAULT_LOCALE, TimeZone::default())
    }
}

impl std::fmt::Debug for FormatterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterCache")
            .field("locale", &self.locale)
            .field("time_zone", &self.time_zone)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::test_utils::date;

    struct CountingFactory {
        created: Rc<Cell<usize>>,
    }

    impl FormatterFactory for CountingFactory {
        fn create(&self, options: &FormatOptions) -> Result<Box<dyn DateFormatter>, FormatError> {
            self.created.set(self.created.get() + 1);
            PatternFormatterFactory.create(options)
        }
    }

    fn counting_cache() -> (FormatterCache, Rc<Cell<usize>>) {
        let created = Rc::new(Cell::new(0));
        let factory = CountingFactory {
            created: Rc::clone(&created),
        };
        (FormatterCache::new(Box::new(factory), "en-US", TimeZone::utc()), created)
    }

    #[test]
    fn test_pattern_formatter() {
        struct TestCase {
            pattern:  &'static str,
            expected: &'static str,
        }

        let cases = [
            TestCase { pattern: "MM/DD/YYYY", expected: "03/05/2024" },
            TestCase { pattern: "DD.MM.YYYY", expected: "05.03.2024" },
            TestCase { pattern: "YYYY-MM-DD", expected: "2024-03-05" },
            TestCase { pattern: "DD/MM/YYYY G", expected: "05/03/2024 AD" },
            TestCase { pattern: "MM/DD/YYYY hh:mm a", expected: "03/05/2024" },
        ];

        for case in &cases {
            let format = SegmentFormat::parse(case.pattern).unwrap();
            let formatter = PatternFormatter::new(&format);
            assert_eq!(formatter.format_date(&date(2024, 3, 5)), case.expected, "{}", case.pattern);
        }
    }

    #[test]
    fn test_cache_reuses_normalized_keys() {
        let (mut cache, created) = counting_cache();
        cache.get("MM/DD/YYYY").unwrap();
        cache.get(" MM/DD/YYYY ").unwrap();
        assert_eq!(created.get(), 1);

        assert!(!cache.set_locale("en-US"));
        cache.get("MM/DD/YYYY").unwrap();
        assert_eq!(created.get(), 1);

        cache.get("DD.MM.YYYY").unwrap();
        assert_eq!(created.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_cleared_on_locale_or_zone_change() {
        let (mut cache, created) = counting_cache();
        cache.get("MM/DD/YYYY").unwrap();

        assert!(cache.set_locale("de-DE"));
        assert!(cache.is_empty());
        cache.get("MM/DD/YYYY").unwrap();
        assert_eq!(created.get(), 2);

        assert!(cache.set_time_zone(TimeZone::new("+01:00")));
        assert!(cache.is_empty());
        cache.get("MM/DD/YYYY").unwrap();
        assert_eq!(created.get(), 3);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let cache = FormatterCache::default();
        assert!(cache.get("QQ").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_weekday_labels() {
        let formatter = PatternFormatter::new(&SegmentFormat::parse("MM/DD/YYYY").unwrap());
        let labels: Vec<_> = Weekday::week_from(Weekday::Monday)
            .into_iter()
            .map(|day| formatter.format_weekday(day))
            .collect();
        assert_eq!(labels, ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    }
}
