/// Maximum valid year (inclusive)
pub const MAX_YEAR: u16 = 9999;

/// Minimum valid year (inclusive); the calendar has no year zero
pub const MIN_YEAR: u16 = 1;

/// Maximum valid month (December)
pub const MAX_MONTH: u8 = 12;

/// First day of month, used for lower bounds
pub const MIN_DAY: u8 = 1;

/// Longest month length of the Gregorian calendar
pub const MAX_DAY: u8 = 31;

/// Month number for January
pub const JANUARY: u8 = 1;
/// Month number for February
pub const FEBRUARY: u8 = 2;
/// Month number for November
pub const NOVEMBER: u8 = 11;
/// Month number for December
pub const DECEMBER: u8 = 12;

/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: u8 = 29;

/// Maximum days in each month (index 0 is unused, months are 1-indexed)
/// February shows 28 days (non-leap year default)
pub const DAYS_IN_MONTH: [u8; 13] = [
    0,  // index 0 unused (months are 1-indexed)
    31, // January
    28, // February (non-leap, adjusted by is_leap_year check)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

/// Leap year occurs every 4 years
pub(crate) const LEAP_YEAR_CYCLE: u16 = 4;
/// Century years are not leap years unless...
pub(crate) const CENTURY_CYCLE: u16 = 100;
/// ...they are divisible by 400 (Gregorian calendar correction)
pub(crate) const GREGORIAN_CYCLE: u16 = 400;

/// Days in one grid row
pub const DAYS_PER_WEEK: u8 = 7;

/// Rows of a fixed-height month grid
pub const FIXED_WEEK_ROWS: usize = 6;

/// Hours on a 12-hour clock face
pub const HOURS_PER_HALF_DAY: u8 = 12;

/// Largest hour of a 24-hour clock
pub const MAX_HOUR: u8 = 23;

/// Largest minute of an hour
pub const MAX_MINUTE: u8 = 59;

/// Date component separator (ISO 8601 format)
pub const DATE_SEPARATOR: char = '-';

/// Range separator (ISO 8601 extended format)
pub const RANGE_SEPARATOR: char = '/';

/// Segment pattern used when the configuration does not name one
pub const DEFAULT_FORMAT: &str = "MM/DD/YYYY";

/// Locale used when the configuration does not name one
pub const DEFAULT_LOCALE: &str = "en-US";

/// Time zone id used when the configuration does not name one
pub const DEFAULT_TIME_ZONE: &str = "UTC";
