//! This module implements the temporal field registry and components.

use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

use crate::error::FormatError;
use crate::FormatResult;

/// The closed set of temporal fields the engine can print, parse, and
/// resolve.
///
/// Each field carries an integer [`ValueRange`] and a base unit. The set is
/// deliberately closed so that tree dispatch and resolution stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemporalField {
    /// The era, `0` (before current era) or `1` (current era).
    Era,
    /// The proleptic year.
    Year,
    /// The year within the era, always positive.
    YearOfEra,
    /// The quarter-of-year, from 1 to 4.
    QuarterOfYear,
    /// The month-of-year, from 1 to 12.
    MonthOfYear,
    /// The day-of-month, from 1 to 28/31.
    DayOfMonth,
    /// The day-of-year, from 1 to 365/366.
    DayOfYear,
    /// The aligned day-of-week within a month, from 1 to 7.
    AlignedDayOfWeekInMonth,
    /// The AM/PM half of the day, `0` (AM) or `1` (PM).
    AmPmOfDay,
    /// The clock hour within the AM/PM half, from 1 to 12.
    ClockHourOfAmPm,
    /// The hour within the AM/PM half, from 0 to 11.
    HourOfAmPm,
    /// The clock hour-of-day, from 1 to 24.
    ClockHourOfDay,
    /// The hour-of-day, from 0 to 23.
    HourOfDay,
    /// The minute-of-hour, from 0 to 59.
    MinuteOfHour,
    /// The second-of-minute, from 0 to 59.
    SecondOfMinute,
    /// The millisecond-of-day.
    MilliOfDay,
    /// The nanosecond-of-second.
    NanoOfSecond,
    /// The nanosecond-of-day.
    NanoOfDay,
    /// The total offset from UTC in seconds.
    OffsetSeconds,
    /// The instant epoch second.
    InstantSeconds,
}

/// The base unit a field subdivides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseUnit {
    Eras,
    Years,
    Quarters,
    Months,
    Days,
    HalfDays,
    Hours,
    Minutes,
    Seconds,
    Millis,
    Nanos,
}

pub(crate) const ALL_FIELDS: [TemporalField; 20] = [
    TemporalField::Era,
    TemporalField::Year,
    TemporalField::YearOfEra,
    TemporalField::QuarterOfYear,
    TemporalField::MonthOfYear,
    TemporalField::DayOfMonth,
    TemporalField::DayOfYear,
    TemporalField::AlignedDayOfWeekInMonth,
    TemporalField::AmPmOfDay,
    TemporalField::ClockHourOfAmPm,
    TemporalField::HourOfAmPm,
    TemporalField::ClockHourOfDay,
    TemporalField::HourOfDay,
    TemporalField::MinuteOfHour,
    TemporalField::SecondOfMinute,
    TemporalField::MilliOfDay,
    TemporalField::NanoOfSecond,
    TemporalField::NanoOfDay,
    TemporalField::OffsetSeconds,
    TemporalField::InstantSeconds,
];

impl TemporalField {
    /// Returns the valid value range for the field.
    #[must_use]
    pub fn range(self) -> ValueRange {
        match self {
            Self::Era => ValueRange::fixed(0, 1),
            Self::Year => ValueRange::fixed(-999_999_999, 999_999_999),
            Self::YearOfEra => ValueRange::of(1, 999_999_999, 1_000_000_000),
            Self::QuarterOfYear => ValueRange::fixed(1, 4),
            Self::MonthOfYear => ValueRange::fixed(1, 12),
            Self::DayOfMonth => ValueRange::of(1, 28, 31),
            Self::DayOfYear => ValueRange::of(1, 365, 366),
            Self::AlignedDayOfWeekInMonth => ValueRange::fixed(1, 7),
            Self::AmPmOfDay => ValueRange::fixed(0, 1),
            Self::ClockHourOfAmPm => ValueRange::fixed(1, 12),
            Self::HourOfAmPm => ValueRange::fixed(0, 11),
            Self::ClockHourOfDay => ValueRange::fixed(1, 24),
            Self::HourOfDay => ValueRange::fixed(0, 23),
            Self::MinuteOfHour => ValueRange::fixed(0, 59),
            Self::SecondOfMinute => ValueRange::fixed(0, 59),
            Self::MilliOfDay => ValueRange::fixed(0, 86_399_999),
            Self::NanoOfSecond => ValueRange::fixed(0, 999_999_999),
            Self::NanoOfDay => ValueRange::fixed(0, 86_399_999_999_999),
            Self::OffsetSeconds => ValueRange::fixed(-64_800, 64_800),
            Self::InstantSeconds => ValueRange::fixed(i64::MIN, i64::MAX),
        }
    }

    /// Returns the unit the field subdivides.
    #[must_use]
    pub fn base_unit(self) -> BaseUnit {
        match self {
            Self::Era => BaseUnit::Eras,
            Self::Year | Self::YearOfEra => BaseUnit::Years,
            Self::QuarterOfYear => BaseUnit::Quarters,
            Self::MonthOfYear => BaseUnit::Months,
            Self::DayOfMonth | Self::DayOfYear | Self::AlignedDayOfWeekInMonth => BaseUnit::Days,
            Self::AmPmOfDay => BaseUnit::HalfDays,
            Self::ClockHourOfAmPm | Self::HourOfAmPm | Self::ClockHourOfDay | Self::HourOfDay => {
                BaseUnit::Hours
            }
            Self::MinuteOfHour => BaseUnit::Minutes,
            Self::SecondOfMinute | Self::OffsetSeconds | Self::InstantSeconds => BaseUnit::Seconds,
            Self::MilliOfDay => BaseUnit::Millis,
            Self::NanoOfSecond | Self::NanoOfDay => BaseUnit::Nanos,
        }
    }

    /// Returns whether the field has a fixed value range, which is what
    /// fraction emission and the fixed-width printing behavior key off.
    #[inline]
    #[must_use]
    pub fn is_fixed_width(self) -> bool {
        self.range().is_fixed()
    }

    /// Returns whether the field is a component of the calendar date.
    #[inline]
    #[must_use]
    pub fn is_date_based(self) -> bool {
        matches!(
            self,
            Self::Era
                | Self::Year
                | Self::YearOfEra
                | Self::QuarterOfYear
                | Self::MonthOfYear
                | Self::DayOfMonth
                | Self::DayOfYear
                | Self::AlignedDayOfWeekInMonth
        )
    }

    /// Returns whether the field is a component of the wall-clock time.
    #[inline]
    #[must_use]
    pub fn is_time_based(self) -> bool {
        matches!(
            self,
            Self::AmPmOfDay
                | Self::ClockHourOfAmPm
                | Self::HourOfAmPm
                | Self::ClockHourOfDay
                | Self::HourOfDay
                | Self::MinuteOfHour
                | Self::SecondOfMinute
                | Self::MilliOfDay
                | Self::NanoOfSecond
                | Self::NanoOfDay
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::Era => "Era",
            Self::Year => "Year",
            Self::YearOfEra => "YearOfEra",
            Self::QuarterOfYear => "QuarterOfYear",
            Self::MonthOfYear => "MonthOfYear",
            Self::DayOfMonth => "DayOfMonth",
            Self::DayOfYear => "DayOfYear",
            Self::AlignedDayOfWeekInMonth => "AlignedDayOfWeekInMonth",
            Self::AmPmOfDay => "AmPmOfDay",
            Self::ClockHourOfAmPm => "ClockHourOfAmPm",
            Self::HourOfAmPm => "HourOfAmPm",
            Self::ClockHourOfDay => "ClockHourOfDay",
            Self::HourOfDay => "HourOfDay",
            Self::MinuteOfHour => "MinuteOfHour",
            Self::SecondOfMinute => "SecondOfMinute",
            Self::MilliOfDay => "MilliOfDay",
            Self::NanoOfSecond => "NanoOfSecond",
            Self::NanoOfDay => "NanoOfDay",
            Self::OffsetSeconds => "OffsetSeconds",
            Self::InstantSeconds => "InstantSeconds",
        }
    }
}

impl fmt::Display for TemporalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl FromStr for TemporalField {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FIELDS
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| {
                FormatError::argument().with_message(format!("{s} is not a valid temporal field"))
            })
    }
}

/// The range of valid values for a field.
///
/// The maximum may vary with the rest of the date, so the range carries both
/// the smallest and the largest maximum. A range is *fixed* when the two
/// coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    min: i64,
    smallest_max: i64,
    largest_max: i64,
}

impl ValueRange {
    #[inline]
    #[must_use]
    pub(crate) const fn fixed(min: i64, max: i64) -> Self {
        Self {
            min,
            smallest_max: max,
            largest_max: max,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn of(min: i64, smallest_max: i64, largest_max: i64) -> Self {
        Self {
            min,
            smallest_max,
            largest_max,
        }
    }

    /// The minimum valid value.
    #[inline]
    #[must_use]
    pub const fn min(&self) -> i64 {
        self.min
    }

    /// The largest maximum valid value.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> i64 {
        self.largest_max
    }

    /// The smallest maximum valid value.
    #[inline]
    #[must_use]
    pub const fn smallest_max(&self) -> i64 {
        self.smallest_max
    }

    /// Returns whether the maximum does not vary with the rest of the date.
    #[inline]
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.smallest_max == self.largest_max
    }

    /// Returns whether `value` lies within the outer bounds of the range.
    #[inline]
    #[must_use]
    pub fn is_valid_value(&self, value: i64) -> bool {
        self.min <= value && value <= self.largest_max
    }

    pub(crate) fn check_valid(&self, value: i64, field: TemporalField) -> FormatResult<i64> {
        if !self.is_valid_value(value) {
            return Err(FormatError::range().with_message(format!(
                "value {value} is not in the required range {}..={} for {field}",
                self.min, self.largest_max
            )));
        }
        Ok(value)
    }
}

bitflags! {
    /// A set of temporal fields, used to restrict which parsed bindings
    /// participate in resolution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldMap: u32 {
        const ERA = 1;
        const YEAR = 1 << 1;
        const YEAR_OF_ERA = 1 << 2;
        const QUARTER_OF_YEAR = 1 << 3;
        const MONTH_OF_YEAR = 1 << 4;
        const DAY_OF_MONTH = 1 << 5;
        const DAY_OF_YEAR = 1 << 6;
        const ALIGNED_DAY_OF_WEEK_IN_MONTH = 1 << 7;
        const AM_PM_OF_DAY = 1 << 8;
        const CLOCK_HOUR_OF_AM_PM = 1 << 9;
        const HOUR_OF_AM_PM = 1 << 10;
        const CLOCK_HOUR_OF_DAY = 1 << 11;
        const HOUR_OF_DAY = 1 << 12;
        const MINUTE_OF_HOUR = 1 << 13;
        const SECOND_OF_MINUTE = 1 << 14;
        const MILLI_OF_DAY = 1 << 15;
        const NANO_OF_SECOND = 1 << 16;
        const NANO_OF_DAY = 1 << 17;
        const OFFSET_SECONDS = 1 << 18;
        const INSTANT_SECONDS = 1 << 19;
    }
}

impl From<TemporalField> for FieldMap {
    fn from(field: TemporalField) -> Self {
        match field {
            TemporalField::Era => Self::ERA,
            TemporalField::Year => Self::YEAR,
            TemporalField::YearOfEra => Self::YEAR_OF_ERA,
            TemporalField::QuarterOfYear => Self::QUARTER_OF_YEAR,
            TemporalField::MonthOfYear => Self::MONTH_OF_YEAR,
            TemporalField::DayOfMonth => Self::DAY_OF_MONTH,
            TemporalField::DayOfYear => Self::DAY_OF_YEAR,
            TemporalField::AlignedDayOfWeekInMonth => Self::ALIGNED_DAY_OF_WEEK_IN_MONTH,
            TemporalField::AmPmOfDay => Self::AM_PM_OF_DAY,
            TemporalField::ClockHourOfAmPm => Self::CLOCK_HOUR_OF_AM_PM,
            TemporalField::HourOfAmPm => Self::HOUR_OF_AM_PM,
            TemporalField::ClockHourOfDay => Self::CLOCK_HOUR_OF_DAY,
            TemporalField::HourOfDay => Self::HOUR_OF_DAY,
            TemporalField::MinuteOfHour => Self::MINUTE_OF_HOUR,
            TemporalField::SecondOfMinute => Self::SECOND_OF_MINUTE,
            TemporalField::MilliOfDay => Self::MILLI_OF_DAY,
            TemporalField::NanoOfSecond => Self::NANO_OF_SECOND,
            TemporalField::NanoOfDay => Self::NANO_OF_DAY,
            TemporalField::OffsetSeconds => Self::OFFSET_SECONDS,
            TemporalField::InstantSeconds => Self::INSTANT_SECONDS,
        }
    }
}

/// Read access to a temporal value during formatting.
///
/// Implemented by the date/time records in this crate and by parse results;
/// callers can implement it for their own value types.
pub trait TemporalAccessor {
    /// Returns whether the field can be queried on this value.
    fn is_supported(&self, field: TemporalField) -> bool;

    /// Returns the value for the field, or `None` when unsupported.
    fn get(&self, field: TemporalField) -> Option<i64>;

    /// Returns the time zone identifier attached to this value, if any.
    fn zone_id(&self) -> Option<&str> {
        None
    }
}
