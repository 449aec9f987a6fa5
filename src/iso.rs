//! This module implements the ISO calendar value records.
//!
//! The three records are:
//!   - `IsoDate`
//!   - `IsoTime`
//!   - `IsoDateTime`
//!
//! They are the concrete values the ISO resolver produces and the simplest
//! inputs the printer accepts.

use crate::error::FormatError;
use crate::fields::{TemporalAccessor, TemporalField};
use crate::utils;
use crate::FormatResult;

/// An ISO calendar date.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl IsoDate {
    /// Creates a new `IsoDate` without any validation.
    pub(crate) fn new_unchecked(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Creates a new validated `IsoDate`.
    pub fn new(year: i32, month: u8, day: u8) -> FormatResult<Self> {
        if !TemporalField::Year.range().is_valid_value(i64::from(year)) {
            return Err(FormatError::range().with_message("year is not within the valid ISO range."));
        }
        if !(1..=12).contains(&month) {
            return Err(FormatError::range().with_message("month must be in 1..=12."));
        }
        if day < 1 || day > utils::days_in_month(year, month) {
            return Err(FormatError::range()
                .with_message(format!("day {day} is not valid for month {month}.")));
        }
        Ok(Self::new_unchecked(year, month, day))
    }

    /// Returns the one-based day-of-year.
    #[must_use]
    pub fn day_of_year(&self) -> u16 {
        utils::day_of_year(self.year, self.month, self.day)
    }

    /// Returns the quarter-of-year, from 1 to 4.
    #[must_use]
    pub fn quarter_of_year(&self) -> u8 {
        (self.month - 1) / 3 + 1
    }

    /// Returns the days since the Unix epoch.
    pub(crate) fn to_epoch_days(self) -> i64 {
        utils::epoch_days_from_date(self.year, self.month, self.day)
    }

    /// Builds a date from days since the Unix epoch.
    pub(crate) fn from_epoch_days(days: i64) -> Self {
        let (year, month, day) = utils::epoch_days_to_date(days);
        Self::new_unchecked(year, month, day)
    }
}

impl TemporalAccessor for IsoDate {
    fn is_supported(&self, field: TemporalField) -> bool {
        field.is_date_based()
    }

    fn get(&self, field: TemporalField) -> Option<i64> {
        let value = match field {
            TemporalField::Era => i64::from(self.year >= 1),
            TemporalField::Year => i64::from(self.year),
            TemporalField::YearOfEra => {
                if self.year >= 1 {
                    i64::from(self.year)
                } else {
                    1 - i64::from(self.year)
                }
            }
            TemporalField::QuarterOfYear => i64::from(self.quarter_of_year()),
            TemporalField::MonthOfYear => i64::from(self.month),
            TemporalField::DayOfMonth => i64::from(self.day),
            TemporalField::DayOfYear => i64::from(self.day_of_year()),
            TemporalField::AlignedDayOfWeekInMonth => i64::from((self.day - 1) % 7 + 1),
            _ => return None,
        };
        Some(value)
    }
}

/// An ISO wall-clock time.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanosecond: u32,
}

impl IsoTime {
    pub(crate) fn new_unchecked(hour: u8, minute: u8, second: u8, nanosecond: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            nanosecond,
        }
    }

    /// Creates a new validated `IsoTime`.
    pub fn new(hour: u8, minute: u8, second: u8, nanosecond: u32) -> FormatResult<Self> {
        if hour > 23 {
            return Err(FormatError::range().with_message("hour must be in 0..=23."));
        }
        if minute > 59 || second > 59 {
            return Err(FormatError::range().with_message("minute and second must be in 0..=59."));
        }
        if nanosecond > 999_999_999 {
            return Err(FormatError::range().with_message("nanosecond must be in 0..=999999999."));
        }
        Ok(Self::new_unchecked(hour, minute, second, nanosecond))
    }

    /// Returns the nanosecond within the day.
    #[must_use]
    pub fn nanosecond_of_day(&self) -> u64 {
        (u64::from(self.hour) * 3600 + u64::from(self.minute) * 60 + u64::from(self.second))
            * 1_000_000_000
            + u64::from(self.nanosecond)
    }

    /// Builds a time from a nanosecond-of-day value. The value must be in
    /// range for a single day.
    pub(crate) fn from_nanosecond_of_day(nanos: u64) -> Self {
        let second_of_day = nanos / 1_000_000_000;
        Self::new_unchecked(
            (second_of_day / 3600) as u8,
            (second_of_day / 60 % 60) as u8,
            (second_of_day % 60) as u8,
            (nanos % 1_000_000_000) as u32,
        )
    }
}

impl TemporalAccessor for IsoTime {
    fn is_supported(&self, field: TemporalField) -> bool {
        field.is_time_based()
    }

    fn get(&self, field: TemporalField) -> Option<i64> {
        let value = match field {
            TemporalField::AmPmOfDay => i64::from(self.hour / 12),
            TemporalField::ClockHourOfAmPm => {
                let hour = self.hour % 12;
                i64::from(if hour == 0 { 12 } else { hour })
            }
            TemporalField::HourOfAmPm => i64::from(self.hour % 12),
            TemporalField::ClockHourOfDay => i64::from(if self.hour == 0 { 24 } else { self.hour }),
            TemporalField::HourOfDay => i64::from(self.hour),
            TemporalField::MinuteOfHour => i64::from(self.minute),
            TemporalField::SecondOfMinute => i64::from(self.second),
            TemporalField::MilliOfDay => (self.nanosecond_of_day() / 1_000_000) as i64,
            TemporalField::NanoOfSecond => i64::from(self.nanosecond),
            TemporalField::NanoOfDay => self.nanosecond_of_day() as i64,
            _ => return None,
        };
        Some(value)
    }
}

/// The combination of an `IsoDate` and an `IsoTime`.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoDateTime {
    pub date: IsoDate,
    pub time: IsoTime,
}

impl IsoDateTime {
    /// Creates a new `IsoDateTime` from its parts.
    #[must_use]
    pub fn new(date: IsoDate, time: IsoTime) -> Self {
        Self { date, time }
    }
}

impl TemporalAccessor for IsoDateTime {
    fn is_supported(&self, field: TemporalField) -> bool {
        self.date.is_supported(field) || self.time.is_supported(field)
    }

    fn get(&self, field: TemporalField) -> Option<i64> {
        self.date.get(field).or_else(|| self.time.get(field))
    }
}
