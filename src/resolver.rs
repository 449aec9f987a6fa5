//! Field resolution: combining parsed bindings into concrete values.
//!
//! The chronology owns the calendar rules (month lengths, era mapping); the
//! time-of-day combination rules are calendar independent and live here. The
//! engine never retries: a resolution error aborts the whole parse.

use core::fmt;

use crate::error::FormatError;
use crate::fields::{FieldMap, TemporalField};
use crate::iso::{IsoDate, IsoTime};
use crate::options::ResolverStyle;
use crate::parsed::Parsed;
use crate::utils;
use crate::FormatResult;

const NS_PER_HOUR: i64 = 3_600_000_000_000;
const NS_PER_MINUTE: i64 = 60_000_000_000;
const NS_PER_SECOND: i64 = 1_000_000_000;

// Bounds the epoch-day arithmetic of lenient resolution to the supported
// year range.
const MAX_EPOCH_DAYS: i64 = 365_250_000_000;

/// The calendar system resolving date fields into a date.
///
/// The engine holds chronology references as shared descriptors; ownership
/// stays with the caller, typically as a `static`.
pub trait Chronology: fmt::Debug + Send + Sync {
    /// A short identifier for the calendar system.
    fn name(&self) -> &'static str;

    /// Builds a date from a year, month, and day. When `era` is provided the
    /// year is interpreted within that era, otherwise proleptically.
    fn date_from_fields(
        &self,
        era: Option<i64>,
        year: i64,
        month: i64,
        day: i64,
        style: ResolverStyle,
    ) -> FormatResult<IsoDate>;

    /// Combines the date bindings of `parsed` into a concrete date.
    fn resolve(&self, parsed: &mut Parsed, style: ResolverStyle) -> FormatResult<()>;
}

/// The ISO-8601 calendar system.
#[derive(Debug)]
pub struct IsoChronology;

/// The shared ISO chronology descriptor.
pub static ISO: IsoChronology = IsoChronology;

fn add_field(parsed: &mut Parsed, field: TemporalField, value: i64) -> FormatResult<()> {
    if let Some(previous) = parsed.insert(field, value) {
        return Err(FormatError::range().with_message(format!(
            "conflict found: {field} {previous} differs from {field} {value} while resolving"
        )));
    }
    Ok(())
}

fn check_range(style: ResolverStyle, field: TemporalField, value: i64) -> FormatResult<i64> {
    if style == ResolverStyle::Lenient {
        return Ok(value);
    }
    field.range().check_valid(value, field)
}

fn checked_year(year: i64) -> FormatResult<i32> {
    let year = TemporalField::Year
        .range()
        .check_valid(year, TemporalField::Year)?;
    i32::try_from(year).map_err(|_| FormatError::assert())
}

fn date_from_epoch_days(days: i64) -> FormatResult<IsoDate> {
    if days.abs() > MAX_EPOCH_DAYS {
        return Err(
            FormatError::range().with_message("resolved date is outside the supported year range")
        );
    }
    let date = IsoDate::from_epoch_days(days);
    checked_year(i64::from(date.year))?;
    Ok(date)
}

impl Chronology for IsoChronology {
    fn name(&self) -> &'static str {
        "ISO"
    }

    fn date_from_fields(
        &self,
        era: Option<i64>,
        year: i64,
        month: i64,
        day: i64,
        style: ResolverStyle,
    ) -> FormatResult<IsoDate> {
        let year = match era {
            None | Some(1) => year,
            Some(0) => 1 - year,
            Some(other) => {
                return Err(FormatError::range()
                    .with_message(format!("era {other} is not a valid ISO era")))
            }
        };
        if style == ResolverStyle::Lenient {
            let months = month - 1;
            let year = checked_year(year + months.div_euclid(12))?;
            let month = (months.rem_euclid(12) + 1) as u8;
            let days = utils::epoch_days_from_date(year, month, 1) + (day - 1);
            return date_from_epoch_days(days);
        }

        let year = checked_year(year)?;
        let month = check_range(style, TemporalField::MonthOfYear, month)? as u8;
        let day = check_range(style, TemporalField::DayOfMonth, day)?;
        let last = i64::from(utils::days_in_month(year, month));
        let day = if day > last {
            if style == ResolverStyle::Strict {
                return Err(FormatError::range().with_message(format!(
                    "invalid date: day-of-month {day} is not valid for month {month} of {year}"
                )));
            }
            // Smart resolution adjusts an overflowing day down to the last
            // valid day of the month.
            last
        } else {
            day
        };
        Ok(IsoDate::new_unchecked(year, month, day as u8))
    }

    fn resolve(&self, parsed: &mut Parsed, style: ResolverStyle) -> FormatResult<()> {
        if let Some(year_of_era) = parsed.fields.get(&TemporalField::YearOfEra).copied() {
            let year_of_era = check_range(style, TemporalField::YearOfEra, year_of_era)?;
            let era = parsed.fields.get(&TemporalField::Era).copied();
            let year = match era {
                Some(1) => Some(year_of_era),
                Some(0) => Some(1 - year_of_era),
                Some(other) => {
                    return Err(FormatError::range()
                        .with_message(format!("era {other} is not a valid ISO era")))
                }
                // Without an era, strict resolution leaves the binding
                // untouched; smart and lenient assume the current era.
                None if style == ResolverStyle::Strict => None,
                None => Some(year_of_era),
            };
            if let Some(year) = year {
                parsed.fields.remove(&TemporalField::YearOfEra);
                parsed.fields.remove(&TemporalField::Era);
                add_field(parsed, TemporalField::Year, year)?;
            }
        }

        let has_year = parsed.fields.contains_key(&TemporalField::Year);
        let has_month_day = parsed.fields.contains_key(&TemporalField::MonthOfYear)
            && parsed.fields.contains_key(&TemporalField::DayOfMonth);
        let has_day_of_year = parsed.fields.contains_key(&TemporalField::DayOfYear);
        if has_year {
            if has_month_day {
                let year = parsed.fields.remove(&TemporalField::Year).unwrap_or(0);
                let month = parsed.fields.remove(&TemporalField::MonthOfYear).unwrap_or(0);
                let day = parsed.fields.remove(&TemporalField::DayOfMonth).unwrap_or(0);
                parsed.date = Some(self.date_from_fields(None, year, month, day, style)?);
            } else if has_day_of_year {
                let year = parsed.fields.remove(&TemporalField::Year).unwrap_or(0);
                let doy = parsed.fields.remove(&TemporalField::DayOfYear).unwrap_or(0);
                parsed.date = Some(if style == ResolverStyle::Lenient {
                    let year = checked_year(year)?;
                    date_from_epoch_days(utils::epoch_days_for_year(year) + (doy - 1))?
                } else {
                    let year = checked_year(year)?;
                    let doy = check_range(style, TemporalField::DayOfYear, doy)?;
                    if doy > i64::from(utils::mathematical_days_in_year(year)) {
                        return Err(FormatError::range().with_message(format!(
                            "invalid date: day-of-year {doy} is not valid for {year}"
                        )));
                    }
                    let (month, day) = utils::month_day_from_day_of_year(year, doy as u16);
                    IsoDate::new_unchecked(year, month, day)
                });
            }
        }
        Ok(())
    }
}

/// Combines the time bindings of `parsed` into a concrete time, carrying
/// whole-day overflow into the excess-days side-channel.
pub(crate) fn resolve_time(parsed: &mut Parsed, style: ResolverStyle) -> FormatResult<()> {
    if let Some(clock_hour) = parsed.fields.remove(&TemporalField::ClockHourOfDay) {
        let clock_hour = check_range(style, TemporalField::ClockHourOfDay, clock_hour)?;
        let hour = if clock_hour == 24 { 0 } else { clock_hour };
        add_field(parsed, TemporalField::HourOfDay, hour)?;
    }
    if let Some(clock_hour) = parsed.fields.remove(&TemporalField::ClockHourOfAmPm) {
        let clock_hour = check_range(style, TemporalField::ClockHourOfAmPm, clock_hour)?;
        let hour = if clock_hour == 12 { 0 } else { clock_hour };
        add_field(parsed, TemporalField::HourOfAmPm, hour)?;
    }
    if parsed.fields.contains_key(&TemporalField::AmPmOfDay)
        && parsed.fields.contains_key(&TemporalField::HourOfAmPm)
    {
        let am_pm = parsed.fields.remove(&TemporalField::AmPmOfDay).unwrap_or(0);
        let am_pm = check_range(style, TemporalField::AmPmOfDay, am_pm)?;
        let hour = parsed.fields.remove(&TemporalField::HourOfAmPm).unwrap_or(0);
        let hour = check_range(style, TemporalField::HourOfAmPm, hour)?;
        add_field(parsed, TemporalField::HourOfDay, am_pm * 12 + hour)?;
    }

    if let Some(millis) = parsed.fields.remove(&TemporalField::MilliOfDay) {
        let millis = check_range(style, TemporalField::MilliOfDay, millis)?;
        let nanos = millis.checked_mul(1_000_000).ok_or_else(|| {
            FormatError::range().with_message("milli-of-day exceeds the supported range")
        })?;
        add_field(parsed, TemporalField::NanoOfDay, nanos)?;
    }
    if let Some(nano_of_day) = parsed.fields.remove(&TemporalField::NanoOfDay) {
        let nano_of_day = check_range(style, TemporalField::NanoOfDay, nano_of_day)?;
        let ns_per_day = crate::NS_PER_DAY as i64;
        parsed.excess_days += nano_of_day.div_euclid(ns_per_day);
        let nanos = nano_of_day.rem_euclid(ns_per_day);
        add_field(parsed, TemporalField::HourOfDay, nanos / NS_PER_HOUR)?;
        add_field(parsed, TemporalField::MinuteOfHour, nanos / NS_PER_MINUTE % 60)?;
        add_field(parsed, TemporalField::SecondOfMinute, nanos / NS_PER_SECOND % 60)?;
        add_field(parsed, TemporalField::NanoOfSecond, nanos % NS_PER_SECOND)?;
    }

    if let Some(mut hour) = parsed.fields.remove(&TemporalField::HourOfDay) {
        let minute = parsed.fields.remove(&TemporalField::MinuteOfHour).unwrap_or(0);
        let second = parsed.fields.remove(&TemporalField::SecondOfMinute).unwrap_or(0);
        let nano = parsed.fields.remove(&TemporalField::NanoOfSecond).unwrap_or(0);

        if style == ResolverStyle::Lenient {
            let total = i128::from(hour) * i128::from(NS_PER_HOUR)
                + i128::from(minute) * i128::from(NS_PER_MINUTE)
                + i128::from(second) * i128::from(NS_PER_SECOND)
                + i128::from(nano);
            let days = total.div_euclid(i128::from(crate::NS_PER_DAY as i64));
            let nanos = total.rem_euclid(i128::from(crate::NS_PER_DAY as i64)) as u64;
            parsed.excess_days += i64::try_from(days).map_err(|_| {
                FormatError::range().with_message("time value exceeds the supported range")
            })?;
            parsed.time = Some(IsoTime::from_nanosecond_of_day(nanos));
        } else {
            // 24:00 denotes midnight at the end of the day.
            if style == ResolverStyle::Smart
                && hour == 24
                && minute == 0
                && second == 0
                && nano == 0
            {
                hour = 0;
                parsed.excess_days += 1;
            }
            let hour = check_range(style, TemporalField::HourOfDay, hour)?;
            let minute = check_range(style, TemporalField::MinuteOfHour, minute)?;
            let second = check_range(style, TemporalField::SecondOfMinute, second)?;
            let nano = check_range(style, TemporalField::NanoOfSecond, nano)?;
            parsed.time = Some(IsoTime::new_unchecked(
                hour as u8,
                minute as u8,
                second as u8,
                nano as u32,
            ));
        }
    }
    Ok(())
}

/// Applies the resolver-fields filter, the chronology, and the time rules.
pub(crate) fn resolve(
    parsed: &mut Parsed,
    style: ResolverStyle,
    fields: Option<FieldMap>,
    chronology: &dyn Chronology,
) -> FormatResult<()> {
    if let Some(filter) = fields {
        parsed
            .fields
            .retain(|field, _| filter.contains(FieldMap::from(*field)));
    }
    chronology.resolve(parsed, style)?;
    resolve_time(parsed, style)
}
