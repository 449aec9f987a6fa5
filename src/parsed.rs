//! The parse intermediate: a set of field bindings and side-channels.

use rustc_hash::FxHashMap;

use crate::error::FormatError;
use crate::fields::{TemporalAccessor, TemporalField};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::FormatResult;

/// The result of a parse: field bindings plus the zone, excess-days, and
/// leap-second side-channels.
///
/// Before resolution only the raw bindings are populated. Resolution
/// combines them into an [`IsoDate`] and/or an [`IsoTime`]; whatever is not
/// consumed stays queryable through [`Parsed::get`]. A `Parsed` is itself a
/// [`TemporalAccessor`], so a parse result can be handed straight back to a
/// formatter.
#[derive(Debug, Default, Clone)]
pub struct Parsed {
    pub(crate) fields: FxHashMap<TemporalField, i64>,
    pub(crate) zone: Option<String>,
    pub(crate) date: Option<IsoDate>,
    pub(crate) time: Option<IsoTime>,
    pub(crate) leap_second: bool,
    pub(crate) excess_days: i64,
}

impl Parsed {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a field binding. Returns the previous value when it differs
    /// from the new one; storing an identical value twice is accepted.
    pub(crate) fn insert(&mut self, field: TemporalField, value: i64) -> Option<i64> {
        match self.fields.insert(field, value) {
            Some(previous) if previous != value => Some(previous),
            _ => None,
        }
    }

    /// Returns the value bound or derivable for `field`.
    #[must_use]
    pub fn get(&self, field: TemporalField) -> Option<i64> {
        if let Some(value) = self.fields.get(&field) {
            return Some(*value);
        }
        if let Some(value) = self.date.as_ref().and_then(|date| date.get(field)) {
            return Some(value);
        }
        self.time.as_ref().and_then(|time| time.get(field))
    }

    /// Returns the parsed time zone identifier, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Returns the days carried over by normalizing hour 24 or an oversized
    /// time value.
    #[must_use]
    pub fn excess_days(&self) -> i64 {
        self.excess_days
    }

    /// Returns whether a leap second (second-of-minute 60) was seen.
    #[must_use]
    pub fn leap_second(&self) -> bool {
        self.leap_second
    }

    /// Projects the resolved calendar date.
    pub fn to_date(&self) -> FormatResult<IsoDate> {
        self.date.ok_or_else(|| {
            FormatError::unsupported().with_message("parsed value does not contain a date.")
        })
    }

    /// Projects the resolved wall-clock time.
    pub fn to_time(&self) -> FormatResult<IsoTime> {
        self.time.ok_or_else(|| {
            FormatError::unsupported().with_message("parsed value does not contain a time.")
        })
    }

    /// Projects the resolved date and time.
    pub fn to_date_time(&self) -> FormatResult<IsoDateTime> {
        Ok(IsoDateTime::new(self.to_date()?, self.to_time()?))
    }
}

impl TemporalAccessor for Parsed {
    fn is_supported(&self, field: TemporalField) -> bool {
        self.get(field).is_some()
    }

    fn get(&self, field: TemporalField) -> Option<i64> {
        Parsed::get(self, field)
    }

    fn zone_id(&self) -> Option<&str> {
        self.zone.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::Parsed;
    use crate::fields::TemporalField;
    use crate::iso::{IsoDate, IsoTime};

    #[test]
    fn insert_detects_conflicts() {
        let mut parsed = Parsed::new();
        assert_eq!(parsed.insert(TemporalField::MonthOfYear, 6), None);
        assert_eq!(parsed.insert(TemporalField::MonthOfYear, 6), None);
        assert_eq!(parsed.insert(TemporalField::MonthOfYear, 7), Some(6));
    }

    #[test]
    fn get_falls_back_to_resolved_values() {
        let mut parsed = Parsed::new();
        parsed.date = Some(IsoDate::new(2012, 6, 30).unwrap());
        parsed.time = Some(IsoTime::new(13, 30, 0, 0).unwrap());
        parsed.fields.insert(TemporalField::OffsetSeconds, 3600);

        assert_eq!(parsed.get(TemporalField::Year), Some(2012));
        assert_eq!(parsed.get(TemporalField::HourOfDay), Some(13));
        assert_eq!(parsed.get(TemporalField::OffsetSeconds), Some(3600));
        assert_eq!(parsed.get(TemporalField::InstantSeconds), None);
    }

    #[test]
    fn projections_require_resolution() {
        let parsed = Parsed::new();
        assert!(parsed.to_date().is_err());
        assert!(parsed.to_time().is_err());

        let mut resolved = Parsed::new();
        resolved.date = Some(IsoDate::new(2012, 6, 30).unwrap());
        assert!(resolved.to_date().is_ok());
        assert!(resolved.to_date_time().is_err());
    }
}
