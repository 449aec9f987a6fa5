//! The formatter façade.
//!
//! A `DateTimeFormatter` is an immutable bundle of a node tree and the
//! resolution settings. It is freely shareable; every `format` and `parse`
//! call allocates its own context.

use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;

use writeable::Writeable;

use crate::builder::DateTimeFormatterBuilder;
use crate::error::{abbreviate, DateTimeParseError, FormatError};
use crate::fields::{FieldMap, TemporalAccessor, TemporalField};
use crate::node::FormatNode;
use crate::options::{DecimalStyle, ResolverStyle, SignStyle};
use crate::parsed::Parsed;
use crate::parser::{ParseContext, ParsePosition};
use crate::printer::{print, PrintContext};
use crate::resolver::{self, Chronology, ISO};
use crate::FormatResult;

/// A prepared formatter for printing and parsing temporal values.
#[derive(Debug, Clone)]
pub struct DateTimeFormatter {
    root: FormatNode,
    resolver_style: ResolverStyle,
    resolver_fields: Option<FieldMap>,
    chronology: Option<&'static dyn Chronology>,
    zone: Option<String>,
    decimal_style: DecimalStyle,
}

impl DateTimeFormatter {
    pub(crate) fn new(root: FormatNode) -> Self {
        Self {
            root,
            resolver_style: ResolverStyle::Smart,
            resolver_fields: None,
            chronology: None,
            zone: None,
            decimal_style: DecimalStyle::STANDARD,
        }
    }

    pub(crate) fn root(&self) -> &FormatNode {
        &self.root
    }

    /// Compiles a letter pattern into a formatter.
    pub fn from_pattern(pattern: &str) -> FormatResult<Self> {
        let mut builder = DateTimeFormatterBuilder::new();
        builder.append_pattern(pattern)?;
        Ok(builder.to_formatter())
    }

    /// The style applied when resolving parsed fields.
    #[must_use]
    pub fn resolver_style(&self) -> ResolverStyle {
        self.resolver_style
    }

    /// The set of fields participating in resolution, if restricted.
    #[must_use]
    pub fn resolver_fields(&self) -> Option<FieldMap> {
        self.resolver_fields
    }

    /// The override chronology, if any.
    #[must_use]
    pub fn chronology(&self) -> Option<&'static dyn Chronology> {
        self.chronology
    }

    /// The override zone identifier, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Returns a copy with the given resolver style.
    #[must_use]
    pub fn with_resolver_style(&self, resolver_style: ResolverStyle) -> Self {
        let mut copy = self.clone();
        copy.resolver_style = resolver_style;
        copy
    }

    /// Returns a copy resolving only the given fields.
    #[must_use]
    pub fn with_resolver_fields(&self, resolver_fields: FieldMap) -> Self {
        let mut copy = self.clone();
        copy.resolver_fields = Some(resolver_fields);
        copy
    }

    /// Returns a copy using the given chronology. Setting the chronology
    /// already in use returns the formatter unchanged.
    #[must_use]
    pub fn with_chronology(&self, chronology: &'static dyn Chronology) -> Self {
        if let Some(current) = self.chronology {
            if core::ptr::addr_eq(current as *const dyn Chronology, chronology) {
                return self.clone();
            }
        }
        let mut copy = self.clone();
        copy.chronology = Some(chronology);
        copy
    }

    /// Returns a copy using the given zone identifier.
    #[must_use]
    pub fn with_zone(&self, zone: &str) -> Self {
        let mut copy = self.clone();
        copy.zone = Some(zone.to_string());
        copy
    }

    /// Returns a copy using the given decimal symbols.
    #[must_use]
    pub fn with_decimal_style(&self, decimal_style: DecimalStyle) -> Self {
        let mut copy = self.clone();
        copy.decimal_style = decimal_style;
        copy
    }

    /// Formats a temporal value into a new string.
    pub fn format(&self, temporal: &dyn TemporalAccessor) -> FormatResult<String> {
        let mut buf = String::new();
        self.format_to(temporal, &mut buf)?;
        Ok(buf)
    }

    /// Formats a temporal value into the given buffer. On error the buffer
    /// may hold partial output that the caller should discard.
    pub fn format_to(&self, temporal: &dyn TemporalAccessor, buf: &mut String) -> FormatResult<()> {
        let mut ctx = PrintContext::new(temporal, self.zone.as_deref(), self.decimal_style);
        print(&self.root, &mut ctx, buf)
    }

    /// Parses text into raw field bindings without resolving them.
    ///
    /// On success the position index advances past the consumed text and the
    /// bindings are returned; the text past the index is not required to be
    /// consumed. On failure `None` is returned, the index is unchanged, and
    /// the error index records where parsing stopped.
    pub fn parse_unresolved(&self, text: &str, position: &mut ParsePosition) -> Option<Parsed> {
        let mut ctx = ParseContext::new(true, true, self.decimal_style);
        match self.root.parse(&mut ctx, text, position.index()) {
            Ok(end) => {
                position.set_index(end);
                Some(ctx.into_parsed())
            }
            Err(error_index) => {
                position.set_error_index(error_index);
                None
            }
        }
    }

    /// Parses the whole text and resolves the bindings.
    pub fn parse(&self, text: &str) -> Result<Parsed, DateTimeParseError> {
        let mut ctx = ParseContext::new(true, true, self.decimal_style);
        let end = self.root.parse(&mut ctx, text, 0).map_err(|error_index| {
            DateTimeParseError::new(
                format!(
                    "Text '{}' could not be parsed at index {error_index}",
                    abbreviate(text)
                ),
                text,
                error_index,
                None,
            )
        })?;
        if end < text.len() {
            return Err(DateTimeParseError::new(
                format!(
                    "Text '{}' could not be parsed, unparsed text found at index {end}",
                    abbreviate(text)
                ),
                text,
                end,
                None,
            ));
        }
        let mut parsed = ctx.into_parsed();
        if parsed.zone.is_none() {
            parsed.zone.clone_from(&self.zone);
        }
        let chronology = self.chronology.unwrap_or(&ISO);
        resolver::resolve(
            &mut parsed,
            self.resolver_style,
            self.resolver_fields,
            chronology,
        )
        .map_err(|cause| {
            DateTimeParseError::new(
                format!("Text '{}' could not be parsed: {cause}", abbreviate(text)),
                text,
                0,
                Some(cause),
            )
        })?;
        Ok(parsed)
    }
}

impl fmt::Display for DateTimeFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = self.root.write_to_string();
        let trimmed = description
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(description.as_ref());
        f.write_str(trimmed)
    }
}

impl FromStr for DateTimeFormatter {
    type Err = FormatError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        Self::from_pattern(pattern)
    }
}

// ==== Well-known formatters ====

/// The ISO-8601 extended local date, `2012-06-30`.
pub static ISO_LOCAL_DATE: LazyLock<DateTimeFormatter> = LazyLock::new(|| {
    let mut builder = DateTimeFormatterBuilder::new();
    builder
        .append_value_range(TemporalField::Year, 4, 10, SignStyle::ExceedsPad)
        .expect("the ISO date layout is valid")
        .append_literal('-');
    builder
        .append_value_fixed(TemporalField::MonthOfYear, 2)
        .expect("the ISO date layout is valid")
        .append_literal('-');
    builder
        .append_value_fixed(TemporalField::DayOfMonth, 2)
        .expect("the ISO date layout is valid");
    builder
        .to_formatter()
        .with_resolver_style(ResolverStyle::Strict)
        .with_chronology(&ISO)
});

/// The ISO-8601 extended local time, `13:30:59.123`.
pub static ISO_LOCAL_TIME: LazyLock<DateTimeFormatter> = LazyLock::new(|| {
    let mut builder = DateTimeFormatterBuilder::new();
    builder
        .append_value_fixed(TemporalField::HourOfDay, 2)
        .expect("the ISO time layout is valid")
        .append_literal(':');
    builder
        .append_value_fixed(TemporalField::MinuteOfHour, 2)
        .expect("the ISO time layout is valid")
        .optional_start()
        .append_literal(':');
    builder
        .append_value_fixed(TemporalField::SecondOfMinute, 2)
        .expect("the ISO time layout is valid")
        .optional_start();
    builder
        .append_fraction(TemporalField::NanoOfSecond, 0, 9, true)
        .expect("the ISO time layout is valid");
    builder
        .to_formatter()
        .with_resolver_style(ResolverStyle::Strict)
});

/// The ISO-8601 extended local date-time, `2012-06-30T13:30:59`.
pub static ISO_LOCAL_DATE_TIME: LazyLock<DateTimeFormatter> = LazyLock::new(|| {
    let mut builder = DateTimeFormatterBuilder::new();
    builder
        .append(&ISO_LOCAL_DATE)
        .append_literal('T')
        .append(&ISO_LOCAL_TIME);
    builder
        .to_formatter()
        .with_resolver_style(ResolverStyle::Strict)
        .with_chronology(&ISO)
});

/// The ISO-8601 instant, `2012-06-30T12:00:00Z`.
pub static ISO_INSTANT: LazyLock<DateTimeFormatter> = LazyLock::new(|| {
    let mut builder = DateTimeFormatterBuilder::new();
    builder.append_instant();
    builder
        .to_formatter()
        .with_resolver_style(ResolverStyle::Strict)
});

#[cfg(test)]
mod tests {
    use super::{
        DateTimeFormatter, ISO_INSTANT, ISO_LOCAL_DATE, ISO_LOCAL_DATE_TIME, ISO_LOCAL_TIME,
    };
    use crate::builder::DateTimeFormatterBuilder;
    use crate::error::ErrorKind;
    use crate::fields::TemporalField;
    use crate::iso::{IsoDate, IsoDateTime, IsoTime};
    use crate::options::{ResolverStyle, SignStyle};
    use crate::parser::ParsePosition;

    #[test]
    fn iso_local_date_round_trip() {
        let date = IsoDate::new(2012, 6, 30).unwrap();
        assert_eq!(ISO_LOCAL_DATE.format(&date).unwrap(), "2012-06-30");

        let parsed = ISO_LOCAL_DATE.parse("2012-06-30").unwrap();
        assert_eq!(parsed.get(TemporalField::Year), Some(2012));
        assert_eq!(parsed.get(TemporalField::MonthOfYear), Some(6));
        assert_eq!(parsed.get(TemporalField::DayOfMonth), Some(30));
        assert_eq!(parsed.to_date().unwrap(), date);

        // A parse result is itself formattable.
        assert_eq!(ISO_LOCAL_DATE.format(&parsed).unwrap(), "2012-06-30");
    }

    #[test]
    fn adjacent_parsing_through_the_builder() {
        let mut builder = DateTimeFormatterBuilder::new();
        builder
            .append_value_range(TemporalField::MonthOfYear, 1, 2, SignStyle::Normal)
            .unwrap()
            .append_value_fixed(TemporalField::DayOfMonth, 2)
            .unwrap();
        let formatter = builder.to_formatter();

        let mut position = ParsePosition::new(0);
        let parsed = formatter.parse_unresolved("123", &mut position).unwrap();
        assert_eq!(position.index(), 3);
        assert_eq!(parsed.get(TemporalField::MonthOfYear), Some(1));
        assert_eq!(parsed.get(TemporalField::DayOfMonth), Some(23));

        let mut position = ParsePosition::new(0);
        let parsed = formatter.parse_unresolved("0123", &mut position).unwrap();
        assert_eq!(position.index(), 4);
        assert_eq!(parsed.get(TemporalField::MonthOfYear), Some(1));
        assert_eq!(parsed.get(TemporalField::DayOfMonth), Some(23));
    }

    #[test]
    fn adjacent_year_month_day_parse() {
        let mut builder = DateTimeFormatterBuilder::new();
        builder
            .append_value_range(TemporalField::Year, 4, 10, SignStyle::ExceedsPad)
            .unwrap()
            .append_value_fixed(TemporalField::MonthOfYear, 2)
            .unwrap()
            .append_value_fixed(TemporalField::DayOfMonth, 2)
            .unwrap();
        let formatter = builder.to_formatter();

        let parsed = formatter.parse("20090630").unwrap();
        assert_eq!(parsed.to_date().unwrap(), IsoDate::new(2009, 6, 30).unwrap());
    }

    #[test]
    fn reduced_year_parse() {
        let mut builder = DateTimeFormatterBuilder::new();
        builder
            .append_value_reduced(TemporalField::Year, 2, 2, 2000)
            .unwrap();
        let formatter = builder.to_formatter();

        assert_eq!(
            formatter.parse("12").unwrap().get(TemporalField::Year),
            Some(2012)
        );
        assert_eq!(
            formatter.parse("99").unwrap().get(TemporalField::Year),
            Some(2099)
        );
    }

    #[test]
    fn optional_pattern_description_and_parses() {
        let formatter = DateTimeFormatter::from_pattern("uuuu[-MM[-dd]]").unwrap();
        assert_eq!(
            formatter.to_string(),
            "Value(Year,4,15,EXCEEDS_PAD)['-'Value(MonthOfYear,2)['-'Value(DayOfMonth,2)]]"
        );

        for text in ["2012", "2012-06", "2012-06-30"] {
            assert!(formatter.parse(text).is_ok(), "input {text}");
        }
        assert_eq!(
            formatter
                .parse("2012-06-30")
                .unwrap()
                .to_date()
                .unwrap(),
            IsoDate::new(2012, 6, 30).unwrap()
        );
    }

    #[test]
    fn optional_soundness() {
        let formatter = DateTimeFormatter::from_pattern("HH[:mm]").unwrap();

        let mut position = ParsePosition::new(0);
        let parsed = formatter.parse_unresolved("12:30", &mut position).unwrap();
        assert_eq!(position.index(), 5);
        assert_eq!(parsed.get(TemporalField::MinuteOfHour), Some(30));

        let mut position = ParsePosition::new(0);
        let parsed = formatter.parse_unresolved("12", &mut position).unwrap();
        assert_eq!(position.index(), 2);
        assert_eq!(parsed.get(TemporalField::MinuteOfHour), None);

        // The optional consumes nothing when its interior fails part-way.
        let mut position = ParsePosition::new(0);
        let parsed = formatter.parse_unresolved("12:x", &mut position).unwrap();
        assert_eq!(position.index(), 2);
        assert_eq!(parsed.get(TemporalField::MinuteOfHour), None);
    }

    #[test]
    fn parse_position_contract() {
        let formatter = DateTimeFormatter::from_pattern("uuuu").unwrap();

        let mut position = ParsePosition::new(1);
        let parsed = formatter.parse_unresolved("x2012", &mut position).unwrap();
        assert_eq!(position.index(), 5);
        assert_eq!(position.error_index(), None);
        assert_eq!(parsed.get(TemporalField::Year), Some(2012));

        let mut position = ParsePosition::new(0);
        assert!(formatter.parse_unresolved("xx", &mut position).is_none());
        assert_eq!(position.index(), 0);
        assert_eq!(position.error_index(), Some(0));
    }

    #[test]
    fn parse_requires_full_consumption() {
        let err = ISO_LOCAL_DATE.parse("2012-06-30x").unwrap_err();
        assert_eq!(err.error_index(), 10);
        assert!(err
            .to_string()
            .contains("unparsed text found at index 10"));

        let err = ISO_LOCAL_DATE.parse("2012x06-30").unwrap_err();
        assert_eq!(err.error_index(), 4);
        assert!(err.to_string().contains("could not be parsed at index 4"));
    }

    #[test]
    fn parse_error_abbreviates_long_text() {
        let text = format!("2012-06-30{}", "x".repeat(80));
        let err = ISO_LOCAL_DATE.parse(&text).unwrap_err();
        assert!(err.to_string().contains("..."));
        assert_eq!(err.text(), text);
    }

    #[test]
    fn resolver_failures_carry_a_cause() {
        let err = ISO_LOCAL_DATE.parse("2012-13-01").unwrap_err();
        let cause = err.cause().expect("a resolver failure has a cause");
        assert_eq!(cause.kind(), ErrorKind::Range);
        assert!(err.to_string().contains("could not be parsed:"));
    }

    #[test]
    fn smart_resolution_through_a_pattern_formatter() {
        let formatter = DateTimeFormatter::from_pattern("uuuu-MM-dd").unwrap();
        assert_eq!(formatter.resolver_style(), ResolverStyle::Smart);
        let parsed = formatter.parse("2012-04-31").unwrap();
        assert_eq!(parsed.to_date().unwrap(), IsoDate::new(2012, 4, 30).unwrap());

        let strict = formatter.with_resolver_style(ResolverStyle::Strict);
        assert!(strict.parse("2012-04-31").is_err());
    }

    #[test]
    fn iso_local_time_formats_and_parses() {
        let time = IsoTime::new(13, 30, 59, 123_000_000).unwrap();
        assert_eq!(ISO_LOCAL_TIME.format(&time).unwrap(), "13:30:59.123");

        let short = IsoTime::new(13, 30, 0, 0).unwrap();
        assert_eq!(ISO_LOCAL_TIME.format(&short).unwrap(), "13:30:00");

        let parsed = ISO_LOCAL_TIME.parse("13:30:59.123").unwrap();
        assert_eq!(parsed.to_time().unwrap(), time);
        let parsed = ISO_LOCAL_TIME.parse("13:30").unwrap();
        assert_eq!(parsed.to_time().unwrap(), IsoTime::new(13, 30, 0, 0).unwrap());
    }

    #[test]
    fn iso_local_date_time_round_trip() {
        let value = IsoDateTime::new(
            IsoDate::new(2012, 6, 30).unwrap(),
            IsoTime::new(13, 30, 59, 0).unwrap(),
        );
        let text = ISO_LOCAL_DATE_TIME.format(&value).unwrap();
        assert_eq!(text, "2012-06-30T13:30:59");
        let parsed = ISO_LOCAL_DATE_TIME.parse(&text).unwrap();
        assert_eq!(parsed.to_date_time().unwrap(), value);
    }

    #[test]
    fn iso_instant_round_trip_and_leap_second() {
        let parsed = ISO_INSTANT.parse("2012-06-30T12:00:00Z").unwrap();
        assert_eq!(
            parsed.get(TemporalField::InstantSeconds),
            Some(1_341_057_600)
        );
        assert_eq!(
            ISO_INSTANT.format(&parsed).unwrap(),
            "2012-06-30T12:00:00Z"
        );

        let leap = ISO_INSTANT.parse("2012-06-30T23:59:60Z").unwrap();
        assert!(leap.leap_second());
        assert_eq!(
            leap.get(TemporalField::InstantSeconds),
            Some(1_341_100_799)
        );
    }

    #[test]
    fn formatter_descriptions_are_deterministic() {
        let first = DateTimeFormatter::from_pattern("uuuu-MM-dd['T'HH:mm]").unwrap();
        let second = DateTimeFormatter::from_pattern("uuuu-MM-dd['T'HH:mm]").unwrap();
        assert_eq!(first.to_string(), second.to_string());

        assert_eq!(
            DateTimeFormatter::from_pattern("uuuu").unwrap().to_string(),
            "Value(Year,4,15,EXCEEDS_PAD)"
        );
    }

    #[test]
    fn from_str_compiles_patterns() {
        let formatter: DateTimeFormatter = "uuuu-MM-dd".parse().unwrap();
        let date = IsoDate::new(2012, 6, 30).unwrap();
        assert_eq!(formatter.format(&date).unwrap(), "2012-06-30");
        assert!("MMMMMM".parse::<DateTimeFormatter>().is_err());
    }

    #[test]
    fn zone_override_applies_to_parse_and_format() {
        let formatter = DateTimeFormatter::from_pattern("uuuu-MM-dd")
            .unwrap()
            .with_zone("Europe/Paris");
        let parsed = formatter.parse("2012-06-30").unwrap();
        assert_eq!(parsed.zone(), Some("Europe/Paris"));

        let mut builder = DateTimeFormatterBuilder::new();
        builder.append_zone_id();
        let zoned = builder.to_formatter().with_zone("Europe/Paris");
        let date = IsoDate::new(2012, 6, 30).unwrap();
        assert_eq!(zoned.format(&date).unwrap(), "Europe/Paris");
    }

    #[test]
    fn excess_days_surface_on_the_result() {
        let formatter = DateTimeFormatter::from_pattern("HH:mm").unwrap();
        let parsed = formatter.parse("24:00").unwrap();
        assert_eq!(parsed.excess_days(), 1);
        assert_eq!(
            parsed.to_time().unwrap(),
            IsoTime::new(0, 0, 0, 0).unwrap()
        );
    }
}
