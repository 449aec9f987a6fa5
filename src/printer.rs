//! The print half of the tree walk.
//!
//! Each node appends its output to the caller's buffer. A node reports
//! `Ok(false)` when a field it needs is missing while inside an optional
//! group; outside of optional groups a missing field is an error.

use writeable::Writeable;

use crate::error::FormatError;
use crate::fields::{TemporalAccessor, TemporalField};
use crate::node::{CompositeNode, FormatNode, FractionNode, OffsetNode, ReducedNode, ValueNode};
use crate::options::{DecimalStyle, OffsetSeconds, SignStyle};
use crate::utils;
use crate::FormatResult;

/// Carries the input temporal, the formatter overrides, and the optional
/// group depth for one `format` invocation.
pub(crate) struct PrintContext<'a> {
    temporal: &'a dyn TemporalAccessor,
    zone_override: Option<&'a str>,
    decimal_style: DecimalStyle,
    optional_depth: u32,
}

impl<'a> PrintContext<'a> {
    pub(crate) fn new(
        temporal: &'a dyn TemporalAccessor,
        zone_override: Option<&'a str>,
        decimal_style: DecimalStyle,
    ) -> Self {
        Self {
            temporal,
            zone_override,
            decimal_style,
            optional_depth: 0,
        }
    }

    /// Reads a field value. Missing fields are recoverable only inside an
    /// optional group.
    fn value(&self, field: TemporalField) -> FormatResult<Option<i64>> {
        match self.temporal.get(field) {
            Some(value) => Ok(Some(value)),
            None if self.optional_depth > 0 => Ok(None),
            None => Err(FormatError::unsupported()
                .with_message(format!("unsupported field {field} on the formatted value"))),
        }
    }

    fn zone_id(&self) -> Option<&str> {
        self.zone_override.or_else(|| self.temporal.zone_id())
    }
}

/// Runs a full tree against a buffer, converting a stray recoverable miss
/// into an error.
pub(crate) fn print(
    root: &FormatNode,
    ctx: &mut PrintContext<'_>,
    buf: &mut String,
) -> FormatResult<()> {
    if root.format(ctx, buf)? {
        Ok(())
    } else {
        Err(FormatError::assert())
    }
}

// Writes into a `String` cannot fail; the conversion keeps helper signatures
// aligned with `core::fmt::Write`.
fn infallible(result: core::fmt::Result) -> FormatResult<()> {
    result.map_err(|_| FormatError::assert())
}

fn write_padded_u8<W: core::fmt::Write + ?Sized>(num: u8, sink: &mut W) -> core::fmt::Result {
    if num < 10 {
        sink.write_char('0')?;
    }
    num.write_to(sink)
}

fn digit_char(style: &DecimalStyle, digit: u8) -> char {
    char::from_u32(style.zero_digit() as u32 + u32::from(digit)).unwrap_or(style.zero_digit())
}

/// Writes `magnitude` in decimal, zero-padded on the left to `min_width`.
fn write_magnitude<W: core::fmt::Write + ?Sized>(
    magnitude: u64,
    min_width: u8,
    style: &DecimalStyle,
    sink: &mut W,
) -> core::fmt::Result {
    let digits = utils::digit_count(magnitude);
    for _ in digits..u32::from(min_width) {
        sink.write_char(style.zero_digit())?;
    }
    if style.zero_digit() == '0' {
        magnitude.write_to(sink)
    } else {
        for exp in (0..digits).rev() {
            let digit = (magnitude / 10u64.pow(exp) % 10) as u8;
            sink.write_char(digit_char(style, digit))?;
        }
        Ok(())
    }
}

fn write_iso_year<W: core::fmt::Write + ?Sized>(year: i32, sink: &mut W) -> core::fmt::Result {
    if (0..=9999).contains(&year) {
        write!(sink, "{year:04}")
    } else {
        sink.write_char(if year > 0 { '+' } else { '-' })?;
        write!(sink, "{:06}", year.unsigned_abs())
    }
}

impl FormatNode {
    pub(crate) fn format(
        &self,
        ctx: &mut PrintContext<'_>,
        buf: &mut String,
    ) -> FormatResult<bool> {
        match self {
            Self::Literal(ch) => {
                buf.push(*ch);
                Ok(true)
            }
            Self::LiteralStr(text) => {
                buf.push_str(text);
                Ok(true)
            }
            Self::Value(value) => value.format(ctx, buf),
            Self::Reduced(reduced) => reduced.format(ctx, buf),
            Self::Fraction(fraction) => fraction.format(ctx, buf),
            Self::Pad(pad) => {
                let mut scratch = String::new();
                if !pad.inner.format(ctx, &mut scratch)? {
                    return Ok(false);
                }
                let rendered = scratch.chars().count();
                for _ in rendered..usize::from(pad.width) {
                    buf.push(pad.pad_char);
                }
                buf.push_str(&scratch);
                Ok(true)
            }
            Self::Composite(composite) => composite.format(ctx, buf),
            Self::Offset(offset) => offset.format(ctx, buf),
            Self::ZoneId => match ctx.zone_id() {
                Some(zone) => {
                    buf.push_str(zone);
                    Ok(true)
                }
                None if ctx.optional_depth > 0 => Ok(false),
                None => Err(FormatError::unsupported()
                    .with_message("unable to extract a zone identifier from the formatted value")),
            },
            Self::Instant => format_instant(ctx, buf),
            Self::CaseSensitive(_) | Self::Strict(_) => Ok(true),
        }
    }
}

impl ValueNode {
    fn format(&self, ctx: &mut PrintContext<'_>, buf: &mut String) -> FormatResult<bool> {
        let Some(value) = ctx.value(self.field)? else {
            return Ok(false);
        };
        let negative = value < 0;
        let magnitude = value.unsigned_abs();
        if negative && matches!(self.sign_style, SignStyle::Never | SignStyle::NotNegative) {
            return Err(FormatError::range().with_message(format!(
                "field {} cannot be printed as the value {value} is negative",
                self.field
            )));
        }
        let style = ctx.decimal_style;
        match self.sign_style {
            SignStyle::Always => buf.push(if negative {
                style.negative_sign()
            } else {
                style.positive_sign()
            }),
            SignStyle::Normal if negative => buf.push(style.negative_sign()),
            SignStyle::ExceedsPad => {
                if negative {
                    buf.push(style.negative_sign());
                } else if utils::digit_count(magnitude) > u32::from(self.min_width) {
                    buf.push(style.positive_sign());
                }
            }
            _ => {}
        }
        infallible(write_magnitude(magnitude, self.min_width, &style, buf))?;
        Ok(true)
    }
}

impl ReducedNode {
    fn format(&self, ctx: &mut PrintContext<'_>, buf: &mut String) -> FormatResult<bool> {
        let Some(value) = ctx.value(self.field)? else {
            return Ok(false);
        };
        // Print the low-order digits of the absolute value; the base cycle
        // restores the full value on parse.
        let reduced = value.unsigned_abs() % utils::pow10(u32::from(self.width)) as u64;
        infallible(write_magnitude(reduced, self.width, &ctx.decimal_style, buf))?;
        Ok(true)
    }
}

impl FractionNode {
    fn format(&self, ctx: &mut PrintContext<'_>, buf: &mut String) -> FormatResult<bool> {
        let Some(value) = ctx.value(self.field)? else {
            return Ok(false);
        };
        let range = self.field.range();
        range.check_valid(value, self.field)?;
        let numerator = (i128::from(value) - i128::from(range.min())) as u128;
        let denominator = (i128::from(range.max()) - i128::from(range.min()) + 1) as u128;
        let mut scaled = numerator * utils::pow10_u128(u32::from(self.max_width)) / denominator;

        let mut digits = [0u8; 9];
        for slot in digits[..usize::from(self.max_width)].iter_mut().rev() {
            *slot = (scaled % 10) as u8;
            scaled /= 10;
        }
        let mut len = usize::from(self.max_width);
        while len > usize::from(self.min_width) && digits[len - 1] == 0 {
            len -= 1;
        }
        if len == 0 {
            return Ok(true);
        }
        let style = ctx.decimal_style;
        if self.decimal_point {
            buf.push(style.decimal_separator());
        }
        for digit in &digits[..len] {
            buf.push(digit_char(&style, *digit));
        }
        Ok(true)
    }
}

impl CompositeNode {
    fn format(&self, ctx: &mut PrintContext<'_>, buf: &mut String) -> FormatResult<bool> {
        if self.optional {
            ctx.optional_depth += 1;
            let checkpoint = buf.len();
            for node in &self.nodes {
                match node.format(ctx, buf) {
                    Ok(true) => {}
                    Ok(false) => {
                        // A missing field erases the group's partial output.
                        buf.truncate(checkpoint);
                        break;
                    }
                    Err(e) => {
                        ctx.optional_depth -= 1;
                        return Err(e);
                    }
                }
            }
            ctx.optional_depth -= 1;
            Ok(true)
        } else {
            for node in &self.nodes {
                if !node.format(ctx, buf)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

impl OffsetNode {
    fn format(&self, ctx: &mut PrintContext<'_>, buf: &mut String) -> FormatResult<bool> {
        let Some(total) = ctx.value(TemporalField::OffsetSeconds)? else {
            return Ok(false);
        };
        if total == 0 {
            buf.push_str(&self.no_offset_text);
            return Ok(true);
        }
        let magnitude = total.unsigned_abs();
        let hours = (magnitude / 3600 % 100) as u8;
        let minutes = (magnitude / 60 % 60) as u8;
        let seconds = (magnitude % 60) as u8;

        buf.push(if total < 0 { '-' } else { '+' });
        infallible(write_padded_u8(hours, buf))?;
        if self.pattern.has_minute() {
            let emit_seconds = match self.pattern.seconds() {
                OffsetSeconds::Required => true,
                OffsetSeconds::Optional => seconds != 0,
                OffsetSeconds::None => false,
            };
            if self.pattern.uses_colon() {
                buf.push(':');
            }
            infallible(write_padded_u8(minutes, buf))?;
            if emit_seconds {
                if self.pattern.uses_colon() {
                    buf.push(':');
                }
                infallible(write_padded_u8(seconds, buf))?;
            }
        }
        Ok(true)
    }
}

fn format_instant(ctx: &mut PrintContext<'_>, buf: &mut String) -> FormatResult<bool> {
    let Some(seconds) = ctx.value(TemporalField::InstantSeconds)? else {
        return Ok(false);
    };
    let nano = ctx.temporal.get(TemporalField::NanoOfSecond).unwrap_or(0);
    let nano = TemporalField::NanoOfSecond
        .range()
        .check_valid(nano, TemporalField::NanoOfSecond)? as u64;

    let days = seconds.div_euclid(utils::SECS_PER_DAY);
    let second_of_day = seconds.rem_euclid(utils::SECS_PER_DAY);
    let date = crate::iso::IsoDate::from_epoch_days(days);

    infallible(write_iso_year(date.year, buf))?;
    buf.push('-');
    infallible(write_padded_u8(date.month, buf))?;
    buf.push('-');
    infallible(write_padded_u8(date.day, buf))?;
    buf.push('T');
    infallible(write_padded_u8((second_of_day / 3600) as u8, buf))?;
    buf.push(':');
    infallible(write_padded_u8((second_of_day / 60 % 60) as u8, buf))?;
    buf.push(':');
    infallible(write_padded_u8((second_of_day % 60) as u8, buf))?;
    if nano > 0 {
        buf.push('.');
        let style = ctx.decimal_style;
        if nano % 1_000_000 == 0 {
            infallible(write_magnitude(nano / 1_000_000, 3, &style, buf))?;
        } else if nano % 1_000 == 0 {
            infallible(write_magnitude(nano / 1_000, 6, &style, buf))?;
        } else {
            infallible(write_magnitude(nano, 9, &style, buf))?;
        }
    }
    buf.push('Z');
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{print, PrintContext};
    use crate::error::ErrorKind;
    use crate::fields::{TemporalAccessor, TemporalField};
    use crate::iso::{IsoDate, IsoTime};
    use crate::node::{
        CompositeNode, FormatNode, FractionNode, OffsetNode, PadNode, ReducedNode, ValueNode,
    };
    use crate::options::{DecimalStyle, OffsetPattern, SignStyle};

    struct FieldValue(TemporalField, i64);

    impl TemporalAccessor for FieldValue {
        fn is_supported(&self, field: TemporalField) -> bool {
            field == self.0
        }
        fn get(&self, field: TemporalField) -> Option<i64> {
            (field == self.0).then_some(self.1)
        }
    }

    fn render(node: &FormatNode, temporal: &dyn TemporalAccessor) -> crate::FormatResult<String> {
        let mut ctx = PrintContext::new(temporal, None, DecimalStyle::STANDARD);
        let mut buf = String::new();
        print(node, &mut ctx, &mut buf)?;
        Ok(buf)
    }

    fn value_node(
        field: TemporalField,
        min: u8,
        max: u8,
        sign: SignStyle,
    ) -> FormatNode {
        FormatNode::Value(ValueNode::new(field, min, max, sign))
    }

    #[test]
    fn value_zero_padding() {
        let date = IsoDate::new(2012, 6, 30).unwrap();
        let node = value_node(TemporalField::MonthOfYear, 2, 2, SignStyle::NotNegative);
        assert_eq!(render(&node, &date).unwrap(), "06");

        let node = value_node(TemporalField::Year, 1, 15, SignStyle::Normal);
        assert_eq!(render(&node, &date).unwrap(), "2012");
    }

    #[test]
    fn value_sign_styles() {
        let year = FieldValue(TemporalField::Year, 2012);
        let negative = FieldValue(TemporalField::Year, -50);
        let large = FieldValue(TemporalField::Year, 123_456);

        let always = value_node(TemporalField::Year, 4, 15, SignStyle::Always);
        assert_eq!(render(&always, &year).unwrap(), "+2012");
        assert_eq!(render(&always, &negative).unwrap(), "-0050");

        let exceeds = value_node(TemporalField::Year, 4, 15, SignStyle::ExceedsPad);
        assert_eq!(render(&exceeds, &year).unwrap(), "2012");
        assert_eq!(render(&exceeds, &large).unwrap(), "+123456");
        assert_eq!(render(&exceeds, &negative).unwrap(), "-0050");

        let never = value_node(TemporalField::Year, 4, 15, SignStyle::Never);
        let err = render(&never, &negative).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn value_exceeding_max_width_is_not_truncated() {
        let node = value_node(TemporalField::Year, 2, 2, SignStyle::Normal);
        assert_eq!(
            render(&node, &FieldValue(TemporalField::Year, 2012)).unwrap(),
            "2012"
        );
    }

    #[test]
    fn missing_field_errors_outside_optional() {
        let node = value_node(TemporalField::HourOfDay, 2, 2, SignStyle::NotNegative);
        let date = IsoDate::new(2012, 6, 30).unwrap();
        let err = render(&node, &date).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn optional_group_suppresses_missing_fields() {
        let date = IsoDate::new(2012, 6, 30).unwrap();
        let root = FormatNode::Composite(CompositeNode {
            nodes: vec![
                value_node(TemporalField::Year, 4, 15, SignStyle::ExceedsPad),
                FormatNode::Composite(CompositeNode {
                    nodes: vec![
                        FormatNode::Literal('T'),
                        value_node(TemporalField::HourOfDay, 2, 2, SignStyle::NotNegative),
                    ],
                    optional: true,
                }),
            ],
            optional: false,
        });
        assert_eq!(render(&root, &date).unwrap(), "2012");
    }

    #[test]
    fn reduced_prints_low_order_digits() {
        let node = FormatNode::Reduced(ReducedNode {
            field: TemporalField::Year,
            width: 2,
            max_width: 2,
            base_value: 2000,
        });
        assert_eq!(
            render(&node, &FieldValue(TemporalField::Year, 2012)).unwrap(),
            "12"
        );
        assert_eq!(
            render(&node, &FieldValue(TemporalField::Year, 1950)).unwrap(),
            "50"
        );
        assert_eq!(
            render(&node, &FieldValue(TemporalField::Year, 2005)).unwrap(),
            "05"
        );
    }

    #[test]
    fn fraction_trims_trailing_zeros() {
        let node = FormatNode::Fraction(FractionNode {
            field: TemporalField::NanoOfSecond,
            min_width: 0,
            max_width: 9,
            decimal_point: true,
        });
        let time = IsoTime::new(0, 0, 0, 123_000_000).unwrap();
        assert_eq!(render(&node, &time).unwrap(), ".123");

        let zero = IsoTime::new(0, 0, 0, 0).unwrap();
        assert_eq!(render(&node, &zero).unwrap(), "");

        let node = FormatNode::Fraction(FractionNode {
            field: TemporalField::NanoOfSecond,
            min_width: 2,
            max_width: 9,
            decimal_point: true,
        });
        assert_eq!(render(&node, &zero).unwrap(), ".00");
    }

    #[test]
    fn pad_prefixes_and_never_truncates() {
        let node = FormatNode::Pad(PadNode {
            inner: Box::new(value_node(
                TemporalField::MonthOfYear,
                1,
                2,
                SignStyle::Normal,
            )),
            width: 3,
            pad_char: ' ',
        });
        let date = IsoDate::new(2012, 6, 30).unwrap();
        assert_eq!(render(&node, &date).unwrap(), "  6");

        let node = FormatNode::Pad(PadNode {
            inner: Box::new(value_node(TemporalField::Year, 1, 15, SignStyle::Normal)),
            width: 2,
            pad_char: ' ',
        });
        assert_eq!(render(&node, &date).unwrap(), "2012");
    }

    #[test]
    fn offset_layouts() {
        let offset = |pattern, text: &str| {
            FormatNode::Offset(OffsetNode {
                pattern,
                no_offset_text: text.into(),
            })
        };
        let plus = FieldValue(TemporalField::OffsetSeconds, 2 * 3600 + 30 * 60);
        let minus = FieldValue(TemporalField::OffsetSeconds, -(5 * 3600 + 45));
        let zero = FieldValue(TemporalField::OffsetSeconds, 0);

        let node = offset(OffsetPattern::HourColonMinute, "Z");
        assert_eq!(render(&node, &plus).unwrap(), "+02:30");
        assert_eq!(render(&node, &zero).unwrap(), "Z");

        let node = offset(OffsetPattern::HourMinute, "+0000");
        assert_eq!(render(&node, &plus).unwrap(), "+0230");
        assert_eq!(render(&node, &zero).unwrap(), "+0000");

        // Optional seconds appear only when non-zero.
        let node = offset(OffsetPattern::HourColonMinuteOptionalSecond, "Z");
        assert_eq!(render(&node, &plus).unwrap(), "+02:30");
        assert_eq!(render(&node, &minus).unwrap(), "-05:00:45");

        let node = offset(OffsetPattern::Hour, "Z");
        assert_eq!(render(&node, &minus).unwrap(), "-05");
    }

    #[test]
    fn zone_id_uses_override_then_value() {
        struct Zoned;
        impl TemporalAccessor for Zoned {
            fn is_supported(&self, _: TemporalField) -> bool {
                false
            }
            fn get(&self, _: TemporalField) -> Option<i64> {
                None
            }
            fn zone_id(&self) -> Option<&str> {
                Some("Europe/Paris")
            }
        }

        let mut buf = String::new();
        let mut ctx = PrintContext::new(&Zoned, None, DecimalStyle::STANDARD);
        print(&FormatNode::ZoneId, &mut ctx, &mut buf).unwrap();
        assert_eq!(buf, "Europe/Paris");

        let mut buf = String::new();
        let mut ctx = PrintContext::new(&Zoned, Some("UTC"), DecimalStyle::STANDARD);
        print(&FormatNode::ZoneId, &mut ctx, &mut buf).unwrap();
        assert_eq!(buf, "UTC");
    }

    #[test]
    fn instant_emission() {
        struct Instant(i64, i64);
        impl TemporalAccessor for Instant {
            fn is_supported(&self, field: TemporalField) -> bool {
                matches!(
                    field,
                    TemporalField::InstantSeconds | TemporalField::NanoOfSecond
                )
            }
            fn get(&self, field: TemporalField) -> Option<i64> {
                match field {
                    TemporalField::InstantSeconds => Some(self.0),
                    TemporalField::NanoOfSecond => Some(self.1),
                    _ => None,
                }
            }
        }

        let node = FormatNode::Instant;
        assert_eq!(render(&node, &Instant(0, 0)).unwrap(), "1970-01-01T00:00:00Z");
        assert_eq!(
            render(&node, &Instant(1_341_057_600, 0)).unwrap(),
            "2012-06-30T12:00:00Z"
        );
        assert_eq!(
            render(&node, &Instant(0, 123_000_000)).unwrap(),
            "1970-01-01T00:00:00.123Z"
        );
        assert_eq!(
            render(&node, &Instant(0, 123_456_789)).unwrap(),
            "1970-01-01T00:00:00.123456789Z"
        );
        assert_eq!(
            render(&node, &Instant(-1, 0)).unwrap(),
            "1969-12-31T23:59:59Z"
        );
    }
}
