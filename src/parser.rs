//! The parse half of the tree walk.
//!
//! Each node receives the full text and a byte position, and returns either
//! the new position or the position the failure was detected at. Bindings
//! accumulate in a stack of [`Parsed`] frames; optional groups snapshot the
//! top frame and drop it again on failure, so an optional never surfaces an
//! error from its interior.

use std::sync::LazyLock;

use crate::fields::TemporalField;
use crate::iso::IsoDate;
use crate::node::{
    CompositeNode, FormatNode, FractionNode, OffsetNode, PadNode, ReducedNode, ValueNode,
};
use crate::options::{DecimalStyle, OffsetPattern, OffsetSeconds, SignStyle};
use crate::parsed::Parsed;
use crate::utils;

/// The internal cursor result: the new position on success, the error
/// position on failure.
pub(crate) type PosResult = Result<usize, usize>;

/// A mutable cursor for the `parse_unresolved` entry point.
///
/// On success the index advances past the consumed text; on failure the
/// index is left untouched and the error index records where parsing
/// stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParsePosition {
    index: usize,
    error_index: Option<usize>,
}

impl ParsePosition {
    /// Creates a position starting at `index`.
    #[inline]
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            error_index: None,
        }
    }

    /// The current index.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The index of the last parse failure, unset while none occurred.
    #[inline]
    #[must_use]
    pub fn error_index(&self) -> Option<usize> {
        self.error_index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_error_index(&mut self, error_index: usize) {
        self.error_index = Some(error_index);
    }
}

/// Carries the parse flags and the frame stack for one parse invocation.
pub(crate) struct ParseContext {
    pub(crate) case_sensitive: bool,
    pub(crate) strict: bool,
    pub(crate) decimal_style: DecimalStyle,
    frames: Vec<Parsed>,
}

impl ParseContext {
    pub(crate) fn new(case_sensitive: bool, strict: bool, decimal_style: DecimalStyle) -> Self {
        Self {
            case_sensitive,
            strict,
            decimal_style,
            frames: vec![Parsed::new()],
        }
    }

    fn parsed_mut(&mut self) -> &mut Parsed {
        match self.frames.last_mut() {
            Some(parsed) => parsed,
            None => unreachable!("the frame stack is never empty"),
        }
    }

    fn start_optional(&mut self) {
        let snapshot = self.frames.last().cloned().unwrap_or_default();
        self.frames.push(snapshot);
    }

    fn end_optional(&mut self, successful: bool) {
        if successful {
            let committed = self.frames.len() - 2;
            self.frames.remove(committed);
        } else {
            self.frames.pop();
        }
    }

    pub(crate) fn into_parsed(mut self) -> Parsed {
        self.frames.pop().unwrap_or_default()
    }

    /// Binds `field`, reporting `err_pos` when an earlier binding differs.
    fn set_field(
        &mut self,
        field: TemporalField,
        value: i64,
        err_pos: usize,
        success_pos: usize,
    ) -> PosResult {
        match self.parsed_mut().insert(field, value) {
            Some(_) => Err(err_pos),
            None => Ok(success_pos),
        }
    }

    fn char_equals(&self, a: char, b: char) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a == b || a.to_lowercase().eq(b.to_lowercase())
        }
    }

    /// Matches `needle` at `pos`, honoring case sensitivity. Returns the end
    /// position of the match.
    fn match_region(&self, text: &str, pos: usize, needle: &str) -> Option<usize> {
        let mut haystack = text.get(pos..)?.chars();
        let mut end = pos;
        for expected in needle.chars() {
            let found = haystack.next()?;
            if !self.char_equals(found, expected) {
                return None;
            }
            end += found.len_utf8();
        }
        Some(end)
    }
}

fn char_at(text: &str, pos: usize) -> Option<char> {
    text.get(pos..)?.chars().next()
}

fn two_digits(text: &str, pos: usize) -> Option<u8> {
    let bytes = text.as_bytes();
    match (bytes.get(pos), bytes.get(pos + 1)) {
        (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some((a - b'0') * 10 + (b - b'0'))
        }
        _ => None,
    }
}

impl FormatNode {
    pub(crate) fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        match self {
            Self::Literal(expected) => match char_at(text, pos) {
                Some(found) if ctx.char_equals(found, *expected) => Ok(pos + found.len_utf8()),
                _ => Err(pos),
            },
            Self::LiteralStr(expected) => ctx.match_region(text, pos, expected).ok_or(pos),
            Self::Value(value) => value.parse(ctx, text, pos),
            Self::Reduced(reduced) => reduced.parse(ctx, text, pos),
            Self::Fraction(fraction) => fraction.parse(ctx, text, pos),
            Self::Pad(pad) => pad.parse(ctx, text, pos),
            Self::Composite(composite) => composite.parse(ctx, text, pos),
            Self::Offset(offset) => offset.parse(ctx, text, pos),
            Self::ZoneId => parse_zone_id(ctx, text, pos),
            Self::Instant => parse_instant(ctx, text, pos),
            Self::CaseSensitive(sensitive) => {
                ctx.case_sensitive = *sensitive;
                Ok(pos)
            }
            Self::Strict(strict) => {
                ctx.strict = *strict;
                Ok(pos)
            }
        }
    }
}

impl ValueNode {
    fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        let strict = ctx.strict;
        // A group opener always scans with its declared widths: the digit
        // split of an adjacent run is the same in strict and lenient mode.
        let (eff_min, eff_max) = if self.subsequent_width > 0 || self.fixed_width || strict {
            (usize::from(self.min_width), usize::from(self.max_width))
        } else {
            (1, 15)
        };
        let style = ctx.decimal_style;
        let Some(first) = char_at(text, pos) else {
            return Err(pos);
        };

        let mut digit_start = pos;
        let mut negative = false;
        let mut positive = false;
        if first == style.positive_sign() || first == style.negative_sign() {
            positive = first == style.positive_sign();
            negative = !positive;
            if !self.sign_style.parse_allowed(positive, strict, self.fixed_width) {
                return Err(pos);
            }
            digit_start += first.len_utf8();
        }

        // Greedy digit run, capped by the node's own width plus the digits
        // reserved for the fixed-width values that follow it.
        let cap = eff_max + usize::from(self.subsequent_width);
        let mut run_len = 0usize;
        let mut run_end = digit_start;
        while run_len < cap {
            let Some(ch) = char_at(text, run_end) else {
                break;
            };
            if style.digit(ch).is_none() {
                break;
            }
            run_len += 1;
            run_end += ch.len_utf8();
        }

        let consume = if self.subsequent_width > 0 && !self.fixed_width {
            let reserved = usize::from(self.subsequent_width);
            if run_len < eff_min + reserved {
                return Err(pos);
            }
            run_len - reserved
        } else {
            run_len
        };
        if consume < eff_min {
            return Err(pos);
        }

        let mut value: i64 = 0;
        let mut end = digit_start;
        for _ in 0..consume {
            let ch = char_at(text, end).ok_or(pos)?;
            let digit = style.digit(ch).ok_or(pos)?;
            value = value * 10 + i64::from(digit);
            end += ch.len_utf8();
        }

        if strict && self.sign_style == SignStyle::ExceedsPad {
            // The sign must appear exactly when the magnitude outgrows the
            // minimum width.
            if positive && consume <= usize::from(self.min_width) {
                return Err(pos);
            }
            if !positive && !negative && consume > usize::from(self.min_width) {
                return Err(pos);
            }
        }

        if negative {
            value = -value;
        }
        ctx.set_field(self.field, value, pos, end)
    }
}

impl ReducedNode {
    fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        let (eff_min, eff_max) = if ctx.strict {
            (usize::from(self.width), usize::from(self.width))
        } else {
            (1, usize::from(self.max_width))
        };
        let style = ctx.decimal_style;
        let mut count = 0usize;
        let mut value: i64 = 0;
        let mut end = pos;
        while count < eff_max {
            let Some(ch) = char_at(text, end) else {
                break;
            };
            let Some(digit) = style.digit(ch) else {
                break;
            };
            value = value * 10 + i64::from(digit);
            count += 1;
            end += ch.len_utf8();
        }
        if count < eff_min {
            return Err(pos);
        }
        // The base cycle applies only to a full-width digit group; anything
        // longer or shorter is taken as an absolute value.
        if count == usize::from(self.width) {
            let modulus = utils::pow10(u32::from(self.width));
            let cycle = self.base_value - self.base_value.rem_euclid(modulus);
            value += cycle;
            if value < self.base_value {
                value += modulus;
            }
        }
        ctx.set_field(self.field, value, pos, end)
    }
}

impl FractionNode {
    fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        let eff_min = if ctx.strict {
            usize::from(self.min_width)
        } else {
            0
        };
        let eff_max = usize::from(self.max_width);
        let style = ctx.decimal_style;

        let mut digit_start = pos;
        let mut separator_seen = false;
        if self.decimal_point {
            match char_at(text, pos) {
                Some(ch) if ch == style.decimal_separator() => {
                    separator_seen = true;
                    digit_start += ch.len_utf8();
                }
                _ => {
                    return if eff_min > 0 { Err(pos) } else { Ok(pos) };
                }
            }
        }

        let mut count = 0usize;
        let mut digits: u64 = 0;
        let mut end = digit_start;
        while count < eff_max {
            let Some(ch) = char_at(text, end) else {
                break;
            };
            let Some(digit) = style.digit(ch) else {
                break;
            };
            digits = digits * 10 + u64::from(digit);
            count += 1;
            end += ch.len_utf8();
        }
        if count < eff_min || (count == 0 && separator_seen) {
            return Err(pos);
        }
        if count == 0 {
            return Ok(pos);
        }

        let range = self.field.range();
        let span = (i128::from(range.max()) - i128::from(range.min()) + 1) as u128;
        let scaled = u128::from(digits) * span / utils::pow10_u128(count as u32);
        let value = range.min() + scaled as i64;
        ctx.set_field(self.field, value, pos, end)
    }
}

impl PadNode {
    fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        let strict = ctx.strict;
        if pos >= text.len() {
            return Err(pos);
        }
        // The pad width counts characters, not bytes.
        let mut limit = pos;
        let mut remaining = usize::from(self.width);
        while remaining > 0 {
            match char_at(text, limit) {
                Some(ch) => {
                    limit += ch.len_utf8();
                    remaining -= 1;
                }
                None => break,
            }
        }
        if remaining > 0 && strict {
            return Err(pos);
        }

        let mut inner_start = pos;
        while inner_start < limit {
            match char_at(text, inner_start) {
                Some(ch) if ctx.char_equals(ch, self.pad_char) => inner_start += ch.len_utf8(),
                _ => break,
            }
        }
        let result = self.inner.parse(ctx, &text[..limit], inner_start)?;
        if strict && result != limit {
            return Err(pos);
        }
        Ok(result)
    }
}

impl CompositeNode {
    fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        if self.optional {
            ctx.start_optional();
            let mut current = pos;
            for node in &self.nodes {
                match node.parse(ctx, text, current) {
                    Ok(next) => current = next,
                    Err(_) => {
                        // Failures inside an optional roll back to the entry
                        // position with the previous bindings.
                        ctx.end_optional(false);
                        return Ok(pos);
                    }
                }
            }
            ctx.end_optional(true);
            Ok(current)
        } else {
            let mut current = pos;
            for node in &self.nodes {
                current = node.parse(ctx, text, current)?;
            }
            Ok(current)
        }
    }
}

impl OffsetNode {
    fn parse(&self, ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
        if !self.no_offset_text.is_empty() {
            if let Some(end) = ctx.match_region(text, pos, &self.no_offset_text) {
                return ctx.set_field(TemporalField::OffsetSeconds, 0, pos, end);
            }
        }

        let Some(sign) = char_at(text, pos) else {
            return Err(pos);
        };
        if sign != '+' && sign != '-' {
            return Err(pos);
        }
        let negative = sign == '-';
        let mut end = pos + 1;
        let Some(hours) = two_digits(text, end) else {
            return Err(pos);
        };
        end += 2;

        let mut minutes = 0u8;
        let mut seconds = 0u8;
        if self.pattern.has_minute() {
            let colon = self.pattern.uses_colon();
            if colon {
                if char_at(text, end) != Some(':') {
                    return Err(pos);
                }
                end += 1;
            }
            let Some(m) = two_digits(text, end) else {
                return Err(pos);
            };
            minutes = m;
            end += 2;

            match self.pattern.seconds() {
                OffsetSeconds::None => {}
                OffsetSeconds::Required => {
                    if colon {
                        if char_at(text, end) != Some(':') {
                            return Err(pos);
                        }
                        end += 1;
                    }
                    let Some(s) = two_digits(text, end) else {
                        return Err(pos);
                    };
                    seconds = s;
                    end += 2;
                }
                OffsetSeconds::Optional => {
                    // Consume seconds only when the full group is present.
                    if colon {
                        if char_at(text, end) == Some(':') {
                            if let Some(s) = two_digits(text, end + 1) {
                                seconds = s;
                                end += 3;
                            }
                        }
                    } else if let Some(s) = two_digits(text, end) {
                        seconds = s;
                        end += 2;
                    }
                }
            }
        }

        if minutes > 59 || seconds > 59 {
            return Err(pos);
        }
        let total =
            i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds);
        if total > 64_800 {
            return Err(pos);
        }
        let total = if negative { -total } else { total };
        ctx.set_field(TemporalField::OffsetSeconds, total, pos, end)
    }
}

fn is_zone_leading(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '.' || ch == '_'
}

fn is_zone_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '+' | '-')
}

fn parse_zone_id(ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
    let Some(first) = char_at(text, pos) else {
        return Err(pos);
    };

    if first == '+' || first == '-' {
        // An offset-style identifier such as `+02:00` or `-08:30:15`.
        let mut end = pos + 1;
        if two_digits(text, end).is_none() {
            return Err(pos);
        }
        end += 2;
        for _ in 0..2 {
            if char_at(text, end) == Some(':') && two_digits(text, end + 1).is_some() {
                end += 3;
            } else {
                break;
            }
        }
        ctx.parsed_mut().zone = Some(text[pos..end].to_string());
        return Ok(end);
    }

    if !is_zone_leading(first) {
        return Err(pos);
    }
    // A region identifier: name segments separated by '/'.
    let mut end = pos;
    loop {
        end += 1;
        while let Some(ch) = char_at(text, end) {
            if is_zone_char(ch) {
                end += 1;
            } else {
                break;
            }
        }
        if char_at(text, end) == Some('/')
            && char_at(text, end + 1).is_some_and(is_zone_leading)
        {
            end += 1;
        } else {
            break;
        }
    }
    ctx.parsed_mut().zone = Some(text[pos..end].to_string());
    Ok(end)
}

// The instant element parses a full ISO-8601 date-time with offset through a
// private tree, then folds the pieces into an epoch second.
static INSTANT_PARSER: LazyLock<FormatNode> = LazyLock::new(|| {
    let fixed = |field| ValueNode::new(field, 2, 2, SignStyle::NotNegative);
    FormatNode::Composite(CompositeNode {
        nodes: vec![
            FormatNode::Value(ValueNode::new(
                TemporalField::Year,
                4,
                10,
                SignStyle::ExceedsPad,
            )),
            FormatNode::Literal('-'),
            FormatNode::Value(fixed(TemporalField::MonthOfYear)),
            FormatNode::Literal('-'),
            FormatNode::Value(fixed(TemporalField::DayOfMonth)),
            FormatNode::Literal('T'),
            FormatNode::Value(fixed(TemporalField::HourOfDay)),
            FormatNode::Literal(':'),
            FormatNode::Value(fixed(TemporalField::MinuteOfHour)),
            FormatNode::Literal(':'),
            FormatNode::Value(fixed(TemporalField::SecondOfMinute)),
            FormatNode::Fraction(FractionNode {
                field: TemporalField::NanoOfSecond,
                min_width: 0,
                max_width: 9,
                decimal_point: true,
            }),
            FormatNode::Offset(OffsetNode {
                pattern: OffsetPattern::HourColonMinuteOptionalSecond,
                no_offset_text: "Z".to_string(),
            }),
        ],
        optional: false,
    })
});

fn parse_instant(ctx: &mut ParseContext, text: &str, pos: usize) -> PosResult {
    let mut sub = ParseContext::new(ctx.case_sensitive, ctx.strict, ctx.decimal_style);
    let end = INSTANT_PARSER.parse(&mut sub, text, pos)?;
    let inner = sub.into_parsed();
    let get = |field| inner.fields.get(&field).copied().ok_or(pos);

    let year = get(TemporalField::Year)?;
    let month = get(TemporalField::MonthOfYear)?;
    let day = get(TemporalField::DayOfMonth)?;
    let mut hour = get(TemporalField::HourOfDay)?;
    let minute = get(TemporalField::MinuteOfHour)?;
    let mut second = get(TemporalField::SecondOfMinute)?;
    let nano = inner
        .fields
        .get(&TemporalField::NanoOfSecond)
        .copied()
        .unwrap_or(0);
    let offset = get(TemporalField::OffsetSeconds)?;

    let mut excess_days = 0;
    let mut leap_second = false;
    if hour == 24 {
        if minute != 0 || second != 0 || nano != 0 {
            return Err(pos);
        }
        hour = 0;
        excess_days = 1;
    } else if second == 60 {
        leap_second = true;
        second = 59;
    }
    if hour > 23 || minute > 59 || second > 59 {
        return Err(pos);
    }

    let year = i32::try_from(year).map_err(|_| pos)?;
    let date = IsoDate::new(year, month as u8, day as u8).map_err(|_| pos)?;
    let instant = (date.to_epoch_days() + excess_days) * utils::SECS_PER_DAY
        + hour * 3600
        + minute * 60
        + second
        - offset;

    ctx.set_field(TemporalField::InstantSeconds, instant, pos, end)?;
    if leap_second {
        ctx.parsed_mut().leap_second = true;
    }
    ctx.set_field(TemporalField::NanoOfSecond, nano, pos, end)
}
