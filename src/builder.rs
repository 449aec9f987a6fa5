//! The builder DSL that composes printer/parser nodes into a formatter.

mod pattern;

use crate::error::FormatError;
use crate::fields::TemporalField;
use crate::formatter::DateTimeFormatter;
use crate::iso::IsoDate;
use crate::node::{
    CompositeNode, FormatNode, FractionNode, OffsetNode, PadNode, ReducedNode, ValueNode,
};
use crate::options::{OffsetPattern, SignStyle};
use crate::FormatResult;

/// One nesting level of the builder: the root sequence or an open optional
/// group.
#[derive(Debug)]
struct BuilderFrame {
    nodes: Vec<FormatNode>,
    pad_width: u8,
    pad_char: char,
    /// Index of the variable-width value currently collecting adjacent
    /// fixed-width values, if any.
    value_index: Option<usize>,
}

impl BuilderFrame {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            pad_width: 0,
            pad_char: ' ',
            value_index: None,
        }
    }
}

/// Builds a [`DateTimeFormatter`] from a sequence of appended elements.
///
/// The builder is single-threaded scratch state; the formatter it produces
/// is an immutable value.
#[derive(Debug)]
pub struct DateTimeFormatterBuilder {
    frames: Vec<BuilderFrame>,
}

impl Default for DateTimeFormatterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DateTimeFormatterBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![BuilderFrame::new()],
        }
    }

    fn frame_mut(&mut self) -> &mut BuilderFrame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => unreachable!("the builder frame stack is never empty"),
        }
    }

    /// Appends a node, applying a pending pad and closing any open adjacent
    /// value group.
    fn append_node(&mut self, node: FormatNode) {
        let frame = self.frame_mut();
        let node = if frame.pad_width > 0 {
            let wrapped = FormatNode::Pad(PadNode {
                inner: Box::new(node),
                width: frame.pad_width,
                pad_char: frame.pad_char,
            });
            frame.pad_width = 0;
            frame.pad_char = ' ';
            wrapped
        } else {
            node
        };
        frame.value_index = None;
        frame.nodes.push(node);
    }

    /// Appends a numeric value node, maintaining adjacent value groups: a
    /// variable-width value opens a group, fixed-width values extend it and
    /// are marked to consume exactly their width.
    fn append_value_node(&mut self, node: ValueNode) {
        if self.frames.last().is_some_and(|frame| frame.pad_width > 0) {
            self.append_node(FormatNode::Value(node));
            return;
        }
        let frame = self.frame_mut();
        let fixed = node.min_width == node.max_width && node.sign_style == SignStyle::NotNegative;
        if fixed {
            if let Some(index) = frame.value_index {
                match &mut frame.nodes[index] {
                    FormatNode::Value(base) => {
                        base.subsequent_width += u16::from(node.max_width);
                    }
                    _ => unreachable!("the active value index always points at a value node"),
                }
                frame.nodes.push(FormatNode::Value(node.with_fixed_width()));
                return;
            }
            frame.value_index = None;
            frame.nodes.push(FormatNode::Value(node));
        } else {
            frame.nodes.push(FormatNode::Value(node));
            frame.value_index = Some(frame.nodes.len() - 1);
        }
    }

    fn check_width(width: u8, what: &str) -> FormatResult<()> {
        if !(1..=15).contains(&width) {
            return Err(FormatError::argument().with_message(format!(
                "the {what} width must be from 1 to 15 inclusive but was {width}"
            )));
        }
        Ok(())
    }

    /// Appends a literal character.
    pub fn append_literal(&mut self, literal: char) -> &mut Self {
        self.append_node(FormatNode::Literal(literal));
        self
    }

    /// Appends a literal string. An empty string is a no-op.
    pub fn append_literal_str(&mut self, literal: &str) -> &mut Self {
        let mut chars = literal.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {}
            (Some(only), None) => {
                self.append_node(FormatNode::Literal(only));
            }
            _ => self.append_node(FormatNode::LiteralStr(literal.to_string())),
        }
        self
    }

    /// Appends a variable-width value, one to fifteen digits with a sign
    /// only when negative.
    pub fn append_value(&mut self, field: TemporalField) -> &mut Self {
        self.append_value_node(ValueNode::new(field, 1, 15, SignStyle::Normal));
        self
    }

    /// Appends a fixed-width, zero-padded, non-negative value.
    pub fn append_value_fixed(&mut self, field: TemporalField, width: u8) -> FormatResult<&mut Self> {
        Self::check_width(width, "value")?;
        self.append_value_node(ValueNode::new(field, width, width, SignStyle::NotNegative));
        Ok(self)
    }

    /// Appends a value with explicit width bounds and sign style.
    pub fn append_value_range(
        &mut self,
        field: TemporalField,
        min_width: u8,
        max_width: u8,
        sign_style: SignStyle,
    ) -> FormatResult<&mut Self> {
        if min_width == max_width && sign_style == SignStyle::NotNegative {
            return self.append_value_fixed(field, min_width);
        }
        Self::check_width(min_width, "minimum")?;
        Self::check_width(max_width, "maximum")?;
        if min_width > max_width {
            return Err(FormatError::argument().with_message(format!(
                "the maximum width must exceed or equal the minimum width but {max_width} < {min_width}"
            )));
        }
        self.append_value_node(ValueNode::new(field, min_width, max_width, sign_style));
        Ok(self)
    }

    /// Appends a fixed-width value holding the low-order digits of the
    /// field, anchored to the cycle containing `base_value`.
    pub fn append_value_reduced(
        &mut self,
        field: TemporalField,
        width: u8,
        max_width: u8,
        base_value: i64,
    ) -> FormatResult<&mut Self> {
        if !(1..=10).contains(&width) {
            return Err(FormatError::argument().with_message(format!(
                "the width must be from 1 to 10 inclusive but was {width}"
            )));
        }
        if !(width..=10).contains(&max_width) {
            return Err(FormatError::argument().with_message(format!(
                "the maximum width must be from {width} to 10 inclusive but was {max_width}"
            )));
        }
        self.append_node(FormatNode::Reduced(ReducedNode {
            field,
            width,
            max_width,
            base_value,
        }));
        Ok(self)
    }

    /// As [`append_value_reduced`](Self::append_value_reduced), anchored to
    /// the year of `base_date`.
    pub fn append_value_reduced_date(
        &mut self,
        field: TemporalField,
        width: u8,
        max_width: u8,
        base_date: IsoDate,
    ) -> FormatResult<&mut Self> {
        self.append_value_reduced(field, width, max_width, i64::from(base_date.year))
    }

    /// Appends the fractional part of a fixed-range field.
    pub fn append_fraction(
        &mut self,
        field: TemporalField,
        min_width: u8,
        max_width: u8,
        decimal_point: bool,
    ) -> FormatResult<&mut Self> {
        if min_width > 9 || max_width > 9 {
            return Err(FormatError::argument().with_message(format!(
                "fraction widths must be from 0 to 9 inclusive but were {min_width} and {max_width}"
            )));
        }
        if min_width > max_width {
            return Err(FormatError::argument().with_message(format!(
                "the maximum width must exceed or equal the minimum width but {max_width} < {min_width}"
            )));
        }
        if !field.range().is_fixed() {
            return Err(FormatError::argument().with_message(format!(
                "the field must have a fixed value range to be formatted as a fraction: {field}"
            )));
        }
        self.append_node(FormatNode::Fraction(FractionNode {
            field,
            min_width,
            max_width,
            decimal_point,
        }));
        Ok(self)
    }

    /// Appends a UTC offset element using one of the fixed layouts, with the
    /// text to emit for a zero offset.
    pub fn append_offset(&mut self, pattern: &str, no_offset_text: &str) -> FormatResult<&mut Self> {
        let pattern: OffsetPattern = pattern.parse()?;
        self.append_node(FormatNode::Offset(OffsetNode {
            pattern,
            no_offset_text: no_offset_text.to_string(),
        }));
        Ok(self)
    }

    /// Appends the ISO-8601 offset element, `+HH:MM:ss` with `Z` for zero.
    pub fn append_offset_id(&mut self) -> &mut Self {
        self.append_node(FormatNode::Offset(OffsetNode {
            pattern: OffsetPattern::HourColonMinuteOptionalSecond,
            no_offset_text: "Z".to_string(),
        }));
        self
    }

    /// Appends a time zone identifier element.
    pub fn append_zone_id(&mut self) -> &mut Self {
        self.append_node(FormatNode::ZoneId);
        self
    }

    /// Appends an ISO-8601 instant element.
    pub fn append_instant(&mut self) -> &mut Self {
        self.append_node(FormatNode::Instant);
        self
    }

    /// Pads the next appended element to `width` characters with spaces.
    pub fn pad_next(&mut self, width: u8) -> FormatResult<&mut Self> {
        self.pad_next_with(width, ' ')
    }

    /// Pads the next appended element to `width` characters with `pad_char`.
    pub fn pad_next_with(&mut self, width: u8, pad_char: char) -> FormatResult<&mut Self> {
        if width < 1 {
            return Err(FormatError::argument()
                .with_message(format!("the pad width must be at least one but was {width}")));
        }
        let frame = self.frame_mut();
        frame.pad_width = width;
        frame.pad_char = pad_char;
        Ok(self)
    }

    /// Opens an optional group; everything appended until the matching
    /// [`optional_end`](Self::optional_end) may be recovered from on parse.
    pub fn optional_start(&mut self) -> &mut Self {
        self.frames.push(BuilderFrame::new());
        self
    }

    /// Closes the innermost optional group.
    pub fn optional_end(&mut self) -> FormatResult<&mut Self> {
        if self.frames.len() == 1 {
            return Err(FormatError::state().with_message(
                "cannot call optional_end as there was no previous call to optional_start",
            ));
        }
        self.close_optional();
        Ok(self)
    }

    fn close_optional(&mut self) {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => unreachable!("the builder frame stack is never empty"),
        };
        if !frame.nodes.is_empty() {
            self.append_node(FormatNode::Composite(CompositeNode {
                nodes: frame.nodes,
                optional: true,
            }));
        }
    }

    /// Makes literal and offset-text matching case sensitive from this point
    /// on. This is the default.
    pub fn parse_case_sensitive(&mut self) -> &mut Self {
        self.append_node(FormatNode::CaseSensitive(true));
        self
    }

    /// Makes literal and offset-text matching case insensitive from this
    /// point on.
    pub fn parse_case_insensitive(&mut self) -> &mut Self {
        self.append_node(FormatNode::CaseSensitive(false));
        self
    }

    /// Requires fixed-width numerics to consume exactly their width from
    /// this point on. This is the default.
    pub fn parse_strict(&mut self) -> &mut Self {
        self.append_node(FormatNode::Strict(true));
        self
    }

    /// Relaxes numeric widths from this point on.
    pub fn parse_lenient(&mut self) -> &mut Self {
        self.append_node(FormatNode::Strict(false));
        self
    }

    /// Appends another formatter's whole tree as a unit.
    pub fn append(&mut self, formatter: &DateTimeFormatter) -> &mut Self {
        self.append_node(formatter.root().clone());
        self
    }

    /// Compiles a letter pattern and appends the resulting elements.
    pub fn append_pattern(&mut self, pattern: &str) -> FormatResult<&mut Self> {
        pattern::compile(self, pattern)?;
        Ok(self)
    }

    /// Finishes the builder. Open optional groups are closed implicitly.
    #[must_use]
    pub fn to_formatter(mut self) -> DateTimeFormatter {
        while self.frames.len() > 1 {
            self.close_optional();
        }
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => unreachable!("the builder frame stack is never empty"),
        };
        DateTimeFormatter::new(FormatNode::Composite(CompositeNode {
            nodes: frame.nodes,
            optional: false,
        }))
    }
}
