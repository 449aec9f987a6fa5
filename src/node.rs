//! The printer/parser node tree.
//!
//! A formatter owns one tree of `FormatNode`s. Printing and parsing are both
//! tree walks over the same nodes; the walks live in `printer` and `parser`.
//! The tree is immutable once built and may be walked concurrently.

use writeable::{LengthHint, Writeable};

use crate::fields::TemporalField;
use crate::options::{OffsetPattern, SignStyle};

/// A single element of a formatter tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FormatNode {
    /// A literal character.
    Literal(char),
    /// A literal string of two or more characters.
    LiteralStr(String),
    /// A numeric field value.
    Value(ValueNode),
    /// A numeric field value reduced to its low-order digits.
    Reduced(ReducedNode),
    /// A fractional field value.
    Fraction(FractionNode),
    /// A wrapper padding its inner node to a minimum printed width.
    Pad(PadNode),
    /// An ordered sequence, optionally recoverable on parse failure.
    Composite(CompositeNode),
    /// A UTC offset in one of the fixed layouts.
    Offset(OffsetNode),
    /// A time zone identifier.
    ZoneId,
    /// An ISO-8601 instant.
    Instant,
    /// Toggles parse case sensitivity from this point on.
    CaseSensitive(bool),
    /// Toggles parse strictness from this point on.
    Strict(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ValueNode {
    pub(crate) field: TemporalField,
    pub(crate) min_width: u8,
    pub(crate) max_width: u8,
    pub(crate) sign_style: SignStyle,
    /// Total width of the fixed-width values that follow this node in an
    /// adjacent digit run. Zero outside adjacent mode.
    pub(crate) subsequent_width: u16,
    /// Marks a node appended into an adjacent run; it always consumes
    /// exactly its declared width.
    pub(crate) fixed_width: bool,
}

impl ValueNode {
    pub(crate) fn new(
        field: TemporalField,
        min_width: u8,
        max_width: u8,
        sign_style: SignStyle,
    ) -> Self {
        Self {
            field,
            min_width,
            max_width,
            sign_style,
            subsequent_width: 0,
            fixed_width: false,
        }
    }

    pub(crate) fn with_fixed_width(mut self) -> Self {
        self.fixed_width = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReducedNode {
    pub(crate) field: TemporalField,
    pub(crate) width: u8,
    pub(crate) max_width: u8,
    pub(crate) base_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FractionNode {
    pub(crate) field: TemporalField,
    pub(crate) min_width: u8,
    pub(crate) max_width: u8,
    pub(crate) decimal_point: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PadNode {
    pub(crate) inner: Box<FormatNode>,
    pub(crate) width: u8,
    pub(crate) pad_char: char,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompositeNode {
    pub(crate) nodes: Vec<FormatNode>,
    pub(crate) optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OffsetNode {
    pub(crate) pattern: OffsetPattern,
    pub(crate) no_offset_text: String,
}

// The description format quotes literals with apostrophes, doubling any
// apostrophe inside them.
fn write_quoted<W: core::fmt::Write + ?Sized>(text: &str, sink: &mut W) -> core::fmt::Result {
    sink.write_char('\'')?;
    for ch in text.chars() {
        if ch == '\'' {
            sink.write_str("''")?;
        } else {
            sink.write_char(ch)?;
        }
    }
    sink.write_char('\'')
}

impl Writeable for FormatNode {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        match self {
            Self::Literal(ch) => {
                if *ch == '\'' {
                    sink.write_str("''")
                } else {
                    write!(sink, "'{ch}'")
                }
            }
            Self::LiteralStr(text) => write_quoted(text, sink),
            Self::Value(value) => {
                if value.min_width == 1
                    && value.max_width == 15
                    && value.sign_style == SignStyle::Normal
                {
                    write!(sink, "Value({})", value.field)
                } else if value.min_width == value.max_width
                    && value.sign_style == SignStyle::NotNegative
                {
                    write!(sink, "Value({},{})", value.field, value.min_width)
                } else {
                    write!(
                        sink,
                        "Value({},{},{},{})",
                        value.field, value.min_width, value.max_width, value.sign_style
                    )
                }
            }
            Self::Reduced(reduced) => write!(
                sink,
                "ReducedValue({},{},{},{})",
                reduced.field, reduced.width, reduced.max_width, reduced.base_value
            ),
            Self::Fraction(fraction) => write!(
                sink,
                "Fraction({},{},{})",
                fraction.field, fraction.min_width, fraction.max_width
            ),
            Self::Pad(pad) => {
                write!(sink, "Pad(")?;
                pad.inner.write_to(sink)?;
                write!(sink, ",{}", pad.width)?;
                if pad.pad_char != ' ' {
                    write!(sink, ",'{}'", pad.pad_char)?;
                }
                sink.write_char(')')
            }
            Self::Composite(composite) => {
                sink.write_char(if composite.optional { '[' } else { '(' })?;
                for node in &composite.nodes {
                    node.write_to(sink)?;
                }
                sink.write_char(if composite.optional { ']' } else { ')' })
            }
            Self::Offset(offset) => {
                write!(sink, "Offset({},", offset.pattern)?;
                write_quoted(&offset.no_offset_text, sink)?;
                sink.write_char(')')
            }
            Self::ZoneId => sink.write_str("ZoneId()"),
            Self::Instant => sink.write_str("Instant()"),
            Self::CaseSensitive(sensitive) => write!(sink, "ParseCaseSensitive({sensitive})"),
            Self::Strict(strict) => write!(sink, "ParseStrict({strict})"),
        }
    }

    fn writeable_length_hint(&self) -> LengthHint {
        LengthHint::undefined()
    }
}

#[cfg(test)]
mod tests {
    use super::{CompositeNode, FormatNode, OffsetNode, PadNode, ReducedNode, ValueNode};
    use crate::fields::TemporalField;
    use crate::options::{OffsetPattern, SignStyle};
    use writeable::Writeable;

    fn rendered(node: &FormatNode) -> String {
        node.write_to_string().into_owned()
    }

    #[test]
    fn literal_descriptions() {
        assert_eq!(rendered(&FormatNode::Literal('-')), "'-'");
        assert_eq!(rendered(&FormatNode::Literal('\'')), "''");
        assert_eq!(
            rendered(&FormatNode::LiteralStr("o'clock".into())),
            "'o''clock'"
        );
    }

    #[test]
    fn value_descriptions() {
        let field = TemporalField::MonthOfYear;
        assert_eq!(
            rendered(&FormatNode::Value(ValueNode::new(
                field,
                1,
                15,
                SignStyle::Normal
            ))),
            "Value(MonthOfYear)"
        );
        assert_eq!(
            rendered(&FormatNode::Value(ValueNode::new(
                field,
                2,
                2,
                SignStyle::NotNegative
            ))),
            "Value(MonthOfYear,2)"
        );
        assert_eq!(
            rendered(&FormatNode::Value(ValueNode::new(
                TemporalField::Year,
                4,
                15,
                SignStyle::ExceedsPad
            ))),
            "Value(Year,4,15,EXCEEDS_PAD)"
        );
    }

    #[test]
    fn reduced_offset_and_pad_descriptions() {
        assert_eq!(
            rendered(&FormatNode::Reduced(ReducedNode {
                field: TemporalField::Year,
                width: 2,
                max_width: 2,
                base_value: 2000,
            })),
            "ReducedValue(Year,2,2,2000)"
        );
        assert_eq!(
            rendered(&FormatNode::Offset(OffsetNode {
                pattern: OffsetPattern::HourColonMinuteOptionalSecond,
                no_offset_text: "Z".into(),
            })),
            "Offset(+HH:MM:ss,'Z')"
        );
        let padded = FormatNode::Pad(PadNode {
            inner: Box::new(FormatNode::Value(ValueNode::new(
                TemporalField::DayOfMonth,
                2,
                2,
                SignStyle::NotNegative,
            ))),
            width: 3,
            pad_char: '0',
        });
        assert_eq!(rendered(&padded), "Pad(Value(DayOfMonth,2),3,'0')");
    }

    #[test]
    fn composite_descriptions() {
        let optional = FormatNode::Composite(CompositeNode {
            nodes: vec![
                FormatNode::Literal('-'),
                FormatNode::Value(ValueNode::new(
                    TemporalField::MonthOfYear,
                    2,
                    2,
                    SignStyle::NotNegative,
                )),
            ],
            optional: true,
        });
        assert_eq!(rendered(&optional), "['-'Value(MonthOfYear,2)]");

        assert_eq!(
            rendered(&FormatNode::CaseSensitive(false)),
            "ParseCaseSensitive(false)"
        );
        assert_eq!(rendered(&FormatNode::Strict(true)), "ParseStrict(true)");
        assert_eq!(rendered(&FormatNode::ZoneId), "ZoneId()");
        assert_eq!(rendered(&FormatNode::Instant), "Instant()");
    }
}
