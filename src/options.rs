//! Native implementation of the formatter options.
//!
//! These enums control how numeric signs are emitted and consumed, how
//! strictly parsed fields are combined, and which of the fixed offset
//! layouts an offset element uses.

use core::fmt;
use core::str::FromStr;

use crate::error::FormatError;

// ==== SignStyle ====

/// The policy for emitting and parsing the sign of a numeric field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SignStyle {
    /// Output the sign only when the value is negative.
    #[default]
    Normal,
    /// Always output the sign.
    Always,
    /// Never output the sign; negative values are an error.
    Never,
    /// Never output the sign; intended for fixed-width unsigned values.
    NotNegative,
    /// Output the sign only when the magnitude needs more digits than the
    /// minimum width.
    ExceedsPad,
}

impl SignStyle {
    /// Returns whether a parsed sign character is acceptable under the
    /// current strictness.
    pub(crate) fn parse_allowed(self, positive: bool, strict: bool, fixed_width: bool) -> bool {
        match self {
            // A leading '-' is always valid; '+' only leniently.
            Self::Normal => !positive || !strict,
            Self::Always | Self::ExceedsPad => true,
            Self::Never | Self::NotNegative => !strict && !fixed_width,
        }
    }
}

impl fmt::Display for SignStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => "NORMAL",
            Self::Always => "ALWAYS",
            Self::Never => "NEVER",
            Self::NotNegative => "NOT_NEGATIVE",
            Self::ExceedsPad => "EXCEEDS_PAD",
        }
        .fmt(f)
    }
}

// ==== ResolverStyle ====

/// The strictness applied when combining parsed fields into a value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResolverStyle {
    /// Require every field to be valid for the resolved date.
    Strict,
    /// Validate field ranges but adjust a day-of-month that overflows its
    /// month down to the last valid day.
    #[default]
    Smart,
    /// Accept any value and roll overflow into the larger fields.
    Lenient,
}

/// A parsing error for `ResolverStyle`
#[derive(Debug, Clone, Copy)]
pub struct ParseResolverStyleError;

impl fmt::Display for ParseResolverStyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("provided string was not a valid ResolverStyle")
    }
}

impl FromStr for ResolverStyle {
    type Err = ParseResolverStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "smart" => Ok(Self::Smart),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ParseResolverStyleError),
        }
    }
}

impl fmt::Display for ResolverStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => "strict",
            Self::Smart => "smart",
            Self::Lenient => "lenient",
        }
        .fmt(f)
    }
}

// ==== OffsetPattern ====

/// How many seconds an offset element may parse after the minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffsetSeconds {
    None,
    Optional,
    Required,
}

/// The fixed repertoire of UTC offset layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetPattern {
    /// `+HH`
    Hour,
    /// `+HHMM`
    HourMinute,
    /// `+HH:MM`
    HourColonMinute,
    /// `+HHMMss`, seconds present only when non-zero
    HourMinuteOptionalSecond,
    /// `+HH:MM:ss`, seconds present only when non-zero
    HourColonMinuteOptionalSecond,
    /// `+HHMMSS`
    HourMinuteSecond,
    /// `+HH:MM:SS`
    HourColonMinuteColonSecond,
}

impl OffsetPattern {
    /// Returns the pattern text this layout was built from.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Hour => "+HH",
            Self::HourMinute => "+HHMM",
            Self::HourColonMinute => "+HH:MM",
            Self::HourMinuteOptionalSecond => "+HHMMss",
            Self::HourColonMinuteOptionalSecond => "+HH:MM:ss",
            Self::HourMinuteSecond => "+HHMMSS",
            Self::HourColonMinuteColonSecond => "+HH:MM:SS",
        }
    }

    /// Returns whether the layout separates components with colons.
    pub(crate) const fn uses_colon(self) -> bool {
        matches!(
            self,
            Self::HourColonMinute
                | Self::HourColonMinuteOptionalSecond
                | Self::HourColonMinuteColonSecond
        )
    }

    /// Returns whether the layout includes a minutes component.
    pub(crate) const fn has_minute(self) -> bool {
        !matches!(self, Self::Hour)
    }

    pub(crate) const fn seconds(self) -> OffsetSeconds {
        match self {
            Self::Hour | Self::HourMinute | Self::HourColonMinute => OffsetSeconds::None,
            Self::HourMinuteOptionalSecond | Self::HourColonMinuteOptionalSecond => {
                OffsetSeconds::Optional
            }
            Self::HourMinuteSecond | Self::HourColonMinuteColonSecond => OffsetSeconds::Required,
        }
    }
}

impl FromStr for OffsetPattern {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+HH" => Ok(Self::Hour),
            "+HHMM" => Ok(Self::HourMinute),
            "+HH:MM" => Ok(Self::HourColonMinute),
            "+HHMMss" => Ok(Self::HourMinuteOptionalSecond),
            "+HH:MM:ss" => Ok(Self::HourColonMinuteOptionalSecond),
            "+HHMMSS" => Ok(Self::HourMinuteSecond),
            "+HH:MM:SS" => Ok(Self::HourColonMinuteColonSecond),
            _ => Err(FormatError::argument().with_message(format!("invalid offset pattern: {s}"))),
        }
    }
}

impl fmt::Display for OffsetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pattern().fmt(f)
    }
}

// ==== DecimalStyle ====

/// The symbols used for numeric output and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalStyle {
    zero_digit: char,
    positive_sign: char,
    negative_sign: char,
    decimal_separator: char,
}

impl DecimalStyle {
    /// The standard ASCII symbol set.
    pub const STANDARD: Self = Self {
        zero_digit: '0',
        positive_sign: '+',
        negative_sign: '-',
        decimal_separator: '.',
    };

    #[inline]
    #[must_use]
    pub const fn zero_digit(&self) -> char {
        self.zero_digit
    }

    #[inline]
    #[must_use]
    pub const fn positive_sign(&self) -> char {
        self.positive_sign
    }

    #[inline]
    #[must_use]
    pub const fn negative_sign(&self) -> char {
        self.negative_sign
    }

    #[inline]
    #[must_use]
    pub const fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Interprets `ch` as a digit in this symbol set.
    #[inline]
    pub(crate) fn digit(&self, ch: char) -> Option<u8> {
        let delta = (ch as u32).wrapping_sub(self.zero_digit as u32);
        (delta < 10).then_some(delta as u8)
    }
}

impl Default for DecimalStyle {
    fn default() -> Self {
        Self::STANDARD
    }
}
