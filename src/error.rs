//! This module implements `FormatError` and the parse failure type.

use core::fmt;
use std::borrow::Cow;

/// `FormatError`'s error type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An invalid argument was provided to a builder or pattern operation.
    #[default]
    Argument,
    /// An operation was called in a state that does not permit it.
    State,
    /// A value was outside of its required range.
    Range,
    /// A required temporal field was not available.
    Unsupported,
    /// Assert
    Assert,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument => "ArgumentError",
            Self::State => "StateError",
            Self::Range => "RangeError",
            Self::Unsupported => "UnsupportedFieldError",
            Self::Assert => "ImplementationError",
        }
        .fmt(f)
    }
}

/// The error type for `temporal_pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    kind: ErrorKind,
    msg: Cow<'static, str>,
}

impl FormatError {
    #[inline]
    #[must_use]
    const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            msg: Cow::Borrowed(""),
        }
    }

    /// Create an argument error.
    #[inline]
    #[must_use]
    pub const fn argument() -> Self {
        Self::new(ErrorKind::Argument)
    }

    /// Create a state error.
    #[inline]
    #[must_use]
    pub const fn state() -> Self {
        Self::new(ErrorKind::State)
    }

    /// Create a range error.
    #[inline]
    #[must_use]
    pub const fn range() -> Self {
        Self::new(ErrorKind::Range)
    }

    /// Create an unsupported field error.
    #[inline]
    #[must_use]
    pub const fn unsupported() -> Self {
        Self::new(ErrorKind::Unsupported)
    }

    /// Creates an assertion error for branches that must be unreachable.
    #[inline]
    #[must_use]
    pub(crate) const fn assert() -> Self {
        Self::new(ErrorKind::Assert)
    }

    /// Add a message to the error.
    #[inline]
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<Cow<'static, str>>) -> Self {
        self.msg = msg.into();
        self
    }

    /// Returns this error's kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.msg.is_empty() {
            write!(f, ": {}", self.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormatError {}

/// The error produced when text cannot be parsed into a temporal value.
///
/// Carries the full input text, the index the failure was detected at, and
/// the underlying error when the failure occurred while resolving fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    msg: String,
    text: String,
    error_index: usize,
    cause: Option<FormatError>,
}

impl DateTimeParseError {
    pub(crate) fn new(
        msg: String,
        text: &str,
        error_index: usize,
        cause: Option<FormatError>,
    ) -> Self {
        Self {
            msg,
            text: text.to_owned(),
            error_index,
            cause,
        }
    }

    /// Returns the text that was being parsed.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the index where the error was found.
    #[inline]
    #[must_use]
    pub fn error_index(&self) -> usize {
        self.error_index
    }

    /// Returns the underlying error, if any.
    #[inline]
    #[must_use]
    pub fn cause(&self) -> Option<&FormatError> {
        self.cause.as_ref()
    }
}

impl fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for DateTimeParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

// Parse failure messages embed the offending input. Long inputs are cut to
// keep the message readable.
const ABBREVIATE_CHARS: usize = 64;

/// Shortens `text` to at most 64 characters, appending `...` when cut.
pub(crate) fn abbreviate(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(ABBREVIATE_CHARS) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &text[..idx])),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::{abbreviate, ErrorKind, FormatError};

    #[test]
    fn error_display() {
        let err = FormatError::range().with_message("value out of range.");
        assert_eq!(err.to_string(), "RangeError: value out of range.");
        assert_eq!(err.kind(), ErrorKind::Range);

        let bare = FormatError::state();
        assert_eq!(bare.to_string(), "StateError");
    }

    #[test]
    fn abbreviate_short_text_is_unchanged() {
        assert_eq!(abbreviate(""), "");
        assert_eq!(abbreviate("2012-06-30"), "2012-06-30");
        let exactly = "x".repeat(64);
        assert_eq!(abbreviate(&exactly), exactly);
    }

    #[test]
    fn abbreviate_cuts_at_sixty_four() {
        let long = "y".repeat(70);
        let cut = abbreviate(&long);
        assert_eq!(cut.len(), 67);
        assert!(cut.ends_with("..."));
        assert!(cut.starts_with(&"y".repeat(64)));
    }

    #[test]
    fn abbreviate_respects_char_boundaries() {
        let long = "é".repeat(70);
        let cut = abbreviate(&long);
        assert_eq!(cut.chars().count(), 67);
        assert!(cut.ends_with("..."));
    }
}
