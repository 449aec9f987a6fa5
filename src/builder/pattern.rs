//! The letter-pattern compiler.
//!
//! Translates a `yyyy-MM-dd`-style pattern into builder calls. Repeated
//! letters select widths, quoted text is literal, and square brackets open
//! and close optional groups.

use super::DateTimeFormatterBuilder;
use crate::error::FormatError;
use crate::fields::TemporalField;
use crate::options::SignStyle;
use crate::FormatResult;

// Offset layouts selected by the repeat count of `X`/`x`.
const OFFSET_PATTERNS: [&str; 5] = ["+HH", "+HHMM", "+HH:MM", "+HHMMss", "+HH:MM:ss"];

pub(super) fn compile(builder: &mut DateTimeFormatterBuilder, pattern: &str) -> FormatResult<()> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut index = 0;
    let mut depth = 0usize;

    while index < chars.len() {
        let current = chars[index];
        if current.is_ascii_alphabetic() {
            let start = index;
            while index < chars.len() && chars[index] == current {
                index += 1;
            }
            let count = index - start;
            if current == 'p' {
                let width = u8::try_from(count).map_err(|_| too_many('p'))?;
                builder.pad_next(width)?;
                if index >= chars.len() || !chars[index].is_ascii_alphabetic() {
                    return Err(FormatError::argument().with_message(
                        "pad letter 'p' must be followed by a pattern letter",
                    ));
                }
                continue;
            }
            append_field(builder, current, count)?;
        } else if current == '\'' {
            index += 1;
            let mut literal = String::new();
            loop {
                if index >= chars.len() {
                    return Err(FormatError::argument().with_message(format!(
                        "pattern ends with an incomplete string literal: {pattern}"
                    )));
                }
                if chars[index] == '\'' {
                    if chars.get(index + 1) == Some(&'\'') {
                        literal.push('\'');
                        index += 2;
                    } else {
                        index += 1;
                        break;
                    }
                } else {
                    literal.push(chars[index]);
                    index += 1;
                }
            }
            if literal.is_empty() {
                builder.append_literal('\'');
            } else {
                builder.append_literal_str(&literal);
            }
        } else if current == '[' {
            depth += 1;
            builder.optional_start();
            index += 1;
        } else if current == ']' {
            if depth == 0 {
                return Err(FormatError::argument()
                    .with_message("pattern invalid as it contains ] without previous ["));
            }
            depth -= 1;
            builder.optional_end()?;
            index += 1;
        } else {
            builder.append_literal(current);
            index += 1;
        }
    }
    if depth != 0 {
        return Err(FormatError::argument()
            .with_message("pattern invalid as it contains [ without matching ]"));
    }
    Ok(())
}

fn too_many(letter: char) -> FormatError {
    FormatError::argument().with_message(format!("too many pattern letters: {letter}"))
}

fn append_field(
    builder: &mut DateTimeFormatterBuilder,
    letter: char,
    count: usize,
) -> FormatResult<()> {
    match letter {
        'u' | 'y' => {
            let field = if letter == 'u' {
                TemporalField::Year
            } else {
                TemporalField::YearOfEra
            };
            match count {
                1 => {
                    builder.append_value(field);
                }
                2 => {
                    builder.append_value_reduced(field, 2, 2, 2000)?;
                }
                3..=5 => {
                    builder.append_value_range(field, count as u8, 15, SignStyle::ExceedsPad)?;
                }
                _ => return Err(too_many(letter)),
            }
        }
        'M' | 'L' => match count {
            1 => {
                builder.append_value(TemporalField::MonthOfYear);
            }
            2 => {
                builder.append_value_fixed(TemporalField::MonthOfYear, 2)?;
            }
            3..=5 => {
                return Err(FormatError::argument()
                    .with_message(format!("text styles are not supported: {letter}")))
            }
            _ => return Err(too_many(letter)),
        },
        'd' => match count {
            1 => {
                builder.append_value(TemporalField::DayOfMonth);
            }
            2 => {
                builder.append_value_fixed(TemporalField::DayOfMonth, 2)?;
            }
            _ => return Err(too_many(letter)),
        },
        'D' => match count {
            1 => {
                builder.append_value(TemporalField::DayOfYear);
            }
            2 | 3 => {
                builder.append_value_range(
                    TemporalField::DayOfYear,
                    count as u8,
                    3,
                    SignStyle::NotNegative,
                )?;
            }
            _ => return Err(too_many(letter)),
        },
        'H' | 'K' | 'k' | 'h' | 'm' | 's' => {
            let field = match letter {
                'H' => TemporalField::HourOfDay,
                'K' => TemporalField::HourOfAmPm,
                'k' => TemporalField::ClockHourOfDay,
                'h' => TemporalField::ClockHourOfAmPm,
                'm' => TemporalField::MinuteOfHour,
                _ => TemporalField::SecondOfMinute,
            };
            match count {
                1 => {
                    builder.append_value(field);
                }
                2 => {
                    builder.append_value_fixed(field, 2)?;
                }
                _ => return Err(too_many(letter)),
            }
        }
        'S' => {
            if count > 9 {
                return Err(too_many('S'));
            }
            builder.append_fraction(
                TemporalField::NanoOfSecond,
                count as u8,
                count as u8,
                false,
            )?;
        }
        'A' | 'n' | 'N' => {
            let field = match letter {
                'A' => TemporalField::MilliOfDay,
                'n' => TemporalField::NanoOfSecond,
                _ => TemporalField::NanoOfDay,
            };
            if count > 15 {
                return Err(too_many(letter));
            }
            builder.append_value_range(field, count as u8, 15, SignStyle::NotNegative)?;
        }
        'F' => match count {
            1 => {
                builder.append_value(TemporalField::AlignedDayOfWeekInMonth);
            }
            _ => return Err(too_many('F')),
        },
        'q' => match count {
            1 => {
                builder.append_value(TemporalField::QuarterOfYear);
            }
            2 => {
                builder.append_value_fixed(TemporalField::QuarterOfYear, 2)?;
            }
            3..=5 => {
                return Err(FormatError::argument()
                    .with_message("text styles are not supported: q"))
            }
            _ => return Err(too_many('q')),
        },
        'V' => {
            if count != 2 {
                return Err(FormatError::argument()
                    .with_message("pattern letter count must be 2: V"));
            }
            builder.append_zone_id();
        }
        'Z' => match count {
            1..=3 => {
                builder.append_offset("+HHMM", "+0000")?;
            }
            4 => {
                return Err(FormatError::argument()
                    .with_message("localized zone offset text is not supported: ZZZZ"))
            }
            5 => {
                builder.append_offset("+HH:MM:ss", "Z")?;
            }
            _ => return Err(too_many('Z')),
        },
        'X' | 'x' => {
            if count > 5 {
                return Err(too_many(letter));
            }
            let no_offset_text = if letter == 'X' {
                "Z"
            } else if count == 1 {
                "+00"
            } else if count % 2 == 0 {
                "+0000"
            } else {
                "+00:00"
            };
            builder.append_offset(OFFSET_PATTERNS[count - 1], no_offset_text)?;
        }
        _ => {
            return Err(FormatError::argument()
                .with_message(format!("unknown pattern letter: {letter}")))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::builder::DateTimeFormatterBuilder;
    use crate::error::ErrorKind;
    use crate::FormatResult;

    fn pattern_string(pattern: &str) -> FormatResult<String> {
        let mut builder = DateTimeFormatterBuilder::new();
        builder.append_pattern(pattern)?;
        Ok(builder.to_formatter().to_string())
    }

    #[test]
    fn iso_date_pattern() {
        assert_eq!(
            pattern_string("uuuu-MM-dd").unwrap(),
            "Value(Year,4,15,EXCEEDS_PAD)'-'Value(MonthOfYear,2)'-'Value(DayOfMonth,2)"
        );
    }

    #[test]
    fn optional_groups_nest() {
        assert_eq!(
            pattern_string("uuuu[-MM[-dd]]").unwrap(),
            "Value(Year,4,15,EXCEEDS_PAD)['-'Value(MonthOfYear,2)['-'Value(DayOfMonth,2)]]"
        );
    }

    #[test]
    fn quoted_literals() {
        assert_eq!(pattern_string("'T'HH").unwrap(), "'T'Value(HourOfDay,2)");
        assert_eq!(pattern_string("''").unwrap(), "''");
        assert_eq!(pattern_string("'o''clock'").unwrap(), "'o''clock'");
        // Letters inside quotes are literal text.
        assert_eq!(pattern_string("'yyyy'").unwrap(), "'yyyy'");
    }

    #[test]
    fn year_counts() {
        assert_eq!(pattern_string("u").unwrap(), "Value(Year)");
        assert_eq!(pattern_string("yy").unwrap(), "ReducedValue(YearOfEra,2,2,2000)");
        assert_eq!(pattern_string("uuuuu").unwrap(), "Value(Year,5,15,EXCEEDS_PAD)");
        assert!(pattern_string("uuuuuu").is_err());
    }

    #[test]
    fn hour_and_fraction_letters() {
        assert_eq!(pattern_string("H:m:s").unwrap(), "Value(HourOfDay)':'Value(MinuteOfHour)':'Value(SecondOfMinute)");
        assert_eq!(pattern_string("SSS").unwrap(), "Fraction(NanoOfSecond,3,3)");
        assert_eq!(pattern_string("K").unwrap(), "Value(HourOfAmPm)");
        assert_eq!(pattern_string("kk").unwrap(), "Value(ClockHourOfDay,2)");
        assert_eq!(pattern_string("A").unwrap(), "Value(MilliOfDay,1,15,NOT_NEGATIVE)");
    }

    #[test]
    fn zone_and_offset_letters() {
        assert_eq!(pattern_string("VV").unwrap(), "ZoneId()");
        assert_eq!(pattern_string("Z").unwrap(), "Offset(+HHMM,'+0000')");
        assert_eq!(pattern_string("ZZZZZ").unwrap(), "Offset(+HH:MM:ss,'Z')");
        assert_eq!(pattern_string("X").unwrap(), "Offset(+HH,'Z')");
        assert_eq!(pattern_string("XXX").unwrap(), "Offset(+HH:MM,'Z')");
        assert_eq!(pattern_string("xx").unwrap(), "Offset(+HHMM,'+0000')");
        assert_eq!(pattern_string("xxx").unwrap(), "Offset(+HH:MM,'+00:00')");
        assert_eq!(pattern_string("x").unwrap(), "Offset(+HH,'+00')");
    }

    #[test]
    fn pad_letter() {
        assert_eq!(pattern_string("ppH").unwrap(), "Pad(Value(HourOfDay),2)");
        let err = pattern_string("p-").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(pattern_string("p").is_err());
    }

    #[test]
    fn invalid_patterns() {
        for bad in [
            "'",        // unclosed quote
            "MMMMMM",   // too many letters
            "MMM",      // text style unsupported
            "DDDD",     // too many letters
            "qqqqqq",   // too many letters
            "b",        // unknown letter
            "V",        // zone id requires VV
            "ZZZZ",     // localized offset unsupported
            "XXXXXX",   // too many letters
            "]",        // close without open
            "[uuuu",    // open without close
            "kkk",      // too many letters
        ] {
            let err = pattern_string(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Argument, "pattern {bad:?}");
        }
    }

    #[test]
    fn non_letter_characters_are_literals() {
        assert_eq!(pattern_string("#{}").unwrap(), "'#''{''}'");
    }
}
