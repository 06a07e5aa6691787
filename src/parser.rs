//! Entry parser for the fixed `YYYY-MM-DD HH:MM:SS LEVL message` line format.
//!
//! The parser is a pure function from one line to one outcome; it keeps no
//! state between calls.

use crate::entry::{Entry, Level};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use nom::{
    branch::alt,
    bytes::complete::{take, take_while_m_n},
    character::complete::char,
    combinator::{eof, map_opt, map_res, rest, value},
    sequence::preceded,
    IResult, Parser,
};
use std::fmt;

/// Why a line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Missing, malformed or out-of-range `YYYY-MM-DD HH:MM:SS` prefix
    Timestamp,
    /// Level code is not one of DEBU, INFO, WARN, ERRO
    Level,
    /// Separators are missing or the level code is followed by something other than a space
    Structure,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Timestamp => f.write_str("invalid timestamp, expected YYYY-MM-DD HH:MM:SS"),
            ParseError::Level => f.write_str("unknown level code, expected DEBU, INFO, WARN or ERRO"),
            ParseError::Structure => f.write_str("malformed log line"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one line into an [`Entry`]. A trailing `\n` or `\r\n` is ignored.
pub fn parse_entry(line: &str) -> Result<Entry, ParseError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let (input, timestamp) = timestamp(line).map_err(|_| ParseError::Timestamp)?;
    let (input, _) = separator(input).map_err(|_| ParseError::Structure)?;
    let (input, level) = level(input).map_err(|_| ParseError::Level)?;
    let (_, message) = message(input).map_err(|_| ParseError::Structure)?;

    Ok(Entry::new(timestamp, level, message))
}

/// Fixed-width unsigned decimal field
fn digits(input: &str, width: usize) -> IResult<&str, u32> {
    map_res(
        take_while_m_n(width, width, |c: char| c.is_ascii_digit()),
        str::parse::<u32>,
    )
    .parse(input)
}

fn four_digits(input: &str) -> IResult<&str, u32> {
    digits(input, 4)
}

fn two_digits(input: &str) -> IResult<&str, u32> {
    digits(input, 2)
}

fn date(input: &str) -> IResult<&str, NaiveDate> {
    map_opt(
        (four_digits, char('-'), two_digits, char('-'), two_digits),
        |(year, _, month, _, day)| NaiveDate::from_ymd_opt(year as i32, month, day),
    )
    .parse(input)
}

fn time(input: &str) -> IResult<&str, NaiveTime> {
    map_opt(
        (two_digits, char(':'), two_digits, char(':'), two_digits),
        |(hour, _, minute, _, second)| NaiveTime::from_hms_opt(hour, minute, second),
    )
    .parse(input)
}

fn timestamp(input: &str) -> IResult<&str, DateTime<Utc>> {
    let (input, date) = date(input)?;
    let (input, _) = separator(input)?;
    let (input, time) = time(input)?;
    Ok((input, NaiveDateTime::new(date, time).and_utc()))
}

fn separator(input: &str) -> IResult<&str, char> {
    char(' ').parse(input)
}

fn level(input: &str) -> IResult<&str, Level> {
    map_opt(take(4usize), Level::from_code).parse(input)
}

// Everything after the single space following the level code; empty when the
// line stops right after the code.
fn message(input: &str) -> IResult<&str, &str> {
    alt((value("", eof), preceded(char(' '), rest))).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_parse_all_levels() {
        let cases = [
            ("DEBU", Level::Debug),
            ("INFO", Level::Info),
            ("WARN", Level::Warn),
            ("ERRO", Level::Error),
        ];
        for (code, expected) in cases {
            let line = format!("2024-01-01 10:00:00 {} hello", code);
            let entry = parse_entry(&line).unwrap();
            assert_eq!(entry.level(), expected);
            assert_eq!(entry.message(), "hello");
        }
    }

    #[test]
    fn test_parse_timestamp_fields() {
        let entry = parse_entry("2023-07-15 23:59:58 INFO x").unwrap();
        let t = entry.timestamp();
        assert_eq!((t.year(), t.month(), t.day()), (2023, 7, 15));
        assert_eq!((t.hour(), t.minute(), t.second()), (23, 59, 58));
        assert_eq!(t, Utc.with_ymd_and_hms(2023, 7, 15, 23, 59, 58).unwrap());
    }

    #[test]
    fn test_message_keeps_inner_spaces() {
        let entry = parse_entry("2024-01-01 10:00:00 WARN disk  at 91%  ").unwrap();
        assert_eq!(entry.message(), "disk  at 91%  ");
    }

    #[test]
    fn test_message_may_be_empty() {
        let entry = parse_entry("2024-01-01 10:00:00 INFO ").unwrap();
        assert_eq!(entry.message(), "");

        let entry = parse_entry("2024-01-01 10:00:00 INFO").unwrap();
        assert_eq!(entry.message(), "");
    }

    #[test]
    fn test_line_endings_are_stripped() {
        let entry = parse_entry("2024-01-01 10:00:00 INFO a\n").unwrap();
        assert_eq!(entry.message(), "a");

        let entry = parse_entry("2024-01-01 10:00:00 INFO a\r\n").unwrap();
        assert_eq!(entry.message(), "a");
        assert_eq!(entry.timestamp(), ts("2024-01-01 10:00:00"));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert_eq!(
            parse_entry("2024-01-01 10:00:00 info lowercase"),
            Err(ParseError::Level)
        );
        assert_eq!(
            parse_entry("2024-01-01 10:00:00 TRAC trace"),
            Err(ParseError::Level)
        );
        assert_eq!(parse_entry("2024-01-01 10:00:00 IN"), Err(ParseError::Level));
    }

    #[test]
    fn test_level_must_be_followed_by_space() {
        assert_eq!(
            parse_entry("2024-01-01 10:00:00 INFOmessage"),
            Err(ParseError::Structure)
        );
        assert_eq!(
            parse_entry("2024-01-01 10:00:00 ERROR boom"),
            Err(ParseError::Structure)
        );
    }

    #[test]
    fn test_other_timestamp_formats_are_rejected() {
        for line in [
            "2024-01-01T10:00:00 INFO iso",
            "2024/01/01 10:00:00 INFO slashes",
            "24-01-01 10:00:00 INFO short year",
            "2024-1-01 10:00:00 INFO short month",
            "2024-01-01 10:00 INFO no seconds",
            "10:00:00 INFO time only",
            "Jan 01 10:00:00 INFO syslog",
        ] {
            assert_eq!(parse_entry(line), Err(ParseError::Timestamp), "{}", line);
        }
    }

    #[test]
    fn test_out_of_range_timestamps_are_rejected() {
        for line in [
            "2024-13-01 10:00:00 INFO month",
            "2023-02-29 10:00:00 INFO not a leap year",
            "2024-01-32 10:00:00 INFO day",
            "2024-01-01 24:00:00 INFO hour",
            "2024-01-01 10:60:00 INFO minute",
            "2024-01-01 10:00:60 INFO second",
        ] {
            assert_eq!(parse_entry(line), Err(ParseError::Timestamp), "{}", line);
        }
        assert!(parse_entry("2024-02-29 10:00:00 INFO leap day").is_ok());
    }

    #[test]
    fn test_garbage_and_empty_lines_are_rejected() {
        assert!(parse_entry("").is_err());
        assert!(parse_entry("garbage line").is_err());
        assert!(parse_entry("\n").is_err());
        assert_eq!(
            parse_entry("2024-01-01  10:00:00 INFO double space"),
            Err(ParseError::Timestamp)
        );
        assert_eq!(
            parse_entry("2024-01-01 10:00:00  INFO double space"),
            Err(ParseError::Level)
        );
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        assert!(parse_entry("2024-01-01 10:00:00 ÄÖÜß message").is_err());
        let entry = parse_entry("2024-01-01 10:00:00 INFO grüße").unwrap();
        assert_eq!(entry.message(), "grüße");
    }

    #[test]
    fn test_error_messages() {
        assert!(ParseError::Timestamp.to_string().contains("YYYY-MM-DD"));
        assert!(ParseError::Level.to_string().contains("ERRO"));
    }
}
