//! Date token scanning for the date-consistency rule.

use docval_core::{Error, ErrorKind, Result};
use jiff::civil::Date;
use regex::Regex;

/// Token shapes with the parse orders tried for each.
const PATTERNS: [(&str, &[DateOrder]); 3] = [
    (r"[0-9]{2}\.[0-9]{2}\.[0-9]{4}", &[DateOrder::DayMonthYear]),
    (r"[0-9]{4}-[0-9]{2}-[0-9]{2}", &[DateOrder::YearMonthDay]),
    (
        r"[0-9]{2}/[0-9]{2}/[0-9]{4}",
        &[DateOrder::MonthDayYear, DateOrder::DayMonthYear],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateOrder {
    DayMonthYear,
    YearMonthDay,
    MonthDayYear,
}

impl DateOrder {
    fn parse(self, token: &str) -> Option<Date> {
        let mut parts = token.split(['.', '-', '/']).map(str::parse::<i16>);
        let (a, b, c) = (parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?);
        let (year, month, day) = match self {
            Self::DayMonthYear => (c, b, a),
            Self::YearMonthDay => (a, b, c),
            Self::MonthDayYear => (c, a, b),
        };
        Date::new(year, i8::try_from(month).ok()?, i8::try_from(day).ok()?).ok()
    }
}

/// Finds and parses date tokens in free text.
///
/// Tokens must stand on their own: a digit, ASCII letter or underscore
/// directly before or after a token disqualifies it.
#[derive(Debug, Clone)]
pub struct DateScanner {
    patterns: Vec<(Regex, &'static [DateOrder])>,
}

impl DateScanner {
    /// Compiles the token patterns.
    pub fn new() -> Result<Self> {
        let patterns = PATTERNS
            .iter()
            .map(|(pattern, orders)| {
                Regex::new(pattern)
                    .map(|regex| (regex, *orders))
                    .map_err(|e| Error::from_source(ErrorKind::Internal, e))
            })
            .collect::<Result<_>>()?;
        Ok(Self { patterns })
    }

    /// Returns every date that parses, in pattern order. The first parse
    /// order that yields a calendar date wins.
    pub fn scan(&self, text: &str) -> Vec<Date> {
        let mut dates = Vec::new();
        for (regex, orders) in &self.patterns {
            for token in regex.find_iter(text) {
                if !is_standalone(text, token.start(), token.end()) {
                    continue;
                }
                if let Some(date) = orders.iter().find_map(|order| order.parse(token.as_str())) {
                    dates.push(date);
                }
            }
        }
        dates
    }
}

fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let before = start.checked_sub(1).map(|i| text.as_bytes()[i]);
    let after = text.as_bytes().get(end).copied();
    !before.is_some_and(is_word) && !after.is_some_and(is_word)
}
