/*!
Parsing of the free-form dates that organizers attach to events, and of
numeric dates typed into queries.
*/

use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

lazy_static! {
    // e.g., "25th to 26th Nov 25" or "1 to 3 December 2025".
    static ref RANGE: Regex = Regex::new(
        r"(?i)\b(?P<start>\d{1,2})(?:st|nd|rd|th)?\s+to\s+(?P<end>\d{1,2})(?:st|nd|rd|th)?\s+(?P<month>[a-z]+)\.?\s+(?P<year>\d{4}|\d{2})\b"
    ).unwrap();

    // e.g., "12th Dec 25".
    static ref SINGLE: Regex = Regex::new(
        r"(?i)\b(?P<day>\d{1,2})(?:st|nd|rd|th)?\s+(?P<month>[a-z]+)\.?\s+(?P<year>\d{4}|\d{2})\b"
    ).unwrap();

    // e.g., "12/12/25" or "5th/1/2026", as typed into a search box.
    static ref NUMERIC: Regex = Regex::new(
        r"(?i)^(?P<day>\d{1,2})(?:st|nd|rd|th)?/(?P<month>\d{1,2})/(?P<year>\d{4}|\d{2})$"
    ).unwrap();
}

/// An inclusive range of calendar days.
///
/// Date ranges are parsed from the free-form text that organizers enter when
/// creating an event. Two shapes are recognized:
///
/// * `<day> to <day> <month> <year>`, e.g., `25th to 26th Nov 25`, where both
///   days fall in the same month.
/// * `<day> <month> <year>`, e.g., `12th Dec 25`, which is a single day.
///
/// Days may carry an ordinal suffix (`st`, `nd`, `rd` or `th`). Months are
/// English month names or their three letter abbreviations, in any case.
/// Years are either two digits (in the 2000s) or four digits.
///
/// Note that the end of a range is taken verbatim from the text, so text like
/// `30th to 2nd Dec 25` produces a range whose end precedes its start.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a new range from its first and last days.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange { start, end }
    }

    /// Create a range consisting of a single day.
    pub fn single(day: NaiveDate) -> DateRange {
        DateRange { start: day, end: day }
    }

    /// Parse the given text, falling back to a single day range at `sentinel`
    /// if the text isn't recognized.
    ///
    /// This never fails. When the fallback is used, the reason is returned
    /// alongside the sentinel range so that callers can report it.
    pub fn parse_or(
        text: &str,
        sentinel: NaiveDate,
    ) -> (DateRange, Option<Error>) {
        match text.parse() {
            Ok(range) => (range, None),
            Err(err) => (DateRange::single(sentinel), Some(err)),
        }
    }

    /// The first day of this range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The last day of this range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if and only if the given day is in this range, inclusive
    /// of both ends.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl FromStr for DateRange {
    type Err = Error;

    fn from_str(text: &str) -> Result<DateRange> {
        if let Some(caps) = RANGE.captures(text) {
            let (month, year) = month_year(&caps)?;
            let start = day(text, year, month, &caps["start"])?;
            let end = day(text, year, month, &caps["end"])?;
            return Ok(DateRange::new(start, end));
        }
        if let Some(caps) = SINGLE.captures(text) {
            let (month, year) = month_year(&caps)?;
            return Ok(DateRange::single(day(text, year, month, &caps["day"])?));
        }
        Err(Error::invalid_date(text))
    }
}

/// Parse a numeric `DD/MM/YY` or `DD/MM/YYYY` date, as one might type into a
/// search box.
///
/// Two digit years up to `79` are in the 2000s and the rest are in the 1900s.
/// If the text isn't a valid date of this form, then `None` is returned.
pub fn parse_numeric(text: &str) -> Option<NaiveDate> {
    let caps = NUMERIC.captures(text.trim())?;
    let day: u32 = caps["day"].parse().ok()?;
    let month: u32 = caps["month"].parse().ok()?;
    let mut year: i32 = caps["year"].parse().ok()?;
    if caps["year"].len() == 2 {
        year += if year <= 79 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Returns the month number (1-12) for an English month name or its
/// abbreviation, ignoring case.
pub fn month_number(name: &str) -> Result<u32> {
    let month = match &*name.to_lowercase() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return Err(Error::unknown_month(name)),
    };
    Ok(month)
}

fn month_year(caps: &Captures) -> Result<(u32, i32)> {
    let month = month_number(&caps["month"])?;
    let year = &caps["year"];
    let mut number: i32 = year.parse().map_err(Error::number)?;
    if year.len() == 2 {
        number += 2000;
    }
    Ok((month, number))
}

fn day(text: &str, year: i32, month: u32, day: &str) -> Result<NaiveDate> {
    let day: u32 = day.parse().map_err(Error::number)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::invalid_date(text))
}
