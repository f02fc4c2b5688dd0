use std::fmt;
use std::result;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::date::DateRange;
use crate::error::{Error, Result};

/// The locale used to render dates for display and for searching.
///
/// Friendly date strings are part of every event's searchable text, so the
/// locale influences which date queries match. It is always passed in
/// explicitly and never read from the environment by this crate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Locale {
    /// US English, e.g., `Dec 12, 2025`.
    EnUs,
    /// British English, e.g., `12 Dec 2025`.
    EnGb,
}

impl Locale {
    /// Returns a list of strings representing the possible locale names.
    pub fn possible_names() -> &'static [&'static str] {
        &["en-US", "en-GB"]
    }

    /// Return the name of this locale as a BCP 47 tag.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
        }
    }

    /// Format a single day, e.g., `Dec 12, 2025` or `12 Dec 2025`.
    pub fn format_date(&self, day: NaiveDate) -> String {
        match *self {
            Locale::EnUs => day.format("%b %-d, %Y").to_string(),
            Locale::EnGb => day.format("%-d %b %Y").to_string(),
        }
    }

    /// Format a date range as compactly as possible.
    ///
    /// A single day is formatted like `format_date`. Days in the same month
    /// share the month and year (`12–13 Dec 2025`), and days in the same year
    /// share the year (`Nov 30 – Dec 2, 2025`). Otherwise both ends are
    /// formatted in full.
    pub fn format_range(&self, range: &DateRange) -> String {
        let (s, e) = (range.start(), range.end());
        if s == e {
            return self.format_date(s);
        }
        if s.year() == e.year() && s.month() == e.month() {
            return format!("{}–{} {}", s.day(), e.day(), s.format("%b %Y"));
        }
        if s.year() == e.year() {
            return match *self {
                Locale::EnUs => format!(
                    "{} – {}",
                    s.format("%b %-d"),
                    e.format("%b %-d, %Y")
                ),
                Locale::EnGb => format!(
                    "{} – {}",
                    s.format("%-d %b"),
                    e.format("%-d %b %Y")
                ),
            };
        }
        format!("{} – {}", self.format_date(s), self.format_date(e))
    }
}

impl Default for Locale {
    fn default() -> Locale {
        Locale::EnUs
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Locale> {
        match &*s.to_lowercase() {
            "en-us" => Ok(Locale::EnUs),
            "en-gb" => Ok(Locale::EnGb),
            _ => Err(Error::unknown_locale(s)),
        }
    }
}

impl Serialize for Locale {
    fn serialize<S>(&self, s: S) -> result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_str())
    }
}

impl<'a> Deserialize<'a> for Locale {
    fn deserialize<D>(d: D) -> result::Result<Locale, D::Error>
    where
        D: Deserializer<'a>,
    {
        use serde::de::Error;

        let name = String::deserialize(d)?;
        name.parse().map_err(|e: self::Error| D::Error::custom(e.to_string()))
    }
}
