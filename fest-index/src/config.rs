use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use toml;

use crate::error::{Error, Result};
use crate::format::Locale;
use crate::search::Ranking;

/// The number of days after an event ends during which it is still shown.
const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Settings that control how a catalog is categorized and searched.
///
/// Every setting has a sensible default, so a configuration file only needs
/// to mention the settings it changes:
///
/// ```toml
/// locale = "en-GB"
/// retention_days = 14
/// sentinel_date = "2025-01-01"
/// ranking = "relevance"
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    locale: Locale,
    retention_days: u32,
    sentinel_date: NaiveDate,
    ranking: Ranking,
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

impl Config {
    /// Create a new configuration with default settings.
    pub fn new() -> Config {
        Config {
            locale: Locale::default(),
            retention_days: DEFAULT_RETENTION_DAYS,
            sentinel_date: default_sentinel_date(),
            ranking: Ranking::default(),
        }
    }

    /// Read a configuration from a TOML file.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| Error::io_path(e, path))?;
        toml::from_str(&contents).map_err(|e| {
            Error::config(format!("{}: {}", path.display(), e))
        })
    }

    /// Set the locale used to format event dates.
    pub fn with_locale(mut self, locale: Locale) -> Config {
        self.locale = locale;
        self
    }

    /// Set the number of days an event stays visible after it ends.
    pub fn with_retention_days(mut self, days: u32) -> Config {
        self.retention_days = days;
        self
    }

    /// Set the day used for events whose date text can't be parsed.
    pub fn with_sentinel_date(mut self, day: NaiveDate) -> Config {
        self.sentinel_date = day;
        self
    }

    /// Set how matching events are ordered within each category.
    pub fn with_ranking(mut self, ranking: Ranking) -> Config {
        self.ranking = ranking;
        self
    }

    /// The locale used to format event dates.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// The number of days an event stays visible after it ends.
    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// The day used for events whose date text can't be parsed.
    pub fn sentinel_date(&self) -> NaiveDate {
        self.sentinel_date
    }

    /// How matching events are ordered within each category.
    pub fn ranking(&self) -> Ranking {
        self.ranking
    }
}

fn default_sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}
