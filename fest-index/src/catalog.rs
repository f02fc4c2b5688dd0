use std::fmt;
use std::result;
use std::str::FromStr;
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Config;
use crate::date::DateRange;
use crate::error::{Error, Result};
use crate::record::EventRecord;
use crate::util::NiceDuration;

/// The temporal bucket of an event relative to the day of evaluation.
///
/// Categories partition every catalog: each retained event belongs to exactly
/// one of them. The derived ordering is also the display order, i.e.,
/// ongoing events come first and recently ended events come last.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Category {
    /// The event is happening today.
    Current,
    /// The event starts after today.
    Upcoming,
    /// The event ended, but recently enough that it is still shown.
    Past,
}

impl Category {
    /// Returns a list of strings representing the possible category names.
    pub fn possible_names() -> &'static [&'static str] {
        &["current", "upcoming", "past"]
    }

    /// Return a string representation of this category.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Category::Current => "current",
            Category::Upcoming => "upcoming",
            Category::Past => "past",
        }
    }

    /// Classify the given date range relative to `today`.
    ///
    /// This doesn't apply any retention window.
    pub fn classify(range: &DateRange, today: NaiveDate) -> Category {
        if range.contains(today) {
            Category::Current
        } else if range.start() > today {
            Category::Upcoming
        } else {
            Category::Past
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Category> {
        match &*s.to_lowercase() {
            "current" => Ok(Category::Current),
            "upcoming" => Ok(Category::Upcoming),
            "past" => Ok(Category::Past),
            unk => Err(Error::unknown_category(unk)),
        }
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, s: S) -> result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_str())
    }
}

impl<'a> Deserialize<'a> for Category {
    fn deserialize<D>(d: D) -> result::Result<Category, D::Error>
    where
        D: Deserializer<'a>,
    {
        use serde::de::Error;

        let name = String::deserialize(d)?;
        name.parse().map_err(|e: self::Error| D::Error::custom(e.to_string()))
    }
}

/// An event record with its dates resolved and its category computed.
///
/// A normalized event is only meaningful with respect to the day its catalog
/// was built for. It is recomputed whenever a catalog is built.
#[derive(Clone, Debug, Serialize)]
pub struct NormalizedEvent {
    record: EventRecord,
    dates: DateRange,
    category: Category,
    sort_key: i64,
    friendly_dates: String,
    #[serde(skip)]
    haystack: String,
}

impl NormalizedEvent {
    fn new(
        record: EventRecord,
        dates: DateRange,
        today: NaiveDate,
        config: &Config,
    ) -> NormalizedEvent {
        let category = Category::classify(&dates, today);
        let sort_key = match category {
            Category::Current | Category::Upcoming => {
                i64::from(dates.start().num_days_from_ce())
            }
            Category::Past => -i64::from(dates.end().num_days_from_ce()),
        };
        let friendly_dates = config.locale().format_range(&dates);
        let haystack = haystack(&record, &friendly_dates);
        NormalizedEvent {
            record,
            dates,
            category,
            sort_key,
            friendly_dates,
            haystack,
        }
    }

    /// The underlying event record.
    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    /// The event's identifier.
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// The resolved dates of this event.
    ///
    /// If the event's date text couldn't be parsed, then this is a single day
    /// range at the configured sentinel date.
    pub fn dates(&self) -> DateRange {
        self.dates
    }

    /// The first day of this event.
    pub fn start(&self) -> NaiveDate {
        self.dates.start()
    }

    /// The last day of this event.
    pub fn end(&self) -> NaiveDate {
        self.dates.end()
    }

    /// The temporal category of this event.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The primary ordering key of this event within its category.
    ///
    /// Smaller keys sort first. For ongoing and upcoming events, this is the
    /// start day. For past events, this is the negated end day, so that the
    /// most recently ended events sort first.
    pub fn sort_key(&self) -> i64 {
        self.sort_key
    }

    /// The dates of this event formatted for display in the catalog's locale.
    pub fn friendly_dates(&self) -> &str {
        &self.friendly_dates
    }

    /// All searchable text of this event, lowercased and joined by spaces.
    pub fn haystack(&self) -> &str {
        &self.haystack
    }
}

/// Assemble the searchable text of an event.
fn haystack(record: &EventRecord, friendly_dates: &str) -> String {
    let mut parts: Vec<&str> = record.text_fields().to_vec();
    for sub in &record.sub_events {
        parts.push(sub.name());
        parts.push(sub.kind());
    }
    parts.push(friendly_dates);
    parts.join(" ").to_lowercase()
}

/// A report of an event whose date text couldn't be parsed.
///
/// Such events are still included in a catalog, but at the sentinel date, so
/// their position in the catalog is likely wrong.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    /// The identifier of the offending event.
    pub id: String,
    /// The date text that couldn't be parsed.
    pub text: String,
    /// Why parsing failed.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "event '{}': {}", self.id, self.message)
    }
}

/// A catalog of events categorized and ordered for a particular day.
///
/// Building a catalog resolves every event's dates, drops events that ended
/// before the retention window and orders the rest: ongoing events first
/// (earliest start first), then upcoming events (soonest first), then past
/// events (most recently ended first). Ties are broken by creation time,
/// oldest first, and then by the order in which records were given.
///
/// Building a catalog never fails. Events with unrecognized date text are
/// placed at the configured sentinel date and reported via `diagnostics`.
#[derive(Clone, Debug)]
pub struct Catalog {
    today: NaiveDate,
    events: Vec<NormalizedEvent>,
    dropped: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Catalog {
    /// Build a catalog for `today` from the given event records.
    pub fn build<I: IntoIterator<Item = EventRecord>>(
        records: I,
        today: NaiveDate,
        config: &Config,
    ) -> Catalog {
        let start = Instant::now();
        let retention = i64::from(config.retention_days());

        let mut diagnostics = vec![];
        let mut dropped = 0;
        let (mut current, mut upcoming, mut past) = (vec![], vec![], vec![]);
        for record in records {
            let (dates, err) = DateRange::parse_or(
                &record.date_range_text,
                config.sentinel_date(),
            );
            if let Some(err) = err {
                warn!(
                    "event '{}': using sentinel date {}: {}",
                    record.id,
                    config.sentinel_date(),
                    err
                );
                diagnostics.push(Diagnostic {
                    id: record.id.clone(),
                    text: record.date_range_text.clone(),
                    message: err.to_string(),
                });
            }
            if today.signed_duration_since(dates.end()).num_days() > retention
            {
                dropped += 1;
                continue;
            }
            let event = NormalizedEvent::new(record, dates, today, config);
            match event.category() {
                Category::Current => current.push(event),
                Category::Upcoming => upcoming.push(event),
                Category::Past => past.push(event),
            }
        }

        let mut events = vec![];
        for mut bucket in vec![current, upcoming, past] {
            bucket.sort_by_key(|e| (e.sort_key, e.record.created_at_or_zero()));
            events.extend(bucket);
        }
        debug!(
            "categorized {} events for {} ({} dropped) in {}",
            events.len(),
            today,
            dropped,
            NiceDuration::since(start),
        );
        Catalog { today, events, dropped, diagnostics }
    }

    /// The day this catalog was categorized for.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// All retained events, in catalog order.
    pub fn events(&self) -> &[NormalizedEvent] {
        &self.events
    }

    /// Consume this catalog and return its events in catalog order.
    pub fn into_events(self) -> Vec<NormalizedEvent> {
        self.events
    }

    /// Returns an iterator over the retained events in the given category,
    /// in catalog order.
    pub fn category(
        &self,
        category: Category,
    ) -> impl Iterator<Item = &NormalizedEvent> {
        self.events.iter().filter(move |e| e.category() == category)
    }

    /// The number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if and only if no events were retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The number of events dropped because they ended before the retention
    /// window.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Reports for every event whose date text couldn't be parsed, including
    /// events that were subsequently dropped.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::{event, ymd};

    use super::*;

    fn build(records: Vec<EventRecord>, today: NaiveDate) -> Catalog {
        Catalog::build(records, today, &Config::new())
    }

    fn ids(catalog: &Catalog) -> Vec<&str> {
        catalog.events().iter().map(|e| e.id()).collect()
    }

    #[test]
    fn ongoing_on_first_day() {
        let catalog =
            build(vec![event("a", "12th to 13th Dec 25")], ymd(2025, 12, 12));
        assert_eq!(catalog.events()[0].category(), Category::Current);
    }

    #[test]
    fn retention_boundary() {
        let records = vec![event("a", "12th to 13th Dec 25")];

        let catalog = build(records.clone(), ymd(2025, 12, 20));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.events()[0].category(), Category::Past);

        let catalog = build(records, ymd(2025, 12, 21));
        assert!(catalog.is_empty());
        assert_eq!(catalog.dropped(), 1);
    }

    #[test]
    fn custom_retention() {
        let config = Config::new().with_retention_days(0);
        let records = vec![event("a", "12th Dec 25")];
        let catalog = Catalog::build(records.clone(), ymd(2025, 12, 12), &config);
        assert_eq!(catalog.len(), 1);
        let catalog = Catalog::build(records, ymd(2025, 12, 13), &config);
        assert_eq!(catalog.len(), 0);
    }

    #[test]
    fn categories_in_order() {
        let records = vec![
            event("past-old", "3rd Dec 25"),
            event("upcoming-late", "20th Dec 25"),
            event("current-late", "9th to 11th Dec 25"),
            event("past-recent", "5th to 8th Dec 25"),
            event("upcoming-soon", "11th to 15th Dec 25"),
            event("current-early", "1st to 10th Dec 25"),
            event("gone", "1st Nov 25"),
        ];
        let catalog = build(records, ymd(2025, 12, 10));
        assert_eq!(
            ids(&catalog),
            vec![
                "current-early",
                "current-late",
                "upcoming-soon",
                "upcoming-late",
                "past-recent",
                "past-old",
            ],
        );
        let cats: Vec<Category> =
            catalog.events().iter().map(|e| e.category()).collect();
        assert_eq!(
            cats,
            vec![
                Category::Current,
                Category::Current,
                Category::Upcoming,
                Category::Upcoming,
                Category::Past,
                Category::Past,
            ],
        );
        assert_eq!(catalog.dropped(), 1);
        assert_eq!(catalog.category(Category::Upcoming).count(), 2);
    }

    #[test]
    fn created_at_breaks_ties() {
        let records = vec![
            event("b", "10th to 12th Dec 25").created_at(20),
            event("none", "10th to 11th Dec 25"),
            event("a", "10th to 14th Dec 25").created_at(10),
        ];
        let catalog = build(records, ymd(2025, 12, 10));
        assert_eq!(ids(&catalog), vec!["none", "a", "b"]);
    }

    #[test]
    fn stable_for_full_ties() {
        let records = vec![
            event("x", "20th Dec 25").created_at(5),
            event("y", "20th Dec 25").created_at(5),
            event("z", "20th Dec 25").created_at(5),
        ];
        let catalog = build(records, ymd(2025, 12, 10));
        assert_eq!(ids(&catalog), vec!["x", "y", "z"]);
    }

    #[test]
    fn past_sorts_by_most_recent_end() {
        let records = vec![
            event("long", "1st to 8th Dec 25").created_at(1),
            event("short", "8th Dec 25").created_at(0),
            event("older", "4th to 6th Dec 25"),
        ];
        let catalog = build(records, ymd(2025, 12, 10));
        assert_eq!(ids(&catalog), vec!["short", "long", "older"]);
        assert_eq!(
            catalog.events()[0].sort_key(),
            -i64::from(ymd(2025, 12, 8).num_days_from_ce()),
        );
    }

    #[test]
    fn deterministic() {
        let records = vec![
            event("a", "10th Dec 25"),
            event("b", "10th Dec 25"),
            event("c", "9th to 12th Dec 25"),
            event("d", "TBA"),
            event("e", "3rd Dec 25"),
        ];
        let first = build(records.clone(), ymd(2025, 12, 10));
        let second = build(records, ymd(2025, 12, 10));
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn partition() {
        let records: Vec<EventRecord> = (1..=28)
            .map(|d| event(&d.to_string(), &format!("{} to {} Nov 25", d, d + 2)))
            .collect();
        let today = ymd(2025, 11, 20);
        let catalog = build(records.clone(), today);
        for e in catalog.events() {
            let expected = if e.start() <= today && today <= e.end() {
                Category::Current
            } else if e.start() > today {
                Category::Upcoming
            } else {
                Category::Past
            };
            assert_eq!(e.category(), expected, "event {}", e.id());
        }
        let kept: Vec<&str> = ids(&catalog);
        for r in &records {
            if !kept.contains(&&*r.id) {
                let dates: DateRange = r.date_range_text.parse().unwrap();
                assert!(dates.end() + chrono::Duration::days(7) < today);
            }
        }
        assert_eq!(catalog.len() + catalog.dropped(), records.len());
    }

    #[test]
    fn unparseable_dates_use_sentinel() {
        let config = Config::new().with_sentinel_date(ymd(2025, 12, 9));
        let records = vec![event("tba", "TBA"), event("ok", "10th Dec 25")];
        let catalog = Catalog::build(records, ymd(2025, 12, 10), &config);
        assert_eq!(ids(&catalog), vec!["ok", "tba"]);
        assert_eq!(
            catalog.events()[1].dates(),
            DateRange::single(ymd(2025, 12, 9)),
        );
        assert_eq!(catalog.diagnostics().len(), 1);
        assert_eq!(catalog.diagnostics()[0].id, "tba");
        assert_eq!(catalog.diagnostics()[0].text, "TBA");
    }

    #[test]
    fn default_sentinel_is_dropped_eventually() {
        let catalog = build(vec![event("tba", "")], ymd(2025, 12, 10));
        assert!(catalog.is_empty());
        assert_eq!(catalog.diagnostics().len(), 1);
    }

    #[test]
    fn haystack_contents() {
        let record = event("pandu", "25th to 26th Nov 25")
            .college("Pandurang College")
            .event("Pandu Fest")
            .city("Pune")
            .kind("Cultural")
            .sub_event("Battle of Bands", "Music");
        let catalog = build(vec![record], ymd(2025, 11, 1));
        assert_eq!(
            catalog.events()[0].haystack(),
            "pandurang college pandu fest pune cultural  \
             battle of bands music 25–26 nov 2025",
        );
        assert_eq!(catalog.events()[0].friendly_dates(), "25–26 Nov 2025");
    }

    #[test]
    fn empty() {
        let catalog = build(vec![], ymd(2025, 12, 10));
        assert!(catalog.is_empty());
        assert!(catalog.diagnostics().is_empty());
    }

    #[test]
    fn category_names() {
        for name in Category::possible_names() {
            let cat: Category = name.parse().unwrap();
            assert_eq!(cat.to_string(), *name);
        }
        assert_eq!("Upcoming".parse::<Category>().unwrap(), Category::Upcoming);
        assert!("ongoing".parse::<Category>().is_err());
        assert!("later".parse::<Category>().is_err());
    }

    #[test]
    fn category_serde() {
        let json = serde_json::to_string(&Category::Past).unwrap();
        assert_eq!(json, r#""past""#);
        let cat: Category = serde_json::from_str(r#""Current""#).unwrap();
        assert_eq!(cat, Category::Current);
        assert!(serde_json::from_str::<Category>(r#""ended""#).is_err());
    }
}
