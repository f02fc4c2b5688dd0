use std::cmp::Ordering;
use std::fmt;
use std::result;
use std::str::FromStr;
use std::time::Instant;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::{Catalog, Category, NormalizedEvent};
use crate::config::Config;
use crate::date;
use crate::error::{Error, Result};
use crate::record::EventRecord;
use crate::relevance;
use crate::similarity::token_matches_word;
use crate::util::NiceDuration;

/// Search the given records for `query` as of `today`, using the default
/// configuration.
///
/// The query is treated as plain text: it is split into whitespace delimited
/// tokens and every token must match an event for that event to be returned.
/// Results are in catalog order. An empty query returns the entire catalog.
pub fn search(
    records: &[EventRecord],
    query: &str,
    today: NaiveDate,
) -> Vec<NormalizedEvent> {
    let searcher = Searcher::new(Config::default());
    let catalog = searcher.catalog(records.iter().cloned(), today);
    searcher.search(&catalog, &Query::new().text(query))
}

/// A handle for searching categorized event catalogs.
///
/// A searcher holds only configuration, so a single searcher can be used to
/// build and search many catalogs, including from multiple threads.
///
/// Searching never fails. Every token of a query must match an event in
/// order for the event to be included in the results. A token matches an
/// event when:
///
/// * the token is a substring of the event's searchable text,
/// * the token is a numeric date (e.g., `18/12/25`) that falls within the
///   event's dates, or
/// * the token is similar enough to any word in the event's searchable text.
///
/// Results retain catalog order, unless the searcher is configured with
/// `Ranking::Relevance`.
#[derive(Clone, Debug, Default)]
pub struct Searcher {
    config: Config,
}

impl Searcher {
    /// Create a new searcher with the given configuration.
    pub fn new(config: Config) -> Searcher {
        Searcher { config }
    }

    /// Return the configuration used by this searcher.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a catalog for `today` using this searcher's configuration.
    pub fn catalog<I: IntoIterator<Item = EventRecord>>(
        &self,
        records: I,
        today: NaiveDate,
    ) -> Catalog {
        Catalog::build(records, today, &self.config)
    }

    /// Execute a search with the given `Query` over a catalog.
    pub fn search(
        &self,
        catalog: &Catalog,
        query: &Query,
    ) -> Vec<NormalizedEvent> {
        let start = Instant::now();
        let mut results: Vec<NormalizedEvent> = catalog
            .events()
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        if self.config.ranking() == Ranking::Relevance
            && !query.tokens.is_empty()
        {
            results = rank_by_relevance(results, &query.tokens());
        }
        if let Some(size) = query.size {
            results.truncate(size);
        }
        debug!(
            "search for '{}' matched {} of {} events in {}",
            query,
            results.len(),
            catalog.len(),
            NiceDuration::since(start),
        );
        results
    }
}

/// Reorder events within each category by descending relevance.
///
/// The sort is stable, so events with equal relevance keep catalog order.
fn rank_by_relevance(
    events: Vec<NormalizedEvent>,
    tokens: &[&str],
) -> Vec<NormalizedEvent> {
    let mut ranked: Vec<(f64, NormalizedEvent)> = events
        .into_iter()
        .map(|e| (relevance::score_all(tokens, e.record()), e))
        .collect();
    ranked.sort_by(|(score1, e1), (score2, e2)| {
        e1.category().cmp(&e2.category()).then_with(|| {
            score2.partial_cmp(score1).unwrap_or(Ordering::Equal)
        })
    });
    ranked.into_iter().map(|(_, e)| e).collect()
}

/// How search results are ordered within each category.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Ranking {
    /// Keep catalog order: by date, then by creation time.
    Category,
    /// Order by descending relevance to the query's tokens, falling back to
    /// catalog order for equally relevant events.
    Relevance,
}

impl Ranking {
    /// Returns a list of strings representing the possible ranking names.
    pub fn possible_names() -> &'static [&'static str] {
        &["category", "relevance"]
    }

    /// Return a string representation of this ranking.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Ranking::Category => "category",
            Ranking::Relevance => "relevance",
        }
    }
}

impl Default for Ranking {
    fn default() -> Ranking {
        Ranking::Category
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Ranking {
    type Err = Error;

    fn from_str(s: &str) -> Result<Ranking> {
        match &*s.to_lowercase() {
            "category" => Ok(Ranking::Category),
            "relevance" => Ok(Ranking::Relevance),
            unk => Err(Error::unknown_ranking(unk)),
        }
    }
}

impl Serialize for Ranking {
    fn serialize<S>(&self, s: S) -> result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_str())
    }
}

impl<'a> Deserialize<'a> for Ranking {
    fn deserialize<D>(d: D) -> result::Result<Ranking, D::Error>
    where
        D: Deserializer<'a>,
    {
        use serde::de::Error;

        let name = String::deserialize(d)?;
        name.parse().map_err(|e: self::Error| D::Error::custom(e.to_string()))
    }
}

/// A query that can be used to search a catalog.
///
/// A query consists of free text, broken into whitespace delimited tokens,
/// and optional filters. Filters are matched conjunctively with the tokens.
/// That is, a search result must match every token and every filter.
///
/// A query also has a free-form syntax, available via its `FromStr` impl.
/// Plain words are tokens and braces delimit directives: `{upcoming}`
/// restricts results to a category and `{size:10}` limits the number of
/// results. For example, `{upcoming} {size:5} robotics mumbai`.
///
/// An empty query matches every event.
///
/// The `Serialize` and `Deserialize` implementations for this type use the
/// free-form query syntax.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Query {
    tokens: Vec<Token>,
    categories: Vec<Category>,
    size: Option<usize>,
}

/// A single lowercased query token, along with its interpretation as a date.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct Token {
    text: String,
    date: Option<NaiveDate>,
}

impl Query {
    /// Create a new empty query.
    pub fn new() -> Query {
        Query::default()
    }

    /// Return true if and only if this query has no tokens, no filters and
    /// no size limit.
    ///
    /// Searching with an empty query returns the entire catalog.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
            && self.categories.is_empty()
            && self.size.is_none()
    }

    /// Add the tokens in the given text to this query.
    ///
    /// The text is split on whitespace and braces, and each token is
    /// lowercased. Braces never appear in a token, since they delimit
    /// directives in the free-form query syntax.
    pub fn text(mut self, text: &str) -> Query {
        let words = text
            .split(|c: char| c.is_whitespace() || c == '{' || c == '}')
            .filter(|w| !w.is_empty());
        for word in words {
            self.tokens.push(Token {
                text: word.to_lowercase(),
                date: date::parse_numeric(word),
            });
        }
        self
    }

    /// Add a category to filter by.
    ///
    /// Multiple categories can be added to a query, and search results must
    /// be in at least one of them.
    pub fn category(mut self, category: Category) -> Query {
        if !self.categories.contains(&category) {
            self.categories.push(category);
            self.categories.sort();
        }
        self
    }

    /// Set the maximum number of results to be returned by a search.
    ///
    /// By default, there is no limit.
    pub fn size(mut self, size: usize) -> Query {
        self.size = Some(size);
        self
    }

    /// Return the lowercased tokens of this query.
    pub fn tokens(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| &*t.text).collect()
    }

    fn matches(&self, event: &NormalizedEvent) -> bool {
        if !self.categories.is_empty()
            && !self.categories.contains(&event.category())
        {
            return false;
        }
        self.tokens.iter().all(|t| t.matches(event))
    }
}

impl Token {
    fn matches(&self, event: &NormalizedEvent) -> bool {
        let haystack = event.haystack();
        if haystack.contains(&*self.text) {
            return true;
        }
        if let Some(day) = self.date {
            if event.dates().contains(day) {
                return true;
            }
        }
        haystack.split_whitespace().any(|w| token_matches_word(&self.text, w))
    }
}

impl Serialize for Query {
    fn serialize<S>(&self, s: S) -> result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.to_string())
    }
}

impl<'a> Deserialize<'a> for Query {
    fn deserialize<D>(d: D) -> result::Result<Query, D::Error>
    where
        D: Deserializer<'a>,
    {
        use serde::de::Error;

        let querystr = String::deserialize(d)?;
        querystr
            .parse()
            .map_err(|e: self::Error| D::Error::custom(e.to_string()))
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(qstr: &str) -> Result<Query> {
        lazy_static! {
            // A directive is anything in braces. Everything else between
            // braces and whitespace is a term.
            static ref PARTS: Regex = Regex::new(
                r"\{(?P<directive>[^}]+)\}|(?P<terms>[^{}\s]+)"
            ).unwrap();
        }
        let mut q = Query::new();
        for caps in PARTS.captures_iter(qstr) {
            if let Some(m) = caps.name("terms") {
                q = q.text(m.as_str());
                continue;
            }
            let directive = &caps["directive"];
            let (name, val) = match directive.find(':') {
                None => {
                    q = q.category(directive.trim().parse()?);
                    continue;
                }
                Some(i) => (directive[..i].trim(), directive[i + 1..].trim()),
            };
            match name {
                "size" | "limit" => {
                    q = q.size(val.parse().map_err(Error::number)?);
                }
                "category" | "cat" => {
                    q = q.category(val.parse()?);
                }
                unk => return Err(Error::unknown_directive(unk)),
            }
        }
        Ok(q)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = vec![];
        if let Some(size) = self.size {
            parts.push(format!("{{size:{}}}", size));
        }
        for category in &self.categories {
            parts.push(format!("{{{}}}", category));
        }
        for token in &self.tokens {
            parts.push(token.text.clone());
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json;

    use crate::error::ErrorKind;
    use crate::tests::{event, ymd};

    use super::*;

    fn today() -> NaiveDate {
        ymd(2025, 12, 12)
    }

    fn fests() -> Vec<EventRecord> {
        vec![
            event("oasis", "5th to 7th Dec 25")
                .college("BITS Pilani")
                .event("Oasis")
                .city("Pilani")
                .kind("Cultural")
                .competition("Inter College")
                .sub_event("Street Play", "Theatre"),
            event("mood", "20th to 23rd Dec 25")
                .college("IIT Bombay")
                .event("Mood Indigo")
                .city("Mumbai")
                .kind("Cultural")
                .competition("Inter College")
                .sub_event("Livewire", "Music"),
            event("techno", "17th to 19th Dec 25")
                .college("Vidyalankar Institute")
                .event("Technovanza")
                .city("Wadala, Mumbai")
                .kind("Technical")
                .competition("Inter College")
                .sub_event("Robo Wars", "Robotics"),
            event("pandu", "12th to 13th Dec 25")
                .college("Pandurang College")
                .event("Pandu Fest")
                .city("Pune")
                .kind("Cultural")
                .competition("Inter College")
                .sub_event("Battle of Bands", "Music"),
        ]
    }

    fn ids(results: &[NormalizedEvent]) -> Vec<&str> {
        results.iter().map(|e| e.id()).collect()
    }

    fn find(query: &str) -> Vec<String> {
        search(&fests(), query, today())
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    fn find_with(searcher: &Searcher, query: Query) -> Vec<String> {
        let catalog = searcher.catalog(fests(), today());
        searcher
            .search(&catalog, &query)
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    #[test]
    fn empty_query_is_whole_catalog() {
        let catalog = Searcher::default().catalog(fests(), today());
        let all: Vec<&str> =
            catalog.events().iter().map(|e| e.id()).collect();
        assert_eq!(all, vec!["pandu", "techno", "mood", "oasis"]);
        assert_eq!(find(""), all);
        assert_eq!(find("   "), all);
    }

    #[test]
    fn substring_match() {
        assert_eq!(find("Pandu"), vec!["pandu"]);
        assert_eq!(find("INDIGO"), vec!["mood"]);
        assert_eq!(find("robotics"), vec!["techno"]);
    }

    #[test]
    fn fuzzy_match() {
        assert!(find("Pnadu").contains(&"pandu".to_string()));
        assert_eq!(find("tecnovanza"), vec!["techno"]);
    }

    #[test]
    fn no_match() {
        assert!(find("xyz123").is_empty());
        assert!(find("pandu xyz123").is_empty());
    }

    #[test]
    fn tokens_are_conjunctive() {
        assert_eq!(find("mumbai"), vec!["techno", "mood"]);
        assert_eq!(find("mumbai music"), vec!["mood"]);

        for &(a, b) in
            &[("cultural", "mumbai"), ("music", "mumbai"), ("robo", "wars")]
        {
            let both = find(&format!("{} {}", a, b));
            let (left, right) = (find(a), find(b));
            let expected: Vec<String> = left
                .iter()
                .filter(|id| right.contains(id))
                .cloned()
                .collect();
            assert_eq!(both, expected, "query: {} {}", a, b);
        }
    }

    #[test]
    fn numeric_date_token() {
        assert_eq!(find("18/12/25"), vec!["techno"]);
        assert_eq!(find("6th/12/25"), vec!["oasis"]);
        assert!(find("01/01/26").is_empty());
    }

    #[test]
    fn created_at_breaks_ties() {
        let records = vec![
            event("late", "10th to 14th Dec 25").college("A").created_at(9),
            event("early", "10th to 12th Dec 25").college("A").created_at(3),
        ];
        let results = search(&records, "a", today());
        assert_eq!(ids(&results), vec!["early", "late"]);
        assert!(results.iter().all(|e| e.category() == Category::Current));
    }

    #[test]
    fn absent_fields() {
        let mut records = fests();
        records.push(event("bare", "14th Dec 25"));
        let results = search(&records, "pandu", today());
        assert_eq!(ids(&results), vec!["pandu"]);
        let results = search(&records, "", today());
        assert_eq!(results.len(), 5);
        assert!(search(&[], "pandu", today()).is_empty());
    }

    #[test]
    fn category_filter() {
        let searcher = Searcher::default();
        let q = Query::new().category(Category::Past);
        assert_eq!(find_with(&searcher, q), vec!["oasis"]);

        let q = Query::new()
            .text("cultural")
            .category(Category::Current)
            .category(Category::Upcoming);
        assert_eq!(find_with(&searcher, q), vec!["pandu", "mood"]);
    }

    #[test]
    fn size_limit() {
        let q = Query::new().text("cultural").size(2);
        assert_eq!(find_with(&Searcher::default(), q), vec!["pandu", "mood"]);
    }

    #[test]
    fn relevance_ranking_within_category() {
        let category = Searcher::default();
        let relevance =
            Searcher::new(Config::new().with_ranking(Ranking::Relevance));

        let q = Query::new().text("mumbai");
        assert_eq!(find_with(&category, q.clone()), vec!["techno", "mood"]);
        assert_eq!(find_with(&relevance, q), vec!["mood", "techno"]);

        // Relevance never moves an event out of its category.
        let q = Query::new().text("cultural");
        assert_eq!(find_with(&relevance, q), vec!["pandu", "mood", "oasis"]);

        // Without tokens, relevance is meaningless and catalog order is kept.
        assert_eq!(
            find_with(&relevance, Query::new()),
            vec!["pandu", "techno", "mood", "oasis"],
        );
    }

    #[test]
    fn relevance_ties_keep_catalog_order() {
        let records = vec![
            event("late", "10th to 14th Dec 25").college("Acme").created_at(9),
            event("early", "10th to 12th Dec 25").college("Acme").created_at(3),
            event("next", "20th Dec 25").college("Acme"),
        ];
        let searcher =
            Searcher::new(Config::new().with_ranking(Ranking::Relevance));
        let catalog = searcher.catalog(records, today());
        let results = searcher.search(&catalog, &Query::new().text("acme"));
        assert_eq!(ids(&results), vec!["early", "late", "next"]);
    }

    #[test]
    fn empty_query() {
        assert!(Query::new().is_empty());
        assert!(Query::new().text("  ").is_empty());
        assert!(!Query::new().size(0).is_empty());
        assert!(!Query::new().category(Category::Past).is_empty());

        let searcher = Searcher::default();
        assert!(find_with(&searcher, Query::new().size(0)).is_empty());
    }

    #[test]
    fn ranking_names() {
        for name in Ranking::possible_names() {
            let ranking: Ranking = name.parse().unwrap();
            assert_eq!(ranking.to_string(), *name);
        }
        assert_eq!("Relevance".parse::<Ranking>().unwrap(), Ranking::Relevance);
        assert!("date".parse::<Ranking>().is_err());
        match *"score".parse::<Ranking>().unwrap_err().kind() {
            ErrorKind::UnknownRanking(ref unk) => assert_eq!(unk, "score"),
            ref k => panic!("unexpected error kind: {:?}", k),
        }
    }

    #[test]
    fn query_parser() {
        let q: Query = "Robo Wars".parse().unwrap();
        assert_eq!(q, Query::new().text("robo wars"));
        assert_eq!(q.tokens(), vec!["robo", "wars"]);

        let q: Query = "{upcoming} {size:1} mumbai".parse().unwrap();
        assert_eq!(
            q,
            Query::new().text("mumbai").category(Category::Upcoming).size(1),
        );
        assert_eq!(find_with(&Searcher::default(), q), vec!["techno"]);

        let q: Query = "{ category : past }{current}".parse().unwrap();
        assert_eq!(
            q,
            Query::new().category(Category::Past).category(Category::Current),
        );

        assert!("".parse::<Query>().unwrap().is_empty());
    }

    #[test]
    fn query_parser_error() {
        assert!("{later}".parse::<Query>().is_err());
        assert!("{size:a}".parse::<Query>().is_err());
        match *"{sort:date}".parse::<Query>().unwrap_err().kind() {
            ErrorKind::UnknownDirective(ref unk) => assert_eq!(unk, "sort"),
            ref k => panic!("unexpected error kind: {:?}", k),
        }
    }

    #[test]
    fn query_display() {
        let q = Query::new()
            .text("Robo  Wars")
            .category(Category::Past)
            .category(Category::Current)
            .size(3);
        assert_eq!(q.to_string(), "{size:3} {current} {past} robo wars");
        assert_eq!(q.to_string().parse::<Query>().unwrap(), q);
    }

    #[test]
    fn query_text_braces() {
        let q = Query::new().text("c{++} {past}");
        assert_eq!(q.tokens(), vec!["c", "++", "past"]);
        assert_eq!(q.to_string(), "c ++ past");
        assert_eq!(q.to_string().parse::<Query>().unwrap(), q);
    }

    #[test]
    fn query_serde() {
        #[derive(Debug, Deserialize, PartialEq, Serialize)]
        struct Test {
            query: Query,
        }
        let test = Test { query: Query::new().text("pune").size(5) };
        let json = serde_json::to_string(&test).unwrap();
        assert_eq!(json, r#"{"query":"{size:5} pune"}"#);
        assert_eq!(serde_json::from_str::<Test>(&json).unwrap(), test);
    }
}
