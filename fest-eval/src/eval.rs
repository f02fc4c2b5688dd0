use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;
use std::vec;

use chrono::NaiveDate;
use fest_index::{
    parse_records, Catalog, Config, EventRecord, Locale, NiceDuration, Query,
    Ranking, Searcher,
};
use serde::{Deserialize, Serialize};

/// The default truth data used in an evaluation. It's small enough that we
/// embed it directly into the binary.
const TRUTH_DATA: &str = include_str!("../../data/eval/truth.toml");

/// The default event catalog searched by an evaluation.
const CATALOG_DATA: &str = include_str!("../../data/eval/catalog.json");

/// The truth data for our evaluation.
///
/// The truth data consists of the day on which every query is run and a set
/// of information needs that we call "tasks."
#[derive(Clone, Debug, Deserialize)]
pub struct Truth {
    today: NaiveDate,
    #[serde(rename = "task")]
    tasks: Vec<Task>,
}

/// A task or "information need" defined by the truth data. Each task
/// corresponds to a query that someone might type, and each task has a single
/// correct answer: the identifier of the event they were looking for.
#[derive(Clone, Debug, Deserialize)]
struct Task {
    query: String,
    answer: String,
}

impl Truth {
    /// Load the truth data embedded in this program.
    pub fn builtin() -> anyhow::Result<Truth> {
        Ok(toml::from_str(TRUTH_DATA)?)
    }

    /// Load truth data from the given TOML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Truth> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Replace the day on which the tasks are evaluated.
    pub fn with_today(mut self, today: NaiveDate) -> Truth {
        self.today = today;
        self
    }

    /// The day on which the tasks are evaluated.
    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Load the event catalog embedded in this program.
pub fn builtin_catalog() -> anyhow::Result<Vec<EventRecord>> {
    Ok(parse_records(CATALOG_DATA)?)
}

/// A specification for running an evaluation. Fundamentally, a specification
/// describes the thing we want to evaluate: a specific configuration of how
/// we build *and* search an event catalog.
///
/// The locale is a catalog setting, since it determines how each event's
/// dates are rendered into its searchable text. The ranking and result size
/// are query time settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Spec {
    result_size: usize,
    ranking: Ranking,
    locale: Locale,
}

impl Spec {
    /// Create a new spec using a default configuration.
    pub fn new() -> Spec {
        Spec {
            result_size: 30,
            ranking: Ranking::default(),
            locale: Locale::default(),
        }
    }

    /// Set the result size for this specification.
    ///
    /// This returns an error if the given size is less than `1`.
    pub fn with_result_size(
        mut self,
        result_size: usize,
    ) -> anyhow::Result<Spec> {
        if result_size < 1 {
            anyhow::bail!(
                "result size {} is invalid, must be greater than 0",
                result_size
            );
        }
        self.result_size = result_size;
        Ok(self)
    }

    /// Set the ranking for this specification.
    pub fn with_ranking(mut self, ranking: Ranking) -> Spec {
        self.ranking = ranking;
        self
    }

    /// Set the locale for this specification.
    pub fn with_locale(mut self, locale: Locale) -> Spec {
        self.locale = locale;
        self
    }

    /// Evaluate this specification over the given event records against
    /// the given truth data.
    pub fn evaluate(
        &self,
        records: &[EventRecord],
        truth: &Truth,
    ) -> Evaluation<'_> {
        let searcher = Searcher::new(self.config());
        let catalog = searcher.catalog(records.iter().cloned(), truth.today);
        Evaluation {
            evaluator: Evaluator { spec: self, searcher, catalog },
            tasks: truth.tasks.clone().into_iter(),
        }
    }

    fn config(&self) -> Config {
        Config::new().with_ranking(self.ranking).with_locale(self.locale)
    }

    /// Create a query derived from this specification and a particular
    /// information need or "task."
    fn query(&self, task: &Task) -> Query {
        Query::new().text(&task.query).size(self.result_size)
    }
}

impl Default for Spec {
    fn default() -> Spec {
        Spec::new()
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "size-{}_ranking-{}_locale-{}",
            self.result_size, self.ranking, self.locale,
        )
    }
}

/// A summary of the results of evaluating every task for a single evaluation
/// specification. The summary boils the quality of the specification down to
/// two figures: the mean reciprocal rank and the ratio of tasks that produced
/// an answer.
///
/// The mean reciprocal rank answers: "If your search produced the correct
/// event, how highly was it ranked?" The found ratio answers: "Of the
/// searches ran, how many produced the correct event at any rank?"
#[derive(Debug, Deserialize, Serialize)]
pub struct Summary {
    /// The specification name that this result is summarizing.
    pub name: String,
    /// Mean reciprocal rank.
    pub mrr: f64,
    /// The ratio of tasks that found an answer. The higher the better.
    pub found: f64,
}

impl Summary {
    /// Returns a summary for every distinct specification found in the given
    /// results, ordered by specification name.
    ///
    /// If no results are given, then no summaries are returned.
    pub fn from_task_results(results: &[TaskResult]) -> Vec<Summary> {
        let mut grouped: BTreeMap<&str, Vec<&TaskResult>> = BTreeMap::new();
        for result in results {
            grouped.entry(&result.name).or_insert_with(Vec::new).push(result);
        }
        grouped
            .values()
            .map(|results| Summary::from_same_task_results(results))
            .collect()
    }

    /// Returns a summary for a single group of task results. All the results
    /// given must have the same name, otherwise this panics. This also panics
    /// if the given results are empty.
    fn from_same_task_results(results: &[&TaskResult]) -> Summary {
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| results[0].name == r.name));

        let mut precision_sum = 0.0;
        let mut found = 0u64;
        for r in results {
            precision_sum += r.rank.map_or(0.0, |rank| 1.0 / (rank as f64));
            if r.rank.is_some() {
                found += 1;
            }
        }
        Summary {
            name: results[0].name.clone(),
            mrr: precision_sum / (results.len() as f64),
            found: (found as f64) / (results.len() as f64),
        }
    }
}

/// The result of evaluating a single information need or "task."
#[derive(Debug, Deserialize, Serialize)]
pub struct TaskResult {
    /// The name of the evaluation's spec, which includes every parameter
    /// that influences the evaluation.
    pub name: String,
    /// The freeform text query, as an end user would type it.
    pub query: String,
    /// The identifier of the event the end user was looking for.
    pub answer: String,
    /// The 1-based position of the answer in the search results, if it was
    /// found at all.
    ///
    /// Search results have no scores that could tie, so the rank is simply
    /// the answer's absolute position.
    pub rank: Option<u64>,
    /// The time it took to execute this query, in seconds.
    pub duration_seconds: f64,
}

/// An evaluation is an iterator over all of the results of evaluating every
/// information need in the truth data.
#[derive(Debug)]
pub struct Evaluation<'s> {
    /// The evaluator, which turns an information need into a `TaskResult`.
    evaluator: Evaluator<'s>,
    /// All of the tasks to evaluate.
    tasks: vec::IntoIter<Task>,
}

impl<'s> Iterator for Evaluation<'s> {
    type Item = TaskResult;

    fn next(&mut self) -> Option<TaskResult> {
        self.tasks.next().map(|task| self.evaluator.run(&task))
    }
}

/// An evaluator executes a single search for a single information need and
/// records how it went in a `TaskResult`.
#[derive(Debug)]
struct Evaluator<'s> {
    /// The evaluation specification.
    spec: &'s Spec,
    /// A searcher configured by the specification.
    searcher: Searcher,
    /// The catalog, built once per specification.
    catalog: Catalog,
}

impl<'s> Evaluator<'s> {
    fn run(&self, task: &Task) -> TaskResult {
        let start = Instant::now();
        let results = self.searcher.search(&self.catalog, &self.spec.query(task));
        let duration = NiceDuration::since(start);
        let rank = results
            .iter()
            .position(|e| e.id() == task.answer)
            .map(|i| i as u64 + 1);
        TaskResult {
            name: self.spec.to_string(),
            query: task.query.clone(),
            answer: task.answer.clone(),
            rank,
            duration_seconds: duration.fractional_seconds(),
        }
    }
}
