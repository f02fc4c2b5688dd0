use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use chrono::NaiveDate;
use fest_index::{read_records, EventRecord, Locale, Ranking};

use crate::eval::{Spec, Truth};

mod eval;
mod logger;

fn main() {
    if let Err(err) = try_main() {
        // A pipe error occurs when the consumer of this process's output has
        // hung up. This is a normal event, and we should quit gracefully.
        if is_pipe_error(&err) {
            process::exit(0);
        }
        eprintln!("{:?}", err);
        process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    logger::init()?;
    log::set_max_level(log::LevelFilter::Info);

    let args = Args::from_matches(&app().get_matches())?;
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    }
    if let Some(ref summarize) = args.summarize {
        return run_summarize(summarize);
    } else if args.dry_run {
        for spec in args.specs()? {
            println!("{}", spec);
        }
        return Ok(());
    }
    run_eval(&args.records()?, &args.truth()?, args.specs()?)
}

/// Run an evaluation of every spec given over the given event records.
///
/// The specs given each describe the protocol for an evaluation: how the
/// catalog is built and how queries are ranked. The specification is
/// fundamentally the thing we want to evaluate. That is, we want to find the
/// "best" specification.
fn run_eval(
    records: &[EventRecord],
    truth: &Truth,
    specs: Vec<Spec>,
) -> anyhow::Result<()> {
    log::debug!(
        "evaluating {} specs over {} events as of {}",
        specs.len(),
        records.len(),
        truth.today(),
    );
    let mut wtr = csv::Writer::from_writer(io::stdout());
    for spec in &specs {
        for result in spec.evaluate(records, truth) {
            wtr.serialize(result)?;
        }
        wtr.flush()?;
    }
    Ok(())
}

/// Summarize the evaluation results at the given path.
fn run_summarize(summarize: &Path) -> anyhow::Result<()> {
    let mut results: Vec<eval::TaskResult> = vec![];
    let mut rdr = csv::Reader::from_path(summarize)?;
    for result in rdr.deserialize() {
        results.push(result?);
    }

    let mut wtr = csv::Writer::from_writer(io::stdout());
    for summary in eval::Summary::from_task_results(&results) {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug)]
struct Args {
    catalog: Option<PathBuf>,
    debug: bool,
    dry_run: bool,
    locales: Vec<Locale>,
    rankings: Vec<Ranking>,
    result_sizes: Vec<usize>,
    summarize: Option<PathBuf>,
    today: Option<NaiveDate>,
    truth: Option<PathBuf>,
}

impl Args {
    /// Build a structured set of arguments from clap's matches.
    fn from_matches(matches: &clap::ArgMatches) -> anyhow::Result<Args> {
        let today = match matches.value_of_lossy("today") {
            None => None,
            Some(today) => Some(today.parse()?),
        };
        Ok(Args {
            catalog: matches.value_of_os("catalog").map(PathBuf::from),
            debug: matches.is_present("debug"),
            dry_run: matches.is_present("dry-run"),
            locales: parse_many_lossy(
                matches,
                "locale",
                vec![Locale::EnUs, Locale::EnGb],
            )?,
            rankings: parse_many_lossy(
                matches,
                "ranking",
                vec![Ranking::Category, Ranking::Relevance],
            )?,
            result_sizes: parse_many_lossy(matches, "result-size", vec![30])?,
            summarize: matches.value_of_os("summarize").map(PathBuf::from),
            today,
            truth: matches.value_of_os("truth").map(PathBuf::from),
        })
    }

    /// Build all evaluation specifications as indicated by command line
    /// options.
    fn specs(&self) -> anyhow::Result<Vec<Spec>> {
        // We want every permutation. Each additional parameter
        // combinatorially explodes the previous set of specifications.
        let mut specs = vec![];
        for &result_size in &self.result_sizes {
            let spec = Spec::new().with_result_size(result_size)?;
            for &ranking in &self.rankings {
                for &locale in &self.locales {
                    specs.push(
                        spec.clone().with_ranking(ranking).with_locale(locale),
                    );
                }
            }
        }
        Ok(specs)
    }

    fn records(&self) -> anyhow::Result<Vec<EventRecord>> {
        match self.catalog {
            None => eval::builtin_catalog(),
            Some(ref path) => Ok(read_records(path)?),
        }
    }

    fn truth(&self) -> anyhow::Result<Truth> {
        let truth = match self.truth {
            None => Truth::builtin()?,
            Some(ref path) => Truth::from_path(path)?,
        };
        Ok(match self.today {
            None => truth,
            Some(today) => truth.with_today(today),
        })
    }
}

fn app() -> clap::App<'static, 'static> {
    use clap::{App, AppSettings, Arg};

    App::new("fest-eval")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .max_term_width(100)
        .setting(AppSettings::UnifiedHelpMessage)
        .arg(Arg::with_name("catalog")
             .long("catalog")
             .env("FEST_SEARCH_CATALOG")
             .takes_value(true)
             .help("A JSON file of event records to search. By default, an \
                    evaluation uses a catalog embedded in fest-eval."))
        .arg(Arg::with_name("debug")
             .long("debug")
             .help("Show debug messages. Use this when filing bugs."))
        .arg(Arg::with_name("dry-run")
             .long("dry-run")
             .help("Show the evaluations that would be run and then exit \
                    without running them."))
        .arg(Arg::with_name("locale")
             .long("locale")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .possible_values(Locale::possible_names())
             .case_insensitive(true)
             .help("Set the locale used to render searchable dates. An \
                    evaluation is performed for each locale given. By \
                    default, all locales are used."))
        .arg(Arg::with_name("ranking")
             .long("ranking")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .possible_values(Ranking::possible_names())
             .case_insensitive(true)
             .help("Set the ranking used within each category. An \
                    evaluation is performed for each ranking given. By \
                    default, all rankings are used."))
        .arg(Arg::with_name("result-size")
             .long("result-size")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .help("Set the result size on which to perform an evaluation. \
                    An evaluation will be performed for each result size. \
                    If no result size is given, a default of 30 is used."))
        .arg(Arg::with_name("summarize")
             .long("summarize")
             .takes_value(true)
             .number_of_values(1)
             .help("Print summary statistics from an evaluation run."))
        .arg(Arg::with_name("today")
             .long("today")
             .takes_value(true)
             .help("Evaluate as of this day (YYYY-MM-DD) instead of the day \
                    recorded in the truth data."))
        .arg(Arg::with_name("truth")
             .long("truth")
             .takes_value(true)
             .help("A file path containing evaluation truth data. By default, \
                    an evaluation uses truth data embedded in fest-eval."))
}

/// Parse a sequence of values from clap.
fn parse_many_lossy<T>(
    matches: &clap::ArgMatches,
    name: &str,
    default: Vec<T>,
) -> anyhow::Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let strs = match matches.values_of_lossy(name) {
        None => return Ok(default),
        Some(strs) => strs,
    };
    let mut values = vec![];
    for s in strs {
        values.push(s.parse()?);
    }
    Ok(values)
}

/// Return true if and only if an I/O broken pipe error exists in the causal
/// chain of the given error.
fn is_pipe_error(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(ioerr) = cause.downcast_ref::<io::Error>() {
            if ioerr.kind() == io::ErrorKind::BrokenPipe {
                return true;
            }
        }
    }
    false
}
