use std::io;
use std::path::PathBuf;
use std::process;

use chrono::{Local, NaiveDate};
use fest_index::{
    read_records, Category, Config, Locale, Query, Ranking, Searcher,
};
use lazy_static::lazy_static;

use crate::util::{write_diagnostics, write_tsv};

mod logger;
mod util;

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

    let records = read_records(&args.catalog)?;
    let searcher = Searcher::new(args.config()?);
    let catalog = searcher.catalog(records, args.today);
    if args.diagnostics {
        return write_diagnostics(io::stdout(), catalog.diagnostics());
    }
    let results = searcher.search(&catalog, &args.query()?);
    if results.is_empty() {
        log::info!("no events match '{}'", args.query);
    }
    write_tsv(io::stdout(), &results)
}

#[derive(Debug)]
struct Args {
    catalog: PathBuf,
    categories: Vec<Category>,
    config: Option<PathBuf>,
    debug: bool,
    diagnostics: bool,
    limit: Option<usize>,
    locale: Option<Locale>,
    query: String,
    ranking: Option<Ranking>,
    retention_days: Option<u32>,
    today: NaiveDate,
}

impl Args {
    fn from_matches(matches: &clap::ArgMatches) -> anyhow::Result<Args> {
        let catalog = match matches.value_of_os("catalog") {
            Some(path) => PathBuf::from(path),
            None => anyhow::bail!(
                "no event catalog given, use --catalog or set \
                 FEST_SEARCH_CATALOG"
            ),
        };
        let query = matches
            .values_of_lossy("query")
            .map(|words| words.join(" "))
            .unwrap_or_default();
        let categories = matches
            .values_of_lossy("category")
            .unwrap_or_default()
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Category>, _>>()?;
        let today = match matches.value_of_lossy("today") {
            None => TODAY.parse()?,
            Some(today) => today.parse()?,
        };
        Ok(Args {
            catalog,
            categories,
            config: matches.value_of_os("config").map(PathBuf::from),
            debug: matches.is_present("debug"),
            diagnostics: matches.is_present("diagnostics"),
            limit: parse_opt(matches, "limit")?,
            locale: parse_opt(matches, "locale")?,
            query,
            ranking: parse_opt(matches, "ranking")?,
            retention_days: parse_opt(matches, "retention-days")?,
            today,
        })
    }

    /// Build the search configuration, letting flags override the settings
    /// in the configuration file.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match self.config {
            None => Config::new(),
            Some(ref path) => Config::from_toml_path(path)?,
        };
        if let Some(locale) = self.locale {
            config = config.with_locale(locale);
        }
        if let Some(days) = self.retention_days {
            config = config.with_retention_days(days);
        }
        if let Some(ranking) = self.ranking {
            config = config.with_ranking(ranking);
        }
        log::debug!("{:?}", config);
        Ok(config)
    }

    fn query(&self) -> anyhow::Result<Query> {
        let mut query: Query = self.query.parse()?;
        for &category in &self.categories {
            query = query.category(category);
        }
        if let Some(limit) = self.limit {
            query = query.size(limit);
        }
        Ok(query)
    }
}

/// Parse the value of the given flag, if it was provided.
fn parse_opt<T>(
    matches: &clap::ArgMatches,
    name: &str,
) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match matches.value_of_lossy(name) {
        None => Ok(None),
        Some(value) => Ok(Some(value.parse()?)),
    }
}

lazy_static! {
    // clap wants all of its strings tied to a particular lifetime, but we'd
    // like the default day to be computed at runtime. The engine itself never
    // reads the clock, so this is the only place the current day comes from.
    static ref TODAY: String = Local::now().date_naive().to_string();
}

fn app() -> clap::App<'static, 'static> {
    use clap::{App, AppSettings, Arg};

    App::new("fest-search")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about("Search a catalog of college fests by name, place or date.")
        .max_term_width(100)
        .setting(AppSettings::UnifiedHelpMessage)
        .arg(Arg::with_name("query")
             .multiple(true)
             .help("The search query. Words are joined by spaces and every \
                    word must match an event. Braces add directives, e.g., \
                    '{upcoming}' or '{size:5}'. When absent, every event in \
                    the catalog is shown."))
        .arg(Arg::with_name("catalog")
             .long("catalog")
             .short("c")
             .env("FEST_SEARCH_CATALOG")
             .takes_value(true)
             .help("A JSON file containing an array of event records."))
        .arg(Arg::with_name("category")
             .long("category")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .possible_values(Category::possible_names())
             .case_insensitive(true)
             .help("Only show events in this category. This flag may be \
                    repeated."))
        .arg(Arg::with_name("config")
             .long("config")
             .env("FEST_SEARCH_CONFIG")
             .takes_value(true)
             .help("A TOML file with search settings. Flags given on the \
                    command line take precedence."))
        .arg(Arg::with_name("debug")
             .long("debug")
             .help("Show debug messages. Use this when filing bugs."))
        .arg(Arg::with_name("diagnostics")
             .long("diagnostics")
             .help("Instead of searching, list the events whose dates \
                    couldn't be understood."))
        .arg(Arg::with_name("limit")
             .long("limit")
             .short("n")
             .takes_value(true)
             .help("The maximum number of events to show."))
        .arg(Arg::with_name("locale")
             .long("locale")
             .env("FEST_SEARCH_LOCALE")
             .takes_value(true)
             .possible_values(Locale::possible_names())
             .case_insensitive(true)
             .help("The locale used to display dates. Displayed dates are \
                    also searchable. [default: en-US]"))
        .arg(Arg::with_name("ranking")
             .long("ranking")
             .takes_value(true)
             .possible_values(Ranking::possible_names())
             .case_insensitive(true)
             .help("How to order matching events within each category. \
                    [default: category]"))
        .arg(Arg::with_name("retention-days")
             .long("retention-days")
             .takes_value(true)
             .help("How many days an event is still shown after it ends. \
                    [default: 7]"))
        .arg(Arg::with_name("today")
             .long("today")
             .takes_value(true)
             .help("The day to categorize events for, as YYYY-MM-DD. \
                    When absent, the current local date is used."))
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
