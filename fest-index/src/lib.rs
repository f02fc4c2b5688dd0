/*!
This crate provides categorization and fuzzy searching for catalogs of college
fest events.

Event dates are entered by organizers as free-form text, e.g., `25th to 26th
Nov 25`. A [`Catalog`](struct.Catalog.html) resolves those dates for a given
day, drops events that ended too long ago and orders the rest into ongoing,
upcoming and recently ended events. A [`Searcher`](struct.Searcher.html) then
filters a catalog with multi-token fuzzy queries.
*/

#![deny(missing_docs)]

pub use crate::catalog::{Catalog, Category, Diagnostic, NormalizedEvent};
pub use crate::config::Config;
pub use crate::date::DateRange;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::format::Locale;
pub use crate::record::{EventRecord, SubEvent};
pub use crate::search::{search, Query, Ranking, Searcher};
pub use crate::util::{parse_records, read_records, NiceDuration};

mod catalog;
mod config;
pub mod date;
mod error;
mod format;
mod record;
pub mod relevance;
mod search;
pub mod similarity;
mod util;
