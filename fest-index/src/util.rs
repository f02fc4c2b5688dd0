use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time;

use serde_json;

use crate::error::{Error, Result};
use crate::record::EventRecord;

/// A type that provides a Display impl for std::time::Duration.
#[derive(Debug)]
pub struct NiceDuration(pub time::Duration);

impl fmt::Display for NiceDuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:0.4} secs", self.fractional_seconds())
    }
}

impl NiceDuration {
    /// Create a duration corresponding to the amount of time since the
    /// instant given.
    pub fn since(t: time::Instant) -> NiceDuration {
        NiceDuration(time::Instant::now().duration_since(t))
    }

    /// Returns the number of seconds in this duration in fraction form.
    pub fn fractional_seconds(&self) -> f64 {
        self.0.as_secs_f64()
    }
}

/// Read a catalog of event records from a JSON file.
///
/// The file must contain a JSON array of event records, as exported by the
/// event store.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io_path(e, path))?;
    serde_json::from_reader(io::BufReader::new(file))
        .map_err(|e| Error::json_path(e, path))
}

/// Parse a catalog of event records from a JSON string.
pub fn parse_records(json: &str) -> Result<Vec<EventRecord>> {
    serde_json::from_str(json).map_err(|e| Error::json_path(e, "<string>"))
}
