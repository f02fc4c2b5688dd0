// A minimal logger for the `log` crate. All we need is to print records
// from this workspace's crates to stderr, at whatever level was chosen with
// log::set_max_level.

use log::{self, Log};

/// Install the stderr logger as the global logger.
pub fn init() -> anyhow::Result<()> {
    log::set_logger(LOGGER)?;
    Ok(())
}

/// Logs to stderr, leaving level filtering to the `log` crate's global max
/// level.
#[derive(Debug)]
struct Logger(());

const LOGGER: &Logger = &Logger(());

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_log(record) {
            return;
        }
        eprintln!("{}: {}", record.level(), record.args());
    }

    fn flush(&self) {
        // eprintln! doesn't buffer.
    }
}

/// Only show messages from fest-eval itself and the fest-index library.
fn should_log(record: &log::Record) -> bool {
    let t = record.target();
    t.starts_with("fest_eval") || t.starts_with("fest_index")
}
