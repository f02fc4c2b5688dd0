use std::fmt;
use std::path::{Path, PathBuf};

use serde_json;

/// A type alias for handling errors throughout fest-index.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while loading or configuring an event catalog.
///
/// Note that searching itself never returns an error. Errors only occur at
/// the edges: reading files, parsing configuration values and strict date
/// parsing.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Return a reference to the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Transfer ownership of the kind of this error.
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn unknown_locale<T: AsRef<str>>(unk: T) -> Error {
        Error { kind: ErrorKind::UnknownLocale(unk.as_ref().to_string()) }
    }

    pub(crate) fn unknown_ranking<T: AsRef<str>>(unk: T) -> Error {
        Error { kind: ErrorKind::UnknownRanking(unk.as_ref().to_string()) }
    }

    pub(crate) fn unknown_category<T: AsRef<str>>(unk: T) -> Error {
        Error { kind: ErrorKind::UnknownCategory(unk.as_ref().to_string()) }
    }

    pub(crate) fn unknown_directive<T: AsRef<str>>(unk: T) -> Error {
        Error { kind: ErrorKind::UnknownDirective(unk.as_ref().to_string()) }
    }

    pub(crate) fn unknown_month<T: AsRef<str>>(unk: T) -> Error {
        Error { kind: ErrorKind::UnknownMonth(unk.as_ref().to_string()) }
    }

    pub(crate) fn invalid_date<T: AsRef<str>>(text: T) -> Error {
        Error { kind: ErrorKind::InvalidDate(text.as_ref().to_string()) }
    }

    pub(crate) fn config<T: AsRef<str>>(msg: T) -> Error {
        Error { kind: ErrorKind::Config(msg.as_ref().to_string()) }
    }

    pub(crate) fn json_path<P: AsRef<Path>>(
        err: serde_json::Error,
        path: P,
    ) -> Error {
        Error {
            kind: ErrorKind::Json(format!(
                "{}: {}",
                path.as_ref().display(),
                err
            )),
        }
    }

    pub(crate) fn io_path<P: AsRef<Path>>(
        err: std::io::Error,
        path: P,
    ) -> Error {
        Error {
            kind: ErrorKind::Io {
                err,
                path: Some(path.as_ref().to_path_buf()),
            },
        }
    }

    pub(crate) fn number<E: std::error::Error + Send + Sync + 'static>(
        err: E,
    ) -> Error {
        Error { kind: ErrorKind::Number(Box::new(err)) }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            ErrorKind::Io { ref err, .. } => Some(err),
            ErrorKind::Number(ref err) => Some(&**err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// The specific kind of error that can occur.
#[derive(Debug)]
pub enum ErrorKind {
    /// An error parsing the name of a locale.
    ///
    /// The data provided is the unrecognized name.
    UnknownLocale(String),
    /// An error parsing the name of a ranking strategy.
    ///
    /// The data provided is the unrecognized name.
    UnknownRanking(String),
    /// An error parsing the name of an event category.
    ///
    /// The data provided is the unrecognized name.
    UnknownCategory(String),
    /// An error parsing a directive in a free-form query.
    ///
    /// The data provided is the unrecognized directive name.
    UnknownDirective(String),
    /// A date contained a month name that isn't an English month name or
    /// three letter abbreviation.
    UnknownMonth(String),
    /// Date text that doesn't have the shape of a single date or a date
    /// range, or that names a day that doesn't exist on the calendar.
    ///
    /// The data provided is the offending text.
    InvalidDate(String),
    /// An error occurred while reading configuration.
    Config(String),
    /// An error that occurred while reading JSON event data.
    Json(String),
    /// An unexpected I/O error occurred.
    Io {
        /// The underlying I/O error.
        err: std::io::Error,
        /// A file path, if the I/O error occurred in the context of a named
        /// file.
        path: Option<PathBuf>,
    },
    /// An error occurred while parsing a number.
    Number(Box<dyn std::error::Error + Send + Sync>),
    /// Hints that destructuring should not be exhaustive.
    ///
    /// This enum may grow additional variants, so this makes sure clients
    /// don't count on exhaustive matching. (Otherwise, adding a new variant
    /// could break existing code.)
    #[doc(hidden)]
    __Nonexhaustive,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::UnknownLocale(ref unk) => {
                write!(f, "unrecognized locale: '{}'", unk)
            }
            ErrorKind::UnknownRanking(ref unk) => {
                write!(f, "unrecognized ranking: '{}'", unk)
            }
            ErrorKind::UnknownCategory(ref unk) => {
                write!(f, "unrecognized event category: '{}'", unk)
            }
            ErrorKind::UnknownDirective(ref unk) => {
                write!(f, "unrecognized search directive: '{}'", unk)
            }
            ErrorKind::UnknownMonth(ref unk) => {
                write!(f, "unrecognized month name: '{}'", unk)
            }
            ErrorKind::InvalidDate(ref text) => {
                write!(f, "unrecognized date or date range: '{}'", text)
            }
            ErrorKind::Config(ref msg) => write!(f, "config error: {}", msg),
            ErrorKind::Json(ref msg) => write!(f, "{}", msg),
            ErrorKind::Io { path: None, .. } => write!(f, "I/O error"),
            ErrorKind::Io { path: Some(ref p), .. } => {
                write!(f, "{}", p.display())
            }
            ErrorKind::Number(_) => write!(f, "error parsing number"),
            ErrorKind::__Nonexhaustive => panic!("invalid error"),
        }
    }
}
