use std::fmt;

/// Result type for gemtrace pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can abort a pipeline run.
///
/// Everything below the summarizer encodes failure as data (unknown
/// sentinels, anomaly findings, unavailable KPI results); only the
/// variants here are allowed to halt processing.
#[derive(Debug)]
pub enum Error {
    /// The input could not be segmented into a single message block
    /// (empty or unrecognizable file).
    NoMessages,
    /// A knowledge-base overlay file could not be parsed.
    Overlay(String),
    /// IO operation failed
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMessages => {
                write!(f, "no SECS/GEM message blocks were found in the input")
            }
            Error::Overlay(msg) => write!(f, "knowledge-base overlay error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NoMessages | Error::Overlay(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
