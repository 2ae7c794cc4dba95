use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to load settings: {0:#}")]
    Settings(anyhow::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Why a single fetch attempt did not produce a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("anti-bot challenge served (status {status})")]
    Challenge { status: u16 },
    #[error("unexpected http status {status}")]
    Status { status: u16 },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch {url} after {attempts} attempt(s)")]
    Exhausted {
        url: Url,
        attempts: u32,
        #[source]
        last: AttemptError,
    },
    #[error("no attempts were allowed for {url}")]
    NoAttempts { url: Url },
    #[error("failed to create an http session: {0:#}")]
    Session(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no script assigns `{variable}` to a JSON array")]
    NotFound { variable: &'static str },
    #[error("`{variable}` does not hold a valid timetable array")]
    Unparsable {
        variable: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{variable}` holds an empty array")]
    Empty { variable: &'static str },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TermResolutionError {
    #[error("the page does not offer any term options")]
    NoOptions,
    #[error("no term option matches `{target}`")]
    NoMatch { target: String },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write csv rows: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to move the finished file into {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal failures that abort an import run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("failed to load the room mapping: {0:#}")]
    RoomMapping(anyhow::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    TermResolution(#[from] TermResolutionError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A failed run together with how long it took to fail.
#[derive(Error, Debug)]
#[error("import failed after {:.2}s", .elapsed.as_secs_f64())]
pub struct ImportFailure {
    #[source]
    pub error: ImportError,
    pub elapsed: Duration,
}
