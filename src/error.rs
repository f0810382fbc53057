use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),

    #[error("Couldn't resolve event {id}: {reason}")]
    Navigation { id: u32, reason: String },
    #[error("Event {id} answered with HTTP status {status}")]
    HttpStatus { id: u32, status: u16 },
    #[error("Timed out after {after:?} while waiting for {what}")]
    Timeout { what: &'static str, after: Duration },

    #[error("Couldn't write checkpoint to {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed checkpoint: {0}")]
    MalformedCheckpoint(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Errors that must abort the run instead of skipping the current event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Checkpoint { .. })
    }

    pub(crate) fn timeout(what: &'static str, after: Duration) -> Self {
        Error::Timeout { what, after }
    }
}
