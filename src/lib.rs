//! Walks a descending range of competition ids, pulls every results page of each
//! event and keeps an atomically replaced CSV checkpoint of everything found so far.

use std::time::Duration;

pub mod checkpoint;
pub mod config;
mod error;
#[doc(hidden)]
pub mod macros;
pub mod paginate;
mod parse;
pub mod process;
pub mod record;
pub mod request;
pub mod source;

pub use error::{Error, Result};

pub const START_ID: u32 = 6836;
pub const END_ID: u32 = 6818;
/// First synthetic row id of every checkpoint.
pub const BASE_ROW_ID: u64 = 312270;
pub const FILE_PATH: &str = "data/results.csv";
pub const BASE_URL: &str = "https://usaweightlifting.sport80.com/public/rankings/results";

pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// How long a freshly resolved event gets to show any content before it is skipped.
pub const READY_TIMEOUT: Duration = Duration::from_secs(5);
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause after activating "next page" before probing for the new rows.
pub const PAGE_SETTLE: Duration = Duration::from_secs(1);
pub const REQUEST_DELAY: Duration = Duration::from_secs(2);
/// No event has anywhere near this many pages, a source that keeps
/// advertising a next page past it is broken.
pub const MAX_PAGES: usize = 500;
