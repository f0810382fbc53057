use std::path::PathBuf;
use std::time::Duration;

use crate::{
    Error, Result, BASE_ROW_ID, BASE_URL, END_ID, FILE_PATH, MAX_PAGES, NAVIGATION_TIMEOUT,
    PAGE_SETTLE, PAGE_TIMEOUT, READY_TIMEOUT, REQUEST_DELAY, START_ID,
};

const HELP: &str = "\
Usage: liftscrape [OPTIONS]

Options:
  --start N          first (highest) event id to scrape
  --end N            last (lowest) event id to scrape
  -o, --out PATH     checkpoint file
  --schema NAME      ranked | legacy
  --base-id N        first synthetic row id
  --url BASE         results base url, the event id is appended
  --delay-ms N       pause between two events
  --resume           continue from an existing checkpoint
  -h, --help         print this help";

/// Inclusive id range walked from `start` down to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: u32,
    pub end: u32,
}

impl IdRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Descending ids. Empty when `end > start`.
    pub fn ids(&self) -> impl Iterator<Item = u32> {
        (self.end..=self.start).rev()
    }

    pub fn len(&self) -> usize {
        if self.end > self.start {
            0
        } else {
            (self.start - self.end) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdRange {
    fn default() -> Self {
        Self::new(START_ID, END_ID)
    }
}

/// Column layout of the checkpoint file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputSchema {
    /// Synthetic row id + event id, normalized dates.
    #[default]
    Ranked,
    /// The older per-lifter export: no ids, dates as scraped.
    Legacy,
}

impl OutputSchema {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            OutputSchema::Ranked => &[
                "id",
                "event_id",
                "meet",
                "date",
                "name",
                "age",
                "body_weight",
                "snatch1",
                "snatch2",
                "snatch3",
                "snatch_best",
                "cj1",
                "cj2",
                "cj3",
                "cj_best",
                "total",
            ],
            OutputSchema::Legacy => &[
                "meet",
                "date",
                "lifter",
                "age",
                "bodyWeight",
                "snatch1",
                "snatch2",
                "snatch3",
                "snatch",
                "cj1",
                "cj2",
                "cj3",
                "cj",
                "total",
            ],
        }
    }

    pub fn has_ids(&self) -> bool {
        matches!(self, OutputSchema::Ranked)
    }

    pub fn normalizes_dates(&self) -> bool {
        matches!(self, OutputSchema::Ranked)
    }
}

impl std::str::FromStr for OutputSchema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ranked" => Ok(OutputSchema::Ranked),
            "legacy" => Ok(OutputSchema::Legacy),
            other => Err(Error::Config(format!("unknown schema: {other}"))),
        }
    }
}

/// Bounds on every wait for external content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub navigation: Duration,
    pub ready: Duration,
    pub page: Duration,
    pub settle: Duration,
    pub max_pages: usize,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: NAVIGATION_TIMEOUT,
            ready: READY_TIMEOUT,
            page: PAGE_TIMEOUT,
            settle: PAGE_SETTLE,
            max_pages: MAX_PAGES,
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    pub range: IdRange,
    pub schema: OutputSchema,
    pub out_path: PathBuf,
    pub base_row_id: u64,
    pub base_url: String,
    pub timeouts: Timeouts,
    pub delay: Duration,
    pub resume: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            range: IdRange::default(),
            schema: OutputSchema::default(),
            out_path: PathBuf::from(FILE_PATH),
            base_row_id: BASE_ROW_ID,
            base_url: BASE_URL.to_string(),
            timeouts: Timeouts::default(),
            delay: REQUEST_DELAY,
            resume: false,
        }
    }
}

impl ScrapeConfig {
    pub fn with_range(mut self, start: u32, end: u32) -> Self {
        self.range = IdRange::new(start, end);
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_out_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_path = path.into();
        self
    }

    pub fn with_base_row_id(mut self, base: u64) -> Self {
        self.base_row_id = base;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Parses the process arguments. Returns `None` when help was requested.
    pub fn from_args() -> Result<Option<Self>> {
        Self::parse_args(std::env::args().skip(1))
    }

    pub fn parse_args<I, S>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cfg = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(a) = args.next() {
            match a.as_str() {
                "--start" => cfg.range.start = parse_value(&a, args.next())?,
                "--end" => cfg.range.end = parse_value(&a, args.next())?,
                "-o" | "--out" => cfg.out_path = PathBuf::from(required(&a, args.next())?),
                "--schema" => cfg.schema = required(&a, args.next())?.parse()?,
                "--base-id" => cfg = cfg.with_base_row_id(parse_value(&a, args.next())?),
                "--url" => {
                    cfg.base_url = required(&a, args.next())?.trim_end_matches('/').to_string()
                }
                "--delay-ms" => {
                    cfg.delay = Duration::from_millis(parse_value(&a, args.next())?)
                }
                "--resume" => cfg.resume = true,
                "-h" | "--help" => {
                    println!("{HELP}");
                    return Ok(None);
                }
                _ => return Err(Error::Config(format!("unknown argument: {a}"))),
            }
        }
        Ok(Some(cfg))
    }
}

fn required(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| Error::Config(format!("missing value for {flag}")))
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let v = required(flag, value)?;
    v.parse()
        .map_err(|_| Error::Config(format!("invalid value for {flag}: {v}")))
}
