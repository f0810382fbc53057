use std::collections::HashSet;

use chrono::Local;
use tokio::time::{sleep, timeout};

use crate::checkpoint::{read_checkpoint, CheckpointWriter};
use crate::config::{OutputSchema, ScrapeConfig, Timeouts};
use crate::paginate::{ready_within, walk_all_pages};
use crate::record::Event;
use crate::request::HttpSource;
use crate::source::{DataSource, SourceDocument};
use crate::{info_time, warn_time, Error, Result};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub visited: usize,
    pub events: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows_written: usize,
    pub checkpoints: usize,
}

/// State owned by a single run: the accumulated events and the counters.
/// The checkpoint writer only ever reads `events`.
#[derive(Debug, Default)]
pub struct RunContext {
    pub events: Vec<Event>,
    pub report: RunReport,
    /// Ids already in the accumulator when the run started.
    done: HashSet<u32>,
}

impl RunContext {
    /// Starts from an existing checkpoint when resuming, empty otherwise.
    async fn load(config: &ScrapeConfig) -> Result<Self> {
        if !config.resume {
            return Ok(Self::default());
        }
        if config.schema != OutputSchema::Ranked {
            return Err(Error::Config(
                "only ranked checkpoints carry event ids and can be resumed".into(),
            ));
        }
        let events = read_checkpoint(&config.out_path).await?;
        info_time!(
            "Resuming with {} events from {}",
            events.len(),
            config.out_path.display()
        );
        Ok(Self::resumed(events))
    }

    fn resumed(events: Vec<Event>) -> Self {
        Self {
            done: events.iter().map(|e| e.id).collect(),
            events,
            ..Self::default()
        }
    }

    fn is_done(&self, id: u32) -> bool {
        self.done.contains(&id)
    }
}

enum Outcome {
    Appended(Event),
    Skipped(&'static str),
}

/// Scrapes the configured range over HTTP and writes the checkpoint file.
pub async fn process_site(config: &ScrapeConfig) -> Result<RunContext> {
    let start_time = Local::now();
    let mut source = HttpSource::new(config.base_url.as_str(), config.timeouts.navigation)?;

    info_time!("Started scraping");
    let ctx = run(config, &mut source).await?;
    let r = ctx.report;
    info_time!(
        start_time,
        "Finished: {} ids visited, {} events, {} skipped, {} failed, {} rows in {}",
        r.visited,
        r.events,
        r.skipped,
        r.failed,
        r.rows_written,
        config.out_path.display()
    );
    Ok(ctx)
}

/// Walks `config.range` from the top down, one id at a time.
///
/// Every id that yields records becomes an [`Event`] and triggers a full checkpoint
/// rewrite. Failures of a single id are logged and skipped. Only a failed checkpoint write
/// ends the run early.
pub async fn run<S: DataSource>(config: &ScrapeConfig, source: &mut S) -> Result<RunContext> {
    let writer = CheckpointWriter::new(config.out_path.clone(), config.schema, config.base_row_id);
    let mut ctx = RunContext::load(config).await?;

    // Fresh (or resumed) snapshot up front, so the file is valid from the start.
    ctx.report.rows_written = writer.write(&ctx.events).await?;
    ctx.report.checkpoints += 1;

    let last = config.range.end;
    for id in config.range.ids() {
        if ctx.is_done(id) {
            info_time!("Event {id} already in checkpoint, skipping...");
            continue;
        }
        ctx.report.visited += 1;
        info_time!("Scraping event ID: {id}");

        match process_id(source, id, &config.timeouts).await {
            Ok(Outcome::Appended(event)) => {
                info_time!(
                    "Successfully scraped {} results for {}",
                    event.records.len(),
                    event.name
                );
                ctx.events.push(event);
                ctx.report.events += 1;
                ctx.report.rows_written = writer.write(&ctx.events).await?;
                ctx.report.checkpoints += 1;
            }
            Ok(Outcome::Skipped(reason)) => {
                info_time!("{reason} for event {id}, skipping...");
                ctx.report.skipped += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn_time!("Failed to scrape event {id}: {e}");
                ctx.report.failed += 1;
            }
        }

        if id != last && !config.delay.is_zero() {
            sleep(config.delay).await;
        }
    }

    Ok(ctx)
}

async fn process_id<S: DataSource>(
    source: &mut S,
    id: u32,
    timeouts: &Timeouts,
) -> Result<Outcome> {
    let mut doc = timeout(timeouts.navigation, source.resolve_document(id))
        .await
        .map_err(|_| Error::timeout("navigation", timeouts.navigation))??;

    if !ready_within(&mut doc, timeouts.ready).await {
        return Ok(Outcome::Skipped("No content found"));
    }

    let name = doc.event_name().unwrap_or_else(|| format!("Event {id}"));
    let date = doc
        .event_date()
        .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());

    let records = walk_all_pages(&mut doc, timeouts).await?;
    if records.is_empty() {
        return Ok(Outcome::Skipped("No results found"));
    }

    Ok(Outcome::Appended(Event {
        id,
        name,
        date,
        records,
    }))
}
