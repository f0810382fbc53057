#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use liftscrape::config::{ScrapeConfig, Timeouts};
use liftscrape::record::RawRow;
use liftscrape::source::{DataSource, SourceDocument};
use liftscrape::{Error, Result};

/// What the fake site does for one event id.
#[derive(Clone)]
pub enum Script {
    Pages(Vec<Vec<RawRow>>),
    NavFail,
    Hang,
    NeverReady,
    /// Shows an error notice: ready, but no rows.
    ReadyButEmpty,
    StallOnAdvance(Vec<RawRow>),
    EndlessNext(Vec<RawRow>),
}

#[derive(Default)]
pub struct FakeSource {
    scripts: HashMap<u32, Script>,
    pub resolved: Vec<u32>,
}

impl FakeSource {
    pub fn with(mut self, id: u32, script: Script) -> Self {
        self.scripts.insert(id, script);
        self
    }
}

#[async_trait]
impl DataSource for FakeSource {
    type Document = FakeDoc;

    async fn resolve_document(&mut self, id: u32) -> Result<FakeDoc> {
        self.resolved.push(id);
        let script = self.scripts.get(&id).cloned().unwrap_or(Script::NeverReady);
        match script {
            Script::NavFail => Err(Error::Navigation {
                id,
                reason: "net::ERR_CONNECTION_RESET".into(),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("navigation timeout should have fired")
            }
            script => Ok(FakeDoc {
                id,
                script,
                current: 0,
            }),
        }
    }
}

pub struct FakeDoc {
    id: u32,
    script: Script,
    current: usize,
}

#[async_trait]
impl SourceDocument for FakeDoc {
    async fn await_ready(&mut self, timeout: Duration) -> bool {
        match &self.script {
            Script::NeverReady => false,
            Script::ReadyButEmpty => true,
            Script::StallOnAdvance(_) if self.current > 0 => {
                tokio::time::sleep(timeout * 100).await;
                false
            }
            _ => !self.current_page_rows().is_empty(),
        }
    }

    fn current_page_rows(&self) -> Vec<RawRow> {
        match &self.script {
            Script::Pages(pages) => pages.get(self.current).cloned().unwrap_or_default(),
            Script::StallOnAdvance(rows) | Script::EndlessNext(rows) => rows.clone(),
            _ => Vec::new(),
        }
    }

    fn has_next_page(&self) -> bool {
        match &self.script {
            Script::Pages(pages) => self.current + 1 < pages.len(),
            Script::StallOnAdvance(_) => self.current == 0,
            Script::EndlessNext(_) => true,
            _ => false,
        }
    }

    async fn advance_page(&mut self) -> Result<()> {
        self.current += 1;
        Ok(())
    }

    fn event_name(&self) -> Option<String> {
        Some(format!("Meet {}", self.id))
    }
}

/// A results row: lifter name in the name column, `total` in the last one.
pub fn row(name: &str, total: &str) -> RawRow {
    let mut cells = vec![
        "BKTH March Closed Meet".to_string(),
        "03/01/2025".to_string(),
        "Open Men's 109kg".to_string(),
        name.to_string(),
    ];
    cells.extend(std::iter::repeat("1".to_string()).take(9));
    cells.push(total.to_string());
    cells
}

/// `rows_per_page` rows on each of `pages` pages, named `e{id}p{page}r{row}`.
pub fn paged(id: u32, pages: usize, rows_per_page: usize) -> Script {
    Script::Pages(
        (0..pages)
            .map(|p| {
                (0..rows_per_page)
                    .map(|r| row(&format!("e{id}p{p}r{r}"), "100"))
                    .collect()
            })
            .collect(),
    )
}

pub fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("liftscrape_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p.push("results.csv");
    p
}

pub fn quick_config(start: u32, end: u32, out: PathBuf) -> ScrapeConfig {
    ScrapeConfig::default()
        .with_range(start, end)
        .with_out_path(out)
        .with_delay(Duration::ZERO)
        .with_timeouts(Timeouts {
            navigation: Duration::from_millis(50),
            ready: Duration::from_millis(50),
            page: Duration::from_millis(50),
            settle: Duration::ZERO,
            max_pages: 20,
        })
}

/// Data lines of a checkpoint, header dropped.
pub fn data_lines(path: &PathBuf) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
