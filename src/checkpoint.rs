//! CSV checkpoints: render the whole accumulator, replace the file in one rename.

use std::borrow::Cow;
use std::collections::HashMap;
use std::mem::take;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use tokio::{fs, io::AsyncWriteExt};

use crate::config::OutputSchema;
use crate::record::{parse_number, Event, Record};
use crate::{Error, Result};

const SEP: char = ',';

/// Writes full snapshots of the accumulated events to one file.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    path: PathBuf,
    schema: OutputSchema,
    base_row_id: u64,
}

impl CheckpointWriter {
    pub fn new(path: impl Into<PathBuf>, schema: OutputSchema, base_row_id: u64) -> Self {
        Self {
            path: path.into(),
            schema,
            base_row_id,
        }
    }

    /// Replaces the checkpoint with `events`. Readers see either the old or the new
    /// file, never a partial one. Returns the number of data rows written.
    pub async fn write(&self, events: &[Event]) -> Result<usize> {
        let (contents, rows) = render(events, self.schema, self.base_row_id);
        write_atomic(&self.path, contents.as_bytes())
            .await
            .map_err(|source| Error::Checkpoint {
                path: self.path.clone(),
                source,
            })?;
        Ok(rows)
    }
}

/// Renders header + one line per record. Row ids count up from `base_row_id`.
pub fn render(events: &[Event], schema: OutputSchema, base_row_id: u64) -> (String, usize) {
    let mut out = String::new();
    push_line(&mut out, schema.headers().iter().map(|h| Cow::Borrowed(*h)));

    let mut next_id = base_row_id;
    let mut rows = 0;
    for event in events {
        for record in &event.records {
            let mut cells: Vec<Cow<str>> = Vec::with_capacity(16);
            if schema.has_ids() {
                cells.push(next_id.to_string().into());
                cells.push(event.id.to_string().into());
                next_id += 1;
            }
            let date = if schema.normalizes_dates() {
                format_date(&record.date)
            } else {
                record.date.clone()
            };
            cells.push(quote(&record.meet));
            cells.push(quote(&date).into_owned().into());
            cells.push(quote(&record.name));
            cells.push(quote(&record.age));
            for n in [
                record.body_weight,
                record.snatch1,
                record.snatch2,
                record.snatch3,
                record.snatch_best,
                record.cj1,
                record.cj2,
                record.cj3,
                record.cj_best,
                record.total,
            ] {
                cells.push(format_number(n).into());
            }
            push_line(&mut out, cells.into_iter());
            rows += 1;
        }
    }
    (out, rows)
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(SEP);
        }
        first = false;
        out.push_str(&cell);
    }
    out.push('\n');
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Quotes a text field only when it has to be.
pub fn quote(field: &str) -> Cow<'_, str> {
    if needs_quotes(field) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Shortest form: `120`, `107.85`, `-130`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 || !n.is_finite() {
        return "0".to_string();
    }
    n.to_string()
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
];

/// `YYYY-MM-DD` when the date can be read, otherwise the input unchanged.
pub fn format_date(raw: &str) -> String {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Write to a sibling temp file, then rename over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).await?;

    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("checkpoint");
    let tmp = parent.join(format!(".{}.{}.tmp", filename, std::process::id()));

    let written = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if written.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    written
}

/* ---------------- Reading back ---------------- */

/// Splits CSV text into rows of unquoted fields. Tolerates CRLF.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == SEP && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Loads a ranked checkpoint back into events, in file order.
/// A missing file is an empty accumulator.
pub async fn read_checkpoint(path: &Path) -> Result<Vec<Event>> {
    let text = match fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    events_from_csv(&text)
}

pub fn events_from_csv(text: &str) -> Result<Vec<Event>> {
    let mut rows = parse_rows(text).into_iter();
    let expected = OutputSchema::Ranked.headers();
    match rows.next() {
        None => return Ok(Vec::new()),
        Some(h) if h.iter().map(String::as_str).eq(expected.iter().copied()) => {}
        Some(h) => {
            return Err(Error::MalformedCheckpoint(format!(
                "unexpected header: {}",
                h.join(",")
            )))
        }
    }

    let mut events: Vec<Event> = Vec::new();
    let mut index: HashMap<u32, usize> = HashMap::new();
    for (line, row) in rows.enumerate() {
        if row.len() != expected.len() {
            return Err(Error::MalformedCheckpoint(format!(
                "row {} has {} fields, expected {}",
                line + 1,
                row.len(),
                expected.len()
            )));
        }
        let event_id: u32 = row[1].parse().map_err(|_| {
            Error::MalformedCheckpoint(format!("row {} has event id {:?}", line + 1, row[1]))
        })?;
        let number = |i: usize| parse_number(&row[i]);
        let record = Record {
            meet: row[2].clone(),
            date: row[3].clone(),
            name: row[4].clone(),
            age: row[5].clone(),
            body_weight: number(6),
            snatch1: number(7),
            snatch2: number(8),
            snatch3: number(9),
            snatch_best: number(10),
            cj1: number(11),
            cj2: number(12),
            cj3: number(13),
            cj_best: number(14),
            total: number(15),
        };

        let slot = *index.entry(event_id).or_insert_with(|| {
            events.push(Event {
                id: event_id,
                name: record.meet.clone(),
                date: record.date.clone(),
                records: Vec::new(),
            });
            events.len() - 1
        });
        events[slot].records.push(record);
    }
    Ok(events)
}
