use std::time::Duration;

use chrono::Local;
use tokio::time::{sleep, timeout};

use crate::config::Timeouts;
use crate::record::{extract, Record};
use crate::source::SourceDocument;
use crate::{info_time, warn_time, Error, Result};

/// Collects the records of every page of `doc`, in page order.
///
/// Starts on whatever page is current and follows "next" until it disappears or is
/// disabled. A page that doesn't become ready within `timeouts.page` after advancing is a
/// [`Error::Timeout`]. Stops after `timeouts.max_pages` pages even if the source keeps
/// offering more.
pub async fn walk_all_pages<D: SourceDocument>(
    doc: &mut D,
    timeouts: &Timeouts,
) -> Result<Vec<Record>> {
    let start_time = Local::now();
    let mut records = Vec::new();
    let mut pages = 0usize;

    loop {
        let rows = doc.current_page_rows();
        records.extend(extract(&rows));
        pages += 1;

        if !doc.has_next_page() {
            break;
        }
        if pages >= timeouts.max_pages {
            warn_time!(
                "still offered a next page after {} pages, stopping",
                pages
            );
            break;
        }

        timeout(timeouts.page, doc.advance_page())
            .await
            .map_err(|_| Error::timeout("next page", timeouts.page))??;
        if !timeouts.settle.is_zero() {
            sleep(timeouts.settle).await;
        }
        if !ready_within(doc, timeouts.page).await {
            return Err(Error::timeout("rows of next page", timeouts.page));
        }
    }

    if pages > 1 {
        info_time!(start_time, "Walked {} pages, {} rows", pages, records.len());
    }
    Ok(records)
}

/// `await_ready`, hard-capped at `limit` even if the document ignores it.
pub(crate) async fn ready_within<D: SourceDocument>(doc: &mut D, limit: Duration) -> bool {
    timeout(limit, doc.await_ready(limit))
        .await
        .unwrap_or(false)
}
