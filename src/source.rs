//! The seam between the scraping loop and whatever actually loads pages.
//!
//! The loop never sees selectors or markup, only rows of cell text and a handful
//! of readiness / pagination questions.

use std::time::Duration;

use async_trait::async_trait;

use crate::record::RawRow;
use crate::Result;

/// Resolves competition ids to loaded documents.
#[async_trait]
pub trait DataSource: Send {
    type Document: SourceDocument;

    /// Loads the results document for `id`. May fail on navigation or network errors.
    async fn resolve_document(&mut self, id: u32) -> Result<Self::Document>;
}

/// One loaded, possibly multi-page, results document.
#[async_trait]
pub trait SourceDocument: Send {
    /// Resolves `true` once the current page shows content, `false` if `timeout`
    /// passes first. Must not block past `timeout`.
    async fn await_ready(&mut self, timeout: Duration) -> bool;

    /// Rows visible on the current page, in display order.
    fn current_page_rows(&self) -> Vec<RawRow>;

    /// Whether an enabled "next page" control exists.
    fn has_next_page(&self) -> bool;

    /// Activates "next page". Readiness of the new page is checked separately.
    async fn advance_page(&mut self) -> Result<()>;

    fn event_name(&self) -> Option<String> {
        None
    }

    fn event_date(&self) -> Option<String> {
        None
    }
}
