use scraper::{ElementRef, Html, Selector};
use tokio::task::spawn_blocking;

use crate::record::RawRow;
use crate::{Error, Result};

const ROW_SELECTOR: &str = "table tbody tr";
const CELL_SELECTOR: &str = "td";
const ERROR_SELECTOR: &str = ".error-message";
const TITLE_SELECTOR: &str = "h1, .event-title, .page-title";
const DATE_SELECTOR: &str = "time, .event-date, .date";
const NEXT_BUTTON_SELECTOR: &str = r#"button[aria-label="Next page"]"#;
const NEXT_LINK_SELECTOR: &str = r#"a[rel="next"]"#;

/// Where the "next page" control leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NextPage {
    /// Explicit target, possibly relative.
    Href(String),
    /// A bare button: the next page is the current one with `page` bumped.
    Sequential,
}

/// Everything the scraper needs from one results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedPage {
    pub rows: Vec<RawRow>,
    pub next: Option<NextPage>,
    pub has_error_message: bool,
    pub title: Option<String>,
    pub date: Option<String>,
}

/// Parses on a blocking thread, `Html` isn't `Send`.
pub(crate) async fn parse_page(html: String) -> Result<ParsedPage> {
    spawn_blocking(move || parse_html(&html)).await?
}

/// Pulls rows, the next control and event metadata out of a results page.
pub(crate) fn parse_html(html: &str) -> Result<ParsedPage> {
    let doc = Html::parse_document(html);

    // Create selectors.
    let row_selector = create_selector(ROW_SELECTOR)?;
    let cell_selector = create_selector(CELL_SELECTOR)?;
    let error_selector = create_selector(ERROR_SELECTOR)?;
    let title_selector = create_selector(TITLE_SELECTOR)?;
    let date_selector = create_selector(DATE_SELECTOR)?;
    let button_selector = create_selector(NEXT_BUTTON_SELECTOR)?;
    let link_selector = create_selector(NEXT_LINK_SELECTOR)?;

    let rows: Vec<RawRow> = doc
        .select(&row_selector)
        .map(|tr| tr.select(&cell_selector).map(element_text).collect::<RawRow>())
        .collect();

    let next = doc
        .select(&button_selector)
        .find(|b| is_enabled(b))
        .map(|b| match b.value().attr("data-href") {
            Some(href) => NextPage::Href(href.to_string()),
            None => NextPage::Sequential,
        })
        .or_else(|| {
            doc.select(&link_selector)
                .filter(is_enabled)
                .find_map(|a| a.value().attr("href"))
                .map(|href| NextPage::Href(href.to_string()))
        });

    Ok(ParsedPage {
        rows,
        next,
        has_error_message: doc.select(&error_selector).next().is_some(),
        title: first_text(&doc, &title_selector),
        date: first_text(&doc, &date_selector),
    })
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

/// Text content with runs of whitespace collapsed.
fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn is_enabled(el: &ElementRef) -> bool {
    let v = el.value();
    v.attr("disabled").is_none() && v.attr("aria-disabled") != Some("true")
}
