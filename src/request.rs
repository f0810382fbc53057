//! Plain-HTTP data source: one GET per results page, parsed with `scraper`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::parse::{parse_page, NextPage, ParsedPage};
use crate::record::RawRow;
use crate::source::{DataSource, SourceDocument};
use crate::{info_time, warn_time, Error, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Fetches `{base_url}/{id}` and follows its pagination links.
#[derive(Debug, Clone)]
pub struct HttpSource {
    // Client uses Arc so we can clone cheaply
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, navigation_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(navigation_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn event_url(&self, id: u32) -> Result<Url> {
        Url::parse(&format!("{}/{id}", self.base_url)).map_err(|e| Error::Navigation {
            id,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    type Document = HttpDocument;

    async fn resolve_document(&mut self, id: u32) -> Result<HttpDocument> {
        let url = self.event_url(id)?;
        let page = request_page(&self.client, id, url.clone()).await?;
        Ok(HttpDocument {
            client: self.client.clone(),
            id,
            url,
            page_num: 1,
            page,
            repeated: false,
        })
    }
}

/// A results document served as static HTML, one request per page.
#[derive(Debug)]
pub struct HttpDocument {
    client: Client,
    id: u32,
    url: Url,
    page_num: usize,
    page: ParsedPage,
    /// The server answered "next" with the page it had just served.
    repeated: bool,
}

impl HttpDocument {
    fn next_url(&self) -> Result<Url> {
        match &self.page.next {
            Some(NextPage::Href(href)) => self.url.join(href).map_err(|e| Error::Navigation {
                id: self.id,
                reason: format!("bad next page link {href:?}: {e}"),
            }),
            Some(NextPage::Sequential) => {
                let mut url = self.url.clone();
                let kept: Vec<(String, String)> = url
                    .query_pairs()
                    .filter(|(k, _)| k != "page")
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept)
                    .append_pair("page", &(self.page_num + 1).to_string());
                Ok(url)
            }
            None => Err(Error::Navigation {
                id: self.id,
                reason: format!("no page after {}", self.page_num),
            }),
        }
    }

    /// Moves to `page`, unless it repeats the current rows. Servers that ignore `?page=`
    /// keep returning page one with an enabled next button; that ends the document.
    fn accept_page(&mut self, page: ParsedPage, url: Url) {
        if !page.rows.is_empty() && page.rows == self.page.rows {
            warn_time!("{url} repeats page {}, treating it as the last", self.page_num);
            self.page.rows.clear();
            self.page.next = None;
            self.repeated = true;
            return;
        }
        self.page = page;
        self.url = url;
        self.page_num += 1;
    }
}

#[async_trait]
impl SourceDocument for HttpDocument {
    /// The page is fully fetched already, so this only checks for a results table or an
    /// error notice.
    async fn await_ready(&mut self, _timeout: Duration) -> bool {
        self.repeated || !self.page.rows.is_empty() || self.page.has_error_message
    }

    fn current_page_rows(&self) -> Vec<RawRow> {
        self.page.rows.clone()
    }

    fn has_next_page(&self) -> bool {
        self.page.next.is_some()
    }

    async fn advance_page(&mut self) -> Result<()> {
        let url = self.next_url()?;
        let page = request_page(&self.client, self.id, url.clone()).await?;
        self.accept_page(page, url);
        Ok(())
    }

    fn event_name(&self) -> Option<String> {
        self.page.title.clone()
    }

    fn event_date(&self) -> Option<String> {
        self.page.date.clone()
    }
}

/// Requests a page and returns it parsed.
async fn request_page(client: &Client, id: u32, url: Url) -> Result<ParsedPage> {
    info_time!("Requesting {url}");
    let res = client.get(url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            id,
            status: status.as_u16(),
        });
    }
    let html = res.text().await?;
    parse_page(html).await
}
