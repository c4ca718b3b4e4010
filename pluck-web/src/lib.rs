//! Fetch a page and pluck a form value out of it.
//!
//! - Selector extraction over `scraper` documents (`extract`)
//! - The fetch-then-query composition (`scrape`)
//!
//! A run is strictly linear: validate the selector, GET the page, parse it,
//! take the first match. Nothing is cached or retried.

pub mod extract;

pub use extract::{SelectorSyntaxError, extract};

use pluck_common::ScrapeRequest;
use pluck_http::{HttpClient, HttpError};
use scraper::Html;
use thiserror::Error;

/// Everything that can stop a scrape. A missing match is not in here; it is
/// reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Network(#[from] HttpError),
    #[error(transparent)]
    SelectorSyntax(#[from] SelectorSyntaxError),
}

/// Fetch `req.url` and return the value of the first element matching
/// `req.selector`.
///
/// The selector is compiled first, so a syntax error never costs a request.
///
/// ```no_run
/// # async fn demo() -> Result<(), pluck_web::ScrapeError> {
/// use pluck_common::ScrapeRequest;
/// use pluck_http::HttpClient;
///
/// let client = HttpClient::new()?;
/// let value = pluck_web::scrape(&client, &ScrapeRequest::default()).await?;
/// println!("{value:?}");
/// # Ok(()) }
/// ```
pub async fn scrape(
    client: &HttpClient,
    req: &ScrapeRequest,
) -> Result<Option<String>, ScrapeError> {
    let selector = extract::parse_selector(&req.selector)?;
    let html = client.get_text(&req.url).await?;

    let document = Html::parse_document(&html);
    let value = extract::extract_with(&document, &selector);
    tracing::info!(
        url = %req.url,
        selector = %req.selector,
        found = value.is_some(),
        "scrape.done"
    );
    Ok(value)
}
