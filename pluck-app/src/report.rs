//! Human-readable rendering of a finished scrape.

use pluck_common::ScrapeRequest;

pub const SEPARATOR: &str = "---------------------";

/// Four lines: separator, URL, selector, result. Absence is shown as `<none>`
/// so it can't be confused with an empty value (`''`).
pub fn render(req: &ScrapeRequest, result: Option<&str>) -> String {
    let result = match result {
        Some(v) => format!("'{v}'"),
        None => "<none>".to_string(),
    };
    format!(
        "{SEPARATOR}\nCrawling URL: '{}'\nCSS Selector : '{}'\nResult: {result}\n",
        req.url, req.selector
    )
}
