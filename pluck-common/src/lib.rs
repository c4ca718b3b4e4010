//! Common types and utilities shared across pluck crates.
//!
//! This crate holds the request model passed from configuration to the
//! scraper, plus the observability helpers every binary and integration test
//! uses. It stays dependency-light so every crate in the workspace can depend
//! on it.
//!
//! # Overview
//!
//! - [`ScrapeRequest`]: the URL + CSS selector pair a single run operates on
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use pluck_common::ScrapeRequest;
//!
//! let req = ScrapeRequest::default();
//! assert_eq!(req.url, "https://www.google.com");
//! assert_eq!(req.selector, "form input[type=submit]");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Page fetched when nothing else is configured.
pub const DEFAULT_URL: &str = "https://www.google.com";
/// Selector applied when nothing else is configured.
pub const DEFAULT_SELECTOR: &str = "form input[type=submit]";

/// One fetch-then-query job: which page to load and which element to read.
///
/// Neither field is validated here; the HTTP client rejects malformed URLs and
/// the selector engine rejects malformed selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Target page.
    #[serde(default = "default_url")]
    pub url: String,
    /// CSS selector for the desired input element.
    #[serde(default = "default_selector")]
    pub selector: String,
}

impl ScrapeRequest {
    /// Build a request from any string-ish pair.
    ///
    /// ```
    /// use pluck_common::ScrapeRequest;
    ///
    /// let req = ScrapeRequest::new("http://localhost:8080/login", "#csrf");
    /// assert_eq!(req.selector, "#csrf");
    /// ```
    pub fn new(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
        }
    }
}

impl Default for ScrapeRequest {
    fn default() -> Self {
        Self::new(DEFAULT_URL, DEFAULT_SELECTOR)
    }
}

fn default_url() -> String {
    DEFAULT_URL.into()
}
fn default_selector() -> String {
    DEFAULT_SELECTOR.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let req: ScrapeRequest =
            serde_json::from_str(r#"{"selector": "input[name=q]"}"#).unwrap();
        assert_eq!(req.url, DEFAULT_URL);
        assert_eq!(req.selector, "input[name=q]");
    }
}
