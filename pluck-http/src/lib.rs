//! Minimal HTTP fetcher with safe logging.
//!
//! - One GET per call: no retries, no status-code branching
//! - Body is decoded as text using the response charset, whatever the status
//! - No timeout unless the caller sets one (client-wide or per request)
//! - Redacts sensitive query params and never logs secret header values
//! - Optional *raw* request/response logging via `PLUCK_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), pluck_http::HttpError> {
//! let client = pluck_http::HttpClient::new()?;
//! let html = client.get_text("https://www.example.com").await?;
//! # let _ = html;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response status, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `PLUCK_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "PLUCK_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    let mut shown = url.clone();
    let (_, redacted) = redact_query(url);
    if !redacted.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(redacted);
    }
    parts.push(format!("'{}'", shown.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("cookie") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

/// Failure to obtain response text. Every variant is a network-level error
/// from the caller's point of view; none carries a partial body.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the fetcher.
///
/// ```
/// use pluck_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    /// Overrides the client-wide timeout for this request.
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
}

/// A fetched page: final location, status and decoded body.
#[derive(Clone, Debug)]
pub struct TextResponse {
    /// URL after redirects.
    pub final_url: Url,
    pub status: StatusCode,
    pub body: String,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    /// Sent with every request; kept so raw logs show what goes on the wire.
    default_headers: HeaderMap,
    pub default_timeout: Option<Duration>,
}

impl HttpClient {
    /// Construct a client with reqwest's defaults (redirect policy included)
    /// and no timeout.
    ///
    /// ```no_run
    /// use pluck_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new()?;
    /// assert!(client.default_timeout.is_none());
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::build(None)
    }

    /// Construct a client that sends `user_agent` with every request.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, HttpError> {
        Self::build(Some(user_agent))
    }

    fn build(user_agent: Option<&str>) -> Result<Self, HttpError> {
        let mut default_headers = HeaderMap::new();
        if let Some(ua) = user_agent {
            let value = HeaderValue::from_str(ua)
                .map_err(|e| HttpError::Build(format!("invalid User-Agent: {e}")))?;
            default_headers.insert(USER_AGENT, value);
        }
        let inner = Client::builder()
            .default_headers(default_headers.clone())
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_headers,
            default_timeout: None,
        })
    }

    /// Bound every request made by this client.
    ///
    /// ```no_run
    /// use pluck_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?.with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Some(Duration::from_secs(2)));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = Some(dur);
        self
    }

    /// Client defaults overlaid with per-request headers, as reqwest merges them.
    fn effective_headers(&self, opts: &RequestOpts) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        if let Some(extra) = &opts.headers {
            for (name, value) in extra {
                merged.insert(name, value.clone());
            }
        }
        merged
    }

    /// GET `url` and return the body as text, whatever the status code.
    pub async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        self.get(url, RequestOpts::default())
            .await
            .map(|resp| resp.body)
    }

    /// GET `url` with per-request options and return the full [`TextResponse`].
    pub async fn get(&self, url: &str, opts: RequestOpts) -> Result<TextResponse, HttpError> {
        let url = parse_url(url)?;

        let mut rb = self.inner.get(url.clone());
        let timeout = opts.timeout.or(self.default_timeout);
        if let Some(t) = timeout {
            rb = rb.timeout(t);
        }
        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        // ----- Safe request logging (pre-send) -----
        let (host_path, redacted_q) = redact_query(&url);
        let timeout_ms = timeout.map(|t| t.as_millis() as u64);
        tracing::debug!(
            method = %Method::GET,
            host_path = %host_path,
            query = ?redacted_q,
            timeout_ms = ?timeout_ms,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&Method::GET, &url, &self.effective_headers(&opts));
            tracing::debug!(target: "http.raw", %curl, "request");
        }

        // ----- Send -----
        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(host_path = %host_path, message = %message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let final_url = resp.url().clone();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(host_path = %host_path, %status, message = %message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;
        let redirected = final_url != url;
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        tracing::debug!(
            %status,
            duration_ms = dur_ms,
            body_len = body.len(),
            content_type = ?content_type,
            redirected,
            "http.response"
        );
        if !status.is_success() {
            // Informational only: the body is still handed back.
            tracing::info!(%status, host_path = %host_path, "http.response.non_success");
        }

        if raw_enabled() {
            let truncated = body.len() > RAW_MAX_BODY;
            tracing::info!(
                target: "http.raw",
                status = %status,
                duration_ms = dur_ms,
                headers = ?redact_headers(&headers),
                body = %truncate_chars(&body, RAW_MAX_BODY),
                truncated
            );
        }
        tracing::trace!(body_snippet = %snip_body(&body), "http.response.body_snippet");

        Ok(TextResponse {
            final_url,
            status,
            body,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn parse_url(raw: &str) -> Result<Url, HttpError> {
    let url = Url::parse(raw.trim()).map_err(|e| HttpError::Url(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(HttpError::Url(format!(
            "{raw}: unsupported scheme `{other}`"
        ))),
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn snip_body(body: &str) -> String {
    let mut snip = truncate_chars(body, SNIPPET_MAX).to_string();
    if snip.len() < body.len() {
        snip.push_str("...");
    }
    snip
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    // Return "host + path" string and redacted query list for logging
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = v.to_string();
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token"
                    | "authorization"
                    | "auth"
                    | "key"
                    | "api_key"
                    | "token"
                    | "secret"
                    | "client_secret"
                    | "password"
            );
            (k, if is_secret { "<redacted>".into() } else { v })
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_and_non_http_urls() {
        assert!(matches!(parse_url("not a url"), Err(HttpError::Url(_))));
        assert!(matches!(parse_url("ftp://example.com/"), Err(HttpError::Url(_))));
        assert!(parse_url(" https://example.com/ ").is_ok());
    }

    #[test]
    fn redacts_secret_query_values() {
        let url = Url::parse("https://example.com/login?next=/home&token=abc").unwrap();
        let (host_path, q) = redact_query(&url);
        assert_eq!(host_path, "example.com/login");
        assert_eq!(
            q,
            vec![
                ("next".to_string(), "/home".to_string()),
                ("token".to_string(), "<redacted>".to_string()),
            ]
        );
    }

    #[test]
    fn curl_line_hides_secrets() {
        let url = Url::parse("https://example.com/?api_key=s3cret").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer s3cret"));
        let curl = make_curl(&Method::GET, &url, &headers);
        assert!(!curl.contains("s3cret"));
        assert!(curl.starts_with("curl -XGET"));
    }

    #[test]
    fn curl_line_carries_client_user_agent() {
        let client = HttpClient::with_user_agent("pluck-test/1.0").unwrap();
        let mut extra = HeaderMap::new();
        extra.insert("accept-language", HeaderValue::from_static("en"));
        let opts = RequestOpts {
            headers: Some(extra),
            ..Default::default()
        };
        let url = Url::parse("https://example.com/").unwrap();
        let curl = make_curl(&Method::GET, &url, &client.effective_headers(&opts));
        assert!(curl.contains("-H 'user-agent: pluck-test/1.0'"), "{curl}");
        assert!(curl.contains("-H 'accept-language: en'"), "{curl}");
    }

    #[test]
    fn request_headers_override_client_defaults() {
        let client = HttpClient::with_user_agent("default/1").unwrap();
        let mut extra = HeaderMap::new();
        extra.insert(USER_AGENT, HeaderValue::from_static("override/2"));
        let merged = client.effective_headers(&RequestOpts {
            headers: Some(extra),
            ..Default::default()
        });
        assert_eq!(merged.get_all(USER_AGENT).iter().count(), 1);
        assert_eq!(merged[USER_AGENT], "override/2");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "é".repeat(400);
        let snip = snip_body(&body);
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn rejects_header_unsafe_user_agent() {
        assert!(matches!(
            HttpClient::with_user_agent("bad\nagent"),
            Err(HttpError::Build(_))
        ));
    }
}
