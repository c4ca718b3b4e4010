use anyhow::{Context, Result};
use clap::Parser;
use pluck_common::observability::{LogFormat, init_logging};
use pluck_config::{PluckConfig, PluckConfigLoader};
use pluck_http::HttpClient;
use std::path::PathBuf;
mod report;

const DEFAULT_CONFIG_FILE: &str = "pluck.yaml";

/// Fetch a page and print the value of the first element matching a CSS selector.
#[derive(Debug, Parser)]
#[command(name = "pluck", version)]
struct Cli {
    /// Page to fetch (overrides `target.url`).
    url: Option<String>,
    /// CSS selector for the input element (overrides `target.selector`).
    selector: Option<String>,
    /// Config file; `./pluck.yaml` is read when present and this is unset.
    #[arg(short, long, env = "PLUCK_CONFIG")]
    config: Option<PathBuf>,
    /// Request timeout in seconds. Unbounded by default.
    #[arg(long)]
    timeout: Option<u64>,
    #[arg(long)]
    user_agent: Option<String>,
    /// text | json
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// Mirror log events to stderr.
    #[arg(long)]
    log_stderr: bool,
}

impl Cli {
    fn load_config(&self) -> Result<PluckConfig> {
        let loader = match &self.config {
            Some(path) => PluckConfigLoader::new().with_file(path),
            None => PluckConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
        };
        let mut cfg = loader.load().context("failed to load configuration")?;
        self.apply(&mut cfg);
        Ok(cfg)
    }

    /// CLI arguments beat every other source.
    fn apply(&self, cfg: &mut PluckConfig) {
        if let Some(url) = &self.url {
            cfg.target.url = url.clone();
        }
        if let Some(selector) = &self.selector {
            cfg.target.selector = selector.clone();
        }
        if let Some(secs) = self.timeout {
            cfg.http.timeout_secs = Some(secs);
        }
        if let Some(ua) = &self.user_agent {
            cfg.http.user_agent = Some(ua.clone());
        }
        if let Some(format) = self.log_format {
            cfg.logging.format = format;
        }
        if self.log_stderr {
            cfg.logging.emit_stderr = true;
        }
    }
}

fn build_client(cfg: &PluckConfig) -> Result<HttpClient> {
    let client = match &cfg.http.user_agent {
        Some(ua) => HttpClient::with_user_agent(ua)?,
        None => HttpClient::new()?,
    };
    Ok(match cfg.http.timeout() {
        Some(t) => client.with_timeout(t),
        None => client,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config: defaults < file < env < CLI
    let cfg = cli.load_config()?;

    // 2) Logging goes to file (and maybe stderr); stdout carries the report.
    let log_path = init_logging(cfg.logging.to_log_config())?;
    tracing::debug!(log_path = %log_path.display(), "pluck.start");

    // 3) Fetch, then query.
    let client = build_client(&cfg)?;
    let value = pluck_web::scrape(&client, &cfg.target)
        .await
        .with_context(|| format!("scrape of {} failed", cfg.target.url))?;

    print!("{}", report::render(&cfg.target, value.as_deref()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arguments_override_config() {
        let cli = Cli::try_parse_from([
            "pluck",
            "https://example.com/",
            "#q",
            "--timeout",
            "3",
            "--log-format",
            "json",
            "--log-stderr",
        ])
        .unwrap();

        let mut cfg = PluckConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.target.url, "https://example.com/");
        assert_eq!(cfg.target.selector, "#q");
        assert_eq!(cfg.http.timeout_secs, Some(3));
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert!(cfg.logging.emit_stderr);
        assert!(cfg.http.user_agent.is_none());
    }

    #[test]
    fn no_arguments_keep_configured_target() {
        let cli = Cli::try_parse_from(["pluck"]).unwrap();
        let mut cfg = PluckConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.target, pluck_common::ScrapeRequest::default());
        assert!(!cfg.logging.emit_stderr);
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["pluck", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn client_honours_timeout_setting() {
        let mut cfg = PluckConfig::default();
        cfg.http.timeout_secs = Some(9);
        let client = build_client(&cfg).unwrap();
        assert_eq!(client.default_timeout.map(|d| d.as_secs()), Some(9));
    }
}
