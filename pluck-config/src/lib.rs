//! Loader for pluck configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, later ones winning, with
//! `PLUCK_`-prefixed environment variables layered on top (nested keys use
//! `__`, e.g. `PLUCK_TARGET__URL`). String values may reference other
//! environment variables as `${VAR}`; expansion happens after merging.
//!
//! ```yaml
//! target:
//!   url: "https://www.google.com"
//!   selector: "form input[type=submit]"
//! http:
//!   timeout_secs: 10
//!   user_agent: "pluck/${PLUCK_VERSION}"
//! logging:
//!   format: json
//!   emit_stderr: false
//!   dir: "~/logs/pluck"
//!   filter: "info,pluck_http=debug"
//! ```
use config::{Config, Environment, File};
use pluck_common::ScrapeRequest;
use pluck_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use config::ConfigError;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct PluckConfig {
    #[serde(default)]
    pub target: ScrapeRequest,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Transport knobs. Both are unset by default: no timeout, reqwest's agent.
#[derive(Debug, Default, Deserialize)]
pub struct HttpSettings {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl HttpSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub emit_stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            emit_stderr: false,
            dir: None,
            filter: default_filter(),
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PluckConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PluckConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PluckConfigLoader {
    /// Start with `PLUCK_` env overrides only; everything else is defaulted.
    ///
    /// ```
    /// use pluck_config::PluckConfigLoader;
    ///
    /// let config = PluckConfigLoader::new()
    ///     .with_yaml_str("target:\n  selector: '#login input[name=csrf]'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.target.selector, "#login input[name=csrf]");
    /// assert_eq!(config.target.url, "https://www.google.com");
    /// assert!(config.http.timeout().is_none());
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder();
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use pluck_config::PluckConfigLoader;
    ///
    /// unsafe { std::env::set_var("PLUCK_DOC_UA", "pluck-doc/0.1"); }
    ///
    /// let config = PluckConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// http:
    ///   timeout_secs: 3
    ///   user_agent: "${PLUCK_DOC_UA}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.http.user_agent.as_deref(), Some("pluck-doc/0.1"));
    /// assert_eq!(config.http.timeout().map(|d| d.as_secs()), Some(3));
    ///
    /// unsafe { std::env::remove_var("PLUCK_DOC_UA"); }
    /// ```
    pub fn load(self) -> Result<PluckConfig, ConfigError> {
        // Environment goes last so it overrides every file/snippet.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("PLUCK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        // Env values arrive as strings; `config` coerces them per field type
        // (`"4"` into `timeout_secs`, `"1.0"` stays a user agent).
        Config::try_from(&v)?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn logging_settings_map_onto_log_config() {
        let settings = LoggingSettings {
            format: LogFormat::Json,
            emit_stderr: true,
            dir: Some(PathBuf::from("/tmp/pluck-logs")),
            filter: "debug".into(),
        };
        let cfg = settings.to_log_config();
        assert_eq!(cfg.app_name, "pluck");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.emit_stderr);
        assert_eq!(cfg.log_dir.as_deref(), Some(Path::new("/tmp/pluck-logs")));
        assert_eq!(cfg.default_filter, "debug");
    }
}
