//! Tracing subscriber setup.
//!
//! - `DEBUG_THREAD_LOG` or `RUST_LOG`: filter directive (e.g. `debug_thread=trace`)
//! - `DEBUG_THREAD_LOG_FORMAT`: `pretty`, `compact` or `json`
//!
//! ```bash
//! DEBUG_THREAD_LOG=debug_thread=debug debug-thread replay session.jsonl
//! ```

use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

const DEFAULT_FILTER: &str = "debug_thread=info,warn";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line
    #[default]
    Pretty,
    /// Single line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Parse from string (case-insensitive); unknown names fall back to pretty
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, `EnvFilter` syntax
    pub filter: String,
    pub format: LogFormat,
    /// Emit span open/close events
    pub with_spans: bool,
    /// Include file and line
    pub with_file: bool,
    /// Include OS thread ids
    pub with_thread_ids: bool,
    /// Include module path
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
            with_spans: false,
            with_file: false,
            with_thread_ids: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Read `DEBUG_THREAD_LOG` (or `RUST_LOG`) and `DEBUG_THREAD_LOG_FORMAT`.
    pub fn from_env() -> Self {
        let filter = std::env::var("DEBUG_THREAD_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_FILTER.to_string());

        let format = std::env::var("DEBUG_THREAD_LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or_default();

        Self {
            filter,
            format,
            ..Default::default()
        }
    }

    /// Raise the crate's level by `-v` count: 1 → debug, 2+ → trace with
    /// runtime worker thread ids.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.filter = match verbosity {
            0 => return self,
            1 => "debug_thread=debug,info".to_string(),
            _ => "debug_thread=trace,debug".to_string(),
        };
        self.with_file = true;
        self.with_thread_ids = verbosity > 1;
        self
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.with_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(span_events)
            .with_file(self.with_file)
            .with_line_number(self.with_file)
            .with_thread_ids(self.with_thread_ids)
            .with_target(self.with_target);

        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
        }
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: LogConfig) {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(config.layer())
        .with(env_filter);
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("unknown"), LogFormat::Pretty);
    }

    #[test]
    fn test_config_from_env() {
        // SAFETY: only this test touches these variables
        unsafe {
            std::env::remove_var("DEBUG_THREAD_LOG");
            std::env::remove_var("RUST_LOG");
            std::env::remove_var("DEBUG_THREAD_LOG_FORMAT");
        }

        let config = LogConfig::from_env();
        assert_eq!(config.filter, DEFAULT_FILTER);
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_verbosity() {
        let quiet = LogConfig::default().with_verbosity(0);
        assert_eq!(quiet.filter, DEFAULT_FILTER);
        assert!(!quiet.with_file);

        let debug = LogConfig::default().with_verbosity(1);
        assert!(debug.filter.starts_with("debug_thread=debug"));
        assert!(debug.with_file);
        assert!(!debug.with_thread_ids);

        let trace = LogConfig::default().with_verbosity(3);
        assert!(trace.filter.starts_with("debug_thread=trace"));
        assert!(trace.with_thread_ids);
    }
}
