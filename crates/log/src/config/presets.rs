//! Presets tuned for the engine's log targets

use super::{Config, DisplayConfig, Format, WriterConfig};

const ENV_FILTER: &str = "FORMCHECK_LOG";
const ENV_FORMAT: &str = "FORMCHECK_LOG_FORMAT";

/// Remote dispatch and cancellation are the interesting part while developing.
const DEVELOPMENT_FILTER: &str = "debug,formcheck::remote=trace";
/// Per-rule decisions are `trace`; production keeps engine warnings only.
const PRODUCTION_FILTER: &str = "info,formcheck=warn";

impl Config {
    /// Reads `FORMCHECK_LOG` (falling back to `RUST_LOG`), `FORMCHECK_LOG_FORMAT`
    /// and the `FORMCHECK_LOG_*` display flags on top of the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(level) = std::env::var(ENV_FILTER)
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .filter(|level| !level.trim().is_empty())
        {
            config.level = level;
        }
        if let Some(format) = std::env::var(ENV_FORMAT).ok().and_then(|f| Format::from_name(&f)) {
            config.format = format;
        }
        config.display.parse_env();
        config
    }

    /// Pretty output with source locations; remote coordination at `trace`.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: DEVELOPMENT_FILTER.to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// JSON lines on stdout for log shippers.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: PRODUCTION_FILTER.to_string(),
            format: Format::Json,
            writer: WriterConfig::Stdout,
            display: DisplayConfig {
                colors: false,
                thread_ids: true,
                ..DisplayConfig::default()
            },
        }
    }

    /// Everything, routed through libtest capture so passing tests stay quiet.
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            writer: WriterConfig::Test,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
        }
    }
}

impl Format {
    /// Parses `pretty`, `compact` or `json`, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}
