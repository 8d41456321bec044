//! Logger builder implementation

use tracing_subscriber::fmt::{self, TestWriter, writer::BoxMakeWriter};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format, WriterConfig};
use crate::{LogError, Result};

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard that keeps the logger alive
///
/// The subscriber is global; the guard marks the scope that installed it and
/// carries the level it was installed with.
#[derive(Debug)]
pub struct LoggerGuard {
    level: Option<String>,
}

/// Build and init the subscriber for a given fmt layer.
/// `without_time` changes the layer type, so both arms are spelled out once here.
macro_rules! init_subscriber {
    ($filter:expr, $layer:expr, $time:expr) => {{
        if $time {
            Registry::default().with($filter).with($layer).try_init()
        } else {
            Registry::default()
                .with($filter)
                .with($layer.without_time())
                .try_init()
        }
    }};
}

fn make_writer(config: WriterConfig) -> BoxMakeWriter {
    match config {
        WriterConfig::Stderr => BoxMakeWriter::new(std::io::stderr),
        WriterConfig::Stdout => BoxMakeWriter::new(std::io::stdout),
        WriterConfig::Test => BoxMakeWriter::new(TestWriter::new()),
    }
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Build and initialize the logger
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already installed
    pub fn build(self) -> Result<LoggerGuard> {
        let filter = EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            directive: self.config.level.clone(),
            reason: e.to_string(),
        })?;

        let writer = make_writer(self.config.writer);
        let display = &self.config.display;

        let installed = match self.config.format {
            Format::Pretty => {
                let layer = fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_thread_ids(display.thread_ids);
                init_subscriber!(filter, layer, display.time)
            }
            Format::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_thread_ids(display.thread_ids);
                init_subscriber!(filter, layer, display.time)
            }
            Format::Json => {
                let layer = fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_thread_ids(display.thread_ids);
                init_subscriber!(filter, layer, display.time)
            }
        };

        installed.map_err(|e| LogError::AlreadySet(e.to_string()))?;

        Ok(LoggerGuard {
            level: Some(self.config.level),
        })
    }
}

impl LoggerGuard {
    pub(crate) fn noop() -> Self {
        Self { level: None }
    }

    /// The level directive this guard installed, `None` for a no-op guard
    #[must_use]
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }
}
