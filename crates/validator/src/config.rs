//! Engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// When a field is revalidated while the user edits the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// On every value change.
    #[default]
    Change,
    /// When the field loses focus.
    Blur,
    /// Only on submission.
    None,
}

/// Serializable engine options. Callbacks live in [`Hooks`](crate::Hooks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Trim text values in place before validating them.
    pub auto_trim: bool,
    /// Live revalidation trigger.
    pub trigger_on: TriggerMode,
    /// Whether the host delivers a native change signal for every control.
    /// When it does not, change is inferred from the
    /// before-activate / click / focus-out triple.
    pub change_bubbles: bool,
    /// Upper bound on a remote check, in milliseconds. `None` waits forever.
    pub remote_timeout_ms: Option<u64>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            auto_trim: true,
            trigger_on: TriggerMode::Change,
            change_bubbles: true,
            remote_timeout_ms: Some(10_000),
        }
    }
}

impl ValidatorConfig {
    /// Parses a JSON document; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn remote_timeout(&self) -> Option<Duration> {
        self.remote_timeout_ms.map(Duration::from_millis)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_trigger(mut self, trigger_on: TriggerMode) -> Self {
        self.trigger_on = trigger_on;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_auto_trim(mut self, auto_trim: bool) -> Self {
        self.auto_trim = auto_trim;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_change_bubbles(mut self, change_bubbles: bool) -> Self {
        self.change_bubbles = change_bubbles;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_remote_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.remote_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
