//! Named and inline validation patterns
//!
//! A `pattern` constraint is resolved in this order:
//!
//! 1. `a||b||c`: valid if any alternative matches (each alternative is
//!    resolved on its own, so names and inline regexes can be mixed);
//! 2. a registered name (`date`, `digits`, `email`, `number`, `price`, ...);
//! 3. an inline regular expression, anchored as `^(?:...)$`.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;

use crate::error::{EngineError, Result};

const BUILTIN: &[(&str, &str)] = &[
    ("cap", r"^[0-9]{5}$"),
    (
        "date",
        r"^[0-9]{4}-(0[1-9]|1[012])-(0[1-9]|1[0-9]|2[0-9]|3[01])$",
    ),
    ("digits", r"^[0-9]+$"),
    ("email", r"^[a-zA-Z0-9_.\-]+@([a-zA-Z0-9\-]\.?)*[a-zA-Z]{2,}$"),
    ("fiscalCode", r"^[0-9a-zA-Z]{16}$"),
    ("number", r"^-?[0-9]+(\.[0-9]+)?([eE][-+]?[0-9]+)?$"),
    ("price", r"^[0-9]+(\.[0-9]{1,2})?$"),
    ("vatNumber", r"^[0-9]{11}$"),
];

static BUILTIN_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    BUILTIN
        .iter()
        .map(|(name, source)| (*name, Regex::new(source).unwrap()))
        .collect()
});

/// Built-in pattern by name, independent of any library overrides.
///
/// The `type` rule uses these directly so that overriding `email` in a
/// [`PatternLibrary`] changes `pattern="email"` but not `type="email"`.
#[must_use]
pub fn builtin(name: &str) -> Option<&'static Regex> {
    BUILTIN_PATTERNS.get(name)
}

/// Named patterns plus a cache of compiled inline patterns.
#[derive(Debug)]
pub struct PatternLibrary {
    named: HashMap<String, Regex>,
    // `None` records an inline pattern that failed to compile.
    inline: RwLock<HashMap<String, Option<Regex>>>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternLibrary {
    /// A library holding the built-in named patterns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            named: BUILTIN_PATTERNS
                .iter()
                .map(|(name, re)| ((*name).to_string(), re.clone()))
                .collect(),
            inline: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) a named pattern. The source is anchored.
    pub fn register(&mut self, name: impl Into<String>, source: &str) -> Result<()> {
        let name = name.into();
        let re = Regex::new(&anchor(source)).map_err(|source| EngineError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        self.named.insert(name, re);
        Ok(())
    }

    /// Named pattern lookup.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Regex> {
        self.named.get(name)
    }

    /// Whether `value` satisfies the pattern attribute `pattern`.
    ///
    /// An inline pattern that does not compile never matches.
    pub fn is_match(&self, pattern: &str, value: &str) -> bool {
        if pattern.contains("||") {
            return pattern
                .split("||")
                .any(|alternative| self.is_match_single(alternative, value));
        }
        self.is_match_single(pattern, value)
    }

    fn is_match_single(&self, pattern: &str, value: &str) -> bool {
        if let Some(re) = self.named.get(pattern) {
            return re.is_match(value);
        }
        self.inline(pattern).is_some_and(|re| re.is_match(value))
    }

    fn inline(&self, pattern: &str) -> Option<Regex> {
        if let Some(cached) = self.inline.read().get(pattern) {
            return cached.clone();
        }

        let compiled = match Regex::new(&anchor(pattern)) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(pattern, error = %err, "inline pattern does not compile, treating as mismatch");
                None
            }
        };
        self.inline
            .write()
            .insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

fn anchor(source: &str) -> String {
    format!("^(?:{source})$")
}
