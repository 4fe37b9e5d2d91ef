use log::LevelFilter;
use serde::Deserialize;

/// Decides what an expression renders when its path does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unresolved {
    /// Render nothing.
    #[default]
    Empty,
    /// Render the given text, with `{0}` replaced by the last segment of the
    /// path. The text is written without escaping.
    Format(String),
    /// Return an [`Error`][`crate::Error`] with
    /// [`ErrorKind::UndefinedBinding`][`crate::ErrorKind::UndefinedBinding`].
    Throw,
}

/// Settings consumed by an [`Engine`][`crate::Engine`].
///
/// # Examples
///
/// ```
/// use stache::{Config, Unresolved};
///
/// let config = Config::default()
///     .with_unresolved(Unresolved::Throw)
///     .with_recursion_limit(16);
///
/// let parsed: Config = serde_json::from_str(r#"{"unresolved": "throw", "recursion_limit": 16}"#).unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Policy for paths that do not resolve.
    pub unresolved: Unresolved,
    /// Messages from the `log` helper more verbose than this are dropped.
    pub log_level: LevelFilter,
    /// When true, a partial that cannot be found renders nothing.
    pub tolerate_missing_partials: bool,
    /// Maximum nesting of partial inclusion. Blocks do not count.
    pub recursion_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unresolved: Unresolved::Empty,
            log_level: LevelFilter::Info,
            tolerate_missing_partials: false,
            recursion_limit: 64,
        }
    }
}

impl Config {
    /// Set the policy for paths that do not resolve.
    pub fn with_unresolved(mut self, unresolved: Unresolved) -> Self {
        self.unresolved = unresolved;

        self
    }

    /// Set the threshold of the `log` helper.
    pub fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;

        self
    }

    /// Set whether a missing partial renders nothing instead of failing.
    pub fn with_tolerate_missing_partials(mut self, tolerate: bool) -> Self {
        self.tolerate_missing_partials = tolerate;

        self
    }

    /// Set the maximum nesting of partial inclusion.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;

        self
    }
}
