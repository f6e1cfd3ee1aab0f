#![forbid(unsafe_code)]

//! Merge configuration.
//!
//! Defaults reproduce the plain merge exactly. Two knobs can be set in code
//! or from the environment:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `FACETREE_NEW_CATEGORIES` | `ignore`, `append` | `ignore` |
//! | `FACETREE_CASE_INSENSITIVE` | `1/0/true/false/yes/no/on/off` | `false` |

use core::fmt;
use std::env;

/// Environment variable for [`MergeConfig::new_categories`].
pub const ENV_NEW_CATEGORIES: &str = "FACETREE_NEW_CATEGORIES";
/// Environment variable for [`MergeConfig::case_insensitive`].
pub const ENV_CASE_INSENSITIVE: &str = "FACETREE_CASE_INSENSITIVE";

/// What to do with a category present in the incoming tree but not in the
/// displayed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewCategoryPolicy {
    /// Drop it; the displayed categories are fixed after the first result.
    #[default]
    Ignore,
    /// Append it after the existing categories.
    Append,
}

impl NewCategoryPolicy {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Append => "append",
        }
    }

    /// Parse a policy name (case-insensitive, surrounding whitespace ignored).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ignore" | "drop" => Some(Self::Ignore),
            "append" | "add" => Some(Self::Append),
            _ => None,
        }
    }
}

impl fmt::Display for NewCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeConfig {
    /// Policy for incoming categories with no displayed counterpart.
    pub new_categories: NewCategoryPolicy,
    /// Match names ignoring ASCII case.
    pub case_insensitive: bool,
}

impl MergeConfig {
    /// Set the new-category policy.
    #[must_use]
    pub fn with_new_categories(mut self, policy: NewCategoryPolicy) -> Self {
        self.new_categories = policy;
        self
    }

    /// Set case-insensitive name matching.
    #[must_use]
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Whether two facet names refer to the same facet.
    #[must_use]
    pub fn names_match(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    /// Parse config from environment variables, ignoring bad values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> MergeConfigParse {
        from_env_with(|key| env::var(key).ok())
    }
}

/// Configuration parse result with diagnostics.
#[derive(Debug, Clone)]
pub struct MergeConfigParse {
    /// The parsed config; fields with bad values keep their defaults.
    pub config: MergeConfig,
    /// One entry per rejected value.
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Config field name.
    pub field: &'static str,
    /// The rejected raw value.
    pub value: String,
    /// What was expected.
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn from_env_with<F>(mut get: F) -> MergeConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = MergeConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_NEW_CATEGORIES) {
        match NewCategoryPolicy::parse(&value) {
            Some(parsed) => config.new_categories = parsed,
            None => errors.push(ConfigError::new(
                "new_categories",
                value,
                "expected ignore|append",
            )),
        }
    }

    if let Some(value) = get(ENV_CASE_INSENSITIVE) {
        match parse_bool(&value) {
            Some(parsed) => config.case_insensitive = parsed,
            None => errors.push(ConfigError::new(
                "case_insensitive",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    MergeConfigParse { config, errors }
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
