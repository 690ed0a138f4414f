//! Configuration module for Taskmerge.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{MergeStrategy, AI_DIRECTIVES, MANUAL_DIRECTIVES};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Taskmerge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub overrides: OverridesConfig,
    pub logging: LoggingConfig,
}

/// Conflict resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Whether AI-assisted resolution is attempted for MEDIUM/HIGH conflicts.
    pub enable_ai: bool,
    /// Seconds before a single AI resolution call is abandoned.
    pub ai_timeout_secs: u64,
    /// Entries listed per group in the merge explanation before truncating.
    pub explanation_limit: usize,
}

/// Strategy overrides applied before the automatic resolution ladder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridesConfig {
    /// Rules evaluated in order; first match wins.
    pub rules: Vec<OverrideRuleConfig>,
}

/// A single override rule from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRuleConfig {
    /// Glob over the `"{file_path}:{location}"` key, e.g. `"src/**/*.ts:imports"`.
    pub pattern: String,
    /// Merge strategy name or directive (`use_ai`, `manual_review`, ...).
    pub strategy: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/taskmerge/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("taskmerge")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enable_ai: true,
            ai_timeout_secs: 120,
            explanation_limit: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"resolver.ai_timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

/// Whether `token` is a strategy name or a recognised override directive.
pub fn is_valid_override_token(token: &str) -> bool {
    let normalized = token.trim().to_ascii_lowercase();
    AI_DIRECTIVES.contains(&normalized.as_str())
        || MANUAL_DIRECTIVES.contains(&normalized.as_str())
        || normalized.parse::<MergeStrategy>().is_ok()
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- resolver ---
        if self.resolver.ai_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "resolver.ai_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.resolver.explanation_limit == 0 {
            errors.push(ValidationError {
                field: "resolver.explanation_limit".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- overrides ---
        for (i, rule) in self.overrides.rules.iter().enumerate() {
            if rule.pattern.trim().is_empty() {
                errors.push(ValidationError {
                    field: format!("overrides.rules[{i}].pattern"),
                    message: "must not be empty".into(),
                });
            }
            if !is_valid_override_token(&rule.strategy) {
                errors.push(ValidationError {
                    field: format!("overrides.rules[{i}].strategy"),
                    message: format!(
                        "unknown strategy '{}'; expected a merge strategy or one of: {}",
                        rule.strategy,
                        AI_DIRECTIVES
                            .iter()
                            .chain(MANUAL_DIRECTIVES)
                            .copied()
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use taskmerge_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .resolver_enable_ai(false)
///     .override_rule("src/**/*.ts:imports", "combine_imports")
///     .logging_level("debug")
///     .build();
/// assert!(!config.resolver.enable_ai);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- resolver ---

    pub fn resolver_enable_ai(mut self, enabled: bool) -> Self {
        self.config.resolver.enable_ai = enabled;
        self
    }

    pub fn resolver_ai_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.resolver.ai_timeout_secs = seconds;
        self
    }

    pub fn resolver_explanation_limit(mut self, limit: usize) -> Self {
        self.config.resolver.explanation_limit = limit;
        self
    }

    // --- overrides ---

    pub fn override_rule(mut self, pattern: impl Into<String>, strategy: impl Into<String>) -> Self {
        self.config.overrides.rules.push(OverrideRuleConfig {
            pattern: pattern.into(),
            strategy: strategy.into(),
        });
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
