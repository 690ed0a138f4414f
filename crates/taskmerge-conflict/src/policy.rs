//! Strategy overrides applied before automatic resolution
//!
//! Overrides come from two places: an exact `"{file_path}:{location}"` map
//! supplied by the caller for this pass, and glob rules from configuration.
//! Exact entries win; otherwise rules are matched in first-match-wins order.

use std::collections::HashMap;

use glob::Pattern;
use tracing::{debug, trace, warn};

use taskmerge_core::config::OverridesConfig;
use taskmerge_core::domain::{MergeStrategy, AI_DIRECTIVES, MANUAL_DIRECTIVES};

use crate::error::ConflictError;

pub use taskmerge_core::config::OverrideRuleConfig as OverrideRule;

/// What an override token asks the resolver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDirective {
    /// Run the deterministic auto-merger with this recipe
    Strategy(MergeStrategy),
    /// Go straight to AI-assisted resolution
    UseAi,
    /// Leave the conflict for a human, skipping every automatic attempt
    ManualReview,
}

impl UserDirective {
    /// Parses an override token
    ///
    /// Directive tokens are checked before strategy names, so `ai_required`
    /// and `human_required` act as directives.
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token.trim().to_ascii_lowercase();
        if AI_DIRECTIVES.contains(&normalized.as_str()) {
            return Some(UserDirective::UseAi);
        }
        if MANUAL_DIRECTIVES.contains(&normalized.as_str()) {
            return Some(UserDirective::ManualReview);
        }
        normalized.parse::<MergeStrategy>().ok().map(UserDirective::Strategy)
    }
}

/// Validates an override rule's glob pattern and strategy token
pub fn validate_rule(rule: &OverrideRule) -> Result<(), ConflictError> {
    Pattern::new(&rule.pattern).map_err(|e| ConflictError::InvalidPattern {
        pattern: rule.pattern.clone(),
        reason: e.to_string(),
    })?;

    UserDirective::parse(&rule.strategy)
        .ok_or_else(|| ConflictError::InvalidStrategy(rule.strategy.clone()))?;

    Ok(())
}

/// Resolves the override token, if any, for a conflict key
#[derive(Debug, Clone, Default)]
pub struct OverridePolicy {
    exact: HashMap<String, String>,
    rules: Vec<(Pattern, String)>,
}

impl OverridePolicy {
    /// Compiles glob rules; invalid rules are logged and skipped
    pub fn new(rules: &[OverrideRule]) -> Self {
        let compiled: Vec<(Pattern, String)> = rules
            .iter()
            .filter_map(|rule| {
                let pattern = match Pattern::new(&rule.pattern) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(
                            pattern = %rule.pattern,
                            error = %e,
                            "Skipping invalid override rule pattern"
                        );
                        return None;
                    }
                };
                if UserDirective::parse(&rule.strategy).is_none() {
                    warn!(
                        strategy = %rule.strategy,
                        "Skipping invalid override rule strategy"
                    );
                    return None;
                }
                Some((pattern, rule.strategy.clone()))
            })
            .collect();

        debug!(rules_count = compiled.len(), "OverridePolicy initialized");

        Self {
            exact: HashMap::new(),
            rules: compiled,
        }
    }

    pub fn from_config(config: &OverridesConfig) -> Self {
        Self::new(&config.rules)
    }

    /// Adds the caller's exact `"{file_path}:{location}" -> token` map
    ///
    /// Tokens are kept verbatim; unrecognised ones are reported when the
    /// resolver reaches the conflict.
    pub fn with_user_strategies(mut self, strategies: HashMap<String, String>) -> Self {
        self.exact.extend(strategies);
        self
    }

    /// Token for a conflict key: exact entry first, then first matching rule
    pub fn lookup(&self, key: &str) -> Option<&str> {
        if let Some(token) = self.exact.get(key) {
            trace!(key = %key, token = %token, "Exact user override");
            return Some(token);
        }

        for (pattern, token) in &self.rules {
            if pattern.matches(key) {
                trace!(key = %key, pattern = %pattern, token = %token, "Override rule matched");
                return Some(token);
            }
        }

        None
    }

    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.rules.is_empty()
    }
}
