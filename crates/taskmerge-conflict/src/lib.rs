//! Taskmerge Conflict - Conflict detection, classification and resolution
//!
//! Provides:
//! - Static compatibility rules over pairs of change kinds
//! - Location-based conflict detection across tasks
//! - Severity classification gating AI assistance
//! - Ordered resolution: user override, deterministic merge, AI merge
//! - Human-readable resolution suggestions

pub mod detector;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod rules;
pub mod severity;
pub mod strategy;
pub mod use_cases;

pub use detector::{
    detect_conflicts, validate_analyses, ConflictDetector, ImplicitConflictDetector, TaskAnalyses,
};
pub use error::ConflictError;
pub use policy::{validate_rule, OverridePolicy, OverrideRule, UserDirective};
pub use resolver::{build_explanation, build_explanation_with_limit, ConflictResolver, Resolution};
pub use rules::{CompatibilityRule, CompatibilityRuleIndex};
pub use severity::SeverityAssessor;
pub use strategy::StrategySuggester;
pub use use_cases::{AnalyzeFileUseCase, ConflictReport, MergeFileUseCase};
