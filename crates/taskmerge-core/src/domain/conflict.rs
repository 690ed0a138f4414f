//! Conflict domain types
//!
//! A `ConflictRegion` is produced transiently during one merge pass for each
//! code location that two or more tasks touched. It carries the verdict of
//! the compatibility rules and the severity that gates AI assistance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::change::ChangeType;
use super::errors::DomainError;
use super::newtypes::TaskId;

/// How dangerous a collision is, ordered from harmless to critical
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Changes are provably compatible
    #[default]
    None,
    /// Independent additions or renames, safe to auto-merge
    Low,
    /// Body edits that do not overlap
    Medium,
    /// Structural edits (wrap/unwrap, removals)
    High,
    /// Overlapping body edits; requires a human
    Critical,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictSeverity::None => "none",
            ConflictSeverity::Low => "low",
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
            ConflictSeverity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Deterministic recipe for combining compatible changes
///
/// New variants may be added; code outside this crate must keep a
/// default arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum MergeStrategy {
    /// Union of import statements
    CombineImports,
    /// New hook calls go at the top of the function body
    HooksFirst,
    /// Hook calls first, then apply the markup wrap
    HooksThenWrap,
    /// Append new functions after existing ones
    AppendFunctions,
    /// Append new methods to the class body
    AppendMethods,
    /// Merge JSX props from all tasks
    CombineProps,
    /// Append statements in task order
    AppendStatements,
    /// Order edits so dependencies come first
    OrderByDependency,
    /// Apply edits in the order tasks finished
    OrderByTime,
    /// No deterministic recipe; needs AI assistance
    AiRequired,
    /// No automatic recipe at all
    HumanRequired,
}

impl MergeStrategy {
    pub const ALL: &'static [MergeStrategy] = &[
        MergeStrategy::CombineImports,
        MergeStrategy::HooksFirst,
        MergeStrategy::HooksThenWrap,
        MergeStrategy::AppendFunctions,
        MergeStrategy::AppendMethods,
        MergeStrategy::CombineProps,
        MergeStrategy::AppendStatements,
        MergeStrategy::OrderByDependency,
        MergeStrategy::OrderByTime,
        MergeStrategy::AiRequired,
        MergeStrategy::HumanRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::CombineImports => "combine_imports",
            MergeStrategy::HooksFirst => "hooks_first",
            MergeStrategy::HooksThenWrap => "hooks_then_wrap",
            MergeStrategy::AppendFunctions => "append_functions",
            MergeStrategy::AppendMethods => "append_methods",
            MergeStrategy::CombineProps => "combine_props",
            MergeStrategy::AppendStatements => "append_statements",
            MergeStrategy::OrderByDependency => "order_by_dependency",
            MergeStrategy::OrderByTime => "order_by_time",
            MergeStrategy::AiRequired => "ai_required",
            MergeStrategy::HumanRequired => "human_required",
        }
    }

    /// Static precedence used when several compatible rules at one
    /// location suggest different strategies. Higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            MergeStrategy::HooksThenWrap => 90,
            MergeStrategy::HooksFirst => 80,
            MergeStrategy::CombineProps => 70,
            MergeStrategy::CombineImports => 60,
            MergeStrategy::AppendMethods => 50,
            MergeStrategy::AppendFunctions => 40,
            MergeStrategy::AppendStatements => 30,
            MergeStrategy::OrderByDependency => 20,
            MergeStrategy::OrderByTime => 10,
            MergeStrategy::AiRequired | MergeStrategy::HumanRequired => 0,
        }
    }

    /// Whether this names a deterministic recipe an auto-merger can run
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, MergeStrategy::AiRequired | MergeStrategy::HumanRequired)
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        MergeStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownStrategy(s.to_string()))
    }
}

/// Override tokens that ask for AI-assisted resolution
pub const AI_DIRECTIVES: &[&str] = &["use_ai", "ai_merge", "ai_required"];

/// Override tokens that send a conflict straight to human review
pub const MANUAL_DIRECTIVES: &[&str] = &["manual_review", "human_required", "skip"];

/// Placeholder reason recorded on fully compatible regions
pub const COMPATIBLE_REASON: &str = "Changes are compatible";

/// A code location where two or more tasks made changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRegion {
    pub file_path: String,
    pub location: String,
    /// Distinct contributing tasks, in input order
    pub tasks_involved: Vec<TaskId>,
    /// Distinct change kinds seen at the location, in input order
    pub change_types: Vec<ChangeType>,
    pub severity: ConflictSeverity,
    pub can_auto_merge: bool,
    pub merge_strategy: Option<MergeStrategy>,
    pub reason: String,
}

impl ConflictRegion {
    /// Key used by user strategy overrides: `"{file_path}:{location}"`
    pub fn key(&self) -> String {
        conflict_key(&self.file_path, &self.location)
    }

    /// Whether a deterministic recipe is available for this region
    pub fn has_auto_merge_strategy(&self) -> bool {
        self.can_auto_merge && self.merge_strategy.is_some()
    }

    pub fn involves(&self, change_type: ChangeType) -> bool {
        self.change_types.contains(&change_type)
    }
}

/// Builds the override key for a file/location pair
pub fn conflict_key(file_path: &str, location: &str) -> String {
    format!("{file_path}:{location}")
}
