//! Merge pass inputs and outputs

use std::fmt;

use serde::{Deserialize, Serialize};

use super::conflict::ConflictRegion;
use super::newtypes::TaskId;

/// A task's complete post-edit content of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub content: String,
}

impl TaskSnapshot {
    pub fn new(task_id: TaskId, content: impl Into<String>) -> Self {
        Self {
            task_id,
            content: content.into(),
        }
    }
}

/// Terminal outcome of one file's merge pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDecision {
    /// Every conflict resolved without AI
    AutoMerged,
    /// Every conflict resolved, at least one AI call made
    AiMerged,
    /// Some conflicts resolved, others left for a human
    NeedsHumanReview,
    /// Nothing could be resolved
    Failed,
}

impl fmt::Display for MergeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeDecision::AutoMerged => "auto_merged",
            MergeDecision::AiMerged => "ai_merged",
            MergeDecision::NeedsHumanReview => "needs_human_review",
            MergeDecision::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Result of resolving every conflict in one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub decision: MergeDecision,
    pub file_path: String,
    /// `None` when `decision` is `Failed`
    pub merged_content: Option<String>,
    pub conflicts_resolved: Vec<ConflictRegion>,
    pub conflicts_remaining: Vec<ConflictRegion>,
    pub ai_calls_made: u32,
    pub tokens_used: u64,
    pub explanation: String,
}

impl MergeResult {
    /// Whether the file came out fully merged
    pub fn is_success(&self) -> bool {
        matches!(
            self.decision,
            MergeDecision::AutoMerged | MergeDecision::AiMerged
        )
    }

    pub fn needs_review(&self) -> bool {
        !self.conflicts_remaining.is_empty()
    }
}
