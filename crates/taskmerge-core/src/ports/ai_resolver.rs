//! AI resolver port (driven/secondary port)
//!
//! AI-assisted resolution is the only suspension point of a merge pass.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because failures are adapter-specific (network,
//!   model, quota) and the engine treats all of them the same way.
//! - Uses `#[async_trait]` for async trait methods.
//! - The engine bounds every call with a timeout and a cancellation token;
//!   implementations do not need to enforce their own deadline.

use async_trait::async_trait;

use crate::domain::{ConflictRegion, TaskSnapshot};

/// Result reported by an AI resolver for one conflict
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiResolution {
    pub success: bool,
    pub merged_content: Option<String>,
    /// Model calls made while resolving this conflict
    pub ai_calls_made: u32,
    pub tokens_used: u64,
}

/// Port trait for AI-assisted conflict resolution
#[async_trait]
pub trait IAiResolver: Send + Sync {
    /// Attempt to merge the tasks' edits at one conflict region
    ///
    /// `baseline_code` is the file content the merge should build on.
    async fn resolve_conflict(
        &self,
        conflict: &ConflictRegion,
        baseline_code: &str,
        task_snapshots: &[TaskSnapshot],
    ) -> anyhow::Result<AiResolution>;
}
