//! Auto-merger port (driven/secondary port)
//!
//! Deterministic merge recipes are executed by an external auto-merger.
//!
//! ## Design Notes
//!
//! - The call is synchronous: recipes are pure text transformations.
//! - Implementations never fail with an error; a recipe that cannot be
//!   applied reports `success = false` and the resolver moves on.

use crate::domain::{ConflictRegion, MergeStrategy, TaskSnapshot};

/// Everything an auto-merger needs to apply one recipe
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub file_path: &'a str,
    /// Current merged content of the file (baseline plus earlier resolutions)
    pub baseline_content: &'a str,
    pub task_snapshots: &'a [TaskSnapshot],
    pub conflict: &'a ConflictRegion,
}

/// Outcome of one auto-merge attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoMergeOutcome {
    pub success: bool,
    pub merged_content: Option<String>,
    /// Why the recipe could not be applied, if it failed
    pub error: Option<String>,
}

impl AutoMergeOutcome {
    pub fn merged(content: impl Into<String>) -> Self {
        Self {
            success: true,
            merged_content: Some(content.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            merged_content: None,
            error: Some(error.into()),
        }
    }
}

/// Port trait for deterministic merge recipes
///
/// # Example
///
/// ```
/// use taskmerge_core::domain::MergeStrategy;
/// use taskmerge_core::ports::{AutoMergeOutcome, IAutoMerger, MergeContext};
///
/// struct RefuseAll;
///
/// impl IAutoMerger for RefuseAll {
///     fn merge(&self, _context: &MergeContext<'_>, strategy: MergeStrategy) -> AutoMergeOutcome {
///         AutoMergeOutcome::failed(format!("{strategy} not supported"))
///     }
/// }
/// ```
pub trait IAutoMerger: Send + Sync {
    /// Apply `strategy` to the conflict described by `context`
    fn merge(&self, context: &MergeContext<'_>, strategy: MergeStrategy) -> AutoMergeOutcome;
}
