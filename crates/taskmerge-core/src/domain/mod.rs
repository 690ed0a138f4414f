//! Domain types for the merge engine
//!
//! - Newtypes for validated identifiers
//! - Semantic change records produced by the extractor
//! - Conflict regions, severities and merge strategies
//! - Merge pass inputs and results
//! - Domain-specific error types

pub mod change;
pub mod conflict;
pub mod errors;
pub mod merge;
pub mod newtypes;

// Re-export commonly used types
pub use change::{ChangeType, FileAnalysis, SemanticChange};
pub use conflict::{
    conflict_key, ConflictRegion, ConflictSeverity, MergeStrategy, AI_DIRECTIVES,
    COMPATIBLE_REASON, MANUAL_DIRECTIVES,
};
pub use errors::DomainError;
pub use merge::{MergeDecision, MergeResult, TaskSnapshot};
pub use newtypes::TaskId;
