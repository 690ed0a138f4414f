//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the seams between the conflict engine and the collaborators
//! it treats as black boxes. Implementations live outside this crate.
//!
//! ## Ports Overview
//!
//! - [`IAutoMerger`] - Deterministic, rule-driven combination of changes
//! - [`IAiResolver`] - AI-assisted merge of a single conflict region

pub mod ai_resolver;
pub mod auto_merger;

pub use ai_resolver::{AiResolution, IAiResolver};
pub use auto_merger::{AutoMergeOutcome, IAutoMerger, MergeContext};
