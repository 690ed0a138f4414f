//! Taskmerge Core - Domain types and seams for the merge engine
//!
//! This crate contains:
//! - **Domain types** - `SemanticChange`, `FileAnalysis`, `ConflictRegion`, `MergeResult`
//! - **Port definitions** - Traits for the external collaborators: `IAutoMerger`, `IAiResolver`
//! - **Configuration** - YAML-backed settings for the resolver, overrides and logging
//!
//! # Architecture
//!
//! The domain module holds plain data and classification helpers with no I/O.
//! Ports define the trait interfaces that adapter crates implement; the
//! conflict engine depends only on these traits.

pub mod config;
pub mod domain;
pub mod ports;
