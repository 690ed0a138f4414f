//! Conflict use cases - orchestrate detection and resolution
//!
//! These use cases wire the detector, resolver and suggester into the two
//! workflows callers need: merging one file, and reporting on one file
//! without touching it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use taskmerge_core::domain::{ConflictRegion, MergeResult, TaskSnapshot};

use crate::{
    detector::{validate_analyses, ConflictDetector, TaskAnalyses},
    error::ConflictError,
    resolver::ConflictResolver,
    strategy::StrategySuggester,
};

/// Detects and resolves every conflict in one file
pub struct MergeFileUseCase {
    detector: Arc<ConflictDetector>,
    resolver: Arc<ConflictResolver>,
}

impl MergeFileUseCase {
    pub fn new(detector: Arc<ConflictDetector>, resolver: Arc<ConflictResolver>) -> Self {
        Self { detector, resolver }
    }

    /// Run one merge pass over `analyses`
    ///
    /// Fails only when the analyses describe more than one file.
    pub async fn execute(
        &self,
        analyses: &TaskAnalyses,
        baseline_content: &str,
        task_snapshots: &[TaskSnapshot],
    ) -> Result<MergeResult, ConflictError> {
        validate_analyses(analyses)?;

        let file_path = file_path_of(analyses);
        let conflicts = self.detector.detect_conflicts(analyses);

        debug!(
            file = %file_path,
            conflicts = conflicts.len(),
            "Starting merge pass"
        );

        let result = self
            .resolver
            .resolve_conflicts(&file_path, baseline_content, task_snapshots, &conflicts)
            .await;

        info!(
            file = %file_path,
            decision = %result.decision,
            "Merge pass finished"
        );

        Ok(result)
    }
}

/// A detected region alongside advice for resolving it
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub conflict: ConflictRegion,
    pub suggestions: Vec<String>,
}

/// Detection plus suggestions, with no resolution attempted
pub struct AnalyzeFileUseCase {
    detector: Arc<ConflictDetector>,
}

impl AnalyzeFileUseCase {
    pub fn new(detector: Arc<ConflictDetector>) -> Self {
        Self { detector }
    }

    /// Parse a `{ "<task_id>": FileAnalysis }` JSON document
    pub fn parse_analyses(json: &str) -> Result<TaskAnalyses, ConflictError> {
        let analyses: TaskAnalyses = serde_json::from_str(json)?;
        validate_analyses(&analyses)?;
        Ok(analyses)
    }

    pub fn analyze(&self, analyses: &TaskAnalyses) -> Vec<ConflictReport> {
        self.detector
            .detect_conflicts(analyses)
            .into_iter()
            .map(|conflict| {
                let suggestions = StrategySuggester::suggest_resolution_strategies(&conflict);
                ConflictReport {
                    conflict,
                    suggestions,
                }
            })
            .collect()
    }
}

fn file_path_of(analyses: &TaskAnalyses) -> String {
    analyses
        .values()
        .find(|a| !a.is_empty())
        .or_else(|| analyses.values().next())
        .map(|a| a.file_path.clone())
        .unwrap_or_default()
}
