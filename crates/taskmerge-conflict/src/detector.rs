//! Conflict detection logic
//!
//! Groups every task's semantic changes by code location and applies the
//! compatibility rules pairwise wherever two or more tasks touched the same
//! location.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, trace};

use taskmerge_core::domain::{
    ChangeType, ConflictRegion, ConflictSeverity, FileAnalysis, MergeStrategy, SemanticChange,
    TaskId, COMPATIBLE_REASON,
};

use crate::{error::ConflictError, rules::CompatibilityRuleIndex, severity::SeverityAssessor};

/// One file's analyses, keyed by the task that produced them
pub type TaskAnalyses = BTreeMap<TaskId, FileAnalysis>;

/// Pluggable stage for conflicts that do not share a location
///
/// Examples are a rename in one task against a stale call site in another,
/// or an import removal against a new usage. Regions returned here are
/// appended after the location-based ones.
pub trait ImplicitConflictDetector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn detect(&self, analyses: &TaskAnalyses) -> Vec<ConflictRegion>;
}

/// Detects conflicts between tasks' change sets for one file
pub struct ConflictDetector {
    rules: Arc<CompatibilityRuleIndex>,
    implicit: Vec<Box<dyn ImplicitConflictDetector>>,
}

impl ConflictDetector {
    pub fn new(rules: Arc<CompatibilityRuleIndex>) -> Self {
        Self {
            rules,
            implicit: Vec::new(),
        }
    }

    /// Register an implicit-conflict stage
    pub fn with_implicit_detector(mut self, detector: Box<dyn ImplicitConflictDetector>) -> Self {
        self.implicit.push(detector);
        self
    }

    pub fn rules(&self) -> &CompatibilityRuleIndex {
        &self.rules
    }

    /// Runs location-based detection, then every registered implicit stage
    pub fn detect_conflicts(&self, analyses: &TaskAnalyses) -> Vec<ConflictRegion> {
        let mut conflicts = detect_conflicts(analyses, &self.rules);

        for detector in &self.implicit {
            let found = detector.detect(analyses);
            debug!(
                detector = detector.name(),
                count = found.len(),
                "Implicit conflict stage finished"
            );
            conflicts.extend(found);
        }

        conflicts
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(Arc::new(CompatibilityRuleIndex::new()))
    }
}

/// Checks that every non-empty analysis describes the same file
///
/// # Errors
/// Returns `ConflictError::InvalidInput` naming the first mismatching task
pub fn validate_analyses(analyses: &TaskAnalyses) -> Result<(), ConflictError> {
    let mut expected: Option<&str> = None;
    for (task_id, analysis) in analyses.iter().filter(|(_, a)| !a.is_empty()) {
        match expected {
            None => expected = Some(analysis.file_path.as_str()),
            Some(path) if path != analysis.file_path => {
                return Err(ConflictError::InvalidInput(format!(
                    "task {task_id} analysed {} but expected {path}",
                    analysis.file_path
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Detect conflicts among the tasks' changes to one file
///
/// Returns one region per location touched by two or more tasks whose
/// changes share a single target. Fully compatible locations are returned
/// too, with `can_auto_merge` set and the chosen strategy.
pub fn detect_conflicts(
    task_analyses: &TaskAnalyses,
    rule_index: &CompatibilityRuleIndex,
) -> Vec<ConflictRegion> {
    let mut contributing = task_analyses.values().filter(|a| !a.is_empty());
    let Some(first) = contributing.next() else {
        return Vec::new();
    };
    if contributing.next().is_none() {
        trace!(file = %first.file_path, "Single contributing task, no conflicts possible");
        return Vec::new();
    }
    let file_path = first.file_path.as_str();

    let mut by_location: BTreeMap<&str, Vec<(&TaskId, &SemanticChange)>> = BTreeMap::new();
    for (task_id, analysis) in task_analyses {
        for change in &analysis.changes {
            by_location
                .entry(change.location.as_str())
                .or_default()
                .push((task_id, change));
        }
    }

    let mut conflicts = Vec::new();

    for (location, entries) in &by_location {
        let tasks = distinct_tasks(entries);
        if tasks.len() < 2 {
            continue;
        }

        let target = &entries[0].1.target;
        if entries.iter().any(|(_, c)| &c.target != target) {
            debug!(
                file = %file_path,
                location = %location,
                "Different targets at shared location, treating as independent"
            );
            continue;
        }

        let region = analyze_location(file_path, location, entries, tasks, rule_index);
        debug!(
            file = %file_path,
            location = %location,
            severity = %region.severity,
            can_auto_merge = region.can_auto_merge,
            strategy = ?region.merge_strategy,
            "Conflict region detected"
        );
        conflicts.push(region);
    }

    info!(
        file = %file_path,
        locations = by_location.len(),
        regions = conflicts.len(),
        "Conflict detection complete"
    );

    conflicts
}

fn distinct_tasks(entries: &[(&TaskId, &SemanticChange)]) -> Vec<TaskId> {
    let mut tasks: Vec<TaskId> = Vec::new();
    for (task_id, _) in entries {
        if !tasks.contains(*task_id) {
            tasks.push((*task_id).clone());
        }
    }
    tasks
}

fn analyze_location(
    file_path: &str,
    location: &str,
    entries: &[(&TaskId, &SemanticChange)],
    tasks_involved: Vec<TaskId>,
    rule_index: &CompatibilityRuleIndex,
) -> ConflictRegion {
    let mut incompatible_reasons: Vec<String> = Vec::new();
    let mut strategy: Option<MergeStrategy> = None;

    for (i, (_, a)) in entries.iter().enumerate() {
        for (_, b) in &entries[i + 1..] {
            let rule = rule_index.verdict(a.change_type, b.change_type);
            if rule.compatible {
                if let Some(candidate) = rule.strategy {
                    strategy = Some(prefer_strategy(strategy, candidate));
                }
            } else if !incompatible_reasons.contains(&rule.reason) {
                incompatible_reasons.push(rule.reason);
            }
        }
    }

    let mut change_types: Vec<ChangeType> = Vec::new();
    for (_, change) in entries {
        if !change_types.contains(&change.change_type) {
            change_types.push(change.change_type);
        }
    }

    let compatible = incompatible_reasons.is_empty();
    let (severity, merge_strategy, reason) = if compatible {
        (ConflictSeverity::None, strategy, COMPATIBLE_REASON.to_string())
    } else {
        let changes: Vec<&SemanticChange> = entries.iter().map(|(_, c)| *c).collect();
        (
            SeverityAssessor::assess(&change_types, &changes),
            None,
            incompatible_reasons.join("; "),
        )
    };

    ConflictRegion {
        file_path: file_path.to_string(),
        location: location.to_string(),
        tasks_involved,
        change_types,
        severity,
        can_auto_merge: compatible,
        merge_strategy,
        reason,
    }
}

/// Higher static priority wins, independent of iteration order
fn prefer_strategy(current: Option<MergeStrategy>, candidate: MergeStrategy) -> MergeStrategy {
    match current {
        Some(existing) if existing.priority() >= candidate.priority() => existing,
        _ => candidate,
    }
}
