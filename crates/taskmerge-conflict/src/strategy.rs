//! Human-readable resolution suggestions for a conflict region

use taskmerge_core::domain::{ChangeType, ConflictRegion, ConflictSeverity, MergeStrategy};

/// Produces advice for whoever has to settle a conflict
pub struct StrategySuggester;

impl StrategySuggester {
    /// Suggest how to resolve `conflict`
    ///
    /// Auto-mergeable regions get exactly one sentence describing their
    /// recipe. Everything else gets severity-driven advice plus hints for
    /// the change kinds involved. Never empty.
    pub fn suggest_resolution_strategies(conflict: &ConflictRegion) -> Vec<String> {
        if conflict.can_auto_merge {
            if let Some(strategy) = conflict.merge_strategy {
                return vec![Self::describe_strategy(strategy)];
            }
        }

        let mut suggestions: Vec<String> = Self::severity_advice(conflict.severity)
            .iter()
            .map(|s| s.to_string())
            .collect();

        let has = |pred: fn(&ChangeType) -> bool| conflict.change_types.iter().any(pred);

        if has(ChangeType::is_removal) {
            suggestions.push(
                "Confirm the removal is intended before keeping edits from the other task"
                    .to_string(),
            );
        }
        if has(ChangeType::is_rename) {
            suggestions.push("Update call sites to the final name after merging".to_string());
        }
        if has(ChangeType::is_markup) {
            suggestions.push("Render the component after merging to check the markup tree".to_string());
        }
        if has(ChangeType::is_import) {
            suggestions.push("Deduplicate imports and drop any that became unused".to_string());
        }

        suggestions
    }

    /// One-sentence description of a deterministic recipe
    pub fn describe_strategy(strategy: MergeStrategy) -> String {
        let sentence = match strategy {
            MergeStrategy::CombineImports => {
                "Combine the import statements from all tasks, removing duplicates"
            }
            MergeStrategy::HooksFirst => {
                "Insert the new hook calls at the top of the component, then apply the other changes"
            }
            MergeStrategy::HooksThenWrap => {
                "Insert the new hook calls first, then apply the JSX wrapping"
            }
            MergeStrategy::AppendStatements => {
                "Append the new statements from each task in order"
            }
            MergeStrategy::AppendFunctions => "Add every task's new functions to the file",
            MergeStrategy::AppendMethods => "Add every task's new methods to the class",
            MergeStrategy::CombineProps => "Merge the props added by each task into one element",
            MergeStrategy::OrderByDependency => {
                "Apply the changes in dependency order so later edits see earlier ones"
            }
            MergeStrategy::OrderByTime => "Apply the changes in the order the tasks made them",
            MergeStrategy::AiRequired => "Ask the AI resolver to combine the changes",
            MergeStrategy::HumanRequired => "Have a human combine the changes by hand",
            _ => return format!("Apply the '{strategy}' merge strategy"),
        };
        sentence.to_string()
    }

    fn severity_advice(severity: ConflictSeverity) -> &'static [&'static str] {
        match severity {
            ConflictSeverity::Critical => &[
                "Review the overlapping edits manually; automatic merging is unsafe here",
                "Coordinate with the owners of the involved tasks to agree on the final code",
                "Consider re-running one task on top of the other's result",
            ],
            ConflictSeverity::High => &[
                "Try AI-assisted merging and review the result carefully",
                "Apply the tasks sequentially instead of in parallel",
                "Refactor the region so each task touches a separate unit",
            ],
            ConflictSeverity::Medium => &[
                "AI-assisted merging is likely to succeed",
                "Alternatively merge the changes manually",
            ],
            ConflictSeverity::Low | ConflictSeverity::None => &[
                "AI auto-merge should handle this safely",
                "A quick review of the merged result is enough",
            ],
        }
    }
}
