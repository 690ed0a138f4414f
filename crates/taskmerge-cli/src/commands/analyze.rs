//! Analyze command - Report conflicts between tasks' edits of one file
//!
//! Provides the `taskmerge analyze` CLI command which:
//! 1. Reads a JSON document mapping task ids to semantic analyses
//! 2. Runs location-based conflict detection against the rule table
//! 3. Prints each region with its severity, matching override and suggestions
//! 4. Warns about configured override rules the resolver would ignore

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use taskmerge_conflict::{
    validate_rule, AnalyzeFileUseCase, ConflictDetector, ConflictReport, OverridePolicy,
};
use taskmerge_core::config::Config;

use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    /// JSON file of the form { "<task_id>": { "file_path": ..., "changes": [...] } }
    pub file: PathBuf,

    /// Only show regions that cannot be merged automatically
    #[arg(long)]
    pub conflicts_only: bool,
}

impl AnalyzeCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let raw = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let analyses = AnalyzeFileUseCase::parse_analyses(&raw)
            .with_context(|| format!("Invalid analyses in {}", self.file.display()))?;

        let source_file = analyses
            .values()
            .find(|a| !a.is_empty())
            .map(|a| a.file_path.clone())
            .unwrap_or_else(|| "-".to_string());

        let use_case = AnalyzeFileUseCase::new(Arc::new(ConflictDetector::default()));
        let mut reports = use_case.analyze(&analyses);
        if self.conflicts_only {
            reports.retain(|r| !r.conflict.can_auto_merge);
        }

        let policy = OverridePolicy::from_config(&config.overrides);

        info!(
            file = %source_file,
            tasks = analyses.len(),
            regions = reports.len(),
            "Analyzed task changes"
        );

        for message in ignored_rules(config) {
            formatter.warn(&message);
        }

        if format.is_json() {
            let regions = reports
                .iter()
                .map(|r| report_json(r, &policy))
                .collect::<Result<Vec<_>>>()?;
            let json = serde_json::json!({
                "file": source_file,
                "tasks": analyses.len(),
                "count": reports.len(),
                "regions": regions,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        if reports.is_empty() {
            formatter.success(&format!("No conflicting regions in {}", source_file));
            return Ok(());
        }

        let blocking = reports.iter().filter(|r| !r.conflict.can_auto_merge).count();
        formatter.success(&format!(
            "{} in {} ({} need attention)",
            plural(reports.len(), "region"),
            source_file,
            blocking
        ));
        formatter.info("");
        formatter.info("  Location                  Severity  Auto  Strategy             Tasks");
        formatter.info("  ------------------------- --------- ----- -------------------- -----");

        for report in &reports {
            let conflict = &report.conflict;
            let strategy = conflict
                .merge_strategy
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let tasks: Vec<&str> = conflict.tasks_involved.iter().map(|t| t.as_str()).collect();

            formatter.info(&format!(
                "  {:<25} {:<9} {:<5} {:<20} {}",
                truncate(&conflict.location, 25),
                conflict.severity.to_string(),
                if conflict.can_auto_merge { "yes" } else { "no" },
                strategy,
                tasks.join(", ")
            ));
            formatter.info(&format!("      {}", conflict.reason));
            if let Some(token) = policy.lookup(&conflict.key()) {
                formatter.info(&format!("      override: {}", token));
            }
            for suggestion in &report.suggestions {
                formatter.info(&format!("      - {}", suggestion));
            }
        }

        Ok(())
    }
}

fn report_json(report: &ConflictReport, policy: &OverridePolicy) -> Result<serde_json::Value> {
    let conflict =
        serde_json::to_value(&report.conflict).context("Failed to serialize conflict region")?;
    Ok(serde_json::json!({
        "conflict": conflict,
        "suggestions": report.suggestions,
        "override": policy.lookup(&report.conflict.key()),
    }))
}

/// One message per configured override rule that the policy drops
fn ignored_rules(config: &Config) -> Vec<String> {
    config
        .overrides
        .rules
        .iter()
        .enumerate()
        .filter_map(|(i, rule)| {
            validate_rule(rule)
                .err()
                .map(|e| format!("Override rule {} ('{}') will be ignored: {}", i, rule.pattern, e))
        })
        .collect()
}

/// Truncate to `max_len` characters, ending in "..." when shortened
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use taskmerge_core::config::ConfigBuilder;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("imports", 25), "imports");
    }

    #[test]
    fn test_truncate_long() {
        let result = truncate("function:processOrderWithDiscounts", 25);
        assert_eq!(result.chars().count(), 25);
        assert_eq!(result, "function:processOrderW...");
    }

    #[test]
    fn test_report_json_includes_override() {
        let raw = r#"{
            "task-1": {"file_path": "src/a.py", "changes": [
                {"location": "imports", "target": "imports", "change_type": "add_import", "line_start": 1, "line_end": 1}
            ]},
            "task-2": {"file_path": "src/a.py", "changes": [
                {"location": "imports", "target": "imports", "change_type": "remove_import", "line_start": 1, "line_end": 1}
            ]}
        }"#;
        let analyses = AnalyzeFileUseCase::parse_analyses(raw).unwrap();
        let reports = AnalyzeFileUseCase::new(Arc::new(ConflictDetector::default())).analyze(&analyses);
        assert_eq!(reports.len(), 1);

        let config = ConfigBuilder::new().override_rule("src/*.py:*", "skip").build();
        let policy = OverridePolicy::from_config(&config.overrides);
        let json = report_json(&reports[0], &policy).unwrap();
        assert_eq!(json["override"], "skip");
        assert_eq!(json["conflict"]["location"], "imports");

        let json = report_json(&reports[0], &OverridePolicy::default()).unwrap();
        assert!(json["override"].is_null());
    }

    #[test]
    fn test_ignored_rules_names_dropped_overrides() {
        let config = ConfigBuilder::new()
            .override_rule("src/*.py:imports", "combine_imports")
            .override_rule("src/*.py:*", "obliterate")
            .override_rule("[unclosed", "skip")
            .build();

        let messages = ignored_rules(&config);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Override rule 1 ('src/*.py:*') will be ignored"));
        assert!(messages[0].contains("obliterate"));
        assert!(messages[1].starts_with("Override rule 2 ('[unclosed') will be ignored"));

        let policy = OverridePolicy::from_config(&config.overrides);
        assert_eq!(policy.rules_count(), 1);

        assert!(ignored_rules(&Config::default()).is_empty());
    }

    #[tokio::test]
    async fn test_execute_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyses.json");
        std::fs::write(&path, r#"{"task-1": {"file_path": "a.py", "changes": []}}"#).unwrap();

        let cmd = AnalyzeCommand {
            file: path,
            conflicts_only: false,
        };
        assert!(cmd.execute(&Config::default(), OutputFormat::Json).await.is_ok());

        let missing = AnalyzeCommand {
            file: dir.path().join("missing.json"),
            conflicts_only: false,
        };
        assert!(missing.execute(&Config::default(), OutputFormat::Json).await.is_err());
    }
}
