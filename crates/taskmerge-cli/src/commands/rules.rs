//! Rules command - Print the change-kind compatibility table

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use taskmerge_conflict::{CompatibilityRule, CompatibilityRuleIndex};
use taskmerge_core::domain::ChangeType;

use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct RulesCommand {
    /// Only show pairs that cannot be merged automatically
    #[arg(long)]
    pub incompatible: bool,

    /// Only show pairs involving this change kind (e.g. add_import)
    #[arg(long)]
    pub kind: Option<String>,
}

impl RulesCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let kind = self
            .kind
            .as_deref()
            .map(str::parse::<ChangeType>)
            .transpose()
            .context("Unknown change kind")?;

        let index = CompatibilityRuleIndex::new();
        let rules = select_rules(&index, kind, self.incompatible);

        info!(count = rules.len(), "Listing compatibility rules");

        if format.is_json() {
            let json = serde_json::json!({
                "count": rules.len(),
                "rules": serde_json::to_value(&rules).context("Failed to serialize rules")?,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        if rules.is_empty() {
            formatter.success("No matching rules");
            return Ok(());
        }

        formatter.success(&plural(rules.len(), "rule"));
        formatter.info("");
        formatter.info("  Pair                                   Compatible  Strategy");
        formatter.info("  -------------------------------------- ----------- --------------------");
        for rule in &rules {
            let (a, b) = rule.change_type_pair;
            formatter.info(&format!(
                "  {:<38} {:<11} {}",
                format!("{a} + {b}"),
                if rule.compatible { "yes" } else { "no" },
                rule.strategy.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
            ));
            formatter.info(&format!("      {}", rule.reason));
        }

        Ok(())
    }
}

fn select_rules<'a>(
    index: &'a CompatibilityRuleIndex,
    kind: Option<ChangeType>,
    incompatible_only: bool,
) -> Vec<&'a CompatibilityRule> {
    index
        .iter()
        .filter(|r| !incompatible_only || !r.compatible)
        .filter(|r| {
            kind.map_or(true, |k| r.change_type_pair.0 == k || r.change_type_pair.1 == k)
        })
        .collect()
}
