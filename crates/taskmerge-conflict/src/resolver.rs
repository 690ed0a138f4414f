//! Conflict resolution orchestrator
//!
//! Walks a file's conflict regions in input order, threading a running
//! `merged_content` through every successful resolution. Each region is
//! tried against, in order:
//! - a user or config override (strategy, AI directive, or manual review)
//! - the region's own deterministic recipe via [`IAutoMerger`]
//! - AI-assisted resolution via [`IAiResolver`], for `Medium`/`High` severity
//!
//! Per-conflict failures never propagate; they leave the region unresolved.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use taskmerge_core::config::Config;
use taskmerge_core::domain::{
    ConflictRegion, ConflictSeverity, MergeDecision, MergeResult, MergeStrategy, TaskSnapshot,
};
use taskmerge_core::ports::{IAiResolver, IAutoMerger, MergeContext};

use crate::policy::{OverridePolicy, UserDirective};

/// Default upper bound for a single AI call
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of entries listed per explanation group
pub const DEFAULT_EXPLANATION_LIMIT: usize = 5;

/// Shortest AI timeout the resolver accepts
pub const MIN_AI_TIMEOUT: Duration = Duration::from_secs(1);

/// How a conflict region was actually resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A strategy named by a user or config override
    Override(MergeStrategy),
    /// The region's own suggested recipe
    AutoMerge(MergeStrategy),
    Ai,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Override(strategy) => write!(f, "{strategy} (override)"),
            Resolution::AutoMerge(strategy) => write!(f, "{strategy}"),
            Resolution::Ai => write!(f, "ai"),
        }
    }
}

/// AI usage accumulated across one file pass
#[derive(Debug, Default, Clone, Copy)]
struct PassUsage {
    ai_calls_made: u32,
    tokens_used: u64,
}

/// Resolves the conflicts of one file
pub struct ConflictResolver {
    auto_merger: Arc<dyn IAutoMerger>,
    ai_resolver: Option<Arc<dyn IAiResolver>>,
    enable_ai: bool,
    ai_timeout: Duration,
    overrides: OverridePolicy,
    cancel: CancellationToken,
    explanation_limit: usize,
}

impl ConflictResolver {
    pub fn new(auto_merger: Arc<dyn IAutoMerger>) -> Self {
        Self {
            auto_merger,
            ai_resolver: None,
            enable_ai: true,
            ai_timeout: DEFAULT_AI_TIMEOUT,
            overrides: OverridePolicy::default(),
            cancel: CancellationToken::new(),
            explanation_limit: DEFAULT_EXPLANATION_LIMIT,
        }
    }

    /// Builds a resolver from the `resolver` and `overrides` config sections
    pub fn from_config(auto_merger: Arc<dyn IAutoMerger>, config: &Config) -> Self {
        Self::new(auto_merger)
            .with_ai_enabled(config.resolver.enable_ai)
            .with_ai_timeout(Duration::from_secs(config.resolver.ai_timeout_secs))
            .with_explanation_limit(config.resolver.explanation_limit)
            .with_override_policy(OverridePolicy::from_config(&config.overrides))
    }

    pub fn with_ai_resolver(mut self, ai_resolver: Arc<dyn IAiResolver>) -> Self {
        self.ai_resolver = Some(ai_resolver);
        self
    }

    pub fn with_ai_enabled(mut self, enabled: bool) -> Self {
        self.enable_ai = enabled;
        self
    }

    /// Timeouts below [`MIN_AI_TIMEOUT`] are raised to it
    pub fn with_ai_timeout(mut self, timeout: Duration) -> Self {
        if timeout < MIN_AI_TIMEOUT {
            warn!(
                requested_ms = timeout.as_millis() as u64,
                minimum_secs = MIN_AI_TIMEOUT.as_secs(),
                "AI timeout too short, using minimum"
            );
        }
        self.ai_timeout = timeout.max(MIN_AI_TIMEOUT);
        self
    }

    /// Replaces the override policy, including any exact user entries
    pub fn with_override_policy(mut self, policy: OverridePolicy) -> Self {
        self.overrides = policy;
        self
    }

    /// Adds exact `"{file_path}:{location}" -> token` overrides
    pub fn with_user_strategies(mut self, strategies: HashMap<String, String>) -> Self {
        self.overrides = std::mem::take(&mut self.overrides).with_user_strategies(strategies);
        self
    }

    /// Token whose cancellation abandons any in-flight AI call
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_explanation_limit(mut self, limit: usize) -> Self {
        self.explanation_limit = limit.max(1);
        self
    }

    /// Resolve every conflict of `file_path`, in input order
    pub async fn resolve_conflicts(
        &self,
        file_path: &str,
        baseline_content: &str,
        task_snapshots: &[TaskSnapshot],
        conflicts: &[ConflictRegion],
    ) -> MergeResult {
        if conflicts.is_empty() {
            debug!(file = %file_path, "No conflicts to resolve");
            return MergeResult {
                decision: MergeDecision::AutoMerged,
                file_path: file_path.to_string(),
                merged_content: Some(baseline_content.to_string()),
                conflicts_resolved: Vec::new(),
                conflicts_remaining: Vec::new(),
                ai_calls_made: 0,
                tokens_used: 0,
                explanation: build_explanation_with_limit(&[], &[], self.explanation_limit),
            };
        }

        let mut merged_content = baseline_content.to_string();
        let mut resolved: Vec<(ConflictRegion, Resolution)> = Vec::new();
        let mut remaining: Vec<ConflictRegion> = Vec::new();
        let mut usage = PassUsage::default();

        for conflict in conflicts {
            match self
                .resolve_one(file_path, &merged_content, task_snapshots, conflict, &mut usage)
                .await
            {
                Some((content, method)) => {
                    merged_content = content;
                    resolved.push((conflict.clone(), method));
                }
                None => remaining.push(conflict.clone()),
            }
        }

        let decision = if remaining.is_empty() {
            if usage.ai_calls_made > 0 {
                MergeDecision::AiMerged
            } else {
                MergeDecision::AutoMerged
            }
        } else if resolved.is_empty() {
            MergeDecision::Failed
        } else {
            MergeDecision::NeedsHumanReview
        };

        let merged_content = match decision {
            MergeDecision::Failed => None,
            _ => Some(merged_content),
        };

        info!(
            file = %file_path,
            decision = %decision,
            resolved = resolved.len(),
            remaining = remaining.len(),
            ai_calls = usage.ai_calls_made,
            tokens = usage.tokens_used,
            "Merge pass complete"
        );

        let explanation = build_explanation_with_limit(&resolved, &remaining, self.explanation_limit);

        MergeResult {
            decision,
            file_path: file_path.to_string(),
            merged_content,
            conflicts_resolved: resolved.into_iter().map(|(conflict, _)| conflict).collect(),
            conflicts_remaining: remaining,
            ai_calls_made: usage.ai_calls_made,
            tokens_used: usage.tokens_used,
            explanation,
        }
    }

    /// Try one conflict against the resolution ladder
    ///
    /// Returns the new merged content and the method that produced it.
    async fn resolve_one(
        &self,
        file_path: &str,
        merged_content: &str,
        task_snapshots: &[TaskSnapshot],
        conflict: &ConflictRegion,
        usage: &mut PassUsage,
    ) -> Option<(String, Resolution)> {
        let context = MergeContext {
            file_path,
            baseline_content: merged_content,
            task_snapshots,
            conflict,
        };

        let mut tried_strategy: Option<MergeStrategy> = None;
        let mut ai_attempted = false;

        if let Some(token) = self.overrides.lookup(&conflict.key()) {
            match UserDirective::parse(token) {
                Some(UserDirective::ManualReview) => {
                    debug!(
                        file = %file_path,
                        location = %conflict.location,
                        token = %token,
                        "Override requests manual review"
                    );
                    return None;
                }
                Some(UserDirective::Strategy(strategy)) => {
                    tried_strategy = Some(strategy);
                    if let Some(content) = self.try_auto_merge(&context, strategy) {
                        return Some((content, Resolution::Override(strategy)));
                    }
                }
                Some(UserDirective::UseAi) => {
                    if self.ai_resolver.is_some() {
                        ai_attempted = true;
                        if let Some(content) = self.try_ai(&context, usage).await {
                            return Some((content, Resolution::Ai));
                        }
                    } else {
                        warn!(
                            file = %file_path,
                            location = %conflict.location,
                            "AI override requested but no AI resolver is configured"
                        );
                    }
                }
                None => {
                    warn!(
                        file = %file_path,
                        location = %conflict.location,
                        token = %token,
                        "Ignoring unrecognized strategy override"
                    );
                }
            }
        }

        if conflict.can_auto_merge {
            if let Some(strategy) = conflict.merge_strategy {
                if tried_strategy != Some(strategy) {
                    if let Some(content) = self.try_auto_merge(&context, strategy) {
                        return Some((content, Resolution::AutoMerge(strategy)));
                    }
                }
            }
        }

        if !ai_attempted && self.ai_eligible(conflict) {
            if let Some(content) = self.try_ai(&context, usage).await {
                return Some((content, Resolution::Ai));
            }
        }

        debug!(
            file = %file_path,
            location = %conflict.location,
            severity = %conflict.severity,
            "Conflict left unresolved"
        );
        None
    }

    /// AI is offered only for `Medium` and `High`
    fn ai_eligible(&self, conflict: &ConflictRegion) -> bool {
        self.enable_ai
            && self.ai_resolver.is_some()
            && matches!(
                conflict.severity,
                ConflictSeverity::Medium | ConflictSeverity::High
            )
    }

    fn try_auto_merge(&self, context: &MergeContext<'_>, strategy: MergeStrategy) -> Option<String> {
        let outcome = self.auto_merger.merge(context, strategy);
        match (outcome.success, outcome.merged_content) {
            (true, Some(content)) => {
                debug!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    strategy = %strategy,
                    "Auto-merged conflict"
                );
                Some(content)
            }
            _ => {
                debug!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    strategy = %strategy,
                    error = outcome.error.as_deref().unwrap_or("no content produced"),
                    "Auto-merge failed"
                );
                None
            }
        }
    }

    async fn try_ai(&self, context: &MergeContext<'_>, usage: &mut PassUsage) -> Option<String> {
        let ai_resolver = self.ai_resolver.as_ref()?;
        let call = ai_resolver.resolve_conflict(
            context.conflict,
            context.baseline_content,
            context.task_snapshots,
        );

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    "AI resolution cancelled"
                );
                return None;
            }
            result = tokio::time::timeout(self.ai_timeout, call) => result,
        };

        let resolution = match outcome {
            Err(_) => {
                warn!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    timeout_secs = self.ai_timeout.as_secs(),
                    "AI resolution timed out"
                );
                return None;
            }
            Ok(Err(e)) => {
                warn!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    error = %e,
                    "AI resolution failed"
                );
                return None;
            }
            Ok(Ok(resolution)) => resolution,
        };

        usage.ai_calls_made = usage.ai_calls_made.saturating_add(resolution.ai_calls_made);
        usage.tokens_used = usage.tokens_used.saturating_add(resolution.tokens_used);

        match (resolution.success, resolution.merged_content) {
            (true, Some(content)) => {
                debug!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    ai_calls = resolution.ai_calls_made,
                    tokens = resolution.tokens_used,
                    "AI merged conflict"
                );
                Some(content)
            }
            _ => {
                debug!(
                    file = %context.file_path,
                    location = %context.conflict.location,
                    "AI could not merge conflict"
                );
                None
            }
        }
    }
}

/// Summarize a pass, listing at most five regions per group
pub fn build_explanation(
    resolved: &[(ConflictRegion, Resolution)],
    remaining: &[ConflictRegion],
) -> String {
    build_explanation_with_limit(resolved, remaining, DEFAULT_EXPLANATION_LIMIT)
}

/// Summarize a pass, listing at most `limit` regions per group
pub fn build_explanation_with_limit(
    resolved: &[(ConflictRegion, Resolution)],
    remaining: &[ConflictRegion],
    limit: usize,
) -> String {
    if resolved.is_empty() && remaining.is_empty() {
        return "No conflicts to resolve".to_string();
    }

    let mut lines = Vec::new();

    if !resolved.is_empty() {
        lines.push(format!("Resolved {} conflict(s):", resolved.len()));
        push_group(&mut lines, resolved, limit, |(c, method)| {
            format!("  - {} via {} ({})", c.location, method, tasks_label(c))
        });
    }

    if !remaining.is_empty() {
        lines.push(format!(
            "Needs review: {} conflict(s):",
            remaining.len()
        ));
        push_group(&mut lines, remaining, limit, |c| {
            format!(
                "  - {} [{}] {} ({})",
                c.location,
                c.severity,
                c.reason,
                tasks_label(c)
            )
        });
    }

    lines.join("\n")
}

fn push_group<T, F>(lines: &mut Vec<String>, group: &[T], limit: usize, render: F)
where
    F: Fn(&T) -> String,
{
    lines.extend(group.iter().take(limit).map(render));
    if group.len() > limit {
        lines.push(format!("  ...and {} more", group.len() - limit));
    }
}

fn tasks_label(conflict: &ConflictRegion) -> String {
    conflict
        .tasks_involved
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use taskmerge_core::domain::TaskId;
    use taskmerge_core::ports::{AiResolution, AutoMergeOutcome};

    const FILE: &str = "src/app.py";

    /// Appends `+{location}` on success; records every call
    #[derive(Default)]
    struct AppendingMerger {
        fail: bool,
        calls: Mutex<Vec<(String, MergeStrategy)>>,
    }

    impl AppendingMerger {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, MergeStrategy)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl IAutoMerger for AppendingMerger {
        fn merge(&self, context: &MergeContext<'_>, strategy: MergeStrategy) -> AutoMergeOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((context.conflict.location.clone(), strategy));
            if self.fail {
                AutoMergeOutcome::failed("recipe does not apply")
            } else {
                AutoMergeOutcome::merged(format!(
                    "{}+{}",
                    context.baseline_content, context.conflict.location
                ))
            }
        }
    }

    #[derive(Clone, Copy)]
    enum AiBehavior {
        Merge,
        Decline,
        Error,
        EmptySuccess,
        Slow,
    }

    struct ScriptedAi {
        behavior: AiBehavior,
        calls: Mutex<u32>,
    }

    impl ScriptedAi {
        fn new(behavior: AiBehavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl IAiResolver for ScriptedAi {
        async fn resolve_conflict(
            &self,
            conflict: &ConflictRegion,
            baseline_code: &str,
            _task_snapshots: &[TaskSnapshot],
        ) -> anyhow::Result<AiResolution> {
            *self.calls.lock().unwrap() += 1;
            match self.behavior {
                AiBehavior::Merge => Ok(AiResolution {
                    success: true,
                    merged_content: Some(format!("{baseline_code}+ai:{}", conflict.location)),
                    ai_calls_made: 1,
                    tokens_used: 250,
                }),
                AiBehavior::Decline => Ok(AiResolution {
                    success: false,
                    merged_content: None,
                    ai_calls_made: 2,
                    tokens_used: 100,
                }),
                AiBehavior::Error => Err(anyhow::anyhow!("model unavailable")),
                AiBehavior::EmptySuccess => Ok(AiResolution {
                    success: true,
                    merged_content: None,
                    ai_calls_made: 1,
                    tokens_used: 10,
                }),
                AiBehavior::Slow => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(AiResolution {
                        success: true,
                        merged_content: Some(baseline_code.to_string()),
                        ai_calls_made: 1,
                        tokens_used: 1,
                    })
                }
            }
        }
    }

    fn region(location: &str, severity: ConflictSeverity, strategy: Option<MergeStrategy>) -> ConflictRegion {
        ConflictRegion {
            file_path: FILE.to_string(),
            location: location.to_string(),
            tasks_involved: vec![TaskId::new("task-1").unwrap(), TaskId::new("task-2").unwrap()],
            change_types: vec![],
            severity,
            can_auto_merge: strategy.is_some(),
            merge_strategy: strategy,
            reason: "test conflict".to_string(),
        }
    }

    fn compatible(location: &str) -> ConflictRegion {
        region(location, ConflictSeverity::None, Some(MergeStrategy::CombineImports))
    }

    fn incompatible(location: &str, severity: ConflictSeverity) -> ConflictRegion {
        region(location, severity, None)
    }

    fn resolver(merger: &Arc<AppendingMerger>) -> ConflictResolver {
        ConflictResolver::new(merger.clone())
    }

    #[tokio::test]
    async fn test_empty_conflicts_return_baseline() {
        let merger = Arc::new(AppendingMerger::default());
        let result = resolver(&merger).resolve_conflicts(FILE, "base", &[], &[]).await;

        assert_eq!(result.decision, MergeDecision::AutoMerged);
        assert_eq!(result.merged_content.as_deref(), Some("base"));
        assert_eq!(result.ai_calls_made, 0);
        assert!(merger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_merged_content_threads_through_conflicts() {
        let merger = Arc::new(AppendingMerger::default());
        let conflicts = [compatible("imports"), compatible("function:render")];

        let result = resolver(&merger)
            .resolve_conflicts(FILE, "base", &[], &conflicts)
            .await;

        assert_eq!(result.decision, MergeDecision::AutoMerged);
        assert_eq!(result.merged_content.as_deref(), Some("base+imports+function:render"));
        assert_eq!(result.conflicts_resolved.len(), 2);
    }

    #[tokio::test]
    async fn test_auto_merge_success_skips_ai() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let mut conflict = compatible("imports");
        conflict.severity = ConflictSeverity::Medium;

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .resolve_conflicts(FILE, "base", &[], &[conflict])
            .await;

        assert_eq!(result.decision, MergeDecision::AutoMerged);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_ai_merges_medium_and_high() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let conflicts = [
            incompatible("function:a", ConflictSeverity::Medium),
            incompatible("function:b", ConflictSeverity::High),
        ];

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .resolve_conflicts(FILE, "base", &[], &conflicts)
            .await;

        assert_eq!(result.decision, MergeDecision::AiMerged);
        assert_eq!(result.merged_content.as_deref(), Some("base+ai:function:a+ai:function:b"));
        assert_eq!(result.ai_calls_made, 2);
        assert_eq!(result.tokens_used, 500);
        assert!(merger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_critical_and_low_never_reach_ai() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let conflicts = [
            incompatible("function:a", ConflictSeverity::Critical),
            incompatible("function:b", ConflictSeverity::Low),
        ];

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .resolve_conflicts(FILE, "base", &[], &conflicts)
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert!(result.merged_content.is_none());
        assert_eq!(ai.calls(), 0);
        assert_eq!(result.conflicts_remaining.len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_ai_is_not_called() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .with_ai_enabled(false)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Medium)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_partial_resolution_needs_review() {
        let merger = Arc::new(AppendingMerger::default());
        let conflicts = [
            compatible("imports"),
            incompatible("function:processOrder", ConflictSeverity::Critical),
        ];

        let result = resolver(&merger)
            .resolve_conflicts(FILE, "base", &[], &conflicts)
            .await;

        assert_eq!(result.decision, MergeDecision::NeedsHumanReview);
        assert_eq!(result.merged_content.as_deref(), Some("base+imports"));
        assert!(result.explanation.contains("function:processOrder"));
        assert!(result.explanation.contains("Needs review: 1 conflict(s):"));
    }

    #[tokio::test]
    async fn test_declined_ai_usage_still_counted() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Decline));

        let result = resolver(&merger)
            .with_ai_resolver(ai)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::High)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert_eq!(result.ai_calls_made, 2);
        assert_eq!(result.tokens_used, 100);
    }

    #[tokio::test]
    async fn test_ai_error_leaves_conflict_unresolved() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Error));

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[
                    compatible("imports"),
                    incompatible("function:a", ConflictSeverity::Medium),
                ],
            )
            .await;

        assert_eq!(ai.calls(), 1);
        assert_eq!(result.decision, MergeDecision::NeedsHumanReview);
        assert_eq!(result.ai_calls_made, 0);
    }

    #[tokio::test]
    async fn test_success_without_content_is_failure() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::EmptySuccess));

        let result = resolver(&merger)
            .with_ai_resolver(ai)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Medium)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert_eq!(result.ai_calls_made, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_timeout_leaves_conflict_unresolved() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Slow));

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .with_ai_timeout(Duration::from_secs(5))
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::High)],
            )
            .await;

        assert_eq!(ai.calls(), 1);
        assert_eq!(result.decision, MergeDecision::Failed);
        assert_eq!(result.ai_calls_made, 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_pending_ai() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Slow));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolver(&merger)
            .with_ai_resolver(ai)
            .with_cancellation(cancel)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Medium)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
    }

    #[tokio::test]
    async fn test_manual_override_bypasses_everything() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:imports"), "manual_review".to_string());

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .with_user_strategies(user)
            .resolve_conflicts(FILE, "base", &[], &[compatible("imports")])
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert!(merger.calls().is_empty());
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_strategy_override_replaces_suggested_recipe() {
        let merger = Arc::new(AppendingMerger::default());
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:function:a"), "append_statements".to_string());

        let result = resolver(&merger)
            .with_user_strategies(user)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Critical)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::AutoMerged);
        assert_eq!(
            merger.calls(),
            vec![("function:a".to_string(), MergeStrategy::AppendStatements)]
        );
        assert!(result
            .explanation
            .contains("  - function:a via append_statements (override) (task-1, task-2)"));
    }

    #[tokio::test]
    async fn test_explanation_names_override_recipe_not_suggested_one() {
        let merger = Arc::new(AppendingMerger::default());
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:imports"), "append_statements".to_string());

        let result = resolver(&merger)
            .with_user_strategies(user)
            .resolve_conflicts(FILE, "base", &[], &[compatible("imports")])
            .await;

        assert_eq!(
            merger.calls(),
            vec![("imports".to_string(), MergeStrategy::AppendStatements)]
        );
        assert_eq!(
            result.explanation.lines().nth(1),
            Some("  - imports via append_statements (override) (task-1, task-2)")
        );
        assert!(!result.explanation.contains("combine_imports"));
    }

    #[tokio::test]
    async fn test_explanation_reports_each_resolution_method() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let conflicts = [
            compatible("imports"),
            incompatible("function:a", ConflictSeverity::Medium),
        ];

        let result = resolver(&merger)
            .with_ai_resolver(ai)
            .resolve_conflicts(FILE, "base", &[], &conflicts)
            .await;

        let lines: Vec<&str> = result.explanation.lines().collect();
        assert_eq!(result.decision, MergeDecision::AiMerged);
        assert_eq!(lines[0], "Resolved 2 conflict(s):");
        assert_eq!(lines[1], "  - imports via combine_imports (task-1, task-2)");
        assert_eq!(lines[2], "  - function:a via ai (task-1, task-2)");
        assert!(!result.explanation.contains("assisted"));
    }

    #[tokio::test]
    async fn test_failed_override_falls_through_without_retrying_same_recipe() {
        let merger = Arc::new(AppendingMerger::failing());
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:imports"), "combine_imports".to_string());

        let result = resolver(&merger)
            .with_user_strategies(user)
            .resolve_conflicts(FILE, "base", &[], &[compatible("imports")])
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert_eq!(merger.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_ai_override_bypasses_severity_gate() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:function:a"), "use_ai".to_string());

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .with_ai_enabled(false)
            .with_user_strategies(user)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Critical)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::AiMerged);
        assert_eq!(ai.calls(), 1);
        assert!(result.explanation.contains("function:a via ai"));
    }

    #[tokio::test]
    async fn test_failed_ai_override_not_retried() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Decline));
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:function:a"), "ai_merge".to_string());

        let result = resolver(&merger)
            .with_ai_resolver(ai.clone())
            .with_user_strategies(user)
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Medium)],
            )
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert_eq!(ai.calls(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_override_falls_through() {
        let merger = Arc::new(AppendingMerger::default());
        let mut user = HashMap::new();
        user.insert(format!("{FILE}:imports"), "obliterate".to_string());

        let result = resolver(&merger)
            .with_user_strategies(user)
            .resolve_conflicts(FILE, "base", &[], &[compatible("imports")])
            .await;

        assert_eq!(result.decision, MergeDecision::AutoMerged);
        assert_eq!(
            merger.calls(),
            vec![("imports".to_string(), MergeStrategy::CombineImports)]
        );
    }

    #[tokio::test]
    async fn test_config_rules_apply() {
        let merger = Arc::new(AppendingMerger::default());
        let config = taskmerge_core::config::ConfigBuilder::new()
            .override_rule("src/*.py:imports", "skip")
            .build();

        let result = ConflictResolver::from_config(merger.clone(), &config)
            .resolve_conflicts(FILE, "base", &[], &[compatible("imports")])
            .await;

        assert_eq!(result.decision, MergeDecision::Failed);
        assert!(merger.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_is_raised_to_minimum() {
        let merger = Arc::new(AppendingMerger::default());
        let ai = Arc::new(ScriptedAi::new(AiBehavior::Merge));
        let config = taskmerge_core::config::ConfigBuilder::new()
            .resolver_ai_timeout_secs(0)
            .build();

        let resolver = ConflictResolver::from_config(merger, &config).with_ai_resolver(ai.clone());
        assert_eq!(resolver.ai_timeout, MIN_AI_TIMEOUT);

        let result = resolver
            .resolve_conflicts(
                FILE,
                "base",
                &[],
                &[incompatible("function:a", ConflictSeverity::Medium)],
            )
            .await;

        assert_eq!(ai.calls(), 1);
        assert_eq!(result.decision, MergeDecision::AiMerged);
    }

    #[test]
    fn test_explanation_caps_each_group() {
        let remaining: Vec<ConflictRegion> = (0..7)
            .map(|i| incompatible(&format!("function:f{i}"), ConflictSeverity::Critical))
            .collect();
        let resolved = vec![(
            compatible("imports"),
            Resolution::AutoMerge(MergeStrategy::CombineImports),
        )];

        let text = build_explanation(&resolved, &remaining);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Resolved 1 conflict(s):");
        assert_eq!(lines[1], "  - imports via combine_imports (task-1, task-2)");
        assert_eq!(lines[2], "Needs review: 7 conflict(s):");
        assert_eq!(lines[3], "  - function:f0 [critical] test conflict (task-1, task-2)");
        assert_eq!(lines.len(), 2 + 1 + 5 + 1);
        assert_eq!(lines.last(), Some(&"  ...and 2 more"));
    }

    #[test]
    fn test_explanation_is_deterministic() {
        let remaining = vec![incompatible("function:a", ConflictSeverity::High)];
        assert_eq!(
            build_explanation(&[], &remaining),
            build_explanation(&[], &remaining)
        );
        assert_eq!(build_explanation(&[], &[]), "No conflicts to resolve");
        assert_eq!(
            build_explanation_with_limit(&[], &remaining, 1).lines().count(),
            2
        );
    }
}
