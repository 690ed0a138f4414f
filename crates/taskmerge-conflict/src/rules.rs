//! Compatibility rules between change kinds
//!
//! The index is built once from a declarative table and never mutated.
//! Keys are normalized so `(a, b)` and `(b, a)` hit the same entry; a pair
//! with no entry is incompatible and needs AI assistance.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use taskmerge_core::domain::{ChangeType, MergeStrategy};

use ChangeType as C;
use MergeStrategy as S;

/// Precomputed verdict for a pair of change kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityRule {
    /// Normalized pair (smaller kind first)
    pub change_type_pair: (ChangeType, ChangeType),
    pub compatible: bool,
    pub strategy: Option<MergeStrategy>,
    pub reason: String,
}

impl CompatibilityRule {
    /// Conservative verdict for a pair the table does not know about
    pub fn missing(a: ChangeType, b: ChangeType) -> Self {
        let (first, second) = normalize(a, b);
        Self {
            change_type_pair: (first, second),
            compatible: false,
            strategy: Some(MergeStrategy::AiRequired),
            reason: format!("No rule for {first}+{second}"),
        }
    }
}

type RuleRow = (ChangeType, ChangeType, bool, Option<MergeStrategy>, &'static str);

const RULES: &[RuleRow] = &[
    // Imports
    (C::AddImport, C::AddImport, true, Some(S::CombineImports), "Adding different imports is compatible"),
    (C::AddImport, C::RemoveImport, false, Some(S::AiRequired), "Import added and removed by different tasks"),
    (C::RemoveImport, C::RemoveImport, true, Some(S::CombineImports), "Removing the same import twice is idempotent"),
    (C::AddImport, C::ModifyImport, true, Some(S::CombineImports), "Import additions combine with import edits"),
    (C::ModifyImport, C::ModifyImport, false, Some(S::AiRequired), "Concurrent edits to the same import statement"),
    // Functions
    (C::AddFunction, C::AddFunction, true, Some(S::AppendFunctions), "New functions can be appended"),
    (C::AddFunction, C::ModifyFunction, true, Some(S::AppendFunctions), "Adding a function does not affect modifications to another"),
    (C::ModifyFunction, C::ModifyFunction, false, Some(S::AiRequired), "Multiple modifications to the same function body"),
    (C::ModifyFunction, C::RemoveFunction, false, Some(S::HumanRequired), "Function modified by one task and removed by another"),
    (C::ModifyFunction, C::RenameFunction, false, Some(S::AiRequired), "Function modified and renamed concurrently"),
    (C::RenameFunction, C::RenameFunction, false, Some(S::HumanRequired), "Function renamed differently by multiple tasks"),
    (C::RemoveFunction, C::RemoveFunction, true, Some(S::OrderByTime), "Removing the same function twice is idempotent"),
    // Hooks
    (C::AddHookCall, C::AddHookCall, true, Some(S::OrderByDependency), "Hook calls can be ordered by dependency"),
    (C::AddHookCall, C::ModifyFunction, true, Some(S::HooksFirst), "Hooks are inserted at the start of the function body"),
    (C::AddHookCall, C::WrapJsx, true, Some(S::HooksThenWrap), "Hooks go first, then the returned markup is wrapped"),
    (C::AddHookCall, C::AddJsxElement, true, Some(S::HooksFirst), "Hooks go first, markup additions follow"),
    (C::AddHookCall, C::RemoveHookCall, false, Some(S::AiRequired), "Hook added and removed by different tasks"),
    // JSX / markup
    (C::WrapJsx, C::WrapJsx, true, Some(S::OrderByDependency), "Multiple wraps can be nested in dependency order"),
    (C::WrapJsx, C::AddJsxElement, true, Some(S::AppendStatements), "New elements go inside the wrapped tree"),
    (C::WrapJsx, C::ModifyJsxProps, true, Some(S::OrderByDependency), "Prop edits survive an outer wrap"),
    (C::WrapJsx, C::UnwrapJsx, false, Some(S::AiRequired), "Markup wrapped by one task and unwrapped by another"),
    (C::AddJsxElement, C::AddJsxElement, true, Some(S::AppendStatements), "Sibling elements can be appended"),
    (C::ModifyJsxProps, C::ModifyJsxProps, true, Some(S::CombineProps), "Props from both tasks can be combined"),
    // Variables and constants
    (C::AddVariable, C::AddVariable, true, Some(S::AppendStatements), "Variable declarations can be appended"),
    (C::AddConstant, C::AddVariable, true, Some(S::AppendStatements), "Constant and variable declarations can be appended"),
    (C::AddConstant, C::AddConstant, true, Some(S::AppendStatements), "Constant declarations can be appended"),
    (C::ModifyVariable, C::ModifyVariable, false, Some(S::AiRequired), "Concurrent edits to the same variable"),
    // Classes and methods
    (C::AddClass, C::AddClass, true, Some(S::AppendFunctions), "New classes can be appended"),
    (C::ModifyClass, C::ModifyClass, false, Some(S::AiRequired), "Multiple modifications to the same class"),
    (C::ModifyClass, C::RemoveClass, false, Some(S::HumanRequired), "Class modified by one task and removed by another"),
    (C::AddMethod, C::AddMethod, true, Some(S::AppendMethods), "New methods can be appended to the class"),
    (C::AddMethod, C::ModifyMethod, true, Some(S::AppendMethods), "Adding a method does not affect edits to another"),
    (C::AddMethod, C::ModifyClass, true, Some(S::AppendMethods), "Method additions combine with class edits"),
    (C::ModifyMethod, C::ModifyMethod, false, Some(S::AiRequired), "Multiple modifications to the same method body"),
    (C::ModifyMethod, C::RemoveMethod, false, Some(S::HumanRequired), "Method modified by one task and removed by another"),
    (C::AddProperty, C::AddProperty, true, Some(S::AppendStatements), "Class properties can be appended"),
    (C::AddMethod, C::AddProperty, true, Some(S::AppendMethods), "Properties and methods can be appended"),
    // Types and interfaces
    (C::AddType, C::AddType, true, Some(S::AppendFunctions), "Type declarations can be appended"),
    (C::AddInterface, C::AddInterface, true, Some(S::AppendFunctions), "Interface declarations can be appended"),
    (C::ModifyType, C::ModifyType, false, Some(S::AiRequired), "Concurrent edits to the same type"),
    (C::ModifyInterface, C::ModifyInterface, false, Some(S::AiRequired), "Concurrent edits to the same interface"),
    // Decorators
    (C::AddDecorator, C::AddDecorator, true, Some(S::OrderByDependency), "Decorators can be stacked in dependency order"),
    (C::AddDecorator, C::ModifyFunction, true, Some(S::OrderByDependency), "Decorators do not touch the function body"),
    (C::AddDecorator, C::RemoveDecorator, false, Some(S::AiRequired), "Decorator added and removed by different tasks"),
    // Comments and formatting
    (C::AddComment, C::AddComment, true, Some(S::AppendStatements), "Comments can be appended"),
    (C::AddComment, C::ModifyFunction, true, Some(S::OrderByTime), "Comments do not change behaviour"),
    (C::ModifyComment, C::ModifyComment, false, Some(S::AiRequired), "Concurrent rewording of the same comment"),
    (C::FormattingOnly, C::FormattingOnly, true, Some(S::OrderByTime), "Formatting changes are interchangeable"),
    (C::FormattingOnly, C::ModifyFunction, true, Some(S::OrderByTime), "Formatting does not change behaviour"),
    (C::FormattingOnly, C::AddFunction, true, Some(S::OrderByTime), "Formatting does not change behaviour"),
    (C::FormattingOnly, C::AddImport, true, Some(S::OrderByTime), "Formatting does not change behaviour"),
];

fn normalize(a: ChangeType, b: ChangeType) -> (ChangeType, ChangeType) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Read-only lookup from a pair of change kinds to a compatibility verdict
#[derive(Debug, Clone)]
pub struct CompatibilityRuleIndex {
    rules: BTreeMap<(ChangeType, ChangeType), CompatibilityRule>,
}

impl CompatibilityRuleIndex {
    /// Builds the index from the built-in rule table
    pub fn new() -> Self {
        Self::from_rows(RULES)
    }

    fn from_rows(rows: &[RuleRow]) -> Self {
        let rules: BTreeMap<_, _> = rows
            .iter()
            .map(|&(a, b, compatible, strategy, reason)| {
                let pair = normalize(a, b);
                (
                    pair,
                    CompatibilityRule {
                        change_type_pair: pair,
                        compatible,
                        strategy,
                        reason: reason.to_string(),
                    },
                )
            })
            .collect();

        debug!(rules_count = rules.len(), "CompatibilityRuleIndex initialized");

        Self { rules }
    }

    /// Looks up the rule for a pair, in either order
    pub fn get(&self, a: ChangeType, b: ChangeType) -> Option<&CompatibilityRule> {
        self.rules.get(&normalize(a, b))
    }

    /// Rule for a pair, or the conservative default when none exists
    pub fn verdict(&self, a: ChangeType, b: ChangeType) -> CompatibilityRule {
        self.get(a, b)
            .cloned()
            .unwrap_or_else(|| CompatibilityRule::missing(a, b))
    }

    /// All rules in key order
    pub fn iter(&self) -> impl Iterator<Item = &CompatibilityRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for CompatibilityRuleIndex {
    fn default() -> Self {
        Self::new()
    }
}
