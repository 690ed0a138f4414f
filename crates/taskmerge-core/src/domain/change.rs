//! Semantic change records
//!
//! These types describe what the upstream semantic-diff extractor found in
//! one task's edit of one file. Detection works purely on these records;
//! raw diffs never reach the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Kind of semantic edit made to a code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChangeType {
    // Imports
    AddImport,
    RemoveImport,
    ModifyImport,

    // Functions
    AddFunction,
    RemoveFunction,
    ModifyFunction,
    RenameFunction,

    // Hooks (React and similar)
    AddHookCall,
    RemoveHookCall,

    // JSX / structural markup
    WrapJsx,
    UnwrapJsx,
    AddJsxElement,
    ModifyJsxProps,

    // Variables and constants
    AddVariable,
    ModifyVariable,
    AddConstant,

    // Classes
    AddClass,
    ModifyClass,
    RemoveClass,

    // Methods
    AddMethod,
    ModifyMethod,
    RemoveMethod,

    // Properties
    AddProperty,

    // Types and interfaces
    AddType,
    ModifyType,
    AddInterface,
    ModifyInterface,

    // Decorators
    AddDecorator,
    RemoveDecorator,

    // Comments and formatting
    AddComment,
    ModifyComment,
    FormattingOnly,

    /// Extractor could not classify the edit
    Unknown,
}

impl ChangeType {
    /// Every change kind, in declaration order
    pub const ALL: &'static [ChangeType] = &[
        ChangeType::AddImport,
        ChangeType::RemoveImport,
        ChangeType::ModifyImport,
        ChangeType::AddFunction,
        ChangeType::RemoveFunction,
        ChangeType::ModifyFunction,
        ChangeType::RenameFunction,
        ChangeType::AddHookCall,
        ChangeType::RemoveHookCall,
        ChangeType::WrapJsx,
        ChangeType::UnwrapJsx,
        ChangeType::AddJsxElement,
        ChangeType::ModifyJsxProps,
        ChangeType::AddVariable,
        ChangeType::ModifyVariable,
        ChangeType::AddConstant,
        ChangeType::AddClass,
        ChangeType::ModifyClass,
        ChangeType::RemoveClass,
        ChangeType::AddMethod,
        ChangeType::ModifyMethod,
        ChangeType::RemoveMethod,
        ChangeType::AddProperty,
        ChangeType::AddType,
        ChangeType::ModifyType,
        ChangeType::AddInterface,
        ChangeType::ModifyInterface,
        ChangeType::AddDecorator,
        ChangeType::RemoveDecorator,
        ChangeType::AddComment,
        ChangeType::ModifyComment,
        ChangeType::FormattingOnly,
        ChangeType::Unknown,
    ];

    /// Snake-case token used in config files, JSON and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::AddImport => "add_import",
            ChangeType::RemoveImport => "remove_import",
            ChangeType::ModifyImport => "modify_import",
            ChangeType::AddFunction => "add_function",
            ChangeType::RemoveFunction => "remove_function",
            ChangeType::ModifyFunction => "modify_function",
            ChangeType::RenameFunction => "rename_function",
            ChangeType::AddHookCall => "add_hook_call",
            ChangeType::RemoveHookCall => "remove_hook_call",
            ChangeType::WrapJsx => "wrap_jsx",
            ChangeType::UnwrapJsx => "unwrap_jsx",
            ChangeType::AddJsxElement => "add_jsx_element",
            ChangeType::ModifyJsxProps => "modify_jsx_props",
            ChangeType::AddVariable => "add_variable",
            ChangeType::ModifyVariable => "modify_variable",
            ChangeType::AddConstant => "add_constant",
            ChangeType::AddClass => "add_class",
            ChangeType::ModifyClass => "modify_class",
            ChangeType::RemoveClass => "remove_class",
            ChangeType::AddMethod => "add_method",
            ChangeType::ModifyMethod => "modify_method",
            ChangeType::RemoveMethod => "remove_method",
            ChangeType::AddProperty => "add_property",
            ChangeType::AddType => "add_type",
            ChangeType::ModifyType => "modify_type",
            ChangeType::AddInterface => "add_interface",
            ChangeType::ModifyInterface => "modify_interface",
            ChangeType::AddDecorator => "add_decorator",
            ChangeType::RemoveDecorator => "remove_decorator",
            ChangeType::AddComment => "add_comment",
            ChangeType::ModifyComment => "modify_comment",
            ChangeType::FormattingOnly => "formatting_only",
            ChangeType::Unknown => "unknown",
        }
    }

    /// Body edits of a function, method or class
    ///
    /// Two of these on overlapping lines is the most dangerous collision
    /// the engine knows about.
    pub fn is_modification(&self) -> bool {
        matches!(
            self,
            ChangeType::ModifyFunction | ChangeType::ModifyMethod | ChangeType::ModifyClass
        )
    }

    /// Edits that reshape the surrounding structure (wrap/unwrap markup,
    /// removal of a function or class)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ChangeType::WrapJsx
                | ChangeType::UnwrapJsx
                | ChangeType::RemoveFunction
                | ChangeType::RemoveClass
        )
    }

    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            ChangeType::RemoveImport
                | ChangeType::RemoveFunction
                | ChangeType::RemoveHookCall
                | ChangeType::RemoveClass
                | ChangeType::RemoveMethod
                | ChangeType::RemoveDecorator
        )
    }

    pub fn is_rename(&self) -> bool {
        matches!(self, ChangeType::RenameFunction)
    }

    /// Markup wrapping/unwrapping specifically (subset of structural)
    pub fn is_markup(&self) -> bool {
        matches!(self, ChangeType::WrapJsx | ChangeType::UnwrapJsx)
    }

    pub fn is_import(&self) -> bool {
        matches!(
            self,
            ChangeType::AddImport | ChangeType::RemoveImport | ChangeType::ModifyImport
        )
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ChangeType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownChangeType(s.to_string()))
    }
}

/// One typed edit produced by the semantic-diff extractor
///
/// `location` addresses the enclosing code unit (e.g. `"function:foo"` or
/// `"imports"`); `target` names the specific identifier affected. The pair
/// is stable across tasks diffing the same baseline, which is what lets
/// the detector line up edits from different tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticChange {
    pub location: String,
    pub target: String,
    pub change_type: ChangeType,
    /// First affected line (1-based, inclusive)
    pub line_start: u32,
    /// Last affected line (inclusive)
    pub line_end: u32,
    /// Source text before the edit, if the extractor captured it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_before: Option<String>,
    /// Source text after the edit, if the extractor captured it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_after: Option<String>,
}

impl SemanticChange {
    /// Creates a new change record
    ///
    /// # Errors
    /// Returns `DomainError::InvalidLineRange` if `line_end < line_start`
    pub fn new(
        location: impl Into<String>,
        target: impl Into<String>,
        change_type: ChangeType,
        line_start: u32,
        line_end: u32,
    ) -> Result<Self, DomainError> {
        if line_end < line_start {
            return Err(DomainError::InvalidLineRange {
                start: line_start,
                end: line_end,
            });
        }

        Ok(Self {
            location: location.into(),
            target: target.into(),
            change_type,
            line_start,
            line_end,
            content_before: None,
            content_after: None,
        })
    }

    /// Attach the pre-edit source text
    pub fn with_content_before(mut self, content: impl Into<String>) -> Self {
        self.content_before = Some(content.into());
        self
    }

    /// Attach the post-edit source text
    pub fn with_content_after(mut self, content: impl Into<String>) -> Self {
        self.content_after = Some(content.into());
        self
    }

    /// Whether the inclusive line ranges of two changes intersect
    pub fn overlaps(&self, other: &SemanticChange) -> bool {
        self.line_start <= other.line_end && other.line_start <= self.line_end
    }
}

/// All semantic changes one task made to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file_path: String,
    #[serde(default)]
    pub changes: Vec<SemanticChange>,
}

impl FileAnalysis {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            changes: Vec::new(),
        }
    }

    /// Builder-style append of a change
    pub fn with_change(mut self, change: SemanticChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes recorded at a given location, in extraction order
    pub fn changes_at<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a SemanticChange> {
        self.changes.iter().filter(move |c| c.location == location)
    }
}
