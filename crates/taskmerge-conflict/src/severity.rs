//! Severity classification for conflict regions
//!
//! A pure priority ladder over the change kinds and line ranges seen at one
//! location. The first matching rung wins.

use taskmerge_core::domain::{ChangeType, ConflictSeverity, SemanticChange};

/// Classifies how dangerous a collision at one location is
pub struct SeverityAssessor;

impl SeverityAssessor {
    /// Assess the severity of a collision
    ///
    /// 1. `Critical` - two or more modification kinds whose line ranges overlap
    /// 2. `High` - any structural kind present (wrap/unwrap, removals)
    /// 3. `Medium` - at least one modification kind present
    /// 4. `Low` - everything else, including unknown kinds
    ///
    /// An empty change set has nothing to assess and yields `None`.
    pub fn assess(change_types: &[ChangeType], changes: &[&SemanticChange]) -> ConflictSeverity {
        if change_types.is_empty() && changes.is_empty() {
            return ConflictSeverity::None;
        }

        let modifications: Vec<&SemanticChange> = changes
            .iter()
            .copied()
            .filter(|c| c.change_type.is_modification())
            .collect();

        if modifications.len() >= 2 && Self::ranges_overlap(&modifications) {
            return ConflictSeverity::Critical;
        }

        if change_types.iter().any(ChangeType::is_structural) {
            return ConflictSeverity::High;
        }

        if change_types.iter().any(ChangeType::is_modification) {
            return ConflictSeverity::Medium;
        }

        ConflictSeverity::Low
    }

    /// Whether any two of the given inclusive line ranges intersect
    ///
    /// Ranges are sorted by start; adjacent entries overlap iff
    /// `sorted[i].end >= sorted[i + 1].start`.
    pub fn ranges_overlap(changes: &[&SemanticChange]) -> bool {
        let mut ranges: Vec<(u32, u32)> = changes
            .iter()
            .map(|c| (c.line_start, c.line_end))
            .collect();
        ranges.sort_unstable();

        ranges.windows(2).any(|pair| pair[0].1 >= pair[1].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(kind: ChangeType, start: u32, end: u32) -> SemanticChange {
        SemanticChange::new("function:processOrder", "processOrder", kind, start, end).unwrap()
    }

    fn assess(changes: &[SemanticChange]) -> ConflictSeverity {
        let mut kinds: Vec<ChangeType> = Vec::new();
        for c in changes {
            if !kinds.contains(&c.change_type) {
                kinds.push(c.change_type);
            }
        }
        let refs: Vec<&SemanticChange> = changes.iter().collect();
        SeverityAssessor::assess(&kinds, &refs)
    }

    #[test]
    fn test_overlapping_modifications_are_critical() {
        let changes = [
            change(ChangeType::ModifyFunction, 10, 20),
            change(ChangeType::ModifyFunction, 15, 25),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Critical);
    }

    #[test]
    fn test_touching_ranges_overlap() {
        let changes = [
            change(ChangeType::ModifyMethod, 10, 20),
            change(ChangeType::ModifyMethod, 20, 30),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Critical);
    }

    #[test]
    fn test_disjoint_modifications_are_medium() {
        let changes = [
            change(ChangeType::ModifyFunction, 10, 20),
            change(ChangeType::ModifyFunction, 30, 40),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Medium);
    }

    #[test]
    fn test_mixed_modification_kinds_overlap() {
        let changes = [
            change(ChangeType::ModifyClass, 1, 100),
            change(ChangeType::ModifyMethod, 40, 60),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Critical);
    }

    #[test]
    fn test_overlap_takes_precedence_over_structural() {
        let changes = [
            change(ChangeType::ModifyFunction, 10, 20),
            change(ChangeType::ModifyFunction, 12, 18),
            change(ChangeType::RemoveFunction, 10, 20),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Critical);
    }

    #[test]
    fn test_structural_is_high_without_overlap() {
        let changes = [
            change(ChangeType::WrapJsx, 10, 20),
            change(ChangeType::UnwrapJsx, 10, 20),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::High);

        let changes = [
            change(ChangeType::ModifyFunction, 10, 20),
            change(ChangeType::RemoveFunction, 40, 50),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::High);
    }

    #[test]
    fn test_additions_and_renames_are_low() {
        let changes = [
            change(ChangeType::RenameFunction, 1, 1),
            change(ChangeType::AddDecorator, 1, 1),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Low);
    }

    #[test]
    fn test_unknown_falls_to_low() {
        let changes = [
            change(ChangeType::Unknown, 1, 5),
            change(ChangeType::Unknown, 3, 8),
        ];
        assert_eq!(assess(&changes), ConflictSeverity::Low);
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(SeverityAssessor::assess(&[], &[]), ConflictSeverity::None);
    }

    #[test]
    fn test_ranges_overlap_with_enclosing_range() {
        let a = change(ChangeType::ModifyFunction, 1, 100);
        let b = change(ChangeType::ModifyFunction, 10, 20);
        let c = change(ChangeType::ModifyFunction, 30, 40);
        assert!(SeverityAssessor::ranges_overlap(&[&a, &b, &c]));
        assert!(!SeverityAssessor::ranges_overlap(&[&b, &c]));
    }
}
