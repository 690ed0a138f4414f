//! Domain error types
//!
//! This module defines error types raised while constructing domain values,
//! such as empty task identifiers or inverted line ranges.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Task identifier was empty or whitespace
    #[error("Invalid task ID: {0:?}")]
    InvalidTaskId(String),

    /// Line range ends before it starts
    #[error("Invalid line range: {start}..{end}")]
    InvalidLineRange {
        /// First line of the range
        start: u32,
        /// Last line of the range
        end: u32,
    },

    /// Strategy token did not name a known merge strategy
    #[error("Unknown merge strategy: {0}")]
    UnknownStrategy(String),

    /// Change type token did not name a known change kind
    #[error("Unknown change type: {0}")]
    UnknownChangeType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidTaskId("  ".to_string());
        assert_eq!(err.to_string(), "Invalid task ID: \"  \"");

        let err = DomainError::InvalidLineRange { start: 20, end: 10 };
        assert_eq!(err.to_string(), "Invalid line range: 20..10");

        let err = DomainError::UnknownStrategy("yolo".to_string());
        assert_eq!(err.to_string(), "Unknown merge strategy: yolo");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::UnknownChangeType("a".to_string());
        let err2 = DomainError::UnknownChangeType("a".to_string());
        let err3 = DomainError::UnknownChangeType("b".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
