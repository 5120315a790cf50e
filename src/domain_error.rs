//! DomainError: unified error type for forest-domains public APIs
//!
//! Every fallible operation in the crate reports through this type. Errors
//! raised while building a domain (`UnbalancedForest`, `IncompleteGhostLayer`,
//! `InvalidForest`) describe a broken global topology and must tear down the
//! whole job; the remaining variants are local to the call that produced them.

use thiserror::Error;

/// Unified error type for forest-domains operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A null direction tag was passed where a concrete direction was required.
    #[error("invalid direction: null {kind} used where a concrete direction is required")]
    InvalidDirection { kind: &'static str },
    /// Adjoining cells differ by more than one refinement level.
    #[error(
        "unbalanced forest: cell in block {block} at level {level} has a neighbor more than one level away across {direction}"
    )]
    UnbalancedForest {
        block: usize,
        level: u8,
        direction: String,
    },
    /// `coarser_domain` was called after the coarsest domain was produced.
    #[error("domain generator exhausted: no coarser domain available")]
    GeneratorExhausted,
    /// A direction tag literal was not recognized while decoding.
    #[error("unrecognized {kind} literal `{literal}`")]
    SerializationFormat { kind: &'static str, literal: String },
    /// A typed neighbor accessor was used on a slot holding another variant.
    #[error("neighbor kind mismatch: expected {expected}, found {found}")]
    NbrKindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The ghost view does not carry the leaves needed to classify a neighbor.
    #[error("incomplete ghost layer around block {block} at level {level}")]
    IncompleteGhostLayer { block: usize, level: u8 },
    /// A patch record violates its structural invariants.
    #[error("invalid patch {id}: {reason}")]
    InvalidPatch { id: usize, reason: String },
    /// The forest view is internally inconsistent.
    #[error("invalid forest: {0}")]
    InvalidForest(String),
    /// A block connectivity link is malformed or conflicts with an existing one.
    #[error("invalid connectivity: {0}")]
    InvalidConnectivity(String),
    /// Resolution configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Malformed binary patch buffer.
    #[error("wire format error: {0}")]
    Wire(String),
}

impl DomainError {
    /// Whether this error invalidates the whole distributed generation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DomainError::UnbalancedForest { .. }
                | DomainError::IncompleteGhostLayer { .. }
                | DomainError::InvalidForest(_)
                | DomainError::InvalidPatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_forest_reports_location() {
        let err = DomainError::UnbalancedForest {
            block: 3,
            level: 2,
            direction: "EAST".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("block 3"));
        assert!(msg.contains("level 2"));
        assert!(msg.contains("EAST"));
        assert!(err.is_fatal());
    }

    #[test]
    fn local_errors_are_not_fatal() {
        assert!(!DomainError::GeneratorExhausted.is_fatal());
        assert!(
            !DomainError::SerializationFormat {
                kind: "Side",
                literal: "UP".into()
            }
            .is_fatal()
        );
        assert!(!DomainError::InvalidDirection { kind: "Side" }.is_fatal());
    }
}
