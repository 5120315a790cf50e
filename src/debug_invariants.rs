//! Structural self-checks for patches and domains.
//!
//! `validate_invariants` is always available and returns the first violation
//! found. `debug_assert_invariants` turns a violation into a panic, but only
//! in debug builds or with the `strict-invariants` / `check-invariants`
//! features; release builds compile it away.

use crate::domain_error::DomainError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), DomainError>;
}

/// A slice is valid when every element is.
impl<T: DebugInvariants> DebugInvariants for [T] {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "slice");
    }

    fn validate_invariants(&self) -> Result<(), DomainError> {
        self.iter().try_for_each(T::validate_invariants)
    }
}

/// Run a fallible check and panic with `ctx` on error when invariant checking
/// is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
