//! Error taxonomy for namespace queries.

use thiserror::Error;

/// Errors surfaced by a finalized [`Namespace`](crate::Namespace).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstantsError {
    /// Attempted to add, remove, or reassign a member after finalization.
    ///
    /// Signals programmer misuse; namespaces never change once built.
    #[error("{namespace} is immutable: cannot {action} `{name}`")]
    Immutable {
        namespace: String,
        name: String,
        action: MutationKind,
    },

    /// Combined lookup matched neither a declared name nor a raw value.
    #[error("{namespace} has no key or value {query}")]
    NotFound { namespace: String, query: String },
}

/// The mutation that was refused by [`ConstantsError::Immutable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Assign,
    Remove,
}

impl core::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Assign => f.write_str("assign"),
            Self::Remove => f.write_str("remove"),
        }
    }
}
