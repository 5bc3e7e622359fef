//! Error kinds shared by every layer of the substrate.
//!
//! Mirrors the five kinds described for the system: invalid input,
//! precondition violations, store I/O failures, cancellation, and
//! internal invariant violations. Pipelines and the store wrap
//! lower-level errors into these variants rather than inventing new
//! ones per call site.

use crate::hash::ContentHash;
use crate::node::NodeId;

/// Errors that can cross the substrate's public boundary.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    /// Malformed header, unsupported dtype, a reference to a nonexistent
    /// id, or any other input the caller handed us that cannot be
    /// ingested as-is.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A precondition the caller was responsible for upholding did not
    /// hold (empty text, mismatched children/multiplicities, a
    /// multiplicity below 1). Raised synchronously, no store mutation
    /// has occurred.
    #[error("precondition violation: {0}")]
    Precondition(String),

    /// The store could not complete an operation: connection loss,
    /// constraint violation, or any other transport/driver failure.
    /// Retriable, because every insert is idempotent on content hash.
    #[error("store I/O failure: {0}")]
    StoreIo(String),

    /// Ingestion was cancelled between batch boundaries.
    #[error("ingestion cancelled")]
    Cancelled,

    /// An internal invariant was violated: a dangling relation, a
    /// content-hash mismatch on reconstruction, a lookup that resolved
    /// to two different ids for the same hash. Signals a bug; callers
    /// should not attempt to recover from this variant.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl SubstrateError {
    /// Maps an error to the CLI exit code it corresponds to.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Precondition(_) => 2,
            Self::StoreIo(_) => 3,
            Self::Cancelled => 4,
            Self::Invariant(_) => 70,
        }
    }

    /// Builds an [`SubstrateError::Invariant`] for a node id that does
    /// not resolve to any row.
    #[must_use]
    pub fn dangling(id: NodeId) -> Self {
        Self::Invariant(format!("node id {id} does not resolve to a stored row"))
    }

    /// Builds an [`SubstrateError::Invariant`] for a content hash that
    /// two independent inserts resolved to different ids for.
    #[must_use]
    pub fn hash_collision(hash: ContentHash, a: NodeId, b: NodeId) -> Self {
        Self::Invariant(format!(
            "content hash {hash} resolved to two distinct ids ({a}, {b})"
        ))
    }
}

/// Convenience alias used throughout the substrate crates.
pub type Result<T> = core::result::Result<T, SubstrateError>;
