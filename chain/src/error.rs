//! Error types for header linkage.
//!
//! The chain index itself has no recoverable failure modes — lookups miss
//! with `Option`, and a reorg either runs to completion or the input
//! violated a documented precondition. The one operation that genuinely can
//! fail is linking a header to a parent it does not actually extend.

use thiserror::Error;

use crate::hash::BlockHash;

/// Errors raised while chaining a header onto its parent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The header's claimed parent hash does not match the parent node
    /// it was linked against.
    #[error("parent hash mismatch: header claims {claimed}, parent is {actual}")]
    ParentHashMismatch {
        /// The parent hash carried by the header being linked.
        claimed: BlockHash,
        /// The hash of the node offered as the parent.
        actual: BlockHash,
    },
}
