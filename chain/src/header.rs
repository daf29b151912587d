//! # Chained Header
//!
//! An immutable, reference-counted node in the header tree. Each node
//! carries its identity hash, its height, and a shared link to its parent
//! — and nothing else. Validation, proof-of-work, timestamps, and the rest
//! of consensus live with the collaborator that constructs headers; this
//! module only cares about linkage.
//!
//! ## Why `Arc` links
//!
//! During a reorg, two chain states alias the same ancestor subchain at the
//! same time: the old tip's path and the candidate's path both reach back
//! to the fork point. Shared, non-owning-in-spirit `Arc` links make that
//! aliasing free, and immutability means a header can never be "moved" to
//! another branch under a reader's feet.
//!
//! Immutability buys a structural guarantee too: `height` is derived at
//! construction (`parent.height + 1`, genesis = 0) and `Arc` linkage cannot
//! form cycles, so a malformed ancestry — the classic way to wedge a fork
//! walk — is simply unrepresentable.

use std::fmt;
use std::sync::Arc;

use crate::error::HeaderError;
use crate::hash::BlockHash;

/// An immutable header node: identity, height, parent link.
///
/// Construct via [`ChainedHeader::genesis`], [`ChainedHeader::extend`], or
/// the linkage-checking [`ChainedHeader::link`]. Headers are always handled
/// as `Arc<ChainedHeader>` — many chain states may share one ancestor
/// subchain simultaneously.
pub struct ChainedHeader {
    hash: BlockHash,
    height: u64,
    parent: Option<Arc<ChainedHeader>>,
}

impl ChainedHeader {
    /// Construct the genesis node: height 0, no parent.
    pub fn genesis(hash: BlockHash) -> Arc<Self> {
        Arc::new(ChainedHeader {
            hash,
            height: 0,
            parent: None,
        })
    }

    /// Construct a child of `parent` with the given identity.
    ///
    /// The height is `parent.height() + 1` by construction. Use
    /// [`ChainedHeader::link`] instead when the header carries a claimed
    /// parent hash that should be cross-checked.
    pub fn extend(parent: &Arc<Self>, hash: BlockHash) -> Arc<Self> {
        Arc::new(ChainedHeader {
            hash,
            height: parent.height + 1,
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Chain a header onto its parent, verifying the claimed linkage.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::ParentHashMismatch`] when `claimed_parent`
    /// is not the hash of `parent` — i.e. the header does not actually
    /// extend the node it was offered.
    pub fn link(
        hash: BlockHash,
        claimed_parent: BlockHash,
        parent: &Arc<Self>,
    ) -> Result<Arc<Self>, HeaderError> {
        if claimed_parent != parent.hash {
            return Err(HeaderError::ParentHashMismatch {
                claimed: claimed_parent,
                actual: parent.hash,
            });
        }
        Ok(Self::extend(parent, hash))
    }

    /// The header's identity hash.
    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    /// Distance from genesis (genesis = 0).
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The parent node, or `None` for genesis.
    pub fn parent(&self) -> Option<&Arc<ChainedHeader>> {
        self.parent.as_ref()
    }

    /// Whether this node is genesis.
    pub fn is_genesis(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterate from this header back to genesis, self first.
    ///
    /// The iterator is lazy, finite, and restartable — it is recomputed
    /// from the immutable node on every call, never a shared cursor.
    pub fn ancestors(self: &Arc<Self>) -> Ancestors {
        Ancestors {
            cursor: Some(Arc::clone(self)),
        }
    }
}

/// Identity comparison: two nodes are the same header iff their hashes
/// match. The parent chain is deliberately not compared — with content
/// hashing, equal hashes imply equal ancestry.
impl PartialEq for ChainedHeader {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ChainedHeader {}

impl fmt::Debug for ChainedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHeader")
            .field("height", &self.height)
            .field("hash", &self.hash)
            .field("parent", &self.parent.as_ref().map(|p| p.hash))
            .finish()
    }
}

impl fmt::Display for ChainedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.height, self.hash)
    }
}

impl Drop for ChainedHeader {
    fn drop(&mut self) {
        // Unwind the parent chain iteratively. A naive recursive drop of a
        // 100k-header chain overflows the stack; here each uniquely-owned
        // ancestor is detached and dropped in a flat loop instead.
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => parent = inner.parent.take(),
                // Still shared by another chain state; its owner drops it.
                Err(_) => break,
            }
        }
    }
}

/// Lazy walk from a header back to genesis. See [`ChainedHeader::ancestors`].
pub struct Ancestors {
    cursor: Option<Arc<ChainedHeader>>,
}

impl Iterator for Ancestors {
    type Item = Arc<ChainedHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor.take()?;
        self.cursor = current.parent.as_ref().map(Arc::clone);
        Some(current)
    }
}
