//! # Chain Index
//!
//! The concurrently-readable index of the current best chain of headers.
//! Two tables plus one pointer:
//!
//! ```text
//! by_hash   — BlockHash → header, one entry per canonical header
//! by_height — height    → header, exactly tip.height + 1 entries
//! tip       — the published head of the chain
//! ```
//!
//! At every externally observable instant the tables agree: every indexed
//! header appears in both, keyed by its own hash and its own height, and
//! the indexed set is exactly the ancestor path of `tip` from genesis. The
//! tables never hold side branches — a header that loses its place on the
//! canonical path is evicted during the reorg that displaces it.
//!
//! ## Concurrency
//!
//! - `DashMap` backs both tables: readers take a shard lock for one key,
//!   never the writer mutex, and a single-key read is never torn.
//! - Writers serialize on a `parking_lot::Mutex` scoped to the whole of
//!   [`ChainIndex::set_tip`]. The remove/insert/publish sequence is not
//!   individually atomic, so two interleaved reorgs would corrupt the
//!   table agreement.
//! - The tip is an `ArcSwapOption`: wait-free loads, release-ordered
//!   stores. Publication is the last step of a reorg, so a reader that
//!   sees the new tip also sees the table writes that support it. A reader
//!   racing a reorg observes either the old tip or the new one — never a
//!   value that was not, at some instant, actually the tip.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::hash::BlockHash;
use crate::header::ChainedHeader;

/// In-memory index of the canonical header chain. See the module docs for
/// the table-agreement invariant and the concurrency contract.
pub struct ChainIndex {
    by_hash: DashMap<BlockHash, Arc<ChainedHeader>>,
    by_height: DashMap<u64, Arc<ChainedHeader>>,
    tip: ArcSwapOption<ChainedHeader>,
    write_lock: Mutex<()>,
}

impl ChainIndex {
    /// An empty index: no tip, no entries.
    pub fn new() -> Self {
        ChainIndex {
            by_hash: DashMap::new(),
            by_height: DashMap::new(),
            tip: ArcSwapOption::const_empty(),
            write_lock: Mutex::new(()),
        }
    }

    /// Look up a canonical header by identity. O(1), never blocks on a
    /// concurrent reorg. `None` means "not on the canonical chain" — an
    /// expected outcome, not an error.
    pub fn get_by_hash(&self, hash: &BlockHash) -> Option<Arc<ChainedHeader>> {
        self.by_hash.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up the canonical header at a height. O(1), same guarantees as
    /// [`ChainIndex::get_by_hash`].
    pub fn get_by_height(&self, height: u64) -> Option<Arc<ChainedHeader>> {
        self.by_height.get(&height).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a header with this identity is on the canonical chain.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// The most recently published tip, or `None` for an empty chain.
    pub fn tip(&self) -> Option<Arc<ChainedHeader>> {
        self.tip.load_full()
    }

    /// The height of the published tip.
    ///
    /// # Panics
    ///
    /// Panics on an empty chain. Callers that cannot rule that out should
    /// go through [`ChainIndex::tip`] and handle the `None`.
    pub fn height(&self) -> u64 {
        self.tip()
            .map(|tip| tip.height())
            .expect("height() called on an empty chain")
    }

    /// Number of canonical headers (`tip.height + 1` when non-empty).
    pub fn len(&self) -> usize {
        self.by_height.len()
    }

    /// Whether the chain is empty (no tip ever published).
    pub fn is_empty(&self) -> bool {
        self.tip.load().is_none()
    }

    /// Force a new tip, reorganizing the index onto `block`'s ancestor path.
    ///
    /// `block` must carry a well-formed ancestor chain back to some common
    /// ancestor with the current tip (possibly genesis, possibly the tip
    /// itself). No consensus rule is checked here — the caller has already
    /// validated the candidate; this only rewires linkage and indices.
    ///
    /// The walk back from the old tip and from `block` proceeds in
    /// lock-step on height. Every old-path header above the fork point is
    /// evicted from both tables; every candidate-path header down to the
    /// old tip is inserted (idempotently — re-applying the current tip is a
    /// no-op). Publication of the new tip is the final step, so concurrent
    /// readers see the swap atomically.
    ///
    /// Returns the fork point — the deepest header common to the old and
    /// new paths — or `None` when the chain was previously empty. The cost
    /// is proportional to the divergence depth plus the insertion length,
    /// never the whole chain.
    pub fn set_tip(&self, block: &Arc<ChainedHeader>) -> Option<Arc<ChainedHeader>> {
        let _writer = self.write_lock.lock();

        let old_tip = self.tip.load_full();
        let mut fork_height: i64 = old_tip.as_ref().map_or(-1, |tip| tip.height() as i64);
        let mut orphaned = 0u64;

        // Lock-step fork walk: evict old-path headers until both cursors
        // sit on the same header.
        if let Some(tip) = old_tip.as_ref() {
            let mut ours = Arc::clone(tip);
            let mut theirs = Arc::clone(block);
            loop {
                if ours.height() > theirs.height() {
                    self.evict(&ours);
                    fork_height -= 1;
                    orphaned += 1;
                    match ours.parent() {
                        Some(parent) => ours = Arc::clone(parent),
                        None => break,
                    }
                } else if theirs.height() > ours.height() {
                    match theirs.parent() {
                        Some(parent) => theirs = Arc::clone(parent),
                        None => break,
                    }
                } else if ours.hash() == theirs.hash() {
                    // Fork point found.
                    break;
                } else {
                    self.evict(&ours);
                    fork_height -= 1;
                    orphaned += 1;
                    match (ours.parent(), theirs.parent()) {
                        (Some(o), Some(t)) => {
                            ours = Arc::clone(o);
                            theirs = Arc::clone(t);
                        }
                        // Two distinct genesis nodes: no common ancestor
                        // exists. The old path is fully unwound.
                        _ => break,
                    }
                }
            }
        }

        // Orphans sat strictly above the fork, so the fork entry survived
        // the eviction loop and is still in by_height.
        let fork = if fork_height < 0 {
            None
        } else {
            self.get_by_height(fork_height as u64)
        };

        // Index the candidate path, newest first, stopping once the walk
        // reaches the old tip (whose prefix is already indexed). Inserts
        // below the fork overwrite identical entries and are harmless.
        for header in block.ancestors() {
            if let Some(tip) = old_tip.as_ref() {
                if header.hash() == tip.hash() {
                    break;
                }
            }
            self.by_hash.insert(*header.hash(), Arc::clone(&header));
            self.by_height.insert(header.height(), Arc::clone(&header));
        }

        // Publish last: a reader observing the new tip is guaranteed to
        // find its supporting table entries.
        self.tip.store(Some(Arc::clone(block)));

        debug!(
            new_height = block.height(),
            orphaned,
            fork_height,
            "chain tip updated"
        );

        fork
    }

    /// Iterate the canonical chain from genesis to the tip, in increasing
    /// height order.
    ///
    /// A convenience view over the by-height table: lazy, restartable, and
    /// ending at the first missing height. Each call walks the table as it
    /// stands, so an iterator created before a reorg and driven after it
    /// sees the post-reorg entries for heights it has not yet visited.
    pub fn iter_from_genesis(&self) -> impl Iterator<Item = Arc<ChainedHeader>> + '_ {
        (0u64..).map_while(|height| self.get_by_height(height))
    }

    /// Remove a header from both tables.
    fn evict(&self, header: &ChainedHeader) {
        self.by_hash.remove(header.hash());
        self.by_height.remove(&header.height());
    }
}

impl Default for ChainIndex {
    fn default() -> Self {
        Self::new()
    }
}
