//! Integration tests for the chain index.
//!
//! The unit tests next to `index.rs` pin down each reorg shape in
//! isolation; these tests exercise the index the way a node would — long
//! chains, repeated competing branches, the linkage-checked construction
//! path, and concurrent readers racing a reorging writer.
//!
//! Each test builds its own index from its own headers. No shared state,
//! no test ordering dependencies, no flaky failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use keel_chain::{BlockHash, ChainIndex, ChainedHeader};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn hash(tag: &str) -> BlockHash {
    BlockHash::digest(tag.as_bytes())
}

/// Extends `base` by `count` headers tagged `prefix0..prefixN`, returning
/// the new tip.
fn grow(base: &Arc<ChainedHeader>, prefix: &str, count: u64) -> Arc<ChainedHeader> {
    let mut tip = Arc::clone(base);
    for i in 0..count {
        tip = ChainedHeader::extend(&tip, hash(&format!("{prefix}{i}")));
    }
    tip
}

/// Checks the by-hash/by-height agreement for the whole canonical path.
fn assert_canonical(index: &ChainIndex, expected_tip: &Arc<ChainedHeader>) {
    let tip = index.tip().expect("chain is non-empty");
    assert_eq!(tip.hash(), expected_tip.hash());
    for h in 0..=tip.height() {
        let header = index.get_by_height(h).expect("no height gaps");
        assert_eq!(header.height(), h);
        let same = index.get_by_hash(header.hash()).expect("indexed by hash");
        assert_eq!(same.height(), h);
    }
}

// ---------------------------------------------------------------------------
// Reorg lifecycle
// ---------------------------------------------------------------------------

#[test]
fn long_chain_then_deep_reorg() {
    let genesis = ChainedHeader::genesis(hash("genesis"));
    let old_tip = grow(&genesis, "main", 500);

    let index = ChainIndex::new();
    assert!(index.set_tip(&old_tip).is_none());
    assert_eq!(index.height(), 500);

    // Competing branch diverging at height 100, ending higher.
    let fork_base = index.get_by_height(100).expect("height 100 indexed");
    let rival_tip = grow(&fork_base, "rival", 450);

    let fork = index.set_tip(&rival_tip).expect("chain was non-empty");
    assert_eq!(fork.height(), 100);
    assert_eq!(fork.hash(), fork_base.hash());
    assert_eq!(index.height(), 550);
    assert_canonical(&index, &rival_tip);

    // Everything above the fork on the old path is gone.
    let mut cursor = Arc::clone(&old_tip);
    while cursor.height() > 100 {
        assert!(!index.contains(cursor.hash()));
        cursor = Arc::clone(cursor.parent().expect("above genesis"));
    }
    // The fork point and its ancestors survived.
    assert!(index.contains(cursor.hash()));
}

#[test]
fn alternating_branches_converge_to_last_writer() {
    let genesis = ChainedHeader::genesis(hash("genesis"));
    let trunk = grow(&genesis, "trunk", 20);

    let left = grow(&trunk, "left", 30);
    let right = grow(&trunk, "right", 25);

    let index = ChainIndex::new();
    index.set_tip(&left);
    for _ in 0..5 {
        let fork = index.set_tip(&right).expect("non-empty");
        assert_eq!(fork.hash(), trunk.hash());
        assert_canonical(&index, &right);

        let fork = index.set_tip(&left).expect("non-empty");
        assert_eq!(fork.hash(), trunk.hash());
        assert_canonical(&index, &left);
    }
}

#[test]
fn enumeration_counts_tip_height_plus_one() {
    let genesis = ChainedHeader::genesis(hash("genesis"));
    let tip = grow(&genesis, "e", 64);

    let index = ChainIndex::new();
    index.set_tip(&tip);

    let walked: Vec<_> = index.iter_from_genesis().collect();
    assert_eq!(walked.len() as u64, index.height() + 1);
    for (i, header) in walked.iter().enumerate() {
        assert_eq!(header.height(), i as u64);
    }

    // Reorg, then enumerate again: the view follows the tables.
    let fork_base = index.get_by_height(10).expect("indexed");
    let new_tip = grow(&fork_base, "f", 5);
    index.set_tip(&new_tip);

    let walked: Vec<_> = index.iter_from_genesis().collect();
    assert_eq!(walked.len(), 16);
    assert_eq!(walked.last().unwrap().hash(), new_tip.hash());
}

#[test]
fn linkage_checked_construction_feeds_the_index() {
    // The path a validation collaborator takes: headers arrive with a
    // claimed parent hash and are chained via `link`, then indexed.
    let genesis = ChainedHeader::genesis(hash("genesis"));
    let mut tip = Arc::clone(&genesis);
    for i in 0..10u32 {
        let claimed = *tip.hash();
        tip = ChainedHeader::link(hash(&format!("v{i}")), claimed, &tip)
            .expect("claimed parent matches");
    }

    let index = ChainIndex::new();
    index.set_tip(&tip);
    assert_eq!(index.height(), 10);
    assert_canonical(&index, &tip);

    // A header claiming the wrong parent never becomes a node at all.
    assert!(ChainedHeader::link(hash("bad"), hash("wrong-parent"), &tip).is_err());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// A single writer flips between two branches while readers hammer the
/// lookup paths. No reader may ever see a header under a height key that
/// disagrees with the header's own height, and every observed tip must be
/// one of the two published branch tips (or the initial trunk tip).
#[test]
fn concurrent_readers_never_see_torn_state() {
    let genesis = ChainedHeader::genesis(hash("genesis"));
    let trunk = grow(&genesis, "trunk", 50);
    let left = grow(&trunk, "left", 40);
    let right = grow(&trunk, "right", 40);

    let index = Arc::new(ChainIndex::new());
    index.set_tip(&trunk);

    let valid_tips = [*trunk.hash(), *left.hash(), *right.hash()];
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let index_ref = &index;
        let done_ref = &done;

        let writer_left = Arc::clone(&left);
        let writer_right = Arc::clone(&right);
        scope.spawn(move || {
            for round in 0..500 {
                let target = if round % 2 == 0 { &writer_left } else { &writer_right };
                index_ref.set_tip(target);
            }
            done_ref.store(true, Ordering::Release);
        });

        for _ in 0..4 {
            scope.spawn(move || {
                while !done_ref.load(Ordering::Acquire) {
                    // Height-keyed lookups must return headers at that height.
                    for h in (0..=90u64).step_by(7) {
                        if let Some(header) = index_ref.get_by_height(h) {
                            assert_eq!(
                                header.height(),
                                h,
                                "header found under height key {h} reports its own \
                                 height as {}",
                                header.height()
                            );
                            // And the by-hash table agrees on identity.
                            if let Some(same) = index_ref.get_by_hash(header.hash()) {
                                assert_eq!(same.height(), header.height());
                            }
                        }
                    }
                    // The tip is always some actually-published tip.
                    let tip = index_ref.tip().expect("chain never becomes empty");
                    assert!(
                        valid_tips.contains(tip.hash()),
                        "observed a tip that was never published"
                    );
                }
            });
        }
    });

    // Writer finished on `right` (round 499 is odd).
    assert_canonical(&index, &right);
}

#[test]
fn readers_share_ancestor_subchain_across_reorg() {
    // Both branch tips alias the trunk below the fork. A reader holding a
    // pre-reorg header can keep walking its ancestors after the reorg
    // evicted it from the index.
    let genesis = ChainedHeader::genesis(hash("genesis"));
    let trunk = grow(&genesis, "trunk", 10);
    let left = grow(&trunk, "left", 5);
    let right = grow(&trunk, "right", 5);

    let index = ChainIndex::new();
    index.set_tip(&left);
    let held = index.get_by_height(15).expect("left tip indexed");

    index.set_tip(&right);
    assert!(!index.contains(held.hash()));

    // The evicted header's ancestry is intact and still reaches genesis.
    let walk: Vec<_> = held.ancestors().collect();
    assert_eq!(walk.len(), 16);
    assert!(walk.last().unwrap().is_genesis());
}
