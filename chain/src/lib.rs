// Copyright (c) 2026 Keel Contributors. MIT License.
// See LICENSE for details.

//! # KEEL Chain — Header Chain Index
//!
//! An in-memory, concurrently-readable index of the best chain of block
//! headers, with atomic reorganization. This crate is the part of a chain
//! node everyone assumes is trivial until they write it: keeping "what is
//! the canonical chain" consistent while one thread rewires it and a dozen
//! others keep asking.
//!
//! What it does:
//!
//! - O(1) header lookup by identity hash and by canonical height.
//! - Fork-point detection in time proportional to the divergence, not the
//!   chain length.
//! - Atomic tip publication — readers see the old chain or the new chain,
//!   never a half-applied reorg.
//! - Eviction of headers that fall off the canonical path.
//!
//! What it deliberately does not do: validate headers. Proof-of-work,
//! timestamps, difficulty, signatures — all of that happened before a
//! candidate tip reaches [`ChainIndex::set_tip`]. This crate manipulates
//! linkage and indices, nothing more. It is also not a ledger: no
//! transactions, no balances, just header positions.
//!
//! ## Modules
//!
//! - **hash** — [`BlockHash`], the 32-byte header identity.
//! - **header** — [`ChainedHeader`], an immutable `Arc`-linked node with a
//!   restartable ancestor walk.
//! - **index** — [`ChainIndex`], the two lookup tables, the published tip,
//!   and the reorg algorithm.
//!
//! ## Quick tour
//!
//! ```
//! use keel_chain::{BlockHash, ChainedHeader, ChainIndex};
//!
//! let genesis = ChainedHeader::genesis(BlockHash::digest(b"genesis"));
//! let a = ChainedHeader::extend(&genesis, BlockHash::digest(b"a"));
//! let b = ChainedHeader::extend(&a, BlockHash::digest(b"b"));
//!
//! let index = ChainIndex::new();
//! index.set_tip(&b);
//! assert_eq!(index.height(), 2);
//!
//! // A competing branch off `a` becomes canonical:
//! let c = ChainedHeader::extend(&a, BlockHash::digest(b"c"));
//! let d = ChainedHeader::extend(&c, BlockHash::digest(b"d"));
//! let fork = index.set_tip(&d).expect("chain was non-empty");
//! assert_eq!(fork.hash(), a.hash());
//! assert!(index.get_by_hash(b.hash()).is_none()); // b was unwound
//! ```

pub mod error;
pub mod hash;
pub mod header;
pub mod index;

pub use error::HeaderError;
pub use hash::BlockHash;
pub use header::{Ancestors, ChainedHeader};
pub use index::ChainIndex;
