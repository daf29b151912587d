//! Terminal walkthrough of a chain reorganization.
//!
//! Builds a small canonical chain, extends it, then lets a rival branch
//! win and shows the index unwinding the losing headers. Set `RUST_LOG`
//! (e.g. `RUST_LOG=debug`) to watch the index's own trace of each reorg.
//!
//! Run with:
//!   cargo run --example reorg_walkthrough

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use keel_chain::{BlockHash, ChainIndex, ChainedHeader};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(title: &str) {
    println!();
    println!("{BOLD}{CYAN}== {title} =={RESET}");
}

fn show_chain(index: &ChainIndex) {
    for header in index.iter_from_genesis() {
        let marker = if index.tip().is_some_and(|t| t.hash() == header.hash()) {
            format!("{GREEN}<- tip{RESET}")
        } else {
            String::new()
        };
        println!(
            "  {DIM}height{RESET} {:>3}  {} {marker}",
            header.height(),
            &header.hash().to_hex()[..16],
        );
    }
}

fn header_for(tag: &str, parent: &Arc<ChainedHeader>) -> Arc<ChainedHeader> {
    ChainedHeader::extend(parent, BlockHash::digest(tag.as_bytes()))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let index = ChainIndex::new();

    section("Genesis and first headers");
    let genesis = ChainedHeader::genesis(BlockHash::digest(b"keel-genesis"));
    let a1 = header_for("a1", &genesis);
    let a2 = header_for("a2", &a1);
    index.set_tip(&a2);
    show_chain(&index);

    section("Pure extension: a3, a4 arrive");
    let a3 = header_for("a3", &a2);
    let a4 = header_for("a4", &a3);
    let fork = index.set_tip(&a4).expect("chain is non-empty");
    println!("  fork point: {} {DIM}(the old tip — nothing unwound){RESET}", fork);
    show_chain(&index);

    section("A rival branch off a1 takes over");
    let b2 = header_for("b2", &a1);
    let b3 = header_for("b3", &b2);
    let b4 = header_for("b4", &b3);
    let b5 = header_for("b5", &b4);
    let fork = index.set_tip(&b5).expect("chain is non-empty");
    println!("  fork point: {} {YELLOW}(a2..a4 unwound){RESET}", fork);
    show_chain(&index);

    section("The losers are gone from the index");
    for orphan in [&a2, &a3, &a4] {
        println!(
            "  {} indexed: {}",
            orphan,
            if index.contains(orphan.hash()) { "yes" } else { "no" }
        );
    }
    println!(
        "\n{DIM}The orphaned headers still exist as nodes — only their index\n\
         entries are gone. Anyone holding one can still walk its ancestors.{RESET}"
    );
}
