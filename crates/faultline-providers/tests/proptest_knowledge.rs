//! Knowledge retriever property-based tests.
//!
//! ## Purpose
//! These tests fuzz queries and document bodies to ensure the in-memory
//! retriever never panics and keeps scores inside the documented range.
//!
//! ## What is covered
//! - Arbitrary query strings are handled without panic.
//! - Returned scores stay in `[0, 1]` and respect the result limit.
//! - Result ordering is non-increasing by score.
//!
//! ## What is intentionally out of scope
//! - Ranking quality on realistic corpora (covered by unit tests).
// crates/faultline-providers/tests/proptest_knowledge.rs
// ============================================================================
// Module: Knowledge Retriever Property-Based Tests
// Description: Fuzz-like checks for query tokenization and ranking.
// Purpose: Ensure the retriever fails closed without panics on odd inputs.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use faultline_core::KnowledgeRetriever;
use faultline_providers::InMemoryKnowledge;
use proptest::prelude::*;

fn seeded_store() -> InMemoryKnowledge {
    let mut store = InMemoryKnowledge::new();
    store.load(
        "Database connection pool exhaustion",
        "Connection pool saturation causes checkout timeouts under load.",
        true,
    );
    store.load(
        "Deploy rollback runbook",
        "Roll back the most recent deploy when error rates spike.",
        false,
    );
    store.load(
        "DNS resolution failures",
        "Upstream resolver outages surface as sporadic connect errors.",
        true,
    );
    store
}

proptest! {
    #[test]
    fn arbitrary_queries_never_panic(query in ".{0,200}") {
        let store = seeded_store();
        let results = store.search(&query, 5).unwrap();
        prop_assert!(results.len() <= 5);
    }

    #[test]
    fn scores_stay_in_unit_range(query in "[a-z ]{0,120}", limit in 0usize..6) {
        let store = seeded_store();
        let results = store.search(&query, limit).unwrap();
        prop_assert!(results.len() <= limit);
        for doc in &results {
            prop_assert!(doc.score >= 0.0);
            prop_assert!(doc.score <= 1.0);
        }
    }

    #[test]
    fn results_are_sorted_by_descending_score(query in "[a-z ]{0,120}") {
        let store = seeded_store();
        let results = store.search(&query, 5).unwrap();
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
