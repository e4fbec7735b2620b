// crates/faultline-providers/src/knowledge.rs
// ============================================================================
// Module: In-Memory Knowledge Retriever
// Description: Ranked token-overlap search over loaded documents.
// Purpose: Serve runbooks and prior incidents without an external backend.
// Dependencies: faultline-core
// ============================================================================

//! ## Overview
//! The in-memory retriever ranks loaded documents by token overlap with the
//! query. Scores are the fraction of query tokens found in the document, so
//! they stay in `[0, 1]` and a fully matching runbook outranks a passing
//! mention. Deployments with a real search backend implement
//! [`faultline_core::KnowledgeRetriever`] directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use faultline_core::KnowledgeDoc;
use faultline_core::KnowledgeError;
use faultline_core::KnowledgeRetriever;

// ============================================================================
// SECTION: Retriever
// ============================================================================

/// In-memory ranked document store.
#[derive(Debug, Default)]
pub struct InMemoryKnowledge {
    /// Loaded documents in insertion order.
    docs: Vec<KnowledgeDoc>,
}

impl InMemoryKnowledge {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            docs: Vec::new(),
        }
    }

    /// Loads one document; the stored score is recomputed per query.
    pub fn load(&mut self, title: impl Into<String>, body: impl Into<String>, historical_pattern: bool) {
        self.docs.push(KnowledgeDoc {
            title: title.into(),
            body: body.into(),
            score: 0.0,
            historical_pattern,
        });
    }

    /// Returns the number of loaded documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns true when no documents are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl KnowledgeRetriever for InMemoryKnowledge {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeDoc>, KnowledgeError> {
        let query_tokens = tokens(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut ranked: Vec<KnowledgeDoc> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let doc_tokens: BTreeSet<String> =
                    tokens(&doc.title).union(&tokens(&doc.body)).cloned().collect();
                let hits = query_tokens.intersection(&doc_tokens).count();
                if hits == 0 {
                    return None;
                }
                let mut scored = doc.clone();
                scored.score = ratio(hits, query_tokens.len());
                Some(scored)
            })
            .collect();
        ranked.sort_by(|left, right| right.score.total_cmp(&left.score));
        ranked.truncate(limit);
        Ok(ranked)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lowercased tokens longer than two characters.
fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Lossless ratio of two small counts.
fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let hits = u32::try_from(hits).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    f64::from(hits) / f64::from(total)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
