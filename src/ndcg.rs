//! Normalized Discounted Cumulative Gain.
//!
//! DCG over gains `g_1..g_m` (1-indexed) is
//!
//! ```text
//! DCG = g_1 + Σ_{i=2..m} g_i / log2(i)
//! ```
//!
//! so the first two positions are undiscounted. NDCG@n divides the DCG of
//! the top n retrieved documents by the DCG of the ideal ranking cut at n.
//! The ideal ranking is drawn from every judged document of the test
//! collection, not only the retrieved ones.

use std::hash::Hash;

use crate::qrels::JudgmentSet;

/// DCG of a gain sequence in rank order.
pub fn dcg(gains: &[f64]) -> f64 {
    gains
        .iter()
        .enumerate()
        .map(|(idx, &gain)| {
            let rank = idx + 1;
            if rank == 1 {
                gain
            } else {
                gain / (rank as f64).log2()
            }
        })
        .sum()
}

/// The best achievable gain sequence of length at most `cutoff` for a query.
///
/// Gains are gathered over `all_doc_ids` and sorted descending.
pub fn ideal_gains<D: Eq + Hash>(
    query_id: &str,
    judgments: &JudgmentSet<D>,
    all_doc_ids: &[D],
    cutoff: usize,
) -> Vec<f64> {
    let Some(judged) = judgments.for_query(query_id) else {
        return Vec::new();
    };
    let mut gains: Vec<f64> = all_doc_ids
        .iter()
        .filter_map(|id| judged.get(id).copied())
        .collect();
    gains.sort_by(|a, b| b.total_cmp(a));
    gains.truncate(cutoff);
    gains
}

/// NDCG@`cutoff` of `retrieved`, a top-to-bottom list of `(doc_id, gain)`.
///
/// The ideal ranking is always cut at `cutoff`, so a ranking shorter than
/// the cutoff is charged for the ranks it leaves empty. Entries past the
/// cutoff are ignored. Returns 0 when the query has no judgments or its
/// ideal DCG is 0.
pub fn ndcg<D: Eq + Hash>(
    query_id: &str,
    retrieved: &[(D, f64)],
    judgments: &JudgmentSet<D>,
    all_doc_ids: &[D],
    cutoff: usize,
) -> f64 {
    if !judgments.contains_query(query_id) {
        return 0.0;
    }

    let ideal = ideal_gains(query_id, judgments, all_doc_ids, cutoff);
    let ideal_dcg = dcg(&ideal);
    if ideal_dcg <= 0.0 {
        return 0.0;
    }

    let gains: Vec<f64> = retrieved
        .iter()
        .take(cutoff)
        .map(|(_, gain)| *gain)
        .collect();
    dcg(&gains) / ideal_dcg
}
