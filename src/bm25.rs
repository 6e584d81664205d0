//! BM25 scoring of a test document against statistics of a training corpus.
//!
//! For every query term present in the document:
//!
//! ```text
//! avdl  = (train_avgdl * train_N + |d|) / (train_N + 1)
//! idf   = log2((train_N + 1) / train_df(w))
//! score += c(w,q) * c(w,d) * (k + 1) / (c(w,d) + k * (1 - b + b * |d| / avdl)) * idf
//! ```
//!
//! `avdl` treats the scored document as if it had been added to the
//! training set; it is recomputed for each document and never stored.
//! `c(w,d)` comes from the test index using the test vocabulary's term ID,
//! `train_df(w)` from the training index using the training vocabulary's
//! term ID. A term unknown to either index, or with a training document
//! frequency of zero, contributes nothing.

use serde::{Deserialize, Serialize};

use crate::{
    analyzer::TermFreqs,
    error::{Error, Result},
    index::{CorpusIndex, Document, TermId},
};

/// BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bm25Params {
    /// Term-frequency saturation, `k >= 0`.
    pub k: f64,
    /// Length normalization weight, `0 <= b <= 1`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k: 1.0, b: 0.5 }
    }
}

impl Bm25Params {
    pub fn new(k: f64, b: f64) -> Result<Self> {
        let params = Self { k, b };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(Error::InvalidParameter {
                name: "k",
                value: self.k.to_string(),
                reason: "must be a finite number >= 0",
            });
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidParameter {
                name: "b",
                value: self.b.to_string(),
                reason: "must lie in [0, 1]",
            });
        }
        Ok(())
    }
}

/// Inverse document frequency of a training-vocabulary term.
///
/// Returns `None` when the term occurs in no training document.
pub fn idf<I: CorpusIndex + ?Sized>(train_term: TermId, train: &I) -> Option<f64> {
    let df = train.doc_freq(train_term);
    if df == 0 {
        return None;
    }
    Some(((train.num_docs() + 1) as f64 / df as f64).log2())
}

/// Training-set average document length after adding a document of
/// `doc_length` terms.
pub fn adjusted_avg_doc_length<I: CorpusIndex + ?Sized>(
    train: &I,
    doc_length: u64,
) -> f64 {
    let n = train.num_docs() as f64;
    (train.avg_doc_length() * n + doc_length as f64) / (n + 1.0)
}

/// The BM25 term-frequency factor for one term.
fn tf_weight(
    query_count: f64,
    doc_count: f64,
    doc_length: f64,
    avdl: f64,
    params: &Bm25Params,
) -> f64 {
    let Bm25Params { k, b } = *params;
    query_count * doc_count * (k + 1.0)
        / (doc_count + k * (1.0 - b + b * doc_length / avdl))
}

/// Score `document` (from the test collection) for `query`.
pub fn score<T, R>(
    document: Document<'_>,
    query: &TermFreqs,
    test: &T,
    train: &R,
    params: &Bm25Params,
) -> f64
where
    T: CorpusIndex + ?Sized,
    R: CorpusIndex + ?Sized,
{
    let doc_length = document.length();
    let mut total = 0.0;
    let mut avdl = None;

    for (term, &query_count) in query {
        if query_count == 0 || !document.terms.contains_key(term) {
            continue;
        }
        let Some(test_term) = test.term_id(term) else {
            continue;
        };
        let Some(train_term) = train.term_id(term) else {
            continue;
        };
        let Some(term_idf) = idf(train_term, train) else {
            continue;
        };
        let doc_count = test.term_freq(test_term, document.id);
        if doc_count == 0 {
            continue;
        }

        let avdl =
            *avdl.get_or_insert_with(|| adjusted_avg_doc_length(train, doc_length));
        total += tf_weight(
            query_count as f64,
            doc_count as f64,
            doc_length as f64,
            avdl,
            params,
        ) * term_idf;
    }

    total
}
