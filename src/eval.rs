//! Evaluation of one train/test split.
//!
//! Every query is scored against every test document with BM25 using the
//! training corpus statistics. The top `cutoff` documents with a positive
//! score form the retrieved ranking, and its NDCG@cutoff is computed against
//! the test judgments. A ranking shorter than the cutoff still counts
//! against the full ideal ranking.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    analyzer::{Analyzer, TermFreqs},
    bm25::{self, Bm25Params},
    config::CorpusConfig,
    corpus_io,
    cv,
    error::{Error, Result},
    index::{CorpusIndex, DocId, InvertedIndex},
    ndcg,
    qrels::JudgmentSet,
};

/// Ranking model and cutoff for an evaluation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOptions {
    pub params: Bm25Params,
    pub cutoff: usize,
}

impl EvalOptions {
    pub fn validate(&self) -> Result<()> {
        if self.cutoff == 0 {
            return Err(Error::InvalidParameter {
                name: "cutoff",
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        self.params.validate()
    }
}

/// A corpus loaded from its config together with its index.
#[derive(Debug)]
pub struct Collection {
    pub config: CorpusConfig,
    pub analyzer: Analyzer,
    pub index: InvertedIndex,
}

impl Collection {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = CorpusConfig::load(config_path)?;
        let analyzer = config.analyzer()?;
        let corpus = corpus_io::read_corpus(&config.corpus_file())?;
        let index = InvertedIndex::build(&corpus, &analyzer)?;
        debug!(
            config = %config_path.display(),
            docs = index.num_docs(),
            terms = index.vocabulary_size(),
            "built index"
        );
        Ok(Self {
            config,
            analyzer,
            index,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query_id: String,
    pub retrieved: usize,
    pub ndcg: f64,
}

/// Score every test document and keep the best `cutoff`.
///
/// Ordered by descending score, ties by ascending document ID. Documents
/// scoring 0 are not retrieved.
pub fn rank<R: CorpusIndex + ?Sized>(
    query: &TermFreqs,
    test: &InvertedIndex,
    train: &R,
    params: &Bm25Params,
    cutoff: usize,
) -> Vec<(DocId, f64)> {
    let mut scored: Vec<(DocId, f64)> = test
        .documents()
        .map(|doc| (doc.id, bm25::score(doc, query, test, train, params)))
        .filter(|&(_, score)| score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(cutoff);
    scored
}

/// Evaluate `queries` (query IDs counted from `query_id_start`).
pub fn evaluate_queries<R: CorpusIndex + ?Sized>(
    queries: &[String],
    query_id_start: u64,
    analyzer: &Analyzer,
    test: &InvertedIndex,
    train: &R,
    judgments: &JudgmentSet<DocId>,
    options: &EvalOptions,
) -> Vec<QueryResult> {
    let all_ids: Vec<DocId> = (0..test.num_docs()).collect();

    queries
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let query_id = (query_id_start + idx as u64).to_string();
            let query = analyzer.analyze(text);
            let ranking =
                rank(&query, test, train, &options.params, options.cutoff);
            let retrieved: Vec<(DocId, f64)> = ranking
                .iter()
                .map(|&(doc, _)| {
                    (doc, judgments.gain(&query_id, &doc).unwrap_or(0.0))
                })
                .collect();
            let ndcg = ndcg::ndcg(
                &query_id,
                &retrieved,
                judgments,
                &all_ids,
                options.cutoff,
            );
            debug!(
                query = %query_id,
                retrieved = retrieved.len(),
                ndcg,
                "evaluated query"
            );
            QueryResult {
                query_id,
                retrieved: retrieved.len(),
                ndcg,
            }
        })
        .collect()
}

/// Evaluate a test corpus against a training corpus and write the per-query
/// NDCG values to `result_path`.
pub fn evaluate(
    test_config: &Path,
    train_config: &Path,
    options: &EvalOptions,
    result_path: &Path,
) -> Result<Vec<QueryResult>> {
    options.validate()?;

    let test = Collection::load(test_config)?;
    let train = Collection::load(train_config)?;
    let judgments: JudgmentSet<DocId> =
        JudgmentSet::load(test.config.judgments_file()?)?;
    let queries = corpus_io::read_corpus(&test.config.queries_file())?;

    let results = evaluate_queries(
        &queries,
        test.config.query_id_start,
        &test.analyzer,
        &test.index,
        &train.index,
        &judgments,
        options,
    );

    let values: Vec<f64> = results.iter().map(|r| r.ndcg).collect();
    cv::write_result_vector(&values, result_path)?;

    info!(
        queries = values.len(),
        mean_ndcg = mean(&values),
        result = %result_path.display(),
        "evaluation finished"
    );
    Ok(results)
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
