//! rankfold - offline ranking evaluation over line corpora.
//!
//! A corpus is a plain text file with one document per line; a document's ID
//! is its zero-based line number. rankfold splits such a corpus into
//! cross-validation folds, ranks each held-out fold with BM25 using the
//! statistics of the remaining documents, scores the rankings with NDCG
//! against graded relevance judgments, and averages the per-query results
//! over all folds.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rankfold::config::CorpusConfig;
//! use rankfold::eval::{self, EvalOptions};
//! use rankfold::{Bm25Params, folds};
//!
//! let config = CorpusConfig::load(Path::new("data/cran.toml")).unwrap();
//! let options = EvalOptions {
//!     params: Bm25Params::default(),
//!     cutoff: 10,
//! };
//!
//! for fold in folds::split(&config, 10, 0).unwrap() {
//!     let results = eval::evaluate(
//!         &fold.test_config,
//!         &fold.train_config,
//!         &options,
//!         &fold.result,
//!     )
//!     .unwrap();
//!     println!("{}: {} queries", fold.dir.display(), results.len());
//! }
//! ```

pub mod analyzer;
pub mod bm25;
pub mod config;
pub mod corpus_io;
pub mod cv;
pub mod error;
pub mod eval;
pub mod experiment;
pub mod folds;
pub mod index;
pub mod multimap;
pub mod ndcg;
pub mod qrels;
pub mod remap;

pub use analyzer::Analyzer;
pub use bm25::Bm25Params;
pub use error::{Error, Result};
pub use index::{CorpusIndex, InvertedIndex};
pub use multimap::OrderedMultiMap;
pub use qrels::JudgmentSet;
