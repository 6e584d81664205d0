//! Relevance judgment files.
//!
//! Every non-blank line holds exactly three whitespace-separated tokens:
//! `query_id document_id gain`. The gain must be a finite, non-negative
//! number. Any other shape is rejected with
//! [`Error::MalformedJudgment`](crate::error::Error::MalformedJudgment).
//! That includes the four-column TREC form `query_id 0 document_id gain`;
//! its iteration column has to be stripped before the file is used.

use std::{
    collections::HashMap,
    hash::Hash,
    io::BufRead,
    path::Path,
    str::FromStr,
};

use crate::{
    corpus_io,
    error::{Error, Result},
};

/// One `(query, document, gain)` line of a judgment file.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub query_id: String,
    pub doc_id: String,
    pub gain: f64,
}

/// Parse one judgment line. Blank lines yield `Ok(None)`.
///
/// `line_no` is 1-indexed and only used for error reporting.
pub fn parse_line(
    line: &str,
    path: &Path,
    line_no: usize,
) -> Result<Option<Judgment>> {
    let malformed = || Error::MalformedJudgment {
        path: path.to_path_buf(),
        line: line_no,
        found: line.to_string(),
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Ok(None),
        [query_id, doc_id, gain] => {
            let gain: f64 = gain.parse().map_err(|_| malformed())?;
            if !gain.is_finite() || gain < 0.0 {
                return Err(malformed());
            }
            Ok(Some(Judgment {
                query_id: query_id.to_string(),
                doc_id: doc_id.to_string(),
                gain,
            }))
        }
        _ => Err(malformed()),
    }
}

/// Read every judgment in file order.
pub fn read_judgments(path: &Path) -> Result<Vec<Judgment>> {
    let reader = corpus_io::open_for_read(path)?;
    let mut judgments = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io_at(path, e))?;
        if let Some(judgment) = parse_line(&line, path, idx + 1)? {
            judgments.push(judgment);
        }
    }
    Ok(judgments)
}

/// Judgments indexed as `query -> document -> gain`.
///
/// A repeated `(query, document)` pair keeps the last gain read.
#[derive(Debug, Clone)]
pub struct JudgmentSet<D> {
    by_query: HashMap<String, HashMap<D, f64>>,
}

impl<D: Eq + Hash> JudgmentSet<D> {
    pub fn new() -> Self {
        Self {
            by_query: HashMap::new(),
        }
    }

    pub fn insert(&mut self, query_id: impl Into<String>, doc_id: D, gain: f64) {
        self.by_query
            .entry(query_id.into())
            .or_default()
            .insert(doc_id, gain);
    }

    /// All judged documents of a query, if the query has any judgment.
    pub fn for_query(&self, query_id: &str) -> Option<&HashMap<D, f64>> {
        self.by_query.get(query_id)
    }

    pub fn gain(&self, query_id: &str, doc_id: &D) -> Option<f64> {
        self.by_query.get(query_id)?.get(doc_id).copied()
    }

    pub fn contains_query(&self, query_id: &str) -> bool {
        self.by_query.contains_key(query_id)
    }

    /// Number of judged queries.
    pub fn num_queries(&self) -> usize {
        self.by_query.len()
    }
}

impl<D: Eq + Hash> Default for JudgmentSet<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Eq + Hash + FromStr> JudgmentSet<D> {
    /// Load a judgment file, parsing document IDs as `D`.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = corpus_io::open_for_read(path)?;
        let mut set = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io_at(path, e))?;
            let Some(judgment) = parse_line(&line, path, idx + 1)? else {
                continue;
            };
            let doc_id = judgment.doc_id.parse::<D>().map_err(|_| {
                Error::MalformedJudgment {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    found: line.clone(),
                }
            })?;
            set.insert(judgment.query_id, doc_id, judgment.gain);
        }
        Ok(set)
    }
}
