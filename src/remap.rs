//! Re-express relevance judgments in the ID space of a resampled fold.
//!
//! The position of a document in the fold becomes its new zero-based ID.
//! Two files are written into the target directory:
//!
//! - [`MAPPING_FILE`]: `original_id,new_id` per fold document, in fold order.
//! - [`SAMPLED_QRELS_FILE`]: `query_id new_id gain`, grouped by query ID in
//!   ascending string order. Within one query, lines follow the fold scan
//!   (so ascending new ID), and judgments of the same document keep file
//!   order.
//!
//! Judgments for documents outside the fold are dropped.

use std::{
    collections::HashSet,
    io::Write,
    path::Path,
};

use tracing::debug;

use crate::{
    corpus_io,
    error::{Error, Result},
    multimap::OrderedMultiMap,
    qrels::{self, Judgment},
};

pub const MAPPING_FILE: &str = "qmap.txt";
pub const SAMPLED_QRELS_FILE: &str = "qrels-sampled.txt";

/// The remapped view of one fold.
#[derive(Debug, Clone)]
pub struct Remapping {
    /// `(original_id, new_id)` in fold order.
    pub mapping: Vec<(String, u64)>,
    /// `query_id -> [(new_id, gain)]`.
    pub judgments: OrderedMultiMap<String, (u64, f64)>,
    /// Judgments whose document is not part of the fold.
    pub dropped: usize,
}

/// Remap `judgments` onto the documents of `fold`.
///
/// Fails if a document ID occurs more than once in `fold`.
pub fn remap<S: AsRef<str>>(
    judgments: &[Judgment],
    fold: &[S],
) -> Result<Remapping> {
    let mut by_doc: OrderedMultiMap<&str, (&str, f64)> = OrderedMultiMap::new();
    for j in judgments {
        by_doc.insert(j.doc_id.as_str(), (j.query_id.as_str(), j.gain));
    }

    let mut seen = HashSet::with_capacity(fold.len());
    let mut mapping = Vec::with_capacity(fold.len());
    let mut remapped = OrderedMultiMap::new();

    for (new_id, original) in fold.iter().enumerate() {
        let original = original.as_ref();
        if !seen.insert(original) {
            return Err(Error::InvalidParameter {
                name: "fold",
                value: original.to_string(),
                reason: "document appears more than once in the fold",
            });
        }
        let new_id = new_id as u64;
        mapping.push((original.to_string(), new_id));

        for &(query_id, gain) in by_doc.get(original) {
            remapped.insert(query_id.to_string(), (new_id, gain));
        }
    }

    let dropped = judgments.len() - remapped.value_count();
    Ok(Remapping {
        mapping,
        judgments: remapped,
        dropped,
    })
}

/// Write the mapping and remapped judgment files into `target_dir`.
pub fn write_remapping(remapping: &Remapping, target_dir: &Path) -> Result<()> {
    let map_path = target_dir.join(MAPPING_FILE);
    let mut out = corpus_io::create_for_write(&map_path)?;
    for (original, new_id) in &remapping.mapping {
        writeln!(out, "{original},{new_id}")
            .map_err(|e| Error::io_at(&map_path, e))?;
    }
    out.flush().map_err(|e| Error::io_at(&map_path, e))?;

    let qrels_path = target_dir.join(SAMPLED_QRELS_FILE);
    let mut out = corpus_io::create_for_write(&qrels_path)?;
    for (query_id, entries) in &remapping.judgments {
        for (new_id, gain) in entries {
            writeln!(out, "{query_id} {new_id} {gain}")
                .map_err(|e| Error::io_at(&qrels_path, e))?;
        }
    }
    out.flush().map_err(|e| Error::io_at(&qrels_path, e))?;

    Ok(())
}

/// Read `qrels_path`, remap it onto `fold` and write both output files.
pub fn remap_file<S: AsRef<str>>(
    qrels_path: &Path,
    fold: &[S],
    target_dir: &Path,
) -> Result<Remapping> {
    let judgments = qrels::read_judgments(qrels_path)?;
    let remapping = remap(&judgments, fold)?;
    write_remapping(&remapping, target_dir)?;

    debug!(
        fold_size = fold.len(),
        kept = remapping.judgments.value_count(),
        dropped = remapping.dropped,
        target = %target_dir.display(),
        "remapped judgments"
    );
    Ok(remapping)
}
