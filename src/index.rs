//! Corpus statistics consumed by the scorer.
//!
//! [`CorpusIndex`] is the read-only view a ranking function needs over an
//! inverted index. [`InvertedIndex`] implements it on an in-RAM tantivy
//! index built from a line corpus. The line number of a document is its
//! [`DocId`]; term IDs are tantivy term ordinals and only mean something to
//! the index that issued them. An index is immutable once built, so
//! statistics stay fixed for a whole scoring pass.

use std::sync::Arc;

use tantivy::{
    DocSet,
    Index,
    IndexWriter,
    InvertedIndexReader,
    TERMINATED,
    doc,
    indexer::NoMergePolicy,
    postings::Postings,
    schema::{
        FAST,
        Field,
        IndexRecordOption,
        Schema,
        TextFieldIndexing,
        TextOptions,
    },
    tokenizer::{TextAnalyzer, WhitespaceTokenizer},
};

use crate::{
    analyzer::{Analyzer, TermFreqs},
    error::{Error, Result},
};

/// Document identifier, dense and zero-based within one collection.
pub type DocId = u64;

/// Term identifier. Only meaningful for the index that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u64);

impl TermId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Read-only corpus statistics.
pub trait CorpusIndex {
    /// Number of documents in the collection.
    fn num_docs(&self) -> u64;

    /// Mean document length in terms; 0 for an empty collection.
    fn avg_doc_length(&self) -> f64;

    /// Number of documents containing `term`.
    fn doc_freq(&self, term: TermId) -> u64;

    /// Occurrences of `term` in document `doc`.
    fn term_freq(&self, term: TermId, doc: DocId) -> u64;

    /// Identifier of `term` in this index's vocabulary.
    fn term_id(&self, term: &str) -> Option<TermId>;
}

/// A document as handed to the scorer: its ID and its term counts.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub id: DocId,
    pub terms: &'a TermFreqs,
}

impl Document<'_> {
    /// Total number of term occurrences.
    pub fn length(&self) -> u64 {
        self.terms.values().sum()
    }
}

mod fields {
    pub const DOC_ID: &str = "doc_id";
    pub const BODY: &str = "body";
}

const TOKENIZER: &str = "rankfold";
const WRITER_MEMORY_BUDGET: usize = 50_000_000;

fn build_schema() -> (Schema, Field, Field) {
    let mut builder = Schema::builder();
    let doc_id = builder.add_u64_field(fields::DOC_ID, FAST);
    let body_opts = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqs),
    );
    let body = builder.add_text_field(fields::BODY, body_opts);
    (builder.build(), doc_id, body)
}

#[derive(Clone, Default)]
pub struct InvertedIndex {
    /// Term dictionary of the single segment; `None` for an empty corpus.
    terms: Option<Arc<InvertedIndexReader>>,
    /// Postings per term ordinal: `(doc, count)` sorted by document.
    postings: Vec<Vec<(DocId, u64)>>,
    /// Forward index: term counts per document ID.
    documents: Vec<TermFreqs>,
    total_tokens: u64,
}

impl InvertedIndex {
    /// Analyze and index each text; its position becomes its document ID.
    pub fn build<S: AsRef<str>>(
        texts: &[S],
        analyzer: &Analyzer,
    ) -> Result<Self> {
        Self::index_texts(
            texts.iter().map(|t| t.as_ref().to_string()),
            texts.len(),
            analyzer.text_analyzer(),
        )
    }

    /// Index already analyzed documents, keeping their terms verbatim.
    pub fn from_term_freqs(documents: &[TermFreqs]) -> Result<Self> {
        let texts = documents.iter().map(|terms| {
            let mut text = String::new();
            for (term, &count) in terms {
                for _ in 0..count {
                    text.push_str(term);
                    text.push(' ');
                }
            }
            text
        });
        let verbatim = TextAnalyzer::builder(WhitespaceTokenizer::default())
            .build();
        Self::index_texts(texts, documents.len(), verbatim)
    }

    fn index_texts(
        texts: impl Iterator<Item = String>,
        num_docs: usize,
        analyzer: TextAnalyzer,
    ) -> Result<Self> {
        let (schema, doc_id, body) = build_schema();
        let index = Index::create_in_ram(schema);
        index.tokenizers().register(TOKENIZER, analyzer);

        let mut writer: IndexWriter =
            index.writer_with_num_threads(1, WRITER_MEMORY_BUDGET)?;
        writer.set_merge_policy(Box::new(NoMergePolicy));
        for (id, text) in texts.enumerate() {
            writer.add_document(doc!(
                doc_id => id as u64,
                body => text,
            ))?;
        }
        writer.commit()?;

        // Term ordinals are per segment, so everything goes into one.
        let segments = index.searchable_segment_ids()?;
        if segments.len() > 1 {
            writer.merge(&segments).wait()?;
        }
        writer.wait_merging_threads()?;

        let searcher = index.reader()?.searcher();
        let mut this = Self {
            documents: vec![TermFreqs::new(); num_docs],
            ..Self::default()
        };
        let Some(segment) = searcher.segment_readers().first() else {
            return Ok(this);
        };

        let ids = segment.fast_fields().u64(fields::DOC_ID)?;
        let inverted = segment.inverted_index(body)?;
        let mut stream = inverted.terms().stream()?;
        while stream.advance() {
            let term = std::str::from_utf8(stream.key())
                .map_err(|e| Error::Config(format!("non UTF-8 term: {e}")))?
                .to_string();
            let mut postings = inverted.read_postings_from_terminfo(
                stream.value(),
                IndexRecordOption::WithFreqs,
            )?;

            let mut list = Vec::with_capacity(stream.value().doc_freq as usize);
            let mut doc = postings.doc();
            while doc != TERMINATED {
                let Some(id) = ids.first(doc) else {
                    return Err(Error::NotFound {
                        kind: "document id",
                        name: doc.to_string(),
                    });
                };
                let count = u64::from(postings.term_freq());
                list.push((id, count));
                if let Some(terms) = this.documents.get_mut(id as usize) {
                    terms.insert(term.clone(), count);
                }
                doc = postings.advance();
            }
            list.sort_unstable();

            debug_assert_eq!(stream.term_ord() as usize, this.postings.len());
            this.postings.push(list);
        }
        drop(stream);

        this.total_tokens = inverted.total_num_tokens();
        this.terms = Some(inverted);
        Ok(this)
    }

    pub fn document(&self, id: DocId) -> Option<Document<'_>> {
        self.documents
            .get(id as usize)
            .map(|terms| Document { id, terms })
    }

    /// All documents in ID order.
    pub fn documents(&self) -> impl Iterator<Item = Document<'_>> {
        self.documents
            .iter()
            .enumerate()
            .map(|(id, terms)| Document {
                id: id as DocId,
                terms,
            })
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }
}

impl CorpusIndex for InvertedIndex {
    fn num_docs(&self) -> u64 {
        self.documents.len() as u64
    }

    fn avg_doc_length(&self) -> f64 {
        if self.documents.is_empty() {
            return 0.0;
        }
        self.total_tokens as f64 / self.documents.len() as f64
    }

    fn doc_freq(&self, term: TermId) -> u64 {
        self.postings
            .get(term.0 as usize)
            .map_or(0, |p| p.len() as u64)
    }

    fn term_freq(&self, term: TermId, doc: DocId) -> u64 {
        let Some(list) = self.postings.get(term.0 as usize) else {
            return 0;
        };
        list.binary_search_by_key(&doc, |&(d, _)| d)
            .map_or(0, |idx| list[idx].1)
    }

    fn term_id(&self, term: &str) -> Option<TermId> {
        // The dictionary lives in RAM; a read failure means "absent".
        let terms = self.terms.as_ref()?;
        terms.terms().term_ord(term).ok().flatten().map(TermId)
    }
}

impl std::fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedIndex")
            .field("num_docs", &self.documents.len())
            .field("vocabulary_size", &self.postings.len())
            .field("total_tokens", &self.total_tokens)
            .finish_non_exhaustive()
    }
}
