use std::{collections::BTreeMap, path::Path};

use tantivy::tokenizer::{
    Language,
    LowerCaser,
    RemoveLongFilter,
    SimpleTokenizer,
    Stemmer,
    StopWordFilter,
    TextAnalyzer,
    TokenStream,
};

use crate::{corpus_io, error::Result};

/// Term string to occurrence count for one document or query.
pub type TermFreqs = BTreeMap<String, u64>;

/// Tokens longer than this (in bytes) are discarded.
const MAX_TOKEN_LEN: usize = 40;

/// Turns raw text into a bag of stemmed, lowercased, stop-word-filtered
/// terms.
#[derive(Clone)]
pub struct Analyzer {
    inner: TextAnalyzer,
}

impl Analyzer {
    /// Build an analyzer that drops the given stop words.
    ///
    /// Stop words are matched after lowercasing and before stemming.
    pub fn new(stop_words: Vec<String>) -> Self {
        let inner = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
            .filter(LowerCaser)
            .filter(StopWordFilter::remove(stop_words))
            .filter(Stemmer::new(Language::English))
            .build();
        Self { inner }
    }

    /// Build an analyzer from a stop-word file (one word per line).
    pub fn with_stop_word_file(path: &Path) -> Result<Self> {
        let words = corpus_io::read_corpus(path)?
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Ok(Self::new(words))
    }

    /// The underlying tantivy pipeline, for registering with an index.
    pub fn text_analyzer(&self) -> TextAnalyzer {
        self.inner.clone()
    }

    /// Count the terms of `text`.
    pub fn analyze(&self, text: &str) -> TermFreqs {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut freqs = TermFreqs::new();
        while stream.advance() {
            *freqs.entry(stream.token().text.clone()).or_insert(0) += 1;
        }
        freqs
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}
