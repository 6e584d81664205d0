//! TOML configuration.
//!
//! Corpus configs follow the layout of line-corpus toolkits:
//!
//! ```toml
//! prefix = "./data"
//! dataset = "apnews"
//! stop-words = "./data/lemur-stopwords.txt"
//! query-judgements = "./data/apnews/apnews-qrels.txt"
//! query-id-start = 1
//! ```
//!
//! Relative paths are used as written, i.e. against the working directory.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    analyzer::Analyzer,
    bm25::Bm25Params,
    corpus_io,
    error::{Error, Result},
};

pub mod keys {
    pub const PREFIX: &str = "prefix";
    pub const DATASET: &str = "dataset";
    pub const STOP_WORDS: &str = "stop-words";
    pub const QUERY_JUDGEMENTS: &str = "query-judgements";
    pub const QUERY_PATH: &str = "query-path";
    pub const QUERY_ID_START: &str = "query-id-start";
}

/// Untyped key-value settings loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    table: toml::Table,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io_at(path, e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text)?;
        Ok(Self { table })
    }

    /// Write the settings, creating missing parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(&self.table)?;
        let mut out = corpus_io::create_for_write(path)?;
        out.write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| Error::io_at(path, e))?;
        Ok(())
    }

    /// A string setting with surrounding `"` removed.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.table
            .get(key)
            .and_then(toml::Value::as_str)
            .map(|s| s.trim_matches('"'))
    }

    /// An integer setting, also accepted as a (quoted) numeric string.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        let Some(value) = self.table.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            toml::Value::Integer(i) => u64::try_from(*i).ok(),
            toml::Value::String(s) => s.trim_matches('"').parse().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| {
            Error::Config(format!("`{key}` must be a non-negative integer"))
        })
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.table
            .insert(key.to_string(), toml::Value::String(value.into()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| Error::NotFound {
            kind: "config key",
            name: key.to_string(),
        })
    }
}

/// Directory under a dataset that holds its generated folds.
pub const FOLD_ROOT_DIR: &str = "resampled";

/// A line corpus described by a [`Settings`] file.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub settings: Settings,
    pub prefix: PathBuf,
    pub dataset: String,
    pub stop_words: Option<PathBuf>,
    pub query_judgements: Option<PathBuf>,
    pub query_path: Option<PathBuf>,
    pub query_id_start: u64,
}

impl CorpusConfig {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_settings(Settings::load(path)?)
    }

    pub fn from_settings(settings: Settings) -> Result<Self> {
        let prefix = PathBuf::from(settings.require_str(keys::PREFIX)?);
        let dataset = settings.require_str(keys::DATASET)?.to_string();
        let path_of = |key: &str| settings.get_str(key).map(PathBuf::from);
        let stop_words = path_of(keys::STOP_WORDS);
        let query_judgements = path_of(keys::QUERY_JUDGEMENTS);
        let query_path = path_of(keys::QUERY_PATH);
        let query_id_start = settings.get_u64(keys::QUERY_ID_START)?.unwrap_or(1);

        Ok(Self {
            settings,
            prefix,
            dataset,
            stop_words,
            query_judgements,
            query_path,
            query_id_start,
        })
    }

    /// `{prefix}/{dataset}`
    pub fn dataset_dir(&self) -> PathBuf {
        self.prefix.join(&self.dataset)
    }

    /// `{prefix}/{dataset}/{dataset}.dat`
    pub fn corpus_file(&self) -> PathBuf {
        self.dataset_dir().join(format!("{}.dat", self.dataset))
    }

    pub fn queries_file(&self) -> PathBuf {
        self.query_path.clone().unwrap_or_else(|| {
            self.dataset_dir()
                .join(format!("{}-queries.txt", self.dataset))
        })
    }

    pub fn judgments_file(&self) -> Result<&Path> {
        self.query_judgements.as_deref().ok_or_else(|| Error::NotFound {
            kind: "config key",
            name: keys::QUERY_JUDGEMENTS.to_string(),
        })
    }

    /// Where cross-validation folds of this corpus live.
    pub fn fold_root(&self) -> PathBuf {
        self.dataset_dir().join(FOLD_ROOT_DIR)
    }

    pub fn analyzer(&self) -> Result<Analyzer> {
        match &self.stop_words {
            Some(path) => Analyzer::with_stop_word_file(path),
            None => Ok(Analyzer::default()),
        }
    }
}

fn default_folds() -> usize {
    10
}

fn default_cutoff() -> usize {
    10
}

/// Settings for one cross-validation experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Directory holding one subdirectory per training set.
    pub root: PathBuf,
    #[serde(default = "default_folds")]
    pub folds: usize,
    #[serde(default)]
    pub seed: u64,
    /// Split every set into folds before evaluating.
    #[serde(default)]
    pub make_folds: bool,
    /// Evaluate every fold before averaging.
    #[serde(default)]
    pub compute_evals: bool,
    /// NDCG cutoff rank.
    #[serde(default = "default_cutoff")]
    pub cutoff: usize,
    #[serde(default)]
    pub bm25: Bm25Params,
}

impl ExperimentConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            folds: default_folds(),
            seed: 0,
            make_folds: false,
            compute_evals: false,
            cutoff: default_cutoff(),
            bm25: Bm25Params::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io_at(path, e))?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.folds < 2 {
            return Err(Error::InvalidParameter {
                name: "folds",
                value: self.folds.to_string(),
                reason: "cross-validation needs at least 2 folds",
            });
        }
        if self.cutoff == 0 {
            return Err(Error::InvalidParameter {
                name: "cutoff",
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        self.bm25.validate()
    }
}
