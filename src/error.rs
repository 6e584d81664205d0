use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("could not serialize TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(
        "malformed judgment at {path}:{line}: expected `query doc gain`, got {found:?}"
    )]
    MalformedJudgment {
        path: PathBuf,
        line: usize,
        found: String,
    },

    #[error("malformed result value at {path}:{line}: {value:?}")]
    MalformedResult {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error(
        "fold result {path} has {found} values, expected {expected} like the first fold"
    )]
    FoldLengthMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("expected {expected} folds, found {found}")]
    FoldCountMismatch { expected: usize, found: usize },

    #[error("no fold results found under {0}")]
    NoFolds(PathBuf),

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl Error {
    /// Attach the path an I/O error happened at.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoAt {
            path: path.into(),
            source,
        }
    }
}
