//! Full cross-validation run over every training set of an experiment.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::{CorpusConfig, ExperimentConfig},
    cv,
    error::{Error, Result},
    eval::{self, EvalOptions},
    folds,
};

/// The averaged result of one training set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetOutcome {
    pub name: String,
    pub config: PathBuf,
    pub cv_result: PathBuf,
    pub mean: Vec<f64>,
}

/// The single `*.toml` file directly inside `set_dir`.
///
/// Returns `None` when there is none or more than one.
pub fn find_set_config(set_dir: &Path) -> Result<Option<PathBuf>> {
    let matcher = globset::Glob::new("*.toml")
        .map_err(|e| Error::Config(format!("invalid glob pattern: {e}")))?
        .compile_matcher();

    let mut found = Vec::new();
    for entry in
        std::fs::read_dir(set_dir).map_err(|e| Error::io_at(set_dir, e))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() && matcher.is_match(entry.file_name())
        {
            found.push(entry.path());
        }
    }

    match found.len() {
        1 => Ok(found.pop()),
        0 => {
            warn!(
                set = %set_dir.display(),
                "no config file in set directory, skipping"
            );
            Ok(None)
        }
        n => {
            warn!(
                set = %set_dir.display(),
                count = n,
                "multiple config files in set directory, skipping"
            );
            Ok(None)
        }
    }
}

fn set_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| Error::io_at(root, e))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Split, evaluate and average one set directory as `config` directs.
pub fn run_set(
    set_dir: &Path,
    set_config: &Path,
    config: &ExperimentConfig,
) -> Result<SetOutcome> {
    let corpus = CorpusConfig::load(set_config)?;

    if config.make_folds {
        folds::split(&corpus, config.folds, config.seed)?;
    }

    let fold_root = corpus.fold_root();
    if config.compute_evals {
        let options = EvalOptions {
            params: config.bm25,
            cutoff: config.cutoff,
        };
        for fold in folds::list_folds(&fold_root)? {
            eval::evaluate(
                &fold.test_config,
                &fold.train_config,
                &options,
                &fold.result,
            )?;
        }
    }

    let cv_result = set_dir.join(cv::CV_RESULT_FILE);
    let mean = cv::aggregate(&fold_root, &cv_result, Some(config.folds))?;

    Ok(SetOutcome {
        name: set_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        config: set_config.to_path_buf(),
        cv_result,
        mean,
    })
}

/// Run every set directory under `config.root`, in name order.
pub fn run(config: &ExperimentConfig) -> Result<Vec<SetOutcome>> {
    config.validate()?;

    let mut outcomes = Vec::new();
    for set_dir in set_dirs(&config.root)? {
        let Some(set_config) = find_set_config(&set_dir)? else {
            continue;
        };
        let outcome = run_set(&set_dir, &set_config, config)?;
        info!(
            set = %outcome.name,
            mean_ndcg = eval::mean(&outcome.mean),
            "set finished"
        );
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
