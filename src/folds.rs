//! Cross-validation folds over a line corpus.
//!
//! Fold `n` (1-based) of a corpus lives in `{prefix}/{dataset}/resampled/fold_n/`:
//!
//! ```text
//! fold_n/
//!   test_fold.toml        corpus config of the held-out documents
//!   train_fold.toml       corpus config of the remaining documents
//!   test/test.dat         held-out documents, in fold order
//!   test/qmap.txt         original,new document IDs
//!   test/qrels-sampled.txt
//!   train/train.dat
//!   result.txt            per-query metric values, once evaluated
//! ```

use std::path::{Path, PathBuf};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{debug, info};

use crate::{
    config::{CorpusConfig, FOLD_ROOT_DIR, keys},
    corpus_io,
    error::{Error, Result},
    qrels,
    remap::{self, SAMPLED_QRELS_FILE},
};

pub const TEST_DATASET: &str = "test";
pub const TRAIN_DATASET: &str = "train";
pub const TEST_CONFIG: &str = "test_fold.toml";
pub const TRAIN_CONFIG: &str = "train_fold.toml";
pub const RESULT_FILE: &str = "result.txt";

/// Deal `0..num_docs` into `k` disjoint folds after a seeded shuffle.
///
/// Fold sizes differ by at most one and each fold is sorted ascending.
pub fn generate_folds(
    num_docs: usize,
    k: usize,
    seed: u64,
) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(Error::InvalidParameter {
            name: "folds",
            value: k.to_string(),
            reason: "cross-validation needs at least 2 folds",
        });
    }
    if k > num_docs {
        return Err(Error::InvalidParameter {
            name: "folds",
            value: k.to_string(),
            reason: "more folds than documents",
        });
    }

    let mut ids: Vec<usize> = (0..num_docs).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);

    let mut folds = vec![Vec::with_capacity(num_docs / k + 1); k];
    for (i, id) in ids.into_iter().enumerate() {
        folds[i % k].push(id);
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// File locations of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPaths {
    pub dir: PathBuf,
    pub test_config: PathBuf,
    pub train_config: PathBuf,
    pub result: PathBuf,
}

impl FoldPaths {
    pub fn new(fold_root: &Path, number: usize) -> Self {
        Self::in_dir(fold_root.join(format!("fold_{number}")))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self {
            test_config: dir.join(TEST_CONFIG),
            train_config: dir.join(TRAIN_CONFIG),
            result: dir.join(RESULT_FILE),
            dir,
        }
    }

    pub fn test_dir(&self) -> PathBuf {
        self.dir.join(TEST_DATASET)
    }

    pub fn train_dir(&self) -> PathBuf {
        self.dir.join(TRAIN_DATASET)
    }
}

/// Fold directories under `fold_root`, sorted by name.
pub fn list_folds(fold_root: &Path) -> Result<Vec<FoldPaths>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(fold_root)
        .map_err(|e| Error::io_at(fold_root, e))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs.into_iter().map(FoldPaths::in_dir).collect())
}

/// Remove the folds of an earlier split so none outlive a smaller `k`.
///
/// Only a directory named like a fold root is ever removed.
fn clear_fold_root(fold_root: &Path) -> Result<()> {
    if !fold_root.exists() {
        return Ok(());
    }
    if fold_root.file_name().and_then(|n| n.to_str()) != Some(FOLD_ROOT_DIR) {
        return Err(Error::InvalidParameter {
            name: "fold root",
            value: fold_root.display().to_string(),
            reason: "refusing to clear a directory that is not a fold root",
        });
    }
    std::fs::remove_dir_all(fold_root)
        .map_err(|e| Error::io_at(fold_root, e))?;
    debug!(root = %fold_root.display(), "cleared previous folds");
    Ok(())
}

/// Write the corpora, remapped judgments and configs of every fold.
///
/// `folds` holds line indices into the corpus of `config`; those indices
/// are also the document IDs its judgment file uses. Any folds already
/// under the fold root are removed first.
pub fn write_fold_data(
    config: &CorpusConfig,
    folds: &[Vec<usize>],
) -> Result<Vec<FoldPaths>> {
    let corpus = corpus_io::read_corpus(&config.corpus_file())?;
    let judgments = qrels::read_judgments(config.judgments_file()?)?;
    let all: Vec<usize> = (0..corpus.len()).collect();
    let fold_root = config.fold_root();
    let queries = config.queries_file();

    if let Some(&bad) = folds.iter().flatten().find(|&&d| d >= corpus.len()) {
        return Err(Error::InvalidParameter {
            name: "fold",
            value: bad.to_string(),
            reason: "document index outside the corpus",
        });
    }
    clear_fold_root(&fold_root)?;

    let mut written = Vec::with_capacity(folds.len());
    for (idx, fold) in folds.iter().enumerate() {
        let paths = FoldPaths::new(&fold_root, idx + 1);
        let train = corpus_io::complement(&all, fold);

        let test_lines: Vec<&str> =
            fold.iter().map(|&d| corpus[d].as_str()).collect();
        let train_lines: Vec<&str> =
            train.iter().map(|&d| corpus[d].as_str()).collect();
        corpus_io::write_corpus(
            &test_lines,
            &paths.test_dir().join(format!("{TEST_DATASET}.dat")),
        )?;
        corpus_io::write_corpus(
            &train_lines,
            &paths.train_dir().join(format!("{TRAIN_DATASET}.dat")),
        )?;

        let original_ids: Vec<String> =
            fold.iter().map(ToString::to_string).collect();
        let remapping = remap::remap(&judgments, &original_ids)?;
        remap::write_remapping(&remapping, &paths.test_dir())?;

        let prefix = paths.dir.to_string_lossy().into_owned();
        let query_path = queries.to_string_lossy().into_owned();

        let mut test_settings = config.settings.clone();
        test_settings.set_str(keys::PREFIX, prefix.clone());
        test_settings.set_str(keys::DATASET, TEST_DATASET);
        test_settings.set_str(
            keys::QUERY_JUDGEMENTS,
            paths
                .test_dir()
                .join(SAMPLED_QRELS_FILE)
                .to_string_lossy()
                .into_owned(),
        );
        test_settings.set_str(keys::QUERY_PATH, query_path.clone());
        test_settings.save(&paths.test_config)?;

        let mut train_settings = config.settings.clone();
        train_settings.set_str(keys::PREFIX, prefix);
        train_settings.set_str(keys::DATASET, TRAIN_DATASET);
        train_settings.set_str(keys::QUERY_PATH, query_path);
        train_settings.save(&paths.train_config)?;

        debug!(
            fold = idx + 1,
            test_docs = fold.len(),
            train_docs = train.len(),
            dropped_judgments = remapping.dropped,
            "wrote fold"
        );
        written.push(paths);
    }

    info!(
        folds = written.len(),
        root = %fold_root.display(),
        "wrote cross-validation folds"
    );
    Ok(written)
}

/// Split the corpus of `config` into `k` folds and write them out.
pub fn split(
    config: &CorpusConfig,
    k: usize,
    seed: u64,
) -> Result<Vec<FoldPaths>> {
    let num_docs = corpus_io::read_corpus(&config.corpus_file())?.len();
    let folds = generate_folds(num_docs, k, seed)?;
    write_fold_data(config, &folds)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::config::Settings;

    #[test]
    fn folds_partition_the_documents() {
        let folds = generate_folds(23, 5, 7).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen = HashSet::new();
        for fold in &folds {
            assert!(fold.len() == 4 || fold.len() == 5);
            assert!(fold.windows(2).all(|w| w[0] < w[1]));
            for &d in fold {
                assert!(seen.insert(d), "document {d} in two folds");
            }
        }
        assert_eq!(seen.len(), 23);
    }

    #[test]
    fn folds_are_reproducible_for_a_seed() {
        assert_eq!(
            generate_folds(40, 4, 11).unwrap(),
            generate_folds(40, 4, 11).unwrap()
        );
    }

    #[test]
    fn fold_count_is_validated() {
        assert!(generate_folds(10, 1, 0).is_err());
        assert!(generate_folds(3, 4, 0).is_err());
        assert!(generate_folds(4, 4, 0).is_ok());
    }

    fn fixture(dir: &Path) -> CorpusConfig {
        let data = dir.join("data").join("toy");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            data.join("toy.dat"),
            "doc zero\ndoc one\ndoc two\ndoc three\n",
        )
        .unwrap();
        std::fs::write(data.join("toy-queries.txt"), "doc\n").unwrap();
        std::fs::write(data.join("qrels.txt"), "1 0 1\n1 2 2\n1 3 1\n").unwrap();

        let mut settings = Settings::default();
        settings.set_str(keys::PREFIX, dir.join("data").to_string_lossy());
        settings.set_str(keys::DATASET, "toy");
        settings.set_str(
            keys::QUERY_JUDGEMENTS,
            data.join("qrels.txt").to_string_lossy(),
        );
        CorpusConfig::from_settings(settings).unwrap()
    }

    #[test]
    fn writes_fold_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fixture(tmp.path());

        let paths =
            write_fold_data(&config, &[vec![2, 0], vec![1, 3]]).unwrap();
        assert_eq!(paths.len(), 2);

        let first = &paths[0];
        assert_eq!(first.dir, config.fold_root().join("fold_1"));
        assert_eq!(
            corpus_io::read_corpus(&first.test_dir().join("test.dat")).unwrap(),
            vec!["doc two", "doc zero"]
        );
        assert_eq!(
            corpus_io::read_corpus(&first.train_dir().join("train.dat"))
                .unwrap(),
            vec!["doc one", "doc three"]
        );
        assert_eq!(
            corpus_io::read_corpus(&first.test_dir().join(SAMPLED_QRELS_FILE))
                .unwrap(),
            vec!["1 0 2", "1 1 1"]
        );

        let test_config = CorpusConfig::load(&first.test_config).unwrap();
        assert_eq!(test_config.corpus_file(), first.test_dir().join("test.dat"));
        assert_eq!(test_config.queries_file(), config.queries_file());
        assert_eq!(
            test_config.judgments_file().unwrap(),
            first.test_dir().join(SAMPLED_QRELS_FILE)
        );

        let train_config = CorpusConfig::load(&first.train_config).unwrap();
        assert_eq!(
            train_config.corpus_file(),
            first.train_dir().join("train.dat")
        );
    }

    #[test]
    fn out_of_range_fold_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fixture(tmp.path());
        assert!(write_fold_data(&config, &[vec![0, 9]]).is_err());
    }

    #[test]
    fn resplit_removes_stale_folds() {
        let tmp = tempfile::tempdir().unwrap();
        let config = fixture(tmp.path());

        split(&config, 3, 0).unwrap();
        let stale = config.fold_root().join("fold_3");
        std::fs::write(stale.join(RESULT_FILE), "1\n").unwrap();
        let written = split(&config, 2, 0).unwrap();

        let listed = list_folds(&config.fold_root()).unwrap();
        assert_eq!(listed, written);
        assert_eq!(listed.len(), 2);
        assert!(!stale.exists());
    }

    #[test]
    fn only_fold_roots_are_cleared() {
        let tmp = tempfile::tempdir().unwrap();
        let keep = tmp.path().join("important");
        std::fs::create_dir(&keep).unwrap();

        assert!(clear_fold_root(&keep).is_err());
        assert!(keep.exists());
        clear_fold_root(&tmp.path().join(FOLD_ROOT_DIR)).unwrap();
    }

    #[test]
    fn list_folds_is_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["fold_2", "fold_1", "fold_3"] {
            std::fs::create_dir(tmp.path().join(name)).unwrap();
        }
        std::fs::write(tmp.path().join("stray.txt"), "").unwrap();

        let folds = list_folds(tmp.path()).unwrap();
        let names: Vec<_> = folds
            .iter()
            .map(|f| f.dir.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["fold_1", "fold_2", "fold_3"]);
    }
}
