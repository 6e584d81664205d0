use std::path::{Path, PathBuf};

use rankfold::{
    Bm25Params,
    config::{CorpusConfig, ExperimentConfig, Settings, keys},
    cv,
    eval::{self, EvalOptions},
    experiment,
    folds,
};

const DOCS: &str = "\
rust ownership and borrowing rules
python scripting for data analysis
garden soil and compost for vegetables
rust async runtimes and futures
watering vegetables in dry summers
python notebooks and plotting
borrowing checker errors in rust
compost heaps need turning
";

const QUERIES: &str = "\
rust borrowing
compost soil
python plotting
";

const QRELS: &str = "\
1 0 2
1 6 2
1 3 1
2 2 2
2 7 1
3 5 2
3 1 1
";

/// Write a toy corpus under `dir` and return its config path.
fn write_corpus(dir: &Path) -> PathBuf {
    let data = dir.join("data").join("toy");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("toy.dat"), DOCS).unwrap();
    std::fs::write(data.join("toy-queries.txt"), QUERIES).unwrap();
    std::fs::write(data.join("toy-qrels.txt"), QRELS).unwrap();

    let mut settings = Settings::default();
    settings.set_str(keys::PREFIX, dir.join("data").to_string_lossy());
    settings.set_str(keys::DATASET, "toy");
    settings.set_str(
        keys::QUERY_JUDGEMENTS,
        data.join("toy-qrels.txt").to_string_lossy(),
    );
    let path = dir.join("toy.toml");
    settings.save(&path).unwrap();
    path
}

fn options() -> EvalOptions {
    EvalOptions {
        params: Bm25Params::default(),
        cutoff: 10,
    }
}

#[test]
fn split_evaluate_aggregate() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CorpusConfig::load(&write_corpus(tmp.path())).unwrap();

    let written = folds::split(&config, 4, 3).unwrap();
    assert_eq!(written.len(), 4);

    for fold in &written {
        let results = eval::evaluate(
            &fold.test_config,
            &fold.train_config,
            &options(),
            &fold.result,
        )
        .unwrap();
        assert_eq!(results.len(), 3);
        for r in &results {
            assert!((0.0..=1.0 + 1e-12).contains(&r.ndcg), "{r:?}");
        }
        assert_eq!(cv::read_result_vector(&fold.result).unwrap().len(), 3);
    }

    let output = tmp.path().join(cv::CV_RESULT_FILE);
    let mean = cv::aggregate(&config.fold_root(), &output, Some(4)).unwrap();
    assert_eq!(mean.len(), 3);
    assert!(mean.iter().all(|v| (0.0..=1.0 + 1e-12).contains(v)));
    assert_eq!(cv::read_result_vector(&output).unwrap(), mean);

    assert!(cv::aggregate(&config.fold_root(), &output, Some(5)).is_err());
}

#[test]
fn folds_split_the_judgments() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CorpusConfig::load(&write_corpus(tmp.path())).unwrap();

    let written = folds::split(&config, 2, 0).unwrap();
    let mut test_docs = 0;
    let mut judgments = 0;
    for fold in &written {
        let test = CorpusConfig::load(&fold.test_config).unwrap();
        test_docs += rankfold::corpus_io::read_corpus(&test.corpus_file())
            .unwrap()
            .len();
        judgments +=
            rankfold::corpus_io::read_corpus(test.judgments_file().unwrap())
                .unwrap()
                .len();
    }

    assert_eq!(test_docs, 8);
    assert_eq!(judgments, 7);
}

#[test]
fn experiment_runs_every_set() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("sets");
    let set_a = root.join("a");
    let set_b = root.join("b");
    write_corpus(&set_a);
    write_corpus(&set_b);
    // no config file: skipped
    std::fs::create_dir_all(root.join("c")).unwrap();

    let mut config = ExperimentConfig::new(&root);
    config.folds = 2;
    config.seed = 5;
    config.make_folds = true;
    config.compute_evals = true;

    let outcomes = experiment::run(&config).unwrap();
    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    // same corpus and seed in both sets
    assert_eq!(outcomes[0].mean, outcomes[1].mean);
    assert_eq!(outcomes[0].mean.len(), 3);
    assert_eq!(outcomes[0].cv_result, set_a.join(cv::CV_RESULT_FILE));
    assert_eq!(
        cv::read_result_vector(&set_b.join(cv::CV_RESULT_FILE)).unwrap(),
        outcomes[1].mean
    );
}

#[test]
fn experiment_detects_stale_fold_count() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("sets");
    write_corpus(&root.join("a"));

    let mut config = ExperimentConfig::new(&root);
    config.folds = 3;
    config.make_folds = true;
    config.compute_evals = true;
    experiment::run(&config).unwrap();

    // averaging alone against a different fold count
    config.folds = 2;
    config.make_folds = false;
    config.compute_evals = false;
    assert!(experiment::run(&config).is_err());
}

#[test]
fn experiment_resplits_with_fewer_folds() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("sets");
    write_corpus(&root.join("a"));

    let mut config = ExperimentConfig::new(&root);
    config.folds = 3;
    config.make_folds = true;
    config.compute_evals = true;
    experiment::run(&config).unwrap();

    config.folds = 2;
    let outcomes = experiment::run(&config).unwrap();
    assert_eq!(outcomes.len(), 1);

    let fold_root = CorpusConfig::load(&outcomes[0].config)
        .unwrap()
        .fold_root();
    assert_eq!(folds::list_folds(&fold_root).unwrap().len(), 2);
}
