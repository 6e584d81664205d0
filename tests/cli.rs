use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use rankfold::config::{Settings, keys};

const DOCS: &str = "\
rust ownership and borrowing rules
python scripting for data analysis
garden soil and compost for vegetables
rust async runtimes and futures
compost heaps need turning
python notebooks and plotting
";

const QUERIES: &str = "\
rust borrowing
compost soil
";

const QRELS: &str = "\
1 0 2
1 3 1
2 2 2
2 4 1
";

fn write_corpus(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let data = dir.join("data").join("toy");
    std::fs::create_dir_all(&data)?;
    std::fs::write(data.join("toy.dat"), DOCS)?;
    std::fs::write(data.join("toy-queries.txt"), QUERIES)?;
    std::fs::write(data.join("toy-qrels.txt"), QRELS)?;

    let mut settings = Settings::default();
    settings.set_str(keys::PREFIX, dir.join("data").to_string_lossy());
    settings.set_str(keys::DATASET, "toy");
    settings.set_str(
        keys::QUERY_JUDGEMENTS,
        data.join("toy-qrels.txt").to_string_lossy(),
    );
    let path = dir.join("toy.toml");
    settings.save(&path)?;
    Ok(path)
}

fn rankfold(args: &[&Path]) -> Result<Output, Box<dyn std::error::Error>> {
    let output = Command::new(rankfold_bin()?)
        .arg("-q")
        .args(args)
        .env_remove("RANKFOLD_LOG")
        .output()?;
    assert!(
        output.status.success(),
        "rankfold {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(output)
}

#[test]
fn split_evaluate_aggregate_through_the_binary()
-> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    let config = write_corpus(tempdir.path())?;

    let split = rankfold(&[
        Path::new("split"),
        &config,
        Path::new("--folds"),
        Path::new("2"),
    ])?;
    let fold_dirs: Vec<PathBuf> = String::from_utf8(split.stdout)?
        .lines()
        .map(PathBuf::from)
        .collect();
    assert_eq!(fold_dirs.len(), 2);

    for dir in &fold_dirs {
        let evaluate = rankfold(&[
            Path::new("evaluate"),
            &dir.join("test_fold.toml"),
            &dir.join("train_fold.toml"),
            Path::new("--result"),
            &dir.join("result.txt"),
            Path::new("--json"),
        ])?;
        let results: serde_json::Value =
            serde_json::from_slice(&evaluate.stdout)?;
        let results = results.as_array().expect("results array");
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].get("query_id").and_then(|v| v.as_str()),
            Some("1")
        );
        for r in results {
            let ndcg = r.get("ndcg").and_then(|v| v.as_f64()).expect("ndcg");
            assert!((0.0..=1.0).contains(&ndcg), "{r}");
        }
        assert!(dir.join("result.txt").exists());
    }

    let fold_root = fold_dirs[0].parent().expect("fold root");
    let aggregate = rankfold(&[
        Path::new("aggregate"),
        fold_root,
        Path::new("--expect-folds"),
        Path::new("2"),
        Path::new("--json"),
    ])?;
    let mean: Vec<f64> = serde_json::from_slice(&aggregate.stdout)?;
    assert_eq!(mean.len(), 2);
    assert!(fold_root.join("cv_result.txt").exists());

    Ok(())
}

#[test]
fn remap_writes_mapping_files() -> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    let qrels = tempdir.path().join("qrels.txt");
    std::fs::write(&qrels, "Q1 D7 2\nQ1 D9 1\nQ2 D1 1\n")?;
    let fold = tempdir.path().join("fold.txt");
    std::fs::write(&fold, "D9\nD7\n")?;
    let target = tempdir.path().join("out");

    let remap = rankfold(&[Path::new("remap"), &qrels, &fold, &target])?;
    let stdout = String::from_utf8(remap.stdout)?;
    assert!(stdout.contains("dropped 1"), "{stdout}");

    assert_eq!(
        std::fs::read_to_string(target.join("qmap.txt"))?,
        "D9,0\nD7,1\n"
    );
    assert_eq!(
        std::fs::read_to_string(target.join("qrels-sampled.txt"))?,
        "Q1 0 1\nQ1 1 2\n"
    );
    Ok(())
}

#[test]
fn malformed_judgments_fail_with_an_error() {
    let tempdir = tempfile::tempdir().unwrap();
    let qrels = tempdir.path().join("qrels.txt");
    std::fs::write(&qrels, "Q1 0 D7 2\n").unwrap();
    let fold = tempdir.path().join("fold.txt");
    std::fs::write(&fold, "D7\n").unwrap();

    let target = tempdir.path().join("out");

    let output = Command::new(rankfold_bin().unwrap())
        .arg("remap")
        .arg(&qrels)
        .arg(&fold)
        .arg(&target)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
    assert!(!target.join("qrels-sampled.txt").exists());
}

fn rankfold_bin() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_rankfold") {
        return Ok(PathBuf::from(bin));
    }

    let mut path = std::env::current_exe()?;
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("rankfold");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    Ok(path)
}
