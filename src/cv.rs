//! Averaging per-fold result vectors.
//!
//! A result file holds one number per line, no header. All folds must
//! produce vectors of the same length with the same positional meaning;
//! the average is taken element-wise over the folds actually read.

use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    corpus_io,
    error::{Error, Result},
    folds,
};

pub const CV_RESULT_FILE: &str = "cv_result.txt";

/// Read a dense result vector. Blank lines are ignored.
pub fn read_result_vector(path: &Path) -> Result<Vec<f64>> {
    let reader = corpus_io::open_for_read(path)?;
    let mut values = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io_at(path, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = trimmed.parse::<f64>().map_err(|_| Error::MalformedResult {
            path: path.to_path_buf(),
            line: idx + 1,
            value: line.clone(),
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Write one value per line, creating parent directories.
pub fn write_result_vector(values: &[f64], path: &Path) -> Result<()> {
    let mut out = corpus_io::create_for_write(path)?;
    for value in values {
        writeln!(out, "{value}").map_err(|e| Error::io_at(path, e))?;
    }
    out.flush().map_err(|e| Error::io_at(path, e))?;
    Ok(())
}

/// Element-wise mean of `(source, vector)` pairs.
///
/// Every vector must have the length of the first one.
pub fn average(vectors: &[(PathBuf, Vec<f64>)]) -> Result<Vec<f64>> {
    let Some((_, first)) = vectors.first() else {
        return Ok(Vec::new());
    };
    let mut sum = vec![0.0; first.len()];

    for (path, values) in vectors {
        if values.len() != sum.len() {
            return Err(Error::FoldLengthMismatch {
                path: path.clone(),
                expected: sum.len(),
                found: values.len(),
            });
        }
        for (acc, value) in sum.iter_mut().zip(values) {
            *acc += value;
        }
    }

    let count = vectors.len() as f64;
    Ok(sum.into_iter().map(|s| s / count).collect())
}

/// Average the `result.txt` of every fold directory under `fold_root`.
///
/// With `expected_folds`, the number of fold directories must match it.
pub fn average_folds(
    fold_root: &Path,
    expected_folds: Option<usize>,
) -> Result<Vec<f64>> {
    let fold_dirs = folds::list_folds(fold_root)?;
    if fold_dirs.is_empty() {
        return Err(Error::NoFolds(fold_root.to_path_buf()));
    }
    if let Some(expected) = expected_folds
        && expected != fold_dirs.len()
    {
        return Err(Error::FoldCountMismatch {
            expected,
            found: fold_dirs.len(),
        });
    }

    let mut vectors = Vec::with_capacity(fold_dirs.len());
    for fold in fold_dirs {
        if !fold.result.is_file() {
            return Err(Error::NotFound {
                kind: "fold result",
                name: fold.result.display().to_string(),
            });
        }
        let values = read_result_vector(&fold.result)?;
        debug!(path = %fold.result.display(), values = values.len(), "read fold result");
        vectors.push((fold.result, values));
    }

    average(&vectors)
}

/// Average the folds under `fold_root` and write the result to `output`.
pub fn aggregate(
    fold_root: &Path,
    output: &Path,
    expected_folds: Option<usize>,
) -> Result<Vec<f64>> {
    let mean = average_folds(fold_root, expected_folds)?;
    write_result_vector(&mean, output)?;
    info!(
        values = mean.len(),
        output = %output.display(),
        "wrote cross-validation average"
    );
    Ok(mean)
}
