//! Reading and writing line corpora, one document or entry per line.

use std::{
    collections::HashSet,
    fs::File,
    hash::Hash,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::error::{Error, Result};

/// Open `path` for writing, creating any missing parent directories.
pub fn create_for_write(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io_at(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io_at(path, e))?;
    Ok(BufWriter::new(file))
}

/// Open `path` for buffered reading.
pub fn open_for_read(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
    Ok(BufReader::new(file))
}

/// Read a line corpus: one document per line, line terminators stripped.
pub fn read_corpus(path: &Path) -> Result<Vec<String>> {
    let reader = open_for_read(path)?;
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line.map_err(|e| Error::io_at(path, e))?);
    }
    Ok(lines)
}

/// Write one document per line.
pub fn write_corpus<S: AsRef<str>>(lines: &[S], path: &Path) -> Result<()> {
    let mut out = create_for_write(path)?;
    for line in lines {
        writeln!(out, "{}", line.as_ref())
            .map_err(|e| Error::io_at(path, e))?;
    }
    out.flush().map_err(|e| Error::io_at(path, e))?;
    Ok(())
}

/// Elements of `full` that do not occur in `sub`, in `full`'s order.
pub fn complement<T: Clone + Eq + Hash>(full: &[T], sub: &[T]) -> Vec<T> {
    let exclude: HashSet<&T> = sub.iter().collect();
    full.iter()
        .filter(|item| !exclude.contains(item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a").join("b").join("corpus.dat");

        write_corpus(&["first doc", "second doc"], &path).unwrap();

        assert!(path.exists());
        assert_eq!(read_corpus(&path).unwrap(), vec!["first doc", "second doc"]);
    }

    #[test]
    fn read_missing_file_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.dat");

        let err = read_corpus(&path).unwrap_err();
        assert!(err.to_string().contains("nope.dat"));
    }

    #[test]
    fn empty_corpus_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.dat");

        write_corpus::<&str>(&[], &path).unwrap();
        assert!(read_corpus(&path).unwrap().is_empty());
    }

    #[test]
    fn complement_keeps_order() {
        let full = vec![5, 3, 9, 1, 7];
        let sub = vec![9, 5];
        assert_eq!(complement(&full, &sub), vec![3, 1, 7]);
    }

    #[test]
    fn complement_of_everything_is_empty() {
        let full = vec!["a", "b"];
        assert!(complement(&full, &full).is_empty());
    }
}
