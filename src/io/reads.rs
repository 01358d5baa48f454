//! Read-stream adapters: the pre-chunked `.proc` read format fed to the classifier,
//! and a SAM-like ground-truth reader used only to score classification accuracy.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{IndexError, Result};

/// One read awaiting classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub id: String,
    pub sequence: Vec<u8>,
}

/// Streams a `.proc` file: `<readId>\t<sequence>` one read per line, blank lines
/// skipped. Returns an iterator so the producer side of the classification pipeline
/// can read lazily rather than materializing the whole file.
pub fn read_proc_file(path: &Path) -> Result<impl Iterator<Item = Result<Read>>> {
    let file = File::open(path).map_err(|_| IndexError::InputMissing {
        path: path.to_path_buf(),
    })?;
    let path = path.to_path_buf();
    let lines = BufReader::new(file).lines();
    Ok(lines.enumerate().filter_map(move |(idx, line)| {
        let line_no = idx + 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                return Some(Err(IndexError::InputMalformed {
                    path: path.clone(),
                    line: line_no,
                    reason: e.to_string(),
                }))
            }
        };
        if line.trim().is_empty() {
            return None;
        }
        let mut parts = line.splitn(2, '\t');
        let (Some(id), Some(seq)) = (parts.next(), parts.next()) else {
            return Some(Err(IndexError::InputMalformed {
                path: path.clone(),
                line: line_no,
                reason: "expected '<readId>\\t<sequence>'".to_string(),
            }));
        };
        Some(Ok(Read {
            id: id.to_string(),
            sequence: seq.as_bytes().to_vec(),
        }))
    }))
}

/// One ground-truth row: a read ID paired with the repeat class path it should be
/// assigned, read from a SAM-like `<readId>\t<classPath>` verification file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruthEntry {
    pub read_id: String,
    pub expected_class_path: String,
}

pub fn read_ground_truth_file(path: &Path) -> Result<Vec<GroundTruthEntry>> {
    let file = File::open(path).map_err(|_| IndexError::InputMissing {
        path: path.to_path_buf(),
    })?;
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| IndexError::InputMalformed {
            path: path.to_path_buf(),
            line: line_no,
            reason: e.to_string(),
        })?;
        if line.trim().is_empty() || line.starts_with('@') {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let (Some(read_id), Some(class_path)) = (parts.next(), parts.next()) else {
            return Err(IndexError::InputMalformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: "expected '<readId>\\t<classPath>'".to_string(),
            });
        };
        out.push(GroundTruthEntry {
            read_id: read_id.to_string(),
            expected_class_path: class_path.trim().to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str, suffix: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "reptax_reads_test_{}_{}.txt",
            std::process::id(),
            suffix
        ));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn streams_reads_skipping_blank_lines() {
        let path = write_temp("r1\tACGT\n\nr2\tTTTT\n", "proc");
        let reads: Vec<Read> = read_proc_file(&path)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0].id, "r1");
        assert_eq!(reads[1].sequence, b"TTTT".to_vec());
    }

    #[test]
    fn rejects_malformed_proc_line() {
        let path = write_temp("justoneword\n", "badproc");
        let err = read_proc_file(&path)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, IndexError::InputMalformed { .. }));
    }

    #[test]
    fn parses_ground_truth_skipping_comments() {
        let path = write_temp("@header\nr1\tLINE/L1/L1ME1\n", "truth");
        let entries = read_ground_truth_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].expected_class_path, "LINE/L1/L1ME1");
    }
}
