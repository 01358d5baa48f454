//! RepeatMasker `.out` annotation parser.
//!
//! The `.out` format is a fixed, whitespace-delimited column layout with a 3-line
//! header banner. Columns are 1-indexed in the source; the ones this parser reads
//! are named here rather than threaded through as magic numbers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{IndexError, Result};
use crate::reference::{RepeatInstance, RepeatInstances};

const HEADER_LINES: usize = 3;

// 0-indexed positions of the whitespace-split fields this parser consumes.
const COL_SEQ_NAME: usize = 4;
const COL_SEQ_START: usize = 5;
const COL_SEQ_END: usize = 6;
const COL_STRAND: usize = 8;
const COL_REPEAT_NAME: usize = 9;
const COL_REPEAT_CLASS: usize = 10;
const MIN_COLUMNS: usize = 11;

/// Parses a RepeatMasker `.out` file into a [`RepeatInstances`] arena, assigning
/// instance IDs by line order. `class_tree` already knows every repeat class path;
/// callers build it from the same file before (or while) calling this function.
pub fn load_repeatmasker_file(
    path: &Path,
    mut on_instance: impl FnMut(RepeatInstance),
) -> Result<()> {
    let file = File::open(path).map_err(|_| IndexError::InputMissing {
        path: path.to_path_buf(),
    })?;
    let reader = BufReader::new(file);

    let mut next_id = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        if line_no <= HEADER_LINES {
            continue;
        }
        let line = line.map_err(|e| IndexError::InputMalformed {
            path: path.to_path_buf(),
            line: line_no,
            reason: e.to_string(),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_COLUMNS {
            return Err(IndexError::InputMalformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!(
                    "expected at least {MIN_COLUMNS} whitespace-delimited columns, found {}",
                    fields.len()
                ),
            });
        }

        let seq_name = fields[COL_SEQ_NAME].to_string();
        let start_1based: usize = fields[COL_SEQ_START].parse().map_err(|_| {
            IndexError::InputMalformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("non-numeric seq_start: {}", fields[COL_SEQ_START]),
            }
        })?;
        let end_1based: usize = fields[COL_SEQ_END].parse().map_err(|_| {
            IndexError::InputMalformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("non-numeric seq_end: {}", fields[COL_SEQ_END]),
            }
        })?;
        if start_1based == 0 || end_1based < start_1based {
            return Err(IndexError::InputMalformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("invalid coordinate range {start_1based}-{end_1based}"),
            });
        }
        let is_complement = fields[COL_STRAND] == "C";
        let repeat_name = fields[COL_REPEAT_NAME];
        let repeat_class = fields[COL_REPEAT_CLASS];
        let class_path = format!("{repeat_class}/{repeat_name}");

        let instance = RepeatInstance {
            instance_id: next_id,
            seq_name,
            seq_start: start_1based - 1,
            seq_end: end_1based,
            is_complement,
            class_path,
            class_id: 0, // filled in once the class tree assigns this path an id
        };
        next_id += 1;
        on_instance(instance);
    }
    Ok(())
}

/// Convenience wrapper collecting every parsed instance into a [`RepeatInstances`]
/// arena, for callers that don't need streaming behavior.
pub fn load_repeatmasker_file_into_arena(
    path: &Path,
    arena: &mut RepeatInstances,
) -> Result<()> {
    load_repeatmasker_file(path, |instance| arena.push(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str, suffix: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "reptax_rm_test_{}_{}.out",
            std::process::id(),
            suffix
        ));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const SAMPLE: &str = "\
   SW   perc perc perc  query           position in query    matching      repeat          position in repeat
score   div. del. ins.  sequence        begin    end   (left) repeat        class/family    begin   end   (left)  ID

  200  10.0  0.0  0.0  chr1_ctg1        1      100  (900)  +  L1ME1          LINE/L1       1    100   (0)   1
  150  10.0  0.0  0.0  chr1_ctg1      200      300  (700)  C  AluY           SINE/Alu      1    100   (0)   2
";

    #[test]
    fn parses_forward_and_complement_strand() {
        let path = write_temp(SAMPLE, "ok");
        let mut instances = RepeatInstances::new();
        load_repeatmasker_file_into_arena(&path, &mut instances).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(instances.len(), 2);
        let first = instances.iter().next().unwrap();
        assert_eq!(first.seq_name, "chr1_ctg1");
        assert_eq!(first.seq_start, 0);
        assert_eq!(first.seq_end, 100);
        assert!(!first.is_complement);
        assert_eq!(first.class_path, "LINE/L1/L1ME1");

        let second = instances.iter().nth(1).unwrap();
        assert!(second.is_complement);
        assert_eq!(second.class_path, "SINE/Alu/AluY");
    }

    #[test]
    fn rejects_short_lines() {
        let path = write_temp("a\nb\nc\nd e f\n", "short");
        let mut instances = RepeatInstances::new();
        let err = load_repeatmasker_file_into_arena(&path, &mut instances).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, IndexError::InputMalformed { .. }));
    }
}
