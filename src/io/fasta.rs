//! FASTA contig reader.
//!
//! `>` header lines begin a new contig whose name is the header body up to the
//! first whitespace; subsequent lines concatenate the sequence. Transparent gzip
//! decompression mirrors the teacher's `seqkmer::reader::dyn_reader`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{IndexError, Result};
use crate::reference::ReferenceGenome;

fn open_maybe_gzipped(path: &Path) -> Result<Box<dyn Read>> {
    let mut file = File::open(path).map_err(|_| IndexError::InputMissing {
        path: path.to_path_buf(),
    })?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic).map_err(|_| IndexError::InputMissing {
        path: path.to_path_buf(),
    })?;
    let file = File::open(path).map_err(|_| IndexError::InputMissing {
        path: path.to_path_buf(),
    })?;
    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Parses one FASTA file into `genome`, grouping every contig in the file under the
/// chromosome key `chrom_name` (files under `<genomeName>/*.fa` typically hold the
/// contigs of one physical chromosome or scaffold).
pub fn load_fasta_file(path: &Path, chrom_name: &str, genome: &mut ReferenceGenome) -> Result<()> {
    let reader = open_maybe_gzipped(path)?;
    let mut lines = BufReader::new(reader).lines();

    let mut current_name: Option<String> = None;
    let mut current_seq: Vec<u8> = Vec::new();
    let mut line_no = 0usize;

    while let Some(line) = lines.next() {
        line_no += 1;
        let line = line.map_err(|e| IndexError::InputMalformed {
            path: path.to_path_buf(),
            line: line_no,
            reason: e.to_string(),
        })?;
        if let Some(header) = line.strip_prefix('>') {
            if let Some(name) = current_name.take() {
                genome.insert_contig(chrom_name, &name, std::mem::take(&mut current_seq));
            }
            let name = header
                .split_whitespace()
                .next()
                .unwrap_or(header)
                .to_string();
            current_name = Some(name);
        } else if current_name.is_some() {
            current_seq.extend(line.trim_end().bytes());
        } else if !line.trim().is_empty() {
            return Err(IndexError::InputMalformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: "sequence data before any '>' header".to_string(),
            });
        }
    }
    if let Some(name) = current_name.take() {
        genome.insert_contig(chrom_name, &name, current_seq);
    }
    Ok(())
}

/// Loads every `*.fa`/`*.fa.gz` file anywhere under `genome_dir`, using each file's
/// stem as the chromosome grouping key. Walks recursively (`walkdir`) since genome
/// directories are commonly laid out one subdirectory per chromosome.
pub fn load_genome_directory(genome_dir: &Path) -> Result<ReferenceGenome> {
    let mut genome = ReferenceGenome::new();

    let mut paths: Vec<_> = walkdir::WalkDir::new(genome_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".fa") || n.ends_with(".fa.gz"))
                .unwrap_or(false)
        })
        .collect();
    if paths.is_empty() {
        return Err(IndexError::InputMissing {
            path: genome_dir.to_path_buf(),
        });
    }
    paths.sort();

    for path in paths {
        let chrom = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("chrom")
            .to_string();
        load_fasta_file(&path, &chrom, &mut genome)?;
    }
    Ok(genome)
}
