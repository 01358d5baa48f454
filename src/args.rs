//! Command-line surface: a `clap` derive `Args`/`Subcommand` pair, grounded in the
//! teacher's `kr2r::args` (shared flag groups via `#[clap(flatten)]`, validation
//! performed once up front rather than scattered through the subcommands).

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::codec::MAX_K;
use crate::error::{IndexError, Result};

#[derive(Debug, Parser)]
#[command(name = "reptax", about = "Kraken-style LCA classifier for repeat families")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Builds a minimizer index from a reference genome and RepeatMasker annotation.
    Build(BuildArgs),
    /// Classifies a stream of reads against a previously built index.
    Classify(ClassifyArgs),
}

#[derive(Debug, ClapArgs)]
pub struct KmerArgs {
    /// K-mer length, at most 32 (must fit a single 64-bit packed word).
    #[arg(short = 'k', long, default_value_t = 31)]
    pub k: usize,
    /// Minimizer length; must not exceed `k`.
    #[arg(short = 'm', long, default_value_t = 15)]
    pub m: usize,
}

impl KmerArgs {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 || self.k > MAX_K {
            return Err(IndexError::ConfigInvalid {
                reason: format!("k must be in 1..={MAX_K}, got {}", self.k),
            });
        }
        if self.m == 0 || self.m > self.k {
            return Err(IndexError::ConfigInvalid {
                reason: format!("m must be in 1..=k ({}), got {}", self.k, self.m),
            });
        }
        Ok(())
    }
}

#[derive(Debug, ClapArgs)]
pub struct BuildArgs {
    #[command(flatten)]
    pub kmer: KmerArgs,

    /// Directory containing the reference genome's `*.fa`/`*.fa.gz` files.
    #[arg(long)]
    pub genome_dir: PathBuf,

    /// RepeatMasker `.out` annotation file for the same genome.
    #[arg(long)]
    pub repeatmasker_out: PathBuf,

    /// Directory to write the built index and class-tree export into.
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Also write a plain-text index dump alongside the binary index.
    #[arg(long, default_value_t = false)]
    pub dump_text: bool,

    /// Also write the class tree as JSON (`{name, size, children}`) alongside the
    /// binary index.
    #[arg(long, default_value_t = false)]
    pub emit_json_tree: bool,

    /// When emitting the JSON class tree, report each node's `size` as the
    /// cumulative count over it and its descendants rather than its own count.
    #[arg(long, default_value_t = false)]
    pub cumulative_size: bool,
}

impl BuildArgs {
    pub fn validate(&self) -> Result<()> {
        self.kmer.validate()
    }
}

#[derive(Debug, ClapArgs)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub kmer: KmerArgs,

    /// Directory holding a previously built index (as written by `build`).
    #[arg(long)]
    pub index_dir: PathBuf,

    /// `.proc` file of reads to classify, one read per line.
    #[arg(long)]
    pub reads: PathBuf,

    /// Optional ground-truth file to score classification accuracy against.
    #[arg(long)]
    pub ground_truth: Option<PathBuf>,

    /// Where to write the `<readId>\t<classPath>` classification stream.
    #[arg(long)]
    pub output: PathBuf,

    /// Worker thread count for the classification pipeline.
    #[arg(long, default_value_t = num_cpus::get() as u32)]
    pub threads: u32,
}

impl ClassifyArgs {
    pub fn validate(&self) -> Result<()> {
        self.kmer.validate()?;
        if self.threads == 0 {
            return Err(IndexError::ConfigInvalid {
                reason: "threads must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
