use std::fs::{self, File};
use std::io::BufWriter;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use reptax::aggregate::{self, aggregate_lca, build_instance_class_map};
use reptax::args::{BuildArgs, Cli, ClassifyArgs, Command};
use reptax::classify::classify_reads_parallel;
use reptax::index::MinimizerIndex;
use reptax::io::fasta::load_genome_directory;
use reptax::io::reads::{read_ground_truth_file, read_proc_file};
use reptax::io::repeatmasker::load_repeatmasker_file;
use reptax::kmer_enum::enumerate_all;
use reptax::reference::RepeatInstances;
use reptax::report::{verify_against_ground_truth, write_class_tree_json, write_classification_stream};
use reptax::taxonomy::{ClassTree, ClassTreeBuilder};
use reptax::Result;

const INDEX_FILE: &str = "index.bin";
const INDEX_DUMP_FILE: &str = "index.txt";
/// Class-tree rows (`id`/`name`/`parent`/`depth`), the internal format `classify`
/// reloads to reconstruct the tree. Distinct from the human-facing recursive
/// `{name, size, children}` report written to `CLASS_TREE_REPORT_FILE`.
const CLASS_TREE_ROWS_FILE: &str = "tree.json";
/// Optional recursive JSON class-tree report (`--emit-json-tree`).
const CLASS_TREE_REPORT_FILE: &str = "classes.json";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Build(args) => run_build(&args),
        Command::Classify(args) => run_classify(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_build(args: &BuildArgs) -> Result<()> {
    args.validate()?;

    info!("loading reference genome from {}", args.genome_dir.display());
    let genome = load_genome_directory(&args.genome_dir)?;
    info!(
        "loaded {} chromosome(s), {} contig(s)",
        genome.chrom_count(),
        genome.contig_count()
    );

    info!(
        "parsing RepeatMasker annotation {}",
        args.repeatmasker_out.display()
    );
    let mut tree_builder = ClassTreeBuilder::new();
    let mut instances = RepeatInstances::new();
    load_repeatmasker_file(&args.repeatmasker_out, |instance| {
        tree_builder.insert(&instance.class_path);
        instances.push(instance);
    })?;
    let tree = tree_builder.build();
    info!(
        "{} repeat instance(s) across {} class(es)",
        instances.len(),
        tree.node_count()
    );

    let instance_class = build_instance_class_map(&instances, &tree);
    let occurrences = enumerate_all(&genome, instances.iter(), args.kmer.k);
    let table = aggregate_lca(occurrences, &tree, &instance_class);
    info!("{} distinct canonical k-mer(s) observed", table.len());

    let index = MinimizerIndex::build(&table, args.kmer.k, args.kmer.m);
    info!(
        "built index: {} record(s) across {} minimizer bucket(s)",
        index.len(),
        index.bucket_count()
    );

    fs::create_dir_all(&args.output_dir).map_err(|e| reptax::IndexError::OutputFailure {
        path: args.output_dir.clone(),
        source: e,
    })?;

    let index_path = args.output_dir.join(INDEX_FILE);
    let mut writer = BufWriter::new(File::create(&index_path).map_err(|e| {
        reptax::IndexError::OutputFailure {
            path: index_path.clone(),
            source: e,
        }
    })?);
    index
        .write_binary(&mut writer)
        .map_err(|e| reptax::IndexError::OutputFailure {
            path: index_path.clone(),
            source: e,
        })?;

    if args.dump_text {
        let dump_path = args.output_dir.join(INDEX_DUMP_FILE);
        let mut writer = BufWriter::new(File::create(&dump_path).map_err(|e| {
            reptax::IndexError::OutputFailure {
                path: dump_path.clone(),
                source: e,
            }
        })?);
        index
            .write_dump(&mut writer, &tree)
            .map_err(|e| reptax::IndexError::OutputFailure {
                path: dump_path.clone(),
                source: e,
            })?;
    }

    // The class-tree rows are always written; `classify` needs them to reload the
    // tree independently of whether a human-facing report was requested.
    let rows_path = args.output_dir.join(CLASS_TREE_ROWS_FILE);
    let rows_file = File::create(&rows_path).map_err(|e| reptax::IndexError::OutputFailure {
        path: rows_path.clone(),
        source: e,
    })?;
    serde_json::to_writer(rows_file, &tree.to_rows()).map_err(|e| {
        reptax::IndexError::OutputFailure {
            path: rows_path,
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        }
    })?;

    if args.emit_json_tree {
        let kmer_counts = aggregate::count_kmers_by_class(&table);
        let report_path = args.output_dir.join(CLASS_TREE_REPORT_FILE);
        let writer = BufWriter::new(File::create(&report_path).map_err(|e| {
            reptax::IndexError::OutputFailure {
                path: report_path.clone(),
                source: e,
            }
        })?);
        write_class_tree_json(writer, &tree, &kmer_counts, args.cumulative_size).map_err(|e| {
            reptax::IndexError::OutputFailure {
                path: report_path,
                source: e,
            }
        })?;
    }

    info!("build complete: {}", args.output_dir.display());
    Ok(())
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    args.validate()?;

    let index_path = args.index_dir.join(INDEX_FILE);
    info!("loading index from {}", index_path.display());
    let index_file = File::open(&index_path).map_err(|_| reptax::IndexError::InputMissing {
        path: index_path.clone(),
    })?;
    let index = MinimizerIndex::read_binary(std::io::BufReader::new(index_file)).map_err(|e| {
        reptax::IndexError::InputMalformed {
            path: index_path,
            line: 0,
            reason: e.to_string(),
        }
    })?;

    let rows_path = args.index_dir.join(CLASS_TREE_ROWS_FILE);
    let rows_json = fs::read_to_string(&rows_path).map_err(|_| reptax::IndexError::InputMissing {
        path: rows_path.clone(),
    })?;
    let rows = serde_json::from_str(&rows_json).map_err(|e| reptax::IndexError::InputMalformed {
        path: rows_path,
        line: 0,
        reason: e.to_string(),
    })?;
    let tree = ClassTree::from_rows(rows);

    info!("reading reads from {}", args.reads.display());
    let reads: Vec<_> = read_proc_file(&args.reads)?.collect::<Result<Vec<_>>>()?;
    info!("classifying {} read(s) with {} thread(s)", reads.len(), args.threads);

    let results = classify_reads_parallel(reads, args.kmer.k, &index, &tree, args.threads);

    let output_file = File::create(&args.output).map_err(|e| reptax::IndexError::OutputFailure {
        path: args.output.clone(),
        source: e,
    })?;
    write_classification_stream(BufWriter::new(output_file), &results, &tree).map_err(|e| {
        reptax::IndexError::OutputFailure {
            path: args.output.clone(),
            source: e,
        }
    })?;

    if let Some(truth_path) = &args.ground_truth {
        let truth = read_ground_truth_file(truth_path)?;
        let summary = verify_against_ground_truth(&results, &truth, &tree);
        info!(
            "verification: {}/{} exact, {} ancestor, {} mismatch, {} unclassified (accuracy {:.4})",
            summary.exact_matches,
            summary.total,
            summary.ancestor_matches,
            summary.mismatches,
            summary.unclassified,
            summary.accuracy()
        );
    }

    info!("classification complete: {}", args.output.display());
    Ok(())
}
