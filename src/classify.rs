//! Read classification: per-read LCA fold over canonical k-mers, plus a bounded
//! producer/consumer pipeline for classifying a read stream concurrently.
//!
//! The pipeline shape — a fixed worker pool pulling off a bounded channel, writing
//! results to another bounded channel — mirrors the teacher's
//! `seqkmer::parallel::read_parallel`; the per-read algorithm itself is the spec's
//! simple direct fold rather than the teacher's weighted hit-group scoring.

use crossbeam_channel::{bounded, Receiver, Sender};
use scoped_threadpool::Pool;

use crate::codec::{canonical, encode_kmer};
use crate::index::MinimizerIndex;
use crate::io::reads::Read;
use crate::taxonomy::{ClassTree, ROOT_ID};

/// The outcome of classifying one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub read_id: String,
    pub class_id: u16,
}

/// Classifies a single read: folds the LCA of every recognized canonical k-mer's
/// class across the whole read, stopping as soon as the accumulator reaches the
/// root (root is absorbing — no further k-mer can raise it back down).
///
/// Returns `ROOT_ID` for a read shorter than `k`, or one in which no window's
/// canonical k-mer was present in the index.
pub fn classify_read(sequence: &[u8], k: usize, index: &MinimizerIndex, tree: &ClassTree) -> u16 {
    if sequence.len() < k {
        return ROOT_ID;
    }

    let mut acc: Option<u16> = None;
    for window in sequence.windows(k) {
        let Some(word) = encode_kmer(window) else {
            continue;
        };
        let canon = canonical(word, k);
        let Some(class) = index.contains(canon) else {
            continue;
        };
        acc = Some(match acc {
            None => class,
            Some(ROOT_ID) => break,
            Some(prev) => tree.lca(prev, class),
        });
        if acc == Some(ROOT_ID) {
            break;
        }
    }
    acc.unwrap_or(ROOT_ID)
}

/// Classifies `reads` using `threads` worker threads pulling from a bounded queue,
/// preserving no particular output order (callers that need input order should sort
/// by `read_id` afterward, as the teacher's report stage does).
pub fn classify_reads_parallel(
    reads: Vec<Read>,
    k: usize,
    index: &MinimizerIndex,
    tree: &ClassTree,
    threads: u32,
) -> Vec<ClassificationResult> {
    let queue_capacity = (reads.len().max(1)).min(4096);
    let (work_tx, work_rx): (Sender<Read>, Receiver<Read>) = bounded(queue_capacity);
    let (result_tx, result_rx): (Sender<ClassificationResult>, Receiver<ClassificationResult>) =
        bounded(queue_capacity);

    let mut pool = Pool::new(threads.max(1));
    pool.scoped(|scope| {
        scope.execute(move || {
            for read in reads {
                if work_tx.send(read).is_err() {
                    break;
                }
            }
        });

        for _ in 0..threads.max(1) {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.execute(move || {
                for read in work_rx {
                    let class_id = classify_read(&read.sequence, k, index, tree);
                    if result_tx
                        .send(ClassificationResult {
                            read_id: read.id,
                            class_id,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        result_rx.iter().collect()
    })
}
