//! Lazy k-mer enumeration over repeat instances.
//!
//! Grounded in the teacher's `seqkmer::mmscanner` sliding-window scan: a window of
//! width `k` slides one base at a time across each instance's sequence, resetting
//! whenever it crosses a non-ACGT base rather than failing the whole instance.
//!
//! Every emitted word is canonicalized before storage, so a read drawn from either
//! genomic strand resolves to the same index entry during classification.

use crate::codec::{encode_kmer, MAX_K};
use crate::reference::{ReferenceGenome, RepeatInstance};

/// One encoded k-mer occurrence, already reverse-complemented to the instance's
/// reported strand and tagged with the repeat instance it was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerOccurrence {
    pub word: u64,
    pub instance_id: u64,
}

/// Enumerates every valid length-`k` window of `instance`'s sequence in `genome`,
/// skipping windows that touch an ambiguity base. Complement instances yield the
/// reverse-complement strand's bases in the order the window scans.
///
/// Returns an empty vector (not an error) when the instance's contig is missing or
/// shorter than `k` — enumeration is best-effort over whatever sequence is present.
pub fn enumerate_instance_kmers(
    genome: &ReferenceGenome,
    instance: &RepeatInstance,
    k: usize,
) -> Vec<KmerOccurrence> {
    debug_assert!(k > 0 && k <= MAX_K);
    let Some(contig) = genome.contig(&instance.seq_name) else {
        return Vec::new();
    };
    let start = instance.seq_start.min(contig.len());
    let end = instance.seq_end.min(contig.len());
    if end <= start || end - start < k {
        return Vec::new();
    }
    let region = &contig[start..end];

    let mut out = Vec::with_capacity(region.len().saturating_sub(k) + 1);
    for window in region.windows(k) {
        if let Some(mut word) = encode_kmer(window) {
            if instance.is_complement {
                word = crate::codec::reverse_complement(word, k);
            }
            // Stored canonical so a read drawn from either genomic strand probes the
            // same index entry the classifier does.
            word = crate::codec::canonical(word, k);
            out.push(KmerOccurrence {
                word,
                instance_id: instance.instance_id,
            });
        }
        // windows touching an ambiguity base are silently skipped; the next window
        // shifts one base and may already be clean again.
    }
    out
}

/// Enumerates k-mers across every instance in `instances`, in instance order.
pub fn enumerate_all<'a>(
    genome: &'a ReferenceGenome,
    instances: impl IntoIterator<Item = &'a RepeatInstance, IntoIter: 'a>,
    k: usize,
) -> impl Iterator<Item = KmerOccurrence> + 'a {
    instances
        .into_iter()
        .flat_map(move |instance| enumerate_instance_kmers(genome, instance, k))
}
