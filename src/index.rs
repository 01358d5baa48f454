//! Minimizer-sorted k-mer index: a flat, binary-searchable table keyed by each
//! k-mer's minimizer, with an offset map locating each minimizer's bucket.
//!
//! Grounded in the teacher's `compact_hash.rs` (fixed-width packed records, a
//! `rayon`-parallel build pass) but a structurally different layout: the spec calls
//! for a sorted array with binary search inside minimizer buckets rather than an
//! open-addressing hash table, so buckets are built by partitioning on minimizer and
//! sorting each bucket by k-mer word, not by probing a fixed-capacity slot array.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;

use crate::codec::{decode, minimizer};
use crate::taxonomy::{ClassId, ClassTree};

/// One packed index entry: an encoded k-mer word and the class ID its LCA resolved
/// to. 10 bytes on the wire (8 + 2), independent of in-memory padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerRecord {
    pub word: u64,
    pub lca_id: ClassId,
}

/// A minimizer-sorted k-mer index. Records are grouped by minimizer bucket and
/// sorted by `word` within each bucket; `offsets` maps a minimizer to the half-open
/// `[start, end)` range of `records` holding that bucket.
#[derive(Debug)]
pub struct MinimizerIndex {
    pub k: usize,
    pub m: usize,
    records: Vec<KmerRecord>,
    offsets: HashMap<u64, (usize, usize)>,
}

impl MinimizerIndex {
    /// Builds an index from an unordered `(word, lcaId)` table, bucketing records by
    /// minimizer and sorting within bucket. The bucketing pass is embarrassingly
    /// parallel over distinct minimizers, mirroring the teacher's `rayon`-parallel
    /// compact-hash build.
    pub fn build(table: &HashMap<u64, ClassId>, k: usize, m: usize) -> Self {
        let mut buckets: HashMap<u64, Vec<KmerRecord>> = HashMap::new();
        for (&word, &lca_id) in table {
            let bucket_key = minimizer(word, k, m);
            buckets
                .entry(bucket_key)
                .or_default()
                .push(KmerRecord { word, lca_id });
        }

        let mut bucket_keys: Vec<u64> = buckets.keys().copied().collect();
        bucket_keys.par_sort_unstable();

        buckets
            .par_iter_mut()
            .for_each(|(_, records)| records.sort_unstable_by_key(|r| r.word));

        let mut records = Vec::with_capacity(table.len());
        let mut offsets = HashMap::with_capacity(bucket_keys.len());
        for key in bucket_keys {
            let bucket = buckets.remove(&key).unwrap_or_default();
            let start = records.len();
            records.extend(bucket);
            offsets.insert(key, (start, records.len()));
        }

        let index = Self {
            k,
            m,
            records,
            offsets,
        };
        index.debug_check_invariants();
        index
    }

    /// Looks up `word`'s LCA class, or `None` if it was never observed while
    /// building the index.
    pub fn contains(&self, word: u64) -> Option<ClassId> {
        let bucket_key = minimizer(word, self.k, self.m);
        let (start, end) = *self.offsets.get(&bucket_key)?;
        self.records[start..end]
            .binary_search_by_key(&word, |r| r.word)
            .ok()
            .map(|rel| self.records[start + rel].lca_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.offsets.len()
    }

    fn debug_check_invariants(&self) {
        #[cfg(debug_assertions)]
        {
            for (_, &(start, end)) in &self.offsets {
                assert!(start <= end && end <= self.records.len(), "bucket range out of bounds");
                assert!(
                    self.records[start..end].windows(2).all(|w| w[0].word < w[1].word),
                    "bucket not sorted or contains duplicate words"
                );
            }
            let total: usize = self.offsets.values().map(|&(s, e)| e - s).sum();
            assert_eq!(total, self.records.len(), "offset map does not cover every record");
        }
    }

    /// Serializes the index as a minimizer-grouped plain-text dump: per non-empty
    /// minimizer bucket, a `>` header line holding the m-mer as lowercase
    /// nucleotides, then one `\t<kmer> <className>` line per record, nucleotides
    /// lowercase and the class resolved to its full path name via `tree`.
    pub fn write_dump<W: Write>(&self, mut w: W, tree: &ClassTree) -> io::Result<()> {
        let mut keys: Vec<&u64> = self.offsets.keys().collect();
        keys.sort_unstable();
        for key in keys {
            let (start, end) = self.offsets[key];
            if start == end {
                continue;
            }
            let mmer = decode(*key, self.m);
            writeln!(w, ">{}", String::from_utf8_lossy(&mmer))?;
            for record in &self.records[start..end] {
                let kmer = decode(record.word, self.k);
                let class_name = &tree.node_by_id(record.lca_id).name;
                writeln!(w, "\t{} {}", String::from_utf8_lossy(&kmer), class_name)?;
            }
        }
        Ok(())
    }

    /// Writes the binary wire format: a 16-byte header (`k`, `m` as u32 each) followed
    /// by `records.len()` 10-byte entries in bucket-then-word order. The offset map
    /// is not persisted; a reader reconstructs it in one pass over the records.
    pub fn write_binary<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.k as u32)?;
        w.write_u32::<LittleEndian>(self.m as u32)?;
        w.write_u64::<LittleEndian>(self.records.len() as u64)?;
        for record in &self.records {
            w.write_u64::<LittleEndian>(record.word)?;
            w.write_u16::<LittleEndian>(record.lca_id)?;
        }
        Ok(())
    }

    pub fn read_binary<R: Read>(mut r: R) -> io::Result<Self> {
        let k = r.read_u32::<LittleEndian>()? as usize;
        let m = r.read_u32::<LittleEndian>()? as usize;
        let count = r.read_u64::<LittleEndian>()? as usize;
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let word = r.read_u64::<LittleEndian>()?;
            let lca_id = r.read_u16::<LittleEndian>()?;
            records.push(KmerRecord { word, lca_id });
        }

        let mut offsets = HashMap::new();
        let mut start = 0;
        while start < records.len() {
            let key = minimizer(records[start].word, k, m);
            let mut end = start + 1;
            while end < records.len() && minimizer(records[end].word, k, m) == key {
                end += 1;
            }
            offsets.insert(key, (start, end));
            start = end;
        }

        let index = Self { k, m, records, offsets };
        index.debug_check_invariants();
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> HashMap<u64, ClassId> {
        let mut t = HashMap::new();
        t.insert(0b00000000, 1); // AAAA
        t.insert(0b00000001, 2); // AAAC
        t.insert(0b11111111, 3); // TTTT
        t
    }

    #[test]
    fn contains_finds_every_inserted_word() {
        let table = sample_table();
        let index = MinimizerIndex::build(&table, 4, 2);
        for (&word, &lca) in &table {
            assert_eq!(index.contains(word), Some(lca));
        }
    }

    #[test]
    fn contains_is_none_for_unknown_word() {
        let table = sample_table();
        let index = MinimizerIndex::build(&table, 4, 2);
        assert_eq!(index.contains(0b01010101), None);
    }

    #[test]
    fn binary_round_trip_preserves_lookups() {
        let table = sample_table();
        let index = MinimizerIndex::build(&table, 4, 2);
        let mut buf = Vec::new();
        index.write_binary(&mut buf).unwrap();
        let restored = MinimizerIndex::read_binary(&buf[..]).unwrap();
        for (&word, &lca) in &table {
            assert_eq!(restored.contains(word), Some(lca));
        }
        assert_eq!(restored.len(), index.len());
    }

    #[test]
    fn dump_decodes_nucleotides_lowercase_and_names_classes() {
        use crate::taxonomy::ClassTreeBuilder;

        let mut builder = ClassTreeBuilder::new();
        let line = builder.insert("LINE/L1");
        let sine = builder.insert("SINE/Alu");
        let tree = builder.build();

        let mut table = HashMap::new();
        table.insert(0b00000000u64, line); // AAAA
        table.insert(0b11111111u64, sine); // TTTT
        let index = MinimizerIndex::build(&table, 4, 2);

        let mut buf = Vec::new();
        index.write_dump(&mut buf, &tree).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains(">aaaa") || text.contains(">tttt"), "expected a lowercase m-mer header, got:\n{text}");
        assert!(text.contains("\taaaa LINE/L1"));
        assert!(text.contains("\ttttt SINE/Alu"));
    }
}
