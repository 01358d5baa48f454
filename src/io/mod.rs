//! File I/O adapters: external collaborators that feed the core engine.
//!
//! None of these modules participate in the classification algorithm itself; they
//! exist to turn the file formats named in the spec's external interfaces into the
//! in-memory types the core (codec, class tree, k-mer enumerator, index, classifier)
//! operates on.

pub mod fasta;
pub mod reads;
pub mod repeatmasker;
