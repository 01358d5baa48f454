//! Reporting: index dumps, JSON class-tree export, classification stream output,
//! and ground-truth verification summaries.
//!
//! Grounded in the teacher's `report.rs`/`readcounts.rs` (a streaming writer plus a
//! small accumulator struct for summary counts) but built around this crate's own
//! [`ClassificationResult`] and [`GroundTruthEntry`] types.

use std::collections::HashMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::classify::ClassificationResult;
use crate::io::reads::GroundTruthEntry;
use crate::taxonomy::{ClassId, ClassTree, ROOT_ID};

/// Placeholder name for a read or class-tree position that carries no information
/// (an unclassified read, or a node with no k-mers of its own).
const NIL: &str = "<nil>";

/// One node of the recursive JSON class-tree export.
#[derive(Debug, Serialize)]
pub struct ClassTreeNode {
    pub name: String,
    pub size: u64,
    pub children: Vec<ClassTreeNode>,
}

/// Exports the whole class tree as a recursive `{name, size, children}` JSON tree.
///
/// `kmer_counts` gives, per class ID, the number of unique canonical k-mers whose
/// LCA resolved to exactly that node (see [`crate::aggregate::count_kmers_by_class`]).
/// When `cumulative` is true, `size` is the sum over the node and every descendant;
/// otherwise it is the node's own count only.
pub fn write_class_tree_json<W: Write>(
    w: W,
    tree: &ClassTree,
    kmer_counts: &HashMap<ClassId, u64>,
    cumulative: bool,
) -> io::Result<()> {
    let root = build_class_tree_node(tree, ROOT_ID, kmer_counts, cumulative);
    serde_json::to_writer_pretty(w, &root)?;
    Ok(())
}

fn build_class_tree_node(
    tree: &ClassTree,
    id: ClassId,
    kmer_counts: &HashMap<ClassId, u64>,
    cumulative: bool,
) -> ClassTreeNode {
    let node = tree.node_by_id(id);
    let children: Vec<ClassTreeNode> = node
        .children
        .iter()
        .map(|&child| build_class_tree_node(tree, child, kmer_counts, cumulative))
        .collect();

    let own = kmer_counts.get(&id).copied().unwrap_or(0);
    let size = if cumulative {
        own + children.iter().map(|c| c.size).sum::<u64>()
    } else {
        own
    };

    ClassTreeNode {
        name: node.name.clone(),
        size,
        children,
    }
}

/// Writes one `<readId>\t<className or "<nil>">` line per classification result, in
/// the order given. A result at the root class carries no information and is
/// reported as `<nil>`, not as the literal class name `"root"`.
pub fn write_classification_stream<W: Write>(
    mut w: W,
    results: &[ClassificationResult],
    tree: &ClassTree,
) -> io::Result<()> {
    for result in results {
        let name = class_display_name(result.class_id, tree);
        writeln!(w, "{}\t{}", result.read_id, name)?;
    }
    Ok(())
}

fn class_display_name<'a>(class_id: ClassId, tree: &'a ClassTree) -> &'a str {
    if class_id == ROOT_ID {
        NIL
    } else {
        &tree.node_by_id(class_id).name
    }
}

/// Summary of comparing classification results against ground truth: counts of
/// exact matches, ancestor-level matches (classified to a true ancestor, e.g. the
/// family when the truth names the subfamily), and outright mismatches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    pub total: u64,
    pub exact_matches: u64,
    pub ancestor_matches: u64,
    pub mismatches: u64,
    pub unclassified: u64,
}

impl VerificationSummary {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.exact_matches + self.ancestor_matches) as f64 / self.total as f64
    }
}

/// Scores `results` against `truth` (matched by `read_id`); reads present in one set
/// but not the other are ignored, mirroring the teacher's best-effort report style.
pub fn verify_against_ground_truth(
    results: &[ClassificationResult],
    truth: &[GroundTruthEntry],
    tree: &ClassTree,
) -> VerificationSummary {
    let truth_by_id: HashMap<&str, &str> = truth
        .iter()
        .map(|e| (e.read_id.as_str(), e.expected_class_path.as_str()))
        .collect();

    let mut summary = VerificationSummary::default();
    for result in results {
        let Some(&expected_path) = truth_by_id.get(result.read_id.as_str()) else {
            continue;
        };
        summary.total += 1;
        if result.class_id == ROOT_ID {
            summary.unclassified += 1;
            continue;
        }
        let Some(expected_id) = tree.lookup_by_name(expected_path) else {
            summary.mismatches += 1;
            continue;
        };
        if result.class_id == expected_id {
            summary.exact_matches += 1;
        } else if tree.is_ancestor_of(result.class_id, expected_id) {
            summary.ancestor_matches += 1;
        } else {
            summary.mismatches += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::ClassTreeBuilder;

    fn sample_tree() -> (ClassTree, ClassId, ClassId) {
        let mut b = ClassTreeBuilder::new();
        let l1 = b.insert("LINE/L1");
        let l1me1 = b.insert("LINE/L1/L1ME1");
        (b.build(), l1, l1me1)
    }

    #[test]
    fn json_export_is_a_recursive_tree_rooted_at_root() {
        let (tree, ..) = sample_tree();
        let mut buf = Vec::new();
        write_class_tree_json(&mut buf, &tree, &HashMap::new(), false).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["name"], "root");
        assert_eq!(parsed["children"][0]["name"], "LINE");
        assert_eq!(parsed["children"][0]["children"][0]["name"], "LINE/L1");
    }

    #[test]
    fn json_export_own_size_counts_only_that_nodes_kmers() {
        let (tree, l1, l1me1) = sample_tree();
        let mut counts = HashMap::new();
        counts.insert(l1me1, 5u64);
        let mut buf = Vec::new();
        write_class_tree_json(&mut buf, &tree, &counts, false).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let l1_node = &parsed["children"][0]["children"][0];
        assert_eq!(l1_node["name"], "LINE/L1");
        assert_eq!(l1_node["size"], 0);
        assert_eq!(l1_node["children"][0]["name"], "LINE/L1/L1ME1");
        assert_eq!(l1_node["children"][0]["size"], 5);
        let _ = l1;
    }

    #[test]
    fn json_export_cumulative_size_rolls_up_to_ancestors() {
        let (tree, l1, l1me1) = sample_tree();
        let mut counts = HashMap::new();
        counts.insert(l1me1, 5u64);
        let mut buf = Vec::new();
        write_class_tree_json(&mut buf, &tree, &counts, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let l1_node = &parsed["children"][0]["children"][0];
        assert_eq!(l1_node["name"], "LINE/L1");
        assert_eq!(l1_node["size"], 5);
        assert_eq!(parsed["size"], 5);
        let _ = l1;
    }

    #[test]
    fn classification_stream_reports_root_as_nil() {
        let (tree, l1, _) = sample_tree();
        let results = vec![
            ClassificationResult { read_id: "r1".into(), class_id: l1 },
            ClassificationResult { read_id: "r2".into(), class_id: ROOT_ID },
        ];
        let mut buf = Vec::new();
        write_classification_stream(&mut buf, &results, &tree).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "r1\tLINE/L1\nr2\t<nil>\n");
    }

    #[test]
    fn verification_distinguishes_exact_ancestor_and_mismatch() {
        let (tree, l1, l1me1) = sample_tree();
        let results = vec![
            ClassificationResult { read_id: "r1".into(), class_id: l1me1 },
            ClassificationResult { read_id: "r2".into(), class_id: l1 },
            ClassificationResult { read_id: "r3".into(), class_id: ROOT_ID },
        ];
        let truth = vec![
            GroundTruthEntry { read_id: "r1".into(), expected_class_path: "LINE/L1/L1ME1".into() },
            GroundTruthEntry { read_id: "r2".into(), expected_class_path: "LINE/L1/L1ME1".into() },
            GroundTruthEntry { read_id: "r3".into(), expected_class_path: "LINE/L1/L1ME1".into() },
        ];
        let summary = verify_against_ground_truth(&results, &truth, &tree);
        assert_eq!(summary.exact_matches, 1);
        assert_eq!(summary.ancestor_matches, 1);
        assert_eq!(summary.unclassified, 1);
        assert_eq!(summary.total, 3);
    }
}
