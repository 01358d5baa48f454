//! The repeat-family class tree: a frozen taxonomy of slash-delimited class paths
//! (e.g. `LINE/L1/L1ME1`) with stable integer IDs and an LCA query.
//!
//! Grounded in the teacher's `Taxonomy`/`TaxonomyNode` (NCBI-taxonomy ingestion,
//! `is_a_ancestor_of_b`, `lca` via a precomputed root-to-node path cache) but built
//! from RepeatMasker class paths instead of `nodes.dmp`/`names.dmp`, and without the
//! teacher's on-disk binary taxonomy format — this tree is always built fresh from
//! the repeat instances observed in one run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable identifier for a class-tree node. `0` is always the root.
pub type ClassId = u16;

pub const ROOT_ID: ClassId = 0;

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub id: ClassId,
    pub name: String,
    pub parent: ClassId,
    pub children: Vec<ClassId>,
    pub depth: u32,
}

/// On-disk row of a class tree export: everything needed to reconstruct a
/// [`ClassTree`] except the derived `children` lists, which [`ClassTree::from_rows`]
/// rebuilds from each row's `parent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassNodeRow {
    pub id: ClassId,
    pub name: String,
    pub parent: ClassId,
    pub depth: u32,
}

/// The frozen repeat-family taxonomy. Read-only after [`ClassTreeBuilder::build`]
/// returns; safe to share across classifier threads (`Send + Sync`, no interior
/// mutability).
#[derive(Debug, Clone)]
pub struct ClassTree {
    nodes: Vec<ClassNode>,
    by_name: HashMap<String, ClassId>,
}

impl ClassTree {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_by_id(&self, id: ClassId) -> &ClassNode {
        &self.nodes[id as usize]
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Lowest common ancestor of `a` and `b`, via depth equalization followed by
    /// simultaneous ascent. O(depth); the tree is shallow enough (typically <= 4 in
    /// practice) that no preprocessing is required.
    pub fn lca(&self, a: ClassId, b: ClassId) -> ClassId {
        let (mut x, mut y) = (a, b);
        let (mut dx, mut dy) = (self.nodes[x as usize].depth, self.nodes[y as usize].depth);

        while dx > dy {
            x = self.nodes[x as usize].parent;
            dx -= 1;
        }
        while dy > dx {
            y = self.nodes[y as usize].parent;
            dy -= 1;
        }
        while x != y {
            x = self.nodes[x as usize].parent;
            y = self.nodes[y as usize].parent;
        }
        x
    }

    /// Left fold of [`Self::lca`] over an iterator of class IDs, with early exit once
    /// the accumulator reaches the root (it cannot move further up).
    pub fn lca_many<I: IntoIterator<Item = ClassId>>(&self, ids: I) -> ClassId {
        let mut iter = ids.into_iter();
        let Some(mut acc) = iter.next() else {
            return ROOT_ID;
        };
        for id in iter {
            if acc == ROOT_ID {
                break;
            }
            acc = self.lca(acc, id);
        }
        acc
    }

    pub fn is_ancestor_of(&self, ancestor: ClassId, node: ClassId) -> bool {
        let mut cur = node;
        loop {
            if cur == ancestor {
                return true;
            }
            if cur == ROOT_ID {
                return false;
            }
            cur = self.nodes[cur as usize].parent;
        }
    }

    /// Flattens the tree into [`ClassNodeRow`]s in ID order, for serialization.
    pub fn to_rows(&self) -> Vec<ClassNodeRow> {
        self.nodes
            .iter()
            .map(|n| ClassNodeRow {
                id: n.id,
                name: n.name.clone(),
                parent: n.parent,
                depth: n.depth,
            })
            .collect()
    }

    /// Rebuilds a [`ClassTree`] from rows produced by [`Self::to_rows`]. `rows` must
    /// be ID-ordered starting at `ROOT_ID` with every non-root row's `parent`
    /// already present earlier in the slice.
    pub fn from_rows(rows: Vec<ClassNodeRow>) -> Self {
        let mut nodes: Vec<ClassNode> = rows
            .iter()
            .map(|r| ClassNode {
                id: r.id,
                name: r.name.clone(),
                parent: r.parent,
                children: Vec::new(),
                depth: r.depth,
            })
            .collect();
        let mut by_name = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            by_name.insert(node.name.clone(), node.id);
        }
        for row in &rows {
            if row.id != ROOT_ID {
                let parent = row.parent;
                nodes[parent as usize].children.push(row.id);
            }
        }
        ClassTree { nodes, by_name }
    }
}

/// Builds a [`ClassTree`] by inserting every distinct `repeatClassPath`'s prefixes,
/// one path component at a time, under an implicit `"root"` node with id 0.
#[derive(Debug, Default)]
pub struct ClassTreeBuilder {
    nodes: Vec<ClassNode>,
    by_name: HashMap<String, ClassId>,
}

impl ClassTreeBuilder {
    pub fn new() -> Self {
        let root = ClassNode {
            id: ROOT_ID,
            name: "root".to_string(),
            parent: ROOT_ID,
            children: Vec::new(),
            depth: 0,
        };
        let mut by_name = HashMap::new();
        by_name.insert(root.name.clone(), ROOT_ID);
        Self {
            nodes: vec![root],
            by_name,
        }
    }

    /// Inserts `path` (e.g. `"LINE/L1/L1ME1"`) and every one of its prefixes,
    /// returning the ID of the full path's node. Existing prefixes are reused.
    pub fn insert(&mut self, path: &str) -> ClassId {
        let mut parent = ROOT_ID;
        let mut acc = String::new();
        for (i, component) in path.split('/').filter(|s| !s.is_empty()).enumerate() {
            if i > 0 {
                acc.push('/');
            }
            acc.push_str(component);

            parent = if let Some(&id) = self.by_name.get(&acc) {
                id
            } else {
                let id = self.nodes.len() as ClassId;
                let depth = self.nodes[parent as usize].depth + 1;
                self.nodes.push(ClassNode {
                    id,
                    name: acc.clone(),
                    parent,
                    children: Vec::new(),
                    depth,
                });
                self.nodes[parent as usize].children.push(id);
                self.by_name.insert(acc.clone(), id);
                id
            };
        }
        parent
    }

    pub fn build(self) -> ClassTree {
        ClassTree {
            nodes: self.nodes,
            by_name: self.by_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (ClassTree, ClassId, ClassId, ClassId) {
        let mut b = ClassTreeBuilder::new();
        let ab = b.insert("A/B");
        let ac = b.insert("A/C");
        let de = b.insert("D/E");
        (b.build(), ab, ac, de)
    }

    #[test]
    fn insert_shares_common_prefixes() {
        let (tree, ab, ac, _) = sample_tree();
        assert_eq!(tree.node_by_id(ab).name, "A/B");
        assert_eq!(tree.node_by_id(ac).name, "A/C");
        assert_eq!(tree.node_by_id(ab).parent, tree.node_by_id(ac).parent);
        assert_eq!(tree.node_by_id(tree.node_by_id(ab).parent).name, "A");
    }

    #[test]
    fn root_has_id_zero_and_is_its_own_ancestor_boundary() {
        let (tree, ..) = sample_tree();
        assert_eq!(ROOT_ID, 0);
        assert_eq!(tree.node_by_id(ROOT_ID).name, "root");
    }

    #[test]
    fn lca_of_siblings_is_parent() {
        let (tree, ab, ac, _) = sample_tree();
        let a = tree.lookup_by_name("A").unwrap();
        assert_eq!(tree.lca(ab, ac), a);
    }

    #[test]
    fn lca_of_unrelated_subtrees_is_root() {
        let (tree, ab, _, de) = sample_tree();
        assert_eq!(tree.lca(ab, de), ROOT_ID);
    }

    #[test]
    fn lca_many_short_circuits_at_root() {
        let (tree, ab, ac, de) = sample_tree();
        assert_eq!(tree.lca_many([ab, ac, de]), ROOT_ID);
        assert_eq!(tree.lca_many([ab, ac]), tree.lookup_by_name("A").unwrap());
        assert_eq!(tree.lca_many(std::iter::empty()), ROOT_ID);
    }

    #[test]
    fn is_ancestor_of_respects_path() {
        let (tree, ab, _, _) = sample_tree();
        let a = tree.lookup_by_name("A").unwrap();
        assert!(tree.is_ancestor_of(a, ab));
        assert!(tree.is_ancestor_of(ROOT_ID, ab));
        assert!(!tree.is_ancestor_of(ab, a));
    }

    #[test]
    fn name_round_trips_by_id() {
        let (tree, ab, ..) = sample_tree();
        let name = tree.node_by_id(ab).name.clone();
        assert_eq!(tree.lookup_by_name(&name), Some(ab));
    }

    #[test]
    fn rows_round_trip_preserves_structure() {
        let (tree, ab, ac, de) = sample_tree();
        let rows = tree.to_rows();
        let restored = ClassTree::from_rows(rows);
        assert_eq!(restored.node_count(), tree.node_count());
        assert_eq!(restored.lca(ab, ac), tree.lca(ab, ac));
        assert_eq!(restored.lca(ab, de), ROOT_ID);
        assert_eq!(restored.lookup_by_name("A/B"), Some(ab));
    }
}
