pub mod tree_parser;

/// Topology of a guide tree, as much of it as model scoring needs.
///
/// Candidates are scored on a fixed topology, so only the leaf set, the shape of the internal
/// nodes and the normalised newick text (passed on to the oracle) are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideTree {
    pub(crate) newick: String,
    pub(crate) leaf_ids: Vec<String>,
    /// Number of children of each internal node, in preorder. The first entry is the root.
    pub(crate) internal_degrees: Vec<usize>,
}

impl GuideTree {
    pub fn leaf_ids(&self) -> &[String] {
        &self.leaf_ids
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_ids.len()
    }

    /// The tree is written with a trifurcation at the top level.
    pub fn is_unrooted(&self) -> bool {
        self.internal_degrees.first() == Some(&3)
    }

    /// Every internal node has two children, apart from a top level trifurcation.
    pub fn is_bifurcating(&self) -> bool {
        self.internal_degrees
            .iter()
            .enumerate()
            .all(|(i, &degree)| degree == 2 || (i == 0 && degree == 3))
    }

    /// Single line newick representation, terminated by a semicolon.
    pub fn newick(&self) -> &str {
        &self.newick
    }
}
