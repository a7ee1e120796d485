use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::bail;
use log::{info, warn};

use crate::alignment::Alignment;
use crate::io::{self, DataError};
use crate::phylo_info::PhyloInfo;
use crate::tree::GuideTree;
use crate::Result;

pub struct PhyloInfoBuilder {
    alignment_file: PathBuf,
    tree_file: Option<PathBuf>,
}

impl PhyloInfoBuilder {
    /// Creates a new PhyloInfoBuilder struct with only the alignment file path set.
    /// The tree file path is set to None.
    ///
    /// # Arguments
    /// * `alignment_file` - File path to the PHYLIP alignment.
    ///
    /// # Example
    /// ```
    /// use std::path::PathBuf;
    /// use protsel::phylo_info::PhyloInfoBuilder;
    /// let builder = PhyloInfoBuilder::new(PathBuf::from("./data/aa_5x40.phy"));
    /// ```
    pub fn new(alignment_file: PathBuf) -> PhyloInfoBuilder {
        PhyloInfoBuilder {
            alignment_file,
            tree_file: None,
        }
    }

    /// Sets the guide tree file path.
    ///
    /// # Arguments
    /// * `path` - File path to the tree newick file.
    ///
    /// # Example
    /// ```
    /// use std::path::PathBuf;
    /// use protsel::phylo_info::PhyloInfoBuilder;
    /// let builder = PhyloInfoBuilder::new(PathBuf::from("./data/aa_5x40.phy"))
    ///   .tree_file(Some(PathBuf::from("./data/aa_5.newick")));
    /// ```
    pub fn tree_file(mut self, path: Option<PathBuf>) -> PhyloInfoBuilder {
        self.tree_file = path;
        self
    }

    /// Builds the PhyloInfo struct from the alignment file and the tree file (if provided).
    /// If the provided tree file has more than one tree, only the first tree will be processed.
    /// Bails if the alignment cannot be read or is not a valid protein alignment.
    /// Bails if the IDs of the tree leaves and the sequences do not match.
    ///
    /// # Example
    /// ```
    /// use std::path::PathBuf;
    /// use protsel::phylo_info::PhyloInfoBuilder;
    /// let info = PhyloInfoBuilder::new(PathBuf::from("./data/aa_5x40.phy"))
    ///     .tree_file(Some(PathBuf::from("./data/aa_5.newick")))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(info.msa_length(), 40);
    /// assert_eq!(info.msa.seq_count(), 5);
    /// assert_eq!(info.guide_tree().unwrap().leaf_count(), 5);
    /// ```
    pub fn build(self) -> Result<PhyloInfo> {
        let msa = io::read_phylip(&self.alignment_file)?;
        let tree = match self.tree_file {
            Some(tree_file) => {
                let tree = read_tree(&msa, &tree_file)?;
                Some((tree_file, tree))
            }
            None => {
                info!("No guide tree provided, it will be built by the oracle");
                None
            }
        };
        Ok(PhyloInfo {
            alignment_file: self.alignment_file,
            msa,
            tree,
        })
    }
}

fn read_tree(msa: &Alignment, tree_file: &Path) -> Result<GuideTree> {
    let mut trees = io::read_newick_from_file(tree_file)?;
    info!("{} tree(s) read successfully", trees.len());
    check_tree_number(&trees)?;
    let tree = trees.remove(0);
    validate_guide_tree(&tree, msa)?;
    Ok(tree)
}

/// Checks that a guide tree can be used to score candidates on the alignment.
///
/// Bails if the tree leaves and the sequence ids do not match. A tree that is rooted or has
/// multifurcations is accepted with a warning, the oracle resolves it on its own.
pub fn validate_guide_tree(tree: &GuideTree, msa: &Alignment) -> Result<()> {
    validate_taxa_ids(tree, msa)?;
    if !tree.is_bifurcating() {
        warn!("Guide tree has multifurcations");
    } else if !tree.is_unrooted() {
        warn!("Guide tree is rooted, the oracle will unroot it");
    }
    Ok(())
}

/// Checks that the ids of the tree leaves and the sequences match, bails with an error otherwise.
fn validate_taxa_ids(tree: &GuideTree, msa: &Alignment) -> Result<()> {
    let tip_ids: HashSet<String> = HashSet::from_iter(tree.leaf_ids().iter().cloned());
    let sequence_ids: HashSet<String> = HashSet::from_iter(msa.ids());
    info!("Checking that tree tip and sequence IDs match");
    if tip_ids.len() != tree.leaf_count() {
        bail!(DataError {
            message: String::from("Duplicate tip IDs found in the guide tree")
        });
    }
    let mut missing_tips = sequence_ids.difference(&tip_ids).collect::<Vec<_>>();
    if !missing_tips.is_empty() {
        missing_tips.sort();
        bail!(DataError {
            message: format!("Mismatched IDs found, missing tree tip IDs: {missing_tips:?}")
        });
    }
    let mut missing_seqs = tip_ids.difference(&sequence_ids).collect::<Vec<_>>();
    if !missing_seqs.is_empty() {
        missing_seqs.sort();
        bail!(DataError {
            message: format!("Mismatched IDs found, missing sequence IDs: {missing_seqs:?}")
        });
    }
    Ok(())
}

/// Checks that there is at least one tree in the vector, bails with an error otherwise.
/// Prints a warning if there is more than one tree because only the first tree will be processed.
fn check_tree_number(trees: &[GuideTree]) -> Result<()> {
    if trees.is_empty() {
        bail!(DataError {
            message: String::from("No trees in the tree file, aborting")
        });
    }
    if trees.len() > 1 {
        warn!("More than one tree in the tree file, only the first tree will be processed");
    }
    Ok(())
}
