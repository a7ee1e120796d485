use std::path::{Path, PathBuf};

use crate::alignment::Alignment;
use crate::tree::GuideTree;

mod phyloinfo_builder;
pub use phyloinfo_builder::*;

/// The PhyloInfo struct contains the input of a model selection run.
///
/// The struct can be built using the PhyloInfoBuilder from at least a PHYLIP alignment file.
/// The alignment file path is kept because the oracle reads the alignment itself.
#[derive(Debug, Clone)]
pub struct PhyloInfo {
    /// Path of the alignment file handed to the oracle.
    pub alignment_file: PathBuf,
    /// Multiple sequence alignment read from the alignment file.
    pub msa: Alignment,
    /// Guide tree given by the user and the file it was read from.
    pub tree: Option<(PathBuf, GuideTree)>,
}

impl PhyloInfo {
    /// Returns the number of sites in the alignment.
    pub fn msa_length(&self) -> usize {
        self.msa.msa_len()
    }

    /// Returns the number of branch lengths estimated along with every candidate model.
    pub fn branch_count(&self) -> usize {
        self.msa.branch_count()
    }

    pub fn alignment_file(&self) -> &Path {
        &self.alignment_file
    }

    pub fn guide_tree(&self) -> Option<&GuideTree> {
        self.tree.as_ref().map(|(_, tree)| tree)
    }
}
