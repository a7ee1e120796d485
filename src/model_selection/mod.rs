use std::fmt::{self, Display};

use anyhow::bail;
use itertools::{zip_eq, Itertools};
use log::{info, warn};

use crate::alphabets::FreqVector;
use crate::information_criteria::FitRecord;
use crate::io::DataError;
use crate::model_space::{enumerate, Candidate, ModelGroup};
use crate::oracle::LikelihoodOracle;
use crate::phylo_info::{validate_guide_tree, PhyloInfo};
use crate::ranking::{Ranking, SelectionResult};
use crate::tree::{tree_parser, GuideTree};
use crate::Result;

/// Candidate the oracle failed on, left out of the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub id: String,
    pub reason: String,
}

impl Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub ranking: Ranking,
    pub failures: Vec<CandidateFailure>,
    /// Topology every candidate was scored on.
    pub guide_tree: GuideTree,
    /// Empirical amino acid composition of the alignment, what the +F variants are fitted with.
    pub composition: FreqVector,
}

impl SelectionOutcome {
    pub fn selection(&self) -> SelectionResult {
        self.ranking.selection()
    }
}

/// Scores every candidate of a model group on a fixed guide tree and ranks them by BIC.
pub struct ModelSelector<'a, O: LikelihoodOracle> {
    oracle: &'a O,
    info: &'a PhyloInfo,
    group: ModelGroup,
}

impl<'a, O: LikelihoodOracle> ModelSelector<'a, O> {
    /// Creates a selector over the nuclear model group.
    pub fn new(oracle: &'a O, info: &'a PhyloInfo) -> ModelSelector<'a, O> {
        ModelSelector {
            oracle,
            info,
            group: ModelGroup::Nuclear,
        }
    }

    pub fn group(mut self, group: ModelGroup) -> ModelSelector<'a, O> {
        self.group = group;
        self
    }

    /// Runs the selection.
    ///
    /// Candidates the oracle fails on are logged and returned as failures, the others are
    /// ranked. Bails if no guide tree can be obtained or if no candidate could be scored.
    pub fn run(self) -> Result<SelectionOutcome> {
        let candidates = enumerate(self.group);
        info!(
            "Selecting among {} candidate models of the {} group",
            candidates.len(),
            self.group
        );
        let composition = self.info.msa.freqs();
        info!(
            "Amino acid composition of the alignment: {}",
            composition.iter().map(|f| format!("{:.4}", f)).join(" ")
        );
        let guide_tree = self.resolve_guide_tree()?;
        info!(
            "Scoring on a guide tree with {} leaves, {} branch lengths per candidate",
            guide_tree.leaf_count(),
            self.info.branch_count()
        );

        let mut fits = Vec::with_capacity(candidates.len());
        let mut failures = Vec::new();
        for (candidate, fit) in zip_eq(
            &candidates,
            score_candidates(&self, &candidates, &guide_tree),
        ) {
            match fit {
                Ok(fit) => fits.push(fit),
                Err(e) => {
                    warn!("Skipping {}: {}", candidate, e);
                    failures.push(CandidateFailure {
                        id: candidate.id(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!("Scored {} of {} candidates", fits.len(), candidates.len());

        let ranking = Ranking::new(fits)?;
        Ok(SelectionOutcome {
            ranking,
            failures,
            guide_tree,
            composition,
        })
    }

    /// The user's guide tree if one was given, otherwise one built by the oracle.
    fn resolve_guide_tree(&self) -> Result<GuideTree> {
        if let Some(tree) = self.info.guide_tree() {
            return Ok(tree.clone());
        }
        let newick = self.oracle.guide_tree(self.info.alignment_file())?;
        let mut trees = tree_parser::from_newick(&newick)?;
        if trees.is_empty() {
            bail!(DataError {
                message: String::from("Oracle returned no guide tree")
            });
        }
        let tree = trees.remove(0);
        validate_guide_tree(&tree, &self.info.msa)?;
        Ok(tree)
    }

    fn fit(&self, candidate: &Candidate, guide_tree: &GuideTree) -> Result<FitRecord> {
        let score = self
            .oracle
            .score(candidate, self.info.alignment_file(), guide_tree)?;
        info!("{}: lnL {}", candidate, score.log_likelihood);
        FitRecord::new(
            *candidate,
            score.log_likelihood,
            self.info.branch_count(),
            self.info.msa_length(),
        )
    }
}

cfg_if::cfg_if! {
if #[cfg(feature = "par-scoring")] {
fn score_candidates<O: LikelihoodOracle>(
    selector: &ModelSelector<O>,
    candidates: &[Candidate],
    guide_tree: &GuideTree,
) -> Vec<Result<FitRecord>> {
    use rayon::prelude::*;
    candidates
        .par_iter()
        .map(|candidate| selector.fit(candidate, guide_tree))
        .collect()
}
} else {
fn score_candidates<O: LikelihoodOracle>(
    selector: &ModelSelector<O>,
    candidates: &[Candidate],
    guide_tree: &GuideTree,
) -> Vec<Result<FitRecord>> {
    candidates
        .iter()
        .map(|candidate| selector.fit(candidate, guide_tree))
        .collect()
}
}
}
