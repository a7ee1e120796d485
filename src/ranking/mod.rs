use std::error::Error;
use std::fmt::{self, Display};

use anyhow::bail;
use log::{info, warn};

use crate::f64_h;
use crate::information_criteria::FitRecord;
use crate::oracle::OracleArgs;
use crate::Result;

#[derive(Clone, PartialEq)]
pub enum RankingError {
    NoCandidatesScored,
    UnscorableCandidate { id: String, bic: f64 },
}

impl fmt::Debug for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingError::NoCandidatesScored => {
                write!(f, "No candidate model could be scored, nothing to rank")
            }
            RankingError::UnscorableCandidate { id, bic } => {
                write!(f, "Candidate {} has non-finite BIC {}, excluded", id, bic)
            }
        }
    }
}

impl Error for RankingError {}

/// A fit augmented with its support relative to the other candidates of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub fit: FitRecord,
    /// BIC minus the lowest BIC of the run.
    pub delta_bic: f64,
    pub bic_weight: f64,
    /// Sum of the weights of this and all better ranked candidates.
    pub cumulative_bic_weight: f64,
}

impl RankedRecord {
    pub fn id(&self) -> String {
        self.fit.id()
    }
}

/// Candidates of one run in ascending BIC order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    records: Vec<RankedRecord>,
    unscorable: Vec<RankingError>,
}

/// Winning configuration, handed on to the tree search.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub record: RankedRecord,
    pub oracle_args: OracleArgs,
}

impl Display for SelectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Best model: {} (phyml {})",
            self.record.id(),
            self.oracle_args
        )
    }
}

/// Relative support of a candidate `delta` BIC units worse than the best one, exp(-delta / 2).
///
/// `f64::exp` saturates to `0.0` rather than erroring once `-delta / 2` drops below about -745,
/// so candidates that far behind get a weight of exactly zero.
pub fn raw_weight(delta_bic: f64) -> f64 {
    (-0.5 * delta_bic).exp()
}

impl Ranking {
    /// Ranks the fits by BIC.
    ///
    /// Fits with a non-finite BIC are set aside as unscorable. The rest are sorted by BIC with a
    /// stable sort, so candidates with equal BIC keep their enumeration order. Weights are
    /// exp(-deltaBIC / 2) normalised to sum to one over the ranked candidates.
    /// Bails with [`RankingError::NoCandidatesScored`] if no fit is left to rank.
    ///
    /// # Example
    /// ```
    /// use protsel::information_criteria::FitRecord;
    /// use protsel::model_space::{enumerate, ModelGroup};
    /// use protsel::ranking::Ranking;
    /// let fits = enumerate(ModelGroup::Test)
    ///     .into_iter()
    ///     .zip([-1010.0, -1000.0, -1002.0, -1001.0, -1020.0, -1005.0, -1008.0, -1007.0])
    ///     .map(|(candidate, logl)| FitRecord::new(candidate, logl, 7, 500).unwrap())
    ///     .collect::<Vec<_>>();
    /// let ranking = Ranking::new(fits).unwrap();
    /// assert_eq!(ranking.best().id(), "LG+G");
    /// assert_eq!(ranking.best().delta_bic, 0.0);
    /// ```
    pub fn new(fits: Vec<FitRecord>) -> Result<Ranking> {
        let (mut scorable, unscorable): (Vec<FitRecord>, Vec<FitRecord>) =
            fits.into_iter().partition(|fit| fit.bic.is_finite());
        let unscorable = unscorable
            .into_iter()
            .map(|fit| {
                let error = RankingError::UnscorableCandidate {
                    id: fit.id(),
                    bic: fit.bic,
                };
                warn!("{}", error);
                error
            })
            .collect::<Vec<_>>();
        if scorable.is_empty() {
            bail!(RankingError::NoCandidatesScored);
        }

        scorable.sort_by_key(|fit| f64_h::from(fit.bic));
        let min_bic = scorable[0].bic;
        let raw_weights = scorable
            .iter()
            .map(|fit| raw_weight(fit.bic - min_bic))
            .collect::<Vec<_>>();
        let total_weight: f64 = raw_weights.iter().sum();

        let mut cumulative_bic_weight = 0.0;
        let records = scorable
            .into_iter()
            .zip(raw_weights)
            .map(|(fit, raw_weight)| {
                let bic_weight = raw_weight / total_weight;
                cumulative_bic_weight += bic_weight;
                RankedRecord {
                    delta_bic: fit.bic - min_bic,
                    bic_weight,
                    cumulative_bic_weight,
                    fit,
                }
            })
            .collect::<Vec<_>>();
        info!(
            "Ranked {} candidate(s), best {} with BIC {}",
            records.len(),
            records[0].id(),
            min_bic
        );
        Ok(Ranking {
            records,
            unscorable,
        })
    }

    /// Ranked candidates, best first.
    pub fn records(&self) -> &[RankedRecord] {
        &self.records
    }

    /// Candidates left out of the ranking because their BIC is not finite.
    pub fn unscorable(&self) -> &[RankingError] {
        &self.unscorable
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Candidate with the lowest BIC, the first one enumerated on ties.
    pub fn best(&self) -> &RankedRecord {
        &self.records[0]
    }

    pub fn selection(&self) -> SelectionResult {
        let record = self.best().clone();
        SelectionResult {
            oracle_args: record.fit.candidate.oracle_args(),
            record,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
