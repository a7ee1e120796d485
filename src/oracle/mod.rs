use std::error::Error;
use std::fmt::{self, Display};
use std::path::Path;

use anyhow::bail;
use itertools::join;

use crate::model_space::{Candidate, ProteinModelType};
use crate::tree::GuideTree;
use crate::Result;

mod phyml;
pub use phyml::*;

pub enum OracleError {
    /// The oracle process could not be started.
    Unavailable { binary: String, reason: String },
    /// The oracle finished without writing the expected artifact.
    NoOutput { artifact: String, status: String },
    /// The stats artifact holds no readable log-likelihood.
    Parse { reason: String },
}

impl fmt::Debug for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Unavailable { binary, reason } => {
                write!(f, "Oracle unavailable, cannot run {}: {}", binary, reason)
            }
            OracleError::NoOutput { artifact, status } => {
                write!(f, "Oracle produced no {} ({})", artifact, status)
            }
            OracleError::Parse { reason } => {
                write!(f, "Cannot parse oracle output: {}", reason)
            }
        }
    }
}

impl Error for OracleError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrequencyMode {
    /// Amino acid frequencies that come with the substitution matrix.
    Model,
    /// Amino acid frequencies counted from the alignment.
    Empirical,
}

impl FrequencyMode {
    fn flag(&self) -> &'static str {
        match self {
            FrequencyMode::Model => "m",
            FrequencyMode::Empirical => "e",
        }
    }
}

/// Model configuration in the form the oracle is invoked with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OracleArgs {
    pub model: ProteinModelType,
    pub freqs: FrequencyMode,
    /// Number of discrete gamma categories, `None` for a single rate class.
    pub gamma_categories: Option<usize>,
}

impl OracleArgs {
    /// PhyML arguments selecting the substitution model.
    ///
    /// # Example
    /// ```
    /// use protsel::model_space::ProteinModelType;
    /// use protsel::oracle::{FrequencyMode, OracleArgs};
    /// let args = OracleArgs {
    ///     model: ProteinModelType::WAG,
    ///     freqs: FrequencyMode::Empirical,
    ///     gamma_categories: Some(4),
    /// };
    /// assert_eq!(args.to_args().join(" "), "-d aa -m WAG -f e -c 4 -a e");
    /// ```
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            String::from("-d"),
            String::from("aa"),
            String::from("-m"),
            self.model.to_string(),
            String::from("-f"),
            self.freqs.flag().to_string(),
        ];
        match self.gamma_categories {
            Some(categories) => args.extend([
                String::from("-c"),
                categories.to_string(),
                String::from("-a"),
                String::from("e"),
            ]),
            None => args.extend([String::from("-c"), String::from("1")]),
        }
        args
    }
}

impl Display for OracleArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", join(self.to_args(), " "))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum TopologyMoves {
    NNI,
    SPR,
    BEST,
}

impl Display for TopologyMoves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyMoves::NNI => write!(f, "NNI"),
            TopologyMoves::SPR => write!(f, "SPR"),
            TopologyMoves::BEST => write!(f, "BEST"),
        }
    }
}

/// Settings of the final tree search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOptions {
    pub moves: TopologyMoves,
    /// Number of bootstrap replicates; 0 disables branch support, negative values select
    /// PhyML's approximate likelihood ratio tests (-4 for SH-like support).
    pub bootstrap: i32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            moves: TopologyMoves::SPR,
            bootstrap: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OracleScore {
    pub log_likelihood: f64,
    pub stats: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OracleSearch {
    pub log_likelihood: f64,
    pub tree: String,
    pub stats: String,
}

/// External likelihood engine. Implementations must keep concurrent calls from sharing
/// output files, candidates may be scored in parallel.
pub trait LikelihoodOracle: Send + Sync {
    /// Checks that the oracle can be invoked at all.
    fn check(&self) -> Result<()>;

    /// Log-likelihood of the alignment under the candidate on the fixed guide topology,
    /// with branch lengths and model parameters optimised.
    fn score(&self, candidate: &Candidate, alignment: &Path, guide: &GuideTree)
        -> Result<OracleScore>;

    /// Newick string of a starting topology for the alignment.
    fn guide_tree(&self, alignment: &Path) -> Result<String>;

    /// Maximum likelihood tree search under the given model, starting from the guide tree.
    fn search(
        &self,
        args: &OracleArgs,
        alignment: &Path,
        guide: &GuideTree,
        options: &SearchOptions,
    ) -> Result<OracleSearch>;
}

/// Extracts the log-likelihood from PhyML stats output, i.e. the value on the first line
/// containing `Log-likelihood:`.
///
/// # Example
/// ```
/// use protsel::oracle::parse_log_likelihood;
/// let stats = ". Model of amino acids substitution: \tLG\n. Log-likelihood: \t\t\t-2354.07188\n";
/// assert_eq!(parse_log_likelihood(stats).unwrap(), -2354.07188);
/// ```
pub fn parse_log_likelihood(stats: &str) -> Result<f64> {
    const MARKER: &str = "Log-likelihood:";
    let Some((_, value)) = stats.lines().find_map(|line| line.split_once(MARKER)) else {
        bail!(OracleError::Parse {
            reason: String::from("no log-likelihood line in stats output")
        });
    };
    let value = value.split_whitespace().next().unwrap_or_default();
    match value.parse::<f64>() {
        Ok(logl) => Ok(logl),
        Err(_) => bail!(OracleError::Parse {
            reason: format!("'{}' is not a log-likelihood value", value)
        }),
    }
}
