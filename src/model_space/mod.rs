use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::bail;
use itertools::join;
use lazy_static::lazy_static;

use crate::alphabets::AA_FREQ_PARAMS;
use crate::oracle::{FrequencyMode, OracleArgs};
use crate::Result;

/// Free parameters added by the discrete gamma rate heterogeneity: its shape.
pub const GAMMA_SHAPE_PARAMS: usize = 1;

/// Number of discrete gamma rate categories used by the `+G` variants.
pub const GAMMA_CATEGORIES: usize = 4;

pub enum ModelSpaceError {
    InvalidModelGroup(String),
}

impl fmt::Debug for ModelSpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for ModelSpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpaceError::InvalidModelGroup(tag) => write!(
                f,
                "Invalid model group '{}', expected one of: {}",
                tag,
                join(ModelGroup::ALL, ", ")
            ),
        }
    }
}

impl Error for ModelSpaceError {}

/// Empirical amino acid substitution matrices, spelled the way PhyML expects them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum ProteinModelType {
    LG,
    WAG,
    JTT,
    Dayhoff,
    DCMut,
    VT,
    Blosum62,
    AB,
    MtREV,
    MtMam,
    MtArt,
    CpREV,
    HIVb,
    HIVw,
    RtREV,
    FLU,
}

impl Display for ProteinModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProteinModelType::LG => "LG",
            ProteinModelType::WAG => "WAG",
            ProteinModelType::JTT => "JTT",
            ProteinModelType::Dayhoff => "Dayhoff",
            ProteinModelType::DCMut => "DCMut",
            ProteinModelType::VT => "VT",
            ProteinModelType::Blosum62 => "Blosum62",
            ProteinModelType::AB => "AB",
            ProteinModelType::MtREV => "MtREV",
            ProteinModelType::MtMam => "MtMam",
            ProteinModelType::MtArt => "MtArt",
            ProteinModelType::CpREV => "CpREV",
            ProteinModelType::HIVb => "HIVb",
            ProteinModelType::HIVw => "HIVw",
            ProteinModelType::RtREV => "RtREV",
            ProteinModelType::FLU => "FLU",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelGroup {
    Nuclear,
    Organellar,
    Viral,
    Combined,
    Test,
}

impl ModelGroup {
    pub const ALL: [ModelGroup; 5] = [
        ModelGroup::Nuclear,
        ModelGroup::Organellar,
        ModelGroup::Viral,
        ModelGroup::Combined,
        ModelGroup::Test,
    ];

    /// Base matrices of the group, in evaluation order.
    pub fn matrices(&self) -> &'static [ProteinModelType] {
        match self {
            ModelGroup::Nuclear => &NUCLEAR,
            ModelGroup::Organellar => &ORGANELLAR,
            ModelGroup::Viral => &VIRAL,
            ModelGroup::Combined => &COMBINED,
            ModelGroup::Test => &TEST,
        }
    }
}

impl Display for ModelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelGroup::Nuclear => write!(f, "nuclear"),
            ModelGroup::Organellar => write!(f, "organellar"),
            ModelGroup::Viral => write!(f, "viral"),
            ModelGroup::Combined => write!(f, "combined"),
            ModelGroup::Test => write!(f, "test"),
        }
    }
}

impl FromStr for ModelGroup {
    type Err = anyhow::Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "nuclear" => Ok(ModelGroup::Nuclear),
            "organellar" => Ok(ModelGroup::Organellar),
            "viral" => Ok(ModelGroup::Viral),
            "combined" => Ok(ModelGroup::Combined),
            "test" => Ok(ModelGroup::Test),
            _ => bail!(ModelSpaceError::InvalidModelGroup(tag.to_string())),
        }
    }
}

lazy_static! {
    static ref NUCLEAR: Vec<ProteinModelType> = vec![
        ProteinModelType::LG,
        ProteinModelType::WAG,
        ProteinModelType::JTT,
        ProteinModelType::Dayhoff,
        ProteinModelType::DCMut,
        ProteinModelType::VT,
        ProteinModelType::Blosum62,
        ProteinModelType::AB,
    ];
    static ref ORGANELLAR: Vec<ProteinModelType> = vec![
        ProteinModelType::MtREV,
        ProteinModelType::MtMam,
        ProteinModelType::MtArt,
        ProteinModelType::CpREV,
    ];
    static ref VIRAL: Vec<ProteinModelType> = vec![
        ProteinModelType::HIVb,
        ProteinModelType::HIVw,
        ProteinModelType::RtREV,
        ProteinModelType::FLU,
    ];
    static ref COMBINED: Vec<ProteinModelType> = NUCLEAR
        .iter()
        .chain(ORGANELLAR.iter())
        .chain(VIRAL.iter())
        .copied()
        .collect();
    static ref TEST: Vec<ProteinModelType> = vec![ProteinModelType::LG, ProteinModelType::WAG];
}

/// Parameter augmentation applied on top of a base matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    Plain,
    Gamma,
    Freqs,
    FreqsGamma,
}

impl Variant {
    /// Expansion order of the variants for every base matrix.
    pub const ALL: [Variant; 4] = [
        Variant::Plain,
        Variant::Gamma,
        Variant::Freqs,
        Variant::FreqsGamma,
    ];

    /// Free parameters on top of the branch lengths: the gamma shape for `+G` and
    /// the empirical amino acid frequencies for `+F`.
    pub fn extra_params(&self) -> usize {
        match self {
            Variant::Plain => 0,
            Variant::Gamma => GAMMA_SHAPE_PARAMS,
            Variant::Freqs => AA_FREQ_PARAMS,
            Variant::FreqsGamma => AA_FREQ_PARAMS + GAMMA_SHAPE_PARAMS,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Plain => "",
            Variant::Gamma => "+G",
            Variant::Freqs => "+F",
            Variant::FreqsGamma => "+F+G",
        }
    }

    pub fn has_gamma(&self) -> bool {
        matches!(self, Variant::Gamma | Variant::FreqsGamma)
    }

    pub fn has_empirical_freqs(&self) -> bool {
        matches!(self, Variant::Freqs | Variant::FreqsGamma)
    }
}

/// One base matrix with one variant, the unit of evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub matrix: ProteinModelType,
    pub variant: Variant,
}

impl Candidate {
    pub fn new(matrix: ProteinModelType, variant: Variant) -> Candidate {
        Candidate { matrix, variant }
    }

    /// Label of the candidate, e.g. `LG+F+G`.
    pub fn id(&self) -> String {
        format!("{}{}", self.matrix, self.variant.suffix())
    }

    pub fn extra_params(&self) -> usize {
        self.variant.extra_params()
    }

    /// Parameter set handed to the oracle to score this candidate.
    pub fn oracle_args(&self) -> OracleArgs {
        OracleArgs {
            model: self.matrix,
            freqs: if self.variant.has_empirical_freqs() {
                FrequencyMode::Empirical
            } else {
                FrequencyMode::Model
            },
            gamma_categories: self.variant.has_gamma().then_some(GAMMA_CATEGORIES),
        }
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Expands every base matrix of the group into its four variants, matrices in group order
/// and variants in the order `plain, +G, +F, +F+G`.
///
/// # Example
/// ```
/// use protsel::model_space::{enumerate, ModelGroup};
/// let candidates = enumerate(ModelGroup::Test);
/// let ids = candidates.iter().map(|c| c.id()).collect::<Vec<_>>();
/// assert_eq!(ids, ["LG", "LG+G", "LG+F", "LG+F+G", "WAG", "WAG+G", "WAG+F", "WAG+F+G"]);
/// ```
pub fn enumerate(group: ModelGroup) -> Vec<Candidate> {
    group
        .matrices()
        .iter()
        .flat_map(|&matrix| {
            Variant::ALL
                .iter()
                .map(move |&variant| Candidate::new(matrix, variant))
        })
        .collect()
}
