use std::fmt::{self, Display};

use itertools::join;

use crate::alphabets::{protein_alphabet, FreqVector};
use crate::information_criteria::AICC_SITES_PER_PARAM;
use crate::model_selection::{CandidateFailure, SelectionOutcome};
use crate::ranking::{RankedRecord, Ranking};

pub const HEADER: [&str; 10] = [
    "model", "K", "sites/K", "lnL", "AIC", "AICc", "BIC", "deltaBIC", "BICw", "BICcumW",
];

/// Tab separated table of a ranking, best candidate first, followed by a footer of `#` lines.
#[derive(Debug, Clone)]
pub struct Report {
    ranking: Ranking,
    failures: Vec<CandidateFailure>,
    composition: Option<FreqVector>,
}

impl Report {
    pub fn new(ranking: Ranking, failures: Vec<CandidateFailure>) -> Report {
        Report {
            ranking,
            failures,
            composition: None,
        }
    }

    /// Adds the amino acid composition of the alignment to the footer.
    pub fn composition(mut self, freqs: FreqVector) -> Report {
        self.composition = Some(freqs);
        self
    }
}

impl From<SelectionOutcome> for Report {
    fn from(outcome: SelectionOutcome) -> Self {
        Report::new(outcome.ranking, outcome.failures).composition(outcome.composition)
    }
}

fn composition_line(freqs: &FreqVector) -> String {
    let alphabet = protein_alphabet();
    join(
        alphabet
            .symbols()
            .iter()
            .map(|aa| format!("{}={:.4}", *aa as char, freqs[alphabet.index(aa)])),
        " ",
    )
}

fn row(record: &RankedRecord) -> String {
    let fit = &record.fit;
    let aicc = match fit.aicc {
        Some(aicc) => format!("{:.4}", aicc),
        None => String::from("NA"),
    };
    [
        fit.id(),
        fit.total_params.to_string(),
        format!("{:.2}", fit.sites_per_param),
        format!("{:.4}", fit.log_likelihood),
        format!("{:.4}", fit.aic),
        aicc,
        format!("{:.4}", fit.bic),
        format!("{:.4}", record.delta_bic),
        format!("{:.4}", record.bic_weight),
        format!("{:.4}", record.cumulative_bic_weight),
    ]
    .join("\t")
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER.join("\t"))?;
        for record in self.ranking.records() {
            writeln!(f, "{}", row(record))?;
        }

        let selection = self.ranking.selection();
        writeln!(f, "# {}", selection)?;
        if selection.record.fit.prefers_aicc() {
            writeln!(
                f,
                "# {} has {:.2} sites per parameter (< {}), prefer AICc over AIC",
                selection.record.id(),
                selection.record.fit.sites_per_param,
                AICC_SITES_PER_PARAM
            )?;
        }
        if let Some(freqs) = &self.composition {
            writeln!(f, "# Composition: {}", composition_line(freqs))?;
        }
        for unscorable in self.ranking.unscorable() {
            writeln!(f, "# Unscorable: {}", unscorable)?;
        }
        for failure in &self.failures {
            writeln!(f, "# Failed: {}", failure)?;
        }
        Ok(())
    }
}
