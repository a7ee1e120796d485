//! Information criteria for a scored candidate.
//!
//! All three criteria trade the log-likelihood against the number of free parameters K,
//! which counts the branch lengths of the guide topology and the extra parameters of the
//! candidate's variant. BIC is the one used for selection; AIC and AICc are reported only.

use std::error::Error;
use std::fmt;

use anyhow::bail;
use log::warn;

use crate::model_space::Candidate;
use crate::Result;

/// Below this many sites per free parameter AICc is the more reliable of the Akaike criteria.
pub const AICC_SITES_PER_PARAM: f64 = 40.0;

pub enum CriterionError {
    NoFreeParameters,
    DegenerateAICc { n_sites: usize, total_params: usize },
}

impl fmt::Debug for CriterionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for CriterionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionError::NoFreeParameters => write!(f, "Model has no free parameters"),
            CriterionError::DegenerateAICc {
                n_sites,
                total_params,
            } => write!(
                f,
                "AICc is undefined for {} sites and {} parameters, need more sites than parameters + 1",
                n_sites, total_params
            ),
        }
    }
}

impl Error for CriterionError {}

/// AIC = -2 lnL + 2K
pub fn aic(log_likelihood: f64, total_params: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * total_params as f64
}

/// AICc = AIC + 2K(K + 1) / (n - K - 1).
/// Fails when n - K - 1 is not positive.
pub fn aicc(log_likelihood: f64, total_params: usize, n_sites: usize) -> Result<f64> {
    let k = total_params as f64;
    let denominator = n_sites as f64 - k - 1.0;
    if denominator <= 0.0 {
        bail!(CriterionError::DegenerateAICc {
            n_sites,
            total_params
        });
    }
    Ok(aic(log_likelihood, total_params) + 2.0 * k * (k + 1.0) / denominator)
}

/// BIC = -2 lnL + K ln(n)
pub fn bic(log_likelihood: f64, total_params: usize, n_sites: usize) -> f64 {
    -2.0 * log_likelihood + total_params as f64 * (n_sites as f64).ln()
}

/// Scored outcome of one candidate. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRecord {
    pub candidate: Candidate,
    pub total_params: usize,
    pub sites_per_param: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    /// `None` when there are too few sites for the number of parameters.
    pub aicc: Option<f64>,
    pub bic: f64,
}

impl FitRecord {
    /// Computes the criteria for a candidate scored at `log_likelihood` on a tree with
    /// `n_branches` branches over `n_sites` alignment sites.
    ///
    /// # Example
    /// ```
    /// use protsel::information_criteria::FitRecord;
    /// use protsel::model_space::{Candidate, ProteinModelType, Variant};
    /// let lg_g = Candidate::new(ProteinModelType::LG, Variant::Gamma);
    /// let fit = FitRecord::new(lg_g, -1000.0, 7, 200).unwrap();
    /// assert_eq!(fit.total_params, 8);
    /// assert_eq!(fit.aic, 2016.0);
    /// assert!(fit.aicc.is_some());
    /// ```
    pub fn new(
        candidate: Candidate,
        log_likelihood: f64,
        n_branches: usize,
        n_sites: usize,
    ) -> Result<FitRecord> {
        let total_params = n_branches + candidate.extra_params();
        if total_params == 0 {
            bail!(CriterionError::NoFreeParameters);
        }
        let aicc = match aicc(log_likelihood, total_params, n_sites) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}: {}", candidate, e);
                None
            }
        };
        Ok(FitRecord {
            candidate,
            total_params,
            sites_per_param: n_sites as f64 / total_params as f64,
            log_likelihood,
            aic: aic(log_likelihood, total_params),
            aicc,
            bic: bic(log_likelihood, total_params, n_sites),
        })
    }

    pub fn id(&self) -> String {
        self.candidate.id()
    }

    /// Too few sites per parameter for plain AIC to be trusted.
    pub fn prefers_aicc(&self) -> bool {
        self.sites_per_param < AICC_SITES_PER_PARAM
    }
}
