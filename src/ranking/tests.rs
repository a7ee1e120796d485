use rstest::*;

use approx::assert_relative_eq;
use assert_matches::assert_matches;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::assert_float_relative_slice_eq;
use crate::information_criteria::FitRecord;
use crate::model_space::{enumerate, Candidate, ModelGroup, ProteinModelType as PMT, Variant};
use crate::oracle::FrequencyMode;
use crate::ranking::{raw_weight, Ranking, RankingError};

fn fit_with_bic(candidate: Candidate, bic: f64) -> FitRecord {
    FitRecord {
        candidate,
        total_params: 7 + candidate.extra_params(),
        sites_per_param: 10.0,
        log_likelihood: -bic / 2.0,
        aic: bic,
        aicc: Some(bic),
        bic,
    }
}

fn fits_with_bics(bics: &[f64]) -> Vec<FitRecord> {
    enumerate(ModelGroup::Combined)
        .into_iter()
        .zip(bics)
        .map(|(candidate, &bic)| fit_with_bic(candidate, bic))
        .collect()
}

fn ids(ranking: &Ranking) -> Vec<String> {
    ranking.records().iter().map(|r| r.id()).collect()
}

fn weights(ranking: &Ranking) -> Vec<f64> {
    ranking.records().iter().map(|r| r.bic_weight).collect()
}

#[test]
fn three_candidate_weights() {
    let ranking = Ranking::new(fits_with_bics(&[100.0, 102.0, 110.0])).unwrap();
    let deltas = ranking
        .records()
        .iter()
        .map(|r| r.delta_bic)
        .collect::<Vec<_>>();
    assert_eq!(deltas, [0.0, 2.0, 10.0]);
    assert_float_relative_slice_eq(
        &weights(&ranking),
        &[0.7274751568004648, 0.2676231541498624, 0.004901689049672921],
        1e-12,
    );
    let cumulative = ranking
        .records()
        .iter()
        .map(|r| r.cumulative_bic_weight)
        .collect::<Vec<_>>();
    assert_float_relative_slice_eq(&cumulative, &[0.7275, 0.9951, 1.0], 1e-4);
}

#[test]
fn sorted_ascending_by_bic() {
    let ranking = Ranking::new(fits_with_bics(&[130.0, 100.0, 120.0, 110.0])).unwrap();
    assert_eq!(ids(&ranking), ["LG+G", "LG+F+G", "LG+F", "LG"]);
    let bics = ranking
        .records()
        .iter()
        .map(|r| r.fit.bic)
        .collect::<Vec<_>>();
    assert_eq!(bics, [100.0, 110.0, 120.0, 130.0]);
    assert_eq!(ranking.len(), 4);
    assert!(!ranking.is_empty());
}

#[rstest]
#[case::single(vec![42.0])]
#[case::spread(vec![1000.0, 1003.5, 999.2, 1010.0, 1001.1])]
#[case::ties(vec![500.0, 500.0, 500.0, 501.0])]
#[case::huge_deltas(vec![10.0, 5000.0, 1e6, 1e300])]
#[case::negative_bics(vec![-200.0, -150.0, -199.0])]
fn ranking_invariants(#[case] bics: Vec<f64>) {
    let ranking = Ranking::new(fits_with_bics(&bics)).unwrap();
    assert_eq!(ranking.len(), bics.len());

    let best = ranking.best();
    assert_eq!(best.delta_bic, 0.0);
    assert!(ranking.records().iter().all(|r| r.delta_bic >= 0.0));

    let total: f64 = weights(&ranking).iter().sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-6);

    let mut prev = 0.0;
    for record in ranking.records() {
        assert!(record.cumulative_bic_weight >= prev);
        assert!((0.0..=1.0).contains(&record.bic_weight));
        prev = record.cumulative_bic_weight;
    }
    assert_relative_eq!(prev, total, epsilon = 1e-12);
}

#[test]
fn large_deltas_underflow_to_zero_weight() {
    assert_eq!(raw_weight(0.0), 1.0);
    assert_eq!(raw_weight(1e6), 0.0);
    assert_eq!(raw_weight(f64::MAX), 0.0);
    assert_eq!(raw_weight(f64::INFINITY), 0.0);
    assert!(raw_weight(1490.0) > 0.0);
    assert_eq!(raw_weight(1500.0), 0.0);

    let ranking = Ranking::new(fits_with_bics(&[10.0, 1e5, 2e5])).unwrap();
    assert_eq!(weights(&ranking), [1.0, 0.0, 0.0]);
    assert_eq!(ranking.records()[2].cumulative_bic_weight, 1.0);
}

#[test]
fn ties_keep_enumeration_order() {
    let ranking = Ranking::new(fits_with_bics(&[200.0, 100.0, 100.0, 150.0, 100.0])).unwrap();
    assert_eq!(ids(&ranking), ["LG+G", "LG+F", "WAG", "LG+F+G", "LG"]);
    assert_eq!(ranking.best().id(), "LG+G");
    let tied = &weights(&ranking)[0..3];
    assert!(tied.iter().all(|&w| w == tied[0]));
}

#[test]
fn ties_follow_input_order_when_shuffled() {
    let mut fits = fits_with_bics(&[100.0; 12]);
    let mut rng = StdRng::seed_from_u64(7);
    fits.shuffle(&mut rng);
    let input_ids = fits.iter().map(|f| f.id()).collect::<Vec<_>>();
    let ranking = Ranking::new(fits.clone()).unwrap();
    assert_eq!(ids(&ranking), input_ids);
    assert_eq!(Ranking::new(fits).unwrap(), ranking);
}

#[test]
fn distinct_bics_independent_of_input_order() {
    let fits = fits_with_bics(&[
        310.0, 305.5, 300.1, 320.0, 299.9, 350.0, 301.0, 302.0, 303.0, 304.0,
    ]);
    let expected = Ranking::new(fits.clone()).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let mut shuffled = fits.clone();
        shuffled.shuffle(&mut rng);
        let ranking = Ranking::new(shuffled).unwrap();
        assert_eq!(ids(&ranking), ids(&expected));
        assert_eq!(weights(&ranking), weights(&expected));
    }
}

#[test]
fn no_candidates_scored() {
    let res = Ranking::new(vec![]);
    assert_matches!(
        res.unwrap_err().downcast_ref::<RankingError>(),
        Some(RankingError::NoCandidatesScored)
    );
}

#[test]
fn unscorable_candidates_are_excluded() {
    let ranking =
        Ranking::new(fits_with_bics(&[f64::NAN, 120.0, f64::INFINITY, 110.0])).unwrap();
    assert_eq!(ids(&ranking), ["LG+F+G", "LG+G"]);
    assert_eq!(ranking.unscorable().len(), 2);
    assert_matches!(
        &ranking.unscorable()[0],
        RankingError::UnscorableCandidate { id, bic } if id == "LG" && bic.is_nan()
    );
    assert_matches!(
        &ranking.unscorable()[1],
        RankingError::UnscorableCandidate { id, .. } if id == "LG+F"
    );
    assert_relative_eq!(weights(&ranking).iter().sum::<f64>(), 1.0);
}

#[test]
fn only_unscorable_candidates() {
    let res = Ranking::new(fits_with_bics(&[f64::NAN, f64::NEG_INFINITY]));
    assert_matches!(
        res.unwrap_err().downcast_ref::<RankingError>(),
        Some(RankingError::NoCandidatesScored)
    );
}

#[test]
fn selection_carries_oracle_args() {
    let fits = vec![
        fit_with_bic(Candidate::new(PMT::WAG, Variant::Plain), 300.0),
        fit_with_bic(Candidate::new(PMT::JTT, Variant::FreqsGamma), 250.0),
        fit_with_bic(Candidate::new(PMT::LG, Variant::Gamma), 260.0),
    ];
    let selection = Ranking::new(fits).unwrap().selection();
    assert_eq!(selection.record.id(), "JTT+F+G");
    assert_eq!(selection.record.delta_bic, 0.0);
    assert_eq!(selection.oracle_args.model, PMT::JTT);
    assert_eq!(selection.oracle_args.freqs, FrequencyMode::Empirical);
    assert_eq!(selection.oracle_args.gamma_categories, Some(4));
    assert_eq!(
        format!("{}", selection),
        "Best model: JTT+F+G (phyml -d aa -m JTT -f e -c 4 -a e)"
    );
}

#[test]
fn selection_eligible_with_degenerate_aicc() {
    let mut fits = fits_with_bics(&[120.0, 100.0]);
    fits[1].aicc = None;
    let ranking = Ranking::new(fits).unwrap();
    assert_eq!(ranking.selection().record.id(), "LG+G");
    assert_eq!(ranking.best().fit.aicc, None);
}
