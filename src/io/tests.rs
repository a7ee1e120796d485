use rstest::*;

use std::fs;
use std::path::PathBuf;

use assert_matches::assert_matches;
use tempfile::tempdir;

use crate::information_criteria::FitRecord;
use crate::io::{
    read_newick_from_file, read_phylip, write_newick_to_file, write_report_to_file, DataError,
};
use crate::model_space::{enumerate, ModelGroup};
use crate::ranking::Ranking;
use crate::report::Report;
use crate::tree;
use crate::tree::tree_parser::ParsingError;

#[test]
fn reading_sequential_phylip() {
    let msa = read_phylip(&PathBuf::from("./data/aa_5x40.phy")).unwrap();
    assert_eq!(msa.seq_count(), 5);
    assert_eq!(msa.msa_len(), 40);
    assert_eq!(msa.ids(), ["Alpha", "Beta", "Gamma", "Delta", "Epsilon"]);
    let first = msa.iter().next().unwrap();
    assert_eq!(first.seq(), b"MKVLAAGIVGLLLAGCSSHKEEPTAQNWYDRFGTCMIVKE");
    assert_eq!(first.desc(), None);
}

#[test]
fn reading_blocked_phylip() {
    let blocks = read_phylip(&PathBuf::from("./data/aa_5x40_blocks.phy")).unwrap();
    assert_eq!(blocks.seq_count(), 5);
    assert_eq!(blocks.msa_len(), 40);
    let seqs = blocks.iter().map(|rec| rec.seq()).collect::<Vec<_>>();
    assert_eq!(seqs[1], b"MKVLSAGIVGLLLAGCSSHKEDPTAQNWYERFGTCMIVKE");
    assert_eq!(&seqs[2][0..5], b"---LA");
}

#[rstest]
#[case::bad_count("./data/aa_bad_count.phy", "Found 5 sequences, header declares 6")]
#[case::bad_length("./data/aa_bad_length.phy", "Sequence Delta has 38 sites, header declares 40")]
#[case::bad_header("./data/aa_bad_header.phy", "Malformed PHYLIP header")]
#[case::bad_chars("./data/aa_bad_chars.phy", "Invalid protein sequence encountered: Gamma")]
#[case::two_seqs("./data/aa_two_seqs.phy", "At least 3 sequences")]
#[case::duplicate_ids("./data/aa_duplicate_ids.phy", "Duplicate sequence id: Alpha")]
fn reading_incorrect_phylip(#[case] input: &str, #[case] exp_error: &str) {
    let res = read_phylip(&PathBuf::from(input));
    let err = res.unwrap_err();
    assert_matches!(err.downcast_ref::<DataError>(), Some(_));
    assert!(
        err.to_string().contains(exp_error),
        "'{}' does not contain '{}'",
        err,
        exp_error
    );
}

#[test]
fn reading_empty_phylip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.phy");
    fs::write(&path, "\n\n").unwrap();
    let err = read_phylip(&path).unwrap_err();
    assert_eq!(err.to_string(), "Empty alignment file");
}

#[test]
fn reading_nonexistent_phylip() {
    let res = read_phylip(&PathBuf::from("./data/nonexistent.phy"));
    assert!(res.is_err());
    assert!(res.unwrap_err().downcast_ref::<DataError>().is_none());
}

#[test]
fn reading_newick() {
    let trees = read_newick_from_file(&PathBuf::from("./data/aa_5_multiple.newick")).unwrap();
    assert_eq!(trees.len(), 2);
    assert!(trees[0].is_unrooted());
    assert!(!trees[1].is_unrooted());
    assert_eq!(trees[1].leaf_count(), 5);

    let trees = read_newick_from_file(&PathBuf::from("./data/empty.newick")).unwrap();
    assert!(trees.is_empty());
}

#[test]
fn reading_malformed_newick() {
    let res = read_newick_from_file(&PathBuf::from("./data/malformed.newick"));
    assert_matches!(res.unwrap_err().downcast_ref::<ParsingError>(), Some(_));
}

#[test]
fn write_newick_and_read_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.newick");
    let trees = [
        tree!("((A:1.0,B:2.0):0.5,C:0.1,D:0.3);"),
        tree!("(((A,B),C),D);"),
    ];
    write_newick_to_file(&trees, &path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert_eq!(read_newick_from_file(&path).unwrap(), trees);
}

#[test]
fn write_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.newick");
    fs::write(&path, "keep me").unwrap();
    let err = write_newick_to_file(&[tree!("(A,B,C);")], &path).unwrap_err();
    assert!(err.to_string().starts_with("File already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
}

#[test]
fn write_report() {
    let fits = enumerate(ModelGroup::Test)
        .into_iter()
        .zip([-1010.0, -1000.0, -1002.0, -1001.0, -1020.0, -1005.0, -1008.0, -1007.0])
        .map(|(candidate, logl)| FitRecord::new(candidate, logl, 7, 40).unwrap())
        .collect::<Vec<_>>();
    let report = Report::new(Ranking::new(fits).unwrap(), vec![]);

    let dir = tempdir().unwrap();
    let path = dir.path().join("aa.protsel.tsv");
    write_report_to_file(&report, &path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, report.to_string());
    assert!(content.lines().nth(1).unwrap().starts_with("LG+G\t8\t5.00\t"));

    let err = write_report_to_file(&report, &path).unwrap_err();
    assert_matches!(err.downcast_ref::<DataError>(), Some(_));
}
