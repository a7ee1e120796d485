use std::collections::HashSet;

use anyhow::bail;
use bio::io::fasta::Record;

use crate::alphabets::{protein_alphabet, FreqVector};
use crate::io::DataError;
use crate::Result;

/// Aligned protein sequences as read from the input file.
///
/// Construction checks that the rows form a proper protein alignment: at least three sequences
/// (the smallest unrooted bifurcating tree), unique ids, equal lengths and only protein residues.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    seqs: Vec<Record>,
    msa_len: usize,
}

impl Alignment {
    pub fn new(seqs: Vec<Record>) -> Result<Alignment> {
        if seqs.len() < 3 {
            bail!(DataError {
                message: format!(
                    "At least 3 sequences are required for an unrooted tree, found {}",
                    seqs.len()
                )
            });
        }
        let msa_len = seqs[0].seq().len();
        if msa_len == 0 {
            bail!(DataError {
                message: String::from("Alignment has no sites")
            });
        }

        let mut ids = HashSet::with_capacity(seqs.len());
        let alphabet = protein_alphabet();
        for rec in seqs.iter() {
            if !ids.insert(rec.id()) {
                bail!(DataError {
                    message: format!("Duplicate sequence id: {}", rec.id())
                });
            }
            if rec.seq().len() != msa_len {
                bail!(DataError {
                    message: format!(
                        "Sequences are not aligned, {} has {} sites instead of {}",
                        rec.id(),
                        rec.seq().len(),
                        msa_len
                    )
                });
            }
            if !alphabet.is_word(rec.seq()) {
                bail!(DataError {
                    message: format!("Invalid protein sequence encountered: {}", rec.id())
                });
            }
        }
        Ok(Alignment { seqs, msa_len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.seqs.iter()
    }

    /// Number of sequences.
    pub fn seq_count(&self) -> usize {
        self.seqs.len()
    }

    /// Number of sites.
    pub fn msa_len(&self) -> usize {
        self.msa_len
    }

    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|rec| rec.id().to_string()).collect()
    }

    /// Number of branches of an unrooted bifurcating tree on these sequences, i.e. 2n - 3.
    /// Each branch length is a free parameter of every candidate model.
    pub fn branch_count(&self) -> usize {
        2 * self.seq_count() - 3
    }

    /// Returns the empirical amino acid composition of the alignment.
    /// Ambiguity codes are spread over the amino acids they stand for and gaps are skipped.
    /// If an amino acid is absent from the data, its count is artificially set to one.
    pub fn freqs(&self) -> FreqVector {
        let alphabet = protein_alphabet();
        let mut freqs = alphabet.empty_freqs();
        for &char in alphabet.symbols().iter().chain(alphabet.ambiguous()) {
            let count = self
                .iter()
                .map(|rec| {
                    rec.seq()
                        .iter()
                        .filter(|c| c.to_ascii_uppercase() == char)
                        .count()
                })
                .sum::<usize>() as f64;
            freqs += alphabet.char_encoding(char).scale(count);
        }
        for char in alphabet.symbols().iter() {
            let idx = alphabet.index(char);
            if freqs[idx] == 0.0 {
                freqs[idx] = 1.0;
            }
        }
        freqs.scale_mut(1.0 / freqs.sum());
        freqs
    }
}
