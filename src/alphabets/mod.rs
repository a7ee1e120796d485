use lazy_static::lazy_static;
use nalgebra::DVector;

use crate::frequencies;

pub type FreqVector = DVector<f64>;

pub const AMINOACIDS: &[u8] = b"ARNDCQEGHILKMFPSTWYV";
pub static AMB_AMINOACIDS: &[u8] = b"BJZX";
pub static GAP: u8 = b'-';
pub static POSSIBLE_GAPS: &[u8] = b"-.?*";

/// Number of free parameters of an empirically estimated amino acid frequency vector:
/// one frequency per amino acid, minus one because the frequencies sum to one.
pub const AA_FREQ_PARAMS: usize = AMINOACIDS.len() - 1;

#[derive(Debug, PartialEq)]
pub struct Alphabet {
    symbols: &'static [u8],
    ambiguous: &'static [u8],
    char_sets: &'static [FreqVector],
    index: &'static [usize; 255],
}

impl Alphabet {
    /// Checks that every character is an amino acid, an ambiguity code or a gap, ignoring case.
    pub fn is_word(&self, word: &[u8]) -> bool {
        word.to_ascii_uppercase()
            .iter()
            .all(|c| self.symbols.contains(c) | self.ambiguous.contains(c) | (*c == GAP))
    }

    pub fn symbols(&self) -> &[u8] {
        self.symbols
    }

    pub fn ambiguous(&self) -> &[u8] {
        self.ambiguous
    }

    /// Returns the distribution of a character over the unambiguous symbols.
    /// Gaps are encoded as all zeros and contribute nothing to counts.
    pub fn char_encoding(&self, char: u8) -> FreqVector {
        self.char_sets[char.to_ascii_uppercase() as usize].clone()
    }

    pub fn empty_freqs(&self) -> FreqVector {
        FreqVector::zeros(self.symbols.len())
    }

    pub fn index(&self, char: &u8) -> usize {
        self.index[*char as usize]
    }
}

pub fn protein_alphabet() -> Alphabet {
    Alphabet {
        symbols: AMINOACIDS,
        ambiguous: AMB_AMINOACIDS,
        char_sets: &PROTEIN_SETS,
        index: &AMINOACID_INDEX,
    }
}

/// Upper-cases a residue and maps every accepted gap symbol onto [`GAP`].
pub fn normalise_residue(char: u8) -> u8 {
    if POSSIBLE_GAPS.contains(&char) {
        GAP
    } else {
        char.to_ascii_uppercase()
    }
}

lazy_static! {
    pub static ref AMINOACID_INDEX: [usize; 255] = {
        let mut index = [0; 255];
        for (i, &char) in AMINOACIDS.iter().enumerate() {
            index[char as usize] = i;
            index[char.to_ascii_lowercase() as usize] = i;
        }
        index[GAP as usize] = 20;
        index
    };
    pub static ref PROTEIN_SETS: Vec<FreqVector> = {
        let mut map: Vec<FreqVector> = vec![frequencies!(&[0.0; 20]); 256];
        for (i, elem) in map.iter_mut().enumerate() {
            let char = i as u8;
            if char == GAP {
                continue;
            }
            elem.set_column(0, &generic_protein_sets(char));
        }
        map
    };
}

fn generic_protein_sets(char: u8) -> FreqVector {
    let index = &AMINOACID_INDEX;
    let mut set = frequencies!(&[0.0; 20]);
    match char.to_ascii_uppercase() {
        c if AMINOACIDS.contains(&c) => {
            set.fill_row(index[c as usize], 1.0);
        }
        b'B' => {
            set.fill_row(index[b'D' as usize], 0.5);
            set.fill_row(index[b'N' as usize], 0.5);
        }
        b'Z' => {
            set.fill_row(index[b'E' as usize], 0.5);
            set.fill_row(index[b'Q' as usize], 0.5);
        }
        b'J' => {
            set.fill_row(index[b'I' as usize], 0.5);
            set.fill_row(index[b'L' as usize], 0.5);
        }
        _ => set.fill(1.0 / 20.0),
    }
    set
}
