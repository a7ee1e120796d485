use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::bail;
use bio::io::fasta::Record;
use log::info;

use crate::alignment::Alignment;
use crate::alphabets::normalise_residue;
use crate::report::Report;
use crate::tree::{tree_parser, GuideTree};
use crate::Result;

pub(crate) struct DataError {
    pub(crate) message: String,
}
impl fmt::Debug for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl Error for DataError {}

/// Reads a protein alignment in sequential PHYLIP format.
///
/// The first line holds the number of sequences and the number of sites. Every following
/// non-empty line is a sequence id followed by its residues; whitespace between residues is
/// ignored, residues are converted to uppercase and all gap symbols are converted to `-`.
///
/// # Arguments
/// * `path` - Path to the PHYLIP file.
///
/// # Example
/// ```
/// use protsel::io::read_phylip;
/// use std::path::PathBuf;
/// let msa = read_phylip(&PathBuf::from("./data/aa_5x40.phy")).unwrap();
/// # assert_eq!(msa.seq_count(), 5);
/// # assert_eq!(msa.msa_len(), 40);
/// ```
pub fn read_phylip(path: &Path) -> Result<Alignment> {
    info!("Reading alignment from file {}", path.display());
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        bail!(DataError {
            message: String::from("Empty alignment file")
        });
    };
    let (seq_count, msa_len) = parse_phylip_header(header)?;

    let mut sequences = Vec::with_capacity(seq_count);
    for line in lines {
        let mut fields = line.split_whitespace();
        let Some(id) = fields.next() else {
            continue;
        };
        let seq: Vec<u8> = fields
            .flat_map(|field| field.bytes())
            .map(normalise_residue)
            .collect();
        if seq.len() != msa_len {
            bail!(DataError {
                message: format!(
                    "Sequence {} has {} sites, header declares {}",
                    id,
                    seq.len(),
                    msa_len
                )
            });
        }
        sequences.push(Record::with_attrs(id, None, &seq));
    }
    if sequences.len() != seq_count {
        bail!(DataError {
            message: format!(
                "Found {} sequences, header declares {}",
                sequences.len(),
                seq_count
            )
        });
    }

    let msa = Alignment::new(sequences)?;
    info!(
        "Read {} sequences of {} sites successfully",
        msa.seq_count(),
        msa.msa_len()
    );
    Ok(msa)
}

fn parse_phylip_header(header: &str) -> Result<(usize, usize)> {
    let counts = header
        .split_whitespace()
        .map(|field| field.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>();
    match counts.as_deref() {
        Ok([seq_count, msa_len]) => Ok((*seq_count, *msa_len)),
        _ => bail!(DataError {
            message: format!(
                "Malformed PHYLIP header, expected sequence and site counts: {}",
                header.trim()
            )
        }),
    }
}

/// Reads newick trees from a file, returning a vector of trees.
///
/// # Arguments
/// * `path` - Path to the newick file.
///
/// # Example
/// ```
/// use protsel::io::read_newick_from_file;
/// use std::path::PathBuf;
/// let trees = read_newick_from_file(&PathBuf::from("./data/aa_5.newick")).unwrap();
/// # assert_eq!(trees.len(), 1);
/// # assert_eq!(trees[0].leaf_count(), 5);
/// ```
pub fn read_newick_from_file(path: &Path) -> Result<Vec<GuideTree>> {
    info!("Reading newick trees from file {}", path.display());
    let newick = fs::read_to_string(path)?;
    info!("Read file successfully");
    tree_parser::from_newick(&newick)
}

/// Writes newick trees to the given file path, one per line.
/// Will return an error if the file already exists.
pub fn write_newick_to_file(trees: &[GuideTree], path: &Path) -> Result<()> {
    info!("Writing newick trees to file {}", path.display());
    let mut writer = create_new(path)?;
    for tree in trees {
        writer.write_all(tree.newick().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    info!("Finished writing successfully");
    Ok(())
}

/// Writes the model selection report to the given file path.
/// Will return an error if the file already exists.
pub fn write_report_to_file(report: &Report, path: &Path) -> Result<()> {
    info!("Writing model selection report to file {}", path.display());
    let mut writer = create_new(path)?;
    write!(writer, "{}", report)?;
    info!("Finished writing successfully");
    Ok(())
}

fn create_new(path: &Path) -> Result<File> {
    if path.exists() {
        bail!(DataError {
            message: format!("File already exists: {}", path.display())
        });
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
