use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use clap::{Parser, ValueEnum};

use protsel::model_space::ModelGroup;
use protsel::oracle::{SearchOptions, TopologyMoves};

use crate::Result;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Protein alignment in sequential PHYLIP format
    #[arg(short = 'i', long, value_name = "ALIGNMENT_FILE")]
    pub(super) alignment: PathBuf,

    /// Group of candidate matrices: nuclear, organellar, viral, combined or test
    #[arg(short, long, value_name = "GROUP", default_value = "nuclear")]
    pub(super) group: String,

    /// Guide tree in newick format, built by PhyML if not given
    #[arg(short, long, value_name = "TREE_FILE")]
    pub(super) tree: Option<PathBuf>,

    /// Output folder, defaults to the folder of the alignment
    #[arg(short, long, value_name = "OUT_FOLDER")]
    pub(super) out_folder: Option<PathBuf>,

    /// Prefix of the output files, defaults to the alignment file name without extension
    #[arg(short, long, value_name = "PREFIX")]
    pub(super) prefix: Option<String>,

    /// PhyML executable
    #[arg(long, value_name = "PHYML", env = "PROTSEL_PHYML", default_value = "phyml")]
    pub(super) phyml: PathBuf,

    /// Run a maximum likelihood tree search under the selected model
    #[arg(long)]
    pub(super) search: bool,

    /// Topology moves of the tree search
    #[arg(short = 's', long, value_enum, default_value_t = Moves::Spr)]
    pub(super) moves: Moves,

    /// Bootstrap replicates of the tree search, negative values select aLRT branch support
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    pub(super) bootstrap: i32,

    /// Log debug messages on the console
    #[arg(short, long)]
    pub(super) verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub(super) enum Moves {
    Nni,
    Spr,
    Best,
}

impl From<Moves> for TopologyMoves {
    fn from(moves: Moves) -> Self {
        match moves {
            Moves::Nni => TopologyMoves::NNI,
            Moves::Spr => TopologyMoves::SPR,
            Moves::Best => TopologyMoves::BEST,
        }
    }
}

pub(super) struct ConfigBuilder {
    alignment: PathBuf,
    group: String,
    input_tree: Option<PathBuf>,
    out_folder: Option<PathBuf>,
    prefix: Option<String>,
    phyml: PathBuf,
    search: Option<SearchOptions>,
    verbose: bool,
}

impl From<Cli> for ConfigBuilder {
    fn from(cli: Cli) -> Self {
        ConfigBuilder {
            alignment: cli.alignment,
            group: cli.group,
            input_tree: cli.tree,
            out_folder: cli.out_folder,
            prefix: cli.prefix,
            phyml: cli.phyml,
            search: cli.search.then_some(SearchOptions {
                moves: cli.moves.into(),
                bootstrap: cli.bootstrap,
            }),
            verbose: cli.verbose,
        }
    }
}

impl ConfigBuilder {
    pub(super) fn setup(self) -> Result<Config> {
        let group = ModelGroup::from_str(&self.group)?;
        if !self.alignment.is_file() {
            bail!("Alignment file {} does not exist", self.alignment.display());
        }
        if let Some(tree) = &self.input_tree {
            if !tree.is_file() {
                bail!("Tree file {} does not exist", tree.display());
            }
        }

        let out_folder = match self.out_folder {
            Some(folder) => folder,
            None => match self.alignment.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        if let Err(e) = fs::create_dir_all(&out_folder) {
            bail!(
                "Unable to create output folder {}: {}",
                out_folder.display(),
                e
            );
        }

        let prefix = match self.prefix {
            Some(prefix) => prefix,
            None => match self.alignment.file_stem() {
                Some(stem) => stem.to_string_lossy().to_string(),
                None => bail!("Cannot derive an output prefix from {}", self.alignment.display()),
            },
        };

        let out_report = out_folder.join(format!("{}.protsel.tsv", prefix));
        let out_tree = out_folder.join(format!("{}.protsel.tree", prefix));
        if out_report.exists() {
            bail!("Output file {} already exists", out_report.display());
        }
        if self.search.is_some() && out_tree.exists() {
            bail!("Output file {} already exists", out_tree.display());
        }

        Ok(Config {
            out_report,
            out_log: out_folder.join(format!("{}.protsel.log", prefix)),
            out_tree,
            alignment: self.alignment,
            group,
            input_tree: self.input_tree,
            phyml: self.phyml,
            search: self.search,
            verbose: self.verbose,
        })
    }
}

#[derive(Debug)]
pub(super) struct Config {
    pub(super) alignment: PathBuf,
    pub(super) group: ModelGroup,
    pub(super) input_tree: Option<PathBuf>,
    pub(super) phyml: PathBuf,
    pub(super) search: Option<SearchOptions>,
    pub(super) verbose: bool,
    pub(super) out_report: PathBuf,
    pub(super) out_log: PathBuf,
    pub(super) out_tree: PathBuf,
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Alignment: {}", self.alignment.display())?;
        writeln!(f, "  Model group: {}", self.group)?;
        match &self.input_tree {
            Some(tree) => writeln!(f, "  Guide tree: {}", tree.display())?,
            None => writeln!(f, "  Guide tree: built by PhyML")?,
        }
        writeln!(f, "  PhyML: {}", self.phyml.display())?;
        match &self.search {
            Some(options) => writeln!(
                f,
                "  Tree search: {} moves, {} bootstrap replicates",
                options.moves, options.bootstrap
            )?,
            None => writeln!(f, "  Tree search: off")?,
        }
        writeln!(f, "  Report: {}", self.out_report.display())?;
        if self.search.is_some() {
            writeln!(f, "  Tree: {}", self.out_tree.display())?;
        }
        write!(f, "  Log: {}", self.out_log.display())
    }
}
