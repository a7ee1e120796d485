use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::bail;
use log::{debug, info, warn};
use tempfile::{Builder, TempDir};

use crate::io::DataError;
use crate::model_space::{Candidate, ProteinModelType};
use crate::oracle::{
    parse_log_likelihood, FrequencyMode, LikelihoodOracle, OracleArgs, OracleError, OracleScore,
    OracleSearch, SearchOptions,
};
use crate::tree::GuideTree;
use crate::Result;

/// Flags for unattended runs, PhyML must never stop to ask a question.
const BATCH_ARGS: [&str; 2] = ["--no_memory_check", "--quiet"];

/// PhyML run as an external process.
///
/// Every invocation gets a fresh temporary working directory holding a copy of the alignment,
/// so the artifacts PhyML names after its input never collide between runs.
#[derive(Debug, Clone)]
pub struct PhyML {
    binary: PathBuf,
    work_root: Option<PathBuf>,
}

struct PhyMLRun {
    stats: String,
    tree: Option<String>,
}

impl PhyML {
    pub fn new(binary: impl Into<PathBuf>) -> PhyML {
        PhyML {
            binary: binary.into(),
            work_root: None,
        }
    }

    /// Sets the folder the per-run working directories are created in,
    /// the system temporary folder by default.
    pub fn work_root(mut self, work_root: Option<PathBuf>) -> PhyML {
        self.work_root = work_root;
        self
    }

    fn workdir(&self) -> Result<TempDir> {
        let mut builder = Builder::new();
        builder.prefix("protsel_");
        Ok(match &self.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        })
    }

    fn run(
        &self,
        alignment: &Path,
        guide: Option<&GuideTree>,
        args: &[String],
    ) -> Result<PhyMLRun> {
        let Some(file_name) = alignment.file_name() else {
            bail!(DataError {
                message: format!("Not an alignment file: {}", alignment.display())
            });
        };
        let workdir = self.workdir()?;
        let local_alignment = workdir.path().join(file_name);
        fs::copy(alignment, &local_alignment)?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-i").arg(&local_alignment);
        if let Some(guide) = guide {
            let guide_file = workdir.path().join("guide_tree.newick");
            fs::write(&guide_file, guide.newick())?;
            cmd.arg("-u").arg(&guide_file);
        }
        cmd.args(args).args(BATCH_ARGS);
        debug!("Running {:?}", cmd);

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => bail!(OracleError::Unavailable {
                binary: self.binary.display().to_string(),
                reason: e.to_string(),
            }),
        };

        let Some(stats_file) = artifact(workdir.path(), file_name, "stats") else {
            debug!(
                "PhyML stderr: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            bail!(OracleError::NoOutput {
                artifact: String::from("stats file"),
                status: output.status.to_string(),
            });
        };
        if !output.status.success() {
            warn!(
                "PhyML returned {} but wrote {}, using it",
                output.status,
                stats_file.display()
            );
        }
        let stats = fs::read_to_string(&stats_file)?;
        let tree = match artifact(workdir.path(), file_name, "tree") {
            Some(tree_file) => Some(fs::read_to_string(tree_file)?),
            None => None,
        };
        Ok(PhyMLRun { stats, tree })
    }
}

/// Locates `<input>_phyml_<kind>.txt`, or `<input>_phyml_<kind>` as older PhyML versions name it.
fn artifact(dir: &Path, input: &OsStr, kind: &str) -> Option<PathBuf> {
    [format!("_phyml_{}.txt", kind), format!("_phyml_{}", kind)]
        .into_iter()
        .map(|suffix| {
            let mut name = OsString::from(input);
            name.push(suffix);
            dir.join(name)
        })
        .find(|path| path.is_file())
}

fn tree_text(run: PhyMLRun) -> Result<String> {
    match run.tree {
        Some(tree) if !tree.trim().is_empty() => Ok(tree.trim().to_string()),
        _ => bail!(OracleError::NoOutput {
            artifact: String::from("tree file"),
            status: String::from("stats file written without a tree"),
        }),
    }
}

impl LikelihoodOracle for PhyML {
    fn check(&self) -> Result<()> {
        match Command::new(&self.binary).arg("--version").output() {
            Ok(output) => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!(
                    "Using PhyML at {}: {}",
                    self.binary.display(),
                    version
                        .lines()
                        .find(|l| !l.trim().is_empty())
                        .unwrap_or_default()
                        .trim()
                );
                Ok(())
            }
            Err(e) => bail!(OracleError::Unavailable {
                binary: self.binary.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn score(
        &self,
        candidate: &Candidate,
        alignment: &Path,
        guide: &GuideTree,
    ) -> Result<OracleScore> {
        let mut args = candidate.oracle_args().to_args();
        args.extend(["-o", "lr", "-b", "0"].map(String::from));
        let run = self.run(alignment, Some(guide), &args)?;
        Ok(OracleScore {
            log_likelihood: parse_log_likelihood(&run.stats)?,
            stats: run.stats,
        })
    }

    fn guide_tree(&self, alignment: &Path) -> Result<String> {
        info!("Building BioNJ guide tree under LG");
        let mut args = OracleArgs {
            model: ProteinModelType::LG,
            freqs: FrequencyMode::Model,
            gamma_categories: None,
        }
        .to_args();
        args.extend(["-o", "lr", "-b", "0"].map(String::from));
        tree_text(self.run(alignment, None, &args)?)
    }

    fn search(
        &self,
        args: &OracleArgs,
        alignment: &Path,
        guide: &GuideTree,
        options: &SearchOptions,
    ) -> Result<OracleSearch> {
        info!(
            "Searching tree topology with {} moves under {}",
            options.moves, args
        );
        let mut phyml_args = args.to_args();
        phyml_args.extend([
            String::from("-o"),
            String::from("tlr"),
            String::from("-s"),
            options.moves.to_string(),
            String::from("-b"),
            options.bootstrap.to_string(),
        ]);
        let run = self.run(alignment, Some(guide), &phyml_args)?;
        let log_likelihood = parse_log_likelihood(&run.stats)?;
        let stats = run.stats.clone();
        Ok(OracleSearch {
            log_likelihood,
            tree: tree_text(run)?,
            stats,
        })
    }
}
