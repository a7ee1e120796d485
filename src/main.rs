use std::result::Result::Ok;

use anyhow::{bail, Error};
use clap::Parser;
use ftail::Ftail;
use log::{info, warn, LevelFilter};

use protsel::io::{write_newick_to_file, write_report_to_file};
use protsel::model_selection::ModelSelector;
use protsel::oracle::{LikelihoodOracle, PhyML};
use protsel::phylo_info::PhyloInfoBuilder;
use protsel::report::Report;
use protsel::tree::tree_parser::from_newick;

mod cli;
use crate::cli::{Cli, Config, ConfigBuilder};

type Result<T> = std::result::Result<T, Error>;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            if !error.use_stderr() {
                error.exit();
            }
            bail!("Unable to parse command line arguments: \n {}", error)
        }
    };
    let cfg_build: ConfigBuilder = cli.into();
    let cfg = cfg_build.setup()?;
    init_logging(&cfg)?;

    info!("protsel run started.");
    info!("{}", cfg);

    let phyml = PhyML::new(cfg.phyml.clone());
    phyml.check()?;

    let info = PhyloInfoBuilder::new(cfg.alignment.clone())
        .tree_file(cfg.input_tree.clone())
        .build()?;

    let outcome = ModelSelector::new(&phyml, &info)
        .group(cfg.group)
        .run()?;
    for failure in &outcome.failures {
        warn!("Not ranked: {}", failure);
    }
    let selection = outcome.selection();
    let guide_tree = outcome.guide_tree.clone();
    info!("{}", selection);

    info!("Putting model selection report in {}", cfg.out_report.display());
    write_report_to_file(&Report::from(outcome), &cfg.out_report)?;

    if let Some(options) = &cfg.search {
        let search = phyml.search(
            &selection.oracle_args,
            &info.alignment_file,
            &guide_tree,
            options,
        )?;
        info!("Final log-likelihood: {}", search.log_likelihood);
        let trees = from_newick(&search.tree)?;
        info!("Putting resulting tree in {}", cfg.out_tree.display());
        write_newick_to_file(&trees, &cfg.out_tree)?;
    }

    println!("{}", selection);
    Ok(())
}

fn init_logging(cfg: &Config) -> Result<()> {
    let console_level = if cfg.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = cfg.out_log.to_string_lossy();
    if let Err(e) = Ftail::new()
        .console(console_level)
        .single_file(&log_file, true, LevelFilter::Debug)
        .init()
    {
        bail!("Unable to set up logging to {}: {e:?}", log_file);
    }
    Ok(())
}
