use std::fmt;

use anyhow::bail;
use log::info;
use pest::{error::Error as PestError, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::tree::GuideTree;
use crate::Result;

#[derive(Parser)]
#[grammar = "./tree/newick.pest"]
pub struct NewickParser;

#[derive(Debug)]
pub(crate) struct ParsingError(pub(crate) Box<PestError<Rule>>);

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Malformed newick string")?;
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParsingError {}

/// Parses all trees in a newick string. An empty string yields no trees.
pub fn from_newick(newick_string: &str) -> Result<Vec<GuideTree>> {
    info!("Parsing newick trees.");
    let pairs = match NewickParser::parse(Rule::newick, newick_string) {
        Ok(pairs) => pairs,
        Err(e) => bail!(ParsingError(Box::new(e))),
    };
    let trees: Vec<GuideTree> = pairs
        .flat_map(|newick_rule| newick_rule.into_inner())
        .filter(|rule| rule.as_rule() == Rule::tree)
        .map(GuideTree::from_tree_rule)
        .collect();
    info!("Finished parsing {} newick tree(s) successfully.", trees.len());
    Ok(trees)
}

impl GuideTree {
    fn from_tree_rule(tree_rule: Pair<Rule>) -> Self {
        let mut tree = GuideTree {
            newick: strip_whitespace(tree_rule.as_str()),
            leaf_ids: Vec::new(),
            internal_degrees: Vec::new(),
        };
        for node_rule in tree_rule.into_inner() {
            tree.parse_node_rule(node_rule);
        }
        tree
    }

    fn parse_node_rule(&mut self, node_rule: Pair<Rule>) {
        for rule in node_rule.into_inner() {
            match rule.as_rule() {
                Rule::internal => self.parse_internal_rule(rule),
                Rule::leaf => self.parse_leaf_rule(rule),
                _ => unreachable!(),
            }
        }
    }

    fn parse_internal_rule(&mut self, internal_rule: Pair<Rule>) {
        let node_idx = self.internal_degrees.len();
        self.internal_degrees.push(0);
        let mut children = 0;
        for rule in internal_rule.into_inner() {
            match rule.as_rule() {
                Rule::node => {
                    children += 1;
                    self.parse_node_rule(rule);
                }
                Rule::label | Rule::branch_length => {}
                _ => unreachable!(),
            }
        }
        self.internal_degrees[node_idx] = children;
    }

    fn parse_leaf_rule(&mut self, leaf_rule: Pair<Rule>) {
        if let Some(label) = leaf_rule
            .into_inner()
            .find(|rule| rule.as_rule() == Rule::label)
        {
            self.leaf_ids.push(label_text(label));
        }
    }
}

/// Label as a sequence id: quotes around a quoted label are dropped and doubled quotes unescaped.
fn label_text(label_rule: Pair<Rule>) -> String {
    let text = label_rule.as_str();
    match label_rule.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted_label => {
            text[1..text.len() - 1].replace("''", "'")
        }
        _ => text.to_string(),
    }
}

/// Drops whitespace outside of quoted labels.
fn strip_whitespace(newick: &str) -> String {
    let mut quoted = false;
    newick
        .chars()
        .filter(|&c| {
            if c == '\'' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}
