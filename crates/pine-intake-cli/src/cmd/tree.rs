use crate::output::{print_json, print_table};
use clap::Subcommand;
use pine_intake_core::tree::{Branches, QuestionTree};
use serde_json::json;

#[derive(Subcommand)]
pub enum TreeSubcommand {
    /// List every question with its options and where each leads
    Show,

    /// Check the tree and report depth and warnings
    Validate,
}

pub fn run(subcmd: TreeSubcommand, json: bool) -> anyhow::Result<()> {
    let tree = QuestionTree::standard();
    match subcmd {
        TreeSubcommand::Show => show(tree, json),
        TreeSubcommand::Validate => validate(tree, json),
    }
}

fn show(tree: &QuestionTree, json: bool) -> anyhow::Result<()> {
    if json {
        let nodes: Vec<_> = tree.nodes().collect();
        print_json(&json!({ "root": tree.root(), "nodes": nodes }))?;
        return Ok(());
    }

    let mut rows = Vec::new();
    for node in tree.nodes() {
        let edges: Vec<String> = match &node.branches {
            Branches::Choices { options } => options
                .iter()
                .map(|b| format!("{} -> {}", b.choice.label(), b.target))
                .collect(),
            Branches::YesNo { yes, no } => vec![format!("Yes -> {yes}"), format!("No -> {no}")],
            Branches::FreeText { next } => vec![format!("(text) -> {next}")],
        };
        for (i, edge) in edges.into_iter().enumerate() {
            let (id, kind) = if i == 0 {
                (node.id.to_string(), node.kind().to_string())
            } else {
                (String::new(), String::new())
            };
            rows.push(vec![id, kind, edge]);
        }
    }
    print_table(&["QUESTION", "KIND", "BRANCH"], rows);
    Ok(())
}

fn validate(tree: &QuestionTree, json: bool) -> anyhow::Result<()> {
    let warnings = tree.warnings();
    if json {
        print_json(&json!({
            "valid": true,
            "nodes": tree.len(),
            "depth": tree.depth(),
            "warnings": warnings,
        }))?;
    } else {
        println!(
            "Question tree is valid: {} questions, longest path {} answers.",
            tree.len(),
            tree.depth()
        );
        for w in warnings {
            println!("[warning] {}: {}", w.node, w.message);
        }
    }
    Ok(())
}
