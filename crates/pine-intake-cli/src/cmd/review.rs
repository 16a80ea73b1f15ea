use crate::output::print_json;
use anyhow::Context;
use pine_intake_core::{
    analyzer::{Analyzer, FindingSet},
    assembler::Assembler,
    config::Config,
    confirm::{apply_refinement, confirm, ConfirmationResult, RefinementBudget},
    navigator::AnswerList,
    summary::render_summary,
};
use serde_json::json;
use std::path::Path;

/// Shared confirm/refine loop for interviews, stored sessions and analyses.
pub struct Review<'a> {
    pub root: &'a Path,
    pub config: &'a Config,
    pub analyzer: &'a Analyzer,
    pub save: bool,
    pub json: bool,
}

impl<'a> Review<'a> {
    /// Assemble, show the summary, and feed responses until one accepts the
    /// specification or `next_response` runs dry.
    pub fn run(
        &self,
        mut answers: AnswerList,
        mut findings: Option<FindingSet>,
        mut next_response: impl FnMut() -> anyhow::Result<Option<String>>,
    ) -> anyhow::Result<()> {
        let assembler = Assembler::new(self.analyzer);
        let mut budget = RefinementBudget::new(self.config.refinement.max_attempts);
        let mut refinements = Vec::new();

        loop {
            let answers_in = (!answers.is_empty()).then_some(&answers);
            let spec = assembler
                .assemble(answers_in, findings.as_ref())
                .context("failed to assemble specification")?;
            if !self.json {
                println!("{}\n", render_summary(&spec));
            }

            let Some(response) = next_response()? else {
                if self.json {
                    print_json(&json!({
                        "status": "pending",
                        "refinements": refinements,
                        "summary": render_summary(&spec),
                        "specification": spec,
                    }))?;
                } else {
                    println!("Specification not confirmed.");
                }
                return Ok(());
            };

            match confirm(&spec, &response) {
                ConfirmationResult::Accepted(accepted) => {
                    let path = if self.save {
                        Some(
                            accepted
                                .save(self.root, &self.config.output.analysis_dir)
                                .context("failed to save accepted specification")?,
                        )
                    } else {
                        None
                    };
                    if self.json {
                        print_json(&json!({
                            "status": "accepted",
                            "analysis_id": accepted.analysis_id(),
                            "accepted_at": accepted.accepted_at(),
                            "path": path.as_ref().map(|p| p.display().to_string()),
                            "refinements": refinements,
                            "specification": accepted.specification(),
                        }))?;
                    } else {
                        println!("Accepted (analysis {}).", accepted.analysis_id());
                        if let Some(p) = &path {
                            println!("Saved: {}", p.display());
                        }
                    }
                    return Ok(());
                }
                ConfirmationResult::NeedsRefinement { response, route } => {
                    let attempt = budget.attempt()?;
                    let changed = apply_refinement(
                        self.analyzer,
                        route,
                        &response,
                        &mut answers,
                        &mut findings,
                    );
                    if !self.json {
                        println!("Refinement {attempt} ({route}).");
                        if !changed {
                            println!("Nothing new was recognised in that response.");
                        }
                        println!();
                    }
                    refinements.push(json!({ "route": route, "response": response }));
                }
            }
        }
    }
}
