use crate::cmd::review::Review;
use anyhow::Context;
use clap::Args;
use pine_intake_core::{
    config::Config,
    navigator::{Navigator, Step},
    tree::{QuestionKind, QuestionNode},
    IntakeError,
};
use std::io::BufRead;
use std::path::Path;

#[derive(Args)]
pub struct InterviewArgs {
    /// Free-text description analyzed alongside the answers
    #[arg(long)]
    pub text: Option<String>,

    /// Write the accepted specification to the analysis directory
    #[arg(long)]
    pub save: bool,
}

/// Prompt plus the accepted options, as shown to the user.
pub fn question_text(node: &QuestionNode) -> String {
    match node.kind() {
        QuestionKind::FreeText => format!("{}\n  (free text)", node.prompt),
        _ => format!("{}\n  [{}]", node.prompt, node.option_labels().join(" / ")),
    }
}

pub fn run(root: &Path, args: InterviewArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let analyzer = config.analyzer().context("failed to build analyzer")?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut read = move || -> anyhow::Result<Option<String>> { Ok(lines.next().transpose()?) };

    // Prompts go to stderr in JSON mode so stdout stays machine-readable.
    let say = |text: &str| {
        if json {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    };

    let nav = Navigator::default();
    let mut session = nav.start_session();
    let mut node = nav.current_question(&session)?;
    loop {
        say(&question_text(node));
        let Some(input) = read()? else {
            anyhow::bail!(
                "input ended before the interview was complete (at '{}')",
                node.id
            );
        };
        match nav.submit_answer(&mut session, &input) {
            Ok(Step::Next(next)) => node = next,
            Ok(Step::Help {
                help_text,
                question,
            }) => {
                say(help_text);
                node = question;
            }
            Ok(Step::Complete) => break,
            Err(e @ IntakeError::InvalidAnswer { .. }) => say(&e.to_string()),
            Err(e) => return Err(e).context("interview failed"),
        }
    }
    say("");

    let answers = nav.finalize(session)?;
    let findings = args
        .text
        .as_deref()
        .map(|t| analyzer.analyze(t))
        .filter(|f| !f.is_empty());

    Review {
        root,
        config: &config,
        analyzer: &analyzer,
        save: args.save,
        json,
    }
    .run(answers, findings, &mut read)
}
