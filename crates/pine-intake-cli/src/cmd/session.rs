use crate::cmd::interview::question_text;
use crate::cmd::review::Review;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use pine_intake_core::{
    config::Config,
    navigator::{Navigator, Session, Step},
    session_store,
    tree::QuestionNode,
    types::QuestionId,
    IntakeError,
};
use serde_json::json;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// Start a new interview session and show the first question
    Start,

    /// Answer the current question of a session
    Answer {
        /// Session id
        id: String,
        /// Answer text ("not sure" shows the help text)
        input: String,
    },

    /// Show a session's answers and current question
    Show { id: String },

    /// List stored sessions
    List,

    /// Go back to an answered question, dropping it and later answers
    Rewind {
        id: String,
        /// Question id, e.g. complexity
        question: String,
    },

    /// Assemble the specification of a completed session
    Finish {
        id: String,
        /// Free-text description analyzed alongside the answers
        #[arg(long)]
        text: Option<String>,
        /// Confirmation responses, applied in order
        #[arg(long)]
        confirm: Vec<String>,
        /// Write the accepted specification to the analysis directory
        #[arg(long)]
        save: bool,
    },

    /// Delete a stored session
    Discard { id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SessionSubcommand::Start => start(root, json),
        SessionSubcommand::Answer { id, input } => answer(root, &id, &input, json),
        SessionSubcommand::Show { id } => show(root, &id, json),
        SessionSubcommand::List => list(root, json),
        SessionSubcommand::Rewind { id, question } => rewind(root, &id, &question, json),
        SessionSubcommand::Finish {
            id,
            text,
            confirm,
            save,
        } => finish(root, &id, text.as_deref(), confirm, save, json),
        SessionSubcommand::Discard { id } => discard(root, &id),
    }
}

fn load(root: &Path, id: &str) -> anyhow::Result<Session> {
    session_store::load(root, id).with_context(|| format!("failed to load session '{id}'"))
}

fn save(root: &Path, session: &Session) -> anyhow::Result<()> {
    session_store::save(root, session)
        .map(|_| ())
        .with_context(|| format!("failed to save session '{}'", session.id))
}

fn question_json(node: &QuestionNode) -> serde_json::Value {
    json!({
        "id": node.id,
        "kind": node.kind(),
        "prompt": node.prompt,
        "options": node.option_labels(),
    })
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

fn start(root: &Path, json: bool) -> anyhow::Result<()> {
    let nav = Navigator::default();
    let session = nav.start_session();
    let node = nav.current_question(&session)?;
    save(root, &session)?;

    if json {
        print_json(&json!({
            "session": session.id,
            "question": question_json(node),
        }))?;
    } else {
        println!("Session: {}", session.id);
        println!("{}", question_text(node));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// answer
// ---------------------------------------------------------------------------

fn answer(root: &Path, id: &str, input: &str, json: bool) -> anyhow::Result<()> {
    let nav = Navigator::default();
    let mut session = load(root, id)?;

    let (status, node, message) = match nav.submit_answer(&mut session, input) {
        Ok(Step::Next(next)) => ("next", Some(next), None),
        Ok(Step::Help {
            help_text,
            question,
        }) => ("help", Some(question), Some(help_text.to_string())),
        Ok(Step::Complete) => ("complete", None, None),
        Err(e @ IntakeError::InvalidAnswer { .. }) => {
            ("invalid", nav.current_question(&session).ok(), Some(e.to_string()))
        }
        Err(e) => return Err(e).with_context(|| format!("cannot answer session '{id}'")),
    };
    save(root, &session)?;

    if json {
        print_json(&json!({
            "session": session.id,
            "status": status,
            "message": message,
            "answers": session.answers().len(),
            "question": node.map(question_json),
        }))?;
        return Ok(());
    }

    if let Some(m) = &message {
        println!("{m}");
    }
    match node {
        Some(n) => println!("{}", question_text(n)),
        None => println!(
            "Interview complete. Run 'pine-intake session finish {}' to review the specification.",
            session.id
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show / list
// ---------------------------------------------------------------------------

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let nav = Navigator::default();
    let session = load(root, id)?;
    let current = nav.current_question(&session).ok();

    if json {
        print_json(&json!({
            "session": session,
            "complete": session.is_complete(),
            "question": current.map(question_json),
        }))?;
        return Ok(());
    }

    println!("Session: {}", session.id);
    println!("Started: {}", session.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let rows = session
        .answers()
        .iter()
        .map(|a| vec![a.question().heading().to_string(), a.value().to_string()])
        .collect();
    print_table(&["QUESTION", "ANSWER"], rows);
    match current {
        Some(n) => println!("\nNext: {}", question_text(n)),
        None => println!("\nComplete."),
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let sessions = session_store::list(root).context("failed to list sessions")?;

    if json {
        let items: Vec<_> = sessions
            .iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "started_at": s.started_at,
                    "answers": s.answers().len(),
                    "current": s.current(),
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    let rows = sessions
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.started_at.format("%Y-%m-%d %H:%M").to_string(),
                s.answers().len().to_string(),
                s.current()
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "complete".to_string()),
            ]
        })
        .collect();
    print_table(&["ID", "STARTED", "ANSWERS", "CURRENT"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// rewind
// ---------------------------------------------------------------------------

fn rewind(root: &Path, id: &str, question: &str, json: bool) -> anyhow::Result<()> {
    let question = QuestionId::from_str(question)?;
    let nav = Navigator::default();
    let mut session = load(root, id)?;
    let node = nav
        .rewind(&mut session, question)
        .with_context(|| format!("cannot rewind session '{id}'"))?;
    save(root, &session)?;

    if json {
        print_json(&json!({
            "session": session.id,
            "answers": session.answers().len(),
            "question": question_json(node),
        }))?;
    } else {
        println!("{}", question_text(node));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// finish / discard
// ---------------------------------------------------------------------------

fn finish(
    root: &Path,
    id: &str,
    text: Option<&str>,
    confirm: Vec<String>,
    save: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let analyzer = config.analyzer().context("failed to build analyzer")?;
    let session = load(root, id)?;
    let answers = Navigator::default()
        .finalize(session)
        .with_context(|| format!("cannot finish session '{id}'"))?;
    let findings = text.map(|t| analyzer.analyze(t)).filter(|f| !f.is_empty());

    let mut responses = confirm.into_iter();
    Review {
        root,
        config: &config,
        analyzer: &analyzer,
        save,
        json,
    }
    .run(answers, findings, move || Ok(responses.next()))
}

fn discard(root: &Path, id: &str) -> anyhow::Result<()> {
    session_store::remove(root, id).with_context(|| format!("failed to discard session '{id}'"))?;
    println!("Discarded session {id}.");
    Ok(())
}
