use crate::cmd::review::Review;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use pine_intake_core::{
    analyzer::{Analyzer, FindingSet, SourceInfo},
    config::Config,
    navigator::AnswerList,
    IntakeError,
};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Text to analyze
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Transcript file to analyze (default: read stdin)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Manual description, used when the transcript is unreadable or has no
    /// recognisable content
    #[arg(long)]
    pub describe: Option<String>,

    /// Video title
    #[arg(long)]
    pub title: Option<String>,

    /// Video author or channel
    #[arg(long)]
    pub author: Option<String>,

    /// Video URL
    #[arg(long)]
    pub url: Option<String>,

    /// Confirmation responses, applied in order
    #[arg(long)]
    pub confirm: Vec<String>,

    /// Write the accepted specification to the analysis directory
    #[arg(long)]
    pub save: bool,
}

pub fn run(root: &Path, args: AnalyzeArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let analyzer = config.analyzer().context("failed to build analyzer")?;

    let bytes = match (&args.text, &args.file) {
        (Some(text), _) => text.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let findings = match transcript_findings(&analyzer, &bytes)? {
        Transcript::Usable(findings) => findings,
        Transcript::Unusable(reason) => {
            match args.describe.as_deref().map(|d| analyzer.analyze(d)) {
                Some(described) if !described.is_empty() => {
                    tracing::debug!(%reason, "using manual description");
                    described
                }
                described => return request_description(reason, described.is_some(), json),
            }
        }
    };

    let findings = with_source(findings, &args);
    Review {
        root,
        config: &config,
        analyzer: &analyzer,
        save: args.save,
        json,
    }
    .run(AnswerList::default(), Some(findings), {
        let mut responses = args.confirm.into_iter();
        move || Ok(responses.next())
    })
}

// ---------------------------------------------------------------------------
// Transcript fallback
// ---------------------------------------------------------------------------

enum Transcript {
    Usable(FindingSet),
    /// Plain-language reason the transcript cannot be used.
    Unusable(String),
}

fn transcript_findings(analyzer: &Analyzer, bytes: &[u8]) -> anyhow::Result<Transcript> {
    match analyzer.analyze_bytes(bytes) {
        Ok(findings) if findings.is_empty() => {
            let reason = if String::from_utf8_lossy(bytes).trim().is_empty() {
                "No transcript text was provided."
            } else {
                "No trading content was recognised in the transcript."
            };
            Ok(Transcript::Unusable(reason.to_string()))
        }
        Ok(findings) => Ok(Transcript::Usable(findings)),
        Err(IntakeError::InvalidEncoding { offset }) => {
            tracing::warn!(offset, "transcript is not valid UTF-8");
            Ok(Transcript::Unusable(format!(
                "The transcript is not valid UTF-8 (byte offset {offset})."
            )))
        }
        Err(e) => Err(e).context("analysis failed"),
    }
}

/// Ask for a manual description instead of failing.
fn request_description(reason: String, described: bool, json: bool) -> anyhow::Result<()> {
    let request = if described {
        "The description did not mention any indicators, patterns or trading rules either. \
         Describe the project again with --describe, naming what it should plot or trade."
    } else {
        "Describe the project in your own words with --describe \"...\"."
    };
    if json {
        print_json(&json!({
            "status": "needs_description",
            "reason": reason,
            "message": request,
        }))?;
    } else {
        println!("{reason}");
        println!("{request}");
    }
    Ok(())
}

fn with_source(findings: FindingSet, args: &AnalyzeArgs) -> FindingSet {
    if args.title.is_none() && args.author.is_none() && args.url.is_none() {
        return findings;
    }
    findings.with_source(SourceInfo {
        title: args.title.clone().unwrap_or_default(),
        author: args.author.clone().unwrap_or_default(),
        url: args.url.clone().unwrap_or_default(),
    })
}
