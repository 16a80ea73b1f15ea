use crate::analyzer::{Analyzer, FindingSet, FindingValue};
use crate::error::{IntakeError, Result};
use crate::io;
use crate::navigator::{Answer, AnswerList, AnswerValue};
use crate::paths;
use crate::specification::ProjectSpecification;
use crate::summary::render_summary;
use crate::tree::normalize_input;
use crate::types::{Choice, QuestionId};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_MAX_REFINEMENTS: u32 = 5;

/// Responses that accept the specification, in normalized form.
const ACCEPT_RESPONSES: &[&str] = &[
    "yes",
    "y",
    "yep",
    "yeah",
    "correct",
    "that's correct",
    "that is correct",
    "that's right",
    "looks good",
    "looks right",
    "lgtm",
    "proceed",
    "yes proceed",
    "yes looks good",
];

const WRONG_INTERPRETATION_CUES: &[&str] = &[
    "wrong",
    "incorrect",
    "misunderstood",
    "not right",
    "should be",
    "actually",
    "instead",
    "isn't",
    "is not",
    "not a",
    "not an",
];

const MISSING_COMPONENT_CUES: &[&str] = &[
    "missing",
    "missed",
    "forgot",
    "left out",
    "didn't include",
    "did not include",
    "didn't mention",
    "also uses",
    "also use",
    "add",
    "include",
];

// ---------------------------------------------------------------------------
// RefinementRoute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementRoute {
    /// Components were detected incompletely; re-analyze with the response.
    MissingComponents,
    /// The type or intent was misread; record a correction and re-assemble.
    WrongInterpretation,
    /// Extra detail to fold into the existing specification.
    AdditionalDetails,
}

impl RefinementRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            RefinementRoute::MissingComponents => "missing_components",
            RefinementRoute::WrongInterpretation => "wrong_interpretation",
            RefinementRoute::AdditionalDetails => "additional_details",
        }
    }
}

impl fmt::Display for RefinementRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AcceptedSpecification
// ---------------------------------------------------------------------------

/// A confirmed specification. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedSpecification {
    analysis_id: String,
    accepted_at: DateTime<Utc>,
    summary: String,
    detailed_spec: ProjectSpecification,
}

impl AcceptedSpecification {
    fn new(spec: &ProjectSpecification) -> Self {
        let summary = render_summary(spec);
        let key = spec
            .video_source
            .as_ref()
            .map(|s| s.url.as_str())
            .filter(|u| !u.is_empty())
            .unwrap_or(&summary);
        Self {
            analysis_id: analysis_id(key),
            accepted_at: Utc::now(),
            summary,
            detailed_spec: spec.clone(),
        }
    }

    pub fn analysis_id(&self) -> &str {
        &self.analysis_id
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn specification(&self) -> &ProjectSpecification {
        &self.detailed_spec
    }

    /// Write as pretty JSON to `<analysis_dir>/analysis_<id>.json`.
    pub fn save(&self, root: &Path, analysis_dir: &str) -> Result<PathBuf> {
        let path = paths::analysis_path(root, analysis_dir, &self.analysis_id);
        io::write_json(&path, self)?;
        tracing::debug!(path = %path.display(), "accepted specification saved");
        Ok(path)
    }
}

/// First eight hex digits of the SHA-256 of `key`.
pub fn analysis_id(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key);
    format!("{:x}", hasher.finalize())[..8].to_string()
}

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationResult {
    Accepted(AcceptedSpecification),
    NeedsRefinement {
        response: String,
        route: RefinementRoute,
    },
}

pub fn confirm(spec: &ProjectSpecification, user_response: &str) -> ConfirmationResult {
    if is_acceptance(user_response) {
        return ConfirmationResult::Accepted(AcceptedSpecification::new(spec));
    }
    let route = classify_refinement(user_response);
    tracing::debug!(%route, "specification needs refinement");
    ConfirmationResult::NeedsRefinement {
        response: user_response.to_string(),
        route,
    }
}

pub fn is_acceptance(response: &str) -> bool {
    let normalized = normalize_response(response);
    ACCEPT_RESPONSES.contains(&normalized.as_str())
}

pub fn classify_refinement(response: &str) -> RefinementRoute {
    let normalized = normalize_response(response);
    if contains_cue(&normalized, WRONG_INTERPRETATION_CUES) {
        RefinementRoute::WrongInterpretation
    } else if contains_cue(&normalized, MISSING_COMPONENT_CUES) {
        RefinementRoute::MissingComponents
    } else {
        RefinementRoute::AdditionalDetails
    }
}

/// A script-type correction named in a refinement response, e.g. "it's a
/// strategy, not an indicator". Types preceded by "not a"/"not an" are
/// discarded; exactly one must remain.
pub fn correction_from(response: &str) -> Option<Answer> {
    static TYPE_WORD: OnceLock<Regex> = OnceLock::new();
    let re = TYPE_WORD.get_or_init(|| {
        Regex::new(r"(?i)(\bnot\s+(?:a|an)\s+)?\b(indicator|strategy|library)\b").unwrap()
    });

    let mut named: Vec<Choice> = Vec::new();
    for caps in re.captures_iter(response) {
        if caps.get(1).is_some() {
            continue;
        }
        let choice = match caps[2].to_lowercase().as_str() {
            "indicator" => Choice::Indicator,
            "strategy" => Choice::Strategy,
            _ => Choice::Library,
        };
        if !named.contains(&choice) {
            named.push(choice);
        }
    }
    match named.as_slice() {
        [choice] => Some(Answer::correction(
            QuestionId::ScriptType,
            AnswerValue::Choice(*choice),
        )),
        _ => None,
    }
}

/// Fold a refinement response into the inputs of the next assembly.
///
/// The response text is analyzed on every route. Missing components and
/// additional details are merged. A wrong-interpretation response corrects:
/// a script type it names becomes a correction answer, keywords it negates
/// ("scalping, not swing trading") are ignored, and every keyword category it
/// names replaces the earlier findings in that category. Returns false when
/// nothing changed.
pub fn apply_refinement(
    analyzer: &Analyzer,
    route: RefinementRoute,
    response: &str,
    answers: &mut AnswerList,
    findings: &mut Option<FindingSet>,
) -> bool {
    let mut changed = false;
    let correcting = route == RefinementRoute::WrongInterpretation;
    if correcting {
        if let Some(correction) = correction_from(response) {
            answers.correct(correction.question(), correction.value().clone());
            changed = true;
        }
    }

    let mut extra = analyzer.analyze(response);
    if correcting {
        extra.retain(|f| {
            !matches!(f.value, FindingValue::Keyword { .. }) || !is_negated(response, &f.raw_text)
        });
    }
    if !extra.is_empty() {
        changed = true;
        match findings {
            Some(existing) if correcting => existing.supersede(extra),
            Some(existing) => existing.merge(extra),
            None => *findings = Some(extra),
        }
    }
    changed
}

const NEGATIONS: &[&str] = &[
    "not",
    "not a",
    "not an",
    "no",
    "isn't",
    "isn't a",
    "instead of",
    "rather than",
];

/// True when the first mention of `phrase` in `response` directly follows a
/// negation such as "not" or "instead of".
fn is_negated(response: &str, phrase: &str) -> bool {
    let lower = response.to_lowercase();
    let Some(pos) = lower.find(&phrase.to_lowercase()) else {
        return false;
    };
    let before = lower[..pos].trim_end();
    NEGATIONS.iter().any(|n| {
        before == *n
            || before
                .strip_suffix(n)
                .is_some_and(|rest| rest.ends_with(|c: char| !c.is_alphanumeric()))
    })
}

fn normalize_response(response: &str) -> String {
    let normalized = normalize_input(response);
    normalized
        .trim_end_matches(&['.', '!'][..])
        .replace(',', "")
        .trim()
        .to_string()
}

fn contains_cue(normalized: &str, cues: &[&str]) -> bool {
    let padded = format!(" {normalized} ");
    cues.iter().any(|cue| padded.contains(&format!(" {cue} ")))
}

// ---------------------------------------------------------------------------
// RefinementBudget
// ---------------------------------------------------------------------------

/// Bounds the confirm/refine loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementBudget {
    max_attempts: u32,
    used: u32,
}

impl Default for RefinementBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REFINEMENTS)
    }
}

impl RefinementBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            used: 0,
        }
    }

    /// Consume one refinement. Returns the 1-based attempt number.
    pub fn attempt(&mut self) -> Result<u32> {
        if self.used >= self.max_attempts {
            return Err(IntakeError::RefinementLimitReached(self.max_attempts));
        }
        self.used += 1;
        Ok(self.used)
    }

    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.used
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
