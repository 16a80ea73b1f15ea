use crate::analyzer::{Analyzer, FindingSet};
use crate::navigator::{AnswerList, AnswerValue};
use crate::specification::FeasibilityAssessment;
use crate::types::{Category, Choice, Feasibility, NumericKind, QuestionId};
use std::collections::BTreeSet;

pub const MIN_COMPLEXITY: u8 = 1;
pub const MAX_COMPLEXITY: u8 = 10;

/// Scores at or above this get a "consider splitting" note.
const HIGH_COMPLEXITY: u8 = 8;

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

/// Sum of per-category contributions, clamped to `[1, 10]`.
///
/// Findings: indicators (up to 3), patterns (up to 2), strategy style,
/// entry, exit, risk and filter logic (1 each), numeric parameter groups
/// (up to 2), more than one timeframe, any unsupported concept.
///
/// Answers: moderate +2, complex +4, automation, multi-timeframe or
/// multi-symbol or custom data, external libraries, performance critical,
/// advanced visuals, comprehensive testing (+1 each).
pub fn complexity_score(answers: Option<&AnswerList>, findings: Option<&FindingSet>) -> u8 {
    let mut score = 0usize;

    if let Some(f) = findings {
        score += f.values(Category::Indicator).len().min(3);
        score += f.values(Category::Pattern).len().min(2);
        for category in [
            Category::StrategyType,
            Category::EntryCondition,
            Category::ExitCondition,
            Category::RiskRule,
            Category::Filter,
            Category::UnsupportedConcept,
        ] {
            score += usize::from(f.has(category));
        }
        let groups = NumericKind::all()
            .iter()
            .filter(|k| !f.numeric(**k).is_empty())
            .count();
        score += groups.min(2);
        score += usize::from(f.values(Category::Timeframe).len() > 1);
    }

    if let Some(a) = answers {
        score += match a.choice(QuestionId::Complexity) {
            Some(Choice::Moderate) => 2,
            Some(Choice::Complex) => 4,
            _ => 0,
        };
        score += usize::from(a.flag(QuestionId::Automation) == Some(true));
        score += usize::from(a.flag(QuestionId::PerformanceCritical) == Some(true));
        score += usize::from(matches!(
            a.choice(QuestionId::DataSource),
            Some(Choice::MultiTimeframe | Choice::MultiSymbol | Choice::CustomData)
        ));
        score += usize::from(a.choice(QuestionId::Dependencies) == Some(Choice::ExternalLibraries));
        score += usize::from(a.choice(QuestionId::Visuals) == Some(Choice::AdvancedVisuals));
        score += usize::from(a.choice(QuestionId::Testing) == Some(Choice::ComprehensiveTesting));
    }

    score.clamp(MIN_COMPLEXITY as usize, MAX_COMPLEXITY as usize) as u8
}

// ---------------------------------------------------------------------------
// Feasibility
// ---------------------------------------------------------------------------

/// Distinct unsupported concepts from findings and from free-text answers,
/// in first-seen order.
pub fn unsupported_concepts(
    analyzer: &Analyzer,
    answers: Option<&AnswerList>,
    findings: Option<&FindingSet>,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let mut push = |concept: String| {
        if seen.insert(concept.clone()) {
            out.push(concept);
        }
    };

    if let Some(f) = findings {
        f.values(Category::UnsupportedConcept).into_iter().for_each(&mut push);
    }
    if let Some(a) = answers {
        for answer in a.iter() {
            if let AnswerValue::Text(text) = answer.value() {
                analyzer
                    .analyze(text)
                    .values(Category::UnsupportedConcept)
                    .into_iter()
                    .for_each(&mut push);
            }
        }
    }
    out
}

/// Number of standard (supportable) component categories in the input. An
/// answered interview counts as one.
fn standard_components(answers: Option<&AnswerList>, findings: Option<&FindingSet>) -> usize {
    let from_findings = findings
        .map(|f| {
            Category::all()
                .iter()
                .filter(|c| **c != Category::UnsupportedConcept && f.has(**c))
                .count()
        })
        .unwrap_or(0);
    let from_answers = answers.map(|a| usize::from(!a.is_empty())).unwrap_or(0);
    from_findings + from_answers
}

pub fn assess_feasibility(
    analyzer: &Analyzer,
    answers: Option<&AnswerList>,
    findings: Option<&FindingSet>,
    complexity: u8,
) -> FeasibilityAssessment {
    let limitations = unsupported_concepts(analyzer, answers, findings);
    let standard = standard_components(answers, findings);

    let overall = if limitations.is_empty() {
        Feasibility::Full
    } else if standard == 0 || limitations.len() > standard {
        Feasibility::Limited
    } else {
        Feasibility::Partial
    };

    let mut notes: Vec<String> = limitations
        .iter()
        .map(|concept| match analyzer.workaround_for(concept) {
            Some(hint) => format!("{concept} is not available in Pine Script; {hint}"),
            None => format!("{concept} is not available in Pine Script"),
        })
        .collect();
    if complexity >= HIGH_COMPLEXITY {
        notes.push("high complexity; consider splitting into smaller scripts".to_string());
    }

    tracing::debug!(%overall, unsupported = limitations.len(), standard, "feasibility assessed");
    FeasibilityAssessment {
        overall,
        notes,
        limitations,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
