use crate::analyzer::{Analyzer, FindingSet};
use crate::classifier::{Classifier, EvalContext};
use crate::error::{IntakeError, Result};
use crate::navigator::{Answer, AnswerList};
use crate::scoring::{assess_feasibility, complexity_score};
use crate::specification::{
    ImplementationRequirements, ParameterGroup, ProfileEntry, ProjectSpecification,
};
use crate::types::{Category, Choice, NumericKind, QuestionId, ScriptType};

pub const DEFAULT_STRATEGY_TYPE: &str = "custom";
pub const UNSPECIFIED_TIMEFRAME: &str = "not specified";

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

pub struct Assembler<'a> {
    analyzer: &'a Analyzer,
    classifier: Classifier,
}

impl Default for Assembler<'static> {
    fn default() -> Self {
        Self::new(Analyzer::standard())
    }
}

/// Assemble with the built-in dictionaries and rules.
pub fn assemble(
    answers: Option<&AnswerList>,
    findings: Option<&FindingSet>,
) -> Result<ProjectSpecification> {
    Assembler::default().assemble(answers, findings)
}

impl<'a> Assembler<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self {
            analyzer,
            classifier: Classifier::default(),
        }
    }

    /// Merge answers and findings into one specification.
    ///
    /// Where both inputs speak to the same field, the findings win unless
    /// the answer is a user correction.
    pub fn assemble(
        &self,
        answers: Option<&AnswerList>,
        findings: Option<&FindingSet>,
    ) -> Result<ProjectSpecification> {
        if answers.is_none() && findings.is_none() {
            return Err(IntakeError::NothingToAssemble(
                "neither answers nor findings were provided".to_string(),
            ));
        }
        let answer_count = answers.map(AnswerList::len).unwrap_or(0);
        let finding_count = findings.map(FindingSet::len).unwrap_or(0);
        if answer_count == 0 && finding_count == 0 {
            return Err(IntakeError::NothingToAssemble(
                "the input contains no answers and no findings".to_string(),
            ));
        }

        let detected_type = resolve_script_type(answers, findings);
        let strategy_type = resolve_strategy_type(answers, findings);
        let subtype = self
            .classifier
            .classify(&EvalContext {
                detected_type,
                strategy_type: &strategy_type,
                answers,
                findings,
            })
            .map(|c| c.subtype);

        let values = |category: Category| {
            findings
                .map(|f| f.values(category))
                .unwrap_or_default()
        };

        let complexity = complexity_score(answers, findings);
        let feasibility = assess_feasibility(self.analyzer, answers, findings, complexity);

        tracing::debug!(
            answers = answer_count,
            findings = finding_count,
            %detected_type,
            complexity,
            "specification assembled"
        );

        Ok(ProjectSpecification {
            video_source: findings.and_then(|f| f.source.clone()),
            detected_type,
            subtype,
            main_indicators: values(Category::Indicator),
            trading_patterns: values(Category::Pattern),
            strategy_type,
            timeframes: resolve_timeframes(answers, findings),
            implementation_requirements: ImplementationRequirements {
                entry_logic: values(Category::EntryCondition),
                exit_logic: values(Category::ExitCondition),
                risk_rules: values(Category::RiskRule),
                market_filter: values(Category::Filter),
            },
            specific_parameters: findings.map(parameter_groups).unwrap_or_default(),
            complexity_score: complexity,
            feasibility,
            project: answers.map(profile).unwrap_or_default(),
            answers: answers.map(|a| a.answers().to_vec()).unwrap_or_default(),
            findings: findings.map(|f| f.findings().to_vec()).unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Field resolution
// ---------------------------------------------------------------------------

/// Pick between an answer-derived and a findings-derived value.
fn prefer<T>(answer: Option<(&Answer, T)>, finding: Option<T>) -> Option<T> {
    match (answer, finding) {
        (Some((a, v)), _) if a.is_correction() => Some(v),
        (_, Some(f)) => Some(f),
        (Some((_, v)), None) => Some(v),
        (None, None) => None,
    }
}

/// Script type suggested by content alone.
pub fn infer_script_type(findings: &FindingSet) -> ScriptType {
    let entries = findings.by_category(Category::EntryCondition).count();
    let exits = findings.by_category(Category::ExitCondition).count();
    let trade_logic = entries + exits > 0 || findings.has(Category::RiskRule);

    if (entries > 0 && exits > 0)
        || entries + exits > 2
        || (findings.has(Category::StrategyType) && trade_logic)
    {
        ScriptType::Strategy
    } else if findings.has(Category::Indicator) || findings.has(Category::Pattern) {
        ScriptType::Indicator
    } else {
        ScriptType::Unknown
    }
}

fn resolve_script_type(answers: Option<&AnswerList>, findings: Option<&FindingSet>) -> ScriptType {
    let answered = answers
        .and_then(|a| a.get(QuestionId::ScriptType))
        .and_then(|a| a.choice().and_then(ScriptType::from_choice).map(|t| (a, t)));
    let inferred = findings
        .map(infer_script_type)
        .filter(|t| *t != ScriptType::Unknown);
    prefer(answered, inferred).unwrap_or(ScriptType::Unknown)
}

fn resolve_strategy_type(answers: Option<&AnswerList>, findings: Option<&FindingSet>) -> String {
    let answered = answers
        .and_then(|a| a.get(QuestionId::StrategyPurpose))
        .and_then(|a| a.choice().map(|c| (a, c.label().to_lowercase())));
    let detected = findings.and_then(|f| f.values(Category::StrategyType).into_iter().next());
    prefer(answered, detected).unwrap_or_else(|| DEFAULT_STRATEGY_TYPE.to_string())
}

fn resolve_timeframes(answers: Option<&AnswerList>, findings: Option<&FindingSet>) -> Vec<String> {
    let mut timeframes = findings
        .map(|f| f.values(Category::Timeframe))
        .unwrap_or_default();
    if timeframes.is_empty() {
        if let Some(choice @ (Choice::MultiTimeframe | Choice::MultiSymbol)) =
            answers.and_then(|a| a.choice(QuestionId::DataSource))
        {
            timeframes.push(choice.label().to_lowercase());
        }
    }
    if timeframes.is_empty() {
        timeframes.push(UNSPECIFIED_TIMEFRAME.to_string());
    }
    timeframes
}

fn parameter_groups(findings: &FindingSet) -> Vec<ParameterGroup> {
    NumericKind::all()
        .iter()
        .filter_map(|kind| {
            let mut values: Vec<f64> = Vec::new();
            for v in findings.numeric(*kind) {
                if !values.contains(&v) {
                    values.push(v);
                }
            }
            (!values.is_empty()).then(|| ParameterGroup {
                kind: kind.group_name().to_string(),
                values,
            })
        })
        .collect()
}

/// Latest answer per question, in the order questions were first answered.
fn profile(answers: &AnswerList) -> Vec<ProfileEntry> {
    let mut order: Vec<QuestionId> = Vec::new();
    for a in answers.iter() {
        if !order.contains(&a.question()) {
            order.push(a.question());
        }
    }
    order
        .into_iter()
        .filter_map(|q| answers.get(q))
        .map(|a| ProfileEntry {
            question: a.question(),
            answer: a.value().to_string(),
            corrected: a.is_correction(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
