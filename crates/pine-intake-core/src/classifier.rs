use crate::analyzer::FindingSet;
use crate::navigator::AnswerList;
use crate::rules::default_rules;
use crate::types::{Category, Choice, QuestionId, ScriptType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

/// Everything a subtype rule may look at. Built by the assembler after the
/// detected type and strategy style are resolved.
pub struct EvalContext<'a> {
    pub detected_type: ScriptType,
    pub strategy_type: &'a str,
    pub answers: Option<&'a AnswerList>,
    pub findings: Option<&'a FindingSet>,
}

impl<'a> EvalContext<'a> {
    pub fn choice(&self, question: QuestionId) -> Option<Choice> {
        self.answers.and_then(|a| a.choice(question))
    }

    pub fn flag(&self, question: QuestionId) -> Option<bool> {
        self.answers.and_then(|a| a.flag(question))
    }

    pub fn has(&self, category: Category) -> bool {
        self.findings.map(|f| f.has(category)).unwrap_or(false)
    }

    pub fn values(&self, category: Category) -> Vec<String> {
        self.findings
            .map(|f| f.values(category))
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Classification (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub rule: String,
    pub subtype: String,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule; no allocation until it fires.
pub struct Rule {
    pub id: &'static str,
    pub condition: fn(&EvalContext) -> bool,
    pub subtype: fn(&EvalContext) -> String,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// First matching rule wins. `None` when no rule applies, which is the
    /// case for an unknown script type with no supporting findings.
    pub fn classify(&self, ctx: &EvalContext) -> Option<Classification> {
        let rule = self.rules.iter().find(|r| (r.condition)(ctx))?;
        tracing::debug!(rule = rule.id, "subtype rule matched");
        Some(Classification {
            rule: rule.id.to_string(),
            subtype: (rule.subtype)(ctx),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{Answer, AnswerValue};

    fn answers(pairs: &[(QuestionId, Choice)]) -> AnswerList {
        AnswerList::new(
            pairs
                .iter()
                .map(|(q, c)| Answer::new(*q, AnswerValue::Choice(*c)))
                .collect(),
        )
    }

    fn ctx<'a>(
        detected_type: ScriptType,
        strategy_type: &'a str,
        answers: Option<&'a AnswerList>,
        findings: Option<&'a FindingSet>,
    ) -> EvalContext<'a> {
        EvalContext {
            detected_type,
            strategy_type,
            answers,
            findings,
        }
    }

    #[test]
    fn simple_signal_indicator() {
        let list = answers(&[
            (QuestionId::ScriptType, Choice::Indicator),
            (QuestionId::IndicatorPurpose, Choice::SignalGeneration),
            (QuestionId::Complexity, Choice::Simple),
        ]);
        let c = Classifier::default()
            .classify(&ctx(ScriptType::Indicator, "custom", Some(&list), None))
            .unwrap();
        assert_eq!(c.rule, "simple_signals");
        assert_eq!(c.subtype, "Simple Signals");
    }

    #[test]
    fn earlier_rule_wins() {
        let list = answers(&[
            (QuestionId::IndicatorPurpose, Choice::SignalGeneration),
            (QuestionId::Complexity, Choice::Complex),
        ]);
        let c = Classifier::default()
            .classify(&ctx(ScriptType::Indicator, "custom", Some(&list), None))
            .unwrap();
        assert_eq!(c.rule, "signal_dashboard");
    }

    #[test]
    fn unknown_type_without_findings_has_no_subtype() {
        let list = AnswerList::default();
        assert!(Classifier::default()
            .classify(&ctx(ScriptType::Unknown, "custom", Some(&list), None))
            .is_none());
    }

    #[test]
    fn strategy_style_subtype() {
        let c = Classifier::default()
            .classify(&ctx(ScriptType::Strategy, "mean reversion", None, None))
            .unwrap();
        assert_eq!(c.subtype, "Mean Reversion Strategy");
    }

    #[test]
    fn empty_table_never_matches() {
        let classifier = Classifier::new(Vec::new());
        assert!(classifier.rule_ids().is_empty());
        assert!(classifier
            .classify(&ctx(ScriptType::Strategy, "custom", None, None))
            .is_none());
    }
}
