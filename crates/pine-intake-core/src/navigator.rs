use crate::error::{IntakeError, Result};
use crate::tree::{
    is_not_sure, normalize_input, parse_yes_no, Branches, QuestionKind, QuestionNode,
    QuestionTree, Target,
};
use crate::types::{Choice, QuestionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Choice(Choice),
    Flag(bool),
    Text(String),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Choice(c) => f.write_str(c.label()),
            AnswerValue::Flag(true) => f.write_str("Yes"),
            AnswerValue::Flag(false) => f.write_str("No"),
            AnswerValue::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    #[default]
    Interview,
    /// Explicit user correction; always overrides analyzer findings.
    Correction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    question: QuestionId,
    value: AnswerValue,
    #[serde(default)]
    origin: AnswerOrigin,
}

impl Answer {
    pub fn new(question: QuestionId, value: AnswerValue) -> Self {
        Self {
            question,
            value,
            origin: AnswerOrigin::Interview,
        }
    }

    pub fn correction(question: QuestionId, value: AnswerValue) -> Self {
        Self {
            question,
            value,
            origin: AnswerOrigin::Correction,
        }
    }

    pub fn question(&self) -> QuestionId {
        self.question
    }

    pub fn value(&self) -> &AnswerValue {
        &self.value
    }

    pub fn origin(&self) -> AnswerOrigin {
        self.origin
    }

    pub fn choice(&self) -> Option<Choice> {
        match self.value {
            AnswerValue::Choice(c) => Some(c),
            _ => None,
        }
    }

    pub fn flag(&self) -> Option<bool> {
        match self.value {
            AnswerValue::Flag(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_correction(&self) -> bool {
        self.origin == AnswerOrigin::Correction
    }
}

// ---------------------------------------------------------------------------
// AnswerList
// ---------------------------------------------------------------------------

/// Ordered answers of a finished session, plus any later corrections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    answers: Vec<Answer>,
}

impl AnswerList {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            session_id: None,
            answers,
        }
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Latest answer for `question`; corrections are appended, so they win.
    pub fn get(&self, question: QuestionId) -> Option<&Answer> {
        self.answers.iter().rev().find(|a| a.question == question)
    }

    pub fn choice(&self, question: QuestionId) -> Option<Choice> {
        self.get(question).and_then(Answer::choice)
    }

    pub fn flag(&self, question: QuestionId) -> Option<bool> {
        self.get(question).and_then(Answer::flag)
    }

    /// Record a user correction. Earlier answers are kept for provenance.
    pub fn correct(&mut self, question: QuestionId, value: AnswerValue) {
        self.answers.push(Answer::correction(question, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Traversal state for one interview. Owned by the caller and passed to
/// [`Navigator`] on every call; holds no reference to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `None` once a terminal branch was taken.
    current: Option<QuestionId>,
    answers: Vec<Answer>,
}

impl Session {
    pub fn current(&self) -> Option<QuestionId> {
        self.current
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_none()
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<'t> {
    /// The answer was recorded; this question comes next.
    Next(&'t QuestionNode),
    /// The user was not sure. Show the help text, then the same question again.
    Help {
        help_text: &'t str,
        question: &'t QuestionNode,
    },
    /// The answer was recorded and the session reached a terminal branch.
    Complete,
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

pub struct Navigator<'t> {
    tree: &'t QuestionTree,
}

impl Default for Navigator<'static> {
    fn default() -> Self {
        Self::new(QuestionTree::standard())
    }
}

impl<'t> Navigator<'t> {
    pub fn new(tree: &'t QuestionTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'t QuestionTree {
        self.tree
    }

    pub fn start_session(&self) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            current: Some(self.tree.root()),
            answers: Vec::new(),
        };
        tracing::debug!(session = %session.id, root = %self.tree.root(), "session started");
        session
    }

    pub fn current_question(&self, session: &Session) -> Result<&'t QuestionNode> {
        let id = session.current.ok_or(IntakeError::InvalidSessionState)?;
        self.lookup(id, id)
    }

    /// Validate `raw_input` against the current question and advance.
    ///
    /// On `InvalidAnswer` and on `Step::Help` the session is left untouched.
    pub fn submit_answer(&self, session: &mut Session, raw_input: &str) -> Result<Step<'t>> {
        let node = self.current_question(session)?;
        let normalized = normalize_input(raw_input);

        if node.kind() != QuestionKind::FreeText && is_not_sure(&normalized) {
            tracing::debug!(question = %node.id, "not sure; re-presenting question");
            return Ok(Step::Help {
                help_text: &node.help_text,
                question: node,
            });
        }

        let (value, target) = match &node.branches {
            Branches::Choices { .. } => {
                let branch = node
                    .match_choice(&normalized)
                    .ok_or_else(|| invalid_answer(node, raw_input))?;
                (AnswerValue::Choice(branch.choice), branch.target)
            }
            Branches::YesNo { yes, no } => match parse_yes_no(&normalized) {
                Some(true) => (AnswerValue::Flag(true), *yes),
                Some(false) => (AnswerValue::Flag(false), *no),
                None => return Err(invalid_answer(node, raw_input)),
            },
            Branches::FreeText { next } => {
                let text = raw_input.trim();
                if text.is_empty() {
                    return Err(invalid_answer(node, raw_input));
                }
                (AnswerValue::Text(text.to_string()), *next)
            }
        };

        // Resolve the successor before mutating so a broken tree leaves the
        // session as it was.
        let next = match target {
            Target::Node(next_id) => Some(self.lookup(node.id, next_id)?),
            Target::Done => None,
        };

        tracing::debug!(question = %node.id, answer = %value, next = %target, "answer recorded");
        session.answers.push(Answer::new(node.id, value));
        session.current = next.map(|n| n.id);

        Ok(match next {
            Some(n) => Step::Next(n),
            None => Step::Complete,
        })
    }

    /// Return to a previously answered question, discarding that answer and
    /// every answer after it.
    pub fn rewind(&self, session: &mut Session, question: QuestionId) -> Result<&'t QuestionNode> {
        let pos = session
            .answers
            .iter()
            .position(|a| a.question == question)
            .ok_or_else(|| IntakeError::NotAnswered(question.to_string()))?;
        let node = self.lookup(question, question)?;
        session.answers.truncate(pos);
        session.current = Some(question);
        tracing::debug!(session = %session.id, question = %question, "session rewound");
        Ok(node)
    }

    pub fn finalize(&self, session: Session) -> Result<AnswerList> {
        if let Some(pending) = session.current {
            return Err(IntakeError::SessionNotComplete(pending.to_string()));
        }
        Ok(AnswerList {
            session_id: Some(session.id),
            answers: session.answers,
        })
    }

    fn lookup(&self, from: QuestionId, id: QuestionId) -> Result<&'t QuestionNode> {
        self.tree
            .node(id)
            .ok_or_else(|| IntakeError::UnreachableBranch {
                question: from.to_string(),
                target: id.to_string(),
            })
    }
}

fn invalid_answer(node: &QuestionNode, raw_input: &str) -> IntakeError {
    let options = match node.kind() {
        QuestionKind::FreeText => vec!["any non-empty text".to_string()],
        _ => node.option_labels(),
    };
    IntakeError::InvalidAnswer {
        question: node.id.to_string(),
        input: raw_input.to_string(),
        options,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::QuestionNode;

    const SCENARIO_B: &[&str] = &[
        "Indicator",
        "Signal Generation",
        "Simple",
        "No",
        "Personal",
        "Rapid Prototype",
        "None",
        "Standard OHLCV",
        "No",
        "Basic",
        "Basic",
    ];

    fn run(nav: &Navigator, inputs: &[&str]) -> Session {
        let mut session = nav.start_session();
        for input in inputs {
            nav.submit_answer(&mut session, input).unwrap();
        }
        session
    }

    #[test]
    fn starts_at_root() {
        let nav = Navigator::default();
        let session = nav.start_session();
        assert_eq!(
            nav.current_question(&session).unwrap().id,
            QuestionId::ScriptType
        );
        assert!(session.answers().is_empty());
    }

    #[test]
    fn scenario_b_completes_after_eleven_answers() {
        let nav = Navigator::default();
        let mut session = nav.start_session();
        for (i, input) in SCENARIO_B.iter().enumerate() {
            let step = nav.submit_answer(&mut session, input).unwrap();
            if i + 1 < SCENARIO_B.len() {
                assert!(matches!(step, Step::Next(_)), "answer {i} ended early");
            } else {
                assert_eq!(step, Step::Complete);
            }
        }
        assert!(session.is_complete());
        let answers = nav.finalize(session).unwrap();
        assert_eq!(answers.len(), 11);
        assert_eq!(answers.choice(QuestionId::ScriptType), Some(Choice::Indicator));
        assert_eq!(
            answers.choice(QuestionId::IndicatorPurpose),
            Some(Choice::SignalGeneration)
        );
        assert_eq!(answers.flag(QuestionId::Automation), Some(false));
        assert_eq!(answers.choice(QuestionId::Testing), Some(Choice::BasicTesting));
    }

    #[test]
    fn not_sure_returns_help_and_same_node() {
        let nav = Navigator::default();
        let mut session = run(&nav, &SCENARIO_B[..2]);
        let before = nav.current_question(&session).unwrap().id;
        let count = session.answers().len();

        let step = nav.submit_answer(&mut session, "Not sure").unwrap();
        match step {
            Step::Help {
                help_text,
                question,
            } => {
                assert_eq!(question.id, before);
                assert_eq!(help_text, question.help_text);
            }
            other => panic!("expected help, got {other:?}"),
        }
        assert_eq!(session.answers().len(), count);
        assert_eq!(nav.current_question(&session).unwrap().id, before);

        // A different input leaves the loop.
        let step = nav.submit_answer(&mut session, "Simple").unwrap();
        assert!(matches!(step, Step::Next(n) if n.id == QuestionId::Automation));
    }

    #[test]
    fn not_sure_on_every_choice_node() {
        let nav = Navigator::default();
        let mut session = nav.start_session();
        for input in SCENARIO_B {
            let node = nav.current_question(&session).unwrap();
            let step = nav.submit_answer(&mut session, "NOT SURE").unwrap();
            assert!(matches!(step, Step::Help { question, .. } if question.id == node.id));
            nav.submit_answer(&mut session, input).unwrap();
        }
        assert!(session.is_complete());
    }

    #[test]
    fn invalid_answer_does_not_mutate() {
        let nav = Navigator::default();
        let mut session = nav.start_session();
        let snapshot = session.clone();
        let err = nav.submit_answer(&mut session, "Screener").unwrap_err();
        match err {
            IntakeError::InvalidAnswer { options, .. } => {
                assert_eq!(options, vec!["Indicator", "Strategy", "Library"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session, snapshot);
    }

    #[test]
    fn invalid_answer_message_is_a_reprompt() {
        let nav = Navigator::default();
        let mut session = nav.start_session();
        let err = nav.submit_answer(&mut session, "maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please choose one of: Indicator, Strategy, Library"
        );
    }

    #[test]
    fn yes_no_rejects_other_words() {
        let nav = Navigator::default();
        let mut session = run(&nav, &SCENARIO_B[..3]);
        assert!(matches!(
            nav.submit_answer(&mut session, "sometimes"),
            Err(IntakeError::InvalidAnswer { .. })
        ));
        let step = nav.submit_answer(&mut session, "yes").unwrap();
        assert!(matches!(step, Step::Next(n) if n.id == QuestionId::AlertDelivery));
    }

    #[test]
    fn free_text_branch_records_text() {
        let nav = Navigator::default();
        let mut session = run(
            &nav,
            &["Strategy", "Breakout", "Moderate", "No", "Public", "Production Ready"],
        );
        let step = nav
            .submit_answer(&mut session, "External Libraries")
            .unwrap();
        assert!(matches!(step, Step::Next(n) if n.id == QuestionId::LibraryNames));
        assert!(matches!(
            nav.submit_answer(&mut session, "   "),
            Err(IntakeError::InvalidAnswer { .. })
        ));
        nav.submit_answer(&mut session, " TradingView/ta ").unwrap();
        let last = session.answers().last().unwrap();
        assert_eq!(last.value(), &AnswerValue::Text("TradingView/ta".to_string()));
        assert_eq!(
            nav.current_question(&session).unwrap().id,
            QuestionId::DataSource
        );
    }

    #[test]
    fn current_question_after_completion_fails() {
        let nav = Navigator::default();
        let mut session = run(&nav, SCENARIO_B);
        assert!(matches!(
            nav.current_question(&session),
            Err(IntakeError::InvalidSessionState)
        ));
        assert!(matches!(
            nav.submit_answer(&mut session, "Basic"),
            Err(IntakeError::InvalidSessionState)
        ));
    }

    #[test]
    fn finalize_incomplete_fails() {
        let nav = Navigator::default();
        let session = run(&nav, &SCENARIO_B[..4]);
        assert!(matches!(
            nav.finalize(session),
            Err(IntakeError::SessionNotComplete(ref q)) if q == "distribution"
        ));
    }

    #[test]
    fn rewind_drops_later_answers() {
        let nav = Navigator::default();
        let mut session = run(&nav, SCENARIO_B);
        let node = nav.rewind(&mut session, QuestionId::Complexity).unwrap();
        assert_eq!(node.id, QuestionId::Complexity);
        assert_eq!(session.answers().len(), 2);
        assert!(!session.is_complete());
        assert!(matches!(
            nav.rewind(&mut session, QuestionId::Testing),
            Err(IntakeError::NotAnswered(_))
        ));
    }

    #[test]
    fn traversal_terminates_within_depth() {
        let nav = Navigator::default();
        let depth = nav.tree().depth();
        let mut session = nav.start_session();
        let mut steps = 0;
        // Always take the first option (or "yes"/text) and count steps.
        while let Ok(node) = nav.current_question(&session) {
            let input = match node.kind() {
                QuestionKind::SingleChoice => node.option_labels()[0].clone(),
                QuestionKind::YesNo => "yes".to_string(),
                QuestionKind::FreeText => "anything".to_string(),
            };
            nav.submit_answer(&mut session, &input).unwrap();
            steps += 1;
            assert!(steps <= depth);
        }
        assert!(session.is_complete());
    }

    #[test]
    fn missing_successor_is_unreachable_branch() {
        // A tree that validated elsewhere but is swapped under a live session.
        let full = QuestionTree::new(
            QuestionId::ScriptType,
            vec![
                QuestionNode::free_text(
                    QuestionId::ScriptType,
                    "p",
                    "h",
                    Target::Node(QuestionId::Testing),
                ),
                QuestionNode::free_text(QuestionId::Testing, "p", "h", Target::Done),
            ],
        )
        .unwrap();
        let partial = QuestionTree::new(
            QuestionId::Testing,
            vec![QuestionNode::free_text(QuestionId::Testing, "p", "h", Target::Done)],
        )
        .unwrap();
        let mut session = Navigator::new(&full).start_session();
        let err = Navigator::new(&partial)
            .submit_answer(&mut session, "x")
            .unwrap_err();
        assert!(matches!(err, IntakeError::UnreachableBranch { .. }));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn corrections_win_in_answer_list() {
        let mut list = AnswerList::new(vec![Answer::new(
            QuestionId::ScriptType,
            AnswerValue::Choice(Choice::Indicator),
        )]);
        list.correct(QuestionId::ScriptType, AnswerValue::Choice(Choice::Strategy));
        let a = list.get(QuestionId::ScriptType).unwrap();
        assert!(a.is_correction());
        assert_eq!(a.choice(), Some(Choice::Strategy));
        assert_eq!(list.len(), 2);
    }
}
