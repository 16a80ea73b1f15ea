use crate::error::{IntakeError, Result};
use crate::types::{Choice, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Target / Branch / Branches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Node(QuestionId),
    Done,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Node(id) => f.write_str(id.as_str()),
            Target::Done => f.write_str("done"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub choice: Choice,
    pub target: Target,
}

/// Outgoing edges of a node. The variant fixes the question kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Branches {
    Choices { options: Vec<Branch> },
    YesNo { yes: Target, no: Target },
    FreeText { next: Target },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    YesNo,
    FreeText,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::YesNo => "yes_no",
            QuestionKind::FreeText => "free_text",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// QuestionNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub id: QuestionId,
    pub prompt: String,
    pub help_text: String,
    pub branches: Branches,
}

impl QuestionNode {
    pub fn choices(
        id: QuestionId,
        prompt: &str,
        help_text: &str,
        options: &[(Choice, Target)],
    ) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            help_text: help_text.to_string(),
            branches: Branches::Choices {
                options: options
                    .iter()
                    .map(|&(choice, target)| Branch { choice, target })
                    .collect(),
            },
        }
    }

    pub fn yes_no(id: QuestionId, prompt: &str, help_text: &str, yes: Target, no: Target) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            help_text: help_text.to_string(),
            branches: Branches::YesNo { yes, no },
        }
    }

    pub fn free_text(id: QuestionId, prompt: &str, help_text: &str, next: Target) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            help_text: help_text.to_string(),
            branches: Branches::FreeText { next },
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self.branches {
            Branches::Choices { .. } => QuestionKind::SingleChoice,
            Branches::YesNo { .. } => QuestionKind::YesNo,
            Branches::FreeText { .. } => QuestionKind::FreeText,
        }
    }

    /// Labels offered to the user, in declaration order.
    pub fn option_labels(&self) -> Vec<String> {
        match &self.branches {
            Branches::Choices { options } => {
                options.iter().map(|b| b.choice.label().to_string()).collect()
            }
            Branches::YesNo { .. } => vec!["Yes".to_string(), "No".to_string()],
            Branches::FreeText { .. } => Vec::new(),
        }
    }

    /// Every target this node can lead to.
    pub fn targets(&self) -> Vec<Target> {
        match &self.branches {
            Branches::Choices { options } => options.iter().map(|b| b.target).collect(),
            Branches::YesNo { yes, no } => vec![*yes, *no],
            Branches::FreeText { next } => vec![*next],
        }
    }

    /// Find the branch whose choice matches already-normalized input.
    pub fn match_choice(&self, normalized: &str) -> Option<&Branch> {
        let Branches::Choices { options } = &self.branches else {
            return None;
        };
        options.iter().find(|b| {
            normalize_input(b.choice.label()) == normalized
                || normalize_input(b.choice.as_str()) == normalized
                || b.choice.aliases().contains(&normalized)
        })
    }
}

// ---------------------------------------------------------------------------
// Input normalization
// ---------------------------------------------------------------------------

/// Lowercase, treat `-` and `_` as spaces, collapse runs of whitespace.
pub fn normalize_input(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

const NOT_SURE_SENTINELS: &[&str] = &[
    "not sure",
    "unsure",
    "i'm not sure",
    "im not sure",
    "i am not sure",
    "don't know",
    "dont know",
    "i don't know",
    "?",
    "help",
];

pub fn is_not_sure(normalized: &str) -> bool {
    let trimmed = normalized.trim_end_matches(['.', '!']);
    NOT_SURE_SENTINELS.contains(&trimmed)
}

const YES_WORDS: &[&str] = &["yes", "y", "yeah", "yep", "true"];
const NO_WORDS: &[&str] = &["no", "n", "nope", "false"];

pub fn parse_yes_no(normalized: &str) -> Option<bool> {
    if YES_WORDS.contains(&normalized) {
        Some(true)
    } else if NO_WORDS.contains(&normalized) {
        Some(false)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// TreeWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeWarning {
    pub node: QuestionId,
    pub message: String,
}

// ---------------------------------------------------------------------------
// QuestionTree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct QuestionTree {
    root: QuestionId,
    nodes: BTreeMap<QuestionId, QuestionNode>,
    /// Declaration order, used for display.
    order: Vec<QuestionId>,
    #[serde(skip)]
    warnings: Vec<TreeWarning>,
}

impl QuestionTree {
    /// Build and validate a tree. Structural defects are errors; unreachable
    /// nodes are reported through [`QuestionTree::warnings`].
    pub fn new(root: QuestionId, nodes: Vec<QuestionNode>) -> Result<Self> {
        let mut map = BTreeMap::new();
        let mut order = Vec::with_capacity(nodes.len());
        for node in nodes {
            let id = node.id;
            if map.insert(id, node).is_some() {
                return Err(IntakeError::TreeInvalid(format!(
                    "duplicate node id '{id}'"
                )));
            }
            order.push(id);
        }

        let mut tree = Self {
            root,
            nodes: map,
            order,
            warnings: Vec::new(),
        };
        tree.warnings = tree.validate()?;
        for w in &tree.warnings {
            tracing::warn!(node = %w.node, "{}", w.message);
        }
        Ok(tree)
    }

    /// The built-in Pine Script project scoping tree.
    pub fn standard() -> &'static QuestionTree {
        static TREE: OnceLock<QuestionTree> = OnceLock::new();
        TREE.get_or_init(|| {
            // The standard tree is covered by tests; failing here is a build defect.
            QuestionTree::new(QuestionId::ScriptType, standard_nodes())
                .unwrap_or_else(|e| panic!("standard question tree is malformed: {e}"))
        })
    }

    pub fn root(&self) -> QuestionId {
        self.root
    }

    pub fn node(&self, id: QuestionId) -> Option<&QuestionNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &QuestionNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn warnings(&self) -> &[TreeWarning] {
        &self.warnings
    }

    /// Number of answers on the longest root-to-terminal path.
    pub fn depth(&self) -> usize {
        let mut memo = BTreeMap::new();
        self.depth_from(self.root, &mut memo)
    }

    fn depth_from(&self, id: QuestionId, memo: &mut BTreeMap<QuestionId, usize>) -> usize {
        if let Some(&d) = memo.get(&id) {
            return d;
        }
        let Some(node) = self.nodes.get(&id) else {
            return 0;
        };
        let deepest = node
            .targets()
            .into_iter()
            .map(|t| match t {
                Target::Node(next) => self.depth_from(next, memo),
                Target::Done => 0,
            })
            .max()
            .unwrap_or(0);
        memo.insert(id, deepest + 1);
        deepest + 1
    }

    fn validate(&self) -> Result<Vec<TreeWarning>> {
        if !self.nodes.contains_key(&self.root) {
            return Err(IntakeError::TreeInvalid(format!(
                "root node '{}' is not declared",
                self.root
            )));
        }

        for node in self.nodes.values() {
            if let Branches::Choices { options } = &node.branches {
                if options.is_empty() {
                    return Err(IntakeError::TreeInvalid(format!(
                        "node '{}' has no outgoing branches",
                        node.id
                    )));
                }
                let mut seen = BTreeSet::new();
                for b in options {
                    if !seen.insert(b.choice) {
                        return Err(IntakeError::TreeInvalid(format!(
                            "node '{}' declares option '{}' twice",
                            node.id,
                            b.choice.label()
                        )));
                    }
                }
            }
            for target in node.targets() {
                if let Target::Node(next) = target {
                    if !self.nodes.contains_key(&next) {
                        return Err(IntakeError::TreeInvalid(format!(
                            "node '{}' branches to undeclared node '{next}'",
                            node.id
                        )));
                    }
                }
            }
        }

        self.check_acyclic()?;

        let reachable = self.reachable();
        Ok(self
            .order
            .iter()
            .filter(|id| !reachable.contains(id))
            .map(|&id| TreeWarning {
                node: id,
                message: format!("node '{id}' is unreachable from root '{}'", self.root),
            })
            .collect())
    }

    fn reachable(&self) -> BTreeSet<QuestionId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                for t in node.targets() {
                    if let Target::Node(next) = t {
                        stack.push(next);
                    }
                }
            }
        }
        seen
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            tree: &QuestionTree,
            id: QuestionId,
            marks: &mut BTreeMap<QuestionId, Mark>,
        ) -> Result<()> {
            match marks.get(&id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(IntakeError::TreeInvalid(format!(
                        "cycle detected through node '{id}'"
                    )))
                }
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            if let Some(node) = tree.nodes.get(&id) {
                for t in node.targets() {
                    if let Target::Node(next) = t {
                        visit(tree, next, marks)?;
                    }
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks = BTreeMap::new();
        for &id in &self.order {
            visit(self, id, &mut marks)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Standard tree
// ---------------------------------------------------------------------------

fn standard_nodes() -> Vec<QuestionNode> {
    use Choice as C;
    use QuestionId as Q;
    use Target::{Done, Node};

    vec![
        QuestionNode::choices(
            Q::ScriptType,
            "What type of script do you need?",
            "An indicator plots values and signals on the chart. A strategy also \
             simulates orders and reports backtest results. A library exports reusable \
             functions for other scripts.",
            &[
                (C::Indicator, Node(Q::IndicatorPurpose)),
                (C::Strategy, Node(Q::StrategyPurpose)),
                (C::Library, Node(Q::LibraryPurpose)),
            ],
        ),
        QuestionNode::choices(
            Q::IndicatorPurpose,
            "What is the main purpose of the indicator?",
            "Signal generation marks buy/sell points. Trend analysis shows direction. \
             Volatility and volume tools measure market activity. Market structure maps \
             highs, lows and levels.",
            &[
                (C::SignalGeneration, Node(Q::Complexity)),
                (C::TrendAnalysis, Node(Q::Complexity)),
                (C::VolatilityMeasurement, Node(Q::Complexity)),
                (C::VolumeAnalysis, Node(Q::Complexity)),
                (C::MarketStructure, Node(Q::Complexity)),
                (C::CustomCalculation, Node(Q::Complexity)),
            ],
        ),
        QuestionNode::choices(
            Q::StrategyPurpose,
            "Which trading style should the strategy follow?",
            "Trend following rides sustained moves. Mean reversion fades extremes. \
             Breakout trades range expansions. Scalping targets very short holds. \
             Swing trading holds for days.",
            &[
                (C::TrendFollowing, Node(Q::Complexity)),
                (C::MeanReversion, Node(Q::Complexity)),
                (C::Breakout, Node(Q::Complexity)),
                (C::Scalping, Node(Q::Complexity)),
                (C::SwingTrading, Node(Q::Complexity)),
            ],
        ),
        QuestionNode::choices(
            Q::LibraryPurpose,
            "What will the library provide?",
            "Libraries export functions, types and methods. Pick the kind of code other \
             scripts will import from it.",
            &[
                (C::UtilityFunctions, Node(Q::Complexity)),
                (C::IndicatorCalculations, Node(Q::Complexity)),
                (C::DrawingTools, Node(Q::Complexity)),
                (C::RiskCalculations, Node(Q::Complexity)),
            ],
        ),
        QuestionNode::choices(
            Q::Complexity,
            "How complex is the logic?",
            "Simple: one or two conditions. Moderate: several combined conditions or \
             inputs. Complex: multiple components, state tracking or multi-timeframe \
             logic.",
            &[
                (C::Simple, Node(Q::Automation)),
                (C::Moderate, Node(Q::Automation)),
                (C::Complex, Node(Q::Automation)),
            ],
        ),
        QuestionNode::yes_no(
            Q::Automation,
            "Do you need alerts or automation?",
            "Automation means alert conditions or webhook messages that notify you or \
             an external service when signals fire.",
            Node(Q::AlertDelivery),
            Node(Q::Distribution),
        ),
        QuestionNode::choices(
            Q::AlertDelivery,
            "How should alerts be delivered?",
            "Alerts only notify you in the platform. Webhooks send a JSON payload to an \
             external URL for automated execution.",
            &[
                (C::AlertsOnly, Node(Q::Distribution)),
                (C::Webhooks, Node(Q::Distribution)),
                (C::AlertsAndWebhooks, Node(Q::Distribution)),
            ],
        ),
        QuestionNode::choices(
            Q::Distribution,
            "Who will use the script?",
            "Personal scripts stay private. Public scripts are published to the \
             community. Commercial scripts are sold or shared with selected users.",
            &[
                (C::Personal, Node(Q::DeliveryMode)),
                (C::Public, Node(Q::DeliveryMode)),
                (C::Commercial, Node(Q::SourceProtection)),
            ],
        ),
        QuestionNode::choices(
            Q::SourceProtection,
            "How should the source be protected?",
            "Protected source hides the code but anyone can add the script. Invite only \
             hides the code and restricts access to users you authorize.",
            &[
                (C::ProtectedSource, Node(Q::DeliveryMode)),
                (C::InviteOnly, Node(Q::DeliveryMode)),
            ],
        ),
        QuestionNode::choices(
            Q::DeliveryMode,
            "Do you want a rapid prototype or a production-ready script?",
            "A rapid prototype proves the idea quickly with minimal inputs. Production \
             ready adds input validation, documentation and edge-case handling.",
            &[
                (C::RapidPrototype, Node(Q::Dependencies)),
                (C::ProductionReady, Node(Q::Dependencies)),
            ],
        ),
        QuestionNode::choices(
            Q::Dependencies,
            "Does the script depend on anything beyond the core language?",
            "None means everything is written inline. Built-in functions use the \
             standard ta/math namespaces. External libraries import published \
             libraries.",
            &[
                (C::NoDependencies, Node(Q::DataSource)),
                (C::BuiltInFunctions, Node(Q::DataSource)),
                (C::ExternalLibraries, Node(Q::LibraryNames)),
            ],
        ),
        QuestionNode::free_text(
            Q::LibraryNames,
            "Which libraries should be imported?",
            "List the published libraries by author/name, separated by commas.",
            Node(Q::DataSource),
        ),
        QuestionNode::choices(
            Q::DataSource,
            "What data does the script need?",
            "Standard OHLCV uses the chart's own bars. Multi-timeframe requests data \
             from other timeframes. Multi-symbol requests other tickers. Custom data \
             uses imported or seeded datasets.",
            &[
                (C::StandardOhlcv, Node(Q::PerformanceCritical)),
                (C::MultiTimeframe, Node(Q::PerformanceCritical)),
                (C::MultiSymbol, Node(Q::PerformanceCritical)),
                (C::CustomData, Node(Q::PerformanceCritical)),
            ],
        ),
        QuestionNode::yes_no(
            Q::PerformanceCritical,
            "Is execution performance critical?",
            "Performance matters when the script runs on many bars with loops, large \
             arrays or many security requests.",
            Node(Q::Visuals),
            Node(Q::Visuals),
        ),
        QuestionNode::choices(
            Q::Visuals,
            "What level of visuals do you need?",
            "Basic means plots and shapes. Advanced adds tables, labels, boxes and \
             color gradients. None is for scripts that only compute values or alerts.",
            &[
                (C::BasicVisuals, Node(Q::Testing)),
                (C::AdvancedVisuals, Node(Q::Testing)),
                (C::NoVisuals, Node(Q::Testing)),
            ],
        ),
        QuestionNode::choices(
            Q::Testing,
            "How thoroughly should the script be tested?",
            "Basic testing checks the script compiles and plots correctly. \
             Comprehensive testing covers edge cases, multiple symbols and timeframes.",
            &[(C::BasicTesting, Done), (C::ComprehensiveTesting, Done)],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
