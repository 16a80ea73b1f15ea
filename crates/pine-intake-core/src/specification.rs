use crate::analyzer::{Finding, SourceInfo};
use crate::navigator::Answer;
use crate::types::{Feasibility, QuestionId, ScriptType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ImplementationRequirements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationRequirements {
    pub entry_logic: Vec<String>,
    pub exit_logic: Vec<String>,
    pub risk_rules: Vec<String>,
    pub market_filter: Vec<String>,
}

impl ImplementationRequirements {
    pub fn is_empty(&self) -> bool {
        self.entry_logic.is_empty()
            && self.exit_logic.is_empty()
            && self.risk_rules.is_empty()
            && self.market_filter.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ParameterGroup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroup {
    /// `periods`, `percentages`, `levels`, `ratios` or `pips`.
    #[serde(rename = "type")]
    pub kind: String,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// FeasibilityAssessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeasibilityAssessment {
    pub overall: Feasibility,
    #[serde(default)]
    pub notes: Vec<String>,
    /// Unsupported concepts that were detected.
    #[serde(default)]
    pub limitations: Vec<String>,
}

// ---------------------------------------------------------------------------
// ProfileEntry
// ---------------------------------------------------------------------------

/// One interview answer as shown in the project profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub question: QuestionId,
    pub answer: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub corrected: bool,
}

// ---------------------------------------------------------------------------
// ProjectSpecification
// ---------------------------------------------------------------------------

/// Output of the assembler. Field names follow the JSON contract consumed
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpecification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_source: Option<SourceInfo>,
    pub detected_type: ScriptType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub main_indicators: Vec<String>,
    pub trading_patterns: Vec<String>,
    pub strategy_type: String,
    pub timeframes: Vec<String>,
    pub implementation_requirements: ImplementationRequirements,
    pub specific_parameters: Vec<ParameterGroup>,
    pub complexity_score: u8,
    pub feasibility: FeasibilityAssessment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project: Vec<ProfileEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

impl ProjectSpecification {
    pub fn unsupported_concepts(&self) -> &[String] {
        &self.feasibility.limitations
    }
}
