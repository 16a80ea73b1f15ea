use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// QuestionId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    ScriptType,
    IndicatorPurpose,
    StrategyPurpose,
    LibraryPurpose,
    Complexity,
    Automation,
    AlertDelivery,
    Distribution,
    SourceProtection,
    DeliveryMode,
    Dependencies,
    LibraryNames,
    DataSource,
    PerformanceCritical,
    Visuals,
    Testing,
}

impl QuestionId {
    pub fn all() -> &'static [QuestionId] {
        &[
            QuestionId::ScriptType,
            QuestionId::IndicatorPurpose,
            QuestionId::StrategyPurpose,
            QuestionId::LibraryPurpose,
            QuestionId::Complexity,
            QuestionId::Automation,
            QuestionId::AlertDelivery,
            QuestionId::Distribution,
            QuestionId::SourceProtection,
            QuestionId::DeliveryMode,
            QuestionId::Dependencies,
            QuestionId::LibraryNames,
            QuestionId::DataSource,
            QuestionId::PerformanceCritical,
            QuestionId::Visuals,
            QuestionId::Testing,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionId::ScriptType => "script_type",
            QuestionId::IndicatorPurpose => "indicator_purpose",
            QuestionId::StrategyPurpose => "strategy_purpose",
            QuestionId::LibraryPurpose => "library_purpose",
            QuestionId::Complexity => "complexity",
            QuestionId::Automation => "automation",
            QuestionId::AlertDelivery => "alert_delivery",
            QuestionId::Distribution => "distribution",
            QuestionId::SourceProtection => "source_protection",
            QuestionId::DeliveryMode => "delivery_mode",
            QuestionId::Dependencies => "dependencies",
            QuestionId::LibraryNames => "library_names",
            QuestionId::DataSource => "data_source",
            QuestionId::PerformanceCritical => "performance_critical",
            QuestionId::Visuals => "visuals",
            QuestionId::Testing => "testing",
        }
    }

    /// Short heading used when listing answers back to the user.
    pub fn heading(self) -> &'static str {
        match self {
            QuestionId::ScriptType => "Script type",
            QuestionId::IndicatorPurpose
            | QuestionId::StrategyPurpose
            | QuestionId::LibraryPurpose => "Purpose",
            QuestionId::Complexity => "Complexity",
            QuestionId::Automation => "Automation",
            QuestionId::AlertDelivery => "Alert delivery",
            QuestionId::Distribution => "Distribution",
            QuestionId::SourceProtection => "Source protection",
            QuestionId::DeliveryMode => "Delivery",
            QuestionId::Dependencies => "Dependencies",
            QuestionId::LibraryNames => "Libraries",
            QuestionId::DataSource => "Data",
            QuestionId::PerformanceCritical => "Performance critical",
            QuestionId::Visuals => "Visuals",
            QuestionId::Testing => "Testing",
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionId {
    type Err = crate::error::IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionId::all()
            .iter()
            .copied()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| crate::error::IntakeError::UnknownQuestion(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// Every labeled option offered by a closed-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    // script_type
    Indicator,
    Strategy,
    Library,
    // indicator_purpose
    SignalGeneration,
    TrendAnalysis,
    VolatilityMeasurement,
    VolumeAnalysis,
    MarketStructure,
    CustomCalculation,
    // strategy_purpose
    TrendFollowing,
    MeanReversion,
    Breakout,
    Scalping,
    SwingTrading,
    // library_purpose
    UtilityFunctions,
    IndicatorCalculations,
    DrawingTools,
    RiskCalculations,
    // complexity
    Simple,
    Moderate,
    Complex,
    // alert_delivery
    AlertsOnly,
    Webhooks,
    AlertsAndWebhooks,
    // distribution
    Personal,
    Public,
    Commercial,
    // source_protection
    ProtectedSource,
    InviteOnly,
    // delivery_mode
    RapidPrototype,
    ProductionReady,
    // dependencies
    NoDependencies,
    BuiltInFunctions,
    ExternalLibraries,
    // data_source
    StandardOhlcv,
    MultiTimeframe,
    MultiSymbol,
    CustomData,
    // visuals
    BasicVisuals,
    AdvancedVisuals,
    NoVisuals,
    // testing
    BasicTesting,
    ComprehensiveTesting,
}

impl Choice {
    pub fn as_str(self) -> &'static str {
        match self {
            Choice::Indicator => "indicator",
            Choice::Strategy => "strategy",
            Choice::Library => "library",
            Choice::SignalGeneration => "signal_generation",
            Choice::TrendAnalysis => "trend_analysis",
            Choice::VolatilityMeasurement => "volatility_measurement",
            Choice::VolumeAnalysis => "volume_analysis",
            Choice::MarketStructure => "market_structure",
            Choice::CustomCalculation => "custom_calculation",
            Choice::TrendFollowing => "trend_following",
            Choice::MeanReversion => "mean_reversion",
            Choice::Breakout => "breakout",
            Choice::Scalping => "scalping",
            Choice::SwingTrading => "swing_trading",
            Choice::UtilityFunctions => "utility_functions",
            Choice::IndicatorCalculations => "indicator_calculations",
            Choice::DrawingTools => "drawing_tools",
            Choice::RiskCalculations => "risk_calculations",
            Choice::Simple => "simple",
            Choice::Moderate => "moderate",
            Choice::Complex => "complex",
            Choice::AlertsOnly => "alerts_only",
            Choice::Webhooks => "webhooks",
            Choice::AlertsAndWebhooks => "alerts_and_webhooks",
            Choice::Personal => "personal",
            Choice::Public => "public",
            Choice::Commercial => "commercial",
            Choice::ProtectedSource => "protected_source",
            Choice::InviteOnly => "invite_only",
            Choice::RapidPrototype => "rapid_prototype",
            Choice::ProductionReady => "production_ready",
            Choice::NoDependencies => "no_dependencies",
            Choice::BuiltInFunctions => "built_in_functions",
            Choice::ExternalLibraries => "external_libraries",
            Choice::StandardOhlcv => "standard_ohlcv",
            Choice::MultiTimeframe => "multi_timeframe",
            Choice::MultiSymbol => "multi_symbol",
            Choice::CustomData => "custom_data",
            Choice::BasicVisuals => "basic_visuals",
            Choice::AdvancedVisuals => "advanced_visuals",
            Choice::NoVisuals => "no_visuals",
            Choice::BasicTesting => "basic_testing",
            Choice::ComprehensiveTesting => "comprehensive_testing",
        }
    }

    /// The label presented to the user.
    pub fn label(self) -> &'static str {
        match self {
            Choice::Indicator => "Indicator",
            Choice::Strategy => "Strategy",
            Choice::Library => "Library",
            Choice::SignalGeneration => "Signal Generation",
            Choice::TrendAnalysis => "Trend Analysis",
            Choice::VolatilityMeasurement => "Volatility Measurement",
            Choice::VolumeAnalysis => "Volume Analysis",
            Choice::MarketStructure => "Market Structure",
            Choice::CustomCalculation => "Custom Calculation",
            Choice::TrendFollowing => "Trend Following",
            Choice::MeanReversion => "Mean Reversion",
            Choice::Breakout => "Breakout",
            Choice::Scalping => "Scalping",
            Choice::SwingTrading => "Swing Trading",
            Choice::UtilityFunctions => "Utility Functions",
            Choice::IndicatorCalculations => "Indicator Calculations",
            Choice::DrawingTools => "Drawing Tools",
            Choice::RiskCalculations => "Risk Calculations",
            Choice::Simple => "Simple",
            Choice::Moderate => "Moderate",
            Choice::Complex => "Complex",
            Choice::AlertsOnly => "Alerts Only",
            Choice::Webhooks => "Webhooks",
            Choice::AlertsAndWebhooks => "Alerts and Webhooks",
            Choice::Personal => "Personal",
            Choice::Public => "Public",
            Choice::Commercial => "Commercial",
            Choice::ProtectedSource => "Protected Source",
            Choice::InviteOnly => "Invite Only",
            Choice::RapidPrototype => "Rapid Prototype",
            Choice::ProductionReady => "Production Ready",
            Choice::NoDependencies => "None",
            Choice::BuiltInFunctions => "Built-in Functions",
            Choice::ExternalLibraries => "External Libraries",
            Choice::StandardOhlcv => "Standard OHLCV",
            Choice::MultiTimeframe => "Multi-Timeframe",
            Choice::MultiSymbol => "Multi-Symbol",
            Choice::CustomData => "Custom Data",
            Choice::BasicVisuals => "Basic",
            Choice::AdvancedVisuals => "Advanced",
            Choice::NoVisuals => "None",
            Choice::BasicTesting => "Basic",
            Choice::ComprehensiveTesting => "Comprehensive",
        }
    }

    /// Extra spellings accepted for this option, already in normalized form.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Choice::SignalGeneration => &["signals", "signal"],
            Choice::TrendAnalysis => &["trend"],
            Choice::VolatilityMeasurement => &["volatility"],
            Choice::VolumeAnalysis => &["volume"],
            Choice::CustomCalculation => &["custom"],
            Choice::MeanReversion => &["reversion"],
            Choice::SwingTrading => &["swing"],
            Choice::UtilityFunctions => &["utilities", "utility"],
            Choice::Moderate => &["medium"],
            Choice::AlertsOnly => &["alerts"],
            Choice::AlertsAndWebhooks => &["both"],
            Choice::Personal => &["private"],
            Choice::RapidPrototype => &["prototype", "quick"],
            Choice::ProductionReady => &["production"],
            Choice::NoDependencies => &["no dependencies", "no"],
            Choice::BuiltInFunctions => &["built in", "builtin"],
            Choice::ExternalLibraries => &["libraries", "external"],
            Choice::StandardOhlcv => &["ohlcv", "standard"],
            Choice::MultiTimeframe => &["mtf"],
            Choice::NoVisuals => &["no"],
            _ => &[],
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ScriptType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    Indicator,
    Strategy,
    Library,
    Unknown,
}

impl ScriptType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptType::Indicator => "indicator",
            ScriptType::Strategy => "strategy",
            ScriptType::Library => "library",
            ScriptType::Unknown => "unknown",
        }
    }

    pub fn from_choice(choice: Choice) -> Option<ScriptType> {
        match choice {
            Choice::Indicator => Some(ScriptType::Indicator),
            Choice::Strategy => Some(ScriptType::Strategy),
            Choice::Library => Some(ScriptType::Library),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Indicator,
    Pattern,
    StrategyType,
    RiskRule,
    EntryCondition,
    ExitCondition,
    Filter,
    NumericValue,
    Timeframe,
    UnsupportedConcept,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Indicator,
            Category::Pattern,
            Category::StrategyType,
            Category::RiskRule,
            Category::EntryCondition,
            Category::ExitCondition,
            Category::Filter,
            Category::NumericValue,
            Category::Timeframe,
            Category::UnsupportedConcept,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Indicator => "indicator",
            Category::Pattern => "pattern",
            Category::StrategyType => "strategy_type",
            Category::RiskRule => "risk_rule",
            Category::EntryCondition => "entry_condition",
            Category::ExitCondition => "exit_condition",
            Category::Filter => "filter",
            Category::NumericValue => "numeric_value",
            Category::Timeframe => "timeframe",
            Category::UnsupportedConcept => "unsupported_concept",
        }
    }

    /// Categories populated from keyword dictionaries (stage 1).
    pub fn is_keyword_category(self) -> bool {
        matches!(
            self,
            Category::Indicator
                | Category::Pattern
                | Category::StrategyType
                | Category::RiskRule
                | Category::Timeframe
                | Category::UnsupportedConcept
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = crate::error::IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::error::IntakeError::UnknownCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// NumericKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Period,
    Percentage,
    Level,
    Ratio,
    Pips,
}

impl NumericKind {
    pub fn all() -> &'static [NumericKind] {
        &[
            NumericKind::Period,
            NumericKind::Percentage,
            NumericKind::Level,
            NumericKind::Ratio,
            NumericKind::Pips,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NumericKind::Period => "period",
            NumericKind::Percentage => "percentage",
            NumericKind::Level => "level",
            NumericKind::Ratio => "ratio",
            NumericKind::Pips => "pips",
        }
    }

    /// Group name used in `specific_parameters`.
    pub fn group_name(self) -> &'static str {
        match self {
            NumericKind::Period => "periods",
            NumericKind::Percentage => "percentages",
            NumericKind::Level => "levels",
            NumericKind::Ratio => "ratios",
            NumericKind::Pips => "pips",
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Feasibility
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feasibility {
    Full,
    Partial,
    Limited,
}

impl Feasibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Feasibility::Full => "full",
            Feasibility::Partial => "partial",
            Feasibility::Limited => "limited",
        }
    }
}

impl fmt::Display for Feasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
