use crate::classifier::{EvalContext, Rule};
use crate::types::{Category, Choice, QuestionId, ScriptType};

// ---------------------------------------------------------------------------
// Helper macros for concise rule definitions
// ---------------------------------------------------------------------------

macro_rules! rule {
    (
        id: $id:expr,
        condition: $cond:expr,
        subtype: $subtype:expr
    ) => {
        Rule {
            id: $id,
            condition: $cond,
            subtype: $subtype,
        }
    };
}

// ---------------------------------------------------------------------------
// Condition helpers
// ---------------------------------------------------------------------------

fn is_indicator(ctx: &EvalContext) -> bool {
    ctx.detected_type == ScriptType::Indicator
}

fn is_strategy(ctx: &EvalContext) -> bool {
    ctx.detected_type == ScriptType::Strategy
}

fn is_library(ctx: &EvalContext) -> bool {
    ctx.detected_type == ScriptType::Library
}

fn indicator_purpose(ctx: &EvalContext, purpose: Choice) -> bool {
    is_indicator(ctx) && ctx.choice(QuestionId::IndicatorPurpose) == Some(purpose)
}

fn complexity_is(ctx: &EvalContext, level: Choice) -> bool {
    ctx.choice(QuestionId::Complexity) == Some(level)
}

fn sends_webhooks(ctx: &EvalContext) -> bool {
    ctx.flag(QuestionId::Automation) == Some(true)
        && matches!(
            ctx.choice(QuestionId::AlertDelivery),
            Some(Choice::Webhooks | Choice::AlertsAndWebhooks)
        )
}

fn has_pattern(ctx: &EvalContext, pattern: &str) -> bool {
    ctx.values(Category::Pattern).iter().any(|p| p == pattern)
}

/// `mean reversion` -> `Mean Reversion`.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strategy_style(ctx: &EvalContext) -> String {
    if ctx.strategy_type == "custom" {
        "Custom".to_string()
    } else {
        title_case(ctx.strategy_type)
    }
}

// ---------------------------------------------------------------------------
// Default rules (priority order, first match wins)
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<Rule> {
    vec![
        // Indicators described through the interview
        rule!(
            id: "simple_signals",
            condition: |ctx| indicator_purpose(ctx, Choice::SignalGeneration)
                && complexity_is(ctx, Choice::Simple),
            subtype: |_| "Simple Signals".to_string()
        ),
        rule!(
            id: "signal_dashboard",
            condition: |ctx| indicator_purpose(ctx, Choice::SignalGeneration)
                && complexity_is(ctx, Choice::Complex),
            subtype: |_| "Multi-Signal Dashboard".to_string()
        ),
        rule!(
            id: "signal_generator",
            condition: |ctx| indicator_purpose(ctx, Choice::SignalGeneration),
            subtype: |_| "Signal Generator".to_string()
        ),
        rule!(
            id: "indicator_purpose",
            condition: |ctx| is_indicator(ctx)
                && ctx.choice(QuestionId::IndicatorPurpose).is_some(),
            subtype: |ctx| ctx
                .choice(QuestionId::IndicatorPurpose)
                .map(|c| c.label().to_string())
                .unwrap_or_default()
        ),
        // Indicators described only through content
        rule!(
            id: "divergence_detector",
            condition: |ctx| is_indicator(ctx) && has_pattern(ctx, "divergence"),
            subtype: |_| "Divergence Detector".to_string()
        ),
        rule!(
            id: "content_signals",
            condition: |ctx| is_indicator(ctx)
                && (ctx.has(Category::EntryCondition) || ctx.has(Category::ExitCondition)),
            subtype: |_| "Signal Generator".to_string()
        ),
        rule!(
            id: "indicator_overlay",
            condition: |ctx| is_indicator(ctx) && ctx.has(Category::Indicator),
            subtype: |ctx| {
                let names: Vec<String> = ctx
                    .values(Category::Indicator)
                    .iter()
                    .take(3)
                    .map(|v| v.to_uppercase())
                    .collect();
                format!("{} Based Indicator", names.join("/"))
            }
        ),
        // Strategies
        rule!(
            id: "automated_strategy",
            condition: |ctx| is_strategy(ctx) && sends_webhooks(ctx),
            subtype: |ctx| format!("Automated {} Strategy", strategy_style(ctx))
        ),
        rule!(
            id: "strategy_style",
            condition: |ctx| is_strategy(ctx) && ctx.strategy_type != "custom",
            subtype: |ctx| format!("{} Strategy", strategy_style(ctx))
        ),
        rule!(
            id: "custom_strategy",
            condition: is_strategy,
            subtype: |_| "Custom Strategy".to_string()
        ),
        // Libraries
        rule!(
            id: "library_purpose",
            condition: |ctx| is_library(ctx)
                && ctx.choice(QuestionId::LibraryPurpose).is_some(),
            subtype: |ctx| ctx
                .choice(QuestionId::LibraryPurpose)
                .map(|c| format!("{} Library", c.label()))
                .unwrap_or_default()
        ),
        rule!(
            id: "utility_library",
            condition: is_library,
            subtype: |_| "Utility Library".to_string()
        ),
        // Fallback for plain indicators
        rule!(
            id: "custom_indicator",
            condition: is_indicator,
            subtype: |_| "Custom Indicator".to_string()
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
