use crate::specification::ProjectSpecification;

pub const CONFIRMATION_PROMPT: &str =
    "Is this understanding correct? Reply 'yes' to proceed or describe what needs adjustment.";

/// Human-readable block shown to the user before confirmation. Pure: the
/// same specification always renders to the same text.
pub fn render_summary(spec: &ProjectSpecification) -> String {
    let mut lines: Vec<String> = vec![
        "PROJECT SPECIFICATION".to_string(),
        "=====================".to_string(),
        String::new(),
    ];

    if let Some(src) = &spec.video_source {
        if !src.title.is_empty() {
            lines.push(format!("Source: {}", src.title));
        }
        if !src.author.is_empty() {
            lines.push(format!("Author: {}", src.author));
        }
        if !src.url.is_empty() {
            lines.push(format!("URL: {}", src.url));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Detected Type: {}",
        spec.detected_type.as_str().to_uppercase()
    ));
    if let Some(subtype) = &spec.subtype {
        lines.push(format!("Subtype: {subtype}"));
    }
    lines.push(format!("Complexity: {}/10", spec.complexity_score));
    lines.push(format!("Strategy Style: {}", spec.strategy_type));
    lines.push(String::new());

    lines.push("Main Components:".to_string());
    lines.push(format!(
        "  - Indicators: {}",
        list_or(&spec.main_indicators, "none specific")
    ));
    lines.push(format!(
        "  - Patterns: {}",
        list_or(&spec.trading_patterns, "none specific")
    ));
    lines.push(format!(
        "  - Timeframes: {}",
        list_or(&spec.timeframes, "not specified")
    ));
    lines.push(String::new());

    let req = &spec.implementation_requirements;
    if !req.is_empty() {
        lines.push("Trading Logic:".to_string());
        push_logic(&mut lines, "Entry", "conditions", &req.entry_logic);
        push_logic(&mut lines, "Exit", "conditions", &req.exit_logic);
        push_logic(&mut lines, "Risk", "rules", &req.risk_rules);
        push_logic(&mut lines, "Filters", "filters", &req.market_filter);
        lines.push(String::new());
    }

    if !spec.specific_parameters.is_empty() {
        lines.push("Parameters:".to_string());
        for group in &spec.specific_parameters {
            let values: Vec<String> = group.values.iter().map(|v| v.to_string()).collect();
            lines.push(format!("  - {}: {}", group.kind, values.join(", ")));
        }
        lines.push(String::new());
    }

    if !spec.project.is_empty() {
        lines.push("Project Profile:".to_string());
        for entry in &spec.project {
            let marker = if entry.corrected { " (corrected)" } else { "" };
            lines.push(format!(
                "  - {}: {}{marker}",
                entry.question.heading(),
                entry.answer
            ));
        }
        lines.push(String::new());
    }

    let feasibility = &spec.feasibility;
    lines.push(format!(
        "Feasibility: {}",
        feasibility.overall.as_str().to_uppercase()
    ));
    if !feasibility.limitations.is_empty() {
        lines.push(format!(
            "  Unsupported: {}",
            feasibility.limitations.join(", ")
        ));
    }
    for note in &feasibility.notes {
        lines.push(format!("  - {note}"));
    }
    lines.push(String::new());

    lines.push(CONFIRMATION_PROMPT.to_string());
    lines.join("\n")
}

fn push_logic(lines: &mut Vec<String>, label: &str, noun: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("  - {label}: {} {noun} found", items.len()));
    for item in items {
        lines.push(format!("      {item}"));
    }
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, SourceInfo};
    use crate::assembler::assemble;
    use crate::navigator::{Answer, AnswerList, AnswerValue};
    use crate::types::{Category, Choice, QuestionId};

    const TEXT: &str = "Scalping with RSI divergence on the 5-minute chart. \
                        Buy when RSI(14) crosses above 30. Exit at 70. \
                        Only trade when volume is high. Use a stop loss of 10 pips \
                        and some machine learning.";

    #[test]
    fn render_is_pure() {
        let findings = Analyzer::standard().analyze(TEXT);
        let spec = assemble(None, Some(&findings)).unwrap();
        assert_eq!(render_summary(&spec), render_summary(&spec));
    }

    #[test]
    fn every_finding_category_is_shown() {
        let findings = Analyzer::standard().analyze(TEXT);
        for category in Category::all() {
            assert!(findings.has(*category), "fixture lacks {category}");
        }
        let spec = assemble(None, Some(&findings)).unwrap();
        let text = render_summary(&spec);

        for value in findings.values(Category::Indicator)
            .into_iter()
            .chain(findings.values(Category::Pattern))
            .chain(findings.values(Category::StrategyType))
            .chain(findings.values(Category::RiskRule))
            .chain(findings.values(Category::EntryCondition))
            .chain(findings.values(Category::ExitCondition))
            .chain(findings.values(Category::Filter))
            .chain(findings.values(Category::Timeframe))
            .chain(findings.values(Category::UnsupportedConcept))
        {
            assert!(text.contains(&value), "summary is missing {value:?}");
        }
        assert!(text.contains("Parameters:"));
        assert!(text.contains("pips: 10"));
    }

    #[test]
    fn every_answer_is_shown() {
        let answers = AnswerList::new(vec![
            Answer::new(QuestionId::ScriptType, AnswerValue::Choice(Choice::Library)),
            Answer::new(
                QuestionId::LibraryPurpose,
                AnswerValue::Choice(Choice::RiskCalculations),
            ),
            Answer::new(QuestionId::PerformanceCritical, AnswerValue::Flag(true)),
        ]);
        let spec = assemble(Some(&answers), None).unwrap();
        let text = render_summary(&spec);
        for answer in answers.iter() {
            assert!(text.contains(answer.question().heading()));
            assert!(text.contains(&answer.value().to_string()));
        }
        assert!(text.contains("Detected Type: LIBRARY"));
        assert!(text.contains("Subtype: Risk Calculations Library"));
    }

    #[test]
    fn source_and_prompt() {
        let findings = Analyzer::standard().analyze("RSI").with_source(SourceInfo {
            title: "RSI Basics".into(),
            author: "Chart School".into(),
            url: String::new(),
        });
        let spec = assemble(None, Some(&findings)).unwrap();
        let text = render_summary(&spec);
        assert!(text.starts_with("PROJECT SPECIFICATION"));
        assert!(text.contains("Source: RSI Basics"));
        assert!(text.contains("Author: Chart School"));
        assert!(!text.contains("URL:"));
        assert!(text.ends_with(CONFIRMATION_PROMPT));
    }
}
