use crate::dictionary::{Dictionary, ENTRY_TRIGGERS, EXIT_TRIGGERS, FILTER_TRIGGERS};
use crate::error::{IntakeError, Result};
use crate::types::{Category, NumericKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;

/// Upper bound on the clause window kept for context findings.
const CLAUSE_WINDOW: usize = 160;

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingValue {
    Keyword { value: String },
    Clause { value: String },
    Numeric { kind: NumericKind, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub raw_text: String,
    pub value: FindingValue,
}

impl Finding {
    pub fn keyword(category: Category, raw_text: &str, canonical: &str) -> Self {
        Self {
            category,
            raw_text: raw_text.to_string(),
            value: FindingValue::Keyword {
                value: canonical.to_string(),
            },
        }
    }

    pub fn clause(category: Category, raw_text: &str, clause: &str) -> Self {
        Self {
            category,
            raw_text: raw_text.to_string(),
            value: FindingValue::Clause {
                value: clause.to_string(),
            },
        }
    }

    pub fn numeric(raw_text: &str, kind: NumericKind, value: f64) -> Self {
        Self {
            category: Category::NumericValue,
            raw_text: raw_text.to_string(),
            value: FindingValue::Numeric { kind, value },
        }
    }

    /// Canonical keyword, clause window, or `kind:value` for numbers.
    pub fn normalized(&self) -> String {
        match &self.value {
            FindingValue::Keyword { value } | FindingValue::Clause { value } => value.clone(),
            FindingValue::Numeric { kind, value } => format!("{kind}:{value}"),
        }
    }

    pub fn numeric_value(&self) -> Option<(NumericKind, f64)> {
        match self.value {
            FindingValue::Numeric { kind, value } => Some((kind, value)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SourceInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub url: String,
}

// ---------------------------------------------------------------------------
// FindingSet
// ---------------------------------------------------------------------------

/// Findings from one analysis pass. Order within a category carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
    /// Length in characters of the analysed text.
    #[serde(default)]
    pub text_length: usize,
    findings: Vec<Finding>,
}

impl FindingSet {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            source: None,
            text_length: 0,
            findings,
        }
    }

    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = Some(source);
        self
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    pub fn has(&self, category: Category) -> bool {
        self.by_category(category).next().is_some()
    }

    /// Distinct normalized values in a category, in first-seen order.
    pub fn values(&self, category: Category) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for f in self.by_category(category) {
            let v = f.normalized();
            if !out.contains(&v) {
                out.push(v);
            }
        }
        out
    }

    pub fn numeric(&self, kind: NumericKind) -> Vec<f64> {
        self.findings
            .iter()
            .filter_map(Finding::numeric_value)
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for f in &self.findings {
            *counts.entry(f.category).or_insert(0) += 1;
        }
        counts
    }

    /// Sorted normalized values per category; equal for equal multisets.
    pub fn normalized_multiset(&self) -> BTreeMap<Category, Vec<String>> {
        let mut out: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for f in &self.findings {
            out.entry(f.category).or_default().push(f.normalized());
        }
        for values in out.values_mut() {
            values.sort();
        }
        out
    }

    /// Merge findings from a follow-up analysis. Keyword findings already
    /// present are not duplicated; clauses and numbers are appended.
    pub fn merge(&mut self, other: FindingSet) {
        for f in other.findings {
            let duplicate = matches!(f.value, FindingValue::Keyword { .. })
                && self
                    .findings
                    .iter()
                    .any(|g| g.category == f.category && g.normalized() == f.normalized());
            if !duplicate {
                self.findings.push(f);
            }
        }
        self.text_length += other.text_length;
        if self.source.is_none() {
            self.source = other.source;
        }
    }

    /// Merge a correction: every keyword category present in `other`
    /// replaces what this set held for that category.
    pub fn supersede(&mut self, other: FindingSet) {
        let replaced: Vec<Category> = other
            .findings
            .iter()
            .filter(|f| matches!(f.value, FindingValue::Keyword { .. }))
            .map(|f| f.category)
            .collect();
        self.findings.retain(|f| !replaced.contains(&f.category));
        self.merge(other);
    }

    pub fn retain(&mut self, keep: impl FnMut(&Finding) -> bool) {
        self.findings.retain(keep);
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

struct KeywordMatcher {
    category: Category,
    canonical: String,
    regex: Regex,
}

struct NumericRule {
    kind: NumericKind,
    regex: Regex,
}

pub struct Analyzer {
    keywords: Vec<KeywordMatcher>,
    triggers: Vec<(Category, Regex)>,
    numeric: Vec<NumericRule>,
    sentence_break: Regex,
    workarounds: BTreeMap<String, String>,
}

impl Analyzer {
    pub fn new(dictionary: &Dictionary) -> Result<Self> {
        let mut keywords = Vec::new();
        for (category, table) in dictionary.keyword_tables() {
            for entry in table {
                keywords.push(KeywordMatcher {
                    category,
                    canonical: entry.canonical.clone(),
                    regex: phrase_regex(entry.spellings())?,
                });
            }
        }

        let triggers = vec![
            (
                Category::EntryCondition,
                phrase_regex(ENTRY_TRIGGERS.iter().copied())?,
            ),
            (
                Category::ExitCondition,
                phrase_regex(EXIT_TRIGGERS.iter().copied())?,
            ),
            (Category::Filter, phrase_regex(FILTER_TRIGGERS.iter().copied())?),
        ];

        let indicators = alternation(dictionary.indicator_spellings().into_iter());
        let num = r"(\d+(?:\.\d+)?)";
        // Earlier rules claim a number first. Period rules capture decimals
        // too so "2.5 bar" is claimed whole and then rejected.
        let numeric = vec![
            NumericRule {
                kind: NumericKind::Period,
                regex: Regex::new(&format!(
                    r"(?i)\b(?:{indicators})\s*\(\s*{num}\s*(?:,[^)]*)?\)"
                ))?,
            },
            NumericRule {
                kind: NumericKind::Period,
                regex: Regex::new(&format!(
                    r"(?i)\b{num}[\s-]*(?:periods?|bars?|length|candles?|days?)\b"
                ))?,
            },
            NumericRule {
                kind: NumericKind::Period,
                regex: Regex::new(&format!(
                    r"(?i)\b(?:period|length|lookback)\s+(?:of\s+)?{num}\b"
                ))?,
            },
            NumericRule {
                kind: NumericKind::Percentage,
                regex: Regex::new(&format!(r"(?i)\b{num}\s*(?:%|percent\b|pct\b)"))?,
            },
            NumericRule {
                kind: NumericKind::Ratio,
                regex: Regex::new(&format!(r"\b{num}\s*:\s*1\b"))?,
            },
            NumericRule {
                kind: NumericKind::Ratio,
                regex: Regex::new(&format!(r"(?i)\b{num}\s*(?:x|times)\b"))?,
            },
            NumericRule {
                kind: NumericKind::Pips,
                regex: Regex::new(&format!(r"(?i)\b{num}\s*(?:pips?|points?|ticks?)\b"))?,
            },
            NumericRule {
                kind: NumericKind::Level,
                regex: Regex::new(&format!(
                    r"(?i)\b(?:above|below|over|under|reaches|hits)\s+(?:the\s+)?{num}\b"
                ))?,
            },
            NumericRule {
                kind: NumericKind::Level,
                regex: Regex::new(&format!(
                    r"(?i)\b(?:level|zone|area|threshold)\s+(?:of\s+|at\s+|around\s+|near\s+)?{num}\b"
                ))?,
            },
            NumericRule {
                kind: NumericKind::Level,
                regex: Regex::new(&format!(
                    r"(?i)\b(?:{indicators})\s+(?:at\s+|of\s+|=\s*)?{num}\b"
                ))?,
            },
        ];

        Ok(Self {
            keywords,
            triggers,
            numeric,
            sentence_break: Regex::new(r"[.!?]+(?:\s+|$)|\n+")?,
            workarounds: dictionary
                .unsupported
                .iter()
                .filter(|u| !u.workaround.is_empty())
                .map(|u| (u.entry.canonical.clone(), u.workaround.clone()))
                .collect(),
        })
    }

    /// Analyzer over the built-in dictionaries.
    pub fn standard() -> &'static Analyzer {
        static ANALYZER: OnceLock<Analyzer> = OnceLock::new();
        ANALYZER.get_or_init(|| {
            Analyzer::new(&Dictionary::standard())
                .unwrap_or_else(|e| panic!("built-in dictionaries failed to compile: {e}"))
        })
    }

    /// Workaround hint for an unsupported concept, by canonical name.
    pub fn workaround_for(&self, concept: &str) -> Option<&str> {
        self.workarounds.get(concept).map(String::as_str)
    }

    /// Analyze raw bytes, rejecting input that is not UTF-8.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<FindingSet> {
        let text = std::str::from_utf8(bytes).map_err(|e| IntakeError::InvalidEncoding {
            offset: e.valid_up_to(),
        })?;
        Ok(self.analyze(text))
    }

    pub fn analyze(&self, text: &str) -> FindingSet {
        let mut findings = Vec::new();
        if text.trim().is_empty() {
            return FindingSet::new(findings);
        }

        self.extract_keywords(text, &mut findings);
        self.extract_context(text, &mut findings);
        self.extract_numbers(text, &mut findings);

        tracing::debug!(
            chars = text.chars().count(),
            findings = findings.len(),
            "analysis complete"
        );
        let mut set = FindingSet::new(findings);
        set.text_length = text.chars().count();
        set
    }

    fn extract_keywords(&self, text: &str, out: &mut Vec<Finding>) {
        for m in &self.keywords {
            if let Some(hit) = m.regex.find(text) {
                out.push(Finding::keyword(m.category, hit.as_str(), &m.canonical));
            }
        }
    }

    fn extract_context(&self, text: &str, out: &mut Vec<Finding>) {
        for sentence in self.sentence_break.split(text) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            for (category, regex) in &self.triggers {
                if let Some(hit) = regex.find(sentence) {
                    let window = bounded(&sentence[hit.start()..], CLAUSE_WINDOW).to_lowercase();
                    out.push(Finding::clause(*category, sentence, window.trim()));
                }
            }
        }
    }

    fn extract_numbers(&self, text: &str, out: &mut Vec<Finding>) {
        let mut claimed: Vec<Range<usize>> = Vec::new();
        for rule in &self.numeric {
            for caps in rule.regex.captures_iter(text) {
                let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let span = number.range();
                if claimed
                    .iter()
                    .any(|c| c.start < span.end && span.start < c.end)
                {
                    continue;
                }
                let Ok(value) = number.as_str().parse::<f64>() else {
                    continue;
                };
                claimed.push(span);
                // Periods count bars; a fractional one is not a period.
                if rule.kind == NumericKind::Period && value.fract() != 0.0 {
                    continue;
                }
                out.push(Finding::numeric(whole.as_str().trim(), rule.kind, value));
            }
        }
    }
}

/// Whole-phrase, case-insensitive alternation over literal spellings.
fn phrase_regex<'a>(spellings: impl Iterator<Item = &'a str>) -> Result<Regex> {
    Ok(Regex::new(&format!(r"(?i)\b(?:{})\b", alternation(spellings)))?)
}

/// Escaped alternation, longest spelling first so longer phrases win.
fn alternation<'a>(spellings: impl Iterator<Item = &'a str>) -> String {
    let mut parts: Vec<&str> = spellings.filter(|s| !s.trim().is_empty()).collect();
    parts.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    parts.dedup();
    parts
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|")
}

fn bounded(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str = "Buy when RSI(14) crosses above 30 and volume spikes 1.5x average. \
                              Exit at RSI 70 or 5% profit.";

    fn numbers(set: &FindingSet) -> Vec<(NumericKind, f64)> {
        let mut v: Vec<_> = set
            .findings()
            .iter()
            .filter_map(Finding::numeric_value)
            .collect();
        v.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        v
    }

    #[test]
    fn scenario_a() {
        let set = Analyzer::standard().analyze(SCENARIO_A);

        assert_eq!(set.values(Category::Indicator), vec!["rsi"]);
        assert_eq!(
            numbers(&set),
            vec![
                (NumericKind::Period, 14.0),
                (NumericKind::Percentage, 5.0),
                (NumericKind::Level, 30.0),
                (NumericKind::Level, 70.0),
                (NumericKind::Ratio, 1.5),
            ]
        );

        let entry: Vec<_> = set.by_category(Category::EntryCondition).collect();
        assert_eq!(entry.len(), 1);
        assert!(entry[0].raw_text.starts_with("Buy when RSI(14)"));
        assert!(entry[0].normalized().starts_with("buy when"));

        let exit: Vec<_> = set.by_category(Category::ExitCondition).collect();
        assert_eq!(exit.len(), 1);
        assert_eq!(exit[0].raw_text, "Exit at RSI 70 or 5% profit");
    }

    #[test]
    fn analysis_is_deterministic() {
        let text = "Swing trading with EMA 200 and MACD divergence. Stop loss 2%, take profit \
                    at 3:1. Only trade when ADX is above 25 on the daily chart.";
        let a = Analyzer::standard().analyze(text);
        let b = Analyzer::standard().analyze(text);
        assert_eq!(a.counts(), b.counts());
        assert_eq!(a.normalized_multiset(), b.normalized_multiset());
    }

    #[test]
    fn empty_and_whitespace_give_empty_set() {
        assert!(Analyzer::standard().analyze("").is_empty());
        assert!(Analyzer::standard().analyze("  \n\t ").is_empty());
    }

    #[test]
    fn unrelated_text_gives_empty_set() {
        let set = Analyzer::standard().analyze("The weather is lovely today and the cat sleeps.");
        assert!(set.is_empty());
    }

    #[test]
    fn fractional_bar_counts_are_not_periods() {
        let set = Analyzer::standard().analyze("Use a 2.5 bar offset.");
        assert!(numbers(&set).is_empty());

        let set = Analyzer::standard().analyze("Smooth over 20 bars with a 1.5 bar lag.");
        assert_eq!(numbers(&set), vec![(NumericKind::Period, 20.0)]);
    }

    #[test]
    fn overlapping_matches_are_all_kept() {
        let set = Analyzer::standard().analyze("Look for RSI divergence on pullbacks.");
        assert_eq!(set.values(Category::Indicator), vec!["rsi"]);
        assert_eq!(set.values(Category::Pattern), vec!["divergence"]);
    }

    #[test]
    fn synonyms_map_to_canonical() {
        let set = Analyzer::standard().analyze("Use a stop-loss and a Stop Loss again.");
        assert_eq!(set.values(Category::RiskRule), vec!["stop loss"]);
        assert_eq!(set.by_category(Category::RiskRule).count(), 1);
    }

    #[test]
    fn keywords_need_whole_words() {
        let set = Analyzer::standard().analyze("Several versions of the atrium design.");
        assert!(!set.has(Category::Indicator));
    }

    #[test]
    fn numeric_forms() {
        let set = Analyzer::standard().analyze(
            "Use a 20 period SMA, risk 2:1, stop 15 pips away, resistance level at 1.2050.",
        );
        let nums = numbers(&set);
        assert!(nums.contains(&(NumericKind::Period, 20.0)));
        assert!(nums.contains(&(NumericKind::Ratio, 2.0)));
        assert!(nums.contains(&(NumericKind::Pips, 15.0)));
        assert!(nums.contains(&(NumericKind::Level, 1.205)));
    }

    #[test]
    fn filter_trigger_produces_filter_finding() {
        let set = Analyzer::standard()
            .analyze("Only trade when the market is trending. Avoid trading during news!");
        assert_eq!(set.by_category(Category::Filter).count(), 2);
    }

    #[test]
    fn timeframes_and_unsupported_concepts() {
        let set = Analyzer::standard().analyze(
            "Run it on the 4-hour and daily chart, combined with a neural network and the order book.",
        );
        assert_eq!(set.values(Category::Timeframe), vec!["4 hour", "daily"]);
        let mut unsupported = set.values(Category::UnsupportedConcept);
        unsupported.sort();
        assert_eq!(unsupported, vec!["machine learning", "order book"]);
    }

    #[test]
    fn invalid_utf8_is_invalid_encoding() {
        let err = Analyzer::standard()
            .analyze_bytes(&[b'R', b'S', b'I', 0xff, 0xfe])
            .unwrap_err();
        assert!(matches!(err, IntakeError::InvalidEncoding { offset: 3 }));
        assert!(Analyzer::standard().analyze_bytes(b"RSI").is_ok());
    }

    #[test]
    fn merge_skips_duplicate_keywords() {
        let mut a = Analyzer::standard().analyze("RSI oversold bounce.");
        let b = Analyzer::standard().analyze("Add MACD too, and RSI.");
        a.merge(b);
        assert_eq!(a.values(Category::Indicator), vec!["rsi", "macd"]);
    }

    #[test]
    fn custom_dictionary_entries_are_matched() {
        let mut dict = Dictionary::standard();
        dict.extend(
            Category::Indicator,
            crate::dictionary::KeywordEntry::new("hull moving average", &["hma"]),
        );
        let analyzer = Analyzer::new(&dict).unwrap();
        let set = analyzer.analyze("Trade the HMA slope.");
        assert_eq!(set.values(Category::Indicator), vec!["hull moving average"]);
    }
}
