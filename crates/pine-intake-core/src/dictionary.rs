//! Fixed keyword and trigger-phrase dictionaries used by the analyzer.
//!
//! Every entry maps a set of literal spellings onto one canonical value.
//! Matching is exact (case-insensitive, whole-phrase); there is no fuzzy
//! matching, so the same text always produces the same findings.

use crate::types::Category;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// KeywordEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub canonical: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

impl KeywordEntry {
    pub fn new(canonical: &str, synonyms: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Canonical spelling followed by every synonym.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// UnsupportedConcept
// ---------------------------------------------------------------------------

/// A concept Pine Script cannot express directly, with the usual workaround.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedConcept {
    #[serde(flatten)]
    pub entry: KeywordEntry,
    #[serde(default)]
    pub workaround: String,
}

// ---------------------------------------------------------------------------
// Trigger phrases
// ---------------------------------------------------------------------------

pub const ENTRY_TRIGGERS: &[&str] = &[
    "buy when",
    "buy if",
    "buy signal",
    "enter when",
    "enter if",
    "enter long",
    "enter short",
    "entry when",
    "entry signal",
    "go long when",
    "go short when",
    "long when",
    "short when",
    "sell short when",
];

pub const EXIT_TRIGGERS: &[&str] = &[
    "exit when",
    "exit at",
    "exit if",
    "exit the trade",
    "sell when",
    "sell signal",
    "close when",
    "close at",
    "close the position",
    "take profit at",
    "get out when",
];

pub const FILTER_TRIGGERS: &[&str] = &[
    "only trade when",
    "only trade if",
    "only take",
    "only when",
    "only if",
    "trade only",
    "avoid trading",
    "don't trade",
    "do not trade",
    "filter out",
];

// ---------------------------------------------------------------------------
// Dictionary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    pub indicators: Vec<KeywordEntry>,
    pub patterns: Vec<KeywordEntry>,
    pub strategies: Vec<KeywordEntry>,
    pub risk_rules: Vec<KeywordEntry>,
    pub timeframes: Vec<KeywordEntry>,
    pub unsupported: Vec<UnsupportedConcept>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::standard()
    }
}

impl Dictionary {
    pub fn standard() -> Self {
        Self {
            indicators: standard_indicators(),
            patterns: standard_patterns(),
            strategies: standard_strategies(),
            risk_rules: standard_risk_rules(),
            timeframes: standard_timeframes(),
            unsupported: standard_unsupported(),
        }
    }

    /// Keyword entries for a stage-1 category, paired with the category.
    pub fn keyword_tables(&self) -> Vec<(Category, Vec<&KeywordEntry>)> {
        vec![
            (Category::Indicator, self.indicators.iter().collect()),
            (Category::Pattern, self.patterns.iter().collect()),
            (Category::StrategyType, self.strategies.iter().collect()),
            (Category::RiskRule, self.risk_rules.iter().collect()),
            (Category::Timeframe, self.timeframes.iter().collect()),
            (
                Category::UnsupportedConcept,
                self.unsupported.iter().map(|u| &u.entry).collect(),
            ),
        ]
    }

    /// Add an entry to a keyword category. Returns false for categories that
    /// are not keyword-driven.
    pub fn extend(&mut self, category: Category, entry: KeywordEntry) -> bool {
        let table = match category {
            Category::Indicator => &mut self.indicators,
            Category::Pattern => &mut self.patterns,
            Category::StrategyType => &mut self.strategies,
            Category::RiskRule => &mut self.risk_rules,
            Category::Timeframe => &mut self.timeframes,
            Category::UnsupportedConcept => {
                self.add_unsupported(entry, "");
                return true;
            }
            _ => return false,
        };
        table.push(entry);
        true
    }

    pub fn add_unsupported(&mut self, entry: KeywordEntry, workaround: &str) {
        self.unsupported.push(UnsupportedConcept {
            entry,
            workaround: workaround.to_string(),
        });
    }

    pub fn workaround_for(&self, canonical: &str) -> Option<&str> {
        self.unsupported
            .iter()
            .find(|u| u.entry.canonical == canonical)
            .map(|u| u.workaround.as_str())
            .filter(|w| !w.is_empty())
    }

    /// Indicator spellings, used to recognise `RSI(14)` and `RSI 70` forms.
    pub fn indicator_spellings(&self) -> Vec<&str> {
        self.indicators.iter().flat_map(|e| e.spellings()).collect()
    }
}

fn entries(table: &[(&str, &[&str])]) -> Vec<KeywordEntry> {
    table
        .iter()
        .map(|(canonical, synonyms)| KeywordEntry::new(canonical, synonyms))
        .collect()
}

fn standard_indicators() -> Vec<KeywordEntry> {
    entries(&[
        ("rsi", &["relative strength index"]),
        ("macd", &["moving average convergence divergence"]),
        ("ema", &["exponential moving average"]),
        ("sma", &["simple moving average"]),
        ("wma", &["weighted moving average"]),
        ("moving average", &["moving averages"]),
        ("bollinger bands", &["bollinger band", "bollinger"]),
        ("stochastic", &["stoch", "stochastic rsi", "stoch rsi"]),
        ("atr", &["average true range"]),
        ("adx", &["average directional index", "dmi"]),
        ("ichimoku", &["ichimoku cloud"]),
        ("fibonacci", &["fib retracement", "fibonacci retracement", "fib levels"]),
        ("pivot points", &["pivot point", "pivots"]),
        ("support resistance", &["support and resistance", "support/resistance"]),
        ("vwap", &["volume weighted average price"]),
        ("momentum", &[]),
        ("obv", &["on balance volume", "on-balance volume"]),
        ("volume profile", &[]),
        ("cci", &["commodity channel index"]),
        ("williams %r", &["williams r", "williams percent range"]),
        ("parabolic sar", &["psar"]),
        ("supertrend", &["super trend"]),
        ("keltner channels", &["keltner channel", "keltner"]),
        ("donchian channels", &["donchian channel", "donchian"]),
        ("mfi", &["money flow index"]),
    ])
}

fn standard_patterns() -> Vec<KeywordEntry> {
    entries(&[
        ("breakout", &["break out", "breaks out", "breakouts"]),
        ("reversal", &["reversals"]),
        ("divergence", &["divergences", "bullish divergence", "bearish divergence"]),
        ("convergence", &[]),
        (
            "crossover",
            &[
                "cross over",
                "crosses over",
                "crosses above",
                "crosses below",
                "cross above",
                "cross below",
                "crossunder",
                "crossing",
            ],
        ),
        ("golden cross", &[]),
        ("death cross", &[]),
        ("squeeze", &["bollinger squeeze", "ttm squeeze"]),
        ("flag", &["bull flag", "bear flag"]),
        ("pennant", &[]),
        ("triangle", &["ascending triangle", "descending triangle"]),
        ("head and shoulders", &["head & shoulders"]),
        ("double top", &[]),
        ("double bottom", &[]),
        ("cup and handle", &[]),
        ("engulfing", &["bullish engulfing", "bearish engulfing"]),
        ("doji", &[]),
        ("trendline", &["trend line", "trendlines", "trend lines"]),
    ])
}

fn standard_strategies() -> Vec<KeywordEntry> {
    entries(&[
        ("scalping", &["scalp", "scalper"]),
        ("day trading", &["daytrading", "intraday trading"]),
        ("swing trading", &["swing trade", "swing trades"]),
        ("position trading", &[]),
        ("mean reversion", &["mean-reversion", "reversion to the mean"]),
        ("trend following", &["trend-following", "follow the trend"]),
        ("momentum trading", &[]),
        ("breakout trading", &["breakout strategy"]),
        ("arbitrage", &[]),
        ("pairs trading", &["pair trading"]),
        ("grid trading", &["grid strategy", "grid bot"]),
        ("martingale", &[]),
        ("dca", &["dollar cost averaging", "dollar-cost averaging"]),
    ])
}

fn standard_risk_rules() -> Vec<KeywordEntry> {
    entries(&[
        ("stop loss", &["stop-loss", "stoploss", "stop losses"]),
        ("take profit", &["take-profit", "profit target", "target profit"]),
        ("trailing stop", &["trailing stop loss", "trailing-stop"]),
        ("position sizing", &["position size", "lot size"]),
        ("risk reward", &["risk/reward", "risk-reward", "reward to risk"]),
        ("break even", &["breakeven", "break-even"]),
        ("max drawdown", &["drawdown", "maximum drawdown"]),
        ("risk management", &["money management", "risk per trade"]),
    ])
}

fn standard_timeframes() -> Vec<KeywordEntry> {
    entries(&[
        ("1 minute", &["1-minute", "1 min", "1m chart", "one minute"]),
        ("5 minute", &["5-minute", "5 min", "5m chart", "five minute"]),
        ("15 minute", &["15-minute", "15 min", "15m chart", "fifteen minute"]),
        ("30 minute", &["30-minute", "30 min", "30m chart", "thirty minute"]),
        ("1 hour", &["1-hour", "hourly", "1h chart", "one hour"]),
        ("4 hour", &["4-hour", "4h chart", "four hour"]),
        ("daily", &["daily chart", "1d chart"]),
        ("weekly", &["weekly chart"]),
        ("monthly", &["monthly chart"]),
        ("multi timeframe", &["multi-timeframe", "multiple timeframes", "mtf"]),
        ("higher timeframe", &["higher timeframes", "htf"]),
        ("lower timeframe", &["lower timeframes", "ltf"]),
    ])
}

fn standard_unsupported() -> Vec<UnsupportedConcept> {
    let table: &[(&str, &[&str], &str)] = &[
        (
            "machine learning",
            &["neural network", "deep learning", "ai model", "trained model"],
            "approximate with rule-based scoring or precomputed weights",
        ),
        (
            "order book",
            &["level 2", "level ii", "depth of market", "order flow data"],
            "approximate with volume and price-action proxies",
        ),
        (
            "on-chain data",
            &["on chain data", "onchain data", "blockchain data", "whale wallets"],
            "use a published data feed symbol if one exists",
        ),
        (
            "sentiment analysis",
            &["twitter sentiment", "news sentiment", "social sentiment"],
            "use price-based sentiment proxies such as put/call or breadth symbols",
        ),
        (
            "external api",
            &["api call", "http request", "rest api", "web scraping"],
            "send data out through alert webhooks; inbound requests are not possible",
        ),
        (
            "tick data",
            &["tick-by-tick", "every tick"],
            "use bar-magnifier or lower-timeframe requests",
        ),
        (
            "broker execution",
            &["place orders with my broker", "auto execute on broker", "direct broker"],
            "route alert webhooks to an execution bridge",
        ),
        (
            "options chain",
            &["option chain", "options greeks", "implied volatility surface"],
            "use volatility index symbols as proxies",
        ),
    ];
    table
        .iter()
        .map(|(canonical, synonyms, workaround)| UnsupportedConcept {
            entry: KeywordEntry::new(canonical, synonyms),
            workaround: workaround.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn canonical_values_are_unique_per_category() {
        let dict = Dictionary::standard();
        for (category, table) in dict.keyword_tables() {
            let mut seen = HashSet::new();
            for entry in table {
                assert!(
                    seen.insert(entry.canonical.as_str()),
                    "duplicate canonical '{}' in {category}",
                    entry.canonical
                );
            }
        }
    }

    #[test]
    fn spellings_are_lowercase() {
        let dict = Dictionary::standard();
        for (_, table) in dict.keyword_tables() {
            for entry in table {
                for s in entry.spellings() {
                    assert_eq!(s, s.to_lowercase(), "spelling '{s}' must be lowercase");
                }
            }
        }
    }

    #[test]
    fn extend_rejects_non_keyword_categories() {
        let mut dict = Dictionary::standard();
        let before = dict.indicators.len();
        assert!(dict.extend(Category::Indicator, KeywordEntry::new("hull ma", &["hma"])));
        assert_eq!(dict.indicators.len(), before + 1);
        assert!(!dict.extend(Category::EntryCondition, KeywordEntry::new("x", &[])));
    }

    #[test]
    fn workarounds_lookup() {
        let dict = Dictionary::standard();
        assert!(dict.workaround_for("order book").is_some());
        assert!(dict.workaround_for("rsi").is_none());
    }

    #[test]
    fn unsupported_concept_yaml_flattens_entry() {
        let yaml = "canonical: gpt signals\nsynonyms: [chatgpt]\nworkaround: none\n";
        let parsed: UnsupportedConcept = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.entry.canonical, "gpt signals");
        assert_eq!(parsed.entry.synonyms, vec!["chatgpt"]);
    }
}
