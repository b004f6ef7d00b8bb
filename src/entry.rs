use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{CategoryCount, Dataset};
use crate::error::CalldeckError;

/// How malformed pairs are handled. `Strict` rejects the whole input when
/// any pair is malformed; `Permissive` keeps the valid pairs and reports
/// the rest back as ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    #[default]
    Strict,
    Permissive,
}

/// Characters permitted inside a category name, besides whitespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CategoryCharset {
    Letters,
    #[default]
    Alphanumeric,
}

impl CategoryCharset {
    fn class(&self) -> &'static str {
        match self {
            CategoryCharset::Letters => r"[A-Za-z\s]",
            CategoryCharset::Alphanumeric => r"[A-Za-z0-9\s]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntries {
    pub entries: Dataset,
    /// Candidate pairs dropped under the permissive policy, in input order.
    /// Always empty under the strict policy.
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EntryParser {
    policy: ParsePolicy,
    pair_re: Regex,
    full_re: Regex,
}

impl EntryParser {
    pub fn new(policy: ParsePolicy, charset: CategoryCharset) -> Self {
        let pair = format!(r"\s*{cls}+:\s*\d+\s*", cls = charset.class());
        let pair_re = Regex::new(&format!("^{pair}$")).unwrap();
        let full_re = Regex::new(&format!("^({pair})(,{pair})*$")).unwrap();
        Self {
            policy,
            pair_re,
            full_re,
        }
    }

    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Parses comma-separated `Category:Count` pairs. Entries come back in
    /// input order with categories trimmed and counts parsed as exact
    /// decimal integers. Pure; the input is never mutated or persisted.
    pub fn parse(&self, raw: &str) -> Result<ParsedEntries, CalldeckError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CalldeckError::InvalidEntries(
                "no entries supplied".to_string(),
            ));
        }

        match self.policy {
            ParsePolicy::Strict => {
                if !self.full_re.is_match(trimmed) {
                    return Err(invalid_format(trimmed));
                }
                let mut entries = Vec::new();
                for candidate in trimmed.split(',') {
                    entries.push(parse_pair(candidate).ok_or_else(|| invalid_format(candidate))?);
                }
                Ok(ParsedEntries {
                    entries,
                    ignored: Vec::new(),
                })
            }
            ParsePolicy::Permissive => {
                let mut entries = Vec::new();
                let mut ignored = Vec::new();
                for candidate in trimmed.split(',') {
                    match self
                        .pair_re
                        .is_match(candidate)
                        .then(|| parse_pair(candidate))
                        .flatten()
                    {
                        Some(entry) => entries.push(entry),
                        None => ignored.push(candidate.trim().to_string()),
                    }
                }
                if entries.is_empty() {
                    return Err(invalid_format(trimmed));
                }
                Ok(ParsedEntries { entries, ignored })
            }
        }
    }

    /// Renders a dataset back to the text exchange format. Round-trip
    /// guarantee: `parse(render(d))` reproduces `d` for any `d` that
    /// `parse` itself produced.
    pub fn render(entries: &[CategoryCount]) -> String {
        entries
            .iter()
            .map(|entry| format!("{}:{}", entry.category, entry.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for EntryParser {
    fn default() -> Self {
        Self::new(ParsePolicy::default(), CategoryCharset::default())
    }
}

fn invalid_format(candidate: &str) -> CalldeckError {
    CalldeckError::InvalidEntries(format!(
        "malformed entry `{}`; expected `Category:Count` pairs separated by commas, \
         e.g. `Caller Identification:35, Incorrect caller identity:20`",
        candidate.trim()
    ))
}

// Returns None for a pair the charset regex accepted but that still fails
// an invariant: an all-whitespace category, or a count outside u64.
fn parse_pair(candidate: &str) -> Option<CategoryCount> {
    let (category, count) = candidate.split_once(':')?;
    let category = category.trim();
    if category.is_empty() {
        return None;
    }
    let count = count.trim().parse::<u64>().ok()?;
    Some(CategoryCount::new(category, count))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn strict_parses_in_input_order() {
        let parser = EntryParser::default();
        let parsed = parser.parse("Caller Identification:35, Busy line:20").unwrap();
        assert_eq!(
            parsed.entries,
            vec![
                CategoryCount::new("Caller Identification", 35),
                CategoryCount::new("Busy line", 20),
            ]
        );
        assert!(parsed.ignored.is_empty());
    }

    #[test]
    fn strict_rejects_whole_input() {
        let parser = EntryParser::default();
        let err = parser.parse("A:10, B").unwrap_err();
        assert_matches!(err, CalldeckError::InvalidEntries(_));
    }

    #[test]
    fn permissive_reports_ignored() {
        let parser = EntryParser::new(ParsePolicy::Permissive, CategoryCharset::Alphanumeric);
        let parsed = parser.parse("A:10, B, C:3.5, D:7").unwrap();
        assert_eq!(
            parsed.entries,
            vec![CategoryCount::new("A", 10), CategoryCount::new("D", 7)]
        );
        assert_eq!(parsed.ignored, vec!["B".to_string(), "C:3.5".to_string()]);
    }

    #[test]
    fn letters_charset_rejects_digits_in_category() {
        let parser = EntryParser::new(ParsePolicy::Strict, CategoryCharset::Letters);
        let err = parser.parse("Tier2 escalation:4").unwrap_err();
        assert_matches!(err, CalldeckError::InvalidEntries(_));
    }

    #[test]
    fn render_round_trips() {
        let parser = EntryParser::default();
        let parsed = parser.parse(" Long hold time : 18 ,Dropped:2").unwrap();
        let rendered = EntryParser::render(&parsed.entries);
        assert_eq!(rendered, "Long hold time:18, Dropped:2");
        assert_eq!(parser.parse(&rendered).unwrap().entries, parsed.entries);
    }
}
