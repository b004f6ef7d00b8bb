use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CalldeckError;

/// Which chart a stored record belongs to. Records for the same identifier
/// are kept per kind, so one user can hold both datasets at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    CallAnalysis,
    CallDuration,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::CallAnalysis => "call_analysis",
            DatasetKind::CallDuration => "call_duration",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Free-text lookup key shaped like an email address. It is never
/// authenticated; the shape check exists so that typos fail fast at the
/// caller-facing edge. The remote gateway treats the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identifier {
    type Err = CalldeckError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = match normalized.split_once('@') {
            Some((local, host)) => {
                !local.is_empty()
                    && !host.contains('@')
                    && !normalized.chars().any(char::is_whitespace)
                    && host
                        .rsplit_once('.')
                        .map(|(head, tail)| !head.is_empty() && !tail.is_empty())
                        .unwrap_or(false)
            }
            None => false,
        };
        if !is_valid {
            return Err(CalldeckError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// One `(category, count)` pair, the atomic unit of both the text exchange
/// format and the stored record. `category` is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

impl CategoryCount {
    pub fn new(category: impl Into<String>, count: u64) -> Self {
        Self {
            category: category.into().trim().to_string(),
            count,
        }
    }
}

pub type Dataset = Vec<CategoryCount>;

/// Built-in sample shown before any identifier is loaded. Injected into the
/// controller's initial state rather than kept as shared mutable data.
pub fn sample_dataset(kind: DatasetKind) -> Dataset {
    let pairs: &[(&str, u64)] = match kind {
        DatasetKind::CallAnalysis => &[
            ("Caller Identification", 35),
            ("Incorrect caller identity", 20),
            ("Long hold time", 18),
            ("Dropped mid-call", 12),
            ("Agent transfer loop", 9),
            ("Payment dispute", 7),
            ("Address change", 5),
            ("Language barrier", 4),
        ],
        DatasetKind::CallDuration => &[
            ("Mon", 98),
            ("Tue", 120),
            ("Wed", 140),
            ("Thu", 105),
            ("Fri", 134),
        ],
    };
    pairs
        .iter()
        .map(|(category, count)| CategoryCount::new(*category, *count))
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_identifier_valid() {
        let id: Identifier = "  user@example.com ".parse().unwrap();
        assert_eq!(id.as_str(), "user@example.com");
    }

    #[test]
    fn parse_identifier_invalid() {
        for raw in ["", "plainaddress", "a b@example.com", "a@b", "a@b.", "@x.com"] {
            let err = raw.parse::<Identifier>().unwrap_err();
            assert_matches!(err, CalldeckError::InvalidIdentifier(_));
        }
    }

    #[test]
    fn category_count_trims() {
        let entry = CategoryCount::new("  Long hold time ", 3);
        assert_eq!(entry.category, "Long hold time");
    }

    #[test]
    fn sample_datasets_non_empty() {
        assert!(!sample_dataset(DatasetKind::CallAnalysis).is_empty());
        assert!(!sample_dataset(DatasetKind::CallDuration).is_empty());
    }
}
