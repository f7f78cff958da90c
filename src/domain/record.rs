// ============================================================
// Layer 3 — Raw Record Types
// ============================================================
// Two corpus feeds are supported, both tab-delimited:
//
//   Aksis feed (7 fields):
//     MarketplaceId \t Asin \t Keyword \t Score \t ActionType \t Date \t Title
//     ActionType: 1-Adds, 2-Searches, 3-Purchases, 4-Clicks
//
//   Query-pair feed (siamese):
//     (id \t phrase_1 \t phrase_2 ...)
//
// Runs of tabs collapse into one separator, so an empty
// field never counts towards the field total.
//
// Reference: Rust Book §5 (Structs), §9 (Recoverable Errors)

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

/// Number of fields in a well-formed Aksis line.
pub const AKSIS_FIELD_COUNT: usize = 7;

/// Split on runs of tabs, dropping empty pieces.
fn split_tab_runs(line: &str) -> Vec<&str> {
    line.split('\t').filter(|f| !f.is_empty()).collect()
}

// ─── AksisRecord ──────────────────────────────────────────────────────────────
/// A well-formed keyword record: the query, its specificity
/// score, and the title of the product it led to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AksisRecord {
    /// The search keyword (field 2)
    pub query: String,

    /// Query specificity score in [0, 1], kept as text (field 3)
    pub score: String,

    /// The product title (field 6)
    pub title: String,
}

impl AksisRecord {
    /// Parse one corpus line. The line is trimmed and lower-cased
    /// first; fewer or more than seven fields, or an empty
    /// query/score/title, is a parse error.
    pub fn parse(line: &str) -> Result<Self> {
        let line  = line.trim().to_lowercase();
        let items = split_tab_runs(&line);

        if items.len() != AKSIS_FIELD_COUNT {
            return Err(PipelineError::parse(format!(
                "expected {} fields, found {}",
                AKSIS_FIELD_COUNT,
                items.len()
            )));
        }

        let query = items[2].trim();
        let score = items[3].trim();
        let title = items[6].trim();

        if query.is_empty() || score.is_empty() || title.is_empty() {
            return Err(PipelineError::parse("empty query, score or title"));
        }

        Ok(Self {
            query: query.to_string(),
            score: score.to_string(),
            title: title.to_string(),
        })
    }

    /// The score as a number.
    pub fn score_value(&self) -> Result<f64> {
        self.score
            .parse::<f64>()
            .map_err(|_| PipelineError::parse(format!("score '{}' is not a number", self.score)))
    }

    /// Text used when counting word frequencies for the vocabulary.
    pub fn vocabulary_text(&self) -> String {
        format!("{} {}", self.query, self.title)
    }
}

// ─── QueryPairLine ────────────────────────────────────────────────────────────
/// The related phrases carried by one query-pair line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPairLine {
    pub phrases: Vec<String>,
}

impl QueryPairLine {
    /// Parse one line. Never fails: a line with fewer than two
    /// phrases simply produces no pairs downstream.
    pub fn parse(line: &str) -> Self {
        let line = line.trim().to_lowercase();
        let line = line.strip_prefix('(').unwrap_or(&line);
        let line = line.strip_suffix(')').unwrap_or(line);

        let mut items = split_tab_runs(line);
        // Leading record id
        if items.len() > 2 {
            items.remove(0);
        }

        Self {
            phrases: items.into_iter().map(str::to_string).collect(),
        }
    }

    /// All unordered pairs of phrases, in positional order.
    pub fn combinations(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.phrases.iter().enumerate().flat_map(move |(i, a)| {
            self.phrases[i + 1..]
                .iter()
                .map(move |b| (a.as_str(), b.as_str()))
        })
    }
}
