//! Numeric extraction from free-text messages via named pattern rules.
//!
//! A rule's pattern is searched in each message. Capture groups are scanned
//! in order and the first group that participated in the match and parses
//! as a finite number wins. A message with no such group yields null: a
//! missing reading is data, not an error, and is kept distinct from zero.

use indexmap::IndexMap;
use log::{debug, info};
use regex::Regex;
use serde::Serialize;

use crate::error::{AgrimergeError, Result};
use crate::input::DataTable;
use crate::schema::Value;

/// A named pattern that pulls one measurement out of a message.
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    pattern: Regex,
}

impl PatternRule {
    /// Compile a rule. The pattern must define at least one capture group.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AgrimergeError::invalid_config(
                "regex_patterns",
                "measurement name is empty",
            ));
        }
        let pattern = Regex::new(pattern).map_err(|source| AgrimergeError::InvalidPattern {
            rule: name.clone(),
            source,
        })?;
        if pattern.captures_len() < 2 {
            return Err(AgrimergeError::invalid_config(
                format!("regex_patterns.{}", name),
                "pattern has no capture group",
            ));
        }
        Ok(Self { name, pattern })
    }

    /// Output column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Extract this rule's measurement from a message.
    pub fn extract(&self, text: &str) -> Option<f64> {
        extract_value(&self.pattern, text)
    }
}

/// First capture group of the first match that parses as a finite number.
pub fn extract_value(pattern: &Regex, text: &str) -> Option<f64> {
    let captures = pattern.captures(text)?;
    captures
        .iter()
        .skip(1)
        .flatten()
        .find_map(|group| group.as_str().trim().parse::<f64>().ok().filter(|v| v.is_finite()))
}

/// Per-rule outcome of an extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Output column.
    pub column: String,
    /// Rows that yielded a number.
    pub extracted: usize,
    /// Rows left null.
    pub missing: usize,
}

/// An ordered set of pattern rules.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    rules: Vec<PatternRule>,
}

impl PatternExtractor {
    /// Create an extractor from compiled rules.
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Compile a measurement name → pattern map, keeping its order.
    pub fn from_patterns(patterns: &IndexMap<String, String>) -> Result<Self> {
        if patterns.is_empty() {
            return Err(AgrimergeError::invalid_config(
                "regex_patterns",
                "at least one pattern is required",
            ));
        }
        let rules = patterns
            .iter()
            .map(|(name, pattern)| PatternRule::new(name.clone(), pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    /// Configured rules in order.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Apply every rule to one message.
    pub fn extract_message(&self, text: &str) -> Vec<Option<f64>> {
        self.rules.iter().map(|rule| rule.extract(text)).collect()
    }

    /// Add one numeric column per rule, derived from `message_column`.
    ///
    /// A column that already exists under a rule's name is replaced in place.
    pub fn extract_into(&self, table: &mut DataTable, message_column: &str) -> Result<Vec<ExtractionSummary>> {
        let message_idx =
            table
                .resolve_column(message_column)
                .ok_or_else(|| AgrimergeError::MissingMessageColumn {
                    column: message_column.to_string(),
                })?;

        let messages: Vec<Option<String>> = table
            .column_values(message_idx)
            .map(|value| match value {
                Value::Null => None,
                Value::Text(text) => Some(text.clone()),
                other => Some(other.to_string()),
            })
            .collect();

        let mut summaries = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let values: Vec<Value> = messages
                .iter()
                .map(|message| message.as_deref().and_then(|text| rule.extract(text)).into())
                .collect();

            let extracted = values.iter().filter(|v| !v.is_null()).count();
            let summary = ExtractionSummary {
                column: rule.name().to_string(),
                extracted,
                missing: values.len() - extracted,
            };
            debug!(
                "Rule '{}' /{}/: {} extracted, {} missing",
                rule.name(),
                rule.pattern().as_str(),
                summary.extracted,
                summary.missing
            );

            table.set_column(rule.name(), values)?;
            info!("Extracted values for: {}", rule.name());
            summaries.push(summary);
        }

        Ok(summaries)
    }
}
