//! The decoded analysis and its rendering.
//!
//! [`AnalysisResult`] mirrors the nine keys the model is asked to return.
//! Deserialisation is forgiving about *shape* (a `null` list is an empty
//! list, a number where text was expected becomes its text) but never about
//! *presence*: nothing is filled in that the model did not say.
//!
//! Rendering to Markdown is the thin view layer: one section per field, in a
//! fixed order, with empty sections for missing keys.

use crate::pipeline::decode::resolve;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Write as _};

// ── AnalysisResult ───────────────────────────────────────────────────────

/// The model's structured analysis of one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "optional_text")]
    pub verdict: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub summary: String,
    #[serde(default, deserialize_with = "items")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "items")]
    pub cons: Vec<String>,
    #[serde(default, deserialize_with = "items")]
    pub charges_or_expenses: Vec<String>,
    #[serde(default, deserialize_with = "items")]
    pub risks: Vec<String>,
    #[serde(default, deserialize_with = "items")]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub suitability: Suitability,
    #[serde(default, deserialize_with = "items")]
    pub questions_to_ask: Vec<String>,
}

/// Fit between the product and the user's declared profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Suitability {
    /// The model returned (or nested as a string) a `{risk, horizon, notes}` record.
    Assessment(SuitabilityAssessment),
    /// Free-form text that did not decode to a record.
    Statement(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuitabilityAssessment {
    pub risk: String,
    pub horizon: String,
    pub notes: String,
}

impl Default for Suitability {
    fn default() -> Self {
        Suitability::Assessment(SuitabilityAssessment::default())
    }
}

impl Suitability {
    /// Interpret a raw JSON value, decoding a nested JSON string if present.
    pub fn from_value(value: Value) -> Self {
        match resolve(value) {
            Value::Object(map) => Suitability::Assessment(SuitabilityAssessment::from_map(map)),
            Value::Null => Suitability::default(),
            Value::String(s) => Suitability::Statement(s),
            other => Suitability::Statement(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Suitability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Suitability::from_value(Value::deserialize(deserializer)?))
    }
}

impl SuitabilityAssessment {
    fn from_map(mut map: Map<String, Value>) -> Self {
        let mut take = |key: &str| value_text(map.remove(key).unwrap_or(Value::Null));
        Self {
            risk: take("risk"),
            horizon: take("horizon"),
            notes: take("notes"),
        }
    }
}

// ── Lenient field readers ────────────────────────────────────────────────

fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(value_text(other)),
    })
}

fn items<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(values) => values.into_iter().map(value_text).collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => vec![value_text(other)],
    })
}

// ── Rendering ────────────────────────────────────────────────────────────

impl AnalysisResult {
    /// Verdict label, `N/A` when the model gave none.
    pub fn verdict_label(&self) -> &str {
        match self.verdict.as_deref() {
            Some(v) if !v.trim().is_empty() => v,
            _ => "N/A",
        }
    }

    /// Render the report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::with_capacity(1024);
        let _ = writeln!(out, "**Verdict:** {}\n", self.verdict_label());

        out.push_str("## Summary\n\n");
        if !self.summary.trim().is_empty() {
            let _ = writeln!(out, "{}\n", self.summary.trim());
        }

        push_list(&mut out, "Pros", &self.pros);
        push_list(&mut out, "Cons", &self.cons);
        push_list(&mut out, "Charges / Expenses", &self.charges_or_expenses);
        push_list(&mut out, "Risks", &self.risks);
        push_list(&mut out, "Red Flags", &self.red_flags);

        out.push_str("## Suitability\n\n");
        match &self.suitability {
            Suitability::Assessment(a) => {
                let _ = writeln!(out, "- **Risk:** {}", a.risk);
                let _ = writeln!(out, "- **Horizon:** {}", a.horizon);
                let _ = writeln!(out, "- **Notes:** {}\n", a.notes);
            }
            Suitability::Statement(s) => {
                let _ = writeln!(out, "Suitability: {}\n", s);
            }
        }

        push_list(&mut out, "Questions to Ask", &self.questions_to_ask);

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "## {}\n", title);
    if items.is_empty() {
        return;
    }
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
    out.push('\n');
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

// ── Output ───────────────────────────────────────────────────────────────

/// Everything returned by a successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub report: AnalysisResult,
    /// The completion text exactly as the model returned it.
    pub raw_response: String,
    /// Whether document content was cut to fit the prompt.
    pub content_truncated: bool,
    /// Character count of the document content before truncation.
    pub content_chars: usize,
    pub stats: AnalysisStats,
}

/// Timing and token accounting for one analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
    pub extraction_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
