use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticStep {
    pub question: String,
    pub answer: Answer,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Proceed,
    Revise,
    Reject,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DimensionScore {
    #[serde(default)]
    pub dimension_id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub has_red_flags: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResearchReference {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub relevant_insight: String,
    #[serde(default)]
    pub relevance_score: f64,
}

/// Evaluator output for one statement. Carried as-is; scoring rules live server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Evaluation {
    #[serde(default)]
    pub dimension_scores: Vec<DimensionScore>,
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub weighted_score: f64,
    #[serde(default)]
    pub passes_non_negotiables: bool,
    #[serde(default)]
    pub failed_non_negotiables: Vec<String>,
    #[serde(default)]
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_references: Option<Vec<ResearchReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_format_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: u64,
    pub position: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub selected_format: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    /// Format id re-detected by the evaluator; display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,
}

impl Statement {
    pub fn new(id: u64, position: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            position,
            text: text.into(),
            selected_format: String::new(),
            reasoning: String::new(),
            evaluation: None,
            display_format: None,
        }
    }
}

/// The reconstructed result of one run. Statements are kept in ascending id order
/// regardless of the order their events arrived in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSnapshot {
    pub diagnostic_summary: String,
    pub diagnostic_path: Vec<DiagnosticStep>,
    #[serde(rename = "challenge_statements", serialize_with = "statements_in_order")]
    statements: BTreeMap<u64, Statement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_metrics: Option<Value>,
}

fn statements_in_order<S>(map: &BTreeMap<u64, Statement>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(map.values())
}

impl ResultSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.values()
    }

    pub fn statement(&self, id: u64) -> Option<&Statement> {
        self.statements.get(&id)
    }

    pub fn statement_ids(&self) -> Vec<u64> {
        self.statements.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn has_diagnostic(&self) -> bool {
        !self.diagnostic_summary.is_empty() || !self.diagnostic_path.is_empty()
    }

    /// Inserts a server-generated statement unless one with the same id exists.
    /// Returns whether the statement was inserted.
    pub(crate) fn insert_generated(&mut self, statement: Statement) -> bool {
        use std::collections::btree_map::Entry;
        match self.statements.entry(statement.id) {
            Entry::Vacant(slot) => {
                slot.insert(statement);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Replaces the evaluation of an existing statement. Returns false for unknown ids.
    pub(crate) fn replace_evaluation(
        &mut self,
        id: u64,
        evaluation: Evaluation,
        display_format: Option<String>,
    ) -> bool {
        let Some(stmt) = self.statements.get_mut(&id) else {
            return false;
        };
        stmt.evaluation = Some(evaluation);
        if display_format.is_some() {
            stmt.display_format = display_format;
        }
        true
    }

    /// Consumer-side edit of a statement's text.
    pub fn edit_text(&mut self, id: u64, text: impl Into<String>) -> bool {
        match self.statements.get_mut(&id) {
            Some(stmt) => {
                stmt.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Inserts or replaces a consumer-produced statement. Later generation events for
    /// the same id will not overwrite it.
    pub fn put_local(&mut self, statement: Statement) {
        self.statements.insert(statement.id, statement);
    }
}
