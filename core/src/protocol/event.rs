use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::result::{DiagnosticStep, Evaluation, Statement};

use super::RawEvent;

pub const DIAGNOSTIC: &str = "diagnostic";
pub const CHALLENGE_GENERATION: &str = "challenge_generation";
pub const CHALLENGE_EVALUATION: &str = "challenge_evaluation";
pub const TIMING_METRICS: &str = "timing_metrics";
pub const COMPLETE: &str = "complete";
pub const ERROR: &str = "error";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiagnosticPayload {
    #[serde(default)]
    pub diagnostic_summary: String,
    #[serde(default)]
    pub diagnostic_path: Vec<DiagnosticStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationPayload {
    pub id: u64,
    pub evaluation: Evaluation,
    pub display_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Diagnostic(DiagnosticPayload),
    ChallengeGeneration(Statement),
    ChallengeEvaluation(EvaluationPayload),
    TimingMetrics(Value),
    Complete { session_id: Option<String> },
    Error { message: String },
    Unknown { kind: String },
}

impl StreamEvent {
    pub fn kind(&self) -> &str {
        match self {
            StreamEvent::Diagnostic(_) => DIAGNOSTIC,
            StreamEvent::ChallengeGeneration(_) => CHALLENGE_GENERATION,
            StreamEvent::ChallengeEvaluation(_) => CHALLENGE_EVALUATION,
            StreamEvent::TimingMetrics(_) => TIMING_METRICS,
            StreamEvent::Complete { .. } => COMPLETE,
            StreamEvent::Error { .. } => ERROR,
            StreamEvent::Unknown { kind } => kind,
        }
    }

    pub fn from_raw(raw: RawEvent) -> Result<Self, ParseError> {
        let RawEvent { kind, mut payload } = raw;
        let event = match kind.as_str() {
            DIAGNOSTIC => StreamEvent::Diagnostic(typed(&kind, take_data(&mut payload)?)?),
            CHALLENGE_GENERATION => {
                let mut stmt: Statement = typed(&kind, take_data(&mut payload)?)?;
                // Evaluations only arrive through their own event.
                stmt.evaluation = None;
                stmt.display_format = None;
                StreamEvent::ChallengeGeneration(stmt)
            }
            CHALLENGE_EVALUATION => {
                StreamEvent::ChallengeEvaluation(evaluation_payload(&kind, take_data(&mut payload)?)?)
            }
            TIMING_METRICS => StreamEvent::TimingMetrics(take_data(&mut payload)?),
            COMPLETE => StreamEvent::Complete {
                session_id: session_id(&payload),
            },
            ERROR => StreamEvent::Error {
                message: error_message(&payload),
            },
            _ => StreamEvent::Unknown { kind },
        };
        Ok(event)
    }
}

fn take_data(payload: &mut Map<String, Value>) -> Result<Value, ParseError> {
    payload
        .remove("data")
        .filter(|v| !v.is_null())
        .ok_or(ParseError::MissingField("data"))
}

fn typed<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T, ParseError> {
    serde_json::from_value(data).map_err(|source| ParseError::SchemaMismatch {
        kind: kind.to_string(),
        source,
    })
}

/// Accepts both `{id, evaluation: {...}}` and a flattened `{id, total_score, ...}`.
fn evaluation_payload(kind: &str, data: Value) -> Result<EvaluationPayload, ParseError> {
    #[derive(Deserialize)]
    struct Header {
        id: u64,
        #[serde(default)]
        detected_format_id: Option<String>,
    }

    let header: Header = typed(kind, data.clone())?;
    let nested = match data.get("evaluation") {
        Some(v @ Value::Object(_)) => Some(v.clone()),
        _ => None,
    };
    let evaluation: Evaluation = typed(kind, nested.unwrap_or(data))?;
    let display_format = header
        .detected_format_id
        .or_else(|| evaluation.detected_format_id.clone());

    Ok(EvaluationPayload {
        id: header.id,
        evaluation,
        display_format,
    })
}

fn session_id(payload: &Map<String, Value>) -> Option<String> {
    let value = payload
        .get("session_id")
        .or_else(|| payload.get("data").and_then(|d| d.get("session_id")))?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn error_message(payload: &Map<String, Value>) -> String {
    let nested = payload.get("data").and_then(|d| match d {
        Value::String(s) => Some(s.as_str()),
        other => other.get("message").and_then(Value::as_str),
    });
    payload
        .get("message")
        .and_then(Value::as_str)
        .or(nested)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::result::{Answer, Recommendation};

    fn raw(value: Value) -> RawEvent {
        let Value::Object(mut map) = value else {
            panic!("test frames must be objects");
        };
        let kind = map.remove("type").unwrap().as_str().unwrap().to_string();
        RawEvent { kind, payload: map }
    }

    #[test]
    fn diagnostic_decodes_path_steps() {
        let ev = StreamEvent::from_raw(raw(json!({
            "type": "diagnostic",
            "data": {
                "diagnostic_summary": "Brief lacks a tension",
                "diagnostic_path": [
                    {"question": "Is the barrier clear?", "answer": "no", "reasoning": "vague"}
                ]
            }
        })))
        .unwrap();

        let StreamEvent::Diagnostic(d) = ev else {
            panic!("expected diagnostic");
        };
        assert_eq!(d.diagnostic_summary, "Brief lacks a tension");
        assert_eq!(d.diagnostic_path[0].answer, Answer::No);
    }

    #[test]
    fn generation_drops_inline_evaluation() {
        let ev = StreamEvent::from_raw(raw(json!({
            "type": "challenge_generation",
            "data": {
                "id": 7, "position": 2, "text": "How might we...",
                "selected_format": "hmw", "reasoning": "fits",
                "evaluation": {"total_score": 20}
            }
        })))
        .unwrap();

        let StreamEvent::ChallengeGeneration(stmt) = ev else {
            panic!("expected generation");
        };
        assert_eq!((stmt.id, stmt.position), (7, 2));
        assert!(stmt.evaluation.is_none());
    }

    #[test]
    fn evaluation_accepts_nested_and_flat_shapes() {
        let nested = StreamEvent::from_raw(raw(json!({
            "type": "challenge_evaluation",
            "data": {"id": 3, "evaluation": {
                "total_score": 18, "recommendation": "revise", "detected_format_id": "fmt-2"
            }}
        })))
        .unwrap();
        let flat = StreamEvent::from_raw(raw(json!({
            "type": "challenge_evaluation",
            "data": {"id": 3, "total_score": 18, "recommendation": "revise",
                     "detected_format_id": "fmt-2"}
        })))
        .unwrap();

        for ev in [nested, flat] {
            let StreamEvent::ChallengeEvaluation(p) = ev else {
                panic!("expected evaluation");
            };
            assert_eq!(p.id, 3);
            assert_eq!(p.evaluation.recommendation, Recommendation::Revise);
            assert_eq!(p.display_format.as_deref(), Some("fmt-2"));
        }
    }

    #[test]
    fn error_message_sources() {
        let top = StreamEvent::from_raw(raw(json!({"type": "error", "message": "quota"}))).unwrap();
        assert_eq!(top, StreamEvent::Error { message: "quota".into() });

        let nested =
            StreamEvent::from_raw(raw(json!({"type": "error", "data": {"message": "boom"}})))
                .unwrap();
        assert_eq!(nested, StreamEvent::Error { message: "boom".into() });

        let bare = StreamEvent::from_raw(raw(json!({"type": "error"}))).unwrap();
        assert_eq!(bare, StreamEvent::Error { message: "Unknown error".into() });
    }

    #[test]
    fn complete_carries_numeric_session_id() {
        let ev = StreamEvent::from_raw(raw(json!({"type": "complete", "session_id": 42}))).unwrap();
        assert_eq!(ev, StreamEvent::Complete { session_id: Some("42".into()) });
    }

    #[test]
    fn missing_data_is_a_local_failure() {
        let err = StreamEvent::from_raw(raw(json!({"type": "challenge_generation"}))).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("data")));

        let err = StreamEvent::from_raw(raw(json!({
            "type": "challenge_generation", "data": {"text": "no id"}
        })))
        .unwrap_err();
        assert!(matches!(err, ParseError::SchemaMismatch { .. }));
    }

    #[test]
    fn unknown_kinds_pass_through() {
        let ev = StreamEvent::from_raw(raw(json!({"type": "heartbeat"}))).unwrap();
        assert_eq!(ev.kind(), "heartbeat");
    }
}
