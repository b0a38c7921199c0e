//! Folds decoded events into a [`ResultSnapshot`].
//!
//! Generation data is insert-only: once an id is present (from an earlier event or a
//! consumer edit) later generation events for it are dropped. Evaluation data is
//! last-write-wins on existing ids.

use crate::protocol::StreamEvent;
use crate::run::Step;

use super::ResultSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum RunSignal {
    Complete { session_id: Option<String> },
    Failed { message: String },
}

#[derive(Debug)]
pub struct Reduced {
    pub snapshot: ResultSnapshot,
    pub log: Option<String>,
    pub step: Option<Step>,
    pub signal: Option<RunSignal>,
}

impl Reduced {
    fn unchanged(snapshot: ResultSnapshot) -> Self {
        Self {
            snapshot,
            log: None,
            step: None,
            signal: None,
        }
    }

    fn with_log(mut self, log: String) -> Self {
        self.log = Some(log);
        self
    }
}

pub fn reduce(mut snapshot: ResultSnapshot, event: &StreamEvent) -> Reduced {
    match event {
        StreamEvent::Diagnostic(diag) => {
            if snapshot.has_diagnostic() {
                tracing::warn!(
                    target: "challenge_stream.reducer",
                    "repeated diagnostic event replaces the previous one"
                );
            }
            snapshot.diagnostic_summary = diag.diagnostic_summary.clone();
            snapshot.diagnostic_path = diag.diagnostic_path.clone();
            let mut out = Reduced::unchanged(snapshot)
                .with_log("Diagnostic analysis complete".to_string());
            out.step = Some(Step::GeneratingChallenges);
            out
        }
        StreamEvent::ChallengeGeneration(stmt) => {
            let log = format!(
                "Generated Statement #{} ({})",
                stmt.position, stmt.selected_format
            );
            if !snapshot.insert_generated(stmt.clone()) {
                tracing::debug!(
                    target: "challenge_stream.reducer",
                    id = stmt.id,
                    "statement already present, keeping existing entry"
                );
            }
            Reduced::unchanged(snapshot).with_log(log)
        }
        StreamEvent::ChallengeEvaluation(eval) => {
            let applied = snapshot.replace_evaluation(
                eval.id,
                eval.evaluation.clone(),
                eval.display_format.clone(),
            );
            let log = if applied {
                format!("Evaluated Statement #{}", eval.id)
            } else {
                tracing::warn!(
                    target: "challenge_stream.reducer",
                    id = eval.id,
                    "evaluation for unknown statement dropped"
                );
                format!("Skipped evaluation for unknown Statement #{}", eval.id)
            };
            Reduced::unchanged(snapshot).with_log(log)
        }
        StreamEvent::TimingMetrics(metrics) => {
            snapshot.timing_metrics = Some(metrics.clone());
            Reduced::unchanged(snapshot)
        }
        StreamEvent::Complete { session_id } => {
            let mut out = Reduced::unchanged(snapshot)
                .with_log("All tasks completed successfully.".to_string());
            out.step = Some(Step::Complete);
            out.signal = Some(RunSignal::Complete {
                session_id: session_id.clone(),
            });
            out
        }
        StreamEvent::Error { message } => {
            let mut out = Reduced::unchanged(snapshot);
            out.signal = Some(RunSignal::Failed {
                message: message.clone(),
            });
            out
        }
        StreamEvent::Unknown { kind } => {
            tracing::debug!(
                target: "challenge_stream.reducer",
                kind = %kind,
                "ignoring unknown event type"
            );
            Reduced::unchanged(snapshot)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::protocol::{DiagnosticPayload, EvaluationPayload};
    use crate::result::{Evaluation, Recommendation, Statement};

    fn generated(id: u64, position: u32, text: &str) -> StreamEvent {
        let mut stmt = Statement::new(id, position, text);
        stmt.selected_format = "how-might-we".to_string();
        StreamEvent::ChallengeGeneration(stmt)
    }

    fn evaluated(id: u64, total: f64, rec: Recommendation) -> StreamEvent {
        StreamEvent::ChallengeEvaluation(EvaluationPayload {
            id,
            evaluation: Evaluation {
                total_score: total,
                recommendation: rec,
                ..Evaluation::default()
            },
            display_format: None,
        })
    }

    fn fold(events: &[StreamEvent]) -> ResultSnapshot {
        events
            .iter()
            .fold(ResultSnapshot::new(), |snap, ev| reduce(snap, ev).snapshot)
    }

    #[test]
    fn duplicate_generation_is_idempotent() {
        let once = fold(&[generated(1, 1, "a")]);
        let twice = fold(&[generated(1, 1, "a"), generated(1, 1, "a")]);
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn second_evaluation_replaces_the_first() {
        let snap = fold(&[
            generated(1, 1, "a"),
            evaluated(1, 12.0, Recommendation::Reject),
            evaluated(1, 23.0, Recommendation::Proceed),
        ]);
        let eval = snap.statement(1).unwrap().evaluation.as_ref().unwrap();
        assert_eq!(eval.total_score, 23.0);
        assert_eq!(eval.recommendation, Recommendation::Proceed);
    }

    #[test]
    fn local_edit_survives_late_generation() {
        let mut snap = ResultSnapshot::new();
        snap.put_local(Statement::new(3, 1, "X"));

        let out = reduce(snap, &generated(3, 1, "Y"));
        assert_eq!(out.snapshot.statement(3).unwrap().text, "X");
        // The event is still reported in the timeline.
        assert_eq!(
            out.log.as_deref(),
            Some("Generated Statement #1 (how-might-we)")
        );
    }

    #[test]
    fn statements_are_ordered_by_id_not_arrival() {
        let snap = fold(&[generated(5, 3, "e"), generated(2, 1, "b"), generated(4, 2, "d")]);
        assert_eq!(snap.statement_ids(), vec![2, 4, 5]);
    }

    #[test]
    fn orphan_evaluation_is_dropped_and_logged() {
        let out = reduce(
            ResultSnapshot::new(),
            &evaluated(9, 10.0, Recommendation::Revise),
        );
        assert!(out.snapshot.is_empty());
        assert_eq!(
            out.log.as_deref(),
            Some("Skipped evaluation for unknown Statement #9")
        );
    }

    #[test]
    fn diagnostic_sets_summary_and_step() {
        let out = reduce(
            ResultSnapshot::new(),
            &StreamEvent::Diagnostic(DiagnosticPayload {
                diagnostic_summary: "S".to_string(),
                diagnostic_path: vec![],
            }),
        );
        assert_eq!(out.snapshot.diagnostic_summary, "S");
        assert_eq!(out.step, Some(Step::GeneratingChallenges));
        assert_eq!(out.log.as_deref(), Some("Diagnostic analysis complete"));
        assert!(out.signal.is_none());
    }

    #[test]
    fn complete_and_error_only_signal() {
        let before = fold(&[generated(1, 1, "a")]);

        let done = reduce(
            before.clone(),
            &StreamEvent::Complete {
                session_id: Some("17".into()),
            },
        );
        assert_eq!(done.snapshot, before);
        assert_eq!(
            done.signal,
            Some(RunSignal::Complete {
                session_id: Some("17".into())
            })
        );

        let failed = reduce(
            before.clone(),
            &StreamEvent::Error {
                message: "model overloaded".into(),
            },
        );
        assert_eq!(failed.snapshot, before);
        assert!(failed.log.is_none());
        assert_eq!(
            failed.signal,
            Some(RunSignal::Failed {
                message: "model overloaded".into()
            })
        );
    }

    #[test]
    fn unknown_and_timing_events() {
        let out = reduce(
            ResultSnapshot::new(),
            &StreamEvent::Unknown {
                kind: "heartbeat".into(),
            },
        );
        assert!(out.log.is_none() && out.signal.is_none());

        let out = reduce(
            out.snapshot,
            &StreamEvent::TimingMetrics(json!({"diagnostic_s": 3.2})),
        );
        assert_eq!(out.snapshot.timing_metrics, Some(json!({"diagnostic_s": 3.2})));
    }
}
