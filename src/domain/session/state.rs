//! Session lifecycle states.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Form fetch or auth precondition failed.
    SchemaUnavailable,
    /// Question generation output had no usable `questions` array.
    MalformedGeneration,
    /// Reconciliation output had no usable field records.
    MalformedReconciliation,
    /// A model call did not answer within the configured timeout.
    Timeout,
    /// The model provider kept failing.
    ProviderUnavailable,
    /// Reconciliation was still incomplete after the iteration cap.
    IterationLimitReached,
}

impl FailureReason {
    /// The notice shown to the user when the session stops for this reason.
    pub fn user_notice(&self) -> &'static str {
        match self {
            Self::SchemaUnavailable => {
                "Sorry, I couldn't load that survey. Please check the link and your access, then try again."
            }
            Self::MalformedGeneration => {
                "Sorry, I couldn't come up with the next questions. Please start the survey again."
            }
            Self::MalformedReconciliation => {
                "Sorry, I couldn't match your answers to the survey. Please start the survey again."
            }
            Self::Timeout => "Sorry, this is taking too long. Please start the survey again later.",
            Self::ProviderUnavailable => {
                "Sorry, the assistant is unavailable right now. Please try again later."
            }
            Self::IterationLimitReached => {
                "Sorry, I still couldn't fill every question after several rounds. Please complete the remaining questions directly in the form."
            }
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SchemaUnavailable => "schema_unavailable",
            Self::MalformedGeneration => "malformed_generation",
            Self::MalformedReconciliation => "malformed_reconciliation",
            Self::Timeout => "timeout",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::IterationLimitReached => "iteration_limit_reached",
        };
        write!(f, "{}", s)
    }
}

/// Where a survey session is in the generate/collect/reconcile loop.
///
/// Exactly one state per "waiting on X" condition, so at most one model
/// call is outstanding per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting on the form source.
    #[default]
    Initializing,
    /// Waiting on question generation.
    GeneratingQuestions,
    /// Waiting on the user.
    CollectingAnswers,
    /// Waiting on reconciliation.
    Reconciling,
    Completed,
    Failed(FailureReason),
}

impl SessionState {
    /// Returns true while a model or form-source call is outstanding.
    pub fn is_waiting_on_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::GeneratingQuestions | Self::Reconciling
        )
    }

    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::CollectingAnswers)
    }
}

impl StateMachine for SessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Initializing, GeneratingQuestions)
                | (Initializing, Failed(_))
                | (GeneratingQuestions, CollectingAnswers)
                | (GeneratingQuestions, Failed(_))
                | (CollectingAnswers, Reconciling)
                | (Reconciling, Completed)
                | (Reconciling, GeneratingQuestions)
                | (Reconciling, Failed(_))
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FailureReason::*;
        use SessionState::*;
        let failures = |reasons: &[FailureReason]| -> Vec<Self> {
            reasons.iter().map(|r| Failed(*r)).collect()
        };
        match self {
            Initializing => {
                let mut v = vec![GeneratingQuestions];
                v.extend(failures(&[SchemaUnavailable]));
                v
            }
            GeneratingQuestions => {
                let mut v = vec![CollectingAnswers];
                v.extend(failures(&[MalformedGeneration, Timeout, ProviderUnavailable]));
                v
            }
            CollectingAnswers => vec![Reconciling],
            Reconciling => {
                let mut v = vec![Completed, GeneratingQuestions];
                v.extend(failures(&[
                    MalformedReconciliation,
                    Timeout,
                    ProviderUnavailable,
                    IterationLimitReached,
                ]));
                v
            }
            Completed | Failed(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_edges_are_valid() {
        use SessionState::*;
        assert!(Initializing.can_transition_to(&GeneratingQuestions));
        assert!(GeneratingQuestions.can_transition_to(&CollectingAnswers));
        assert!(CollectingAnswers.can_transition_to(&Reconciling));
        assert!(Reconciling.can_transition_to(&GeneratingQuestions));
        assert!(Reconciling.can_transition_to(&Completed));
    }

    #[test]
    fn collecting_cannot_fail_or_skip_reconciliation() {
        use SessionState::*;
        assert!(!CollectingAnswers.can_transition_to(&Completed));
        assert!(!CollectingAnswers.can_transition_to(&Failed(FailureReason::Timeout)));
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed(FailureReason::Timeout).is_terminal());
        assert!(!SessionState::Reconciling.is_terminal());
    }

    #[test]
    fn listed_transitions_are_accepted() {
        use SessionState::*;
        for state in [Initializing, GeneratingQuestions, CollectingAnswers, Reconciling] {
            for target in state.valid_transitions() {
                assert!(state.can_transition_to(&target), "{:?} -> {:?}", state, target);
            }
        }
    }

    #[test]
    fn serializes_with_reason() {
        let json = serde_json::to_value(SessionState::Failed(FailureReason::Timeout)).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");
        let json = serde_json::to_value(SessionState::Completed).unwrap();
        assert_eq!(json["status"], "completed");
    }
}
