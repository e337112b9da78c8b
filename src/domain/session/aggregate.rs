//! SurveySession aggregate - the working state of one survey-filling loop.
//!
//! The aggregate owns the current schema snapshot, the question batch being
//! collected and the transcript. It performs no I/O: the application layer
//! calls its transition methods as collaborator calls resolve.
//!
//! # Transcript
//!
//! Every transition appends to the transcript in causal order. While a model
//! call is outstanding the transcript ends with a loading placeholder, which
//! the next message replaces.

use tracing::debug;

use crate::domain::conversation::{
    Advance, AnswerCollector, ChatMessage, CollectorError, ConversationTurn, Transcript,
    TranscriptEvent,
};
use crate::domain::foundation::{Percentage, SessionId, StateMachine, Timestamp};
use crate::domain::survey::{AnswerSet, Contradiction, ReconciliationOutcome, Schema};

use super::notices;
use super::{FailureReason, SessionContext, SessionError, SessionState};

/// Why an answer was not recorded. The session is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRejection {
    /// Blank answer; the current question still awaits an answer.
    EmptyAnswer,
    /// The submission targets a turn that is not awaiting an answer.
    Stale {
        submitted: usize,
        awaiting: Option<usize>,
    },
}

/// Result of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Recorded; the turn at this index is now current.
    NextQuestion(usize),
    /// Recorded the last answer; the session is now reconciling.
    BatchComplete,
    Rejected(AnswerRejection),
}

/// What a reconciliation result did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    Completed,
    /// Another round starts with this 1-based iteration number.
    NextIteration(u32),
    /// Incomplete, and no rounds are left.
    IterationLimitReached,
}

/// The current question with its position in the batch.
#[derive(Debug, Clone, Copy)]
pub struct CurrentQuestion<'a> {
    pub index: usize,
    pub batch_len: usize,
    pub turn: &'a ConversationTurn,
}

/// One survey-filling session.
///
/// # Invariants
///
/// - the collector is present iff state is `CollectingAnswers` or `Reconciling`
/// - `answer_set` is present iff state is `Completed`
/// - `iteration` starts at 1 and grows by one per incomplete reconciliation
#[derive(Debug, Clone)]
pub struct SurveySession {
    context: SessionContext,
    state: SessionState,
    schema: Option<Schema>,
    collector: Option<AnswerCollector>,
    iteration: u32,
    transcript: Transcript,
    contradictions: Vec<Contradiction>,
    answer_set: Option<AnswerSet>,
    updated_at: Timestamp,
}

impl SurveySession {
    /// Creates a session waiting on its schema.
    pub fn new(context: SessionContext) -> Self {
        let updated_at = context.started_at();
        Self {
            context,
            state: SessionState::Initializing,
            schema: None,
            collector: None,
            iteration: 1,
            transcript: Transcript::new(),
            contradictions: Vec::new(),
            answer_set: None,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.context.session_id()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 1-based round counter.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// The current schema snapshot, once loaded.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Fields the next generation call may ask about.
    pub fn unanswered_schema(&self) -> Option<Schema> {
        self.schema.as_ref().map(Schema::unanswered)
    }

    pub fn progress(&self) -> Percentage {
        self.schema
            .as_ref()
            .map(Schema::progress)
            .unwrap_or(Percentage::ZERO)
    }

    /// The question awaiting an answer, if any.
    pub fn current_question(&self) -> Option<CurrentQuestion<'_>> {
        let collector = self.collector.as_ref()?;
        let (index, turn) = collector.current_turn()?;
        Some(CurrentQuestion {
            index,
            batch_len: collector.len(),
            turn,
        })
    }

    /// The batch being collected or reconciled.
    pub fn batch(&self) -> &[ConversationTurn] {
        self.collector
            .as_ref()
            .map(AnswerCollector::turns)
            .unwrap_or(&[])
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Contradictions reported by the latest reconciliation.
    pub fn contradictions(&self) -> &[Contradiction] {
        &self.contradictions
    }

    pub fn answer_set(&self) -> Option<&AnswerSet> {
        self.answer_set.as_ref()
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Drains transcript events for the sink.
    pub fn take_transcript_events(&mut self) -> Vec<TranscriptEvent> {
        self.transcript.take_events()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Records the schema from the form source and starts generating.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless `Initializing`
    /// - `SchemaUnavailable` if the form has no fields
    pub fn schema_loaded(&mut self, schema: Schema) -> Result<(), SessionError> {
        self.ensure_state(SessionState::Initializing)?;
        if schema.is_empty() {
            return Err(SessionError::schema_unavailable("the form has no questions"));
        }

        self.transition(SessionState::GeneratingQuestions)?;
        self.schema = Some(schema);
        self.transcript.append(ChatMessage::bot_notice(notices::WELCOME));
        self.transcript.push_placeholder(notices::PREPARING_QUESTIONS);
        Ok(())
    }

    /// Installs a generated batch and asks its first question.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless `GeneratingQuestions`, or if `turns` is empty
    pub fn questions_generated(&mut self, turns: Vec<ConversationTurn>) -> Result<(), SessionError> {
        self.ensure_state(SessionState::GeneratingQuestions)?;
        let collector = AnswerCollector::load(turns)
            .map_err(|e| SessionError::invalid_state(e.to_string()))?;

        self.transition(SessionState::CollectingAnswers)?;
        let first = collector.turns()[0].question_text.clone();
        self.collector = Some(collector);
        self.transcript.append(ChatMessage::question(first));
        Ok(())
    }

    /// Records an answer for the turn at `turn_index`.
    ///
    /// Rejections leave the session untouched. Accepted answers append a
    /// `user-answer` message, then either the next question or a loading
    /// placeholder while the batch is reconciled.
    pub fn submit_answer(&mut self, turn_index: usize, answer: &str) -> AnswerOutcome {
        let collector = match (self.state, self.collector.as_mut()) {
            (SessionState::CollectingAnswers, Some(collector)) => collector,
            _ => {
                return AnswerOutcome::Rejected(AnswerRejection::Stale {
                    submitted: turn_index,
                    awaiting: None,
                })
            }
        };

        let advance = match collector.submit(turn_index, answer) {
            Ok(advance) => advance,
            Err(CollectorError::EmptyAnswerRejected) | Err(CollectorError::EmptyBatch) => {
                return AnswerOutcome::Rejected(AnswerRejection::EmptyAnswer)
            }
            Err(CollectorError::StaleSubmission { submitted, awaiting }) => {
                return AnswerOutcome::Rejected(AnswerRejection::Stale { submitted, awaiting })
            }
        };

        let recorded = collector.turns()[turn_index]
            .answer_text
            .clone()
            .unwrap_or_default();
        let next_question = match advance {
            Advance::Next(i) => Some(collector.turns()[i].question_text.clone()),
            Advance::BatchComplete => None,
        };

        self.transcript.append(ChatMessage::user_answer(recorded));
        self.updated_at = Timestamp::now();

        match (advance, next_question) {
            (Advance::Next(i), Some(text)) => {
                self.transcript.append(ChatMessage::question(text));
                AnswerOutcome::NextQuestion(i)
            }
            _ => {
                debug_assert!(self.state.can_transition_to(&SessionState::Reconciling));
                self.state = SessionState::Reconciling;
                self.transcript.push_placeholder(notices::PROCESSING_ANSWERS);
                AnswerOutcome::BatchComplete
            }
        }
    }

    /// Applies a reconciliation result.
    ///
    /// Contradiction notices are appended first. A filled schema completes
    /// the session; otherwise another round starts unless `iteration_cap`
    /// rounds have already run, in which case the caller fails the session
    /// with `IterationLimitReached`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless `Reconciling`
    pub fn apply_reconciliation(
        &mut self,
        outcome: ReconciliationOutcome,
        iteration_cap: u32,
    ) -> Result<ReconcileStep, SessionError> {
        self.ensure_state(SessionState::Reconciling)?;

        self.contradictions = outcome.contradictions().to_vec();
        for c in &self.contradictions {
            self.transcript
                .append(ChatMessage::bot_notice(notices::contradiction(&c.description)));
        }

        let filled = outcome.is_filled();
        let schema = outcome.into_schema();
        self.updated_at = Timestamp::now();

        if filled {
            self.transition(SessionState::Completed)?;
            self.answer_set = Some(AnswerSet::from_schema(&schema));
            self.schema = Some(schema);
            self.collector = None;
            self.transcript
                .append(ChatMessage::bot_notice(notices::SURVEY_COMPLETE));
            return Ok(ReconcileStep::Completed);
        }

        self.schema = Some(schema);
        if self.iteration >= iteration_cap {
            return Ok(ReconcileStep::IterationLimitReached);
        }

        self.transition(SessionState::GeneratingQuestions)?;
        self.iteration += 1;
        self.collector = None;
        self.transcript
            .append(ChatMessage::bot_notice(notices::MORE_QUESTIONS));
        self.transcript.push_placeholder(notices::PREPARING_QUESTIONS);
        debug!(session_id = %self.id(), iteration = self.iteration, "Starting next round");
        Ok(ReconcileStep::NextIteration(self.iteration))
    }

    /// Tells the user a model call is being retried.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless a model call is outstanding
    pub fn announce_retry(&mut self) -> Result<(), SessionError> {
        if !matches!(
            self.state,
            SessionState::GeneratingQuestions | SessionState::Reconciling
        ) {
            return Err(SessionError::invalid_state(format!(
                "no model call outstanding in {:?}",
                self.state
            )));
        }
        let loading = self
            .transcript
            .last()
            .map(|m| m.content().to_string())
            .unwrap_or_else(|| notices::PROCESSING_ANSWERS.to_string());
        self.transcript.append(ChatMessage::bot_notice(notices::RETRYING));
        self.transcript.push_placeholder(loading);
        Ok(())
    }

    /// Ends the session with one user-visible failure notice.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the current state cannot fail (collecting answers
    ///   or already terminal)
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), SessionError> {
        self.transition(SessionState::Failed(reason))?;
        self.collector = None;
        self.updated_at = Timestamp::now();
        self.transcript
            .append(ChatMessage::bot_notice(reason.user_notice()));
        Ok(())
    }

    fn ensure_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::invalid_state(format!(
                "expected {:?}, session is {:?}",
                expected, self.state
            )))
        }
    }

    fn transition(&mut self, target: SessionState) -> Result<(), SessionError> {
        self.state = self
            .state
            .transition_to(target)
            .map_err(|e| SessionError::invalid_state(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ChatMessageKind;
    use crate::domain::foundation::FieldId;
    use crate::domain::session::AccessToken;
    use crate::domain::survey::{Field, FieldKind, FormReference};
    use serde_json::json;

    fn context() -> SessionContext {
        SessionContext::new(FormReference::FormId("form".to_string()), AccessToken::new("t"))
    }

    fn two_field_schema() -> Schema {
        Schema::new(
            "Survey",
            None,
            vec![
                Field::new(FieldId::new("q1").unwrap(), "Name", FieldKind::ShortText, true, vec![]).unwrap(),
                Field::new(FieldId::new("q2").unwrap(), "Email", FieldKind::Email, true, vec![]).unwrap(),
            ],
        )
        .unwrap()
    }

    fn turns(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| ConversationTurn::new(format!("Question {}?", i), None))
            .collect()
    }

    fn collecting_session(n: usize) -> SurveySession {
        let mut session = SurveySession::new(context());
        session.schema_loaded(two_field_schema()).unwrap();
        session.questions_generated(turns(n)).unwrap();
        session
    }

    fn reconciling_session() -> SurveySession {
        let mut session = collecting_session(1);
        session.submit_answer(0, "Ada, ada@example.com");
        session
    }

    fn outcome(records: serde_json::Value, contradictions: Vec<Contradiction>) -> ReconciliationOutcome {
        let records = records.as_array().cloned().unwrap();
        ReconciliationOutcome::from_records(&two_field_schema(), &records, contradictions, None).unwrap()
    }

    fn kinds(session: &SurveySession) -> Vec<ChatMessageKind> {
        session.transcript().messages().iter().map(|m| m.kind()).collect()
    }

    mod startup {
        use super::*;

        #[test]
        fn new_session_is_initializing() {
            let session = SurveySession::new(context());
            assert_eq!(session.state(), SessionState::Initializing);
            assert_eq!(session.iteration(), 1);
            assert!(session.transcript().is_empty());
        }

        #[test]
        fn schema_loaded_welcomes_and_waits_on_generation() {
            let mut session = SurveySession::new(context());
            session.schema_loaded(two_field_schema()).unwrap();

            assert_eq!(session.state(), SessionState::GeneratingQuestions);
            assert_eq!(kinds(&session), vec![ChatMessageKind::BotNotice, ChatMessageKind::LoadingNotice]);
            assert_eq!(session.transcript().messages()[0].content(), notices::WELCOME);
        }

        #[test]
        fn empty_schema_is_unavailable() {
            let mut session = SurveySession::new(context());
            let result = session.schema_loaded(Schema::new("Empty", None, vec![]).unwrap());
            assert!(matches!(result, Err(SessionError::SchemaUnavailable(_))));
            assert_eq!(session.state(), SessionState::Initializing);
        }

        #[test]
        fn first_question_replaces_placeholder() {
            let session = collecting_session(2);
            assert_eq!(session.state(), SessionState::CollectingAnswers);
            assert_eq!(kinds(&session), vec![ChatMessageKind::BotNotice, ChatMessageKind::Question]);
            let current = session.current_question().unwrap();
            assert_eq!((current.index, current.batch_len), (0, 2));
        }

        #[test]
        fn empty_batch_is_refused() {
            let mut session = SurveySession::new(context());
            session.schema_loaded(two_field_schema()).unwrap();
            assert!(session.questions_generated(vec![]).is_err());
            assert_eq!(session.state(), SessionState::GeneratingQuestions);
        }
    }

    mod answering {
        use super::*;

        #[test]
        fn accepted_answer_appends_answer_then_next_question() {
            let mut session = collecting_session(2);
            assert_eq!(session.submit_answer(0, " Ada "), AnswerOutcome::NextQuestion(1));

            let messages = session.transcript().messages();
            assert_eq!(messages[2].kind(), ChatMessageKind::UserAnswer);
            assert_eq!(messages[2].content(), "Ada");
            assert_eq!(messages[3].content(), "Question 1?");
        }

        #[test]
        fn last_answer_starts_reconciling_with_placeholder() {
            let mut session = collecting_session(1);
            assert_eq!(session.submit_answer(0, "Ada"), AnswerOutcome::BatchComplete);
            assert_eq!(session.state(), SessionState::Reconciling);
            assert!(session.transcript().has_pending());
            assert!(session.current_question().is_none());
            assert_eq!(session.batch()[0].answer_text.as_deref(), Some("Ada"));
        }

        #[test]
        fn empty_answer_changes_nothing() {
            let mut session = collecting_session(2);
            let before = session.transcript().len();
            assert_eq!(
                session.submit_answer(0, "  "),
                AnswerOutcome::Rejected(AnswerRejection::EmptyAnswer)
            );
            assert_eq!(session.transcript().len(), before);
            assert_eq!(session.current_question().unwrap().index, 0);
        }

        #[test]
        fn answer_for_wrong_turn_is_stale() {
            let mut session = collecting_session(2);
            assert_eq!(
                session.submit_answer(1, "early"),
                AnswerOutcome::Rejected(AnswerRejection::Stale {
                    submitted: 1,
                    awaiting: Some(0)
                })
            );
        }

        #[test]
        fn answer_while_reconciling_is_stale() {
            let mut session = reconciling_session();
            assert!(matches!(
                session.submit_answer(0, "again"),
                AnswerOutcome::Rejected(AnswerRejection::Stale { awaiting: None, .. })
            ));
        }
    }

    mod reconciling {
        use super::*;

        #[test]
        fn filled_schema_completes_with_answer_set() {
            let mut session = reconciling_session();
            let step = session
                .apply_reconciliation(
                    outcome(json!([{"id": "q1", "answer": "Ada"}, {"id": "q2", "answer": "ada@example.com"}]), vec![]),
                    10,
                )
                .unwrap();

            assert_eq!(step, ReconcileStep::Completed);
            assert_eq!(session.state(), SessionState::Completed);
            assert_eq!(session.answer_set().unwrap().len(), 2);
            assert_eq!(session.transcript().last().unwrap().content(), notices::SURVEY_COMPLETE);
            assert!(!session.transcript().has_pending());
        }

        #[test]
        fn partial_schema_starts_next_round() {
            let mut session = reconciling_session();
            let step = session
                .apply_reconciliation(
                    outcome(json!([{"id": "q1", "answer": "Ada"}, {"id": "q2", "answer": null}]), vec![]),
                    10,
                )
                .unwrap();

            assert_eq!(step, ReconcileStep::NextIteration(2));
            assert_eq!(session.state(), SessionState::GeneratingQuestions);
            let open = session.unanswered_schema().unwrap();
            assert_eq!(open.len(), 1);
            assert_eq!(open.fields()[0].id().as_str(), "q2");
            assert_eq!(session.progress().value(), 50);
            assert!(session.batch().is_empty());
        }

        #[test]
        fn contradictions_are_announced_before_continuing() {
            let mut session = reconciling_session();
            let contradiction = Contradiction {
                field_id: None,
                description: "two different emails".to_string(),
            };
            session
                .apply_reconciliation(
                    outcome(json!([{"id": "q1", "answer": "Ada"}, {"id": "q2"}]), vec![contradiction]),
                    10,
                )
                .unwrap();

            let contents: Vec<&str> = session
                .transcript()
                .messages()
                .iter()
                .map(|m| m.content())
                .collect();
            let conflict = contents.iter().position(|c| c.contains("two different emails")).unwrap();
            let thanks = contents.iter().position(|c| *c == notices::MORE_QUESTIONS).unwrap();
            assert!(conflict < thanks);
            assert_eq!(session.contradictions().len(), 1);
        }

        #[test]
        fn iteration_cap_stops_the_loop() {
            let mut session = reconciling_session();
            let step = session
                .apply_reconciliation(outcome(json!([{"id": "q1"}]), vec![]), 1)
                .unwrap();
            assert_eq!(step, ReconcileStep::IterationLimitReached);
            assert_eq!(session.state(), SessionState::Reconciling);

            session.fail(FailureReason::IterationLimitReached).unwrap();
            assert!(session.is_terminal());
        }

        #[test]
        fn rejected_outside_reconciling() {
            let mut session = collecting_session(1);
            let result = session.apply_reconciliation(outcome(json!([]), vec![]), 10);
            assert!(matches!(result, Err(SessionError::InvalidState(_))));
        }
    }

    mod failing {
        use super::*;

        #[test]
        fn failure_replaces_placeholder_with_one_notice() {
            let mut session = reconciling_session();
            let before = session.transcript().len();
            session.fail(FailureReason::MalformedReconciliation).unwrap();

            assert_eq!(session.state(), SessionState::Failed(FailureReason::MalformedReconciliation));
            assert_eq!(session.transcript().len(), before);
            assert_eq!(
                session.transcript().last().unwrap().content(),
                FailureReason::MalformedReconciliation.user_notice()
            );
        }

        #[test]
        fn terminal_session_cannot_fail_twice() {
            let mut session = reconciling_session();
            session.fail(FailureReason::Timeout).unwrap();
            let before = session.transcript().len();
            assert!(session.fail(FailureReason::Timeout).is_err());
            assert_eq!(session.transcript().len(), before);
        }

        #[test]
        fn collecting_session_cannot_fail() {
            let mut session = collecting_session(1);
            assert!(session.fail(FailureReason::Timeout).is_err());
        }

        #[test]
        fn retry_keeps_a_placeholder_pending() {
            let mut session = reconciling_session();
            session.announce_retry().unwrap();
            assert!(session.transcript().has_pending());
            assert_eq!(
                session.transcript().last().unwrap().content(),
                notices::PROCESSING_ANSWERS
            );
            let retry_notices = session
                .transcript()
                .messages()
                .iter()
                .filter(|m| m.content() == notices::RETRYING)
                .count();
            assert_eq!(retry_notices, 1);
        }
    }
}
