//! Workflow controller: sequences input → submission → result → notes → reset.
//!
//! The state is an explicit value and every transition is a pure function of
//! `(state, event)`. `WorkflowController` owns the current state, mints
//! submission ids and swaps in the next state as a whole, so no partially
//! updated state is ever observable.

use crate::document::{self, Document, FileAcquirer, FileUpload, InputError};
use crate::export::Report;
use crate::gateway::{Failure, Summarizer};
use crate::metrics::{InputStats, NotesStats, ResultStats};
use crate::summary::SummaryResult;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Monotonically increasing identifier of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The state name without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    HasInput,
    Processing,
    Result,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::HasInput => "holding input",
            Phase::Processing => "processing",
            Phase::Result => "showing a result",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Workflow state. Each variant carries exactly the data that may exist in it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    HasInput {
        document: Document,
    },
    Processing {
        document: Document,
        submission: SubmissionId,
    },
    Result {
        document: Document,
        result: SummaryResult,
        notes: String,
    },
    Failed {
        document: Document,
        failure: Failure,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::HasInput { .. } => Phase::HasInput,
            WorkflowState::Processing { .. } => Phase::Processing,
            WorkflowState::Result { .. } => Phase::Result,
            WorkflowState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::HasInput { document }
            | WorkflowState::Processing { document, .. }
            | WorkflowState::Result { document, .. }
            | WorkflowState::Failed { document, .. } => Some(document),
        }
    }
}

/// Something that happened to the workflow
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user provided (new) input
    InputAcquired(Document),
    /// The user removed all input
    InputCleared,
    /// The user asked for a summary; the id is minted by the controller
    Submit(SubmissionId),
    /// The gateway answered a submission
    Resolved {
        id: SubmissionId,
        outcome: Result<SummaryResult, Failure>,
    },
    /// The user stopped waiting for the outstanding submission
    Cancel,
    /// The user wants to try again after a failure
    Retry,
    NotesEdited(String),
    StartOver,
}

impl Event {
    fn action(&self) -> &'static str {
        match self {
            Event::InputAcquired(_) => "change input",
            Event::InputCleared => "clear input",
            Event::Submit(_) => "submit",
            Event::Resolved { .. } => "accept a response",
            Event::Cancel => "cancel",
            Event::Retry => "retry",
            Event::NotesEdited(_) => "edit notes",
            Event::StartOver => "start over",
        }
    }
}

/// Work a transition asks the caller to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Send this submission to the gateway
    Dispatch(Submission),
    /// A response for an abandoned submission arrived and was dropped
    StaleIgnored(SubmissionId),
}

/// A document on its way to the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    pub document: Document,
}

/// What became of a gateway response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The response belonged to the current submission and was applied
    Applied,
    /// The response belonged to an abandoned submission and was dropped
    Stale,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Outcome of a pure transition: the next state, and either the effect to
/// perform or the reason the event was rejected. A rejected event leaves the
/// state exactly as it was.
#[derive(Debug)]
pub struct Step {
    pub state: WorkflowState,
    pub outcome: Result<Effect, WorkflowError>,
}

impl Step {
    fn to(state: WorkflowState) -> Self {
        Self {
            state,
            outcome: Ok(Effect::None),
        }
    }

    fn with(state: WorkflowState, effect: Effect) -> Self {
        Self {
            state,
            outcome: Ok(effect),
        }
    }

    fn reject(state: WorkflowState, action: &'static str) -> Self {
        let phase = state.phase();
        Self {
            state,
            outcome: Err(WorkflowError::InvalidTransition { phase, action }),
        }
    }
}

/// Compute the next state for `event`.
pub fn transition(state: WorkflowState, event: Event) -> Step {
    use WorkflowState as S;

    let action = event.action();
    match (state, event) {
        // Any response that does not match the outstanding submission is stale.
        (S::Processing { document, submission }, Event::Resolved { id, outcome }) if id == submission => {
            match outcome {
                Ok(result) => Step::to(S::Result {
                    document,
                    result,
                    notes: String::new(),
                }),
                Err(failure) => Step::to(S::Failed { document, failure }),
            }
        }
        (state, Event::Resolved { id, .. }) => Step::with(state, Effect::StaleIgnored(id)),

        (state @ S::Result { .. }, Event::InputAcquired(_)) => Step::reject(state, action),
        (_, Event::InputAcquired(document)) => Step::to(S::HasInput { document }),

        (state @ S::Result { .. }, Event::InputCleared) => Step::reject(state, action),
        (_, Event::InputCleared) => Step::to(S::Idle),

        (S::HasInput { document }, Event::Submit(id)) => {
            let submission = Submission {
                id,
                document: document.clone(),
            };
            Step::with(
                S::Processing {
                    document,
                    submission: id,
                },
                Effect::Dispatch(submission),
            )
        }

        (S::Processing { document, .. }, Event::Cancel) => Step::to(S::HasInput { document }),
        (S::Failed { document, .. }, Event::Retry) => Step::to(S::HasInput { document }),

        (S::Result { document, result, .. }, Event::NotesEdited(notes)) => Step::to(S::Result {
            document,
            result,
            notes,
        }),

        (_, Event::StartOver) => Step::to(S::Idle),

        (state, _) => Step::reject(state, action),
    }
}

/// Owner of the session's workflow state.
#[derive(Debug, Default)]
pub struct WorkflowController {
    state: WorkflowState,
    last_submission: u64,
}

impl WorkflowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn document(&self) -> Option<&Document> {
        self.state.document()
    }

    pub fn result(&self) -> Option<&SummaryResult> {
        match &self.state {
            WorkflowState::Result { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Notes exist only alongside a result
    pub fn notes(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Result { notes, .. } => Some(notes),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.state {
            WorkflowState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// The submission the controller is waiting on, if any
    pub fn pending_submission(&self) -> Option<SubmissionId> {
        match &self.state {
            WorkflowState::Processing { submission, .. } => Some(*submission),
            _ => None,
        }
    }

    /// Apply one event, replacing the whole state at once.
    pub fn apply(&mut self, event: Event) -> Result<Effect, WorkflowError> {
        let from = self.state.phase();
        let action = event.action();
        let state = std::mem::take(&mut self.state);
        let step = transition(state, event);
        self.state = step.state;

        match &step.outcome {
            Ok(Effect::StaleIgnored(id)) => {
                tracing::debug!(submission = %id, phase = %from, "ignored stale response");
            }
            Ok(_) => {
                tracing::debug!(from = %from, to = %self.state.phase(), action, "workflow transition");
            }
            Err(e) => {
                tracing::debug!(phase = %from, action, error = %e, "workflow event rejected");
            }
        }
        step.outcome
    }

    /// Replace the input with typed or pasted text. Blank text clears it.
    pub fn set_text(&mut self, text: &str) -> Result<(), WorkflowError> {
        if text.trim().is_empty() {
            self.apply(Event::InputCleared)?;
            return Ok(());
        }
        let document = Document::from_text(text)?;
        self.apply(Event::InputAcquired(document))?;
        Ok(())
    }

    /// Take an already built document as the new input
    pub fn load_document(&mut self, document: Document) -> Result<(), WorkflowError> {
        self.apply(Event::InputAcquired(document))?;
        Ok(())
    }

    /// Validate an upload, extract its text and take it as the new input.
    ///
    /// Nothing is extracted when the current state does not accept input.
    pub async fn load_file<A>(&mut self, acquirer: &A, upload: &FileUpload) -> Result<(), WorkflowError>
    where
        A: FileAcquirer + ?Sized,
    {
        if self.phase() == Phase::Result {
            return Err(WorkflowError::InvalidTransition {
                phase: Phase::Result,
                action: "change input",
            });
        }
        let document = document::acquire_file(acquirer, upload).await?;
        self.load_document(document)
    }

    pub fn clear_input(&mut self) -> Result<(), WorkflowError> {
        self.apply(Event::InputCleared).map(|_| ())
    }

    /// Start a submission. The returned ticket must be sent to the gateway
    /// and its answer passed back through `resolve`.
    pub fn submit(&mut self) -> Result<Submission, WorkflowError> {
        let id = SubmissionId(self.last_submission + 1);
        match self.apply(Event::Submit(id))? {
            Effect::Dispatch(submission) => {
                self.last_submission = id.0;
                Ok(submission)
            }
            _ => Err(WorkflowError::InvalidTransition {
                phase: self.phase(),
                action: "submit",
            }),
        }
    }

    /// Feed a gateway answer back into the workflow
    pub fn resolve(&mut self, id: SubmissionId, outcome: Result<SummaryResult, Failure>) -> Resolution {
        match self.apply(Event::Resolved { id, outcome }) {
            Ok(Effect::StaleIgnored(_)) => Resolution::Stale,
            _ => Resolution::Applied,
        }
    }

    /// Submit the current document and wait for the answer
    pub async fn summarize<S>(&mut self, summarizer: &S) -> Result<Resolution, WorkflowError>
    where
        S: Summarizer + ?Sized,
    {
        let submission = self.submit()?;
        let outcome = summarizer.submit(&submission.document).await;
        Ok(self.resolve(submission.id, outcome))
    }

    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        self.apply(Event::Cancel).map(|_| ())
    }

    pub fn retry(&mut self) -> Result<(), WorkflowError> {
        self.apply(Event::Retry).map(|_| ())
    }

    pub fn edit_notes(&mut self, notes: impl Into<String>) -> Result<(), WorkflowError> {
        self.apply(Event::NotesEdited(notes.into())).map(|_| ())
    }

    /// Discard document, result and notes, abandoning any outstanding submission
    pub fn start_over(&mut self) {
        // Accepted from every state.
        let _ = self.apply(Event::StartOver);
    }

    /// Live statistics of the current input
    pub fn input_stats(&self) -> Option<InputStats> {
        self.document().map(|d| InputStats::of(d.content()))
    }

    pub fn result_stats(&self) -> Option<ResultStats> {
        self.result().map(ResultStats::of)
    }

    pub fn notes_stats(&self) -> Option<NotesStats> {
        self.notes().map(NotesStats::of)
    }

    /// The export report for the current result and notes
    pub fn report(&self) -> Result<Report, WorkflowError> {
        match &self.state {
            WorkflowState::Result { result, notes, .. } => Ok(Report::compose(result, notes)),
            state => Err(WorkflowError::InvalidTransition {
                phase: state.phase(),
                action: "export",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_result() -> SummaryResult {
        SummaryResult {
            summary: "Hello.".to_string(),
            key_points: vec!["Greeting".to_string()],
            sentence_count: 1,
            original_sentences: 2,
            original_length: 11,
            summary_length: 6,
            sections_covered: None,
            method: "rule-based".to_string(),
            length_setting: None,
            quality_metrics: None,
        }
    }

    /// Extracts the same text from every upload
    struct FixedExtraction(&'static str);

    #[async_trait::async_trait]
    impl FileAcquirer for FixedExtraction {
        async fn extract(&self, _upload: &FileUpload) -> Result<document::ExtractedText, InputError> {
            Ok(document::ExtractedText {
                text: self.0.to_string(),
                pages: Some(1),
            })
        }
    }

    fn with_input(text: &str) -> WorkflowController {
        let mut ctrl = WorkflowController::new();
        ctrl.set_text(text).unwrap();
        ctrl
    }

    #[test]
    fn starts_idle() {
        let ctrl = WorkflowController::new();
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(ctrl.document().is_none());
        assert!(ctrl.input_stats().is_none());
    }

    #[test]
    fn typing_and_clearing_moves_between_idle_and_has_input() {
        let mut ctrl = with_input("Hello world");
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert_eq!(ctrl.document().unwrap().original_length(), 11);

        ctrl.set_text("Hello world, again").unwrap();
        assert_eq!(ctrl.document().unwrap().content(), "Hello world, again");

        ctrl.set_text("   ").unwrap();
        assert_eq!(ctrl.phase(), Phase::Idle);
    }

    #[test]
    fn input_stats_track_the_current_document() {
        let mut ctrl = with_input("one two three");
        assert_eq!(ctrl.input_stats().unwrap().word_count, 3);
        ctrl.set_text("one two").unwrap();
        assert_eq!(ctrl.input_stats().unwrap().word_count, 2);
    }

    #[test]
    fn successful_submission_reaches_result() {
        let mut ctrl = with_input("Hello world");
        let submission = ctrl.submit().unwrap();
        assert_eq!(ctrl.phase(), Phase::Processing);
        assert_eq!(submission.document.content(), "Hello world");

        let resolution = ctrl.resolve(submission.id, Ok(hello_result()));
        assert_eq!(resolution, Resolution::Applied);
        assert_eq!(ctrl.phase(), Phase::Result);
        assert_eq!(ctrl.notes(), Some(""));
        assert_eq!(ctrl.result_stats().unwrap().compression.percent(), Some(45));
    }

    #[test]
    fn failed_submission_exposes_no_result_and_can_retry() {
        let mut ctrl = with_input("Hello world");
        let submission = ctrl.submit().unwrap();
        ctrl.resolve(submission.id, Err(Failure::new("service down", true)));

        assert_eq!(ctrl.phase(), Phase::Failed);
        assert!(ctrl.result().is_none());
        assert!(ctrl.notes().is_none());
        assert_eq!(ctrl.failure().unwrap().message, "service down");

        ctrl.retry().unwrap();
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert!(ctrl.failure().is_none());
        assert_eq!(ctrl.document().unwrap().content(), "Hello world");
    }

    #[test]
    fn editing_input_after_failure_replaces_document() {
        let mut ctrl = with_input("Hello world");
        let submission = ctrl.submit().unwrap();
        ctrl.resolve(submission.id, Err(Failure::new("nope", false)));

        ctrl.set_text("Different text").unwrap();
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert_eq!(ctrl.document().unwrap().content(), "Different text");
    }

    #[test]
    fn second_submit_while_processing_is_rejected() {
        let mut ctrl = with_input("Hello world");
        let first = ctrl.submit().unwrap();

        let err = ctrl.submit().unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidTransition {
                phase: Phase::Processing,
                action: "submit"
            }
        );
        assert_eq!(ctrl.pending_submission(), Some(first.id));
    }

    #[test]
    fn stale_response_never_mutates_state() {
        let mut ctrl = with_input("Hello world");
        let a = ctrl.submit().unwrap();
        ctrl.cancel().unwrap();
        let b = ctrl.submit().unwrap();
        assert!(b.id > a.id);

        let resolution = ctrl.resolve(a.id, Err(Failure::new("late failure", true)));
        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(ctrl.phase(), Phase::Processing);
        assert_eq!(ctrl.pending_submission(), Some(b.id));

        ctrl.resolve(b.id, Ok(hello_result()));
        assert_eq!(ctrl.phase(), Phase::Result);
        assert_eq!(ctrl.result().unwrap().summary, "Hello.");
    }

    #[test]
    fn late_response_after_start_over_is_dropped() {
        let mut ctrl = with_input("Hello world");
        let a = ctrl.submit().unwrap();
        ctrl.start_over();

        assert_eq!(ctrl.resolve(a.id, Ok(hello_result())), Resolution::Stale);
        assert_eq!(ctrl.phase(), Phase::Idle);
    }

    #[test]
    fn notes_only_editable_with_result() {
        let mut ctrl = with_input("Hello world");
        assert!(ctrl.edit_notes("early").is_err());
        assert_eq!(ctrl.phase(), Phase::HasInput);

        let submission = ctrl.submit().unwrap();
        ctrl.resolve(submission.id, Ok(hello_result()));
        ctrl.edit_notes("Remember to follow up").unwrap();
        assert_eq!(ctrl.notes(), Some("Remember to follow up"));
        assert_eq!(ctrl.notes_stats().unwrap().word_count, 4);
    }

    #[test]
    fn input_is_locked_while_showing_result() {
        let mut ctrl = with_input("Hello world");
        let submission = ctrl.submit().unwrap();
        ctrl.resolve(submission.id, Ok(hello_result()));

        assert!(ctrl.set_text("replacement").is_err());
        assert!(ctrl.clear_input().is_err());
        assert_eq!(ctrl.phase(), Phase::Result);
        assert_eq!(ctrl.document().unwrap().content(), "Hello world");
    }

    #[test]
    fn start_over_clears_everything() {
        let mut ctrl = with_input("Hello world");
        let submission = ctrl.submit().unwrap();
        ctrl.resolve(submission.id, Ok(hello_result()));
        ctrl.edit_notes("notes").unwrap();

        ctrl.start_over();
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(ctrl.document().is_none());
        assert!(ctrl.result().is_none());
        assert!(ctrl.notes().is_none());

        ctrl.set_text("A fresh document").unwrap();
        assert_eq!(ctrl.document().unwrap().original_length(), 16);
        let next = ctrl.submit().unwrap();
        assert!(next.id > submission.id);
    }

    #[test]
    fn export_requires_a_result() {
        let ctrl = with_input("Hello world");
        assert_eq!(
            ctrl.report().unwrap_err(),
            WorkflowError::InvalidTransition {
                phase: Phase::HasInput,
                action: "export"
            }
        );
    }

    #[test]
    fn rejected_event_leaves_state_untouched() {
        let state = WorkflowState::HasInput {
            document: Document::from_text("Hello world").unwrap(),
        };
        let step = transition(state.clone(), Event::Retry);
        assert_eq!(step.state, state);
        assert!(step.outcome.is_err());
    }

    #[test]
    fn blank_text_from_idle_stays_idle() {
        let mut ctrl = WorkflowController::new();
        ctrl.set_text("").unwrap();
        assert_eq!(ctrl.phase(), Phase::Idle);
    }

    #[test]
    fn typing_while_processing_abandons_the_submission() {
        let mut ctrl = with_input("Hello world");
        let pending = ctrl.submit().unwrap();

        ctrl.set_text("Second thoughts").unwrap();
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert!(ctrl.pending_submission().is_none());

        assert_eq!(ctrl.resolve(pending.id, Ok(hello_result())), Resolution::Stale);
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert!(ctrl.result().is_none());
        assert_eq!(ctrl.document().unwrap().content(), "Second thoughts");
    }

    #[tokio::test]
    async fn loading_a_file_while_processing_abandons_the_submission() {
        let mut ctrl = with_input("Hello world");
        let pending = ctrl.submit().unwrap();

        let upload = FileUpload::new("paper.pdf", document::PDF_MEDIA_TYPE, b"%PDF-1.4".to_vec());
        ctrl.load_file(&FixedExtraction("Text from the PDF"), &upload)
            .await
            .unwrap();
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert_eq!(ctrl.document().unwrap().file_name(), Some("paper.pdf"));

        let late = ctrl.resolve(pending.id, Err(Failure::new("late failure", true)));
        assert_eq!(late, Resolution::Stale);
        assert_eq!(ctrl.phase(), Phase::HasInput);
        assert!(ctrl.failure().is_none());
        assert_eq!(ctrl.document().unwrap().content(), "Text from the PDF");
    }

    #[test]
    fn clearing_after_failure_returns_to_idle() {
        let mut ctrl = with_input("Hello world");
        let submission = ctrl.submit().unwrap();
        ctrl.resolve(submission.id, Err(Failure::new("service down", true)));
        assert_eq!(ctrl.phase(), Phase::Failed);

        ctrl.clear_input().unwrap();
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(ctrl.document().is_none());
        assert!(ctrl.failure().is_none());
        assert!(ctrl.input_stats().is_none());
    }
}
