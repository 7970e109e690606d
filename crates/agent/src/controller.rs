use std::time::Duration;

use chrono::Utc;
use partline_core::flows::{
    ConversationEvent, ConversationState, ExchangeAction, ExchangeContext, FlowEngine,
    FlowTransitionError, SingleExchangeFlow, TransitionOutcome,
};
use partline_render::MarkupRenderer;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::answer::{
    degraded_reply, AnswerReply, AnswerRequest, AnswerService, DispatchError, LocalAnswerService,
};
use crate::transcript::{ConversationEntry, Transcript};

pub const FALLBACK_ERROR_TEXT: &str =
    "Sorry, I couldn't reach the parts assistant just now. Please try again in a moment.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitRejection {
    #[error("submission is empty")]
    EmptyInput,
    #[error("a request is already in flight (state {state:?})")]
    Busy { state: ConversationState },
}

impl From<FlowTransitionError> for SubmitRejection {
    fn from(error: FlowTransitionError) -> Self {
        match error {
            FlowTransitionError::EmptyInput { .. } => Self::EmptyInput,
            FlowTransitionError::InvalidTransition { state, .. } => Self::Busy { state },
        }
    }
}

/// Read model handed to UIs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub session_id: String,
    pub state: ConversationState,
    pub awaiting_answer: bool,
    pub entries: Vec<ConversationEntry>,
}

#[derive(Clone, Debug)]
struct PendingExchange {
    correlation_id: String,
}

/// Owns one session: its state machine, transcript and answer service.
pub struct ConversationController<S = LocalAnswerService> {
    service: S,
    engine: FlowEngine<SingleExchangeFlow>,
    state: ConversationState,
    transcript: Transcript,
    renderer: MarkupRenderer,
    session_id: String,
    pending: Option<PendingExchange>,
    dispatch_timeout: Option<Duration>,
}

impl<S> ConversationController<S>
where
    S: AnswerService,
{
    pub fn new(service: S) -> Self {
        let engine = FlowEngine::default();
        Self {
            service,
            state: engine.initial_state(),
            engine,
            transcript: Transcript::default(),
            renderer: MarkupRenderer::default(),
            session_id: Uuid::new_v4().to_string(),
            pending: None,
            dispatch_timeout: None,
        }
    }

    pub fn with_renderer(mut self, renderer: MarkupRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Dispatches taking longer than `timeout` are failed as transport errors.
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn awaiting_answer(&self) -> bool {
        self.state.awaiting_answer()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            awaiting_answer: self.awaiting_answer(),
            entries: self.transcript.entries().to_vec(),
        }
    }

    /// Appends the user entry and moves to `AwaitingAnswer`. Blank input and
    /// submissions outside `Idle` are rejected without touching the transcript.
    pub fn begin(&mut self, text: &str) -> Result<AnswerRequest, SubmitRejection> {
        let outcome = self
            .transition(ConversationEvent::SubmissionReceived, ExchangeContext::for_input(text))
            .map_err(|error| {
                info!(
                    event_name = "conversation.submission.rejected",
                    session_id = %self.session_id,
                    reason = %error,
                    "submission rejected"
                );
                SubmitRejection::from(error)
            })?;
        self.run_actions(&outcome, Some(text), None);

        let outcome =
            self.transition(ConversationEvent::RequestDispatched, ExchangeContext::default())?;
        self.run_actions(&outcome, None, None);

        info!(
            event_name = "conversation.request.dispatched",
            session_id = %self.session_id,
            correlation_id = self.correlation_id(),
            "request dispatched"
        );
        Ok(AnswerRequest::new(text.trim()))
    }

    /// Appends the bot entry for a successful dispatch. A payload that fails
    /// validation is replaced by general guidance with a degradation note.
    pub fn resolve(&mut self, reply: AnswerReply) -> Result<&ConversationEntry, FlowTransitionError> {
        let reply = match reply.data.as_ref().map(|payload| payload.validate()) {
            Some(Err(error)) => {
                warn!(
                    event_name = "conversation.reply.degraded",
                    session_id = %self.session_id,
                    correlation_id = self.correlation_id(),
                    error = %error,
                    "reply payload failed validation"
                );
                degraded_reply()
            }
            Some(Ok(())) | None => reply,
        };

        let outcome =
            self.transition(ConversationEvent::AnswerReceived, ExchangeContext::default())?;
        self.finish(&outcome, Some(reply))
    }

    /// Records a failed dispatch. Data integrity failures degrade to general
    /// guidance; every other failure appends the fixed fallback text.
    pub fn fail(&mut self, error: &DispatchError) -> Result<&ConversationEntry, FlowTransitionError> {
        if let DispatchError::DataIntegrity(integrity) = error {
            warn!(
                event_name = "conversation.reply.degraded",
                session_id = %self.session_id,
                correlation_id = self.correlation_id(),
                error = %integrity,
                "composed payload failed validation"
            );
            return self.resolve(degraded_reply());
        }

        warn!(
            event_name = "conversation.dispatch.failed",
            session_id = %self.session_id,
            correlation_id = self.correlation_id(),
            error_kind = error.kind(),
            error = %error,
            "answer service dispatch failed"
        );
        let outcome =
            self.transition(ConversationEvent::DispatchFailed, ExchangeContext::default())?;
        self.finish(&outcome, None)
    }

    /// `begin`, dispatch to the answer service, then `resolve` or `fail`.
    pub async fn submit(&mut self, text: &str) -> Result<&ConversationEntry, SubmitRejection> {
        let request = self.begin(text)?;
        let result = match self.dispatch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.service.answer(&request))
                .await
                .unwrap_or(Err(DispatchError::Timeout(limit))),
            None => self.service.answer(&request).await,
        };

        let entry = match result {
            Ok(reply) => self.resolve(reply)?,
            Err(error) => self.fail(&error)?,
        };
        Ok(entry)
    }

    /// Starts a new session with an empty transcript. Only allowed in `Idle`.
    pub fn reset(&mut self) -> Result<(), SubmitRejection> {
        let outcome = self.transition(ConversationEvent::SessionReset, ExchangeContext::default())?;
        self.run_actions(&outcome, None, None);
        info!(
            event_name = "conversation.session.reset",
            session_id = %self.session_id,
            "session reset"
        );
        Ok(())
    }

    fn transition(
        &mut self,
        event: ConversationEvent,
        context: ExchangeContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let outcome = self.engine.apply(&self.state, &event, &context)?;
        self.state = outcome.to;
        Ok(outcome)
    }

    fn finish(
        &mut self,
        outcome: &TransitionOutcome,
        reply: Option<AnswerReply>,
    ) -> Result<&ConversationEntry, FlowTransitionError> {
        let correlation_id = self.correlation_id().to_string();
        self.run_actions(outcome, None, reply);
        self.pending = None;
        info!(
            event_name = "conversation.answer.appended",
            session_id = %self.session_id,
            correlation_id = %correlation_id,
            entries = self.transcript.len(),
            "bot entry appended"
        );
        self.transcript.last().ok_or(FlowTransitionError::InvalidTransition {
            state: self.state,
            event: outcome.event,
        })
    }

    fn run_actions(
        &mut self,
        outcome: &TransitionOutcome,
        submission: Option<&str>,
        mut reply: Option<AnswerReply>,
    ) {
        for action in &outcome.actions {
            match action {
                ExchangeAction::AppendUserEntry => {
                    if let Some(text) = submission {
                        self.transcript.append_user(text, Utc::now());
                    }
                }
                ExchangeAction::DispatchRequest => {
                    self.pending = Some(PendingExchange { correlation_id: Uuid::new_v4().to_string() });
                }
                ExchangeAction::AppendBotEntry => {
                    let reply = reply.take().unwrap_or_else(degraded_reply);
                    self.transcript.append_bot(&reply.response, reply.data, &self.renderer, Utc::now());
                }
                ExchangeAction::AppendFallbackEntry => {
                    self.transcript.append_bot(FALLBACK_ERROR_TEXT, None, &self.renderer, Utc::now());
                }
                ExchangeAction::ClearTranscript => {
                    self.transcript = Transcript::default();
                    self.session_id = Uuid::new_v4().to_string();
                }
            }
        }
    }

    fn correlation_id(&self) -> &str {
        self.pending.as_ref().map_or("", |pending| pending.correlation_id.as_str())
    }
}
