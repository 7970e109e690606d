use thiserror::Error;

use crate::flows::states::{
    ConversationEvent, ConversationState, ExchangeAction, ExchangeContext, TransitionOutcome,
};

pub trait FlowDefinition {
    fn initial_state(&self) -> ConversationState;
    fn transition(
        &self,
        current: &ConversationState,
        event: &ConversationEvent,
        context: &ExchangeContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// `Idle -> Sending -> AwaitingAnswer -> Idle`, one exchange at a time.
#[derive(Clone, Debug, Default)]
pub struct SingleExchangeFlow;

impl FlowDefinition for SingleExchangeFlow {
    fn initial_state(&self) -> ConversationState {
        ConversationState::Idle
    }

    fn transition(
        &self,
        current: &ConversationState,
        event: &ConversationEvent,
        context: &ExchangeContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_single_exchange(current, event, context)
    }
}

#[derive(Clone, Debug)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> ConversationState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &ConversationState,
        event: &ConversationEvent,
        context: &ExchangeContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for FlowEngine<SingleExchangeFlow> {
    fn default() -> Self {
        Self::new(SingleExchangeFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("blank submission rejected in state {state:?}")]
    EmptyInput { state: ConversationState },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: ConversationState, event: ConversationEvent },
}

fn transition_single_exchange(
    current: &ConversationState,
    event: &ConversationEvent,
    context: &ExchangeContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use ConversationEvent::{
        AnswerReceived, DispatchFailed, RequestDispatched, SessionReset, SubmissionReceived,
    };
    use ConversationState::{AwaitingAnswer, Idle, Sending};
    use ExchangeAction::{
        AppendBotEntry, AppendFallbackEntry, AppendUserEntry, ClearTranscript, DispatchRequest,
    };

    let (to, actions) = match (current, event) {
        (Idle, SubmissionReceived) => {
            if context.input_is_blank {
                return Err(FlowTransitionError::EmptyInput { state: *current });
            }
            (Sending, vec![AppendUserEntry])
        }
        (Sending, RequestDispatched) => (AwaitingAnswer, vec![DispatchRequest]),
        (AwaitingAnswer, AnswerReceived) => (Idle, vec![AppendBotEntry]),
        (AwaitingAnswer, DispatchFailed) => (Idle, vec![AppendFallbackEntry]),
        (Idle, SessionReset) => (Idle, vec![ClearTranscript]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: *current, event: *event });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}
