use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    Sending,
    AwaitingAnswer,
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn awaiting_answer(&self) -> bool {
        matches!(self, Self::AwaitingAnswer)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEvent {
    SubmissionReceived,
    RequestDispatched,
    AnswerReceived,
    DispatchFailed,
    SessionReset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExchangeContext {
    pub input_is_blank: bool,
}

impl ExchangeContext {
    pub fn for_input(text: &str) -> Self {
        Self { input_is_blank: text.trim().is_empty() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeAction {
    AppendUserEntry,
    DispatchRequest,
    AppendBotEntry,
    AppendFallbackEntry,
    ClearTranscript,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ConversationState,
    pub to: ConversationState,
    pub event: ConversationEvent,
    pub actions: Vec<ExchangeAction>,
}
