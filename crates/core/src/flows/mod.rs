pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, SingleExchangeFlow};
pub use states::{
    ConversationEvent, ConversationState, ExchangeAction, ExchangeContext, TransitionOutcome,
};
