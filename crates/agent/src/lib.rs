//! Query analysis and conversation sequencing for the parts assistant.
//!
//! One exchange flows through:
//! 1. **Extraction** (`extract`) - part and model numbers found by structural patterns
//! 2. **Classification** (`classify`) - ordered `(predicate, intent)` rules, first match wins
//! 3. **Composition** (`compose`) - a typed payload built from `DomainLookup` facts
//! 4. **Answering** (`answer`) - the `AnswerService` boundary, local or over HTTP
//! 5. **Sequencing** (`controller`) - the per-session state machine and transcript
//!
//! Nothing past the answer service boundary can fail the caller: transport
//! failures become a fallback bot entry and invalid payloads degrade to general
//! guidance.

pub mod answer;
pub mod classify;
pub mod compose;
pub mod controller;
pub mod extract;
pub mod transcript;

pub use answer::{
    degraded_reply, AnswerReply, AnswerRequest, AnswerService, DispatchError, HttpAnswerService,
    LocalAnswerService, DEGRADATION_NOTE,
};
pub use classify::{Classification, IntentClassifier, QueryAnalyzer, Rule, RuleVocabulary};
pub use compose::{ResponseComposer, GENERAL_GUIDANCE};
pub use controller::{
    ConversationController, ConversationSnapshot, SubmitRejection, FALLBACK_ERROR_TEXT,
};
pub use extract::{EntityExtractor, ExtractionPatterns, PatternExtractor};
pub use transcript::{ConversationEntry, Role, Transcript};
