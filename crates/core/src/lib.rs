//! Core domain for the appliance parts assistant.
//!
//! - `domain` - intents, extracted entities and the tagged response payload
//! - `catalog` - parts, models and symptom records behind the `DomainLookup` trait
//! - `flows` - the per-conversation `Idle -> Sending -> AwaitingAnswer` state machine
//! - `config` - layered configuration (defaults, file, env, overrides)
//! - `errors` - domain/application/interface error mapping

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use catalog::{Appliance, Catalog, CatalogError, DomainLookup};
pub use domain::entities::ExtractedEntities;
pub use domain::intent::Intent;
pub use domain::payload::{
    CompatibilityPayload, CompatibleProduct, DataIntegrityError, DiagnosisStep, GeneralPayload,
    InstallationPayload, PartInfo, RecommendedPart, ResponsePayload, TroubleshootingPayload,
    WireResponsePayload,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{ConversationEvent, ConversationState, FlowEngine, FlowTransitionError};
