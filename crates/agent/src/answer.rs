use std::time::Duration;

use async_trait::async_trait;
use partline_core::config::AppConfig;
use partline_core::errors::{ApplicationError, DomainError};
use partline_core::{
    Catalog, DataIntegrityError, DomainLookup, ResponsePayload, WireResponsePayload,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::classify::{Classification, QueryAnalyzer};
use crate::compose::{ResponseComposer, GENERAL_GUIDANCE};

pub const DEGRADATION_NOTE: &str =
    "Some details for this answer could not be verified, so here is general guidance instead.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub message: String,
}

impl AnswerRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponsePayload>,
}

impl AnswerReply {
    pub fn from_payload(payload: ResponsePayload) -> Self {
        Self { response: payload.text().to_string(), data: Some(payload) }
    }
}

/// Reply body as sent by a remote service, before payload range checks.
#[derive(Debug, Deserialize)]
struct WireAnswerReply {
    response: String,
    #[serde(default)]
    data: Option<WireResponsePayload>,
}

impl TryFrom<WireAnswerReply> for AnswerReply {
    type Error = DataIntegrityError;

    fn try_from(wire: WireAnswerReply) -> Result<Self, Self::Error> {
        let data = wire.data.map(ResponsePayload::try_from).transpose()?;
        Ok(Self { response: wire.response, data })
    }
}

/// General guidance followed by the degradation note, used when a payload fails validation.
pub fn degraded_reply() -> AnswerReply {
    AnswerReply {
        response: format!("{GENERAL_GUIDANCE}\n\n{DEGRADATION_NOTE}"),
        data: Some(ResponsePayload::general(GENERAL_GUIDANCE)),
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("answer service transport error: {0}")]
    Transport(String),
    #[error("answer service returned status {status}")]
    Status { status: u16 },
    #[error("answer service reply could not be decoded: {0}")]
    Decode(String),
    #[error("answer service did not reply within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::Timeout(_) => "timeout",
            Self::DataIntegrity(_) => "data_integrity",
        }
    }
}

impl From<DispatchError> for ApplicationError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::DataIntegrity(error) => Self::Domain(DomainError::DataIntegrity(error)),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// The single suspension point of an exchange.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerReply, DispatchError>;
}

/// Answers in-process: extract, classify, compose.
#[derive(Clone, Debug)]
pub struct LocalAnswerService<L = Catalog> {
    analyzer: QueryAnalyzer,
    composer: ResponseComposer<L>,
}

impl<L> LocalAnswerService<L>
where
    L: DomainLookup,
{
    pub fn new(lookup: L) -> Self {
        let analyzer = QueryAnalyzer::for_lookup(&lookup);
        Self { analyzer, composer: ResponseComposer::new(lookup) }
    }

    pub fn with_analyzer(analyzer: QueryAnalyzer, lookup: L) -> Self {
        Self { analyzer, composer: ResponseComposer::new(lookup) }
    }

    pub fn analyzer(&self) -> &QueryAnalyzer {
        &self.analyzer
    }

    pub fn classify(&self, text: &str) -> Classification {
        self.analyzer.analyze(text)
    }

    pub fn compose(&self, classification: &Classification) -> Result<ResponsePayload, DataIntegrityError> {
        self.composer.compose(classification)
    }
}

#[async_trait]
impl<L> AnswerService for LocalAnswerService<L>
where
    L: DomainLookup,
{
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerReply, DispatchError> {
        let classification = self.classify(&request.message);
        debug!(
            event_name = "answer.local.classified",
            intent = %classification.intent,
            part_numbers = classification.entities.part_numbers.len(),
            model_number = classification.entities.model_number.as_deref().unwrap_or(""),
            "classified query"
        );
        let payload = self.compose(&classification)?;
        Ok(AnswerReply::from_payload(payload))
    }
}

/// Remote answer service reached with `POST {base_url}/chat`.
#[derive(Clone, Debug)]
pub struct HttpAnswerService {
    client: Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl HttpAnswerService {
    pub fn new(
        base_url: &Url,
        timeout: Duration,
        api_key: Option<SecretString>,
    ) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| DispatchError::Transport(error.to_string()))?;
        Ok(Self { client, endpoint: chat_endpoint(base_url), api_key, timeout })
    }

    /// Fails when `answer_service.base_url` is missing, so remote callers stop at startup.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let base_url = config
            .answer_service_endpoint()
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;
        Self::new(
            &base_url,
            Duration::from_secs(config.answer_service.timeout_secs),
            config.answer_service.api_key.clone(),
        )
        .map_err(ApplicationError::from)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerReply, DispatchError> {
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                DispatchError::Timeout(self.timeout)
            } else {
                DispatchError::Transport(error.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "answer.http.status",
                status = status.as_u16(),
                endpoint = %self.endpoint,
                "answer service returned a non-success status"
            );
            return Err(DispatchError::Status { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|error| {
            if error.is_timeout() {
                DispatchError::Timeout(self.timeout)
            } else {
                DispatchError::Transport(error.to_string())
            }
        })?;
        let wire = serde_json::from_slice::<WireAnswerReply>(&body)
            .map_err(|error| DispatchError::Decode(error.to_string()))?;
        Ok(AnswerReply::try_from(wire)?)
    }
}

fn chat_endpoint(base_url: &Url) -> Url {
    let mut endpoint = base_url.clone();
    let path = format!("{}/chat", base_url.path().trim_end_matches('/'));
    endpoint.set_path(&path);
    endpoint
}
