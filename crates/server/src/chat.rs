use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use partline_agent::{degraded_reply, AnswerReply, AnswerRequest, AnswerService, DispatchError};
use partline_core::errors::{ApplicationError, DomainError, InterfaceError};
use partline_core::flows::{ConversationState, FlowTransitionError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    service: Arc<dyn AnswerService>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub response: String,
}

pub fn router(service: Arc<dyn AnswerService>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { service })
}

pub async fn chat(
    State(state): State<ChatState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<AnswerReply>, (StatusCode, Json<ErrorBody>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let message = payload.map(|Json(request)| request.message).unwrap_or_default();

    if message.trim().is_empty() {
        let error = ApplicationError::from(DomainError::from(FlowTransitionError::EmptyInput {
            state: ConversationState::Idle,
        }));
        return Err(reject(error.into_interface(&correlation_id)));
    }

    info!(
        event_name = "http.chat.received",
        correlation_id = %correlation_id,
        length = message.len(),
        "chat request received"
    );

    match state.service.answer(&AnswerRequest::new(message)).await {
        Ok(reply) => Ok(Json(reply)),
        Err(DispatchError::DataIntegrity(error)) => {
            warn!(
                event_name = "http.chat.degraded",
                correlation_id = %correlation_id,
                error = %error,
                "answer failed validation, returning general guidance"
            );
            Ok(Json(degraded_reply()))
        }
        Err(error) => Err(reject(ApplicationError::from(error).into_interface(&correlation_id))),
    }
}

fn reject(error: InterfaceError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "http.chat.rejected",
        correlation_id = %error.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "chat request rejected"
    );
    (status, Json(ErrorBody { response: error.user_message().to_string() }))
}
