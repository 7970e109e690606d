use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use partline_agent::{
    AnswerReply, AnswerRequest, AnswerService, ConversationController, DispatchError,
    HttpAnswerService, DEGRADATION_NOTE, FALLBACK_ERROR_TEXT,
};
use partline_core::DataIntegrityError;
use partline_core::{Intent, ResponsePayload};
use secrecy::SecretString;
use tokio::net::TcpListener;
use url::Url;

async fn spawn(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let address = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    Url::parse(&format!("http://{address}")).expect("server url")
}

fn service(base_url: &Url, api_key: Option<&str>) -> HttpAnswerService {
    HttpAnswerService::new(
        base_url,
        Duration::from_secs(2),
        api_key.map(|key| SecretString::from(key.to_string())),
    )
    .expect("client builds")
}

async fn echo(Json(request): Json<AnswerRequest>) -> Json<AnswerReply> {
    Json(AnswerReply {
        response: format!("**You asked**\n{}", request.message),
        data: Some(ResponsePayload::general(format!("You asked: {}", request.message))),
    })
}

#[tokio::test]
async fn successful_reply_is_decoded() {
    let base = spawn(Router::new().route("/chat", post(echo))).await;
    let reply = service(&base, None)
        .answer(&AnswerRequest::new("Where is my model number?"))
        .await
        .expect("reply");
    assert_eq!(reply.response, "**You asked**\nWhere is my model number?");
    assert_eq!(reply.data.map(|payload| payload.intent()), Some(Intent::General));
}

#[tokio::test]
async fn server_error_becomes_fallback_entry() {
    let router = Router::new()
        .route("/chat", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
    let base = spawn(router).await;

    let mut controller = ConversationController::new(service(&base, None));
    let entry = controller.submit("How do I install part PS11752778?").await.expect("accepted");
    assert_eq!(entry.text(), FALLBACK_ERROR_TEXT);
    assert_eq!(controller.transcript().len(), 2);
    assert!(controller.state().is_idle());
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let base = spawn(Router::new().route("/chat", post(|| async { "definitely not json" }))).await;
    let error = service(&base, None)
        .answer(&AnswerRequest::new("hello"))
        .await
        .expect_err("decode fails");
    assert!(matches!(error, DispatchError::Decode(_)), "unexpected error: {error}");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);

    let base = Url::parse(&format!("http://{address}")).expect("url");
    let error = service(&base, None)
        .answer(&AnswerRequest::new("hello"))
        .await
        .expect_err("connection refused");
    assert!(matches!(error, DispatchError::Transport(_) | DispatchError::Timeout(_)));
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    let router = Router::new().route(
        "/chat",
        post(|headers: HeaderMap, Json(request): Json<AnswerRequest>| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == "Bearer test-key");
            if !authorized {
                return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(Json(AnswerReply { response: request.message, data: None }))
        }),
    );
    let base = spawn(router).await;

    let error = service(&base, None)
        .answer(&AnswerRequest::new("hi"))
        .await
        .expect_err("missing token");
    assert!(matches!(error, DispatchError::Status { status: 401 }));

    let reply = service(&base, Some("test-key"))
        .answer(&AnswerRequest::new("hi"))
        .await
        .expect("authorized");
    assert_eq!(reply.response, "hi");
}

fn compatibility_reply(fix_rate: i64) -> serde_json::Value {
    serde_json::json!({
        "response": "**Parts compatible with Whirlpool WDT780SAEM1**",
        "data": {
            "intent": "compatibility",
            "text": "**Parts compatible with Whirlpool WDT780SAEM1**",
            "products": [{
                "partNumber": "PS11746591",
                "name": "Rack Track Stop",
                "price": "10.95",
                "compatibilityLabel": "Direct fit",
                "fixRatePercent": fix_rate,
            }],
        },
    })
}

#[tokio::test]
async fn out_of_range_fix_rates_degrade_instead_of_falling_back() {
    for fix_rate in [140_i64, 300, -5] {
        let router = Router::new().route(
            "/chat",
            post(move || async move { Json(compatibility_reply(fix_rate)) }),
        );
        let base = spawn(router).await;

        let error = service(&base, None)
            .answer(&AnswerRequest::new("Is this compatible with WDT780SAEM1?"))
            .await
            .expect_err("integrity failure");
        assert!(
            matches!(
                &error,
                DispatchError::DataIntegrity(DataIntegrityError::FixRateOutOfRange { value, .. })
                    if *value == fix_rate
            ),
            "unexpected error for {fix_rate}: {error}"
        );

        let mut controller = ConversationController::new(service(&base, None));
        let entry =
            controller.submit("Is this compatible with WDT780SAEM1?").await.expect("accepted");
        assert!(entry.text().ends_with(DEGRADATION_NOTE), "fix rate {fix_rate} did not degrade");
        assert_ne!(entry.text(), FALLBACK_ERROR_TEXT);
        assert!(matches!(entry.payload(), Some(ResponsePayload::General(_))));
        assert!(controller.state().is_idle());
    }
}
