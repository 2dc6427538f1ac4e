//! Router-level tests using `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use alexa_assistant_bridge::config::BridgeConfig;
use alexa_assistant_bridge::core::assistant::MicrophoneMode;
use alexa_assistant_bridge::routes::skill::create_skill_router;

use common::{Script, complete_config, harness};

fn app(config: BridgeConfig) -> Router {
    let h = harness(config, Script::reply(MicrophoneMode::Closed, vec![]));
    create_skill_router().with_state(h.state)
}

fn launch_body(application_id: &str) -> String {
    json!({
        "version": "1.0",
        "session": {
            "sessionId": "s-1",
            "application": { "applicationId": application_id },
            "user": { "userId": "u", "accessToken": "token" }
        },
        "request": { "type": "LaunchRequest", "requestId": "r-1" }
    })
    .to_string()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app(complete_config())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "OK" }));
}

#[tokio::test]
async fn test_launch_on_both_paths() {
    for path in ["/", "/alexa"] {
        let response = app(complete_config())
            .oneshot(post(path, launch_body("amzn1.ask.skill.test")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["version"], "1.0");
        assert_eq!(body["response"]["outputSpeech"]["text"], "How may I help?");
        assert_eq!(body["response"]["shouldEndSession"], false);
    }
}

#[tokio::test]
async fn test_wrong_application_id_is_rejected() {
    let mut config = complete_config();
    config.alexa_app_id = Some("amzn1.ask.skill.mine".into());

    let response = app(config)
        .oneshot(post("/alexa", launch_body("amzn1.ask.skill.someone-else")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("application id"));
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let response = app(complete_config())
        .oneshot(post("/alexa", "{not json".to_string()))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
