//! Integration tests for `ConversionsClient` using wiremock HTTP mocks.

use tact_core::MetaConfig;
use tact_meta::{hash_identity, ConversionsClient, DispatchError, RawConversionEvent, UserData};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn meta_config(token: Option<&str>) -> MetaConfig {
    MetaConfig {
        pixel_id: Some("1122334455".into()),
        access_token: token.map(str::to_owned),
        test_event_code: None,
        api_version: "v18.0".into(),
        request_timeout_secs: 5,
        max_retries: 0,
    }
}

fn test_client(config: &MetaConfig, base_url: &str) -> ConversionsClient {
    ConversionsClient::with_base_url(config, base_url).expect("client construction should not fail")
}

fn lead_event() -> RawConversionEvent {
    RawConversionEvent::new("Lead")
        .with_source_url("https://tact.example/cost-calculator")
        .with_user_data(UserData {
            phone: Some("0770 123 4567".into()),
            city: Some("بغداد".into()),
            external_id: Some("lead-42".into()),
            ..UserData::default()
        })
        .with_custom("content_name", "Kitchen Cost Calculator")
        .with_custom("currency", "IQD")
}

#[tokio::test]
async fn missing_token_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&meta_config(None), &server.uri());
    let err = client.dispatch(&lead_event()).await.unwrap_err();

    assert!(matches!(err, DispatchError::Configuration(_)));
}

#[tokio::test]
async fn dispatch_posts_hashed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v18.0/1122334455/events"))
        .and(query_param("access_token", "secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "events_received": 1,
            "messages": [],
            "fbtrace_id": "A1b2C3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&meta_config(Some("secret-token")), &server.uri());
    let outcome = client
        .dispatch(&lead_event())
        .await
        .expect("dispatch should succeed");

    assert_eq!(outcome.events_received, Some(1));
    assert_eq!(outcome.fbtrace_id.as_deref(), Some("A1b2C3"));

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = requests[0].body_json().expect("JSON body");
    let event = &body["data"][0];
    assert_eq!(event["event_name"], "Lead");
    assert_eq!(event["action_source"], "website");
    assert_eq!(
        event["event_source_url"],
        "https://tact.example/cost-calculator"
    );
    assert!(event["event_time"].as_i64().unwrap() > 1_600_000_000);
    assert_eq!(event["user_data"]["ph"][0], hash_identity("9647701234567"));
    assert_eq!(event["user_data"]["external_id"][0], hash_identity("lead-42"));
    assert_eq!(event["user_data"]["ct"][0], hash_identity("بغداد"));
    assert_eq!(event["custom_data"]["currency"], "IQD");
    assert!(body.get("test_event_code").is_none());
}

#[tokio::test]
async fn test_event_code_is_forwarded_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"events_received": 1})),
        )
        .mount(&server)
        .await;

    let mut config = meta_config(Some("t"));
    config.test_event_code = Some("TEST4242".into());
    let client = test_client(&config, &server.uri());
    client.dispatch(&lead_event()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["test_event_code"], "TEST4242");
}

#[tokio::test]
async fn upstream_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "message": "Invalid OAuth access token.", "code": 190 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&meta_config(Some("bad")), &server.uri());
    let err = client.dispatch(&lead_event()).await.unwrap_err();

    match err {
        DispatchError::Upstream { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body["error"]["code"], 190);
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = meta_config(Some("t"));
    config.max_retries = 2;
    let client = test_client(&config, &server.uri());
    let err = client.dispatch(&lead_event()).await.unwrap_err();

    assert!(matches!(err, DispatchError::Upstream { status: 503, .. }));
}
