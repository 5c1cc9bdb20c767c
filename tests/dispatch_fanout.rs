//! Integration tests for the dispatch fan-out against a mock HTTP service.

use aichorus::registry::{ModelParams, ServiceDescriptor, Tier};
use aichorus::{
    CallOptions, DispatchError, Dispatcher, ServiceRegistry, Target, PLACEHOLDER_CONFIDENCE,
};
use indexmap::IndexMap;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1/chat/completions";

/// Installs a subscriber so `RUST_LOG` makes dispatch logs visible.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An enabled, credentialed service entry pointing at a mock server.
fn service(uri: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        name: "Mock Service".to_string(),
        api_base: format!("{}{}", uri, ENDPOINT),
        api_key: "sk-test".to_string(),
        enabled: true,
        headers: BTreeMap::from([
            ("Authorization".to_string(), "Bearer {api_key}".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]),
        models: IndexMap::from([(
            "mock-small".to_string(),
            ModelParams {
                temperature: Some(0.2),
                max_tokens: Some(512),
                tier: Tier::Free,
            },
        )]),
    }
}

fn registry_for(uri: &str) -> ServiceRegistry {
    ServiceRegistry::new().with_service("mock", service(uri))
}

/// A well-formed chat-completions response body.
fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    })
}

#[tokio::test]
async fn test_call_parses_content_and_usage() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("All clear.")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(registry_for(&server.uri()));
    let outcome = dispatcher
        .call("mock", "mock-small", "Review this.", &CallOptions::default())
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.content, "All clear.");
    assert_eq!(outcome.confidence, PLACEHOLDER_CONFIDENCE);
    assert!(outcome.elapsed_seconds > 0.0);

    let usage = outcome.token_usage.expect("usage block should be parsed");
    assert_eq!(usage.total_tokens, 17);
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.completion_tokens, 5);
}

#[tokio::test]
async fn test_request_carries_model_credential_and_overrides() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "mock-small",
            "temperature": 0.5,
            "max_tokens": 64,
            "messages": [{"role": "user", "content": "ping"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("pong")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(registry_for(&server.uri()));
    let options = CallOptions {
        temperature: Some(0.5),
        max_tokens: Some(64),
    };
    let outcome = dispatcher.call("mock", "mock-small", "ping", &options).await;

    assert!(outcome.is_success(), "error: {:?}", outcome.error);
    assert_eq!(outcome.content, "pong");
}

#[tokio::test]
async fn test_http_error_status_becomes_remote_error() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(registry_for(&server.uri()));
    let outcome = dispatcher
        .call("mock", "mock-small", "hi", &CallOptions::default())
        .await;

    assert!(!outcome.is_success());
    assert!(outcome.content.is_empty());
    assert_eq!(outcome.confidence, 0.0);
    match outcome.error {
        Some(DispatchError::Remote { status, ref body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limit"));
        }
        ref other => panic!("expected a remote error, got {:?}", other),
    }
    let message = outcome.error.as_ref().map(ToString::to_string).unwrap_or_default();
    assert!(message.contains("HTTP 429"));
}

#[tokio::test]
async fn test_slow_service_times_out_at_the_bound() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dispatcher =
        Dispatcher::new(registry_for(&server.uri())).with_timeout(Duration::from_secs(1));
    let outcome = dispatcher
        .call("mock", "mock-small", "hi", &CallOptions::default())
        .await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error, Some(DispatchError::Timeout { seconds: 1 }));
    let message = outcome.error.as_ref().map(ToString::to_string).unwrap_or_default();
    assert!(message.contains("timed out"));

    // The call gave up at the bound instead of waiting out the delay.
    assert!(outcome.elapsed_seconds >= 1.0);
    assert!(outcome.elapsed_seconds < 2.5);
}

#[tokio::test]
async fn test_unparseable_body_becomes_transport_error() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(registry_for(&server.uri()));
    let outcome = dispatcher
        .call("mock", "mock-small", "hi", &CallOptions::default())
        .await;

    assert!(!outcome.is_success());
    assert!(matches!(outcome.error, Some(DispatchError::Transport(_))));
}

#[tokio::test]
async fn test_missing_content_is_an_empty_success() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": [{"message": {"role": "assistant"}}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(registry_for(&server.uri()));
    let outcome = dispatcher
        .call("mock", "mock-small", "hi", &CallOptions::default())
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.content, "");
    assert!(outcome.token_usage.is_none());
}

#[tokio::test]
async fn test_fanout_keeps_target_order_with_mixed_outcomes() {
    init_logging();

    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("slow but fine"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&slow)
        .await;

    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("exploded"))
        .mount(&failing)
        .await;

    let registry = ServiceRegistry::new()
        .with_service("alpha", service(&slow.uri()))
        .with_service("beta", service(&failing.uri()));
    let dispatcher = Dispatcher::new(registry);

    let targets = vec![
        Target::new("alpha", "mock-small"),
        Target::new("beta", "mock-small"),
    ];
    let outcomes = dispatcher.dispatch("hi", &targets).await;

    // One outcome per target, in target order, even though the failing
    // call finished first.
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].service, "alpha");
    assert!(outcomes[0].is_success());
    assert_eq!(outcomes[0].content, "slow but fine");
    assert_eq!(outcomes[1].service, "beta");
    assert!(matches!(
        outcomes[1].error,
        Some(DispatchError::Remote { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_network() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("unreachable")))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(registry_for(&server.uri()));
    let targets = vec![
        Target::new("ghost", "mock-small"),
        Target::new("mock", "missing-model"),
    ];
    let outcomes = dispatcher.dispatch("hi", &targets).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0].error,
        Some(DispatchError::UnknownService("ghost".to_string()))
    );
    assert_eq!(
        outcomes[1].error,
        Some(DispatchError::UnknownModel {
            service: "mock".to_string(),
            model: "missing-model".to_string(),
        })
    );
    assert_eq!(outcomes[0].elapsed_seconds, 0.0);
    assert_eq!(outcomes[1].elapsed_seconds, 0.0);
}

#[tokio::test]
async fn test_dispatch_all_covers_only_usable_services() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("covered")))
        .expect(1)
        .mount(&server)
        .await;

    let mut disabled = service("http://127.0.0.1:9");
    disabled.enabled = false;
    let registry = ServiceRegistry::new()
        .with_service("mock", service(&server.uri()))
        .with_service("off", disabled);
    let dispatcher = Dispatcher::new(registry);

    let outcomes = dispatcher.dispatch_all("hi").await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].service, "mock");
    assert_eq!(outcomes[0].model, "mock-small");
    assert!(outcomes[0].is_success());
}
