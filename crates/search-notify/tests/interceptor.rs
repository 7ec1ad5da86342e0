//! Interceptor behavior against in-memory publishers.

use async_trait::async_trait;
use http::Method;
use search_notify::{
    FailingPublisher, Intercepted, Interceptor, NotifyOutcome, PipelineHandler,
    RecordingPublisher, RequestParts, SlowPublisher,
};
use search_notify_core::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn policy() -> AllowPolicy {
    AllowPolicy::exact(["x-user"]).with_prefix("x-object-meta-")
}

fn interceptor<P: Publisher>(publisher: P) -> Interceptor<P> {
    Interceptor::new(
        policy(),
        [Method::PUT, Method::POST],
        Duration::from_secs(1),
        publisher,
    )
}

fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn get_requests_never_reach_the_publisher() {
    let interceptor = interceptor(RecordingPublisher::new());

    let outcome = interceptor
        .observe(&Method::GET, "/v1/acct/cont/obj", &[])
        .await;

    assert!(matches!(outcome, NotifyOutcome::Skipped));
    assert_eq!(interceptor.publisher().len().await, 0);
    assert_eq!(interceptor.stats().skipped, 1);
}

#[tokio::test]
async fn put_with_empty_headers_publishes_bare_envelope() {
    let interceptor = interceptor(RecordingPublisher::new());

    let outcome = interceptor
        .observe(&Method::PUT, "/v1/acct/cont/obj", &[])
        .await;

    assert!(outcome.is_published());
    let messages = interceptor.publisher().messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, encode_id("/v1/acct/cont/obj"));
    assert_eq!(messages[0].path, "/v1/acct/cont/obj");
    assert!(messages[0].metadata.is_empty());
}

#[tokio::test]
async fn disallowed_headers_are_dropped_from_the_envelope() {
    let interceptor = interceptor(RecordingPublisher::new());

    let request_headers = headers(&[
        ("X-User", "alice"),
        ("X-Object-Meta-Color", "red"),
        ("X-Other", "drop-me"),
    ]);
    interceptor
        .observe(&Method::POST, "/v1/acct/cont/obj", &request_headers)
        .await;

    let messages = interceptor.publisher().messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].metadata.len(), 2);
    assert_eq!(messages[0].metadata["X-User"], "alice");
    assert_eq!(messages[0].metadata["X-Object-Meta-Color"], "red");
    assert!(!messages[0].metadata.contains_key("X-Other"));
}

#[tokio::test]
async fn broker_outage_is_reported_and_swallowed() {
    let interceptor = interceptor(FailingPublisher);

    let outcome = interceptor
        .observe(&Method::PUT, "/v1/acct/cont/obj", &[])
        .await;

    match outcome {
        NotifyOutcome::PublishFailed(PublishError::ConnectionFailure { .. }) => {}
        other => panic!("expected connection failure, got {other:?}"),
    }
    assert_eq!(interceptor.stats().failed, 1);
}

struct EchoHandler;

#[async_trait]
impl PipelineHandler for EchoHandler {
    type Response = String;

    async fn handle(&self, request: RequestParts) -> String {
        format!("{} {}", request.method, request.path)
    }
}

#[tokio::test]
async fn inner_handler_response_survives_publish_failure() {
    let interceptor = Arc::new(interceptor(FailingPublisher));
    let handler = Intercepted::new(EchoHandler, interceptor);

    let request = RequestParts::new(Method::PUT, "/v1/acct/cont/obj")
        .with_header("X-User", "alice");
    let response = handler.handle(request).await;

    assert_eq!(response, "PUT /v1/acct/cont/obj");
    assert_eq!(handler.interceptor().stats().failed, 1);
}

#[tokio::test]
async fn skipped_requests_still_reach_the_inner_handler() {
    let interceptor = Arc::new(interceptor(RecordingPublisher::new()));
    let handler = Intercepted::new(EchoHandler, interceptor.clone());

    let response = handler
        .handle(RequestParts::new(Method::GET, "/v1/acct/cont/obj"))
        .await;

    assert_eq!(response, "GET /v1/acct/cont/obj");
    assert_eq!(interceptor.publisher().len().await, 0);
}

#[tokio::test]
async fn hundred_concurrent_observes_all_publish() {
    let interceptor = Arc::new(interceptor(RecordingPublisher::new()));

    let tasks = (0..100).map(|i| {
        let interceptor = interceptor.clone();
        tokio::spawn(async move {
            let path = format!("/v1/acct/cont/obj-{i}");
            let request_headers = headers(&[("X-User", "alice")]);
            interceptor
                .observe(&Method::PUT, &path, &request_headers)
                .await
        })
    });

    let outcomes = futures::future::join_all(tasks).await;
    for outcome in outcomes {
        assert!(outcome.unwrap().is_published());
    }

    assert_eq!(interceptor.publisher().len().await, 100);
    let stats = interceptor.stats();
    assert_eq!(stats.received, 100);
    assert_eq!(stats.published, 100);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn slow_publisher_trips_the_attempt_timeout() {
    let interceptor = Interceptor::new(
        policy(),
        [Method::PUT],
        Duration::from_millis(50),
        SlowPublisher {
            delay: Duration::from_secs(5),
        },
    );

    let start = Instant::now();
    let outcome = interceptor
        .observe(&Method::PUT, "/v1/acct/cont/obj", &[])
        .await;

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(matches!(
        outcome,
        NotifyOutcome::PublishFailed(PublishError::Timeout { .. })
    ));
}

#[tokio::test]
async fn from_config_wires_defaults() {
    let config = NotifierConfig::default();
    let interceptor = Interceptor::from_config(&config, RecordingPublisher::new()).unwrap();

    // defaults: PUT/POST eligible, x-user and x-object-meta-* indexed
    let request_headers = headers(&[("X-User", "alice"), ("Content-Length", "3")]);
    let outcome = interceptor
        .observe(&Method::PUT, "/v1/acct/cont/obj", &request_headers)
        .await;
    assert!(outcome.is_published());

    let messages = interceptor.publisher().messages().await;
    assert_eq!(messages[0].metadata.len(), 1);
    assert_eq!(messages[0].metadata["X-User"], "alice");

    let outcome = interceptor
        .observe(&Method::DELETE, "/v1/acct/cont/obj", &[])
        .await;
    assert!(matches!(outcome, NotifyOutcome::Skipped));
}
