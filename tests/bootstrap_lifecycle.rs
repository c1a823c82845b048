//! Listener behaviour across bootstrap, end to end.

use std::sync::atomic::Ordering;
use std::time::Duration;

use proxy_controller::lifecycle::setup::STARTING_MESSAGE;

mod common;

use common::{start_controller, valid_config, wait_for_status, TestComponents};

#[tokio::test(flavor = "multi_thread")]
async fn test_pending_then_ready() {
    let (components, gate) = TestComponents::gated();
    let controller = start_controller(valid_config(), components).await;
    let client = reqwest::Client::new();

    for path in ["/health", "/v1/poll", "/anything"] {
        let res = client.get(controller.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 503);
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.text().await.unwrap(), STARTING_MESSAGE);
    }

    gate.send(()).unwrap();
    let body = wait_for_status(&client, &controller.url("/health"), 200).await;
    assert!(body.contains("\"status\":\"ok\""));

    let res = client.post(controller.url("/v1/poll")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(controller.url("/v1/tenants/t1/nginx")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().starts_with("# t1"));

    controller.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_bootstrap_is_served() {
    let mut config = valid_config();
    config.secret_key = "short".into();

    let components = TestComponents::new();
    let registry = components.registry.clone();
    let controller = start_controller(config, components).await;
    let client = reqwest::Client::new();

    let body = wait_for_status(&client, &controller.url("/health"), 503).await;
    let body = if body == STARTING_MESSAGE {
        // Raced the bootstrap thread; the failure lands shortly.
        tokio::time::sleep(Duration::from_millis(200)).await;
        client.get(controller.url("/health")).send().await.unwrap().text().await.unwrap()
    } else {
        body
    };
    assert!(body.starts_with("Service failed to start: configuration invalid: secret_key"));

    for path in ["/v1/poll", "/v1/tenants/t1"] {
        let res = client.get(controller.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 503);
        assert_eq!(res.text().await.unwrap(), body);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);

    controller.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_zero_interval_never_polls() {
    let mut config = valid_config();
    config.poll_interval_ms = 0;

    let components = TestComponents::new();
    let registry = components.registry.clone();
    let controller = start_controller(config, components).await;
    let client = reqwest::Client::new();

    wait_for_status(&client, &controller.url("/health"), 200).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);

    controller.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_positive_interval_polls_after_ready() {
    let mut config = valid_config();
    config.poll_interval_ms = 50;

    let components = TestComponents::new();
    let registry = components.registry.clone();
    let controller = start_controller(config, components).await;
    let client = reqwest::Client::new();

    wait_for_status(&client, &controller.url("/health"), 200).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(registry.calls.load(Ordering::SeqCst) >= 2);

    controller.stop().await;
}
