use std::time::Duration;

use config::Config;
use indoc::indoc;
use integration_tests::{TestServer, inventory::InventoryStub};
use serde_json::json;
use server::ServeConfig;

#[tokio::test]
async fn cold_start_burst() {
    let config = indoc! {r#"
        [server.rate_limit]
        capacity = 5
        refill_interval = "1h"
    "#};

    let server = TestServer::builder().build(config).await;
    let statuses = server.client.statuses("/inventory", 6).await;

    insta::assert_json_snapshot!(statuses, @r"
    [
      200,
      200,
      200,
      200,
      200,
      429
    ]
    ");
}

#[tokio::test]
async fn rejection_response() {
    let config = indoc! {r#"
        [server.rate_limit]
        capacity = 1
        refill_interval = "1h"
    "#};

    let server = TestServer::builder().build(config).await;

    let admitted = server.client.get("/inventory").await;
    assert_eq!(admitted.status(), 200);

    let rejected = server.client.get("/inventory").await;
    let status = rejected.status().as_u16();
    let content_type = rejected.headers()["content-type"].to_str().unwrap().to_string();
    let body: serde_json::Value = rejected.json().await.unwrap();

    insta::assert_json_snapshot!(json!({
        "body": body,
        "content_type": content_type,
        "status": status,
    }), @r#"
    {
      "body": {
        "error": "Too many requests"
      },
      "content_type": "application/json",
      "status": 429
    }
    "#);
}

#[tokio::test]
async fn refill_after_wait() {
    let config = indoc! {r#"
        [server.rate_limit]
        capacity = 5
        refill_interval = "1s"
    "#};

    let server = TestServer::builder().build(config).await;

    assert_eq!(server.client.statuses("/inventory", 5).await, vec![200; 5]);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(server.client.get("/inventory").await.status(), 200);
}

#[tokio::test]
async fn concurrent_requests_are_admitted_exactly_once_per_token() {
    let config = indoc! {r#"
        [server.rate_limit]
        capacity = 10
        refill_interval = "1h"
    "#};

    let inventory = InventoryStub::default();
    let server = TestServer::builder().routes(inventory.router()).build(config).await;

    let requests = (0..50).map(|_| {
        let client = server.client.clone();
        async move { client.get("/inventory").await.status().as_u16() }
    });

    let statuses = futures::future::join_all(requests).await;

    let admitted = statuses.iter().filter(|status| **status == 200).count();
    let rejected = statuses.iter().filter(|status| **status == 429).count();

    insta::assert_json_snapshot!(json!({
        "admitted": admitted,
        "reached_inventory": inventory.hits(),
        "rejected": rejected,
    }), @r#"
    {
      "admitted": 10,
      "reached_inventory": 10,
      "rejected": 40
    }
    "#);
}

#[tokio::test]
async fn rejected_requests_never_reach_the_inventory() {
    let config = indoc! {r#"
        [server.rate_limit]
        capacity = 3
        refill_interval = "1h"
    "#};

    let inventory = InventoryStub::default();
    let server = TestServer::builder().routes(inventory.router()).build(config).await;

    server.client.statuses("/inventory", 10).await;

    assert_eq!(inventory.hits(), 3);
}

#[tokio::test]
async fn health_endpoint_is_not_rate_limited() {
    let config = indoc! {r#"
        [server.rate_limit]
        capacity = 1
        refill_interval = "1h"
    "#};

    let server = TestServer::builder().build(config).await;

    insta::assert_json_snapshot!(json!({
        "health": server.client.statuses("/health", 5).await,
        "inventory": server.client.statuses("/inventory", 2).await,
    }), @r#"
    {
      "health": [
        200,
        200,
        200,
        200,
        200
      ],
      "inventory": [
        200,
        429
      ]
    }
    "#);
}

#[tokio::test]
async fn rate_limiting_disabled() {
    let config = indoc! {r#"
        [server.rate_limit]
        enabled = false
        capacity = 1
    "#};

    let server = TestServer::builder().build(config).await;
    let statuses = server.client.statuses("/inventory", 20).await;

    assert!(statuses.iter().all(|status| *status == 200), "{statuses:?}");
}

#[tokio::test]
async fn invalid_configuration_aborts_startup() {
    let config: Config = toml::from_str(indoc! {r#"
        [server.rate_limit]
        refill_interval = "0s"
    "#})
    .unwrap();

    let serve_config = ServeConfig {
        listen_address: "127.0.0.1:0".parse().unwrap(),
        config,
        routes: InventoryStub::default().router(),
    };

    let error = server::serve(serve_config).await.unwrap_err();

    insta::assert_snapshot!(error, @"Rate limit refill interval must be greater than zero");
}
