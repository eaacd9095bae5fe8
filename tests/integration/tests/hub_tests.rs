//! Hub Integration Tests
//!
//! Every test runs against in-process backends except the cross-instance
//! test, which needs a Redis instance at REDIS_URL.
//!
//! Run with: cargo test -p integration-tests --test hub_tests

use async_trait::async_trait;
use hub_cache::{MemoryPresenceManager, MemoryPubSub};
use hub_core::{HubResult, Message};
use hub_gateway::connection::Connection;
use hub_gateway::middleware::Middleware;
use hub_gateway::HubService;
use hub_store::MemoryAdapter;
use integration_tests::{assert_json, fixtures::*, redis_url, test_config, TestServer};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// HTTP Routes
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_stats_counts_connections_and_documents() {
    let server = TestServer::start().await.expect("Failed to start server");
    let collection = unique_record_collection();

    let mut client = server.connect("u1").await.unwrap();
    let ack = client.request(&create(&collection, "rec1", json!({}))).await.unwrap();
    assert!(ack.get("error").is_none(), "create failed: {ack}");

    let response = server.get("/stats").await.unwrap();
    let stats: StatsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.documents, 1);
    assert!(stats.timestamp > 0);
}

// ============================================================================
// Protocol
// ============================================================================

#[tokio::test]
async fn test_handshake() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect("u1").await.unwrap();

    let reply = client.request(&handshake()).await.unwrap();
    assert_eq!(reply["a"], "hs");
    assert_eq!(reply["data"]["protocol"], "1.0.0");
    assert!(reply["data"]["id"].as_str().unwrap().starts_with("conn_"));
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect("u1").await.unwrap();

    client.send_raw("{not json").await.unwrap();
    client.expect_silence(Duration::from_millis(200)).await.unwrap();

    let reply = client.request(&handshake()).await.unwrap();
    assert_eq!(reply["a"], "hs");
}

#[tokio::test]
async fn test_unknown_action() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect("u1").await.unwrap();

    let reply = client.request(&json!({"a": "zz"})).await.unwrap();
    assert_eq!(reply["a"], "zz");
    assert_eq!(reply["error"]["code"], 400);

    let reply = client.request(&handshake()).await.unwrap();
    assert_eq!(reply["a"], "hs");
}

#[tokio::test]
async fn test_create_edit_fetch() {
    let server = TestServer::start().await.unwrap();
    let collection = unique_record_collection();
    let mut client = server.connect("u1").await.unwrap();

    let reply = client.request(&fetch(&collection, "rec1")).await.unwrap();
    assert_eq!(reply["error"]["code"], 404);

    client
        .request(&create(&collection, "rec1", json!({"name": "a"})))
        .await
        .unwrap();
    let ack = client
        .request(&edit(&collection, "rec1", 1, json!([{"p": ["name"], "od": "a", "oi": "b"}])))
        .await
        .unwrap();
    assert_eq!(ack, json!({"a": "op", "c": collection, "d": "rec1", "v": 1}));

    let reply = client.request(&fetch(&collection, "rec1")).await.unwrap();
    assert_eq!(reply["data"]["v"], 2);
    assert_eq!(reply["data"]["type"], "json0");
}

#[tokio::test]
async fn test_stale_version_conflicts() {
    let server = TestServer::start().await.unwrap();
    let collection = unique_record_collection();
    let mut client = server.connect("u1").await.unwrap();

    client.request(&create(&collection, "rec1", json!({}))).await.unwrap();
    client.request(&edit(&collection, "rec1", 1, json!([]))).await.unwrap();

    let reply = client.request(&edit(&collection, "rec1", 1, json!([]))).await.unwrap();
    assert_eq!(reply["error"]["code"], 409);
}

#[tokio::test]
async fn test_non_record_op_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect("u1").await.unwrap();

    let reply = client
        .request(&edit("fld_tbl1", "fld1", 0, json!([{"p": ["name"]}])))
        .await
        .unwrap();
    assert_eq!(reply["error"]["code"], 403);
    assert_eq!(server.service().documents().count(), 0);
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test]
async fn test_subscribers_receive_operations() {
    let server = TestServer::start().await.unwrap();
    let collection = unique_record_collection();

    let mut writer = server.connect("u1").await.unwrap();
    let mut doc_reader = server.connect("u2").await.unwrap();
    let mut collection_reader = server.connect("u3").await.unwrap();

    let ack = doc_reader.request(&subscribe(&collection, "rec1")).await.unwrap();
    assert_eq!(ack, json!({"a": "s", "c": collection, "d": "rec1"}));
    collection_reader
        .request(&subscribe_collection(&collection))
        .await
        .unwrap();

    writer.request(&create(&collection, "rec1", json!({}))).await.unwrap();
    let created = doc_reader.recv().await.unwrap();
    assert_eq!(created["a"], "op");
    assert_eq!(created["create"]["type"], "json0");
    collection_reader.recv().await.unwrap();

    let op = json!([{"p": ["name"], "oi": "x"}]);
    writer.request(&edit(&collection, "rec1", 1, op.clone())).await.unwrap();

    let delivered = doc_reader.recv().await.unwrap();
    assert_eq!(
        delivered,
        json!({"a": "op", "c": collection, "d": "rec1", "v": 1, "op": op})
    );
    assert_eq!(collection_reader.recv().await.unwrap(), delivered);
}

#[tokio::test]
async fn test_closed_subscriber_stops_receiving() {
    let server = TestServer::start().await.unwrap();
    let collection = unique_record_collection();

    let mut writer = server.connect("u1").await.unwrap();
    let mut reader = server.connect("u2").await.unwrap();
    reader.request(&subscribe(&collection, "rec1")).await.unwrap();
    reader.close().await.unwrap();

    // Wait for the server to release the connection
    for _ in 0..50 {
        if server.service().registry().count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.service().registry().count(), 1);

    let ack = writer.request(&create(&collection, "rec1", json!({}))).await.unwrap();
    assert!(ack.get("error").is_none());
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_presence_set_is_shared() {
    let server = TestServer::start().await.unwrap();
    let collection = unique_record_collection();

    let mut alice = server.connect("alice").await.unwrap();
    let mut bob = server.connect("bob").await.unwrap();

    alice
        .request(&presence(&collection, "rec1", json!({"cursor": 1})))
        .await
        .unwrap();
    let reply = bob
        .request(&presence(&collection, "rec1", json!({"cursor": 2})))
        .await
        .unwrap();

    assert_eq!(reply["a"], "p");
    let entries = reply["presence"].as_object().unwrap();
    assert_eq!(entries.len(), 2);
    let users: Vec<&str> = entries
        .values()
        .map(|entry| entry["userId"].as_str().unwrap())
        .collect();
    assert!(users.contains(&"alice"));
    assert!(users.contains(&"bob"));

    alice.close().await.unwrap();
    for _ in 0..50 {
        if server.service().registry().count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let reply = bob
        .request(&presence(&collection, "rec1", json!({"cursor": 3})))
        .await
        .unwrap();
    assert_eq!(reply["presence"].as_object().unwrap().len(), 1);
}

// ============================================================================
// Upgrade and lifecycle
// ============================================================================

#[tokio::test]
async fn test_disallowed_origin_is_refused() {
    let server = TestServer::start_with(&[("CORS_ALLOWED_ORIGINS", "https://app.example.com")])
        .await
        .unwrap();

    let mut request = server.socket_url("u1").into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://evil.example.com".parse().unwrap());

    match tokio_tungstenite::connect_async(request).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        Err(e) => panic!("expected 403, got {e}"),
        Ok(_) => panic!("expected 403, upgrade succeeded"),
    }

    let mut request = server.socket_url("u1").into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://app.example.com".parse().unwrap());
    assert!(tokio_tungstenite::connect_async(request).await.is_ok());
}

#[tokio::test]
async fn test_shutdown_closes_sockets() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect("u1").await.unwrap();
    client.request(&handshake()).await.unwrap();

    server.shutdown().await.unwrap();

    assert!(client.recv().await.is_err());
}

/// Panics on frames whose action is `boom`
struct PanicOnMarker;

#[async_trait]
impl Middleware for PanicOnMarker {
    fn name(&self) -> &'static str {
        "panic-on-marker"
    }

    async fn handle(&self, _: &CancellationToken, _: &Connection, message: &Message) -> HubResult<()> {
        if message.action == "boom" {
            panic!("marker frame");
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_connection_fault_is_contained() {
    let service = HubService::builder()
        .adapter(Arc::new(MemoryAdapter::new()))
        .pubsub(Arc::new(MemoryPubSub::new()))
        .presence(Arc::new(MemoryPresenceManager::new()))
        .middleware(Arc::new(PanicOnMarker))
        .build()
        .unwrap();
    let server = TestServer::start_with_service(service, test_config(&[]).unwrap())
        .await
        .unwrap();

    let mut faulty = server.connect("u1").await.unwrap();
    let mut healthy = server.connect("u2").await.unwrap();
    faulty.request(&handshake()).await.unwrap();

    faulty.send(&json!({"a": "boom"})).await.unwrap();
    assert!(faulty.recv().await.is_err());

    // Only the faulty connection is released
    for _ in 0..50 {
        if server.service().registry().count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.service().registry().count(), 1);

    let reply = healthy.request(&handshake()).await.unwrap();
    assert_eq!(reply["a"], "hs");
    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut fresh = server.connect("u3").await.unwrap();
    assert_eq!(fresh.request(&handshake()).await.unwrap()["a"], "hs");
}

#[tokio::test]
async fn test_cross_instance_fan_out() {
    let Some(url) = redis_url() else {
        return;
    };
    let prefix = format!("test{}:", unique_suffix());
    let vars = [("REDIS_URL", url.as_str()), ("PUBSUB_PREFIX", prefix.as_str())];

    let first = TestServer::start_with(&vars).await.unwrap();
    let second = TestServer::start_with(&vars).await.unwrap();
    let collection = unique_record_collection();

    let mut reader = second.connect("u2").await.unwrap();
    reader.request(&subscribe(&collection, "rec1")).await.unwrap();

    // Documents live in each instance's own adapter; create on the writer's side
    let mut writer = first.connect("u1").await.unwrap();
    writer.request(&create(&collection, "rec1", json!({}))).await.unwrap();

    let delivered = reader.recv().await.unwrap();
    assert_eq!(delivered["a"], "op");
    assert_eq!(delivered["c"], collection.as_str());
    assert_eq!(delivered["d"], "rec1");
}
