//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, making HTTP requests,
//! and driving WebSocket clients.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use hub_common::AppConfig;
use hub_gateway::{create_hub_service, serve, GatewayState, HubService};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a client waits for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    service: Arc<HubService>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with in-process backends
    pub async fn start() -> Result<Self> {
        Self::start_with(&[]).await
    }

    /// Start a server with extra configuration variables
    pub async fn start_with(vars: &[(&str, &str)]) -> Result<Self> {
        Self::start_with_config(test_config(vars)?).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let service = create_hub_service(&config).await?;
        Self::start_with_service(service, config).await
    }

    /// Start a test server around a service assembled by the test
    pub async fn start_with_service(service: HubService, config: AppConfig) -> Result<Self> {
        let service = Arc::new(service);
        let state = GatewayState::new(Arc::clone(&service), config.websocket, config.cors);

        // Bind to an ephemeral port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            serve(listener, state).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            service,
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for a user
    pub fn socket_url(&self, user_id: &str) -> String {
        format!("ws://{}/socket?user_id={user_id}", self.addr)
    }

    pub fn service(&self) -> &HubService {
        &self.service
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a WebSocket connection as `user_id`
    pub async fn connect(&self, user_id: &str) -> Result<TestClient> {
        let (stream, _) = connect_async(self.socket_url(user_id))
            .await
            .context("WebSocket connect failed")?;
        Ok(TestClient { stream })
    }

    /// Stop the server and wait for it to finish
    pub async fn shutdown(self) -> Result<()> {
        self.service.scope().cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .context("server did not stop")??;
        Ok(())
    }
}

/// WebSocket client speaking the hub protocol
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Send one JSON frame
    pub async fn send(&mut self, frame: &Value) -> Result<()> {
        self.stream
            .send(WsMessage::Text(serde_json::to_string(frame)?))
            .await?;
        Ok(())
    }

    /// Send raw text
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(WsMessage::Text(text.to_string())).await?;
        Ok(())
    }

    /// Receive the next JSON frame, skipping control frames
    pub async fn recv(&mut self) -> Result<Value> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for frame")?
                .context("connection closed")??;

            match frame {
                WsMessage::Text(text) => return Ok(serde_json::from_str(&text)?),
                WsMessage::Close(_) => anyhow::bail!("connection closed by server"),
                _ => {}
            }
        }
    }

    /// Send a frame and wait for the response
    pub async fn request(&mut self, frame: &Value) -> Result<Value> {
        self.send(frame).await?;
        self.recv().await
    }

    /// Assert that nothing arrives within `wait`
    pub async fn expect_silence(&mut self, wait: Duration) -> Result<()> {
        match tokio::time::timeout(wait, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => anyhow::bail!("unexpected frame: {frame:?}"),
        }
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Create a test configuration from explicit variables only
///
/// The process environment is ignored, so tests run against in-process
/// backends unless a test passes `REDIS_URL` itself.
pub fn test_config(vars: &[(&str, &str)]) -> Result<AppConfig> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    AppConfig::from_lookup(|key| vars.get(key).cloned())
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))
}

/// Redis URL for tests that need a shared broker, if one is available
pub fn redis_url() -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("REDIS_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: REDIS_URL not set");
            None
        }
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}
