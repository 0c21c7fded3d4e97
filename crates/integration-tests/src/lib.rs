//! Test harness running a Gatekeeper server on a random local port.

pub mod inventory;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use config::Config;
use server::ServeConfig;
use tokio::net::{TcpListener, TcpStream};

/// Test client for making HTTP requests to the test server
#[derive(Clone)]
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    /// Send GET requests one after another and collect the status codes.
    pub async fn statuses(&self, path: &str, count: usize) -> Vec<u16> {
        let mut statuses = Vec::with_capacity(count);

        for _ in 0..count {
            statuses.push(self.get(path).await.status().as_u16());
        }

        statuses
    }
}

/// Builder for [`TestServer`].
pub struct TestServerBuilder {
    routes: Router,
}

impl TestServerBuilder {
    /// Replace the default inventory stub with custom application routes.
    pub fn routes(mut self, routes: Router) -> Self {
        self.routes = routes;
        self
    }

    /// Start the server with the given TOML configuration.
    pub async fn build(self, config_toml: &str) -> TestServer {
        let config: Config = toml::from_str(config_toml).unwrap();

        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let serve_config = ServeConfig {
            listen_address: address,
            config,
            routes: self.routes,
        };

        let handle = tokio::spawn(async move {
            if let Err(e) = server::serve(serve_config).await {
                eprintln!("Server failed to start: {e}");
            }
        });

        // Probe with a bare TCP connection: an HTTP request would spend a token.
        wait_for_listener(address).await;

        TestServer {
            client: TestClient::new(format!("http://{address}")),
            address,
            _handle: handle,
        }
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// A builder serving [`inventory::InventoryStub`] routes.
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder {
            routes: inventory::InventoryStub::default().router(),
        }
    }
}

/// Waits until something accepts connections on `address`.
#[allow(clippy::panic)]
pub async fn wait_for_listener(address: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(address).await.is_ok() {
            return;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    panic!("nothing is listening on {address}");
}
