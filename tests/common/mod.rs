//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use recipe_api::auth::{PrincipalId, TokenCodec};
use recipe_api::config::PrincipalSeed;
use recipe_api::lifecycle::startup::seed_principals;
use recipe_api::store::{InMemoryPrincipalStore, PrincipalStore};
use recipe_api::{AppConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub tokens: Arc<TokenCodec>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn token_for(&self, user: &str) -> String {
        self.tokens.issue(&PrincipalId::new(user)).unwrap()
    }

    /// Stop the server and wait for it to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}

pub fn seed(id: &str, role: Option<&str>) -> PrincipalSeed {
    PrincipalSeed {
        id: id.to_string(),
        name: id.to_string(),
        email: format!("{id}@example.com"),
        role: role.map(String::from),
    }
}

/// Config with one principal per role plus one without a role.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.principals = vec![
        seed("admin", Some("ADMIN")),
        seed("mod", Some("MODERATOR")),
        seed("client", Some("CLIENT")),
        seed("roleless", None),
    ];
    config
}

/// Start the server with an in-memory store seeded from `config`.
pub async fn spawn_server(config: AppConfig) -> TestServer {
    let store = InMemoryPrincipalStore::new();
    seed_principals(&store, &config.principals).await.unwrap();
    spawn_server_with_store(config, Arc::new(store)).await
}

/// Start the server against a caller-supplied store.
pub async fn spawn_server_with_store(config: AppConfig, store: Arc<dyn PrincipalStore>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, store);
    let tokens = server.tokens().clone();
    let shutdown = Shutdown::new();
    let stop = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.run(listener, &stop).await.unwrap();
    });

    TestServer {
        addr,
        tokens,
        client: reqwest::Client::new(),
        shutdown,
        handle,
    }
}
