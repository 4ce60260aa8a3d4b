//! Role authorization against live servers and misbehaving stores.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{spawn_server, spawn_server_with_store, test_config};
use recipe_api::auth::{Principal, PrincipalId, Role};
use recipe_api::store::{PrincipalStore, StoreError};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Answers every lookup after `delay`, with a fixed record.
struct SlowStore {
    delay: Duration,
}

#[async_trait]
impl PrincipalStore for SlowStore {
    async fn find_with_role(&self, id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(Principal {
            id: id.clone(),
            name: "slow".into(),
            email: "slow@example.com".into(),
            role: Some(Role {
                code: "ADMIN".into(),
                name: "Administrator".into(),
            }),
            created_at: chrono::Utc::now(),
        }))
    }

    async fn insert(&self, _principal: Principal) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".into()))
    }

    async fn set_role(&self, _id: &PrincipalId, _role: Role) -> Result<Option<Principal>, StoreError> {
        Err(StoreError::Unavailable("read-only".into()))
    }

    async fn list(&self) -> Result<Vec<Principal>, StoreError> {
        Ok(Vec::new())
    }
}

/// Fails every call.
struct BrokenStore;

#[async_trait]
impl PrincipalStore for BrokenStore {
    async fn find_with_role(&self, _id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _principal: Principal) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set_role(&self, _id: &PrincipalId, _role: Role) -> Result<Option<Principal>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn list(&self) -> Result<Vec<Principal>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_role_matrix() {
    let server = spawn_server(test_config()).await;

    // (user, path, expected)
    let cases = [
        (None, "/users", StatusCode::UNAUTHORIZED),
        (Some("client"), "/users", StatusCode::FORBIDDEN),
        (Some("mod"), "/users", StatusCode::FORBIDDEN),
        (Some("admin"), "/users", StatusCode::OK),
        (None, "/users/me", StatusCode::UNAUTHORIZED),
        (Some("roleless"), "/users/me", StatusCode::FORBIDDEN),
        (Some("unknown-user"), "/users/me", StatusCode::FORBIDDEN),
        (Some("client"), "/users/me", StatusCode::OK),
        (Some("mod"), "/pantry", StatusCode::OK),
        (None, "/recipes", StatusCode::OK),
        (None, "/products", StatusCode::OK),
    ];

    for (user, path, expected) in cases {
        let mut req = server.client.get(server.url(path));
        if let Some(user) = user {
            req = req.bearer_auth(server.token_for(user));
        }
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), expected, "{user:?} GET {path}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_denial_body_shape() {
    let server = spawn_server(test_config()).await;

    let res = server.client.get(server.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["error"], "Unauthorized");

    let res = server
        .client
        .get(server.url("/users"))
        .bearer_auth(server.token_for("client"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["statusCode"], 403);
    assert_eq!(body["error"], "Forbidden");

    server.stop().await;
}

#[tokio::test]
async fn test_token_from_other_secret_is_unauthenticated() {
    let server = spawn_server(test_config()).await;

    let mut other = test_config();
    other.auth.jwt_secret = "a-different-secret".into();
    let forged = recipe_api::auth::TokenCodec::new(&other.auth)
        .issue(&PrincipalId::new("admin"))
        .unwrap();

    let res = server
        .client
        .get(server.url("/users"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    server.stop().await;
}

#[tokio::test]
async fn test_slow_store_denied_after_timeout() {
    let mut config = test_config();
    config.auth.lookup_timeout_ms = 50;
    let server = spawn_server_with_store(
        config,
        Arc::new(SlowStore {
            delay: Duration::from_secs(2),
        }),
    )
    .await;

    let started = std::time::Instant::now();
    let res = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(server.token_for("anyone"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(started.elapsed() < Duration::from_secs(1));

    server.stop().await;
}

#[tokio::test]
async fn test_slow_store_within_timeout_allows() {
    let mut config = test_config();
    config.auth.lookup_timeout_ms = 1000;
    let server = spawn_server_with_store(
        config,
        Arc::new(SlowStore {
            delay: Duration::from_millis(20),
        }),
    )
    .await;

    let res = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(server.token_for("anyone"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn test_store_failure_denies_but_open_routes_work() {
    let server = spawn_server_with_store(test_config(), Arc::new(BrokenStore)).await;

    let res = server
        .client
        .get(server.url("/users/me"))
        .bearer_auth(server.token_for("admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.get(server.url("/recipes")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .post(server.url("/users"))
        .json(&json!({"name": "Ada", "email": "ada@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    server.stop().await;
}

#[tokio::test]
async fn test_promotion_takes_effect_immediately() {
    let server = spawn_server(test_config()).await;
    let client_token = server.token_for("client");

    let res = server
        .client
        .delete(server.url(&format!("/recipes/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&client_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .put(server.url("/users/client/role"))
        .bearer_auth(server.token_for("admin"))
        .json(&json!({"role": "MODERATOR"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Same token, new role: the principal is reloaded on every request.
    let res = server
        .client
        .delete(server.url(&format!("/recipes/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&client_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}
