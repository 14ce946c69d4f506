//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use addr_vault::config::VaultConfig;
use addr_vault::entitlements::EntitlementTable;
use addr_vault::http::VaultServer;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;

/// The table used throughout the integration tests.
pub const TEST_ALLOWED_IPS: &str = "123.123.123.123>abc=def&ghi=jkl,127.0.0.1>def=2,\
124.124.124.124>mno=pqr,2a02:0110:68a5:0000:0000:c24:0000:0001>stu=vwy";

pub fn test_config(allowed_ips: &str) -> VaultConfig {
    let mut config = VaultConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config.entitlements.allowed_ips = allowed_ips.to_string();
    config
}

pub fn server(config: VaultConfig) -> VaultServer {
    let table = EntitlementTable::from_config_str(&config.entitlements.allowed_ips).unwrap();
    VaultServer::new(config, Arc::new(table))
}

pub fn router(allowed_ips: &str) -> Router {
    server(test_config(allowed_ips)).router()
}

/// Drive the router in-process and collect status, headers and body text.
#[allow(dead_code)]
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

/// `GET <path>` with the given headers.
#[allow(dead_code)]
pub fn get(path: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

/// Serve on an ephemeral port. Dropping the sender stops the server.
#[allow(dead_code)]
pub async fn spawn_vault(config: VaultConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let server = server(config);
    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    (addr, tx)
}
