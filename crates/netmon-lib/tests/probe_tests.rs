//! HTTP speed probe against a local test server

use axum::{body::Bytes, http::StatusCode, routing::get, routing::post, Router};
use netmon_lib::error::ProbeError;
use netmon_lib::probe::{HttpSpeedProbe, ProbeConfig, ProbeServer, SpeedProbe};
use std::net::SocketAddr;

const DOWNLOAD_BYTES: usize = 256 * 1024;

async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn speed_router() -> Router {
    Router::new()
        .route("/down", get(|| async { vec![0u8; DOWNLOAD_BYTES] }))
        .route("/up", post(|body: Bytes| async move { body.len().to_string() }))
}

fn server(name: &str, addr: SocketAddr) -> ProbeServer {
    ProbeServer {
        name: name.to_string(),
        download_url: format!("http://{addr}/down"),
        upload_url: format!("http://{addr}/up"),
    }
}

fn probe_config(servers: Vec<ProbeServer>) -> ProbeConfig {
    ProbeConfig {
        servers,
        connections: 2,
        upload_bytes: 64 * 1024,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_probe_measures_both_directions() {
    let addr = spawn_server(speed_router()).await;
    let probe = HttpSpeedProbe::new(probe_config(vec![server("local", addr)])).unwrap();

    let raw = probe.probe().await.unwrap();

    assert!(raw.download_bps > 0.0);
    assert!(raw.upload_bps > 0.0);
}

#[tokio::test]
async fn test_best_server_skips_unreachable() {
    let addr = spawn_server(speed_router()).await;

    // Bind then drop to get a port nobody listens on
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let probe = HttpSpeedProbe::new(probe_config(vec![
        server("dead", dead),
        server("local", addr),
    ]))
    .unwrap();

    assert_eq!(probe.best_server().await.unwrap().name, "local");
}

#[tokio::test]
async fn test_no_reachable_server() {
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let probe = HttpSpeedProbe::new(probe_config(vec![server("dead", dead)])).unwrap();

    assert!(matches!(
        probe.probe().await,
        Err(ProbeError::NoReachableServer)
    ));
}

#[tokio::test]
async fn test_error_status_fails_probe() {
    let router = Router::new()
        .route("/down", get(|| async { vec![0u8; 16] }))
        .route(
            "/up",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
    let addr = spawn_server(router).await;
    let probe = HttpSpeedProbe::new(probe_config(vec![server("local", addr)])).unwrap();

    assert!(matches!(
        probe.probe().await,
        Err(ProbeError::Status { status: 503, .. })
    ));
}
