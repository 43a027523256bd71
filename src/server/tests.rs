use std::fs;

use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use axum_test::TestServer;
use impulstrip_admin_shared::{AppConfig, Timestamp};
use serde_json::Value;
use tempfile::TempDir;

use super::router;
use crate::config::ServerConfig;

const INDEX: &str = "<!doctype html><title>ImpulsTrip Admin</title>";

/// 带 index.html 与一个静态资源的临时构建目录
fn dist() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), INDEX).unwrap();
    fs::create_dir(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets/app.js"), "console.log('ok');").unwrap();
    dir
}

fn create_test_server(dist: &TempDir, require_session: bool) -> anyhow::Result<TestServer> {
    let server = ServerConfig {
        dist_dir: dist.path().to_path_buf(),
        require_session,
        ..ServerConfig::default()
    };
    let app = router(&server, &AppConfig::default())?;
    Ok(TestServer::new(app)?)
}

#[tokio::test]
async fn health_reports_ok_with_timestamp() -> anyhow::Result<()> {
    let dist = dist();
    let server = create_test_server(&dist, false)?;

    let resp = server.get("/health").await;
    assert_eq!(resp.status_code(), StatusCode::OK);

    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().unwrap_or_default();
    assert!(
        Timestamp::parse_rfc3339(timestamp).is_some(),
        "timestamp: {}",
        timestamp
    );
    Ok(())
}

#[tokio::test]
async fn serves_static_files_and_spa_fallback() -> anyhow::Result<()> {
    let dist = dist();
    let server = create_test_server(&dist, false)?;

    let asset = server.get("/assets/app.js").await;
    assert_eq!(asset.status_code(), StatusCode::OK);
    assert_eq!(asset.text(), "console.log('ok');");

    let root = server.get("/").await;
    assert_eq!(root.status_code(), StatusCode::OK);
    assert_eq!(root.text(), INDEX);

    let deep = server.get("/dashboard").await;
    assert_eq!(deep.status_code(), StatusCode::OK);
    assert_eq!(deep.text(), INDEX);
    Ok(())
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() -> anyhow::Result<()> {
    let dist = dist();
    let server = create_test_server(&dist, false)?;

    let resp = server.get("/health").await;
    let headers = resp.headers();

    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(
        headers[header::STRICT_TRANSPORT_SECURITY],
        "max-age=31536000; includeSubDomains; preload"
    );
    assert_eq!(
        headers[header::REFERRER_POLICY],
        "strict-origin-when-cross-origin"
    );

    let csp = headers[header::CONTENT_SECURITY_POLICY].to_str()?;
    assert!(csp.contains("connect-src 'self' http://localhost:8001 http://localhost:8000"));

    let id = headers["x-request-id"].to_str()?;
    assert_eq!(id.len(), 36);
    Ok(())
}

#[tokio::test]
async fn session_gate_redirects_pages_without_cookie() -> anyhow::Result<()> {
    let dist = dist();
    let server = create_test_server(&dist, true)?;

    let resp = server.get("/dashboard").await;
    assert_eq!(resp.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login");

    assert_eq!(server.get("/login").await.status_code(), StatusCode::OK);
    assert_eq!(server.get("/health").await.status_code(), StatusCode::OK);
    assert_eq!(
        server.get("/assets/app.js").await.status_code(),
        StatusCode::OK
    );

    let resp = server
        .get("/dashboard")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("adminToken=header.payload.signature"),
        )
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.text(), INDEX);
    Ok(())
}
