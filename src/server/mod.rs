//! 管理后台静态资源服务器
//!
//! 提供构建产物、SPA 回退到 `index.html`、`/health` 健康检查，
//! 以及安全头、压缩、请求 ID 与请求追踪。

mod http_server;
mod security;
mod session_gate;
mod shutdown;

use std::sync::Arc;

use axum::http::{HeaderName, Request};
use axum::routing::get;
use axum::{Json, Router, middleware};
use impulstrip_admin_shared::models::HealthStatus;
use impulstrip_admin_shared::{AppConfig, HEADER_REQUEST_ID, HEALTH_PATH, Timestamp};
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use http_server::serve_http;
pub use security::{RouterSecurityExt, content_security_policy};
pub use session_gate::SessionGate;
pub use shutdown::shutdown_signal;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// UUID v4 请求 ID
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok(Timestamp::now()))
}

/// 组装完整路由
pub fn router(server: &ServerConfig, app: &AppConfig) -> ServerResult<Router> {
    let static_files = ServeDir::new(&server.dist_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(server.index_file()));

    let mut router = Router::new()
        .route(HEALTH_PATH, get(health))
        .fallback_service(static_files);

    if server.require_session {
        let gate = Arc::new(SessionGate::from_config(&app.auth));
        router = router.layer(middleware::from_fn_with_state(
            gate,
            session_gate::session_gate,
        ));
    }

    let request_id = HeaderName::from_static(HEADER_REQUEST_ID);
    let router = router
        .with_security_headers(&app.api)?
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, UuidRequestId));

    Ok(router)
}

#[cfg(test)]
mod tests;
