//! HTTP 服务启动与生命周期

use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::shutdown_signal;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// 校验配置、绑定地址并运行，直到收到关停信号
pub async fn serve_http(app: Router, config: ServerConfig) -> ServerResult<()> {
    if let Err(e) = config.validate() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            error = %e,
            "Invalid server configuration"
        );
        return Err(e);
    }

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        host = %config.host,
        port = config.port,
        dist_dir = %config.dist_dir.display(),
        require_session = config.require_session,
        shutdown_timeout_secs = config.shutdown_timeout,
        "Server configuration loaded"
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(addr).await.map_err(|source| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %addr,
            error = %source,
            "Failed to bind to address"
        );
        ServerError::BindError {
            address: addr,
            source,
        }
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        url = %format!("http://{}", addr),
        "Admin dashboard is ready, press Ctrl+C to stop"
    );

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server is bound to all interfaces. Ensure firewall rules are properly configured."
        );
    }

    let (started_tx, started_rx) = oneshot::channel();
    let timeout = config.shutdown_timeout();
    let signal = async move {
        shutdown_signal(timeout).await;
        let _ = started_tx.send(());
    };

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal)
    .into_future();

    let outcome = bounded_drain(serve, started_rx, timeout).await.map_err(|e| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %e,
            "Server encountered an error"
        );
        ServerError::Runtime(e)
    })?;

    if outcome == Drain::TimedOut {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            timeout_secs = timeout.as_secs(),
            "Shutdown timeout elapsed, dropping remaining connections"
        );
        return Ok(());
    }

    tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, "Server shut down gracefully");
    Ok(())
}

/// 关停排空的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drain {
    Completed,
    TimedOut,
}

/// 运行服务，关停开始后最多再等待 `timeout`
pub(crate) async fn bounded_drain<F>(
    serve: F,
    started: oneshot::Receiver<()>,
    timeout: Duration,
) -> io::Result<Drain>
where
    F: Future<Output = io::Result<()>>,
{
    let deadline = async {
        // 发送端被丢弃说明关停从未开始
        if started.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(timeout).await;
    };

    tokio::select! {
        res = serve => res.map(|()| Drain::Completed),
        () = deadline => Ok(Drain::TimedOut),
    }
}
