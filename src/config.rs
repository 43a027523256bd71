//! 命令行与环境变量配置
//!
//! ```text
//! Cli
//! ├── serve   ServerConfig   # 监听地址、构建目录、会话门禁、关停超时
//! └── doctor  DoctorCommand  # ping / cors / endpoints / login
//! ```
//!
//! 后端地址等前端共用配置通过 [`AppConfig::from_env`] 从进程环境读取，
//! 启动前会尝试加载 `.env`。

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use impulstrip_admin_shared::{AppConfig, ConfigError, EnvAdapter};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_CONFIG;
use crate::error::{ServerError, ServerResult};

/// ImpulsTrip 管理后台命令行
#[derive(Debug, Parser)]
#[command(name = "impulstrip-admin")]
#[command(about = "Static server and diagnostics for the ImpulsTrip admin dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the built dashboard
    Serve(ServerConfig),

    /// Diagnose backend connectivity, CORS and login problems
    Doctor {
        /// Per-request timeout in seconds
        #[arg(long, env = "DOCTOR_TIMEOUT", default_value_t = 10, global = true)]
        timeout: u64,

        #[command(subcommand)]
        check: DoctorCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum DoctorCommand {
    /// GET /ping on both backends
    Ping,

    /// Send a CORS preflight and a GET, then analyse the Access-Control headers
    Cors {
        /// URL to probe, defaults to the contacts endpoint of the secondary backend
        #[arg(long)]
        url: Option<String>,

        /// Origin the dashboard is served from
        #[arg(long, env = "DASHBOARD_ORIGIN", default_value = "http://localhost:8082")]
        origin: String,
    },

    /// Probe route prefix variants of the admin endpoints
    Endpoints {
        /// Bearer token sent with each probe
        #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Log in and validate the returned token
    Login {
        #[arg(long, env = "ADMIN_USERNAME")]
        username: String,

        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

// =========================================================
// 服务器配置
// =========================================================

/// HTTP 服务器配置
///
/// 所有选项均可通过环境变量设置：
/// - `HOST`（默认 127.0.0.1）
/// - `PORT`（默认 8082）
/// - `DIST_DIR`（默认 dist）
/// - `SHUTDOWN_TIMEOUT`（秒，默认 30，范围 1-300）
/// - `REQUIRE_SESSION`（默认 false）
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// TCP port to listen on
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8082)]
    pub port: u16,

    /// Directory containing the built dashboard
    #[arg(long, env = "DIST_DIR", default_value = "dist")]
    pub dist_dir: PathBuf,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Redirect page requests without a session cookie to the login page
    #[arg(long, env = "REQUIRE_SESSION", default_value_t = false)]
    pub require_session: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8082,
            dist_dir: PathBuf::from("dist"),
            shutdown_timeout: 30,
            require_session: false,
        }
    }
}

impl ServerConfig {
    /// 校验端口与超时，并确认构建目录存在
    pub fn validate(&self) -> ServerResult<()> {
        if self.port == 0 {
            return Err(ServerError::InvalidConfig(
                "Port 0 is not allowed, choose a port between 1 and 65535".to_string(),
            ));
        }

        if self.shutdown_timeout == 0 || self.shutdown_timeout > 300 {
            return Err(ServerError::InvalidConfig(format!(
                "Shutdown timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.shutdown_timeout
            )));
        }

        if !self.dist_dir.is_dir() {
            return Err(ServerError::MissingDistDir(self.dist_dir.clone()));
        }

        Ok(())
    }

    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// 是否监听所有网卡（0.0.0.0 或 ::）
    #[must_use]
    pub const fn binds_to_all_interfaces(&self) -> bool {
        match self.host {
            IpAddr::V4(addr) => addr.is_unspecified(),
            IpAddr::V6(addr) => addr.is_unspecified(),
        }
    }

    pub fn index_file(&self) -> PathBuf {
        self.dist_dir.join("index.html")
    }
}

// =========================================================
// 进程环境
// =========================================================

/// 从进程环境变量读取配置
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvAdapter for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// 读取后端与认证配置，非法取值直接报错
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    let config = AppConfig::from_env(&ProcessEnv)?;
    tracing::debug!(
        target: TRACING_TARGET_CONFIG,
        primary_url = %config.api.primary_url,
        secondary_url = %config.api.secondary_url,
        timeout_ms = config.api.timeout.as_millis() as u64,
        "Backend configuration loaded"
    );
    Ok(config)
}

/// 初始化 tracing，默认级别 info，可由 `RUST_LOG` 覆盖
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "impulstrip-admin",
            "serve",
            "--port",
            "9000",
            "--dist-dir",
            "build",
            "--require-session",
        ])
        .unwrap();

        let Command::Serve(config) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(config.port, 9000);
        assert_eq!(config.dist_dir, PathBuf::from("build"));
        assert!(config.require_session);
    }

    #[test]
    fn parses_doctor_login() {
        let cli = Cli::try_parse_from([
            "impulstrip-admin",
            "doctor",
            "login",
            "--username",
            "ops",
            "--password",
            "secret",
        ])
        .unwrap();

        match cli.command {
            Command::Doctor {
                check: DoctorCommand::Login { username, .. },
                ..
            } => assert_eq!(username, "ops"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn validate_checks_dist_dir_and_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig {
            dist_dir: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());

        config.shutdown_timeout = 0;
        assert!(matches!(
            config.validate(),
            Err(ServerError::InvalidConfig(_))
        ));

        config.shutdown_timeout = 30;
        config.dist_dir = dir.path().join("missing");
        assert!(matches!(
            config.validate(),
            Err(ServerError::MissingDistDir(_))
        ));
    }

    #[test]
    fn all_interfaces() {
        let mut config = ServerConfig::default();
        assert!(!config.binds_to_all_interfaces());
        config.host = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        assert!(config.binds_to_all_interfaces());
    }
}
