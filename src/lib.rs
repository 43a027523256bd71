//! ImpulsTrip 管理后台服务端
//!
//! - `server`: 静态资源 / SPA 服务、健康检查、安全响应头、会话门禁
//! - `doctor`: 后端连通性、CORS、接口前缀与登录链路诊断
//! - `request`: 诊断所用的 HTTP 客户端抽象
//! - `config`: 命令行与环境变量配置

pub mod config;
pub mod doctor;
pub mod error;
pub mod request;
pub mod server;

pub use error::{DoctorError, ServerError, ServerResult};

/// 启动阶段日志目标
pub const TRACING_TARGET_SERVER_STARTUP: &str = "impulstrip_admin::server::startup";

/// 关停阶段日志目标
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "impulstrip_admin::server::shutdown";

/// 配置加载日志目标
pub const TRACING_TARGET_CONFIG: &str = "impulstrip_admin::config";

/// 诊断命令日志目标
pub const TRACING_TARGET_DOCTOR: &str = "impulstrip_admin::doctor";
