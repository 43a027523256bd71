//! 浏览器端与服务端共用的领域逻辑
//!
//! 这里的代码不依赖任何运行时，时间一律以 [`date::Timestamp`] 参数传入。

pub mod config;
pub mod cookie;
pub mod credential;
pub mod date;
pub mod fallback;
pub mod models;
pub mod protocol;
pub mod redirect;
pub mod routing;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const HEALTH_PATH: &str = "/health";

pub use config::{AppConfig, ConfigError, EnvAdapter};
pub use credential::CredentialRecord;
pub use date::Timestamp;
pub use routing::{AuthRejectionPolicy, Backend, Capability, RoutingTable};
