//! 服务端与诊断命令的错误类型

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use impulstrip_admin_shared::ConfigError;

/// 服务器启动与运行错误
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),

    #[error("Build directory not found: {}. Build the dashboard before starting the server", .0.display())]
    MissingDistDir(PathBuf),

    #[error("Failed to bind to address {address}")]
    BindError {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server runtime error")]
    Runtime(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ServerResult<T, E = ServerError> = Result<T, E>;

/// 诊断命令错误
#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Login rejected with status {status}: {message}")]
    LoginRejected { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

pub type DoctorResult<T> = Result<T, DoctorError>;
