//! 运行时配置
//!
//! 所有配置项都通过 [`EnvAdapter`] 读取，前端对应构建期注入的变量，
//! 服务端对应进程环境变量。缺失的变量取默认值，非法值返回 [`ConfigError`]。

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cookie::{CookiePolicy, SameSite};

// =========================================================
// 常量定义
// =========================================================

pub const DEFAULT_API_URL: &str = "http://localhost:8001";
pub const DEFAULT_FASTAPI_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TOKEN_KEY: &str = "adminToken";
pub const DEFAULT_EXPIRY_KEY: &str = "tokenExpiry";
pub const DEFAULT_USER_DATA_KEY: &str = "adminUserData";
pub const DEFAULT_TOKEN_TTL_MS: u64 = 86_400_000;
pub const DEFAULT_REDIRECT_COOLDOWN_MS: u64 = 5_000;
/// 毫秒类配置的上限（10 年），保证加到当前时间后仍可格式化为日期
pub const MAX_DURATION_MS: u64 = 315_360_000_000;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SESSION_EXPIRED_PATH: &str = "/login?error=session_expired";

// =========================================================
// 环境适配
// =========================================================

/// 抽象环境变量接口
pub trait EnvAdapter {
    fn var(&self, name: &str) -> Option<String>;
}

impl EnvAdapter for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvAdapter for HashMap<&str, &str> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got `{value}`")]
    InvalidNumber { name: String, value: String },
    #[error("{name} must be at most {max} ms, got `{value}`")]
    OutOfRange { name: String, value: String, max: u64 },
    #[error("{name} must be `true` or `false`, got `{value}`")]
    InvalidBool { name: String, value: String },
    #[error("unknown SameSite value `{0}` (expected strict, lax or none)")]
    InvalidSameSite(String),
    #[error("{name} must be an http(s) URL, got `{value}`")]
    InvalidUrl { name: String, value: String },
}

/// 读取非空变量
fn lookup(env: &impl EnvAdapter, name: &str) -> Option<String> {
    env.var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_string(env: &impl EnvAdapter, name: &str, default: &str) -> String {
    lookup(env, name).unwrap_or_else(|| default.to_string())
}

fn read_url(env: &impl EnvAdapter, name: &str, default: &str) -> Result<String, ConfigError> {
    let value = read_string(env, name, default);
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            name: name.to_string(),
            value,
        })
    }
}

fn read_millis(env: &impl EnvAdapter, name: &str, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = lookup(env, name) else {
        return Ok(Duration::from_millis(default));
    };
    let Ok(ms) = u64::from_str(&value) else {
        return Err(ConfigError::InvalidNumber {
            name: name.to_string(),
            value,
        });
    };
    if ms > MAX_DURATION_MS {
        return Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value,
            max: MAX_DURATION_MS,
        });
    }
    Ok(Duration::from_millis(ms))
}

fn read_bool(env: &impl EnvAdapter, name: &str, default: bool) -> Result<bool, ConfigError> {
    match lookup(env, name) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                name: name.to_string(),
                value,
            }),
        },
    }
}

// =========================================================
// 配置结构
// =========================================================

/// 后端连接配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub primary_url: String,
    pub secondary_url: String,
    pub timeout: Duration,
    pub with_credentials: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_API_URL.to_string(),
            secondary_url: DEFAULT_FASTAPI_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
            with_credentials: true,
        }
    }
}

/// 凭据与跳转配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub token_key: String,
    pub expiry_key: String,
    pub user_data_key: String,
    pub token_ttl: Duration,
    pub cookie: CookiePolicy,
    pub redirect_cooldown: Duration,
    pub login_path: String,
    pub dashboard_path: String,
    pub session_expired_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            expiry_key: DEFAULT_EXPIRY_KEY.to_string(),
            user_data_key: DEFAULT_USER_DATA_KEY.to_string(),
            token_ttl: Duration::from_millis(DEFAULT_TOKEN_TTL_MS),
            cookie: CookiePolicy::default(),
            redirect_cooldown: Duration::from_millis(DEFAULT_REDIRECT_COOLDOWN_MS),
            login_path: LOGIN_PATH.to_string(),
            dashboard_path: DASHBOARD_PATH.to_string(),
            session_expired_path: SESSION_EXPIRED_PATH.to_string(),
        }
    }
}

/// 功能开关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub blog: bool,
    pub waitlist: bool,
    pub newsletter: bool,
    pub analytics: bool,
    pub contact_messages: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            blog: true,
            waitlist: true,
            newsletter: true,
            analytics: true,
            contact_messages: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub features: Features,
}

impl AppConfig {
    pub fn from_env(env: &impl EnvAdapter) -> Result<Self, ConfigError> {
        let api = ApiConfig {
            primary_url: read_url(env, "PUBLIC_API_URL", DEFAULT_API_URL)?,
            secondary_url: read_url(env, "PUBLIC_FASTAPI_URL", DEFAULT_FASTAPI_URL)?,
            timeout: read_millis(env, "PUBLIC_API_TIMEOUT", DEFAULT_API_TIMEOUT_MS)?,
            with_credentials: read_bool(env, "PUBLIC_WITH_CREDENTIALS", true)?,
        };

        let same_site = match lookup(env, "PUBLIC_COOKIE_SAME_SITE") {
            Some(value) => value.parse::<SameSite>()?,
            None => SameSite::default(),
        };
        let auth = AuthConfig {
            token_key: read_string(env, "PUBLIC_AUTH_TOKEN_NAME", DEFAULT_TOKEN_KEY),
            expiry_key: read_string(env, "PUBLIC_TOKEN_EXPIRY_NAME", DEFAULT_EXPIRY_KEY),
            user_data_key: read_string(env, "PUBLIC_USER_DATA_NAME", DEFAULT_USER_DATA_KEY),
            token_ttl: read_millis(env, "PUBLIC_TOKEN_TTL", DEFAULT_TOKEN_TTL_MS)?,
            cookie: CookiePolicy {
                secure: read_bool(env, "PUBLIC_COOKIE_SECURE", false)?,
                same_site,
            },
            redirect_cooldown: read_millis(
                env,
                "PUBLIC_REDIRECT_COOLDOWN",
                DEFAULT_REDIRECT_COOLDOWN_MS,
            )?,
            ..AuthConfig::default()
        };

        let features = Features {
            blog: read_bool(env, "PUBLIC_FEATURE_BLOG", true)?,
            waitlist: read_bool(env, "PUBLIC_FEATURE_WAITLIST", true)?,
            newsletter: read_bool(env, "PUBLIC_FEATURE_NEWSLETTER", true)?,
            analytics: read_bool(env, "PUBLIC_FEATURE_ANALYTICS", true)?,
            contact_messages: read_bool(env, "PUBLIC_FEATURE_CONTACT_MESSAGES", true)?,
        };

        Ok(Self {
            api,
            auth,
            features,
        })
    }
}
