//! 会话 Cookie
//!
//! 令牌同时镜像到 Cookie 中，供服务端会话闸门检查。删除时写出所有属性组合，
//! 无论当初以何种属性写入都能清除干净。

use std::str::FromStr;
use std::time::Duration;

use crate::config::ConfigError;

const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// SameSite 属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

impl FromStr for SameSite {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(ConfigError::InvalidSameSite(other.to_string())),
        }
    }
}

/// Cookie 安全策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookiePolicy {
    /// `SameSite=None` 必须搭配 `Secure`
    fn requires_secure(&self) -> bool {
        self.secure || self.same_site == SameSite::None
    }
}

/// 写入会话 Cookie 的 `document.cookie` 字符串
pub fn session_cookie(name: &str, value: &str, max_age: Duration, policy: CookiePolicy) -> String {
    let mut cookie = format!(
        "{}={}; path=/; max-age={}; SameSite={}",
        name,
        value,
        max_age.as_secs(),
        policy.same_site.as_str()
    );
    if policy.requires_secure() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 清除会话 Cookie 的全部变体
pub fn removal_cookies(name: &str) -> Vec<String> {
    let base = format!("{}=; path=/; max-age=0; expires={}", name, EPOCH);
    let mut variants = vec![base.clone(), format!("{}; Secure", base)];
    for same_site in [SameSite::Strict, SameSite::Lax] {
        variants.push(format!("{}; SameSite={}", base, same_site.as_str()));
        variants.push(format!("{}; SameSite={}; Secure", base, same_site.as_str()));
    }
    variants.push(format!("{}; SameSite=None; Secure", base));
    variants
}
