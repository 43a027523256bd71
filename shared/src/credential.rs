//! 凭据记录
//!
//! 令牌只有在存在、格式正确（三段点分 base64url）且未过期时才有效。

use std::time::Duration;

use crate::date::Timestamp;

/// 凭据无效的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCredential {
    Missing,
    Malformed,
    MissingExpiry,
    Expired,
}

impl InvalidCredential {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "token missing",
            Self::Malformed => "token malformed",
            Self::MissingExpiry => "expiry missing or unreadable",
            Self::Expired => "token expired",
        }
    }
}

impl std::fmt::Display for InvalidCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 令牌格式检查：`header.payload.signature`
pub fn is_well_formed(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'=')
        })
}

/// 日志用的令牌掩码，只保留前 8 个字符
pub fn mask(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}…({} chars)", prefix, token.chars().count())
}

/// `Authorization` 头的值
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// 令牌与过期时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub token: String,
    pub expires_at: Timestamp,
}

impl CredentialRecord {
    /// 登录成功后签发
    pub fn issue(token: impl Into<String>, now: Timestamp, ttl: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: now + ttl,
        }
    }

    /// 从存储中的原始值恢复并校验
    pub fn from_stored(
        token: Option<String>,
        expiry: Option<String>,
        now: Timestamp,
    ) -> Result<Self, InvalidCredential> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(InvalidCredential::Missing)?;
        if !is_well_formed(&token) {
            return Err(InvalidCredential::Malformed);
        }
        let expires_at = expiry
            .as_deref()
            .and_then(Timestamp::parse_rfc3339)
            .ok_or(InvalidCredential::MissingExpiry)?;

        let record = Self { token, expires_at };
        if record.is_valid_at(now) {
            Ok(record)
        } else {
            Err(InvalidCredential::Expired)
        }
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}
