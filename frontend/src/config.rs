//! 构建期配置
//!
//! `PUBLIC_*` 变量在编译时通过 `option_env!` 注入（如 `PUBLIC_API_URL=... trunk build`），
//! 未设置的变量由 [`AppConfig`] 取默认值。

use impulstrip_admin_shared::{AppConfig, EnvAdapter};

/// 编译期环境变量
pub struct BuildEnv;

impl EnvAdapter for BuildEnv {
    fn var(&self, name: &str) -> Option<String> {
        let value = match name {
            "PUBLIC_API_URL" => option_env!("PUBLIC_API_URL"),
            "PUBLIC_FASTAPI_URL" => option_env!("PUBLIC_FASTAPI_URL"),
            "PUBLIC_API_TIMEOUT" => option_env!("PUBLIC_API_TIMEOUT"),
            "PUBLIC_WITH_CREDENTIALS" => option_env!("PUBLIC_WITH_CREDENTIALS"),
            "PUBLIC_AUTH_TOKEN_NAME" => option_env!("PUBLIC_AUTH_TOKEN_NAME"),
            "PUBLIC_TOKEN_EXPIRY_NAME" => option_env!("PUBLIC_TOKEN_EXPIRY_NAME"),
            "PUBLIC_USER_DATA_NAME" => option_env!("PUBLIC_USER_DATA_NAME"),
            "PUBLIC_TOKEN_TTL" => option_env!("PUBLIC_TOKEN_TTL"),
            "PUBLIC_COOKIE_SECURE" => option_env!("PUBLIC_COOKIE_SECURE"),
            "PUBLIC_COOKIE_SAME_SITE" => option_env!("PUBLIC_COOKIE_SAME_SITE"),
            "PUBLIC_REDIRECT_COOLDOWN" => option_env!("PUBLIC_REDIRECT_COOLDOWN"),
            "PUBLIC_FEATURE_BLOG" => option_env!("PUBLIC_FEATURE_BLOG"),
            "PUBLIC_FEATURE_WAITLIST" => option_env!("PUBLIC_FEATURE_WAITLIST"),
            "PUBLIC_FEATURE_NEWSLETTER" => option_env!("PUBLIC_FEATURE_NEWSLETTER"),
            "PUBLIC_FEATURE_ANALYTICS" => option_env!("PUBLIC_FEATURE_ANALYTICS"),
            "PUBLIC_FEATURE_CONTACT_MESSAGES" => option_env!("PUBLIC_FEATURE_CONTACT_MESSAGES"),
            _ => None,
        };
        value.map(str::to_string)
    }
}

/// 读取构建期配置，非法值记录错误后退回默认配置
pub fn load() -> AppConfig {
    AppConfig::from_env(&BuildEnv).unwrap_or_else(|e| {
        log_error!("[Config] {}，使用默认配置", e);
        AppConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_are_unset() {
        assert_eq!(BuildEnv.var("HOME"), None);
        assert_eq!(BuildEnv.var("PUBLIC_SOMETHING_ELSE"), None);
    }
}
