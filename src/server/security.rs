//! 安全响应头
//!
//! CSP 的 `connect-src` 放行两个后端地址；`script-src` 额外需要
//! `'wasm-unsafe-eval'` 才能实例化 WASM 模块。

use axum::Router;
use axum::http::header::{self, HeaderName, HeaderValue};
use impulstrip_admin_shared::config::ApiConfig;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::{ServerError, ServerResult};

const HSTS: &str = "max-age=31536000; includeSubDomains; preload";
const FONT_CDNS: &[&str] = &["https://fonts.gstatic.com", "https://cdnjs.cloudflare.com"];
const STYLE_CDNS: &[&str] = &["https://fonts.googleapis.com", "https://cdnjs.cloudflare.com"];

/// 生成内容安全策略
pub fn content_security_policy(api: &ApiConfig) -> String {
    let mut connect = vec!["'self'", api.primary_url.as_str()];
    if api.secondary_url != api.primary_url {
        connect.push(api.secondary_url.as_str());
    }

    let mut style = vec!["'self'", "'unsafe-inline'"];
    style.extend_from_slice(STYLE_CDNS);
    let mut font = vec!["'self'"];
    font.extend_from_slice(FONT_CDNS);

    [
        "default-src 'self'".to_string(),
        "script-src 'self' 'unsafe-inline' 'wasm-unsafe-eval'".to_string(),
        format!("style-src {}", style.join(" ")),
        format!("font-src {}", font.join(" ")),
        "img-src 'self' data:".to_string(),
        format!("connect-src {}", connect.join(" ")),
    ]
    .join("; ")
}

pub trait RouterSecurityExt: Sized {
    /// 为所有响应附加安全头，CSP 无法编码为头部值时报错
    fn with_security_headers(self, api: &ApiConfig) -> ServerResult<Self>;
}

impl<S> RouterSecurityExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security_headers(self, api: &ApiConfig) -> ServerResult<Self> {
        let csp = HeaderValue::from_str(&content_security_policy(api)).map_err(|_| {
            ServerError::InvalidConfig(
                "Backend URLs contain characters not allowed in a header".to_string(),
            )
        })?;

        Ok(self
            .layer(SetResponseHeaderLayer::overriding(
                header::CONTENT_SECURITY_POLICY,
                csp,
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("x-xss-protection"),
                HeaderValue::from_static("1; mode=block"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(HSTS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            )))
    }
}
