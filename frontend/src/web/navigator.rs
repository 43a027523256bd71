//! 整页导航
//!
//! 与 [`super::router`] 的 History API 路由不同，这里直接修改 `location.href`，
//! 用于认证失败后离开当前页面。

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use crate::adapter::Navigator;

/// 跳转后等待导航开始的时间（毫秒）
const REDIRECT_SETTLE_MS: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

#[async_trait(?Send)]
impl Navigator for BrowserNavigator {
    fn is_browser(&self) -> bool {
        web_sys::window().is_some()
    }

    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_string())
    }

    async fn redirect(&self, target: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if window.location().set_href(target).is_err() {
            log_error!("[Navigator] 无法跳转到 {}", target);
            return;
        }
        TimeoutFuture::new(REDIRECT_SETTLE_MS).await;
    }
}
