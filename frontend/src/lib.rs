//! ImpulsTrip 管理后台前端
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `adapter`: 平台抽象（HTTP、存储、Cookie、导航、时钟）
//! - `token_store` / `redirect_guard` / `api`: 请求层核心
//! - `web`: 浏览器实现与路由
//! - `auth`: 认证状态管理
//! - `components`: UI 组件层

// =========================================================
// 跨平台日志宏
// =========================================================

#[cfg(target_arch = "wasm32")]
macro_rules! log_info {
    ($($t:tt)*) => (web_sys::console::log_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_info {
    ($($t:tt)*) => (tracing::info!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_warn {
    ($($t:tt)*) => (web_sys::console::warn_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_warn {
    ($($t:tt)*) => (tracing::warn!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_error {
    ($($t:tt)*) => (web_sys::console::error_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_error {
    ($($t:tt)*) => (tracing::error!($($t)*))
}

pub mod adapter;
pub mod api;
mod auth;
mod components {
    pub mod dashboard;
    mod icons;
    pub mod login;
}
mod config;
pub mod redirect_guard;
pub mod token_store;

use crate::auth::{AuthContext, init_auth};
use crate::components::dashboard::DashboardPage;
use crate::components::login::LoginPage;

use impulstrip_admin_shared::config::DASHBOARD_PATH;
use leptos::prelude::*;

// 原生 Web API 封装模块
// 对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，以减小 WASM 二进制体积。
pub(crate) mod web {
    mod cookie;
    mod http;
    mod navigator;
    pub mod route;
    pub mod router;
    mod storage;

    pub use cookie::DocumentCookies;
    pub use http::FetchClient;
    pub use navigator::BrowserNavigator;
    pub use storage::WebStorage;
}

use web::route::AppRoute;
use web::router::{Router, RouterOutlet, use_router};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::NotFound => view! { <NotFoundPage /> }.into_any(),
    }
}

#[component]
fn NotFoundPage() -> impl IntoView {
    let router = use_router();
    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="text-center">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl mt-4">"页面未找到"</p>
                <button
                    class="btn btn-primary btn-sm mt-6"
                    on:click=move |_| router.navigate(DASHBOARD_PATH)
                >
                    "返回控制面板"
                </button>
            </div>
        </div>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 读取构建期配置并创建认证上下文
    let config = config::load();
    let auth_ctx = AuthContext::new(&config);
    provide_context(auth_ctx);

    // 2. 从 Token Store 恢复认证状态
    init_auth(&auth_ctx);

    // 3. 认证状态信号注入路由服务
    let is_authenticated = auth_ctx.is_authenticated_signal();

    view! {
        <Router is_authenticated=is_authenticated>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
