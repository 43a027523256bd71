//! 认证模块
//!
//! 管理用户认证状态，与路由系统解耦。
//! 路由服务通过注入的认证信号来检查认证状态。

use impulstrip_admin_shared::AppConfig;
use impulstrip_admin_shared::config::Features;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::Value;

use crate::adapter::SystemClock;
use crate::api::{ApiClient, ApiError};
use crate::web::{BrowserNavigator, DocumentCookies, FetchClient, WebStorage};

/// 浏览器环境下的 API 客户端
pub type BrowserApi = ApiClient<FetchClient, BrowserNavigator, WebStorage, DocumentCookies, SystemClock>;

pub fn browser_api(config: &AppConfig) -> BrowserApi {
    ApiClient::new(
        config,
        FetchClient,
        BrowserNavigator,
        WebStorage::Local,
        WebStorage::Session,
        DocumentCookies,
        SystemClock,
    )
}

/// 认证状态
#[derive(Clone, Default)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    /// 登录响应中的用户资料
    pub user: Option<Value>,
}

impl AuthState {
    /// 用户名，用于页面显示
    pub fn display_name(&self) -> Option<String> {
        let user = self.user.as_ref()?;
        ["username", "name", "email"]
            .iter()
            .find_map(|k| user.get(k).and_then(Value::as_str).map(str::to_string))
    }

    /// 从本地会话恢复；有会话时保持 loading，直到后端确认
    pub fn restored(is_authenticated: bool, user: Option<Value>) -> Self {
        Self {
            is_authenticated,
            is_loading: is_authenticated,
            user,
        }
    }

    /// 应用后端校验结果，`None` 表示校验请求本身失败
    pub fn settle(&mut self, valid: Option<bool>) {
        if valid == Some(false) {
            self.is_authenticated = false;
            self.user = None;
        }
        self.is_loading = false;
    }
}

/// 认证上下文
///
/// 包含读写信号与 API 客户端，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub state: ReadSignal<AuthState>,
    pub set_state: WriteSignal<AuthState>,
    api: StoredValue<BrowserApi>,
    pub features: Features,
}

impl AuthContext {
    pub fn new(config: &AppConfig) -> Self {
        let (state, set_state) = signal(AuthState {
            is_loading: true,
            ..AuthState::default()
        });
        Self {
            state,
            set_state,
            api: StoredValue::new(browser_api(config)),
            features: config.features,
        }
    }

    pub fn api(&self) -> BrowserApi {
        self.api.get_value()
    }

    /// 获取认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.get().is_authenticated)
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 初始化认证状态
///
/// 从 Token Store 恢复登录状态，随后在后台向后端确认令牌仍然有效。
pub fn init_auth(ctx: &AuthContext) {
    let api = ctx.api();
    let is_authenticated = api.tokens().is_authenticated();
    let user = api.tokens().get_user_data();

    ctx.set_state.set(AuthState::restored(is_authenticated, user));

    if !is_authenticated {
        return;
    }

    let set_state = ctx.set_state;
    spawn_local(async move {
        let valid = match api.validate_session().await {
            Ok(valid) => Some(valid),
            // 网络问题不影响本地会话
            Err(e) => {
                log_warn!("[Auth] 令牌校验失败: {}", e);
                None
            }
        };
        if valid == Some(false) {
            log_warn!("[Auth] 后端拒绝了已保存的令牌");
            api.logout();
        }
        set_state.update(|s| s.settle(valid));
    });
}

/// 登录并保存状态
pub async fn login(ctx: &AuthContext, username: String, password: String) -> Result<(), ApiError> {
    let resp = ctx.api().login(&username, &password).await?;

    ctx.set_state.update(|state| {
        state.is_authenticated = true;
        state.user = resp.user;
    });
    Ok(())
}

/// 注销并清除状态
///
/// 导航将由路由服务的认证状态监听自动处理。
pub fn logout(ctx: &AuthContext) {
    ctx.api().logout();
    ctx.set_state.update(|state| {
        state.is_authenticated = false;
        state.user = None;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_prefers_username() {
        let state = AuthState {
            user: Some(json!({ "email": "ops@impulstrip.com", "username": "ops" })),
            ..AuthState::default()
        };
        assert_eq!(state.display_name().as_deref(), Some("ops"));

        let state = AuthState {
            user: Some(json!({ "email": "ops@impulstrip.com" })),
            ..AuthState::default()
        };
        assert_eq!(state.display_name().as_deref(), Some("ops@impulstrip.com"));
        assert_eq!(AuthState::default().display_name(), None);
    }

    #[test]
    fn restored_session_loads_until_settled() {
        let mut state = AuthState::restored(true, Some(json!({ "username": "ops" })));
        assert!(state.is_loading);

        // 校验请求失败时保留本地会话
        state.settle(None);
        assert!(!state.is_loading);
        assert!(state.is_authenticated);

        let mut state = AuthState::restored(true, Some(json!({ "username": "ops" })));
        state.settle(Some(false));
        assert!(!state.is_loading);
        assert!(!state.is_authenticated);
        assert_eq!(state.user, None);

        assert!(!AuthState::restored(false, None).is_loading);
    }
}
