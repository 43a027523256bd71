//! API 客户端
//!
//! 所有后端请求的唯一入口：按路径选择后端、附加认证头、处理 401 与网络失败，
//! 拿不到真实数据时返回形状正确的兜底数据。

use std::time::Duration;

use impulstrip_admin_shared::config::{ApiConfig, AppConfig, AuthConfig};
use impulstrip_admin_shared::credential::bearer;
use impulstrip_admin_shared::fallback::synthesize;
use impulstrip_admin_shared::models::LoginResponse;
use impulstrip_admin_shared::protocol::{
    ApiRequest, HttpMethod, LoginRequest, ValidateTokenRequest,
};
use impulstrip_admin_shared::routing::{is_login_endpoint, meaningful_path};
use impulstrip_admin_shared::{
    AuthRejectionPolicy, CONTENT_TYPE_JSON, Capability, HEADER_AUTHORIZATION,
    HEADER_CONTENT_TYPE, RoutingTable,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::adapter::{
    Clock, CookieAdapter, HttpClient, HttpRequest, HttpResponse, Navigator, StorageAdapter,
    TransportError,
};
use crate::redirect_guard::RedirectGuard;
use crate::token_store::TokenStore;


// =========================================================
// 错误类型
// =========================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 非 2xx 响应（401 之外，或无需认证的请求返回 401）
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("无法连接服务器: {0}")]
    Network(String),
    #[error("API request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("响应解析失败: {0}")]
    Parse(String),
    #[error("请求失败: {0}")]
    Transport(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

// =========================================================
// 请求选项
// =========================================================

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub requires_auth: bool,
    /// 为空时取配置中的默认值
    pub with_credentials: Option<bool>,
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            body: None,
            headers: Vec::new(),
            requires_auth: true,
            with_credentials: None,
            timeout: None,
        }
    }
}

/// 错误响应中的提示信息：`message` 或 `error` 字段
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("API request failed with status {}", response.status))
}

/// 解析响应体，空响应体视为 `null`
fn parse_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// 兜底数据；调用方期望的类型不是列表形状时（如 `()`、`Option<_>`）退回 `null`
fn fallback<T: DeserializeOwned>(path: &str) -> ApiResult<T> {
    serde_json::from_value(synthesize(path))
        .or_else(|_| serde_json::from_value(Value::Null))
        .map_err(|e| ApiError::Parse(e.to_string()))
}

// =========================================================
// 客户端
// =========================================================

#[derive(Clone)]
pub struct ApiClient<H, N, S, K, C> {
    http: H,
    navigator: N,
    tokens: TokenStore<S, K, C>,
    guard: RedirectGuard<S, C>,
    routes: RoutingTable,
    api: ApiConfig,
    auth: AuthConfig,
}

impl<H, N, S, K, C> ApiClient<H, N, S, K, C>
where
    H: HttpClient,
    N: Navigator,
    S: StorageAdapter,
    K: CookieAdapter,
    C: Clock + Clone,
{
    /// `local` 保存凭据，`session` 保存跳转冷却状态
    pub fn new(
        config: &AppConfig,
        http: H,
        navigator: N,
        local: S,
        session: S,
        cookies: K,
        clock: C,
    ) -> Self {
        Self {
            http,
            navigator,
            tokens: TokenStore::new(local, cookies, clock.clone(), config.auth.clone()),
            guard: RedirectGuard::new(session, clock, config.auth.redirect_cooldown),
            routes: RoutingTable::from_config(&config.api),
            api: config.api.clone(),
            auth: config.auth.clone(),
        }
    }

    pub fn tokens(&self) -> &TokenStore<S, K, C> {
        &self.tokens
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// 发送类型化请求
    pub async fn send<R: ApiRequest>(&self, req: &R) -> ApiResult<R::Response> {
        let options = RequestOptions {
            method: R::METHOD,
            body: req.body(),
            requires_auth: R::REQUIRES_AUTH,
            ..RequestOptions::default()
        };
        self.request(&req.path(), options).await
    }

    /// **核心方法：发送请求**
    ///
    /// 流程：路由 -> 认证 -> 发送 -> 状态处理 -> 解析
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let capability = Capability::classify(path);
        let url = self.routes.url_for(path);
        let timeout = options.timeout.unwrap_or(self.api.timeout);

        let mut req = HttpRequest::new(&url, options.method, timeout)
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
            .with_header("Accept", CONTENT_TYPE_JSON);
        for (key, value) in &options.headers {
            req = req.with_header(key, value);
        }
        req.include_credentials = options
            .with_credentials
            .unwrap_or(self.api.with_credentials);
        if let Some(body) = options.body {
            req = req.with_body(body);
        }

        // --- Step 1: 认证 ---
        if options.requires_auth {
            match self.tokens.get_token() {
                Some(token) => req = req.with_header(HEADER_AUTHORIZATION, &bearer(&token)),
                None => return self.handle_missing_token(path, capability).await,
            }
        }

        // --- Step 2: 发送 ---
        log_info!(
            "[API] {} {} ({} -> {:?})",
            options.method.as_str(),
            url,
            capability,
            capability.backend()
        );
        let response = match self.http.send(req).await {
            Ok(response) => response,
            Err(TransportError::Timeout(after)) => {
                log_error!("[API] {} 请求超时", path);
                return Err(ApiError::Timeout(after));
            }
            Err(TransportError::Network(msg)) => {
                if self.navigator.is_browser() && !is_login_endpoint(path) {
                    log_warn!("[API] {} 网络或 CORS 错误 ({})，返回兜底数据", path, msg);
                    return fallback(path);
                }
                return Err(ApiError::Network(msg));
            }
            Err(TransportError::Other(msg)) => return Err(ApiError::Transport(msg)),
        };

        // --- Step 3: 状态处理 ---
        if !response.is_success() {
            if response.status == 401 && options.requires_auth {
                self.handle_unauthorized(path, capability).await;
                return fallback(path);
            }
            let message = error_message(&response);
            log_error!("[API] {} 失败 [{}]: {}", path, response.status, message);
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        // --- Step 4: 解析 ---
        parse_body(&response.body)
    }

    async fn handle_missing_token<T: DeserializeOwned>(
        &self,
        path: &str,
        capability: Capability,
    ) -> ApiResult<T> {
        if !self.navigator.is_browser() {
            return fallback(path);
        }

        // 仪表盘页自身的统计请求不跳转，避免跳转循环
        if capability == Capability::DashboardStats
            && self
                .navigator
                .current_path()
                .starts_with(&self.auth.dashboard_path)
        {
            log_warn!("[API] 仪表盘统计缺少令牌，返回兜底数据");
            return fallback(path);
        }

        log_warn!("[API] {} 需要认证但没有有效令牌", path);
        self.redirect_to_login(&self.auth.login_path).await;
        fallback(path)
    }

    async fn handle_unauthorized(&self, path: &str, capability: Capability) {
        match capability.auth_rejection_policy() {
            AuthRejectionPolicy::Strict => {
                log_warn!("[API] {} 返回 401，清除凭据", path);
                self.tokens.clear_token();
                self.redirect_to_login(&self.auth.session_expired_path)
                    .await;
            }
            AuthRejectionPolicy::Lenient { clear_on } => {
                let meaningful = meaningful_path(path);
                if clear_on.contains(&meaningful.as_str()) {
                    log_warn!("[API] {} 返回 401，清除凭据", path);
                    self.tokens.clear_token();
                    self.redirect_to_login(&self.auth.session_expired_path)
                        .await;
                } else {
                    log_warn!("[API] {} 返回 401，保留凭据", path);
                }
            }
            AuthRejectionPolicy::Standard => {
                if self.guard.should_redirect() {
                    log_warn!("[API] {} 返回 401，清除凭据", path);
                    self.tokens.clear_token();
                    self.redirect_to_login(&self.auth.session_expired_path)
                        .await;
                } else {
                    log_info!("[API] {} 返回 401，跳转已在进行中", path);
                }
            }
        }
    }

    /// 经冷却去重后跳转到登录页
    async fn redirect_to_login(&self, target: &str) {
        if !self.navigator.is_browser() {
            return;
        }
        if self
            .navigator
            .current_path()
            .starts_with(&self.auth.login_path)
        {
            return;
        }
        if !self.guard.try_begin() {
            log_info!("[API] 跳转冷却中，跳过");
            return;
        }

        log_info!("[API] 跳转到 {}", target);
        self.navigator.redirect(target).await;
    }

    // =========================================================
    // 认证流程
    // =========================================================

    /// 登录并保存凭据
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self.send(&req).await?;

        self.tokens.set_token(&resp.access_token, self.auth.token_ttl);
        if let Some(user) = &resp.user {
            self.tokens.set_user_data(user);
        }
        self.guard.reset();
        log_info!("[Auth] {} 登录成功", username);
        Ok(resp)
    }

    /// 后端是否仍接受当前令牌
    pub async fn validate_session(&self) -> ApiResult<bool> {
        if self.tokens.get_token().is_none() {
            return Ok(false);
        }
        let validation = self.send(&ValidateTokenRequest).await?;
        Ok(validation.valid && self.tokens.get_token().is_some())
    }

    pub fn logout(&self) {
        self.tokens.clear_token();
        log_info!("[Auth] 已注销");
    }
}
