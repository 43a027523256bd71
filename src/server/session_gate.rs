//! 会话门禁
//!
//! 没有会话 Cookie 的页面请求被重定向到登录页。登录页本身、健康检查
//! 与带扩展名的静态资源始终放行。

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use impulstrip_admin_shared::HEALTH_PATH;
use impulstrip_admin_shared::config::AuthConfig;
use impulstrip_admin_shared::credential;

#[derive(Debug, Clone)]
pub struct SessionGate {
    cookie_name: String,
    login_path: String,
}

impl SessionGate {
    pub fn new(cookie_name: impl Into<String>, login_path: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            login_path: login_path.into(),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(auth.token_key.clone(), auth.login_path.clone())
    }

    fn is_public(&self, path: &str) -> bool {
        path == self.login_path || path == HEALTH_PATH || is_asset(path)
    }

    /// 请求是否可以继续
    pub fn allows(&self, path: &str, jar: &CookieJar) -> bool {
        self.is_public(path)
            || jar
                .get(&self.cookie_name)
                .is_some_and(|c| credential::is_well_formed(c.value()))
    }
}

/// 末段带扩展名的路径视为静态资源
fn is_asset(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|last| last.contains('.'))
}

pub async fn session_gate(
    State(gate): State<Arc<SessionGate>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if gate.allows(path, &jar) {
        return next.run(request).await;
    }

    tracing::debug!(path = %path, "No session cookie, redirecting to login");
    Redirect::to(&gate.login_path).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn public_paths_pass_without_cookie() {
        let gate = SessionGate::new("adminToken", "/login");
        let jar = CookieJar::new();

        assert!(gate.allows("/login", &jar));
        assert!(gate.allows("/health", &jar));
        assert!(gate.allows("/assets/app-3f2a.wasm", &jar));
        assert!(gate.allows("/favicon.ico", &jar));
        assert!(!gate.allows("/", &jar));
        assert!(!gate.allows("/dashboard", &jar));
    }

    #[test]
    fn requires_well_formed_cookie() {
        let gate = SessionGate::new("adminToken", "/login");

        let jar = CookieJar::new().add(Cookie::new("adminToken", "header.payload.signature"));
        assert!(gate.allows("/dashboard", &jar));

        let jar = CookieJar::new().add(Cookie::new("adminToken", "undefined"));
        assert!(!gate.allows("/dashboard", &jar));

        let jar = CookieJar::new().add(Cookie::new("other", "header.payload.signature"));
        assert!(!gate.allows("/dashboard", &jar));
    }
}
