//! 请求路由模块
//!
//! 将逻辑接口路径归类为 [`Capability`]，再通过显式的路由表映射到后端服务。
//! 纯函数，无副作用，任何路径都能得到一个基础 URL。

use crate::config::ApiConfig;

/// 路径开头可被跳过的通用前缀
const SKIPPED_PREFIXES: &[&str] = &["api", "admin"];

// =========================================================
// 后端与能力分类
// =========================================================

/// 后端服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Express 风格的主 API
    Primary,
    /// Python 风格的副 API（联系人、博客、法律文档）
    Secondary,
}

/// 接口能力分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Auth,
    Users,
    Waitlist,
    Blog,
    Newsletter,
    Contacts,
    DashboardStats,
    Analytics,
    Legal,
    Unclassified,
}

/// 收到 401 时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejectionPolicy {
    /// 总是清除凭据并跳转登录
    Strict,
    /// 保留凭据，只有 `clear_on` 中的路径才清除并跳转
    Lenient { clear_on: &'static [&'static str] },
    /// 清除凭据并跳转，除非已处于跳转冷却期
    Standard,
}

impl Capability {
    /// 将请求路径归类
    pub fn classify(path: &str) -> Self {
        let segments = meaningful_segments(path);
        let first = segments.first().copied().unwrap_or_default();
        let second = segments.get(1).copied();

        match first {
            "auth" if second == Some("users") => Self::Users,
            "auth" | "login" => Self::Auth,
            "users" => Self::Users,
            "waitlist" => Self::Waitlist,
            "blogs" | "blog" => Self::Blog,
            "newsletter" | "newsletters" => Self::Newsletter,
            "contacts" | "contact" => Self::Contacts,
            "dashboard-stats" => Self::DashboardStats,
            "analytics" => Self::Analytics,
            "legal" => Self::Legal,
            _ => Self::Unclassified,
        }
    }

    /// **路由表：能力 -> 后端**
    pub fn backend(self) -> Backend {
        match self {
            Self::Contacts | Self::Blog | Self::Legal => Backend::Secondary,
            Self::Auth
            | Self::Users
            | Self::Waitlist
            | Self::Newsletter
            | Self::DashboardStats
            | Self::Analytics
            | Self::Unclassified => Backend::Primary,
        }
    }

    /// 该能力对 401 的处理策略
    pub fn auth_rejection_policy(self) -> AuthRejectionPolicy {
        match self {
            Self::Legal => AuthRejectionPolicy::Strict,
            Self::Contacts => AuthRejectionPolicy::Lenient {
                clear_on: &["/contacts"],
            },
            Self::Blog => AuthRejectionPolicy::Lenient {
                clear_on: &["/blogs"],
            },
            _ => AuthRejectionPolicy::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Users => "users",
            Self::Waitlist => "waitlist",
            Self::Blog => "blog",
            Self::Newsletter => "newsletter",
            Self::Contacts => "contacts",
            Self::DashboardStats => "dashboard-stats",
            Self::Analytics => "analytics",
            Self::Legal => "legal",
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================
// 路径工具
// =========================================================

/// 去掉查询串与片段，并保证以 `/` 开头
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = &path[..end];
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// 跳过 `api` / `admin` 前缀后的路径段
fn meaningful_segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let mut segments: Vec<&str> = path[..end].split('/').filter(|s| !s.is_empty()).collect();

    let skip = segments
        .iter()
        .take_while(|s| SKIPPED_PREFIXES.contains(s))
        .count();
    segments.drain(..skip);
    segments
}

/// 跳过通用前缀后的路径，如 `/admin/contacts?page=2` -> `/contacts`
pub fn meaningful_path(path: &str) -> String {
    format!("/{}", meaningful_segments(path).join("/"))
}

/// 是否为登录接口（登录接口的网络错误必须抛给调用方）
pub fn is_login_endpoint(path: &str) -> bool {
    let normalized = normalize_path(path);
    normalized.contains("/auth/login") || meaningful_path(path) == "/login"
}

// =========================================================
// 路由表
// =========================================================

/// 后端基础 URL 表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    primary: String,
    secondary: String,
}

impl RoutingTable {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        let trim = |url: String| url.trim_end_matches('/').to_string();
        Self {
            primary: trim(primary.into()),
            secondary: trim(secondary.into()),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.primary_url.clone(), config.secondary_url.clone())
    }

    pub fn base_url(&self, backend: Backend) -> &str {
        match backend {
            Backend::Primary => &self.primary,
            Backend::Secondary => &self.secondary,
        }
    }

    /// 根据路径选择后端基础 URL，未分类路径走主后端
    pub fn resolve_base_url(&self, path: &str) -> &str {
        self.base_url(Capability::classify(path).backend())
    }

    /// 拼接完整 URL（保留查询串）
    pub fn url_for(&self, path: &str) -> String {
        let base = self.resolve_base_url(path);
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        RoutingTable::new("http://primary:8001/", "http://secondary:8000")
    }

    #[test]
    fn classifies_admin_and_api_prefixed_paths() {
        assert_eq!(Capability::classify("/admin/waitlist"), Capability::Waitlist);
        assert_eq!(Capability::classify("/api/legal/privacy"), Capability::Legal);
        assert_eq!(Capability::classify("/api/admin/contacts"), Capability::Contacts);
        assert_eq!(Capability::classify("blogs/12"), Capability::Blog);
        assert_eq!(
            Capability::classify("/admin/dashboard-stats?range=7d"),
            Capability::DashboardStats
        );
    }

    #[test]
    fn auth_users_is_not_auth() {
        assert_eq!(Capability::classify("/admin/auth/users"), Capability::Users);
        assert_eq!(Capability::classify("/auth/users?page=2"), Capability::Users);
        assert_eq!(Capability::classify("/admin/auth/login"), Capability::Auth);
        assert_eq!(Capability::classify("/admin/login"), Capability::Auth);
    }

    #[test]
    fn routes_by_capability() {
        let t = table();
        assert_eq!(t.resolve_base_url("/admin/contacts"), "http://secondary:8000");
        assert_eq!(t.resolve_base_url("/admin/blogs"), "http://secondary:8000");
        assert_eq!(t.resolve_base_url("/api/legal/terms"), "http://secondary:8000");
        assert_eq!(t.resolve_base_url("/admin/waitlist"), "http://primary:8001");
        assert_eq!(t.resolve_base_url("/admin/auth/login"), "http://primary:8001");
    }

    #[test]
    fn resolve_is_total_and_deterministic() {
        let t = table();
        for path in [
            "", "/", "//", "?", "#x", "admin", "/admin/", "/api/admin", "/ü/ñ", "/admin/unknown",
            "/admin//contacts", "/ADMIN/contacts",
        ] {
            let first = t.resolve_base_url(path).to_string();
            assert_eq!(first, t.resolve_base_url(path));
            assert!(first == "http://primary:8001" || first == "http://secondary:8000");
        }
        assert_eq!(t.resolve_base_url("/admin//contacts"), "http://secondary:8000");
        assert_eq!(Capability::classify("/"), Capability::Unclassified);
    }

    #[test]
    fn url_for_keeps_query_and_adds_slash() {
        let t = table();
        assert_eq!(
            t.url_for("/admin/waitlist?page=2&limit=10"),
            "http://primary:8001/admin/waitlist?page=2&limit=10"
        );
        assert_eq!(t.url_for("api/legal/terms"), "http://secondary:8000/api/legal/terms");
    }

    #[test]
    fn path_helpers() {
        assert_eq!(normalize_path("admin/contacts?page=1#top"), "/admin/contacts");
        assert_eq!(meaningful_path("/api/admin/contacts?page=1"), "/contacts");
        assert_eq!(meaningful_path("/admin"), "/");
        assert!(is_login_endpoint("/admin/auth/login"));
        assert!(is_login_endpoint("/admin/login"));
        assert!(!is_login_endpoint("/admin/auth/users"));
        assert!(!is_login_endpoint("/login-history"));
    }

    #[test]
    fn rejection_policies() {
        assert_eq!(Capability::Legal.auth_rejection_policy(), AuthRejectionPolicy::Strict);
        assert!(matches!(
            Capability::Contacts.auth_rejection_policy(),
            AuthRejectionPolicy::Lenient { clear_on } if clear_on.contains(&"/contacts")
        ));
        assert_eq!(
            Capability::Waitlist.auth_rejection_policy(),
            AuthRejectionPolicy::Standard
        );
    }
}
