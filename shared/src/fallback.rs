//! 兜底响应
//!
//! 真实响应拿不到时（未登录、401、网络/CORS 失败），按接口能力生成形状正确的
//! 空数据，UI 永远不会读到缺失字段。形状必须与 [`crate::models`] 保持一致。

use serde_json::{Map, Value, json};

use crate::models::{DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::routing::Capability;

/// 空分页结构，`collection` 为列表字段名
fn empty_page(collection: &str) -> Value {
    let mut map = Map::new();
    map.insert(collection.to_string(), Value::Array(Vec::new()));
    map.insert("total".to_string(), json!(0));
    map.insert("total_pages".to_string(), json!(0));
    map.insert("page".to_string(), json!(DEFAULT_PAGE));
    map.insert("limit".to_string(), json!(DEFAULT_LIMIT));
    Value::Object(map)
}

impl Capability {
    /// 该能力的兜底数据
    pub fn fallback(self) -> Value {
        match self {
            Self::Waitlist | Self::Users => empty_page("users"),
            Self::Blog => empty_page("posts"),
            Self::Contacts => empty_page("messages"),
            Self::DashboardStats => json!({
                "waitlist_count": 0,
                "blog_post_count": 0,
                "newsletter_count": 0,
                "new_today_count": 0
            }),
            Self::Auth
            | Self::Newsletter
            | Self::Analytics
            | Self::Legal
            | Self::Unclassified => Value::Object(Map::new()),
        }
    }
}

/// 为请求路径生成兜底数据
pub fn synthesize(path: &str) -> Value {
    Capability::classify(path).fallback()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlogPage, ContactPage, DashboardStats, UsersPage, WaitlistPage};

    #[test]
    fn waitlist_fallback_is_exact() {
        assert_eq!(
            synthesize("/admin/waitlist"),
            json!({ "users": [], "total": 0, "total_pages": 0, "page": 1, "limit": 10 })
        );
    }

    #[test]
    fn stats_are_all_zero() {
        assert_eq!(
            synthesize("/admin/dashboard-stats"),
            json!({
                "waitlist_count": 0,
                "blog_post_count": 0,
                "newsletter_count": 0,
                "new_today_count": 0
            })
        );
    }

    #[test]
    fn unknown_endpoints_get_empty_object() {
        assert_eq!(synthesize("/admin/settings"), json!({}));
        assert_eq!(synthesize("/api/legal/terms"), json!({}));
    }

    // 兜底数据必须能被对应模型反序列化
    #[test]
    fn fallbacks_match_models() {
        let waitlist: WaitlistPage = serde_json::from_value(synthesize("/admin/waitlist")).unwrap();
        assert_eq!(waitlist, WaitlistPage::default());

        let users: UsersPage = serde_json::from_value(synthesize("/admin/auth/users")).unwrap();
        assert_eq!(users, UsersPage::default());

        let blogs: BlogPage = serde_json::from_value(synthesize("/admin/blogs?page=3")).unwrap();
        assert_eq!(blogs, BlogPage::default());

        let contacts: ContactPage = serde_json::from_value(synthesize("/admin/contacts")).unwrap();
        assert_eq!(contacts, ContactPage::default());

        let stats: DashboardStats =
            serde_json::from_value(synthesize("/admin/dashboard-stats")).unwrap();
        assert_eq!(stats, DashboardStats::default());
    }
}
