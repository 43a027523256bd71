//! 后端接口的数据模型
//!
//! 列表与统计类模型全部 `#[serde(default)]`，保证兜底数据和字段缺失的响应
//! 都能反序列化。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::Timestamp;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn to_query(&self) -> String {
        format!("page={}&limit={}", self.page, self.limit)
    }
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

// =========================================================
// 列表实体
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitlistEntry {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: Option<String>,
}

// =========================================================
// 分页响应
// =========================================================

macro_rules! page_type {
    ($(#[$meta:meta])* $name:ident, $field:ident: $item:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default)]
            pub $field: Vec<$item>,
            #[serde(default)]
            pub total: u64,
            #[serde(default)]
            pub total_pages: u64,
            #[serde(default = "default_page")]
            pub page: u32,
            #[serde(default = "default_limit")]
            pub limit: u32,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $field: Vec::new(),
                    total: 0,
                    total_pages: 0,
                    page: DEFAULT_PAGE,
                    limit: DEFAULT_LIMIT,
                }
            }
        }
    };
}

page_type!(
    /// 候补名单分页
    WaitlistPage, users: WaitlistEntry
);
page_type!(
    /// 管理员用户分页
    UsersPage, users: AdminUser
);
page_type!(
    /// 博客文章分页
    BlogPage, posts: BlogPost
);
page_type!(
    /// 联系人留言分页
    ContactPage, messages: ContactMessage
);

// =========================================================
// 统计、认证、法律文档
// =========================================================

/// 仪表盘统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub waitlist_count: u64,
    pub blog_post_count: u64,
    pub newsletter_count: u64,
    pub new_today_count: u64,
}

/// 登录响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// 令牌校验结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenValidation {
    pub valid: bool,
    pub user: Option<Value>,
}

/// 法律文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalDocument {
    #[serde(alias = "type")]
    pub doc_type: String,
    pub content: String,
    pub updated_at: Option<String>,
}

/// 健康检查响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

impl HealthStatus {
    pub fn ok(now: Timestamp) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: now.to_rfc3339(),
        }
    }
}
