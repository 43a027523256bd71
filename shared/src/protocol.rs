use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::models::{
    BlogPage, ContactPage, DashboardStats, LegalDocument, LoginResponse, PageQuery,
    TokenValidation, UsersPage, WaitlistPage,
};

/// 单个路径段内保留的字符
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn legal_path(doc_type: &str) -> String {
    format!("/api/legal/{}", utf8_percent_encode(doc_type, SEGMENT_SET))
}

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
///
/// 后端地址不在这里指定，由 [`crate::routing::RoutingTable`] 按路径决定。
pub trait ApiRequest {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// 是否附带 `Authorization` 头
    const REQUIRES_AUTH: bool = true;

    /// The URL path, including the query string.
    fn path(&self) -> String;

    /// JSON body, if any.
    fn body(&self) -> Option<Value> {
        None
    }
}

// =========================================================
// 认证
// =========================================================

/// Log in with username and password
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const REQUIRES_AUTH: bool = false;

    fn path(&self) -> String {
        "/admin/auth/login".to_string()
    }

    fn body(&self) -> Option<Value> {
        Some(json!({ "username": self.username, "password": self.password }))
    }
}

/// Ask the backend whether the stored token is still accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateTokenRequest;

impl ApiRequest for ValidateTokenRequest {
    type Response = TokenValidation;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/admin/auth/validate-token".to_string()
    }
}

// =========================================================
// 仪表盘与列表
// =========================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardStatsRequest;

impl ApiRequest for DashboardStatsRequest {
    type Response = DashboardStats;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/admin/dashboard-stats".to_string()
    }
}

macro_rules! list_request {
    ($(#[$meta:meta])* $name:ident, $path:literal, $response:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name(pub PageQuery);

        impl ApiRequest for $name {
            type Response = $response;
            const METHOD: HttpMethod = HttpMethod::Get;

            fn path(&self) -> String {
                format!("{}?{}", $path, self.0.to_query())
            }
        }
    };
}

list_request!(
    /// List waitlist sign-ups
    ListWaitlistRequest, "/admin/waitlist", WaitlistPage
);
list_request!(
    /// List admin users
    ListUsersRequest, "/admin/auth/users", UsersPage
);
list_request!(
    /// List blog posts (served by the secondary backend)
    ListBlogsRequest, "/admin/blogs", BlogPage
);
list_request!(
    /// List contact-form messages (served by the secondary backend)
    ListContactsRequest, "/admin/contacts", ContactPage
);

// =========================================================
// 法律文档
// =========================================================

#[derive(Debug, Clone)]
pub struct GetLegalDocumentRequest {
    pub doc_type: String,
}

impl ApiRequest for GetLegalDocumentRequest {
    type Response = LegalDocument;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        legal_path(&self.doc_type)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateLegalDocumentRequest {
    pub doc_type: String,
    pub content: String,
}

impl ApiRequest for UpdateLegalDocumentRequest {
    type Response = LegalDocument;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        legal_path(&self.doc_type)
    }

    fn body(&self) -> Option<Value> {
        Some(json!({ "content": self.content }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Backend, Capability};

    #[test]
    fn login_debug_hides_password() {
        let req = LoginRequest {
            username: "admin".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{:?}", req);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
        assert!(!LoginRequest::REQUIRES_AUTH);
    }

    #[test]
    fn list_paths_carry_paging() {
        let req = ListContactsRequest(PageQuery::new(2, 25));
        assert_eq!(req.path(), "/admin/contacts?page=2&limit=25");
        assert_eq!(Capability::classify(&req.path()).backend(), Backend::Secondary);

        let users = ListUsersRequest::default();
        assert_eq!(Capability::classify(&users.path()), Capability::Users);
    }

    #[test]
    fn legal_update_is_put_with_content() {
        let req = UpdateLegalDocumentRequest {
            doc_type: "privacy".into(),
            content: "# Privacy".into(),
        };
        assert_eq!(UpdateLegalDocumentRequest::METHOD.as_str(), "PUT");
        assert_eq!(req.path(), "/api/legal/privacy");
        assert_eq!(req.body(), Some(json!({ "content": "# Privacy" })));
    }

    #[test]
    fn legal_doc_type_stays_one_segment() {
        let req = GetLegalDocumentRequest {
            doc_type: "../admin/users?page=1".into(),
        };
        assert_eq!(req.path(), "/api/legal/..%2Fadmin%2Fusers%3Fpage%3D1");
        assert_eq!(Capability::classify(&req.path()), Capability::Legal);

        let req = GetLegalDocumentRequest {
            doc_type: "terms-of_service".into(),
        };
        assert_eq!(req.path(), "/api/legal/terms-of_service");
    }
}
