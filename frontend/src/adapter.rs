//! 平台抽象层
//!
//! API 客户端只依赖这里的 trait，浏览器实现位于 [`crate::web`]，
//! 测试实现位于本文件的 `mock` 模块。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use impulstrip_admin_shared::Timestamp;
use impulstrip_admin_shared::protocol::HttpMethod;
use thiserror::Error;

// =========================================================
// HTTP 传输
// =========================================================

/// 浏览器在网络/CORS 失败时给出的错误文本
const NETWORK_ERROR_MARKERS: &[&str] = &[
    "Failed to fetch",
    "NetworkError",
    "Network request failed",
    "Load failed",
];

/// 通用 HTTP 请求结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub timeout: Duration,
    /// 跨域请求是否携带 Cookie
    pub include_credentials: bool,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
            timeout,
            include_credentials: false,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    /// 网络不可达或被 CORS 拦截
    #[error("网络错误: {0}")]
    Network(String),
    #[error("请求失败: {0}")]
    Other(String),
}

impl TransportError {
    /// 按浏览器异常的 `name` 与 `message` 归类
    pub fn classify(name: &str, message: &str, timeout: Duration) -> Self {
        if name == "AbortError" || name == "TimeoutError" {
            Self::Timeout(timeout)
        } else if NETWORK_ERROR_MARKERS.iter().any(|m| message.contains(m))
            || (name == "TypeError" && message.is_empty())
        {
            Self::Network(message.to_string())
        } else {
            Self::Other(format!("{}: {}", name, message))
        }
    }
}

/// HTTP 客户端特性 (Trait)
/// (?Send) 是因为浏览器环境下的 Future 不是 Send 的
#[async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// =========================================================
// 存储、Cookie、导航、时钟
// =========================================================

/// 抽象键值存储接口（localStorage / sessionStorage）
pub trait StorageAdapter {
    /// 非浏览器环境下返回 false，此时所有读写都是空操作
    fn is_available(&self) -> bool;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str) -> bool;
}

/// 抽象 Cookie 写入接口，参数为完整的 `document.cookie` 字符串
pub trait CookieAdapter {
    fn write(&self, cookie: &str);
}

/// 抽象页面导航接口
#[async_trait(?Send)]
pub trait Navigator {
    fn is_browser(&self) -> bool;
    fn current_path(&self) -> String;
    /// 整页跳转，返回时导航已开始
    async fn redirect(&self, target: &str);
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// =========================================================
// 测试实现
// =========================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// 内存存储，克隆后共享同一份数据
    #[derive(Clone)]
    pub struct MockStorage {
        map: Rc<RefCell<HashMap<String, String>>>,
        available: bool,
        writes: Rc<Cell<usize>>,
    }

    impl MockStorage {
        pub fn new() -> Self {
            Self {
                map: Rc::new(RefCell::new(HashMap::new())),
                available: true,
                writes: Rc::new(Cell::new(0)),
            }
        }

        /// 模拟非浏览器环境
        pub fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::new()
            }
        }

        pub fn with(self, key: &str, value: &str) -> Self {
            self.map
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            self
        }

        pub fn peek(&self, key: &str) -> Option<String> {
            self.map.borrow().get(key).cloned()
        }

        pub fn is_empty(&self) -> bool {
            self.map.borrow().is_empty()
        }

        /// set 与 remove 的调用次数
        pub fn write_count(&self) -> usize {
            self.writes.get()
        }
    }

    impl StorageAdapter for MockStorage {
        fn is_available(&self) -> bool {
            self.available
        }

        fn get(&self, key: &str) -> Option<String> {
            if !self.available {
                return None;
            }
            self.peek(key)
        }

        fn set(&self, key: &str, value: &str) -> bool {
            if !self.available {
                return false;
            }
            self.writes.set(self.writes.get() + 1);
            self.map
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            true
        }

        fn remove(&self, key: &str) -> bool {
            if !self.available {
                return false;
            }
            self.writes.set(self.writes.get() + 1);
            self.map.borrow_mut().remove(key);
            true
        }
    }

    /// 记录所有写入的 Cookie 字符串
    #[derive(Clone, Default)]
    pub struct MockCookies {
        written: Rc<RefCell<Vec<String>>>,
    }

    impl MockCookies {
        pub fn written(&self) -> Vec<String> {
            self.written.borrow().clone()
        }
    }

    impl CookieAdapter for MockCookies {
        fn write(&self, cookie: &str) {
            self.written.borrow_mut().push(cookie.to_string());
        }
    }

    /// 可手动拨动的时钟
    #[derive(Clone)]
    pub struct MockClock(Rc<Cell<i64>>);

    impl MockClock {
        pub fn at(ms: i64) -> Self {
            Self(Rc::new(Cell::new(ms)))
        }

        pub fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by.as_millis() as i64);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0.get())
        }
    }

    /// 记录跳转目标
    #[derive(Clone)]
    pub struct MockNavigator {
        browser: bool,
        path: Rc<RefCell<String>>,
        redirects: Rc<RefCell<Vec<String>>>,
    }

    impl MockNavigator {
        pub fn at(path: &str) -> Self {
            Self {
                browser: true,
                path: Rc::new(RefCell::new(path.to_string())),
                redirects: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub fn server_side() -> Self {
            Self {
                browser: false,
                ..Self::at("/")
            }
        }

        pub fn redirects(&self) -> Vec<String> {
            self.redirects.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl Navigator for MockNavigator {
        fn is_browser(&self) -> bool {
            self.browser
        }

        fn current_path(&self) -> String {
            self.path.borrow().clone()
        }

        // 跳转后不改变当前路径，模拟页面尚未卸载时的并发请求
        async fn redirect(&self, target: &str) {
            self.redirects.borrow_mut().push(target.to_string());
        }
    }

    /// 按 URL 返回预设响应，并记录所有请求
    #[derive(Clone, Default)]
    pub struct MockHttpClient {
        responses: Rc<RefCell<HashMap<String, VecDeque<Result<HttpResponse, TransportError>>>>>,
        requests: Rc<RefCell<Vec<HttpRequest>>>,
        yielding: Rc<Cell<bool>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// 取到响应后先让出一次执行权，使并发请求都拿到响应后才开始处理
        pub fn yield_before_reply(&self) {
            self.yielding.set(true);
        }

        pub fn mock_response(&self, url: &str, status: u16, body: &str) {
            self.push(
                url,
                Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
            );
        }

        pub fn mock_error(&self, url: &str, error: TransportError) {
            self.push(url, Err(error));
        }

        fn push(&self, url: &str, result: Result<HttpResponse, TransportError>) {
            self.responses
                .borrow_mut()
                .entry(url.to_string())
                .or_default()
                .push_back(result);
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl HttpClient for MockHttpClient {
        async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = req.url.clone();
            self.requests.borrow_mut().push(req);

            let reply = {
                let mut responses = self.responses.borrow_mut();
                match responses.get_mut(&url) {
                    // 最后一个响应可重复使用
                    Some(q) if q.len() > 1 => q.pop_front().unwrap(),
                    Some(q) if q.len() == 1 => q[0].clone(),
                    _ => Ok(HttpResponse {
                        status: 404,
                        body: r#"{"error":"Not Found"}"#.to_string(),
                    }),
                }
            };

            if self.yielding.get() {
                tokio::task::yield_now().await;
            }
            reply
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_are_classified() {
        let timeout = Duration::from_secs(30);
        assert_eq!(
            TransportError::classify("AbortError", "The user aborted a request.", timeout),
            TransportError::Timeout(timeout)
        );
        for message in [
            "Failed to fetch",
            "NetworkError when attempting to fetch resource.",
            "Network request failed",
            "Load failed",
        ] {
            assert!(matches!(
                TransportError::classify("TypeError", message, timeout),
                TransportError::Network(_)
            ));
        }
        assert!(matches!(
            TransportError::classify("SyntaxError", "bad header", timeout),
            TransportError::Other(_)
        ));
    }
}
