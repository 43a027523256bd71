//! 后端诊断
//!
//! 排查登录失败与 CORS 问题时的几项检查：
//! - `ping`: 两个后端的连通性与延迟
//! - `cors`: 预检与实际请求的 `Access-Control-*` 头分析
//! - `endpoints`: 管理接口各路由前缀变体的探测
//! - `login`: 登录并用返回的令牌调用校验接口
//!
//! 报告均为结构化数据，[`Report::log`] 负责输出。密码与完整令牌不会出现在报告中。

use std::time::{Duration, Instant};

use impulstrip_admin_shared::models::{LoginResponse, TokenValidation};
use impulstrip_admin_shared::protocol::{
    ApiRequest, HttpMethod, LoginRequest, ValidateTokenRequest,
};
use impulstrip_admin_shared::routing::{Backend, RoutingTable};
use impulstrip_admin_shared::{CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE};
use impulstrip_admin_shared::credential;
use reqwest::Method;
use serde_json::Value;

use crate::TRACING_TARGET_DOCTOR;
use crate::error::{DoctorError, DoctorResult};
use crate::request::{HttpClient, HttpRequest, HttpResponse};

/// 探测的管理接口
pub const PROBED_RESOURCES: &[&str] = &[
    "waitlist",
    "blogs",
    "contacts",
    "dashboard-stats",
    "auth/users",
];

/// 路由前缀变体
pub const ROUTE_PREFIXES: &[&str] = &["/admin/", "/", "/api/", "/api/admin/"];

/// `cors` 未指定 URL 时探测的路径
pub const DEFAULT_CORS_PATH: &str = "/admin/contacts";

const CORS_HEADERS: &[&str] = &[
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-allow-credentials",
    "access-control-max-age",
    "access-control-expose-headers",
];

fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

/// 从错误响应体中取出可读信息
fn error_message(resp: &HttpResponse) -> String {
    serde_json::from_str::<Value>(&resp.body)
        .ok()
        .and_then(|v| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP {}", resp.status))
}

// =========================================================
// 报告类型
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

/// 统一的报告输出
pub trait Report {
    /// 报告中是否有错误级别的问题
    fn has_errors(&self) -> bool;

    fn log(&self);
}

fn log_line(severity: Severity, message: &str) {
    match severity {
        Severity::Ok => tracing::info!(target: TRACING_TARGET_DOCTOR, "{}", message),
        Severity::Warning => tracing::warn!(target: TRACING_TARGET_DOCTOR, "{}", message),
        Severity::Error => tracing::error!(target: TRACING_TARGET_DOCTOR, "{}", message),
    }
}

// ---------------------------------------------------------
// ping
// ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PingOutcome {
    Reachable {
        status: u16,
        latency: Duration,
        body: Option<Value>,
    },
    Failed {
        status: u16,
        latency: Duration,
    },
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingReport {
    pub backend: Backend,
    pub url: String,
    pub outcome: PingOutcome,
}

impl Report for Vec<PingReport> {
    fn has_errors(&self) -> bool {
        self.iter()
            .any(|r| !matches!(r.outcome, PingOutcome::Reachable { .. }))
    }

    fn log(&self) {
        for report in self {
            let name = match report.backend {
                Backend::Primary => "primary",
                Backend::Secondary => "secondary",
            };
            match &report.outcome {
                PingOutcome::Reachable {
                    status,
                    latency,
                    body,
                } => tracing::info!(
                    target: TRACING_TARGET_DOCTOR,
                    backend = name,
                    url = %report.url,
                    status = *status,
                    latency_ms = latency.as_millis() as u64,
                    json = body.is_some(),
                    "Backend reachable"
                ),
                PingOutcome::Failed { status, latency } => tracing::error!(
                    target: TRACING_TARGET_DOCTOR,
                    backend = name,
                    url = %report.url,
                    status = *status,
                    latency_ms = latency.as_millis() as u64,
                    "Backend answered with an error status"
                ),
                PingOutcome::Unreachable(error) => tracing::error!(
                    target: TRACING_TARGET_DOCTOR,
                    backend = name,
                    url = %report.url,
                    error = %error,
                    "Backend unreachable. Is the server running and accepting connections?"
                ),
            }
        }
    }
}

// ---------------------------------------------------------
// cors
// ---------------------------------------------------------

/// 响应中的 CORS 相关头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsHeaders {
    pub status: u16,
    pub allow_origin: Option<String>,
    pub allow_methods: Option<String>,
    pub allow_headers: Option<String>,
    pub allow_credentials: Option<String>,
    pub max_age: Option<String>,
    pub expose_headers: Option<String>,
}

impl CorsHeaders {
    pub fn from_response(resp: &HttpResponse) -> Self {
        let get = |name: &str| resp.header(name).map(str::to_string);
        Self {
            status: resp.status,
            allow_origin: get(CORS_HEADERS[0]),
            allow_methods: get(CORS_HEADERS[1]),
            allow_headers: get(CORS_HEADERS[2]),
            allow_credentials: get(CORS_HEADERS[3]),
            max_age: get(CORS_HEADERS[4]),
            expose_headers: get(CORS_HEADERS[5]),
        }
    }

    fn entries(&self) -> [(&'static str, Option<&str>); 6] {
        [
            (CORS_HEADERS[0], self.allow_origin.as_deref()),
            (CORS_HEADERS[1], self.allow_methods.as_deref()),
            (CORS_HEADERS[2], self.allow_headers.as_deref()),
            (CORS_HEADERS[3], self.allow_credentials.as_deref()),
            (CORS_HEADERS[4], self.max_age.as_deref()),
            (CORS_HEADERS[5], self.expose_headers.as_deref()),
        ]
    }

    fn allows_credentials(&self) -> bool {
        self.allow_credentials
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsFinding {
    pub severity: Severity,
    pub message: String,
}

impl CorsFinding {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// 分析实际响应的 CORS 头
pub fn analyze_cors(actual: &CorsHeaders, origin: &str) -> Vec<CorsFinding> {
    let mut findings = Vec::new();
    let credentials = actual.allows_credentials();

    match actual.allow_origin.as_deref().map(str::trim) {
        None | Some("") => findings.push(CorsFinding::new(
            Severity::Error,
            "Access-Control-Allow-Origin header is missing",
        )),
        Some("*") => {
            findings.push(CorsFinding::new(
                Severity::Warning,
                "Access-Control-Allow-Origin is the wildcard \"*\"",
            ));
            if credentials {
                findings.push(CorsFinding::new(
                    Severity::Error,
                    "Wildcard origin with credentials is rejected by browsers; return the specific origin instead",
                ));
            } else {
                findings.push(CorsFinding::new(
                    Severity::Warning,
                    "Wildcard origin without credentials works, but cookies and auth headers are not sent",
                ));
            }
        }
        Some(allowed) => {
            if allowed == origin {
                findings.push(CorsFinding::new(
                    Severity::Ok,
                    format!("Access-Control-Allow-Origin matches {}", origin),
                ));
            } else {
                findings.push(CorsFinding::new(
                    Severity::Error,
                    format!("Access-Control-Allow-Origin is {}, not {}", allowed, origin),
                ));
            }
            if credentials {
                findings.push(CorsFinding::new(
                    Severity::Ok,
                    "Access-Control-Allow-Credentials is true",
                ));
            } else {
                findings.push(CorsFinding::new(
                    Severity::Warning,
                    "Access-Control-Allow-Credentials is not true, credentials will not be sent",
                ));
            }
        }
    }

    findings
}

/// 预检响应是否放行 `Authorization` 头
fn analyze_preflight(preflight: &CorsHeaders) -> Option<CorsFinding> {
    let allowed = preflight.allow_headers.as_deref()?;
    let permits_auth = allowed
        .split(',')
        .map(str::trim)
        .any(|h| h == "*" || h.eq_ignore_ascii_case(HEADER_AUTHORIZATION));
    (!permits_auth).then(|| {
        CorsFinding::new(
            Severity::Warning,
            "Preflight Access-Control-Allow-Headers does not include Authorization",
        )
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorsReport {
    pub url: String,
    pub origin: String,
    pub preflight: CorsHeaders,
    pub actual: CorsHeaders,
    pub findings: Vec<CorsFinding>,
}

impl Report for CorsReport {
    fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    fn log(&self) {
        for (label, headers) in [("preflight", &self.preflight), ("actual", &self.actual)] {
            for (name, value) in headers.entries() {
                tracing::info!(
                    target: TRACING_TARGET_DOCTOR,
                    response = label,
                    status = headers.status,
                    header = name,
                    value = value.unwrap_or("<not set>"),
                    "CORS header"
                );
            }
        }
        for finding in &self.findings {
            log_line(finding.severity, &finding.message);
        }
    }
}

// ---------------------------------------------------------
// endpoints
// ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointStatus {
    Working(u16),
    /// 路由存在但需要认证
    RequiresAuth(u16),
    NotFound,
    Error(String),
}

impl EndpointStatus {
    fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Working(status),
            401 | 403 => Self::RequiresAuth(status),
            404 => Self::NotFound,
            other => Self::Error(format!("HTTP {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointProbe {
    pub resource: &'static str,
    pub path: String,
    pub url: String,
    pub status: EndpointStatus,
}

impl Report for Vec<EndpointProbe> {
    /// 某个接口的所有变体都不可用时视为错误
    fn has_errors(&self) -> bool {
        PROBED_RESOURCES.iter().any(|resource| {
            !self.iter().any(|p| {
                p.resource == *resource
                    && matches!(
                        p.status,
                        EndpointStatus::Working(_) | EndpointStatus::RequiresAuth(_)
                    )
            })
        })
    }

    fn log(&self) {
        for probe in self {
            let (severity, outcome) = match &probe.status {
                EndpointStatus::Working(s) => (Severity::Ok, format!("working ({})", s)),
                EndpointStatus::RequiresAuth(s) => {
                    (Severity::Warning, format!("requires auth ({})", s))
                }
                EndpointStatus::NotFound => (Severity::Warning, "not found".to_string()),
                EndpointStatus::Error(e) => (Severity::Error, e.clone()),
            };
            log_line(severity, &format!("{:<28} {}", probe.path, outcome));
        }
    }
}

// ---------------------------------------------------------
// login
// ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid { user: Option<Value> },
    Invalid,
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginReport {
    pub token_preview: String,
    pub token_well_formed: bool,
    pub token_type: Option<String>,
    pub user: Option<Value>,
    pub validation: ValidationOutcome,
}

impl Report for LoginReport {
    fn has_errors(&self) -> bool {
        !self.token_well_formed || !matches!(self.validation, ValidationOutcome::Valid { .. })
    }

    fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_DOCTOR,
            token = %self.token_preview,
            token_type = self.token_type.as_deref().unwrap_or("-"),
            user_returned = self.user.is_some(),
            "Login succeeded, token received"
        );
        if !self.token_well_formed {
            log_line(
                Severity::Error,
                "Token is not in header.payload.signature form, the dashboard will discard it",
            );
        }
        match &self.validation {
            ValidationOutcome::Valid { .. } => log_line(Severity::Ok, "Token validated"),
            ValidationOutcome::Invalid => {
                log_line(Severity::Error, "Validation endpoint reports the token as invalid")
            }
            ValidationOutcome::Rejected { status, message } => log_line(
                Severity::Error,
                &format!("Validation rejected ({}): {}", status, message),
            ),
        }
    }
}

// =========================================================
// 诊断服务
// =========================================================

pub struct Doctor<H: HttpClient> {
    http: H,
    routes: RoutingTable,
}

impl<H: HttpClient> Doctor<H> {
    pub fn new(http: H, routes: RoutingTable) -> Self {
        Self { http, routes }
    }

    fn build<R: ApiRequest>(&self, req: &R, token: Option<&str>) -> HttpRequest {
        let mut http_req = HttpRequest::new(self.routes.url_for(&req.path()), method_of(R::METHOD))
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);
        if let Some(token) = token {
            http_req = http_req.with_header(HEADER_AUTHORIZATION, &credential::bearer(token));
        }
        if let Some(body) = req.body() {
            http_req = http_req.with_body(body);
        }
        http_req
    }

    pub async fn ping(&self) -> Vec<PingReport> {
        let mut reports = Vec::new();
        for backend in [Backend::Primary, Backend::Secondary] {
            let url = format!("{}/ping", self.routes.base_url(backend));
            let req = HttpRequest::get(&url).with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);

            let started = Instant::now();
            let outcome = match self.http.send(req).await {
                Ok(resp) if resp.is_success() => PingOutcome::Reachable {
                    status: resp.status,
                    latency: started.elapsed(),
                    body: serde_json::from_str(&resp.body).ok(),
                },
                Ok(resp) => PingOutcome::Failed {
                    status: resp.status,
                    latency: started.elapsed(),
                },
                Err(e) => PingOutcome::Unreachable(e.to_string()),
            };

            reports.push(PingReport {
                backend,
                url,
                outcome,
            });
        }
        reports
    }

    /// 未指定 URL 时探测副后端的联系人接口
    pub fn default_cors_url(&self) -> String {
        self.routes.url_for(DEFAULT_CORS_PATH)
    }

    pub async fn cors(&self, url: &str, origin: &str) -> DoctorResult<CorsReport> {
        let preflight_req = HttpRequest::new(url, Method::OPTIONS)
            .with_header("Origin", origin)
            .with_header("Access-Control-Request-Method", "GET")
            .with_header(
                "Access-Control-Request-Headers",
                "authorization, content-type",
            );
        let preflight = CorsHeaders::from_response(&self.http.send(preflight_req).await?);

        let actual_req = HttpRequest::get(url)
            .with_header("Origin", origin)
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);
        let actual = CorsHeaders::from_response(&self.http.send(actual_req).await?);

        let mut findings = analyze_cors(&actual, origin);
        findings.extend(analyze_preflight(&preflight));

        Ok(CorsReport {
            url: url.to_string(),
            origin: origin.to_string(),
            preflight,
            actual,
            findings,
        })
    }

    pub async fn endpoints(&self, token: Option<&str>) -> Vec<EndpointProbe> {
        let mut probes = Vec::new();
        for resource in PROBED_RESOURCES {
            for prefix in ROUTE_PREFIXES {
                let path = format!("{}{}", prefix, resource);
                let url = self.routes.url_for(&path);
                let mut req =
                    HttpRequest::get(&url).with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);
                if let Some(token) = token {
                    req = req.with_header(HEADER_AUTHORIZATION, &credential::bearer(token));
                }

                let status = match self.http.send(req).await {
                    Ok(resp) => EndpointStatus::from_status(resp.status),
                    Err(e) => EndpointStatus::Error(e.to_string()),
                };
                probes.push(EndpointProbe {
                    resource,
                    path,
                    url,
                    status,
                });
            }
        }
        probes
    }

    pub async fn login(&self, username: &str, password: &str) -> DoctorResult<LoginReport> {
        let login = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        tracing::debug!(target: TRACING_TARGET_DOCTOR, request = ?login, "Sending login request");

        let resp = self.http.send(self.build(&login, None)).await?;
        if !resp.is_success() {
            return Err(DoctorError::LoginRejected {
                status: resp.status,
                message: error_message(&resp),
            });
        }
        let session: LoginResponse = resp.json()?;

        let resp = self
            .http
            .send(self.build(&ValidateTokenRequest, Some(&session.access_token)))
            .await?;
        let validation = if resp.is_success() {
            let result: TokenValidation = resp.json()?;
            if result.valid {
                ValidationOutcome::Valid { user: result.user }
            } else {
                ValidationOutcome::Invalid
            }
        } else {
            ValidationOutcome::Rejected {
                status: resp.status,
                message: error_message(&resp),
            }
        };

        Ok(LoginReport {
            token_preview: credential::mask(&session.access_token),
            token_well_formed: credential::is_well_formed(&session.access_token),
            token_type: session.token_type,
            user: session.user,
            validation,
        })
    }
}

#[cfg(test)]
mod tests;
