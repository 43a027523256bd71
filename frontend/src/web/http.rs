//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 实现 [`HttpClient`]，以 `AbortController` 实现超时。

use std::time::Duration;

use async_trait::async_trait;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AbortController, Headers, Request, RequestCredentials, RequestInit, RequestMode, Response,
};

use crate::adapter::{HttpClient, HttpRequest, HttpResponse, TransportError};

/// `setTimeout` 把超过 i32::MAX 的延迟当作 0
const MAX_TIMER_MS: u32 = i32::MAX as u32;

/// 中止计时器的毫秒数，超出计时器范围时取上限
fn abort_delay_ms(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).map_or(MAX_TIMER_MS, |ms| ms.min(MAX_TIMER_MS))
}

/// 读取 JS 异常的 `name` 与 `message`
fn error_parts(err: &JsValue) -> (String, String) {
    let read = |key: &str| {
        js_sys::Reflect::get(err, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    };
    let message = read("message");
    let message = if message.is_empty() {
        format!("{:?}", err)
    } else {
        message
    };
    (read("name"), message)
}

fn build_failed(e: JsValue) -> TransportError {
    TransportError::Other(format!("请求构建失败: {:?}", e))
}

/// 基于 `window.fetch` 的 HTTP 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = Headers::new().map_err(build_failed)?;
        for (key, value) in &req.headers {
            headers.set(key, value).map_err(build_failed)?;
        }

        let controller = AbortController::new().map_err(build_failed)?;

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        opts.set_mode(RequestMode::Cors);
        opts.set_signal(Some(&controller.signal()));
        if req.include_credentials {
            opts.set_credentials(RequestCredentials::Include);
        }
        if let Some(body) = &req.body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&req.url, &opts).map_err(build_failed)?;

        let window = web_sys::window()
            .ok_or_else(|| TransportError::Other("无法获取 window 对象".to_string()))?;

        // 超时后中止请求；Timeout 被 drop 时自动取消
        let abort_timer = {
            let controller = controller.clone();
            Timeout::new(abort_delay_ms(req.timeout), move || controller.abort())
        };

        let result = JsFuture::from(window.fetch_with_request(&request)).await;
        let resp_value = match result {
            Ok(value) => value,
            Err(err) => {
                drop(abort_timer);
                let (name, message) = error_parts(&err);
                return Err(TransportError::classify(&name, &message, req.timeout));
            }
        };

        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| TransportError::Other(format!("Response 类型转换失败: {:?}", e)))?;
        let status = response.status();

        let text_promise = response
            .text()
            .map_err(|e| TransportError::Other(format!("{:?}", e)))?;
        let body = JsFuture::from(text_promise).await.map_err(|err| {
            let (name, message) = error_parts(&err);
            TransportError::classify(&name, &message, req.timeout)
        })?;
        drop(abort_timer);

        Ok(HttpResponse {
            status,
            body: body.as_string().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_delay_is_clamped_to_timer_range() {
        assert_eq!(abort_delay_ms(Duration::from_secs(30)), 30_000);
        assert_eq!(abort_delay_ms(Duration::from_millis(u64::from(u32::MAX))), MAX_TIMER_MS);
        assert_eq!(abort_delay_ms(Duration::from_secs(u64::MAX)), MAX_TIMER_MS);
    }
}
