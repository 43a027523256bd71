//! `document.cookie` 写入

use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use crate::adapter::CookieAdapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCookies;

impl CookieAdapter for DocumentCookies {
    fn write(&self, cookie: &str) {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<HtmlDocument>().ok());
        if let Some(document) = document {
            let _ = document.set_cookie(cookie);
        }
    }
}
