//! Web Storage 封装模块
//!
//! 使用 `web_sys::Storage` 实现 [`StorageAdapter`]，localStorage 保存凭据，
//! sessionStorage 保存跳转冷却状态。

use crate::adapter::StorageAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebStorage {
    Local,
    Session,
}

impl WebStorage {
    /// 获取 Storage 实例
    fn storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        match self {
            Self::Local => window.local_storage().ok()?,
            Self::Session => window.session_storage().ok()?,
        }
    }
}

impl StorageAdapter for WebStorage {
    fn is_available(&self) -> bool {
        self.storage().is_some()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.storage()
            .and_then(|s| s.set_item(key, value).ok())
            .is_some()
    }

    fn remove(&self, key: &str) -> bool {
        self.storage()
            .and_then(|s| s.remove_item(key).ok())
            .is_some()
    }
}
