//! 凭据存储
//!
//! 令牌与过期时间保存在持久化存储中，同时镜像到 Cookie 供服务端会话闸门使用。
//! 读取时校验格式与有效期，无效凭据会被立即清除。

use std::time::Duration;

use impulstrip_admin_shared::config::AuthConfig;
use impulstrip_admin_shared::cookie::{removal_cookies, session_cookie};
use impulstrip_admin_shared::credential::{CredentialRecord, mask};
use serde_json::Value;

use crate::adapter::{Clock, CookieAdapter, StorageAdapter};

#[derive(Clone)]
pub struct TokenStore<S, K, C> {
    storage: S,
    cookies: K,
    clock: C,
    config: AuthConfig,
}

impl<S, K, C> TokenStore<S, K, C>
where
    S: StorageAdapter,
    K: CookieAdapter,
    C: Clock,
{
    pub fn new(storage: S, cookies: K, clock: C, config: AuthConfig) -> Self {
        Self {
            storage,
            cookies,
            clock,
            config,
        }
    }

    /// 返回有效令牌；存在但无效的凭据会被清除
    pub fn get_token(&self) -> Option<String> {
        if !self.storage.is_available() {
            return None;
        }

        let token = self.storage.get(&self.config.token_key);
        let expiry = self.storage.get(&self.config.expiry_key);
        if token.is_none() && expiry.is_none() {
            return None;
        }

        match CredentialRecord::from_stored(token, expiry, self.clock.now()) {
            Ok(record) => Some(record.token),
            Err(reason) => {
                log_warn!("[TokenStore] 凭据无效 ({})，已清除", reason);
                self.clear_token();
                None
            }
        }
    }

    pub fn set_token(&self, token: &str, ttl: Duration) {
        if !self.storage.is_available() {
            return;
        }

        let record = CredentialRecord::issue(token, self.clock.now(), ttl);
        self.storage.set(&self.config.token_key, &record.token);
        self.storage
            .set(&self.config.expiry_key, &record.expires_at.to_rfc3339());
        self.cookies.write(&session_cookie(
            &self.config.token_key,
            &record.token,
            ttl,
            self.config.cookie,
        ));
        log_info!(
            "[TokenStore] 已保存令牌 {}，过期时间 {}",
            mask(&record.token),
            record.expires_at.to_rfc3339()
        );
    }

    /// 清除令牌、过期时间、用户资料以及所有形式的会话 Cookie
    pub fn clear_token(&self) {
        if !self.storage.is_available() {
            return;
        }

        self.storage.remove(&self.config.token_key);
        self.storage.remove(&self.config.expiry_key);
        self.storage.remove(&self.config.user_data_key);
        for cookie in removal_cookies(&self.config.token_key) {
            self.cookies.write(&cookie);
        }
    }

    pub fn set_user_data(&self, user: &Value) {
        if !self.storage.is_available() {
            return;
        }
        self.storage
            .set(&self.config.user_data_key, &user.to_string());
    }

    pub fn get_user_data(&self) -> Option<Value> {
        let raw = self.storage.get(&self.config.user_data_key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_warn!("[TokenStore] 用户资料无法解析: {}", e);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}
