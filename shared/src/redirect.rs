//! 登录跳转冷却状态机
//!
//! 状态：`Idle` -> `Redirecting { until }` -> (到期) -> `Idle`。
//! 状态以毫秒时间戳的形式保存在会话存储中，冷却窗口内最多发起一次登录跳转。

use std::time::Duration;

use crate::date::Timestamp;

/// 会话存储中的键
pub const REDIRECT_STATE_KEY: &str = "impulstrip_redirecting_until";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectState {
    Idle,
    Redirecting { until: Timestamp },
}

impl RedirectState {
    /// 从存储值恢复；无法解析或已过期都视为 `Idle`
    pub fn from_stored(stored: Option<&str>, now: Timestamp) -> Self {
        match stored.and_then(|s| s.trim().parse::<i64>().ok()) {
            Some(until) if Timestamp::new(until) > now => Self::Redirecting {
                until: Timestamp::new(until),
            },
            _ => Self::Idle,
        }
    }

    /// 开始一次跳转
    pub fn begin(now: Timestamp, cooldown: Duration) -> Self {
        Self::Redirecting {
            until: now + cooldown,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// 写入存储的值，`Idle` 表示删除
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Redirecting { until } => Some(until.as_millis().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let now = Timestamp::new(1_000);
        let state = RedirectState::begin(now, Duration::from_secs(5));
        assert_eq!(
            state,
            RedirectState::Redirecting {
                until: Timestamp::new(6_000)
            }
        );

        let stored = state.encode();
        assert_eq!(stored.as_deref(), Some("6000"));
        assert!(!RedirectState::from_stored(stored.as_deref(), Timestamp::new(5_999)).is_idle());
        assert!(RedirectState::from_stored(stored.as_deref(), Timestamp::new(6_000)).is_idle());
    }

    #[test]
    fn garbage_is_idle() {
        let now = Timestamp::new(0);
        assert!(RedirectState::from_stored(None, now).is_idle());
        assert!(RedirectState::from_stored(Some("true"), now).is_idle());
        assert_eq!(RedirectState::Idle.encode(), None);
    }
}
