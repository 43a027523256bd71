//! 登录跳转去重
//!
//! 冷却状态保存在会话存储中，同一冷却窗口内的多次认证失败只触发一次跳转。

use std::time::Duration;

use impulstrip_admin_shared::redirect::{REDIRECT_STATE_KEY, RedirectState};

use crate::adapter::{Clock, StorageAdapter};

#[derive(Clone)]
pub struct RedirectGuard<S, C> {
    storage: S,
    clock: C,
    cooldown: Duration,
}

impl<S, C> RedirectGuard<S, C>
where
    S: StorageAdapter,
    C: Clock,
{
    pub fn new(storage: S, clock: C, cooldown: Duration) -> Self {
        Self {
            storage,
            clock,
            cooldown,
        }
    }

    /// 当前状态，过期的标记会被顺带删除
    pub fn state(&self) -> RedirectState {
        let stored = self.storage.get(REDIRECT_STATE_KEY);
        let state = RedirectState::from_stored(stored.as_deref(), self.clock.now());
        if state.is_idle() && stored.is_some() {
            self.storage.remove(REDIRECT_STATE_KEY);
        }
        state
    }

    pub fn should_redirect(&self) -> bool {
        self.state().is_idle()
    }

    pub fn begin_redirect(&self) {
        let state = RedirectState::begin(self.clock.now(), self.cooldown);
        if let Some(value) = state.encode() {
            self.storage.set(REDIRECT_STATE_KEY, &value);
        }
    }

    /// 空闲时进入冷却并返回 true，否则返回 false
    pub fn try_begin(&self) -> bool {
        if self.should_redirect() {
            self.begin_redirect();
            true
        } else {
            false
        }
    }

    /// 登录成功后复位
    pub fn reset(&self) {
        self.storage.remove(REDIRECT_STATE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::{MockClock, MockStorage};
    use impulstrip_admin_shared::Timestamp;

    #[test]
    fn coalesces_within_window() {
        let (storage, clock) = (MockStorage::new(), MockClock::at(10_000));
        let guard = RedirectGuard::new(storage.clone(), clock.clone(), Duration::from_secs(5));

        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        assert_eq!(
            guard.state(),
            RedirectState::Redirecting {
                until: Timestamp::new(15_000)
            }
        );

        clock.advance(Duration::from_secs(5));
        assert!(guard.should_redirect());
        // 过期标记已删除
        assert_eq!(storage.peek(REDIRECT_STATE_KEY), None);
        assert!(guard.try_begin());
    }

    #[test]
    fn garbage_flag_is_idle() {
        let storage = MockStorage::new().with(REDIRECT_STATE_KEY, "true");
        let guard = RedirectGuard::new(storage.clone(), MockClock::at(0), Duration::from_secs(5));

        assert!(guard.should_redirect());
        assert!(storage.is_empty());
    }

    #[test]
    fn reset_clears_cooldown() {
        let guard = RedirectGuard::new(MockStorage::new(), MockClock::at(0), Duration::from_secs(5));
        guard.begin_redirect();
        guard.reset();
        assert!(guard.should_redirect());
    }
}
