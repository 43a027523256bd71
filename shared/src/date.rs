//! 时间类型模块
//!
//! `Timestamp`: 可序列化的毫秒时间戳，用于存储凭据过期时间与重定向冷却窗口。
//! 取当前时间走 chrono（在 wasm32 下由 `wasmbind` 特性接到 `Date.now()`）。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::time::Duration;

/// 毫秒时间戳
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 创建新的时间戳
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 当前时间
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// 获取毫秒值
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// 获取秒值
    #[inline]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// 格式化为 RFC 3339 (毫秒精度, `Z` 结尾)
    ///
    /// 超出 chrono 可表示范围的值退回到 Unix 纪元。
    pub fn to_rfc3339(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// 从 RFC 3339 / ISO 8601 字符串解析
    ///
    /// 返回 None 如果解析失败
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| Self(dt.timestamp_millis()))
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let ms = i64::try_from(rhs.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(ms))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// 计算两个时间戳之间的差值，早于 rhs 时为零
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let diff_ms = (self.0 - rhs.0).max(0);
        Duration::from_millis(diff_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_roundtrip_keeps_millis() {
        let ts = Timestamp::new(1_700_000_000_123);
        let text = ts.to_rfc3339();
        assert_eq!(text, "2023-11-14T22:13:20.123Z");
        assert_eq!(Timestamp::parse_rfc3339(&text), Some(ts));
    }

    #[test]
    fn parses_offsets_and_rejects_garbage() {
        assert_eq!(
            Timestamp::parse_rfc3339("1970-01-01T01:00:00+01:00"),
            Some(Timestamp::new(0))
        );
        assert_eq!(Timestamp::parse_rfc3339("tomorrow"), None);
        assert_eq!(Timestamp::parse_rfc3339(""), None);
    }

    #[test]
    fn arithmetic_saturates() {
        let ts = Timestamp::new(1_000);
        assert_eq!(ts + Duration::from_millis(500), Timestamp::new(1_500));
        assert_eq!(Timestamp::new(500) - ts, Duration::ZERO);
        assert_eq!(ts - Timestamp::new(250), Duration::from_millis(750));
        assert_eq!(
            Timestamp::new(i64::MAX - 1) + Duration::from_secs(10),
            Timestamp::new(i64::MAX)
        );
    }
}
