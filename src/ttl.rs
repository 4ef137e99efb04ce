//! TTL 计算与过期判定
//!
//! 写入时计算过期时间，读取时按过期时间过滤。没有后台清理任务，
//! 过期行在被删除、清空或覆盖之前仍然存在于表中。

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use std::time::Duration;

use crate::error::CacheResult;

/// 当前时间，截断到毫秒
///
/// 所有后端都能精确保存毫秒精度，导出再导入后时间戳保持不变
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// 根据TTL计算过期时间
///
/// `None` 或零时长表示永不过期
pub fn expire_time_from(now: DateTime<Utc>, ttl: Option<Duration>) -> CacheResult<Option<DateTime<Utc>>> {
    let ttl = match ttl {
        Some(ttl) if !ttl.is_zero() => ttl,
        _ => return Ok(None),
    };

    let delta = chrono::Duration::from_std(ttl)
        .map_err(|e| crate::cache_error!(validation, "ttl", format!("TTL超出范围: {}", e)))?;
    let expire_time = now
        .checked_add_signed(delta)
        .ok_or_else(|| crate::cache_error!(validation, "ttl", "TTL超出可表示的时间范围"))?;

    Ok(Some(expire_time.trunc_subsecs(3)))
}

/// 条目在 `now` 时刻是否有效
pub fn is_live(expire_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expire_time {
        Some(expire_time) => expire_time > now,
        None => true,
    }
}

/// 转为毫秒时间戳（SQLite 存储格式）
pub fn to_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// 从毫秒时间戳还原
pub fn from_millis(millis: i64) -> CacheResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| crate::cache_error!(serialization, format!("无效的毫秒时间戳: {}", millis)))
}

/// 格式化为 ISO-8601 字符串
pub fn format_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// 解析 ISO-8601 字符串
///
/// 不带时区的时间按 UTC 处理
pub fn parse_iso(s: &str) -> CacheResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(crate::cache_error!(serialization, format!("无法解析时间: '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_or_absent_ttl_never_expires() {
        let now = now();
        assert_eq!(expire_time_from(now, None).unwrap(), None);
        assert_eq!(expire_time_from(now, Some(Duration::ZERO)).unwrap(), None);
    }

    #[test]
    fn test_expire_time_is_now_plus_ttl() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let expire = expire_time_from(now, Some(Duration::from_secs(60))).unwrap().unwrap();
        assert_eq!(expire, Utc.with_ymd_and_hms(2025, 1, 1, 0, 1, 0).unwrap());
    }

    #[test]
    fn test_liveness_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(is_live(None, now));
        assert!(!is_live(Some(now), now));
        assert!(is_live(Some(now + chrono::Duration::milliseconds(1)), now));
    }

    #[test]
    fn test_huge_ttl_rejected() {
        let now = now();
        assert!(expire_time_from(now, Some(Duration::from_secs(u64::MAX))).is_err());
    }

    #[test]
    fn test_iso_formats() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap() + chrono::Duration::milliseconds(250);
        let text = format_iso(dt);
        assert_eq!(text, "2025-03-04T05:06:07.250Z");
        assert_eq!(parse_iso(&text).unwrap(), dt);

        // 不带时区的写法
        assert_eq!(parse_iso("2025-03-04T05:06:07.250").unwrap(), dt);
        assert_eq!(parse_iso("2025-03-04T05:06:07+00:00").unwrap(), dt.trunc_subsecs(0));
        assert!(parse_iso("yesterday").is_err());
    }

    #[test]
    fn test_millis_round_trip() {
        let dt = now();
        assert_eq!(from_millis(to_millis(dt)).unwrap(), dt);
    }
}
