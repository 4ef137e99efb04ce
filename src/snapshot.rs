//! 快照导入导出
//!
//! 快照是缓存条目的精确存储状态：编码后的值、过期时间（ISO-8601，null 表示永不过期）
//! 和命中次数。导出包含已过期但尚未删除的条目，导入原样写回过期时间和命中次数。
//! 快照文件为 UTF-8 JSON 数组，文件名必须以 `.json` 结尾。

use std::path::Path;

use chrono::{DateTime, Utc};
use rat_logger::{debug, info};

use crate::error::{CacheError, CacheResult};
use crate::ttl;
use crate::types::{CacheEntry, EntryWrite, PartitionId, SnapshotRecord};

/// 快照文件扩展名
pub const SNAPSHOT_EXTENSION: &str = ".json";

/// 条目转为快照记录
pub fn to_record(entry: &CacheEntry, partition: Option<&str>) -> SnapshotRecord {
    SnapshotRecord {
        key: entry.key.clone(),
        value: entry.value.clone(),
        expire_time: entry.expire_time.map(ttl::format_iso),
        hit_count: entry.hit_count,
        partition: partition.map(str::to_string),
    }
}

/// 检查快照记录能否写回，返回解析后的过期时间
pub fn check_record(record: &SnapshotRecord) -> CacheResult<Option<DateTime<Utc>>> {
    let expire_time = record
        .expire_time
        .as_deref()
        .map(ttl::parse_iso)
        .transpose()
        .map_err(|e| {
            crate::cache_error!(snapshot, format!("记录 '{}' 的过期时间无效: {}", record.key, e))
        })?;

    if record.hit_count < 0 {
        return Err(crate::cache_error!(
            snapshot,
            format!("记录 '{}' 的命中次数不能为负数: {}", record.key, record.hit_count)
        ));
    }

    Ok(expire_time)
}

/// 快照记录转为待写入的行，原样保留过期时间和命中次数
pub fn to_write(record: &SnapshotRecord, partition_id: PartitionId) -> CacheResult<EntryWrite> {
    let expire_time = check_record(record)?;

    Ok(EntryWrite {
        key: record.key.clone(),
        partition_id,
        value: record.value.clone(),
        expire_time,
        hit_count: Some(record.hit_count),
    })
}

fn check_extension(path: &Path) -> CacheResult<()> {
    let display = path.display().to_string();
    if !display.ends_with(SNAPSHOT_EXTENSION) {
        return Err(CacheError::SnapshotError {
            message: crate::i18n::tf("error.snapshot_extension", &[("path", &display)]),
        });
    }
    Ok(())
}

/// 将快照写入 JSON 文件
pub async fn write_file(path: &Path, records: &[SnapshotRecord]) -> CacheResult<()> {
    check_extension(path)?;

    let json = serde_json::to_string_pretty(records)
        .map_err(|e| crate::cache_error!(serialization, format!("序列化快照失败: {}", e)))?;
    tokio::fs::write(path, json).await?;

    info!("已导出 {} 条缓存记录到 {}", records.len(), path.display());
    Ok(())
}

/// 从 JSON 文件读取快照
pub async fn read_file(path: &Path) -> CacheResult<Vec<SnapshotRecord>> {
    check_extension(path)?;

    if !tokio::fs::try_exists(path).await? {
        return Err(CacheError::SnapshotError {
            message: crate::i18n::tf("error.snapshot_missing", &[("path", &path.display().to_string())]),
        });
    }

    let content = tokio::fs::read_to_string(path).await?;
    let records: Vec<SnapshotRecord> = serde_json::from_str(&content)
        .map_err(|e| crate::cache_error!(snapshot, format!("快照文件格式错误: {}", e)))?;

    debug!("从 {} 读取 {} 条快照记录", path.display(), records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry() -> CacheEntry {
        CacheEntry {
            key: "k".to_string(),
            partition_id: PartitionId(1),
            value: "{\"a\":1}".to_string(),
            expire_time: Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()),
            hit_count: 4,
        }
    }

    #[test]
    fn test_record_preserves_state() {
        let record = to_record(&entry(), None);
        assert_eq!(record.expire_time.as_deref(), Some("2030-01-02T03:04:05Z"));
        assert_eq!(record.hit_count, 4);

        let write = to_write(&record, PartitionId(9)).unwrap();
        assert_eq!(write.partition_id, PartitionId(9));
        assert_eq!(write.expire_time, entry().expire_time);
        assert_eq!(write.hit_count, Some(4));
    }

    #[test]
    fn test_partition_field_omitted_when_absent() {
        let json = serde_json::to_string(&to_record(&entry(), None)).unwrap();
        assert!(!json.contains("partition"));
        let json = serde_json::to_string(&to_record(&entry(), Some("users"))).unwrap();
        assert!(json.contains("\"partition\":\"users\""));
    }

    #[test]
    fn test_bad_records_rejected() {
        let mut record = to_record(&entry(), None);
        record.expire_time = Some("not a time".to_string());
        assert!(matches!(
            to_write(&record, PartitionId(1)),
            Err(CacheError::SnapshotError { .. })
        ));

        let mut record = to_record(&entry(), None);
        record.hit_count = -1;
        assert!(to_write(&record, PartitionId(1)).is_err());
        assert!(check_record(&record).is_err());
    }

    #[tokio::test]
    async fn test_file_checks() {
        let dir = tempfile::tempdir().unwrap();

        let wrong = dir.path().join("snapshot.txt");
        assert!(write_file(&wrong, &[]).await.is_err());
        assert!(!wrong.exists());

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_file(&missing).await, Err(CacheError::SnapshotError { .. })));

        let path = dir.path().join("snapshot.json");
        let records = vec![to_record(&entry(), None)];
        write_file(&path, &records).await.unwrap();
        assert_eq!(read_file(&path).await.unwrap(), records);
    }
}
