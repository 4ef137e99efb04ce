use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 分区标识（分区表的自增主键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub i64);

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 缓存条目在存储中的完整状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// 键
    pub key: String,
    /// 所属分区
    pub partition_id: PartitionId,
    /// 编码后的文本值
    pub value: String,
    /// 过期时间，None 表示永不过期
    pub expire_time: Option<DateTime<Utc>>,
    /// 命中次数
    pub hit_count: i64,
}

/// 待写入的行
///
/// 普通写入只覆盖值和过期时间；导入时 `hit_count` 为 Some，原样写回
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryWrite {
    pub key: String,
    pub partition_id: PartitionId,
    pub value: String,
    pub expire_time: Option<DateTime<Utc>>,
    pub hit_count: Option<i64>,
}

/// 快照记录（导出文件中的一条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// 键
    pub key: String,
    /// 编码后的文本值
    pub value: String,
    /// ISO-8601 过期时间，null 表示永不过期
    pub expire_time: Option<String>,
    /// 命中次数
    pub hit_count: i64,
    /// 分区名（多分区导出时填写）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}
