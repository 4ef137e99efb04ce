//! 数据库适配器模块
//!
//! 提供统一的缓存表操作接口，屏蔽不同数据库的实现差异。
//! 每个写操作都在单个事务内完成，任何一步失败时事务随丢弃回滚。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CacheResult;
use crate::pool::DatabaseConnection;
use crate::table::CacheSchema;
use crate::types::*;

// 导入各个数据库适配器 (条件编译)
#[cfg(feature = "postgres-support")]
mod postgres;
#[cfg(feature = "sqlite-support")]
mod sqlite;

// 条件导出适配器
#[cfg(feature = "postgres-support")]
pub use postgres::PostgresAdapter;
#[cfg(feature = "sqlite-support")]
pub use sqlite::SqliteAdapter;

/// 缓存适配器trait，定义缓存表的全部存储操作
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// 适配器使用的表结构
    fn schema(&self) -> &CacheSchema;

    /// 创建分区表、条目表和索引（幂等）
    async fn ensure_schema(&self, connection: &DatabaseConnection) -> CacheResult<()>;

    /// 按名字查找分区
    async fn find_partition(
        &self,
        connection: &DatabaseConnection,
        name: &str,
    ) -> CacheResult<Option<PartitionId>>;

    /// 插入分区
    ///
    /// 名字已存在（包括并发插入造成的唯一约束冲突）时返回 None
    async fn insert_partition(
        &self,
        connection: &DatabaseConnection,
        name: &str,
    ) -> CacheResult<Option<PartitionId>>;

    /// 在一个事务中写入多条记录
    ///
    /// 已存在的键覆盖值和过期时间；`hit_count` 为 Some 时一并覆盖，否则保留原值。
    /// 任意一条失败则整体回滚。返回写入条数。
    async fn upsert_entries(
        &self,
        connection: &DatabaseConnection,
        entries: &[EntryWrite],
    ) -> CacheResult<u64>;

    /// 读取未过期的值并把命中次数加一
    async fn fetch_and_touch(
        &self,
        connection: &DatabaseConnection,
        key: &str,
        partition_id: PartitionId,
        now: DateTime<Utc>,
    ) -> CacheResult<Option<String>>;

    /// 读取条目完整状态，不修改命中次数，过期条目也会返回
    async fn read_entry(
        &self,
        connection: &DatabaseConnection,
        key: &str,
        partition_id: PartitionId,
    ) -> CacheResult<Option<CacheEntry>>;

    /// 在一个事务中删除多个键，返回实际删除的行数
    async fn delete_keys(
        &self,
        connection: &DatabaseConnection,
        partition_id: PartitionId,
        keys: &[String],
    ) -> CacheResult<u64>;

    /// 删除分区内全部条目
    async fn flush_partition(
        &self,
        connection: &DatabaseConnection,
        partition_id: PartitionId,
    ) -> CacheResult<u64>;

    /// 导出条目（含已过期条目），附带分区名
    ///
    /// `partition_id` 为 None 时导出所有分区
    async fn export_entries(
        &self,
        connection: &DatabaseConnection,
        partition_id: Option<PartitionId>,
    ) -> CacheResult<Vec<(String, CacheEntry)>>;
}

/// 校验缓存键
pub(crate) fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(crate::cache_error!(validation, "key", "缓存键不能为空"));
    }
    Ok(())
}

/// 校验分区名
pub(crate) fn validate_partition_name(name: &str) -> CacheResult<()> {
    if name.is_empty() {
        return Err(crate::cache_error!(validation, "partition", "分区名不能为空"));
    }
    Ok(())
}

/// 根据表结构创建适配器
pub fn create_adapter(schema: CacheSchema) -> CacheResult<Box<dyn CacheAdapter>> {
    match schema.db_type() {
        #[cfg(feature = "sqlite-support")]
        DatabaseType::SQLite => Ok(Box::new(SqliteAdapter::new(schema))),
        #[cfg(feature = "postgres-support")]
        DatabaseType::PostgreSQL => Ok(Box::new(PostgresAdapter::new(schema))),
        #[allow(unreachable_patterns)]
        other => Err(crate::error::CacheError::ConfigError {
            message: crate::i18n::tf("error.backend_disabled", &[("db_type", other.as_str())]),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(validate_key("user:1").is_ok());
        assert!(matches!(
            validate_key(""),
            Err(crate::error::CacheError::ValidationError { .. })
        ));
        assert!(validate_partition_name("").is_err());
    }
}
