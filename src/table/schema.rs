//! 缓存表结构定义
//!
//! 一个缓存实例使用两张表：
//! - `{table}_partitions`：分区名到自增ID的映射，名字唯一
//! - `{table}`：缓存条目，主键为 `(key, partition_id)`
//!
//! 两张表的名字都由同一个表名派生，结构本身固定，不随分区数量变化

use crate::error::CacheResult;
use crate::security::DatabaseSecurityValidator;
use crate::types::DatabaseType;

/// 默认表名
pub const DEFAULT_TABLE_NAME: &str = "cache_entries";

/// 缓存表名最大长度
///
/// 派生出的分区表名（`_partitions`）和索引名（`idx_` + `_key_expire_time`）
/// 都要落在 PostgreSQL 63 字节的标识符限制内
pub const MAX_CACHE_TABLE_NAME_LEN: usize = 40;

/// 缓存表结构
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSchema {
    db_type: DatabaseType,
    entry_table: String,
    partition_table: String,
    entry_ident: String,
    partition_ident: String,
}

impl CacheSchema {
    /// 根据表名创建表结构定义
    pub fn new(db_type: DatabaseType, table_name: &str) -> CacheResult<Self> {
        if table_name.len() > MAX_CACHE_TABLE_NAME_LEN {
            return Err(crate::cache_error!(
                validation,
                "table_name",
                format!("缓存表名长度不能超过{}个字符: {}", MAX_CACHE_TABLE_NAME_LEN, table_name)
            ));
        }

        let validator = DatabaseSecurityValidator::new(db_type);
        let partition_table = format!("{}_partitions", table_name);
        let entry_ident = validator.get_safe_table_identifier(table_name)?;
        let partition_ident = validator.get_safe_table_identifier(&partition_table)?;

        Ok(Self {
            db_type,
            entry_table: table_name.to_string(),
            partition_table,
            entry_ident,
            partition_ident,
        })
    }

    /// 数据库类型
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// 缓存条目表名
    pub fn entry_table(&self) -> &str {
        &self.entry_table
    }

    /// 分区表名
    pub fn partition_table(&self) -> &str {
        &self.partition_table
    }

    /// 带引号的缓存条目表标识符
    pub fn entry_ident(&self) -> &str {
        &self.entry_ident
    }

    /// 带引号的分区表标识符
    pub fn partition_ident(&self) -> &str {
        &self.partition_ident
    }

    /// 建表与建索引语句，全部是幂等的
    pub fn create_statements(&self) -> Vec<String> {
        let entries = self.entry_ident();
        let partitions = self.partition_ident();

        let (partition_ddl, entry_ddl) = match self.db_type {
            DatabaseType::SQLite => (
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id INTEGER PRIMARY KEY AUTOINCREMENT, \
                     name TEXT NOT NULL UNIQUE)",
                    partitions
                ),
                // expire_time 保存毫秒时间戳
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     key TEXT NOT NULL, \
                     partition_id INTEGER NOT NULL REFERENCES {}(id), \
                     value TEXT NOT NULL, \
                     expire_time INTEGER NULL, \
                     hit_count INTEGER NOT NULL DEFAULT 0, \
                     PRIMARY KEY (key, partition_id))",
                    entries, partitions
                ),
            ),
            DatabaseType::PostgreSQL => (
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id BIGSERIAL PRIMARY KEY, \
                     name TEXT NOT NULL UNIQUE)",
                    partitions
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     key TEXT NOT NULL, \
                     partition_id BIGINT NOT NULL REFERENCES {}(id), \
                     value TEXT NOT NULL, \
                     expire_time TIMESTAMPTZ NULL, \
                     hit_count BIGINT NOT NULL DEFAULT 0, \
                     PRIMARY KEY (key, partition_id))",
                    entries, partitions
                ),
            ),
        };

        vec![
            partition_ddl,
            entry_ddl,
            format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{}_key_expire_time\" ON {} (key, expire_time)",
                self.entry_table, entries
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{}_partition\" ON {} (partition_id)",
                self.entry_table, entries
            ),
        ]
    }
}
