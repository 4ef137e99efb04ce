//! SQLite数据库适配器
//!
//! 使用sqlx实现缓存表操作。过期时间以毫秒时间戳保存在 INTEGER 列中。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rat_logger::debug;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{CacheAdapter, validate_key};
use crate::error::{CacheError, CacheResult};
use crate::pool::DatabaseConnection;
use crate::table::CacheSchema;
use crate::ttl;
use crate::types::*;

/// SQLite适配器
pub struct SqliteAdapter {
    schema: CacheSchema,
    sql: Statements,
}

/// 预先拼好的语句，表名已经过校验
struct Statements {
    find_partition: String,
    insert_partition: String,
    upsert: String,
    upsert_with_hits: String,
    touch: String,
    read: String,
    delete: String,
    flush: String,
    export: String,
    export_partition: String,
}

impl SqliteAdapter {
    /// 创建新的SQLite适配器
    pub fn new(schema: CacheSchema) -> Self {
        let entries = schema.entry_ident().to_string();
        let partitions = schema.partition_ident().to_string();
        let export = format!(
            "SELECT p.name AS partition_name, e.key, e.partition_id, e.value, e.expire_time, e.hit_count \
             FROM {} e JOIN {} p ON p.id = e.partition_id",
            entries, partitions
        );

        let sql = Statements {
            find_partition: format!("SELECT id FROM {} WHERE name = ?", partitions),
            insert_partition: format!(
                "INSERT INTO {} (name) VALUES (?) ON CONFLICT(name) DO NOTHING RETURNING id",
                partitions
            ),
            upsert: format!(
                "INSERT INTO {} (key, partition_id, value, expire_time, hit_count) VALUES (?, ?, ?, ?, 0) \
                 ON CONFLICT(key, partition_id) DO UPDATE SET value = excluded.value, expire_time = excluded.expire_time",
                entries
            ),
            upsert_with_hits: format!(
                "INSERT INTO {} (key, partition_id, value, expire_time, hit_count) VALUES (?, ?, ?, ?, ?) \
                 ON CONFLICT(key, partition_id) DO UPDATE SET value = excluded.value, \
                 expire_time = excluded.expire_time, hit_count = excluded.hit_count",
                entries
            ),
            touch: format!(
                "UPDATE {} SET hit_count = hit_count + 1 \
                 WHERE key = ? AND partition_id = ? AND (expire_time IS NULL OR expire_time > ?) \
                 RETURNING value",
                entries
            ),
            read: format!(
                "SELECT key, partition_id, value, expire_time, hit_count FROM {} WHERE key = ? AND partition_id = ?",
                entries
            ),
            delete: format!("DELETE FROM {} WHERE key = ? AND partition_id = ?", entries),
            flush: format!("DELETE FROM {} WHERE partition_id = ?", entries),
            export_partition: format!("{} WHERE e.partition_id = ? ORDER BY e.key", export),
            export: format!("{} ORDER BY p.name, e.key", export),
        };

        Self { schema, sql }
    }

    fn pool<'a>(&self, connection: &'a DatabaseConnection) -> CacheResult<&'a SqlitePool> {
        match connection {
            DatabaseConnection::SQLite(pool) => Ok(pool),
            #[allow(unreachable_patterns)]
            _ => Err(CacheError::ConnectionError {
                message: "Invalid connection type for SQLite".to_string(),
            }),
        }
    }

    /// 将行转换为缓存条目
    fn row_to_entry(row: &SqliteRow) -> CacheResult<CacheEntry> {
        let expire_time = row
            .try_get::<Option<i64>, _>("expire_time")?
            .map(ttl::from_millis)
            .transpose()?;

        Ok(CacheEntry {
            key: row.try_get("key")?,
            partition_id: PartitionId(row.try_get("partition_id")?),
            value: row.try_get("value")?,
            expire_time,
            hit_count: row.try_get("hit_count")?,
        })
    }
}

#[async_trait]
impl CacheAdapter for SqliteAdapter {
    fn schema(&self) -> &CacheSchema {
        &self.schema
    }

    async fn ensure_schema(&self, connection: &DatabaseConnection) -> CacheResult<()> {
        let pool = self.pool(connection)?;
        for statement in self.schema.create_statements() {
            sqlx::query(&statement).execute(pool).await?;
        }
        debug!("SQLite缓存表已就绪: {}", self.schema.entry_table());
        Ok(())
    }

    async fn find_partition(
        &self,
        connection: &DatabaseConnection,
        name: &str,
    ) -> CacheResult<Option<PartitionId>> {
        let pool = self.pool(connection)?;
        let id: Option<i64> = sqlx::query_scalar(&self.sql.find_partition)
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(id.map(PartitionId))
    }

    async fn insert_partition(
        &self,
        connection: &DatabaseConnection,
        name: &str,
    ) -> CacheResult<Option<PartitionId>> {
        let pool = self.pool(connection)?;
        let result = sqlx::query_scalar::<_, i64>(&self.sql.insert_partition)
            .bind(name)
            .fetch_optional(pool)
            .await;

        match result {
            Ok(id) => Ok(id.map(PartitionId)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("分区 {} 已被并发创建", name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_entries(
        &self,
        connection: &DatabaseConnection,
        entries: &[EntryWrite],
    ) -> CacheResult<u64> {
        let pool = self.pool(connection)?;
        let mut tx = pool.begin().await?;

        let mut written = 0;
        for entry in entries {
            validate_key(&entry.key)?;
            let expire_time = entry.expire_time.map(ttl::to_millis);

            let result = match entry.hit_count {
                Some(hit_count) => {
                    sqlx::query(&self.sql.upsert_with_hits)
                        .bind(&entry.key)
                        .bind(entry.partition_id.0)
                        .bind(&entry.value)
                        .bind(expire_time)
                        .bind(hit_count)
                        .execute(&mut *tx)
                        .await?
                }
                None => {
                    sqlx::query(&self.sql.upsert)
                        .bind(&entry.key)
                        .bind(entry.partition_id.0)
                        .bind(&entry.value)
                        .bind(expire_time)
                        .execute(&mut *tx)
                        .await?
                }
            };
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn fetch_and_touch(
        &self,
        connection: &DatabaseConnection,
        key: &str,
        partition_id: PartitionId,
        now: DateTime<Utc>,
    ) -> CacheResult<Option<String>> {
        let pool = self.pool(connection)?;
        let mut tx = pool.begin().await?;
        let value: Option<String> = sqlx::query_scalar(&self.sql.touch)
            .bind(key)
            .bind(partition_id.0)
            .bind(ttl::to_millis(now))
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(value)
    }

    async fn read_entry(
        &self,
        connection: &DatabaseConnection,
        key: &str,
        partition_id: PartitionId,
    ) -> CacheResult<Option<CacheEntry>> {
        let pool = self.pool(connection)?;
        let row = sqlx::query(&self.sql.read)
            .bind(key)
            .bind(partition_id.0)
            .fetch_optional(pool)
            .await?;
        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn delete_keys(
        &self,
        connection: &DatabaseConnection,
        partition_id: PartitionId,
        keys: &[String],
    ) -> CacheResult<u64> {
        let pool = self.pool(connection)?;
        let mut tx = pool.begin().await?;

        let mut deleted = 0;
        for key in keys {
            let result = sqlx::query(&self.sql.delete)
                .bind(key)
                .bind(partition_id.0)
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }

    async fn flush_partition(
        &self,
        connection: &DatabaseConnection,
        partition_id: PartitionId,
    ) -> CacheResult<u64> {
        let pool = self.pool(connection)?;
        let result = sqlx::query(&self.sql.flush)
            .bind(partition_id.0)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn export_entries(
        &self,
        connection: &DatabaseConnection,
        partition_id: Option<PartitionId>,
    ) -> CacheResult<Vec<(String, CacheEntry)>> {
        let pool = self.pool(connection)?;
        let rows = match partition_id {
            Some(partition_id) => {
                sqlx::query(&self.sql.export_partition)
                    .bind(partition_id.0)
                    .fetch_all(pool)
                    .await?
            }
            None => sqlx::query(&self.sql.export).fetch_all(pool).await?,
        };

        rows.iter()
            .map(|row| -> CacheResult<(String, CacheEntry)> {
                let partition: String = row.try_get("partition_name")?;
                Ok((partition, Self::row_to_entry(row)?))
            })
            .collect()
    }
}
