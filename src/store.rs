//! 缓存访问层
//!
//! [`CacheStore`] 把分区解析、值编解码和TTL计算串起来，
//! 对外提供按 `(key, partition)` 寻址的缓存操作。每个公开操作都在一个有界事务内完成，
//! 进程内不对缓存状态加锁，并发调用之间由数据库隔离级别协调。
//!
//! 所有操作的 `partition` 参数为 `None` 时使用配置中的默认分区。
//!
//! 错误按 [`ErrorPolicy`] 处理：宽松模式记录日志后返回“无效果”的结果
//! （`Ok(())`、`Ok(None)`、`Ok(vec![])`、`Ok(0)`），严格模式直接返回错误。

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use rat_logger::{debug, error, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapter::{CacheAdapter, create_adapter, validate_key};
use crate::codec;
use crate::config::{CacheConfig, ErrorPolicy};
use crate::error::CacheResult;
use crate::partition::PartitionResolver;
use crate::pool::ConnectionPool;
use crate::snapshot;
use crate::table::CacheSchema;
use crate::ttl;
use crate::types::*;

/// 基于数据库表的键值缓存
pub struct CacheStore {
    config: CacheConfig,
    pool: ConnectionPool,
    adapter: Box<dyn CacheAdapter>,
    partitions: PartitionResolver,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.backend())
            .field("table_name", &self.table_name())
            .field("default_partition", &self.default_partition())
            .finish()
    }
}

impl CacheStore {
    /// 按配置建立缓存实例
    ///
    /// 配置了日志级别时安装终端日志器；`auto_init` 为 true 时创建缓存表。
    /// 构造阶段的失败总是直接返回，不受错误策略影响。
    pub async fn connect(config: CacheConfig) -> CacheResult<Self> {
        crate::config::builders::validate(&config)?;

        if let Some(level) = config.log_level {
            crate::logging::init_logger(level);
        }

        let schema = CacheSchema::new(config.db_type(), &config.table_name)?;
        let adapter = create_adapter(schema)?;
        let pool = ConnectionPool::connect(&config).await?;

        let store = Self {
            config,
            pool,
            adapter,
            partitions: PartitionResolver::new(),
        };

        if store.config.auto_init {
            store.adapter.ensure_schema(store.pool.connection()).await?;
        }

        info!(
            "缓存实例已就绪: 数据库类型={}, 表名={}, 默认分区={}",
            store.backend(),
            store.table_name(),
            store.default_partition()
        );
        Ok(store)
    }

    /// 使用连接串和默认配置建立缓存实例
    pub async fn connect_url(url: &str) -> CacheResult<Self> {
        let config = CacheConfig::builder().connection_url(url)?.build()?;
        Self::connect(config).await
    }

    /// 缓存条目表名
    pub fn table_name(&self) -> &str {
        self.adapter.schema().entry_table()
    }

    /// 默认分区名
    pub fn default_partition(&self) -> &str {
        &self.config.default_partition
    }

    /// 后端数据库类型
    pub fn backend(&self) -> DatabaseType {
        self.adapter.schema().db_type()
    }

    /// 实例配置
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// 创建缓存表和索引（幂等）
    pub async fn init_db(&self) -> CacheResult<()> {
        self.run("init_db", (), async {
            self.adapter.ensure_schema(self.pool.connection()).await?;
            info!("缓存表已初始化: {}", self.table_name());
            Ok(())
        })
        .await
    }

    /// 写入一个值
    ///
    /// `ttl` 为 None 或零表示永不过期。已存在的键覆盖值和过期时间，命中次数保留。
    pub async fn set(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<Duration>,
        partition: Option<&str>,
    ) -> CacheResult<()> {
        self.run("set", (), self.write_encoded(key, codec::encode(value), ttl, partition))
            .await
    }

    /// 写入任意可序列化的值
    pub async fn set_typed<T: Serialize + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        partition: Option<&str>,
    ) -> CacheResult<()> {
        self.run("set_typed", (), async {
            let text = codec::encode_typed(value)?;
            self.write_encoded(key, text, ttl, partition).await
        })
        .await
    }

    /// 读取一个值
    ///
    /// 未过期时返回解码后的值并把命中次数加一；不存在或已过期返回 None
    pub async fn get(&self, key: &str, partition: Option<&str>) -> CacheResult<Option<Value>> {
        self.run("get", None, async {
            let text = self.fetch(key, partition).await?;
            Ok(text.map(|text| codec::decode(&text)))
        })
        .await
    }

    /// 读取并反序列化为指定类型
    pub async fn get_typed<T: DeserializeOwned + Send>(
        &self,
        key: &str,
        partition: Option<&str>,
    ) -> CacheResult<Option<T>> {
        self.run("get_typed", None, async {
            match self.fetch(key, partition).await? {
                Some(text) => Ok(Some(codec::decode_typed(&text)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// 读取条目的完整状态
    ///
    /// 不修改命中次数，已过期但尚未删除的条目同样返回
    pub async fn entry(&self, key: &str, partition: Option<&str>) -> CacheResult<Option<CacheEntry>> {
        self.run("entry", None, async {
            validate_key(key)?;
            let partition_id = self.resolve(partition).await?;
            self.adapter
                .read_entry(self.pool.connection(), key, partition_id)
                .await
        })
        .await
    }

    /// 删除一个键，键不存在时同样成功
    pub async fn delete(&self, key: &str, partition: Option<&str>) -> CacheResult<()> {
        self.run("delete", (), async {
            validate_key(key)?;
            let partition_id = self.resolve(partition).await?;
            let deleted = self
                .adapter
                .delete_keys(self.pool.connection(), partition_id, &[key.to_string()])
                .await?;
            debug!("删除缓存键 {} (分区ID={}): {} 行", key, partition_id, deleted);
            Ok(())
        })
        .await
    }

    /// 在一个事务中写入多个值
    ///
    /// 分区只解析一次，所有条目共用同一个过期时间。任意一条失败则全部不写入。
    pub async fn set_bulk(
        &self,
        entries: &[(String, Value)],
        ttl: Option<Duration>,
        partition: Option<&str>,
    ) -> CacheResult<()> {
        self.run("set_bulk", (), async {
            let partition_id = self.resolve(partition).await?;
            let expire_time = ttl::expire_time_from(ttl::now(), ttl)?;

            let writes: Vec<EntryWrite> = entries
                .iter()
                .map(|(key, value)| EntryWrite {
                    key: key.clone(),
                    partition_id,
                    value: codec::encode(value),
                    expire_time,
                    hit_count: None,
                })
                .collect();

            let written = self
                .adapter
                .upsert_entries(self.pool.connection(), &writes)
                .await?;
            debug!("批量写入 {} 条 (分区ID={})", written, partition_id);
            Ok(())
        })
        .await
    }

    /// 在一个事务中删除多个键，返回实际删除的条数
    pub async fn delete_bulk<K: AsRef<str> + Sync>(
        &self,
        keys: &[K],
        partition: Option<&str>,
    ) -> CacheResult<u64> {
        self.run("delete_bulk", 0, async {
            let keys: Vec<String> = keys.iter().map(|key| key.as_ref().to_string()).collect();
            for key in &keys {
                validate_key(key)?;
            }
            let partition_id = self.resolve(partition).await?;
            self.adapter
                .delete_keys(self.pool.connection(), partition_id, &keys)
                .await
        })
        .await
    }

    /// 清空一个分区，其他分区不受影响。返回删除的条数
    pub async fn flush(&self, partition: Option<&str>) -> CacheResult<u64> {
        self.run("flush", 0, async {
            let partition_id = self.resolve(partition).await?;
            let deleted = self
                .adapter
                .flush_partition(self.pool.connection(), partition_id)
                .await?;
            info!("已清空分区 {}: {} 条", self.partition_name(partition), deleted);
            Ok(deleted)
        })
        .await
    }

    /// 导出一个分区的全部条目（含已过期条目）
    pub async fn export_snapshot(&self, partition: Option<&str>) -> CacheResult<Vec<SnapshotRecord>> {
        self.run("export_snapshot", Vec::new(), self.export_partition(partition))
            .await
    }

    /// 把快照导入一个分区
    ///
    /// 过期时间和命中次数原样写回，已存在的键被覆盖。
    /// 任意一条记录无法解析时整个导入不生效。返回写入的条数。
    pub async fn import_snapshot(
        &self,
        records: &[SnapshotRecord],
        partition: Option<&str>,
    ) -> CacheResult<u64> {
        self.run("import_snapshot", 0, self.import_partition(records, partition))
            .await
    }

    /// 导出所有分区的全部条目，每条记录带分区名
    pub async fn export_all(&self) -> CacheResult<Vec<SnapshotRecord>> {
        self.run("export_all", Vec::new(), async {
            let rows = self
                .adapter
                .export_entries(self.pool.connection(), None)
                .await?;
            Ok(rows
                .iter()
                .map(|(partition, entry)| snapshot::to_record(entry, Some(partition.as_str())))
                .collect())
        })
        .await
    }

    /// 按记录中的分区名导入，没有分区名的记录进入默认分区
    ///
    /// 所有记录先完成校验再解析分区，无效记录不会留下新建的空分区
    pub async fn import_all(&self, records: &[SnapshotRecord]) -> CacheResult<u64> {
        self.run("import_all", 0, async {
            for record in records {
                snapshot::check_record(record)?;
            }

            let mut writes = Vec::with_capacity(records.len());
            for record in records {
                let partition_id = self.resolve(record.partition.as_deref()).await?;
                writes.push(snapshot::to_write(record, partition_id)?);
            }
            self.adapter
                .upsert_entries(self.pool.connection(), &writes)
                .await
        })
        .await
    }

    /// 导出一个分区到 JSON 文件
    pub async fn export_to_file<P: AsRef<Path>>(&self, path: P, partition: Option<&str>) -> CacheResult<()> {
        let path = path.as_ref();
        self.run("export_to_file", (), async {
            let records = self.export_partition(partition).await?;
            snapshot::write_file(path, &records).await
        })
        .await
    }

    /// 从 JSON 文件导入一个分区，返回写入的条数
    pub async fn import_from_file<P: AsRef<Path>>(&self, path: P, partition: Option<&str>) -> CacheResult<u64> {
        let path = path.as_ref();
        self.run("import_from_file", 0, async {
            let records = snapshot::read_file(path).await?;
            self.import_partition(&records, partition).await
        })
        .await
    }

    fn partition_name<'a>(&'a self, partition: Option<&'a str>) -> &'a str {
        partition.unwrap_or(&self.config.default_partition)
    }

    async fn resolve(&self, partition: Option<&str>) -> CacheResult<PartitionId> {
        let name = self.partition_name(partition);
        self.partitions
            .resolve(self.adapter.as_ref(), self.pool.connection(), name)
            .await
    }

    async fn write_encoded(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
        partition: Option<&str>,
    ) -> CacheResult<()> {
        validate_key(key)?;
        let partition_id = self.resolve(partition).await?;
        let expire_time = ttl::expire_time_from(ttl::now(), ttl)?;

        let write = EntryWrite {
            key: key.to_string(),
            partition_id,
            value,
            expire_time,
            hit_count: None,
        };
        self.adapter
            .upsert_entries(self.pool.connection(), std::slice::from_ref(&write))
            .await?;
        debug!("写入缓存键 {} (分区ID={}, 过期时间={:?})", key, partition_id, expire_time);
        Ok(())
    }

    async fn fetch(&self, key: &str, partition: Option<&str>) -> CacheResult<Option<String>> {
        validate_key(key)?;
        let partition_id = self.resolve(partition).await?;
        self.adapter
            .fetch_and_touch(self.pool.connection(), key, partition_id, ttl::now())
            .await
    }

    async fn export_partition(&self, partition: Option<&str>) -> CacheResult<Vec<SnapshotRecord>> {
        let partition_id = self.resolve(partition).await?;
        let rows = self
            .adapter
            .export_entries(self.pool.connection(), Some(partition_id))
            .await?;
        debug!("导出分区 {}: {} 条", self.partition_name(partition), rows.len());
        Ok(rows
            .iter()
            .map(|(_, entry)| snapshot::to_record(entry, None))
            .collect())
    }

    async fn import_partition(&self, records: &[SnapshotRecord], partition: Option<&str>) -> CacheResult<u64> {
        for record in records {
            snapshot::check_record(record)?;
        }

        let partition_id = self.resolve(partition).await?;
        let writes = records
            .iter()
            .map(|record| snapshot::to_write(record, partition_id))
            .collect::<CacheResult<Vec<_>>>()?;
        let written = self
            .adapter
            .upsert_entries(self.pool.connection(), &writes)
            .await?;
        info!("已导入 {} 条缓存记录到分区 {}", written, self.partition_name(partition));
        Ok(written)
    }

    /// 执行一个操作：施加超时限制，并按错误策略处理失败
    async fn run<T, F>(&self, operation: &str, fallback: T, future: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        let result = match self.config.operation_timeout() {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_) => Err(crate::cache_error!(
                    timeout,
                    format!("{} 超过 {}ms 未完成", operation, limit.as_millis())
                )),
            },
            None => future.await,
        };

        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("缓存操作 {} 失败: {}", operation, e);
                match self.config.error_policy {
                    ErrorPolicy::Strict => Err(e),
                    ErrorPolicy::Lenient => Ok(fallback),
                }
            }
        }
    }
}
