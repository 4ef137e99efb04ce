//! 阻塞调用接口
//!
//! [`BlockingCacheStore`] 持有一个 tokio 运行时，在其上以 `block_on` 执行 [`CacheStore`]
//! 的每个操作，语义与异步接口完全一致。不能在异步上下文中使用。

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use crate::types::*;

/// 阻塞式缓存
pub struct BlockingCacheStore {
    inner: CacheStore,
    runtime: Runtime,
}

impl BlockingCacheStore {
    /// 按配置建立缓存实例
    pub fn connect(config: CacheConfig) -> CacheResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("rat-dbcache")
            .build()
            .map_err(|e| CacheError::ConfigError {
                message: format!("创建tokio运行时失败: {}", e),
            })?;
        let inner = runtime.block_on(CacheStore::connect(config))?;
        Ok(Self { inner, runtime })
    }

    /// 使用连接串和默认配置建立缓存实例
    pub fn connect_url(url: &str) -> CacheResult<Self> {
        let config = CacheConfig::builder().connection_url(url)?.build()?;
        Self::connect(config)
    }

    /// 底层异步实例
    pub fn as_async(&self) -> &CacheStore {
        &self.inner
    }

    pub fn table_name(&self) -> &str {
        self.inner.table_name()
    }

    pub fn default_partition(&self) -> &str {
        self.inner.default_partition()
    }

    pub fn backend(&self) -> DatabaseType {
        self.inner.backend()
    }

    pub fn init_db(&self) -> CacheResult<()> {
        self.runtime.block_on(self.inner.init_db())
    }

    pub fn set(&self, key: &str, value: &Value, ttl: Option<Duration>, partition: Option<&str>) -> CacheResult<()> {
        self.runtime.block_on(self.inner.set(key, value, ttl, partition))
    }

    pub fn set_typed<T: Serialize + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        partition: Option<&str>,
    ) -> CacheResult<()> {
        self.runtime.block_on(self.inner.set_typed(key, value, ttl, partition))
    }

    pub fn get(&self, key: &str, partition: Option<&str>) -> CacheResult<Option<Value>> {
        self.runtime.block_on(self.inner.get(key, partition))
    }

    pub fn get_typed<T: DeserializeOwned + Send>(&self, key: &str, partition: Option<&str>) -> CacheResult<Option<T>> {
        self.runtime.block_on(self.inner.get_typed(key, partition))
    }

    pub fn entry(&self, key: &str, partition: Option<&str>) -> CacheResult<Option<CacheEntry>> {
        self.runtime.block_on(self.inner.entry(key, partition))
    }

    pub fn delete(&self, key: &str, partition: Option<&str>) -> CacheResult<()> {
        self.runtime.block_on(self.inner.delete(key, partition))
    }

    pub fn set_bulk(&self, entries: &[(String, Value)], ttl: Option<Duration>, partition: Option<&str>) -> CacheResult<()> {
        self.runtime.block_on(self.inner.set_bulk(entries, ttl, partition))
    }

    pub fn delete_bulk<K: AsRef<str> + Sync>(&self, keys: &[K], partition: Option<&str>) -> CacheResult<u64> {
        self.runtime.block_on(self.inner.delete_bulk(keys, partition))
    }

    pub fn flush(&self, partition: Option<&str>) -> CacheResult<u64> {
        self.runtime.block_on(self.inner.flush(partition))
    }

    pub fn export_snapshot(&self, partition: Option<&str>) -> CacheResult<Vec<SnapshotRecord>> {
        self.runtime.block_on(self.inner.export_snapshot(partition))
    }

    pub fn import_snapshot(&self, records: &[SnapshotRecord], partition: Option<&str>) -> CacheResult<u64> {
        self.runtime.block_on(self.inner.import_snapshot(records, partition))
    }

    pub fn export_all(&self) -> CacheResult<Vec<SnapshotRecord>> {
        self.runtime.block_on(self.inner.export_all())
    }

    pub fn import_all(&self, records: &[SnapshotRecord]) -> CacheResult<u64> {
        self.runtime.block_on(self.inner.import_all(records))
    }

    pub fn export_to_file<P: AsRef<Path>>(&self, path: P, partition: Option<&str>) -> CacheResult<()> {
        self.runtime.block_on(self.inner.export_to_file(path, partition))
    }

    pub fn import_from_file<P: AsRef<Path>>(&self, path: P, partition: Option<&str>) -> CacheResult<u64> {
        self.runtime.block_on(self.inner.import_from_file(path, partition))
    }

    /// 关闭连接池
    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}
