//! 分区解析
//!
//! 分区名到分区ID的映射。分区在首次引用时创建，本层从不删除分区，
//! 因此解析结果可以在进程内缓存。缓存只是优化，唯一性始终由分区表的唯一约束保证。

use dashmap::DashMap;
use rat_logger::{debug, info};

use crate::adapter::{CacheAdapter, validate_partition_name};
use crate::error::CacheResult;
use crate::pool::DatabaseConnection;
use crate::types::PartitionId;

/// 分区解析器
#[derive(Debug, Default)]
pub struct PartitionResolver {
    resolved: DashMap<String, PartitionId>,
}

impl PartitionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析分区名，不存在时创建
    ///
    /// 先按名字查找；找不到则插入；插入因唯一约束冲突失败（其他调用方抢先创建）时重新查找
    pub async fn resolve(
        &self,
        adapter: &dyn CacheAdapter,
        connection: &DatabaseConnection,
        name: &str,
    ) -> CacheResult<PartitionId> {
        validate_partition_name(name)?;

        let cached = self.resolved.get(name).map(|id| *id);
        if let Some(id) = cached {
            return Ok(id);
        }

        let id = match adapter.find_partition(connection, name).await? {
            Some(id) => id,
            None => match adapter.insert_partition(connection, name).await? {
                Some(id) => {
                    info!("创建分区: {} (id={})", name, id);
                    id
                }
                None => {
                    debug!("分区 {} 插入冲突，重新读取", name);
                    adapter.find_partition(connection, name).await?.ok_or_else(|| {
                        crate::cache_error!(query, format!("分区 {} 插入冲突后仍无法读取", name))
                    })?
                }
            },
        };

        self.resolved.insert(name.to_string(), id);
        Ok(id)
    }
}
