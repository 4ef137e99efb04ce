//! 数据库类型定义和配置
//!
//! 定义支持的数据库类型、连接配置和缓存条目类型

pub mod cache_entry;
pub mod database_config;

pub use cache_entry::{CacheEntry, EntryWrite, PartitionId, SnapshotRecord};
pub use database_config::{ConnectionConfig, DatabaseType, PoolConfig};
