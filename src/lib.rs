//! rat_dbcache - 基于关系型数据库的持久化键值缓存层
//!
//! 把一张数据库表当作缓存使用，提供按分区隔离的键值读写、TTL过期、
//! 批量操作和快照导入导出。支持SQLite和PostgreSQL，同时提供异步与阻塞两种调用方式。
//!
//! ```ignore
//! use rat_dbcache::{CacheConfig, CacheStore};
//! use serde_json::json;
//!
//! let config = CacheConfig::builder().connection_url("sqlite://./cache.db")?.build()?;
//! let store = CacheStore::connect(config).await?;
//! store.set("user:1", &json!({"name": "alice"}), None, None).await?;
//! let value = store.get("user:1", None).await?;
//! ```

// 导出所有公共模块
pub mod adapter;
pub mod blocking;
pub mod codec;
pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod partition;
pub mod pool;
pub mod security;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod ttl;
pub mod types;

// 重新导出常用类型和函数
pub use adapter::{CacheAdapter, create_adapter};
pub use blocking::BlockingCacheStore;
pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_PARTITION, ErrorPolicy, LogLevel, PoolConfigBuilder};
pub use error::{CacheError, CacheResult};
pub use pool::{ConnectionPool, DatabaseConnection};
pub use store::CacheStore;
pub use table::{CacheSchema, DEFAULT_TABLE_NAME};
pub use types::*;

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化rat_dbcache库
///
/// 注册多语言错误消息并按环境变量选择语言。
///
/// 注意：日志系统由调用者自行初始化，或通过 `CacheConfig::log_level` 交给缓存实例安装
pub fn init() {
    i18n::ErrorMessageI18n::init();
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
