//! # 缓存配置构建器模块
//!
//! 提供缓存配置的构建器实现，支持链式调用和严格验证

use crate::config::core::{CacheConfig, DEFAULT_PARTITION, ErrorPolicy, LogLevel};
use crate::error::CacheError;
use crate::table::{CacheSchema, DEFAULT_TABLE_NAME};
use crate::types::*;
use rat_logger::info;

/// 缓存配置构建器
///
/// 连接配置必须显式设置，其余项有默认值
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    connection: Option<ConnectionConfig>,
    pool: Option<PoolConfig>,
    table_name: Option<String>,
    default_partition: Option<String>,
    log_level: Option<LogLevel>,
    error_policy: Option<ErrorPolicy>,
    operation_timeout_ms: Option<u64>,
    auto_init: Option<bool>,
}

impl CacheConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置连接配置
    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection);
        self
    }

    /// 使用连接串设置连接配置
    ///
    /// # 错误
    ///
    /// 连接串无法识别时返回配置错误
    pub fn connection_url(mut self, url: &str) -> Result<Self, CacheError> {
        self.connection = Some(ConnectionConfig::from_url(url)?);
        Ok(self)
    }

    /// 设置连接池配置（可选，默认使用 `PoolConfig::default()`）
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// 设置缓存条目表名（可选，默认 `cache_entries`）
    pub fn table_name<S: Into<String>>(mut self, table_name: S) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// 设置默认分区名（可选，默认 `default`）
    pub fn default_partition<S: Into<String>>(mut self, partition: S) -> Self {
        self.default_partition = Some(partition.into());
        self
    }

    /// 设置日志级别
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// 设置错误处理策略（可选，默认宽松模式）
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = Some(policy);
        self
    }

    /// 设置单次操作超时（毫秒）
    pub fn operation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.operation_timeout_ms = Some(timeout_ms);
        self
    }

    /// 设置连接后是否自动建表（可选，默认 true）
    pub fn auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = Some(auto_init);
        self
    }

    /// 构建缓存配置
    pub fn build(self) -> Result<CacheConfig, CacheError> {
        let connection = self
            .connection
            .ok_or_else(|| crate::cache_error!(config, "连接配置必须设置"))?;

        let config = CacheConfig {
            connection,
            pool: self.pool.unwrap_or_default(),
            table_name: self.table_name.unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            default_partition: self
                .default_partition
                .unwrap_or_else(|| DEFAULT_PARTITION.to_string()),
            log_level: self.log_level,
            error_policy: self.error_policy.unwrap_or_default(),
            operation_timeout_ms: self.operation_timeout_ms,
            auto_init: self.auto_init.unwrap_or(true),
        };
        validate(&config)?;

        info!(
            "创建缓存配置: 数据库类型={}, 表名={}, 默认分区={}, 错误策略={:?}",
            config.db_type(),
            config.table_name,
            config.default_partition,
            config.error_policy
        );

        Ok(config)
    }
}

/// 验证完整缓存配置
pub(crate) fn validate(config: &CacheConfig) -> Result<(), CacheError> {
    super::pool_builder::validate_pool(&config.pool)?;

    CacheSchema::new(config.db_type(), &config.table_name)?;

    if config.default_partition.is_empty() {
        return Err(crate::cache_error!(config, "默认分区名不能为空"));
    }

    if config.operation_timeout_ms == Some(0) {
        return Err(crate::cache_error!(config, "操作超时时间不能为零"));
    }

    if let ConnectionConfig::SQLite { path, .. } = &config.connection {
        if path.is_empty() {
            return Err(crate::cache_error!(config, "SQLite数据库路径不能为空"));
        }
    }

    Ok(())
}
