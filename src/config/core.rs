//! # 配置管理模块 - 核心配置类型
//!
//! 缓存实例的全部构造参数，构造完成后不可修改

use crate::error::CacheError;
use crate::table::DEFAULT_TABLE_NAME;
use crate::types::*;
use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认分区名
pub const DEFAULT_PARTITION: &str = "default";

/// 缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 连接配置
    pub connection: ConnectionConfig,
    /// 连接池配置
    #[serde(default)]
    pub pool: PoolConfig,
    /// 缓存条目表名
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// 未指定分区时使用的分区名
    #[serde(default = "default_partition")]
    pub default_partition: String,
    /// 日志级别，设置后构造时会初始化终端日志
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    /// 错误处理策略
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// 单次操作超时（毫秒），None 表示只受连接池获取超时约束
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
    /// 连接后是否自动建表
    #[serde(default = "default_auto_init")]
    pub auto_init: bool,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_partition() -> String {
    DEFAULT_PARTITION.to_string()
}

fn default_auto_init() -> bool {
    true
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 错误级别
    Error,
    /// 警告级别
    Warn,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
    /// 跟踪级别
    Trace,
}

/// 错误处理策略
///
/// 宽松模式下所有操作失败都只记录日志并返回"无效果"结果：
/// 写操作静默失败，读操作表现为未命中。调用方无法区分未命中和存储不可用，
/// 需要区分时使用严格模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// 记录日志后返回空结果
    #[default]
    Lenient,
    /// 把错误返回给调用方
    Strict,
}

impl CacheConfig {
    /// 创建缓存配置构建器
    pub fn builder() -> super::builders::CacheConfigBuilder {
        super::builders::CacheConfigBuilder::new()
    }

    /// 数据库类型
    pub fn db_type(&self) -> DatabaseType {
        self.connection.db_type()
    }

    /// 单次操作超时
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// 从配置文件加载配置
    ///
    /// 扩展名为 `.toml` 时按TOML解析，否则按JSON解析
    pub fn from_file<P: AsRef<std::path::Path>>(config_path: P) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(config_path.as_ref())?;

        let config: CacheConfig = if is_toml(config_path.as_ref()) {
            toml::from_str(&content)
                .map_err(|e| crate::cache_error!(config, format!("解析TOML配置文件失败: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| crate::cache_error!(config, format!("解析JSON配置文件失败: {}", e)))?
        };

        super::builders::validate(&config)?;

        info!("从文件加载配置: {:?}", config_path.as_ref());
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, config_path: P) -> Result<(), CacheError> {
        let content = if is_toml(config_path.as_ref()) {
            toml::to_string_pretty(self)
                .map_err(|e| crate::cache_error!(config, format!("序列化TOML配置失败: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::cache_error!(config, format!("序列化JSON配置失败: {}", e)))?
        };

        std::fs::write(config_path.as_ref(), content)?;

        info!("保存配置到文件: {:?}", config_path.as_ref());
        Ok(())
    }
}

fn is_toml(path: &std::path::Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}
