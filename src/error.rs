//! 错误处理模块
//!
//! 定义缓存层统一的错误类型，错误消息通过 i18n 模块本地化

use thiserror::Error;

/// 缓存层错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// 数据库连接错误
    #[error("{}", crate::i18n::tf("error.connection", &[("message", message)]))]
    ConnectionError { message: String },

    /// 连接池错误
    #[error("{}", crate::i18n::tf("error.pool", &[("message", message)]))]
    PoolError { message: String },

    /// 查询执行错误
    #[error("{}", crate::i18n::tf("error.query", &[("message", message)]))]
    QueryError { message: String },

    /// 序列化/反序列化错误
    #[error("{}", crate::i18n::tf("error.serialization", &[("message", message)]))]
    SerializationError { message: String },

    /// 参数验证错误
    #[error("{}", crate::i18n::tf("error.validation", &[("field", field), ("message", message)]))]
    ValidationError { field: String, message: String },

    /// 配置错误
    #[error("{}", crate::i18n::tf("error.config", &[("message", message)]))]
    ConfigError { message: String },

    /// 快照导入导出错误
    #[error("{}", crate::i18n::tf("error.snapshot", &[("message", message)]))]
    SnapshotError { message: String },

    /// 操作超时
    #[error("{}", crate::i18n::tf("error.timeout", &[("message", message)]))]
    Timeout { message: String },

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// 缓存层结果类型
pub type CacheResult<T> = Result<T, CacheError>;

impl CacheError {
    /// 是否为连接层面的失败（存储不可达、连接池耗尽或超时）
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            CacheError::ConnectionError { .. } | CacheError::PoolError { .. } | CacheError::Timeout { .. }
        )
    }
}

#[cfg(any(feature = "sqlite-support", feature = "postgres-support"))]
impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => CacheError::PoolError {
                message: "获取数据库连接超时".to_string(),
            },
            sqlx::Error::PoolClosed => CacheError::PoolError {
                message: "连接池已关闭".to_string(),
            },
            sqlx::Error::Io(io) => CacheError::ConnectionError {
                message: io.to_string(),
            },
            sqlx::Error::Tls(tls) => CacheError::ConnectionError {
                message: tls.to_string(),
            },
            other => CacheError::QueryError {
                message: other.to_string(),
            },
        }
    }
}

/// 快速构造错误的宏
///
/// ```ignore
/// cache_error!(config, "最大连接数必须设置");
/// cache_error!(validation, "key", "键不能为空");
/// ```
#[macro_export]
macro_rules! cache_error {
    (connection, $msg:expr) => {
        $crate::error::CacheError::ConnectionError { message: ($msg).to_string() }
    };
    (pool, $msg:expr) => {
        $crate::error::CacheError::PoolError { message: ($msg).to_string() }
    };
    (query, $msg:expr) => {
        $crate::error::CacheError::QueryError { message: ($msg).to_string() }
    };
    (serialization, $msg:expr) => {
        $crate::error::CacheError::SerializationError { message: ($msg).to_string() }
    };
    (validation, $field:expr, $msg:expr) => {
        $crate::error::CacheError::ValidationError {
            field: ($field).to_string(),
            message: ($msg).to_string(),
        }
    };
    (config, $msg:expr) => {
        $crate::error::CacheError::ConfigError { message: ($msg).to_string() }
    };
    (snapshot, $msg:expr) => {
        $crate::error::CacheError::SnapshotError { message: ($msg).to_string() }
    };
    (timeout, $msg:expr) => {
        $crate::error::CacheError::Timeout { message: ($msg).to_string() }
    };
}
