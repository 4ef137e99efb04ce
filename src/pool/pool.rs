//! 连接池创建

use std::time::Duration;

use rat_logger::{debug, info};

use super::types::DatabaseConnection;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::types::{ConnectionConfig, PoolConfig};

/// SQLite 内存数据库路径
const SQLITE_MEMORY: &str = ":memory:";

/// 缓存层使用的连接池
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    connection: DatabaseConnection,
}

impl ConnectionPool {
    /// 按配置建立连接池
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let connection = match &config.connection {
            ConnectionConfig::SQLite {
                path,
                create_if_missing,
            } => Self::create_sqlite_connection(path, *create_if_missing, &config.pool).await?,
            other => Self::create_postgres_connection(other, &config.pool).await?,
        };

        info!(
            "连接池已建立: 数据库类型={}, 最大连接数={}",
            connection.db_type(),
            config.pool.max_connections
        );
        Ok(Self { connection })
    }

    /// 底层连接
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// 关闭连接池
    pub async fn close(&self) {
        debug!("关闭连接池: {}", self.connection.db_type());
        self.connection.close().await;
    }

    #[cfg(feature = "sqlite-support")]
    async fn create_sqlite_connection(
        path: &str,
        create_if_missing: bool,
        pool_config: &PoolConfig,
    ) -> CacheResult<DatabaseConnection> {
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

        let acquire_timeout = Duration::from_secs(pool_config.connection_timeout);

        // 内存数据库只存在于单个连接中，连接必须常驻
        if path == SQLITE_MEMORY {
            let options = SqliteConnectOptions::new()
                .in_memory(true)
                .foreign_keys(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(acquire_timeout)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await
                .map_err(|e| CacheError::ConnectionError {
                    message: crate::i18n::tf("error.sqlite_connection", &[("message", &e.to_string())]),
                })?;
            return Ok(DatabaseConnection::SQLite(pool));
        }

        // 检查数据库文件是否存在
        let file_exists = std::path::Path::new(path).exists();

        // 如果文件不存在且不允许创建，则返回错误
        if !file_exists && !create_if_missing {
            return Err(CacheError::ConnectionError {
                message: crate::i18n::tf("error.sqlite_file_not_found", &[("path", path)]),
            });
        }

        // 如果需要创建文件且文件不存在，则创建父目录
        if create_if_missing && !file_exists {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| CacheError::ConnectionError {
                        message: crate::i18n::tf("error.sqlite_dir_create", &[("message", &e.to_string())]),
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(acquire_timeout)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(pool_config.idle_timeout))
            .max_lifetime(Duration::from_secs(pool_config.max_lifetime))
            .connect_with(options)
            .await
            .map_err(|e| CacheError::ConnectionError {
                message: crate::i18n::tf("error.sqlite_connection", &[("message", &e.to_string())]),
            })?;

        debug!("SQLite连接池已创建: {}", path);
        Ok(DatabaseConnection::SQLite(pool))
    }

    #[cfg(not(feature = "sqlite-support"))]
    async fn create_sqlite_connection(
        _path: &str,
        _create_if_missing: bool,
        _pool_config: &PoolConfig,
    ) -> CacheResult<DatabaseConnection> {
        Err(CacheError::ConfigError {
            message: crate::i18n::tf("error.backend_disabled", &[("db_type", "sqlite")]),
        })
    }

    #[cfg(feature = "postgres-support")]
    async fn create_postgres_connection(
        connection: &ConnectionConfig,
        pool_config: &PoolConfig,
    ) -> CacheResult<DatabaseConnection> {
        let connection_string = connection.postgres_url()?;

        // 使用PgPoolOptions创建连接池 - 使用配置值
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .max_lifetime(Duration::from_secs(pool_config.max_lifetime))
            .idle_timeout(Duration::from_secs(pool_config.idle_timeout))
            .acquire_timeout(Duration::from_secs(pool_config.connection_timeout))
            .connect(&connection_string)
            .await
            .map_err(|e| CacheError::ConnectionError {
                message: crate::i18n::tf("error.postgres_pool_create", &[("message", &e.to_string())]),
            })?;

        Ok(DatabaseConnection::PostgreSQL(pool))
    }

    #[cfg(not(feature = "postgres-support"))]
    async fn create_postgres_connection(
        _connection: &ConnectionConfig,
        _pool_config: &PoolConfig,
    ) -> CacheResult<DatabaseConnection> {
        Err(CacheError::ConfigError {
            message: crate::i18n::tf("error.backend_disabled", &[("db_type", "postgresql")]),
        })
    }
}
