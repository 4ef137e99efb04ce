//! 连接池类型定义模块

use crate::types::DatabaseType;

/// 数据库连接
///
/// 每个变体持有对应后端的 sqlx 连接池，克隆只增加引用计数
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    #[cfg(feature = "sqlite-support")]
    SQLite(sqlx::SqlitePool),
    #[cfg(feature = "postgres-support")]
    PostgreSQL(sqlx::PgPool),
}

impl DatabaseConnection {
    /// 连接对应的数据库类型
    pub fn db_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite-support")]
            DatabaseConnection::SQLite(_) => DatabaseType::SQLite,
            #[cfg(feature = "postgres-support")]
            DatabaseConnection::PostgreSQL(_) => DatabaseType::PostgreSQL,
        }
    }

    /// 关闭连接池，等待已借出的连接归还
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "sqlite-support")]
            DatabaseConnection::SQLite(pool) => pool.close().await,
            #[cfg(feature = "postgres-support")]
            DatabaseConnection::PostgreSQL(pool) => pool.close().await,
        }
    }

    /// 连接池是否已关闭
    pub fn is_closed(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite-support")]
            DatabaseConnection::SQLite(pool) => pool.is_closed(),
            #[cfg(feature = "postgres-support")]
            DatabaseConnection::PostgreSQL(pool) => pool.is_closed(),
        }
    }
}
