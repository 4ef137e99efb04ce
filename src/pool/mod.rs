//! 连接池模块
//!
//! 基于 sqlx 连接池为缓存层提供数据库连接
//! SQLite: 文件数据库启用 WAL 与忙等待，内存数据库固定单连接
//! PostgreSQL: 多连接长连接池

pub mod pool;
pub mod types;

pub use pool::ConnectionPool;
pub use types::DatabaseConnection;
