//! 表管理模块
//!
//! 提供缓存表结构定义和建表语句生成

pub mod schema;

pub use schema::{CacheSchema, DEFAULT_TABLE_NAME};
