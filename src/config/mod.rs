//! # 配置管理模块
//!
//! 提供统一的配置管理系统，支持构建器模式和链式配置

pub mod builders;
pub mod core;

pub use builders::{CacheConfigBuilder, PoolConfigBuilder};
pub use core::{CacheConfig, DEFAULT_PARTITION, ErrorPolicy, LogLevel};
