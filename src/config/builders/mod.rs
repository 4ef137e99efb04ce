//! # 配置构建器模块
//!
//! 提供所有配置类型的构建器实现，支持链式调用和严格验证

pub mod cache_builder;
pub mod pool_builder;

pub use cache_builder::CacheConfigBuilder;
pub use pool_builder::PoolConfigBuilder;

pub(crate) use cache_builder::validate;
