//! 日志初始化
//!
//! 库本身不强制安装日志器。配置中设置了日志级别时，构造缓存实例会调用
//! [`init_logger`] 安装一个终端日志器；调用方已经安装了日志器则保持不变。

use rat_logger::{LevelFilter, LoggerBuilder, handler::term};

use crate::config::LogLevel;

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// 按指定级别安装终端日志器
///
/// 返回是否由本次调用完成安装
pub fn init_logger(level: LogLevel) -> bool {
    match LoggerBuilder::new()
        .with_level(level.into())
        .add_terminal_with_config(term::TermConfig::default())
        .init_global_logger()
    {
        Ok(_) => true,
        Err(e) => {
            rat_logger::debug!("日志器已存在，保持现有配置: {:?}", e);
            false
        }
    }
}
