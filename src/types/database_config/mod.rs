use serde::{Deserialize, Serialize};

use crate::error::CacheResult;

/// 支持的数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// SQLite 数据库
    SQLite,
    /// PostgreSQL 数据库
    PostgreSQL,
}

impl DatabaseType {
    /// 获取数据库类型的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "sqlite",
            DatabaseType::PostgreSQL => "postgresql",
        }
    }

    /// 从字符串解析数据库类型
    pub fn parse(s: &str) -> CacheResult<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::SQLite),
            "postgresql" | "postgres" | "pg" => Ok(DatabaseType::PostgreSQL),
            _ => Err(crate::cache_error!(config, format!("不支持的数据库类型: {}", s))),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 连接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionConfig {
    /// SQLite 文件路径
    SQLite {
        /// 数据库文件路径（":memory:" 表示内存数据库）
        path: String,
        /// 是否创建数据库文件（如果不存在）
        create_if_missing: bool,
    },
    /// PostgreSQL 连接配置
    PostgreSQL {
        /// 主机地址
        host: String,
        /// 端口号
        port: u16,
        /// 数据库名
        database: String,
        /// 用户名
        username: String,
        /// 密码
        password: String,
        /// SSL 模式 (disable, allow, prefer, require, verify-ca, verify-full)
        ssl_mode: Option<String>,
    },
    /// 完整连接串，原样交给驱动
    Url(String),
}

impl ConnectionConfig {
    /// 从连接串解析连接配置
    ///
    /// 支持 `sqlite:` / `sqlite://` 前缀和 `postgres://` / `postgresql://` 前缀，
    /// 其中 `postgresql+asyncpg://` 之类带驱动后缀的写法会去掉驱动部分
    pub fn from_url(url: &str) -> CacheResult<Self> {
        let url = url.trim();
        if let Some(rest) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
            let path = rest.split('?').next().unwrap_or_default();
            if path.is_empty() {
                return Err(crate::cache_error!(config, format!("SQLite连接串缺少路径: {}", url)));
            }
            return Ok(ConnectionConfig::SQLite {
                path: path.to_string(),
                create_if_missing: true,
            });
        }

        if let Some((scheme, rest)) = url.split_once("://") {
            let base = scheme.split('+').next().unwrap_or(scheme);
            if matches!(base, "postgres" | "postgresql") {
                return Ok(ConnectionConfig::Url(format!("postgres://{}", rest)));
            }
        }

        Err(crate::cache_error!(config, format!("无法识别的连接串: {}", url)))
    }

    /// 连接配置对应的数据库类型
    pub fn db_type(&self) -> DatabaseType {
        match self {
            ConnectionConfig::SQLite { .. } => DatabaseType::SQLite,
            ConnectionConfig::PostgreSQL { .. } | ConnectionConfig::Url(_) => DatabaseType::PostgreSQL,
        }
    }

    /// 生成PostgreSQL连接串
    pub fn postgres_url(&self) -> CacheResult<String> {
        match self {
            ConnectionConfig::PostgreSQL {
                host,
                port,
                database,
                username,
                password,
                ssl_mode,
            } => {
                let mut url = format!(
                    "postgres://{}:{}@{}:{}/{}",
                    urlencoding::encode(username),
                    urlencoding::encode(password),
                    host,
                    port,
                    database
                );
                if let Some(mode) = ssl_mode {
                    url.push_str("?sslmode=");
                    url.push_str(mode);
                }
                Ok(url)
            }
            ConnectionConfig::Url(url) => Ok(url.clone()),
            ConnectionConfig::SQLite { .. } => Err(crate::cache_error!(
                config,
                "PostgreSQL连接配置类型不匹配"
            )),
        }
    }
}

/// 连接池配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// 最小连接数
    pub min_connections: u32,
    /// 最大连接数
    pub max_connections: u32,
    /// 获取连接超时时间（秒）
    pub connection_timeout: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: u64,
    /// 连接最大生存时间（秒）
    pub max_lifetime: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            connection_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_sqlite() {
        let config = ConnectionConfig::from_url("sqlite:///tmp/cache.db").unwrap();
        assert_eq!(
            config,
            ConnectionConfig::SQLite {
                path: "/tmp/cache.db".to_string(),
                create_if_missing: true,
            }
        );
        assert!(ConnectionConfig::from_url("sqlite://").is_err());
    }

    #[test]
    fn test_from_url_postgres_strips_driver() {
        let config = ConnectionConfig::from_url("postgresql+asyncpg://u:p@localhost:5432/db").unwrap();
        assert_eq!(config.db_type(), DatabaseType::PostgreSQL);
        assert_eq!(config.postgres_url().unwrap(), "postgres://u:p@localhost:5432/db");
    }

    #[test]
    fn test_postgres_url_encodes_credentials() {
        let config = ConnectionConfig::PostgreSQL {
            host: "db".to_string(),
            port: 5432,
            database: "cache".to_string(),
            username: "user".to_string(),
            password: "p@ss word".to_string(),
            ssl_mode: Some("disable".to_string()),
        };
        assert_eq!(
            config.postgres_url().unwrap(),
            "postgres://user:p%40ss%20word@db:5432/cache?sslmode=disable"
        );
    }

    #[test]
    fn test_unknown_url_rejected() {
        assert!(ConnectionConfig::from_url("mysql://localhost/db").is_err());
        assert!(DatabaseType::parse("mongodb").is_err());
        assert_eq!(DatabaseType::parse("PG").unwrap(), DatabaseType::PostgreSQL);
    }
}
