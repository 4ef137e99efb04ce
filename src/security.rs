//! 数据库安全验证工具
//!
//! 表名需要拼接进DDL和DML语句，无法参数化绑定，
//! 使用前必须经过这里的校验，防止SQL注入

use crate::error::{CacheError, CacheResult};
use crate::types::DatabaseType;

/// 标识符最大长度（PostgreSQL 的 NAMEDATALEN - 1）
pub const MAX_TABLE_NAME_LEN: usize = 63;

/// 数据库安全验证器
pub struct DatabaseSecurityValidator {
    db_type: DatabaseType,
}

impl DatabaseSecurityValidator {
    /// 创建新的安全验证器
    pub fn new(db_type: DatabaseType) -> Self {
        Self { db_type }
    }

    /// 验证表名的安全性
    ///
    /// # 参数
    /// * `table_name` - 表名
    ///
    /// # 返回值
    /// * `Ok(())` - 表名安全
    /// * `Err(CacheError)` - 表名包含非法字符
    pub fn validate_table_name(&self, table_name: &str) -> CacheResult<()> {
        // 表名不能为空
        if table_name.is_empty() {
            return Err(CacheError::ValidationError {
                field: "table_name".to_string(),
                message: "表名不能为空".to_string(),
            });
        }

        // 检查表名长度
        if table_name.len() > MAX_TABLE_NAME_LEN {
            return Err(CacheError::ValidationError {
                field: table_name.to_string(),
                message: format!("表名长度不能超过{}个字符", MAX_TABLE_NAME_LEN),
            });
        }

        // 检查第一个字符不能是数字
        if table_name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CacheError::ValidationError {
                field: table_name.to_string(),
                message: "SQL表名不能以数字开头".to_string(),
            });
        }

        // 检查表名只包含安全字符
        for (i, ch) in table_name.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                return Err(CacheError::ValidationError {
                    field: table_name.to_string(),
                    message: format!("SQL表名包含非法字符 '{}' 在位置 {}", ch, i),
                });
            }
        }

        // 检查是否为SQL关键字
        let upper_name = table_name.to_uppercase();
        let sql_keywords = [
            "SELECT", "FROM", "WHERE", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP",
            "ALTER", "TABLE", "INDEX", "DATABASE", "SCHEMA", "USER", "ROLE", "GRANT",
            "REVOKE", "COMMIT", "ROLLBACK", "TRANSACTION", "VIEW", "TRIGGER", "PROCEDURE",
            "FUNCTION", "SEQUENCE", "CONSTRAINT", "PRIMARY", "FOREIGN", "REFERENCES",
        ];

        if sql_keywords.contains(&upper_name.as_str()) {
            return Err(CacheError::ValidationError {
                field: table_name.to_string(),
                message: format!("表名不能使用SQL关键字: {}", table_name),
            });
        }

        Ok(())
    }

    /// 获取安全的表标识符
    ///
    /// 验证表名并返回带引号保护的标识符
    pub fn get_safe_table_identifier(&self, table_name: &str) -> CacheResult<String> {
        self.validate_table_name(table_name)?;

        match self.db_type {
            DatabaseType::PostgreSQL | DatabaseType::SQLite => Ok(format!("\"{}\"", table_name)),
        }
    }
}
