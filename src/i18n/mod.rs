//! 多语言错误消息模块
//!
//! 使用rat_embed_lang框架提供统一的错误消息多语言支持

use once_cell::sync::Lazy;
use rat_embed_lang::register_translations;
use std::collections::HashMap;

/// 错误消息翻译注册器
pub struct ErrorMessageI18n;

static REGISTERED: Lazy<()> = Lazy::new(|| {
    ErrorMessageI18n::register_all_translations();
});

fn entry(zh: &str, en: &str, ja: &str) -> HashMap<String, String> {
    let mut messages = HashMap::new();
    messages.insert("zh-CN".to_string(), zh.to_string());
    messages.insert("en-US".to_string(), en.to_string());
    messages.insert("ja-JP".to_string(), ja.to_string());
    messages
}

impl ErrorMessageI18n {
    /// 注册所有错误消息翻译
    pub fn register_all_translations() {
        let mut translations = HashMap::new();

        // 数据库连接错误
        translations.insert(
            "error.connection".to_string(),
            entry(
                "数据库连接失败: {message}",
                "Database connection failed: {message}",
                "データベース接続に失敗しました: {message}",
            ),
        );

        // 连接池错误
        translations.insert(
            "error.pool".to_string(),
            entry(
                "连接池操作失败: {message}",
                "Connection pool operation failed: {message}",
                "接続プール操作が失敗しました: {message}",
            ),
        );

        // 查询错误
        translations.insert(
            "error.query".to_string(),
            entry(
                "查询执行失败: {message}",
                "Query execution failed: {message}",
                "クエリ実行が失敗しました: {message}",
            ),
        );

        // 序列化错误
        translations.insert(
            "error.serialization".to_string(),
            entry(
                "数据序列化失败: {message}",
                "Data serialization failed: {message}",
                "データシリアライズが失敗しました: {message}",
            ),
        );

        // 参数验证错误
        translations.insert(
            "error.validation".to_string(),
            entry(
                "参数验证失败: {field} - {message}",
                "Validation failed: {field} - {message}",
                "検証が失敗しました: {field} - {message}",
            ),
        );

        // 配置错误
        translations.insert(
            "error.config".to_string(),
            entry(
                "配置错误: {message}",
                "Configuration error: {message}",
                "設定エラー: {message}",
            ),
        );

        // 快照错误
        translations.insert(
            "error.snapshot".to_string(),
            entry(
                "缓存快照操作失败: {message}",
                "Cache snapshot operation failed: {message}",
                "キャッシュスナップショット操作が失敗しました: {message}",
            ),
        );

        // 超时
        translations.insert(
            "error.timeout".to_string(),
            entry(
                "操作超时: {message}",
                "Operation timed out: {message}",
                "操作がタイムアウトしました: {message}",
            ),
        );

        // SQLite数据库文件不存在
        translations.insert(
            "error.sqlite_file_not_found".to_string(),
            entry(
                "SQLite数据库文件不存在且未启用自动创建: {path}",
                "SQLite database file does not exist and auto-create is not enabled: {path}",
                "SQLiteデータベースファイルが存在せず、自動作成が有効ではありません: {path}",
            ),
        );

        // 创建SQLite数据库目录失败
        translations.insert(
            "error.sqlite_dir_create".to_string(),
            entry(
                "创建SQLite数据库目录失败: {message}",
                "Failed to create SQLite database directory: {message}",
                "SQLiteデータベースディレクトリ作成失敗: {message}",
            ),
        );

        // SQLite连接失败
        translations.insert(
            "error.sqlite_connection".to_string(),
            entry(
                "SQLite连接失败: {message}",
                "SQLite connection failed: {message}",
                "SQLite接続失敗: {message}",
            ),
        );

        // PostgreSQL连接池创建失败
        translations.insert(
            "error.postgres_pool_create".to_string(),
            entry(
                "PostgreSQL连接池创建失败: {message}",
                "PostgreSQL connection pool creation failed: {message}",
                "PostgreSQL接続プール作成失敗: {message}",
            ),
        );

        // 后端未编译
        translations.insert(
            "error.backend_disabled".to_string(),
            entry(
                "数据库类型 {db_type} 未启用，请开启对应的feature",
                "Database type {db_type} is not enabled, enable the matching feature",
                "データベースタイプ {db_type} が有効ではありません。対応するfeatureを有効にしてください",
            ),
        );

        // 快照文件扩展名不正确
        translations.insert(
            "error.snapshot_extension".to_string(),
            entry(
                "快照文件必须以 .json 结尾: {path}",
                "Snapshot file must end with .json: {path}",
                "スナップショットファイルは .json で終わる必要があります: {path}",
            ),
        );

        // 快照文件不存在
        translations.insert(
            "error.snapshot_missing".to_string(),
            entry(
                "快照文件不存在: {path}",
                "Snapshot file does not exist: {path}",
                "スナップショットファイルが存在しません: {path}",
            ),
        );

        // 注册所有翻译
        register_translations(translations);
    }

    /// 初始化错误消息多语言支持
    pub fn init() {
        Lazy::force(&REGISTERED);

        // 从环境变量获取语言设置，默认为zh-CN
        let lang = std::env::var("RAT_LANG")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "zh-CN".to_string());

        // 标准化语言代码
        use rat_embed_lang::normalize_language_code;
        let normalized_lang = normalize_language_code(&lang);
        set_language(&normalized_lang);
    }
}

/// 翻译消息，首次调用时注册翻译表
pub fn t(key: &str) -> String {
    Lazy::force(&REGISTERED);
    rat_embed_lang::t(key)
}

/// 翻译带参数的消息，首次调用时注册翻译表
pub fn tf(key: &str, args: &[(&str, &str)]) -> String {
    Lazy::force(&REGISTERED);
    rat_embed_lang::tf(key, args)
}

/// 重新导出rat_embed_lang的语言控制函数
pub use rat_embed_lang::{current_language, set_language};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_keys_registered() {
        // 未知键与已注册键的结果应不同，说明注册生效
        let known = tf("error.snapshot_missing", &[("path", "/tmp/a.json")]);
        assert!(known.contains("/tmp/a.json"));
    }
}
