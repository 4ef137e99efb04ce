//! SQLite 后端的缓存行为测试

#[cfg(all(test, feature = "sqlite-support"))]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rat_dbcache::{CacheConfig, CacheError, CacheStore, ConnectionConfig, ErrorPolicy, PoolConfig, SnapshotRecord};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, policy: ErrorPolicy) -> CacheConfig {
        let path = dir.path().join("cache.db");
        CacheConfig::builder()
            .connection(ConnectionConfig::SQLite {
                path: path.to_string_lossy().to_string(),
                create_if_missing: true,
            })
            .pool(
                PoolConfig::builder()
                    .min_connections(1)
                    .max_connections(5)
                    .connection_timeout(30)
                    .idle_timeout(60)
                    .max_lifetime(600)
                    .build()
                    .expect("连接池配置无效"),
            )
            .error_policy(policy)
            .build()
            .expect("缓存配置无效")
    }

    async fn open(dir: &TempDir, policy: ErrorPolicy) -> CacheStore {
        CacheStore::connect(config_for(dir, policy))
            .await
            .expect("连接缓存失败")
    }

    #[tokio::test]
    async fn test_structured_values_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        let values = vec![
            json!({"data": "test_value"}),
            json!({"user": {"id": 1, "tags": ["a", "b"], "active": true, "note": null}}),
            json!([1, 2, {"three": 3}]),
        ];
        for (i, value) in values.iter().enumerate() {
            let key = format!("key_{}", i);
            store.set(&key, value, None, None).await.unwrap();
            assert_eq!(store.get(&key, None).await.unwrap().as_ref(), Some(value));
        }

        // 普通字符串原样返回
        store.set("plain", &json!("hello world"), None, None).await.unwrap();
        assert_eq!(store.get("plain", None).await.unwrap(), Some(json!("hello world")));

        // 标量按文本保存，读取时作为字符串返回
        store.set("number", &json!(42), None, None).await.unwrap();
        assert_eq!(store.get("number", None).await.unwrap(), Some(json!("42")));
    }

    #[tokio::test]
    async fn test_missing_key_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;
        assert_eq!(store.get("nothing", None).await.unwrap(), None);
        assert_eq!(store.entry("nothing", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_but_exported() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store
            .set("short", &json!({"v": 1}), Some(Duration::from_secs(1)), None)
            .await
            .unwrap();
        store
            .set("forever", &json!({"v": 2}), Some(Duration::ZERO), None)
            .await
            .unwrap();
        assert!(store.get("short", None).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.get("short", None).await.unwrap(), None);
        assert_eq!(store.get("forever", None).await.unwrap(), Some(json!({"v": 2})));

        // 过期条目没有被清理，导出时仍然存在
        let records = store.export_snapshot(None).await.unwrap();
        let short = records.iter().find(|r| r.key == "short").expect("过期条目应被导出");
        assert!(short.expire_time.is_some());
        assert_eq!(short.hit_count, 1);
        let forever = records.iter().find(|r| r.key == "forever").unwrap();
        assert_eq!(forever.expire_time, None);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store.set("k", &json!("from a"), None, Some("a")).await.unwrap();
        store.set("k", &json!("from b"), None, Some("b")).await.unwrap();
        assert_eq!(store.get("k", Some("a")).await.unwrap(), Some(json!("from a")));
        assert_eq!(store.get("k", Some("b")).await.unwrap(), Some(json!("from b")));
        assert_eq!(store.get("k", None).await.unwrap(), None);

        assert_eq!(store.flush(Some("a")).await.unwrap(), 1);
        assert_eq!(store.get("k", Some("a")).await.unwrap(), None);
        assert_eq!(store.get("k", Some("b")).await.unwrap(), Some(json!("from b")));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store.set("gone", &json!({"x": 1}), None, None).await.unwrap();
        store.delete("gone", None).await.unwrap();
        store.delete("gone", None).await.unwrap();
        store.delete("never_existed", None).await.unwrap();
        assert_eq!(store.get("gone", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_hit_count_increments_and_survives_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store.set("counter", &json!({"n": 0}), None, None).await.unwrap();
        for expected in 1..=3 {
            store.get("counter", None).await.unwrap();
            let records = store.export_snapshot(None).await.unwrap();
            assert_eq!(records[0].hit_count, expected);
        }

        // 覆盖写入不重置命中次数
        store.set("counter", &json!({"n": 1}), None, None).await.unwrap();
        let entry = store.entry("counter", None).await.unwrap().unwrap();
        assert_eq!(entry.hit_count, 3);
        assert_eq!(entry.value, "{\"n\":1}");

        // entry 不计入命中
        store.entry("counter", None).await.unwrap();
        assert_eq!(store.entry("counter", None).await.unwrap().unwrap().hit_count, 3);
    }

    #[tokio::test]
    async fn test_bulk_write_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        let entries = vec![
            ("first".to_string(), json!({"ok": 1})),
            (String::new(), json!({"bad": true})),
            ("third".to_string(), json!({"ok": 3})),
        ];
        let result = store.set_bulk(&entries, None, Some("bulk")).await;
        assert!(matches!(result, Err(CacheError::ValidationError { .. })));
        assert!(store.export_snapshot(Some("bulk")).await.unwrap().is_empty());

        let entries = vec![
            ("first".to_string(), json!({"ok": 1})),
            ("second".to_string(), json!([1, 2])),
        ];
        store.set_bulk(&entries, Some(Duration::from_secs(3600)), Some("bulk")).await.unwrap();
        assert_eq!(store.get("second", Some("bulk")).await.unwrap(), Some(json!([1, 2])));

        let removed = store
            .delete_bulk(&["first", "second", "missing"], Some("bulk"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.export_snapshot(Some("bulk")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_flush_import_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store
            .set("a", &json!({"v": "a"}), Some(Duration::from_secs(3600)), None)
            .await
            .unwrap();
        store.set("b", &json!(["b"]), None, None).await.unwrap();
        store.get("a", None).await.unwrap();
        store.get("a", None).await.unwrap();

        let before = store.export_snapshot(None).await.unwrap();
        assert_eq!(before.len(), 2);

        store.flush(None).await.unwrap();
        assert!(store.export_snapshot(None).await.unwrap().is_empty());

        assert_eq!(store.import_snapshot(&before, None).await.unwrap(), 2);
        let after = store.export_snapshot(None).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(store.get("a", None).await.unwrap(), Some(json!({"v": "a"})));
    }

    #[tokio::test]
    async fn test_import_with_bad_record_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        let records = vec![
            SnapshotRecord {
                key: "good".to_string(),
                value: "{\"x\":1}".to_string(),
                expire_time: None,
                hit_count: 2,
                partition: None,
            },
            SnapshotRecord {
                key: "bad".to_string(),
                value: "text".to_string(),
                expire_time: Some("tomorrow".to_string()),
                hit_count: 0,
                partition: None,
            },
        ];
        let result = store.import_snapshot(&records, None).await;
        assert!(matches!(result, Err(CacheError::SnapshotError { .. })));
        assert!(store.export_snapshot(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_all_and_import_all_keep_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store.set("k1", &json!({"p": "x"}), None, Some("x")).await.unwrap();
        store.set("k2", &json!({"p": "y"}), None, Some("y")).await.unwrap();

        let all = store.export_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.partition.is_some()));

        store.flush(Some("x")).await.unwrap();
        store.flush(Some("y")).await.unwrap();
        assert_eq!(store.import_all(&all).await.unwrap(), 2);
        assert_eq!(store.get("k1", Some("x")).await.unwrap(), Some(json!({"p": "x"})));
        assert_eq!(store.get("k2", Some("y")).await.unwrap(), Some(json!({"p": "y"})));
    }

    #[tokio::test]
    async fn test_concurrent_gets_count_every_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open(&dir, ErrorPolicy::Strict).await);
        store.set("hot", &json!({"hot": true}), None, None).await.unwrap();

        let readers = 20;
        let results = futures::future::join_all((0..readers).map(|_| {
            let store = Arc::clone(&store);
            async move { store.get("hot", None).await }
        }))
        .await;
        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));

        let entry = store.entry("hot", None).await.unwrap().unwrap();
        assert_eq!(entry.hit_count, readers);
    }

    #[tokio::test]
    async fn test_typed_values() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Session {
            user_id: u64,
            roles: Vec<String>,
        }

        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        let session = Session {
            user_id: 7,
            roles: vec!["admin".to_string()],
        };
        store.set_typed("session:7", &session, None, None).await.unwrap();
        let loaded: Option<Session> = store.get_typed("session:7", None).await.unwrap();
        assert_eq!(loaded, Some(session));

        // 类型不匹配在严格模式下返回序列化错误
        let wrong: Result<Option<Vec<u8>>, _> = store.get_typed("session:7", None).await;
        assert!(matches!(wrong, Err(CacheError::SerializationError { .. })));
    }

    #[tokio::test]
    async fn test_lenient_policy_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Lenient).await;

        store.set("", &json!({"x": 1}), None, None).await.unwrap();
        assert_eq!(store.get("", None).await.unwrap(), None);
        store
            .set_bulk(&[(String::new(), json!(1))], None, None)
            .await
            .unwrap();
        store.export_to_file(dir.path().join("snapshot.txt"), None).await.unwrap();
        assert_eq!(store.import_from_file(dir.path().join("missing.json"), None).await.unwrap(), 0);

        store.close().await;
        assert_eq!(store.get("any", None).await.unwrap(), None);
        assert!(store.export_snapshot(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_strict_policy_propagates_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        assert!(matches!(
            store.set("", &json!(1), None, None).await,
            Err(CacheError::ValidationError { .. })
        ));
        assert!(matches!(
            store.export_to_file(dir.path().join("snapshot.txt"), None).await,
            Err(CacheError::SnapshotError { .. })
        ));
        assert!(matches!(
            store.import_from_file(dir.path().join("missing.json"), None).await,
            Err(CacheError::SnapshotError { .. })
        ));

        store.set("k", &json!({"v": 1}), None, None).await.unwrap();
        store.close().await;
        let err = store.get("k", None).await.unwrap_err();
        assert!(err.is_connectivity(), "关闭后的错误应归为连接类: {:?}", err);
    }

    #[tokio::test]
    async fn test_file_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        store.set("a", &json!({"a": 1}), Some(Duration::from_secs(600)), Some("files")).await.unwrap();
        store.get("a", Some("files")).await.unwrap();

        let path = dir.path().join("files.json");
        store.export_to_file(&path, Some("files")).await.unwrap();
        let exported = store.export_snapshot(Some("files")).await.unwrap();

        // 导入到另一个分区，状态完全一致
        assert_eq!(store.import_from_file(&path, Some("restored")).await.unwrap(), 1);
        assert_eq!(store.export_snapshot(Some("restored")).await.unwrap(), exported);
    }

    #[tokio::test]
    async fn test_tables_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let first = open(&dir, ErrorPolicy::Strict).await;

        let mut config = config_for(&dir, ErrorPolicy::Strict);
        config.table_name = "other_cache".to_string();
        config.auto_init = false;
        let second = CacheStore::connect(config).await.unwrap();
        second.init_db().await.unwrap();
        second.init_db().await.unwrap();
        assert_eq!(second.table_name(), "other_cache");

        first.set("shared", &json!("first"), None, None).await.unwrap();
        assert_eq!(second.get("shared", None).await.unwrap(), None);
        assert_eq!(first.default_partition(), "default");
    }

    #[tokio::test]
    async fn test_memory_database() {
        let config = CacheConfig::builder()
            .connection_url("sqlite::memory:")
            .unwrap()
            .error_policy(ErrorPolicy::Strict)
            .build()
            .unwrap();
        let store = CacheStore::connect(config).await.unwrap();
        store.set("m", &json!({"mem": true}), None, None).await.unwrap();
        assert_eq!(store.get("m", None).await.unwrap(), Some(json!({"mem": true})));
    }

    #[tokio::test]
    async fn test_timed_out_bulk_write_leaves_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(&dir, ErrorPolicy::Strict);
        config.operation_timeout_ms = Some(1);
        let store = CacheStore::connect(config).await.unwrap();

        let entries: Vec<(String, serde_json::Value)> = (0..20_000)
            .map(|i| (format!("key_{}", i), json!({"i": i})))
            .collect();
        let result = store.set_bulk(&entries, None, Some("slow")).await;
        assert!(matches!(result, Err(CacheError::Timeout { .. })));
        store.close().await;

        let reader = open(&dir, ErrorPolicy::Strict).await;
        assert!(reader.export_snapshot(Some("slow")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_import_creates_no_partition() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, ErrorPolicy::Strict).await;

        let good = SnapshotRecord {
            key: "good".to_string(),
            value: "{\"x\":1}".to_string(),
            expire_time: None,
            hit_count: 0,
            partition: Some("fresh".to_string()),
        };
        let bad = SnapshotRecord {
            key: "bad".to_string(),
            value: "text".to_string(),
            expire_time: Some("tomorrow".to_string()),
            hit_count: 0,
            partition: Some("also_fresh".to_string()),
        };

        let result = store.import_all(&[good, bad.clone()]).await;
        assert!(matches!(result, Err(CacheError::SnapshotError { .. })));
        let result = store.import_snapshot(&[bad], Some("third")).await;
        assert!(matches!(result, Err(CacheError::SnapshotError { .. })));

        let url = format!("sqlite://{}", dir.path().join("cache.db").to_string_lossy());
        let raw = sqlx::SqlitePool::connect(&url).await.unwrap();
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {}_partitions WHERE name IN ('fresh', 'also_fresh', 'third')",
            store.table_name()
        ))
        .fetch_one(&raw)
        .await
        .unwrap();
        assert_eq!(count, 0);
        raw.close().await;
    }
}
