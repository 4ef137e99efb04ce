//! rat_dbcache 基本用法演示
//!
//! 运行: cargo run --example basic_usage

use std::time::Duration;

use rat_dbcache::{CacheConfig, CacheResult, CacheStore, ConnectionConfig, ErrorPolicy, LogLevel};
use serde_json::json;

#[tokio::main]
async fn main() -> CacheResult<()> {
    rat_dbcache::init();
    println!("🚀 {}", rat_dbcache::get_info());

    let config = CacheConfig::builder()
        .connection(ConnectionConfig::SQLite {
            path: "./demo_data/basic_usage.db".to_string(),
            create_if_missing: true,
        })
        .table_name("demo_cache")
        .log_level(LogLevel::Info)
        .error_policy(ErrorPolicy::Strict)
        .operation_timeout_ms(5_000)
        .build()?;

    let store = CacheStore::connect(config).await?;

    // 默认分区
    store
        .set("user:1", &json!({"name": "alice", "roles": ["admin"]}), None, None)
        .await?;
    println!("📦 user:1 = {:?}", store.get("user:1", None).await?);

    // 带TTL的会话分区
    store
        .set("token:abc", &json!({"user": 1}), Some(Duration::from_secs(2)), Some("sessions"))
        .await?;
    println!("🔑 token:abc = {:?}", store.get("token:abc", Some("sessions")).await?);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    println!("⌛ 过期后 token:abc = {:?}", store.get("token:abc", Some("sessions")).await?);

    // 批量写入
    let entries: Vec<(String, serde_json::Value)> = (0..5)
        .map(|i| (format!("item:{}", i), json!({"index": i})))
        .collect();
    store.set_bulk(&entries, Some(Duration::from_secs(600)), Some("items")).await?;

    // 快照
    store.export_to_file("./demo_data/items.json", Some("items")).await?;
    let flushed = store.flush(Some("items")).await?;
    println!("🧹 清空 items 分区: {} 条", flushed);
    let restored = store.import_from_file("./demo_data/items.json", Some("items")).await?;
    println!("♻️ 从快照恢复: {} 条", restored);

    for record in store.export_all().await? {
        println!(
            "  [{}] {} = {} (过期: {:?}, 命中: {})",
            record.partition.as_deref().unwrap_or("-"),
            record.key,
            record.value,
            record.expire_time,
            record.hit_count
        );
    }

    store.close().await;
    Ok(())
}
