//! 缓存值编解码
//!
//! 结构化值（对象、数组）序列化为 JSON 文本存储，字符串原样存储。
//! 解码时只有对象或数组形式的 JSON 才会被还原，其余文本按原样作为字符串返回。

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CacheResult;

/// 将值编码为存储文本
pub fn encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 尝试将存储文本还原为结构化值
///
/// 只有以 `{` 或 `[` 开头且能完整解析的文本返回 Some
pub fn try_decode(text: &str) -> Option<Value> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            crate::debug_log!("缓存值不是合法JSON，按原始文本返回: {}", e);
            None
        }
    }
}

/// 解码存储文本，解析失败时返回原始字符串
pub fn decode(text: &str) -> Value {
    try_decode(text).unwrap_or_else(|| Value::String(text.to_string()))
}

/// 将任意可序列化类型编码为存储文本
pub fn encode_typed<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    let json = serde_json::to_value(value)
        .map_err(|e| crate::cache_error!(serialization, format!("序列化缓存值失败: {}", e)))?;
    Ok(encode(&json))
}

/// 将存储文本解码为指定类型
pub fn decode_typed<T: DeserializeOwned>(text: &str) -> CacheResult<T> {
    serde_json::from_value(decode(text))
        .map_err(|e| crate::cache_error!(serialization, format!("反序列化缓存值失败: {}", e)))
}
