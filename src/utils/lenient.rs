//! 账户数据文件字段类型不稳定（数字/字符串混用），这里集中做宽松解析

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 数字或数字字符串 → f64，其他一律视为 0
pub fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_number).unwrap_or(0.0))
}

/// 只接受 JSON 数字，其他（字符串、null、缺失）为 None
pub fn strict_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|n| n.is_finite()))
}

/// 字符串或数字 → String，null/缺失为空串
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// 字符串/数字 → Some(String)，空串与 null 为 None
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = text(deserializer)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}

pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "number_or_zero")]
        total: f64,
        #[serde(default, deserialize_with = "strict_number")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "text")]
        id: String,
    }

    #[test]
    fn test_numeric_string_is_coerced() {
        let p: Probe = serde_json::from_str(r#"{"total":"1234.5","price":"9.9","id":880001}"#).unwrap();
        assert_eq!(p.total, 1234.5);
        // 字符串价格不算有效数字
        assert_eq!(p.price, None);
        assert_eq!(p.id, "880001");
    }

    #[test]
    fn test_missing_and_garbage_fields() {
        let p: Probe = serde_json::from_str(r#"{"total":"abc","price":null}"#).unwrap();
        assert_eq!(p.total, 0.0);
        assert_eq!(p.price, None);
        assert_eq!(p.id, "");
    }
}
