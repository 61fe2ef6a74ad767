use std::collections::HashMap;

use serde_json::Value;

/// 股票代码 → 名称映射表（name_vs_code.json）
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    table: HashMap<String, String>,
}

impl NameResolver {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// 非字符串或空名称的条目忽略
    pub fn from_values(map: HashMap<String, Value>) -> Self {
        let table = map
            .into_iter()
            .filter_map(|(code, name)| match name {
                Value::String(s) if !s.is_empty() => Some((code, s)),
                _ => None,
            })
            .collect();
        Self { table }
    }

    /// 解析失败时返回空表，名称保持未识别状态
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<HashMap<String, Value>>(raw) {
            Ok(map) => Self::from_values(map),
            Err(e) => {
                log::warn!("股票代码映射表解析失败: {}", e);
                Self::empty()
            }
        }
    }

    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.table.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_skips_non_string_names() {
        let resolver = NameResolver::from_json(r#"{"513100.SH":"纳指3100","000000.SZ":null,"1":""}"#);
        assert_eq!(resolver.resolve("513100.SH"), Some("纳指3100"));
        assert_eq!(resolver.resolve("000000.SZ"), None);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_from_invalid_json_is_empty() {
        assert!(NameResolver::from_json("<html>").is_empty());
    }
}
