use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde_json::Value;

/// 四舍五入保留两位小数（导出 ratio 使用）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 占总资产百分比，总资产为 0 时返回 0
pub fn ratio_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

/// 持仓占比文本：总资产或市值为 0/未知时显示 "0%"
pub fn percent_text(market_value: Option<f64>, total: f64) -> String {
    match market_value {
        Some(mv) if mv != 0.0 && total != 0.0 => format!("{:.2}%", mv / total * 100.0),
        _ => "0%".to_string(),
    }
}

pub fn fixed2_or_dash(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// 持仓更新时间统一格式化为 `YYYY-MM-DD HH:MM:SS`（本地时区）
///
/// 支持 RFC 3339、`YYYY-MM-DD HH:MM:SS`、秒/毫秒时间戳；无法解析的文本原样返回。
pub fn format_update_time(raw: Option<&Value>) -> String {
    const FMT: &str = "%Y-%m-%d %H:%M:%S";
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::Number(n)) => {
            let Some(ts) = n.as_i64() else {
                return n.to_string();
            };
            // 13 位以上视为毫秒
            let millis = if ts.abs() >= 100_000_000_000 { ts } else { ts * 1000 };
            match Local.timestamp_millis_opt(millis).single() {
                Some(dt) => dt.format(FMT).to_string(),
                None => n.to_string(),
            }
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return String::new();
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return dt.with_timezone(&Local).format(FMT).to_string();
            }
            for pattern in [FMT, "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                    return naive.format(FMT).to_string();
                }
            }
            s.to_string()
        }
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.0), 12.0);
        assert_eq!(round2(4.444), 4.44);
        assert_eq!(round2(ratio_of(30000.0, 250000.0)), 12.0);
    }

    #[test]
    fn test_percent_text() {
        assert_eq!(percent_text(Some(25000.0), 250000.0), "10.00%");
        assert_eq!(percent_text(Some(25000.0), 0.0), "0%");
        assert_eq!(percent_text(None, 250000.0), "0%");
        assert_eq!(percent_text(Some(0.0), 250000.0), "0%");
    }

    #[test]
    fn test_format_update_time_variants() {
        assert_eq!(format_update_time(None), "");
        assert_eq!(
            format_update_time(Some(&json!("2024-03-01 09:30:00"))),
            "2024-03-01 09:30:00"
        );
        assert_eq!(
            format_update_time(Some(&json!("2024-03-01T09:30:05"))),
            "2024-03-01 09:30:05"
        );
        assert_eq!(format_update_time(Some(&json!("昨天"))), "昨天");
        // 时间戳按本地时区输出，只校验格式
        let s = format_update_time(Some(&json!(1_709_256_600_000_i64)));
        assert_eq!(s.len(), 19);
        assert_eq!(&s[4..5], "-");
    }
}
