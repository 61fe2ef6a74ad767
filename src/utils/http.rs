use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, USER_AGENT};
use std::time::Duration;

/// 账户数据/代码表拉取专用 HTTP client，超时10秒
pub fn build_data_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(10))
        .gzip(true)
        .build()?;
    Ok(client)
}

/// 追加时间戳参数避免读到缓存
pub fn cache_busted(url: &str) -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, sep, ts)
}
