use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;

use crate::models::position::{AccountAsset, AccountSnapshot, PositionSnapshot};
use crate::models::settings::{DataSource, PlannerSettings};
use crate::services::name_resolver::NameResolver;
use crate::utils::http::{build_data_client, cache_busted};

/// 只读数据文件拉取：代码映射表 + 账户资产/持仓
pub struct AccountDataService {
    client: reqwest::Client,
    source: DataSource,
    name_table_path: String,
    asset_info_path: String,
    position_info_path: String,
}

impl AccountDataService {
    pub fn new(settings: &PlannerSettings) -> Result<Self> {
        let client = build_data_client()?;
        Ok(Self {
            client,
            source: settings.data_source.clone(),
            name_table_path: settings.name_table_path.clone(),
            asset_info_path: settings.asset_info_path.clone(),
            position_info_path: settings.position_info_path.clone(),
        })
    }

    /// 拉取失败时退化为空表，名称保持未识别
    pub async fn fetch_name_table(&self) -> NameResolver {
        match self.fetch_json::<HashMap<String, serde_json::Value>>(&self.name_table_path).await {
            Ok(map) => {
                let resolver = NameResolver::from_values(map);
                log::info!("股票代码映射表已加载: {} 条", resolver.len());
                resolver
            }
            Err(e) => {
                log::warn!("股票代码映射表加载失败，名称将无法补全: {:#}", e);
                NameResolver::empty()
            }
        }
    }

    /// 资产与持仓并发拉取，任一失败则本轮刷新作废
    pub async fn fetch_account(&self) -> Result<AccountSnapshot> {
        let (asset, positions) = futures::try_join!(
            self.fetch_json::<AccountAsset>(&self.asset_info_path),
            self.fetch_json::<PositionSnapshot>(&self.position_info_path),
        )?;
        Ok(AccountSnapshot { asset, positions })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = match &self.source {
            DataSource::Http { base_url } => {
                let url = cache_busted(&format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/')));
                let resp = self.client.get(&url).send().await?;
                if !resp.status().is_success() {
                    return Err(anyhow!("HTTP {} ({})", resp.status(), url));
                }
                resp.text().await?
            }
            DataSource::Local { dir } => {
                let full = Path::new(dir).join(path);
                tokio::fs::read_to_string(&full)
                    .await
                    .with_context(|| format!("读取 {} 失败", full.display()))?
            }
        };
        serde_json::from_str(&text).map_err(|e| anyhow!("{} 解析失败: {}", path, e))
    }
}
