use serde::{Deserialize, Serialize};

use crate::services::reconciler::DIVERGENCE_THRESHOLD;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default = "default_name_table_path")]
    pub name_table_path: String,
    #[serde(default = "default_asset_info_path")]
    pub asset_info_path: String,
    #[serde(default = "default_position_info_path")]
    pub position_info_path: String,
    /// 实际市值偏离参考市值超过该比例时标红
    #[serde(default = "default_divergence_threshold")]
    pub divergence_threshold: f64,
}

fn default_refresh_interval() -> u64 { 60 }
fn default_true() -> bool { true }
fn default_name_table_path() -> String { "utils/stocks_code_search_tool/stocks_data/name_vs_code.json".to_string() }
fn default_asset_info_path() -> String { "template_account_info/template_account_asset_info.json".to_string() }
fn default_position_info_path() -> String { "template_account_info/template_account_position_info.json".to_string() }
fn default_divergence_threshold() -> f64 { DIVERGENCE_THRESHOLD }

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            auto_refresh: true,
            data_source: DataSource::default(),
            name_table_path: default_name_table_path(),
            asset_info_path: default_asset_info_path(),
            position_info_path: default_position_info_path(),
            divergence_threshold: default_divergence_threshold(),
        }
    }
}

/// 账户数据来源：HTTP 静态服务或本地目录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Http { base_url: String },
    Local { dir: String },
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Local { dir: ".".to_string() }
    }
}
