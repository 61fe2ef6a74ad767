use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::format::fixed2_or_dash;
use crate::utils::lenient::{number_or_zero, optional_text, strict_number, text};

/// 账户持仓中名称无法识别时的占位名
pub const UNKNOWN_STOCK_NAME: &str = "未知股票";

/// 账户资产信息（template_account_asset_info.json）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountAsset {
    #[serde(default, deserialize_with = "text")]
    pub account_id: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub total_asset: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub cash: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub frozen_cash: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub market_value: f64,
    #[serde(default, deserialize_with = "text")]
    pub percent_cash: String,
    #[serde(default, deserialize_with = "text")]
    pub percent_market: String,
}

/// 券商持仓原始记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosition {
    #[serde(default, deserialize_with = "text")]
    pub stock_code: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub stock_name: Option<String>,
    #[serde(default, deserialize_with = "strict_number")]
    pub market_value: Option<f64>,
    #[serde(default, deserialize_with = "strict_number")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "strict_number")]
    pub can_use_volume: Option<f64>,
    #[serde(default, deserialize_with = "strict_number")]
    pub avg_price: Option<f64>,
}

/// 持仓信息（template_account_position_info.json）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionSnapshot {
    #[serde(default)]
    pub last_update: Option<Value>,
    #[serde(default)]
    pub positions: Vec<RawPosition>,
}

/// 最近一次拉取到的账户快照，每次刷新整体替换
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshot {
    pub asset: AccountAsset,
    pub positions: PositionSnapshot,
}

impl AccountSnapshot {
    pub fn figures(&self) -> AccountFigures {
        AccountFigures {
            cash: self.asset.cash,
            market_value: self.asset.market_value,
            asset_total: self.asset.total_asset,
        }
    }
}

/// 导出计算用到的三项资金数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountFigures {
    pub cash: f64,
    pub market_value: f64,
    pub asset_total: f64,
}

/// 持仓关联的策略，`held` 表示该策略当前标记为持有
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedStrategy {
    pub name: String,
    pub held: bool,
}

/// 对账后的持仓行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledPosition {
    pub stock_code: String,
    pub stock_name: String,
    pub market_value: Option<f64>,
    pub volume: Option<f64>,
    pub can_use_volume: Option<f64>,
    pub avg_price: Option<f64>,
    pub related_strategies: Vec<RelatedStrategy>,
    pub reference_value: f64,
    pub divergent: bool,
    pub percent: String,
    pub orig_index: usize,
}

impl ReconciledPosition {
    pub fn has_name(&self) -> bool {
        !self.stock_name.is_empty()
    }

    pub fn display_name(&self) -> &str {
        if self.stock_name.is_empty() { "-" } else { &self.stock_name }
    }

    pub fn market_value_text(&self) -> String {
        fixed2_or_dash(self.market_value)
    }

    pub fn reference_value_text(&self) -> String {
        if self.reference_value > 0.0 {
            format!("{:.2}", self.reference_value)
        } else {
            "-".to_string()
        }
    }

    pub fn avg_price_text(&self) -> String {
        self.avg_price.map(|p| format!("{:.4}", p)).unwrap_or_else(|| "-".to_string())
    }

    pub fn held_strategies(&self) -> Vec<&str> {
        self.related_strategies.iter().filter(|r| r.held).map(|r| r.name.as_str()).collect()
    }
}

/// 持仓页完整视图：资产头部 + 排序后的持仓行 + 供计划使用的市值/占比映射
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountView {
    pub asset: AccountAsset,
    pub last_update: String,
    pub positions: Vec<ReconciledPosition>,
    pub market_values: HashMap<String, f64>,
    pub percents: HashMap<String, String>,
}

impl AccountView {
    pub fn market_value_of(&self, name: &str) -> f64 {
        self.market_values.get(name).copied().unwrap_or(0.0)
    }

    pub fn percent_of(&self, name: &str) -> String {
        self.percents.get(name).cloned().unwrap_or_else(|| "0%".to_string())
    }
}
