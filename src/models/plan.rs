use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 调仓动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAction {
    #[serde(rename = "买")]
    Buy,
    #[serde(rename = "卖")]
    Sell,
}

impl PlanAction {
    pub fn label(&self) -> &'static str {
        match self {
            PlanAction::Buy => "买",
            PlanAction::Sell => "卖",
        }
    }

    /// 表单选择值：空串表示未选择
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "买" | "买入" | "buy" => Some(PlanAction::Buy),
            "卖" | "卖出" | "sell" => Some(PlanAction::Sell),
            _ => None,
        }
    }

    /// 执行后该标的的持有状态
    pub fn hold_after(&self) -> bool {
        matches!(self, PlanAction::Buy)
    }
}

/// 单条调仓计划
///
/// `index` 是创建时标的在策略中的位置，仅作展示；执行时按 `target_id` 重新定位。
/// `hold_before` / `other_hold` 是创建时的快照，之后不再重算。
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub id: Uuid,
    pub strategy: String,
    pub index: usize,
    pub target_id: Uuid,
    pub target: String,
    pub action: PlanAction,
    pub value: f64,
    pub hold_before: bool,
    pub hold_after: Option<bool>,
    pub other_hold: Vec<String>,
}

impl PlanEntry {
    pub fn projected_hold_after(&self) -> bool {
        self.action.hold_after()
    }
}

/// 策略页某个标的的用户输入：动作 + 可选金额（空则用默认金额）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSelection {
    pub target: String,
    #[serde(default)]
    pub action: Option<PlanAction>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl TargetSelection {
    pub fn new(target: impl Into<String>, action: PlanAction) -> Self {
        Self {
            target: target.into(),
            action: Some(action),
            value: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// 计划列表展示行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRow {
    pub strategy: String,
    pub target: String,
    pub action: PlanAction,
    pub value: f64,
    /// 执行金额占总资产
    pub exec_percent: String,
    /// 当前持仓占比
    pub hold_percent: String,
    pub hold_before: bool,
    pub hold_after: bool,
    pub other_hold_after: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRatio {
    pub name: String,
    pub ratio: f64,
}

/// 导出给下单端的 JSON 文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub sell_stocks_info: Vec<StockRatio>,
    pub buy_stocks_info: Vec<StockRatio>,
}

impl ExportDocument {
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// 执行前后资金对比，仅用于展示
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub total_before: f64,
    pub cash_before: f64,
    pub market_before: f64,
    pub buy_sum: f64,
    pub sell_sum: f64,
    pub cash_after: f64,
    pub market_after: f64,
    pub total_after: f64,
    /// 执行后可用资金为负，需要醒目提示
    pub negative_cash: bool,
}

impl ExportSummary {
    pub fn before_text(&self) -> String {
        format!(
            "当前总资产：{:.2}，可用资金：{:.2}，持仓市值：{:.2}",
            self.total_before, self.cash_before, self.market_before
        )
    }

    pub fn after_text(&self) -> String {
        format!(
            "执行后可用资金：{:.2}，持仓市值：{:.2}，总资产：{:.2}",
            self.cash_after, self.market_after, self.total_after
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanExport {
    pub document: ExportDocument,
    pub summary: ExportSummary,
}

/// 计划执行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteReport {
    pub applied: usize,
    pub skipped: usize,
}
