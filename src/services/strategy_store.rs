use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::database::{Database, STRATEGIES_KEY};
use crate::error::{PlannerError, PlannerResult};
use crate::models::strategy::{default_strategies, Strategy, StrategyStore, Target};

/// 合并内置默认策略时的差异：新增的策略名、新增的 "策略 - 标的"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeDiff {
    pub changed: bool,
    pub new_strategies: Vec<String>,
    pub new_targets: Vec<String>,
}

impl MergeDiff {
    /// 确认弹窗文案
    pub fn confirm_message(&self) -> String {
        if !self.changed {
            return "没有需要补充的新策略或新标的。".to_string();
        }
        let mut msg = "将会补充默认策略中的所有新策略和新标的，已存在的不会被覆盖。是否继续？".to_string();
        if !self.new_strategies.is_empty() {
            msg.push_str("\n\n新增策略：\n");
            msg.push_str(&self.new_strategies.join("\n"));
        }
        if !self.new_targets.is_empty() {
            msg.push_str("\n\n新增标的：\n");
            msg.push_str(&self.new_targets.join("\n"));
        }
        msg
    }
}

/// 表单金额文本 → 正数
pub fn parse_amount(raw: &str) -> PlannerResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(PlannerError::InvalidAmount),
    }
}

/// 先校验名称再校验金额，错误提示按此顺序给出
fn validate_target_input(name: &str, amount: &str) -> PlannerResult<(String, f64)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlannerError::InvalidName);
    }
    Ok((name.to_string(), parse_amount(amount)?))
}

impl StrategyStore {
    /// 读取已保存的策略；不存在或解析失败时回退到内置默认策略
    pub fn load(db: &Database) -> StrategyStore {
        match db.get_value(STRATEGIES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<StrategyStore>(&raw) {
                Ok(store) => {
                    log::info!("已加载 {} 个策略", store.len());
                    return store;
                }
                Err(e) => log::warn!("策略数据解析失败，使用默认策略: {}", e),
            },
            Ok(None) => log::info!("未找到已保存的策略，使用默认策略"),
            Err(e) => log::warn!("读取策略数据失败，使用默认策略: {}", e),
        }
        default_strategies()
    }

    pub fn save(&self, db: &Database) -> PlannerResult<()> {
        let data = serde_json::to_string(self).map_err(|e| PlannerError::Storage(e.to_string()))?;
        db.set_value(STRATEGIES_KEY, &data)
            .map_err(|e| PlannerError::Storage(e.to_string()))?;
        log::debug!("策略已保存 ({} 个)", self.len());
        Ok(())
    }

    /// 只计算差异，不修改
    pub fn preview_merge_defaults(&self, defaults: &StrategyStore) -> MergeDiff {
        let mut diff = MergeDiff::default();
        for strategy in defaults.iter() {
            match self.get(&strategy.name) {
                None => diff.new_strategies.push(strategy.name.clone()),
                Some(existing) => {
                    for target in &strategy.targets {
                        if existing.find(&target.name).is_none() {
                            diff.new_targets.push(format!("{} - {}", strategy.name, target.name));
                        }
                    }
                }
            }
        }
        diff.changed = !diff.new_strategies.is_empty() || !diff.new_targets.is_empty();
        diff
    }

    /// 补充默认策略中缺失的策略与标的，已存在的不覆盖
    pub fn merge_defaults(&mut self, defaults: &StrategyStore) -> MergeDiff {
        let diff = self.preview_merge_defaults(defaults);
        for strategy in defaults.iter() {
            match self.get_mut(&strategy.name) {
                None => {
                    let targets = strategy.targets.iter().map(Target::duplicate).collect();
                    self.insert(Strategy::with_targets(strategy.name.clone(), targets));
                }
                Some(existing) => {
                    for target in &strategy.targets {
                        if existing.find(&target.name).is_none() {
                            existing.targets.push(target.duplicate());
                        }
                    }
                }
            }
        }
        if diff.changed {
            log::info!(
                "补充默认策略: 新增策略 {} 个, 新增标的 {} 个",
                diff.new_strategies.len(),
                diff.new_targets.len()
            );
        }
        diff
    }

    pub fn add_strategy(&mut self, name: &str) -> PlannerResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::InvalidName);
        }
        if self.contains(name) {
            return Err(PlannerError::DuplicateName(name.to_string()));
        }
        self.insert(Strategy::new(name));
        Ok(())
    }

    pub fn delete_strategy(&mut self, name: &str) -> PlannerResult<Strategy> {
        self.remove(name)
            .ok_or_else(|| PlannerError::StrategyNotFound(name.to_string()))
    }

    pub fn strategy_mut(&mut self, name: &str) -> PlannerResult<&mut Strategy> {
        self.get_mut(name)
            .ok_or_else(|| PlannerError::StrategyNotFound(name.to_string()))
    }

    /// 清空所有持有状态，策略与标的保留
    pub fn clear_all_holds(&mut self) {
        for strategy in self.strategies_mut() {
            for target in strategy.targets.iter_mut() {
                target.hold = false;
            }
        }
    }

    /// 参考市值：所有策略中标记持有该名称的标的默认金额之和
    pub fn reference_market_value(&self, stock_name: &str) -> f64 {
        self.iter()
            .flat_map(|s| s.targets.iter())
            .filter(|t| t.name == stock_name && t.hold)
            .map(|t| t.default_amount)
            .sum()
    }

    /// 除 `current` 外，当前标记持有该标的的策略
    pub fn other_holders(&self, current: &str, target_name: &str) -> Vec<String> {
        self.iter()
            .filter(|s| s.name != current)
            .filter(|s| s.targets.iter().any(|t| t.name == target_name && t.hold))
            .map(|s| s.name.clone())
            .collect()
    }
}

impl Strategy {
    pub fn add_target(&mut self, name: &str, amount: &str) -> PlannerResult<&Target> {
        let (name, amount) = validate_target_input(name, amount)?;
        if self.find(&name).is_some() {
            return Err(PlannerError::DuplicateName(name));
        }
        self.targets.push(Target::new(name, amount));
        Ok(&self.targets[self.targets.len() - 1])
    }

    pub fn edit_target(&mut self, index: usize, name: &str, amount: &str) -> PlannerResult<()> {
        let (name, amount) = validate_target_input(name, amount)?;
        if index >= self.targets.len() {
            return Err(PlannerError::TargetNotFound);
        }
        if self.targets.iter().enumerate().any(|(i, t)| i != index && t.name == name) {
            return Err(PlannerError::DuplicateName(name));
        }
        let target = &mut self.targets[index];
        target.name = name;
        target.default_amount = amount;
        Ok(())
    }

    pub fn delete_target(&mut self, index: usize) -> PlannerResult<Target> {
        if index >= self.targets.len() {
            return Err(PlannerError::TargetNotFound);
        }
        Ok(self.targets.remove(index))
    }

    /// 批量修改默认金额，只接受正数；返回是否有改动
    pub fn set_default_amounts(&mut self, updates: &HashMap<usize, f64>) -> bool {
        let mut changed = false;
        for (index, target) in self.targets.iter_mut().enumerate() {
            let Some(&amount) = updates.get(&index) else {
                continue;
            };
            if amount.is_finite() && amount > 0.0 && target.default_amount != amount {
                target.default_amount = amount;
                changed = true;
            }
        }
        changed
    }
}
