use uuid::Uuid;

use crate::error::{PlannerError, PlannerResult};
use crate::models::plan::{PlanEntry, PlanRow, TargetSelection};
use crate::models::position::AccountView;
use crate::models::strategy::StrategyStore;
use crate::utils::format::ratio_of;

/// 本次会话的调仓计划列表（不落盘）
#[derive(Debug, Clone, Default)]
pub struct PlanList {
    entries: Vec<PlanEntry>,
}

impl PlanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按策略页展示顺序（持有在前）把选择了动作的标的加入计划
    ///
    /// 金额留空时使用标的默认金额；一个动作都没选时返回 `NoChangeSelected`，列表不变。
    pub fn add_entries(
        &mut self,
        store: &StrategyStore,
        strategy_name: &str,
        selections: &[TargetSelection],
    ) -> PlannerResult<usize> {
        let strategy = store
            .get(strategy_name)
            .ok_or_else(|| PlannerError::StrategyNotFound(strategy_name.to_string()))?;

        let mut created = Vec::new();
        for target in strategy.hold_first() {
            let Some(selection) = selections
                .iter()
                .find(|s| s.target == target.name && s.action.is_some())
            else {
                continue;
            };
            let Some(action) = selection.action else {
                continue;
            };
            let index = strategy.position_of(&target.name).unwrap_or_default();
            created.push(PlanEntry {
                id: Uuid::new_v4(),
                strategy: strategy_name.to_string(),
                index,
                target_id: target.id,
                target: target.name.clone(),
                action,
                value: selection.value.unwrap_or(target.default_amount),
                hold_before: target.hold,
                hold_after: None,
                other_hold: store.other_holders(strategy_name, &target.name),
            });
        }

        if created.is_empty() {
            return Err(PlannerError::NoChangeSelected);
        }
        let count = created.len();
        log::info!("策略 {} 新增 {} 条调仓计划", strategy_name, count);
        self.entries.extend(created);
        Ok(count)
    }

    pub fn remove(&mut self, idx: usize) -> Option<PlanEntry> {
        if idx < self.entries.len() {
            Some(self.entries.remove(idx))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 删除策略时一并清理其计划
    pub fn purge_strategy(&mut self, strategy_name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.strategy != strategy_name);
        before - self.entries.len()
    }

    /// 删除标的时清理引用它的计划
    pub fn purge_target(&mut self, target_id: Uuid) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.target_id != target_id);
        before - self.entries.len()
    }

    /// 执行后其他策略的持有情况：其他策略若也有该标的的计划，以计划结果为准
    pub fn projected_other_holders(&self, store: &StrategyStore, entry: &PlanEntry) -> Vec<String> {
        let mut holders = Vec::new();
        for strategy in store.iter().filter(|s| s.name != entry.strategy) {
            for target in strategy.targets.iter().filter(|t| t.name == entry.target) {
                let hold = self
                    .entries
                    .iter()
                    .find(|p| p.strategy == strategy.name && p.target == entry.target)
                    .map(PlanEntry::projected_hold_after)
                    .unwrap_or(target.hold);
                if hold {
                    holders.push(strategy.name.clone());
                }
            }
        }
        holders
    }

    /// 刷新 `hold_after` 并生成展示行
    pub fn render(&mut self, store: &StrategyStore, view: Option<&AccountView>) -> Vec<PlanRow> {
        let asset_total = view.map(|v| v.asset.total_asset).unwrap_or(0.0);
        for entry in self.entries.iter_mut() {
            entry.hold_after = Some(entry.projected_hold_after());
        }
        self.entries
            .iter()
            .map(|entry| PlanRow {
                strategy: entry.strategy.clone(),
                target: entry.target.clone(),
                action: entry.action,
                value: entry.value,
                exec_percent: format!("{:.2}%", ratio_of(entry.value, asset_total)),
                hold_percent: view
                    .map(|v| v.percent_of(&entry.target))
                    .unwrap_or_else(|| "0%".to_string()),
                hold_before: entry.hold_before,
                hold_after: entry.projected_hold_after(),
                other_hold_after: self.projected_other_holders(store, entry),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::PlanAction;
    use crate::models::position::AccountAsset;
    use crate::models::strategy::{Strategy, Target};
    use std::collections::HashMap;

    fn target(name: &str, amount: f64, hold: bool) -> Target {
        let mut t = Target::new(name, amount);
        t.hold = hold;
        t
    }

    fn sample_store() -> StrategyStore {
        let mut store = StrategyStore::new();
        store.insert(Strategy::with_targets(
            "美股策略",
            vec![
                target("海外科技", 11000.0, false),
                target("黄金主题", 11000.0, true),
                target("纳指9941", 8000.0, false),
            ],
        ));
        store.insert(Strategy::with_targets(
            "黄金策略",
            vec![target("黄金主题", 11000.0, true), target("黄金ETF", 11000.0, false)],
        ));
        store
    }

    #[test]
    fn test_add_entries_uses_default_amount_and_store_index() {
        let store = sample_store();
        let mut plans = PlanList::new();
        let selections = vec![
            TargetSelection::new("纳指9941", PlanAction::Buy),
            TargetSelection::new("黄金主题", PlanAction::Sell).with_value(5000.0),
            TargetSelection { target: "海外科技".into(), action: None, value: Some(1.0) },
        ];
        let added = plans.add_entries(&store, "美股策略", &selections).unwrap();
        assert_eq!(added, 2);

        // 持有的黄金主题排在展示列表最前面
        let first = &plans.entries()[0];
        assert_eq!(first.target, "黄金主题");
        assert_eq!(first.index, 1);
        assert_eq!(first.value, 5000.0);
        assert!(first.hold_before);
        assert_eq!(first.other_hold, vec!["黄金策略".to_string()]);

        let second = &plans.entries()[1];
        assert_eq!(second.target, "纳指9941");
        assert_eq!(second.index, 2);
        assert_eq!(second.value, 8000.0);
        assert!(!second.hold_before);
        assert!(second.other_hold.is_empty());
    }

    #[test]
    fn test_add_entries_without_action_is_rejected() {
        let store = sample_store();
        let mut plans = PlanList::new();
        let selections = vec![TargetSelection { target: "海外科技".into(), action: None, value: None }];
        assert_eq!(
            plans.add_entries(&store, "美股策略", &selections),
            Err(PlannerError::NoChangeSelected)
        );
        assert!(plans.is_empty());
        assert_eq!(
            plans.add_entries(&store, "不存在", &selections),
            Err(PlannerError::StrategyNotFound("不存在".into()))
        );
    }

    #[test]
    fn test_projection_independent_of_other_entries() {
        let store = sample_store();
        let mut plans = PlanList::new();
        plans
            .add_entries(&store, "美股策略", &[TargetSelection::new("海外科技", PlanAction::Buy)])
            .unwrap();
        plans
            .add_entries(&store, "黄金策略", &[TargetSelection::new("黄金ETF", PlanAction::Sell)])
            .unwrap();
        let rows = plans.render(&store, None);
        assert!(rows[0].hold_after);
        assert!(!rows[0].hold_before);
        assert!(!rows[1].hold_after);
        assert_eq!(plans.entries()[0].hold_after, Some(true));
    }

    #[test]
    fn test_other_holders_follow_pending_plans() {
        let store = sample_store();
        let mut plans = PlanList::new();
        plans
            .add_entries(&store, "美股策略", &[TargetSelection::new("黄金主题", PlanAction::Buy)])
            .unwrap();
        let entry = plans.entries()[0].clone();
        assert_eq!(plans.projected_other_holders(&store, &entry), vec!["黄金策略".to_string()]);

        // 黄金策略计划卖出后，其他持有者为空，但创建时快照不变
        plans
            .add_entries(&store, "黄金策略", &[TargetSelection::new("黄金主题", PlanAction::Sell)])
            .unwrap();
        assert!(plans.projected_other_holders(&store, &entry).is_empty());
        assert_eq!(plans.entries()[0].other_hold, vec!["黄金策略".to_string()]);

        let gold_entry = plans.entries()[1].clone();
        assert_eq!(plans.projected_other_holders(&store, &gold_entry), vec!["美股策略".to_string()]);
    }

    #[test]
    fn test_render_percentages() {
        let store = sample_store();
        let mut plans = PlanList::new();
        plans
            .add_entries(&store, "美股策略", &[TargetSelection::new("黄金主题", PlanAction::Sell)])
            .unwrap();
        let view = AccountView {
            asset: AccountAsset { total_asset: 220000.0, ..Default::default() },
            percents: HashMap::from([("黄金主题".to_string(), "10.00%".to_string())]),
            ..Default::default()
        };
        let rows = plans.render(&store, Some(&view));
        assert_eq!(rows[0].exec_percent, "5.00%");
        assert_eq!(rows[0].hold_percent, "10.00%");

        let rows = plans.render(&store, None);
        assert_eq!(rows[0].exec_percent, "0.00%");
        assert_eq!(rows[0].hold_percent, "0%");
    }

    #[test]
    fn test_remove_and_purge() {
        let store = sample_store();
        let mut plans = PlanList::new();
        plans
            .add_entries(
                &store,
                "美股策略",
                &[
                    TargetSelection::new("海外科技", PlanAction::Buy),
                    TargetSelection::new("纳指9941", PlanAction::Buy),
                ],
            )
            .unwrap();
        plans
            .add_entries(&store, "黄金策略", &[TargetSelection::new("黄金ETF", PlanAction::Buy)])
            .unwrap();
        assert!(plans.remove(10).is_none());
        let removed = plans.remove(0).unwrap();
        assert_eq!(removed.target, "海外科技");

        let etf_id = store.get("黄金策略").unwrap().find("黄金ETF").unwrap().id;
        assert_eq!(plans.purge_target(etf_id), 1);
        assert_eq!(plans.purge_strategy("美股策略"), 1);
        assert!(plans.is_empty());
    }
}
