use crate::db::database::Database;
use crate::error::{PlannerError, PlannerResult};
use crate::models::plan::{
    ExecuteReport, ExportDocument, ExportSummary, PlanAction, PlanEntry, PlanExport, StockRatio,
};
use crate::models::position::AccountFigures;
use crate::models::strategy::StrategyStore;
use crate::utils::format::{ratio_of, round2};

pub struct PlanExecutor;

impl PlanExecutor {
    /// 按计划更新策略中的持有状态；标的已被删除的计划静默跳过
    pub fn apply(plans: &[PlanEntry], store: &mut StrategyStore) -> ExecuteReport {
        let mut report = ExecuteReport::default();
        for entry in plans {
            let target = store
                .get_mut(&entry.strategy)
                .and_then(|s| s.find_by_id_mut(entry.target_id));
            match target {
                Some(target) => {
                    log::debug!("{} {} - {}", entry.action.label(), entry.strategy, entry.target);
                    target.hold = entry.projected_hold_after();
                    report.applied += 1;
                }
                None => {
                    log::debug!("计划标的已不存在，跳过: {} - {}", entry.strategy, entry.target);
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// 执行计划并保存；计划列表本身不清空
    pub fn execute(
        plans: &[PlanEntry],
        store: &mut StrategyStore,
        db: &Database,
    ) -> PlannerResult<ExecuteReport> {
        if plans.is_empty() {
            return Err(PlannerError::EmptyPlan);
        }
        let report = Self::apply(plans, store);
        store.save(db)?;
        log::info!("计划已执行: 生效 {} 条, 跳过 {} 条", report.applied, report.skipped);
        Ok(report)
    }

    /// 生成导出文档与执行前后资金对比
    pub fn export(plans: &[PlanEntry], account: AccountFigures) -> PlannerResult<PlanExport> {
        if plans.is_empty() {
            return Err(PlannerError::EmptyPlan);
        }

        let mut document = ExportDocument::default();
        let mut buy_sum = 0.0;
        let mut sell_sum = 0.0;
        for entry in plans {
            let item = StockRatio {
                name: entry.target.clone(),
                ratio: round2(ratio_of(entry.value, account.asset_total)),
            };
            match entry.action {
                PlanAction::Buy => {
                    buy_sum += entry.value;
                    document.buy_stocks_info.push(item);
                }
                PlanAction::Sell => {
                    sell_sum += entry.value;
                    document.sell_stocks_info.push(item);
                }
            }
        }

        let cash_after = account.cash + sell_sum - buy_sum;
        let market_after = account.market_value - sell_sum + buy_sum;
        let summary = ExportSummary {
            total_before: account.asset_total,
            cash_before: account.cash,
            market_before: account.market_value,
            buy_sum,
            sell_sum,
            cash_after,
            market_after,
            total_after: cash_after + market_after,
            negative_cash: cash_after < 0.0,
        };
        if summary.negative_cash {
            log::warn!("执行后可用资金为负: {:.2}", cash_after);
        }

        Ok(PlanExport { document, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::TargetSelection;
    use crate::models::strategy::{Strategy, Target};
    use crate::services::plan_builder::PlanList;

    fn figures() -> AccountFigures {
        AccountFigures { cash: 50000.0, market_value: 200000.0, asset_total: 250000.0 }
    }

    fn store() -> StrategyStore {
        let mut store = StrategyStore::new();
        let mut held = Target::new("可转债", 10000.0);
        held.hold = true;
        store.insert(Strategy::with_targets(
            "国债策略",
            vec![Target::new("30年国债", 30000.0), held],
        ));
        store
    }

    #[test]
    fn test_export_arithmetic() {
        let store = store();
        let mut plans = PlanList::new();
        plans
            .add_entries(
                &store,
                "国债策略",
                &[
                    TargetSelection::new("30年国债", PlanAction::Buy),
                    TargetSelection::new("可转债", PlanAction::Sell),
                ],
            )
            .unwrap();

        let export = PlanExecutor::export(plans.entries(), figures()).unwrap();
        let s = export.summary;
        assert_eq!(s.buy_sum, 30000.0);
        assert_eq!(s.sell_sum, 10000.0);
        assert_eq!(s.cash_after, 30000.0);
        assert_eq!(s.market_after, 220000.0);
        assert_eq!(s.total_after, 250000.0);
        assert!(!s.negative_cash);

        assert_eq!(
            export.document.buy_stocks_info,
            vec![StockRatio { name: "30年国债".into(), ratio: 12.0 }]
        );
        assert_eq!(
            export.document.sell_stocks_info,
            vec![StockRatio { name: "可转债".into(), ratio: 4.0 }]
        );
    }

    #[test]
    fn test_export_negative_cash_still_succeeds() {
        let store = store();
        let mut plans = PlanList::new();
        plans
            .add_entries(
                &store,
                "国债策略",
                &[TargetSelection::new("30年国债", PlanAction::Buy).with_value(80000.0)],
            )
            .unwrap();
        let export = PlanExecutor::export(plans.entries(), figures()).unwrap();
        assert_eq!(export.summary.cash_after, -30000.0);
        assert!(export.summary.negative_cash);
        assert_eq!(export.document.buy_stocks_info[0].ratio, 32.0);
    }

    #[test]
    fn test_export_empty_plan() {
        assert_eq!(PlanExecutor::export(&[], figures()).unwrap_err(), PlannerError::EmptyPlan);
    }

    #[test]
    fn test_export_zero_asset_total_ratio() {
        let store = store();
        let mut plans = PlanList::new();
        plans
            .add_entries(&store, "国债策略", &[TargetSelection::new("可转债", PlanAction::Sell)])
            .unwrap();
        let export = PlanExecutor::export(plans.entries(), AccountFigures::default()).unwrap();
        assert_eq!(export.document.sell_stocks_info[0].ratio, 0.0);
    }

    #[test]
    fn test_apply_skips_deleted_target() {
        let mut store = store();
        let mut plans = PlanList::new();
        plans
            .add_entries(
                &store,
                "国债策略",
                &[
                    TargetSelection::new("30年国债", PlanAction::Buy),
                    TargetSelection::new("可转债", PlanAction::Sell),
                ],
            )
            .unwrap();

        // 计划创建后删除了 30年国债
        store.strategy_mut("国债策略").unwrap().delete_target(0).unwrap();
        let report = PlanExecutor::apply(plans.entries(), &mut store);
        assert_eq!(report, ExecuteReport { applied: 1, skipped: 1 });
        let remaining = store.get("国债策略").unwrap();
        assert_eq!(remaining.targets.len(), 1);
        assert!(!remaining.targets[0].hold);
    }

    #[test]
    fn test_execute_persists_and_keeps_plan() {
        let db = Database::open_in_memory().unwrap();
        let mut store = store();
        let mut plans = PlanList::new();
        plans
            .add_entries(&store, "国债策略", &[TargetSelection::new("30年国债", PlanAction::Buy)])
            .unwrap();
        PlanExecutor::execute(plans.entries(), &mut store, &db).unwrap();
        assert_eq!(plans.len(), 1);

        let loaded = StrategyStore::load(&db);
        assert!(loaded.get("国债策略").unwrap().find("30年国债").unwrap().hold);
        assert_eq!(
            PlanExecutor::execute(&[], &mut store, &db).unwrap_err(),
            PlannerError::EmptyPlan
        );
    }
}
