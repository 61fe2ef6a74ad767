use std::collections::HashMap;

use crate::error::PlannerError;
use crate::models::strategy::{default_strategies, TargetRow};
use crate::services::strategy_store::{parse_amount, MergeDiff};
use crate::AppState;

pub fn get_strategy_names(state: &AppState) -> Vec<String> {
    state.store.lock().unwrap().names()
}

/// 策略页：持有在前，附当前市值与其他策略持有情况
pub fn get_strategy_view(state: &AppState, strategy: &str) -> Result<Vec<TargetRow>, String> {
    let store = state.store.lock().unwrap();
    let s = store
        .get(strategy)
        .ok_or_else(|| PlannerError::StrategyNotFound(strategy.to_string()).to_string())?;
    let view = state.account_view(&store);

    Ok(s.hold_first()
        .into_iter()
        .map(|t| TargetRow {
            index: s.position_of(&t.name).unwrap_or_default(),
            name: t.name.clone(),
            default_amount: t.default_amount,
            market_value: view.as_ref().map(|v| v.market_value_of(&t.name)).unwrap_or(0.0),
            hold: t.hold,
            other_holders: store.other_holders(strategy, &t.name),
        })
        .collect())
}

pub fn add_strategy(state: &AppState, name: &str) -> Result<(), String> {
    let mut store = state.store.lock().unwrap();
    store.add_strategy(name).map_err(|e| e.to_string())?;
    store.save(&state.db).map_err(|e| e.to_string())?;
    log::info!("新增策略: {}", name.trim());
    Ok(())
}

/// 删除策略及其下所有计划，返回被清理的计划条数
pub fn delete_strategy(state: &AppState, name: &str) -> Result<usize, String> {
    let mut store = state.store.lock().unwrap();
    store.delete_strategy(name).map_err(|e| e.to_string())?;
    store.save(&state.db).map_err(|e| e.to_string())?;
    let purged = state.plans.lock().unwrap().purge_strategy(name);
    log::info!("策略已删除: {} (清理计划 {} 条)", name, purged);
    Ok(purged)
}

pub fn add_target(state: &AppState, strategy: &str, name: &str, amount: &str) -> Result<(), String> {
    let mut store = state.store.lock().unwrap();
    let s = store.strategy_mut(strategy).map_err(|e| e.to_string())?;
    s.add_target(name, amount).map_err(|e| e.to_string())?;
    store.save(&state.db).map_err(|e| e.to_string())
}

pub fn edit_target(
    state: &AppState,
    strategy: &str,
    index: usize,
    name: &str,
    amount: &str,
) -> Result<(), String> {
    let mut store = state.store.lock().unwrap();
    let s = store.strategy_mut(strategy).map_err(|e| e.to_string())?;
    s.edit_target(index, name, amount).map_err(|e| e.to_string())?;
    store.save(&state.db).map_err(|e| e.to_string())
}

pub fn delete_target(state: &AppState, strategy: &str, index: usize) -> Result<(), String> {
    let mut store = state.store.lock().unwrap();
    let s = store.strategy_mut(strategy).map_err(|e| e.to_string())?;
    let removed = s.delete_target(index).map_err(|e| e.to_string())?;
    store.save(&state.db).map_err(|e| e.to_string())?;
    let purged = state.plans.lock().unwrap().purge_target(removed.id);
    log::info!("标的已删除: {} - {} (清理计划 {} 条)", strategy, removed.name, purged);
    Ok(())
}

/// 批量修改默认金额，空白或非正数的输入忽略；返回是否有改动
pub fn change_default_amounts(
    state: &AppState,
    strategy: &str,
    inputs: &[(usize, String)],
) -> Result<bool, String> {
    let updates: HashMap<usize, f64> = inputs
        .iter()
        .filter_map(|(idx, raw)| parse_amount(raw).ok().map(|v| (*idx, v)))
        .collect();
    let mut store = state.store.lock().unwrap();
    let changed = store
        .strategy_mut(strategy)
        .map_err(|e| e.to_string())?
        .set_default_amounts(&updates);
    store.save(&state.db).map_err(|e| e.to_string())?;
    Ok(changed)
}

pub fn preview_merge_defaults(state: &AppState) -> MergeDiff {
    state.store.lock().unwrap().preview_merge_defaults(&default_strategies())
}

pub fn merge_defaults(state: &AppState) -> Result<MergeDiff, String> {
    let mut store = state.store.lock().unwrap();
    let diff = store.merge_defaults(&default_strategies());
    store.save(&state.db).map_err(|e| e.to_string())?;
    Ok(diff)
}

/// 清空所有持有状态和调仓计划，策略与标的保留
pub fn reset_holdings(state: &AppState) -> Result<(), String> {
    let mut store = state.store.lock().unwrap();
    store.clear_all_holds();
    state.plans.lock().unwrap().clear();
    store.save(&state.db).map_err(|e| e.to_string())?;
    log::info!("已清空所有持有状态和变更计划");
    Ok(())
}
