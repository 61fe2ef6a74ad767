use crate::models::plan::{ExecuteReport, PlanAction, PlanExport, PlanRow, TargetSelection};
use crate::models::position::AccountFigures;
use crate::services::plan_executor::PlanExecutor;
use crate::AppState;

/// 策略页表单输入 → 选择项；金额留空或无法解析时使用默认金额
pub fn selection_from_form(target: &str, action: &str, value: &str) -> TargetSelection {
    TargetSelection {
        target: target.to_string(),
        action: PlanAction::parse(action),
        value: value.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

pub fn get_plans(state: &AppState) -> Vec<PlanRow> {
    let store = state.store.lock().unwrap();
    let mut plans = state.plans.lock().unwrap();
    let view = state.account_view(&store);
    plans.render(&store, view.as_ref())
}

/// 把策略页中选择了动作的标的加入计划，返回最新计划列表
pub fn add_plan(
    state: &AppState,
    strategy: &str,
    selections: &[TargetSelection],
) -> Result<Vec<PlanRow>, String> {
    {
        let store = state.store.lock().unwrap();
        let mut plans = state.plans.lock().unwrap();
        plans
            .add_entries(&store, strategy, selections)
            .map_err(|e| e.to_string())?;
    }
    Ok(get_plans(state))
}

pub fn delete_plan(state: &AppState, idx: usize) -> Result<Vec<PlanRow>, String> {
    let removed = state.plans.lock().unwrap().remove(idx);
    if removed.is_none() {
        return Err(format!("计划不存在: {}", idx));
    }
    Ok(get_plans(state))
}

/// 按计划更新持有状态并保存，计划列表保留
pub fn approve_plan(state: &AppState) -> Result<ExecuteReport, String> {
    let mut store = state.store.lock().unwrap();
    let plans = state.plans.lock().unwrap();
    PlanExecutor::execute(plans.entries(), &mut store, &state.db).map_err(|e| e.to_string())
}

pub fn export_plan(state: &AppState) -> Result<PlanExport, String> {
    let plans = state.plans.lock().unwrap();
    let figures = current_figures(state);
    let export = PlanExecutor::export(plans.entries(), figures).map_err(|e| e.to_string())?;
    log::info!(
        "导出计划: 买入 {} 条, 卖出 {} 条; {}; {}",
        export.document.buy_stocks_info.len(),
        export.document.sell_stocks_info.len(),
        export.summary.before_text(),
        export.summary.after_text()
    );
    Ok(export)
}

/// 导出并执行，返回供复制的 JSON 文本
pub fn approve_and_export(state: &AppState) -> Result<String, String> {
    let export = export_plan(state)?;
    approve_plan(state)?;
    export.document.to_pretty_json().map_err(|e| e.to_string())
}

fn current_figures(state: &AppState) -> AccountFigures {
    state
        .account
        .read()
        .unwrap()
        .as_ref()
        .map(|snapshot| snapshot.figures())
        .unwrap_or_default()
}
