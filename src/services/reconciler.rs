use std::collections::HashMap;

use crate::models::position::{
    AccountSnapshot, AccountView, RawPosition, ReconciledPosition, RelatedStrategy, UNKNOWN_STOCK_NAME,
};
use crate::models::strategy::StrategyStore;
use crate::services::name_resolver::NameResolver;
use crate::utils::format::{format_update_time, percent_text};

pub const DIVERGENCE_THRESHOLD: f64 = 0.3;

pub struct PositionReconciler;

impl PositionReconciler {
    /// 持仓对账：补全名称 → 关联策略 → 排序 → 参考市值与偏离标记
    pub fn reconcile(
        snapshot: &AccountSnapshot,
        names: &NameResolver,
        store: &StrategyStore,
        threshold: f64,
    ) -> AccountView {
        let total_asset = snapshot.asset.total_asset;

        let mut positions: Vec<ReconciledPosition> = snapshot
            .positions
            .positions
            .iter()
            .enumerate()
            .map(|(i, raw)| Self::reconcile_one(i, raw, names, store, total_asset, threshold))
            .collect();

        // 稳定排序：无关联策略 → 有关联策略 → 名称未知
        positions.sort_by_key(Self::sort_rank);

        let mut market_values = HashMap::new();
        let mut percents = HashMap::new();
        for pos in positions.iter().filter(|p| p.has_name()) {
            market_values.insert(pos.stock_name.clone(), pos.market_value.unwrap_or(0.0));
            percents.insert(pos.stock_name.clone(), pos.percent.clone());
        }

        AccountView {
            asset: snapshot.asset.clone(),
            last_update: format_update_time(snapshot.positions.last_update.as_ref()),
            positions,
            market_values,
            percents,
        }
    }

    fn reconcile_one(
        orig_index: usize,
        raw: &RawPosition,
        names: &NameResolver,
        store: &StrategyStore,
        total_asset: f64,
        threshold: f64,
    ) -> ReconciledPosition {
        let stock_name = Self::complete_name(raw, names);
        let known = !stock_name.is_empty();

        let (related_strategies, reference_value) = if known {
            (
                Self::related_strategies(store, &stock_name),
                store.reference_market_value(&stock_name),
            )
        } else {
            (Vec::new(), 0.0)
        };

        ReconciledPosition {
            stock_code: raw.stock_code.clone(),
            market_value: raw.market_value,
            volume: raw.volume,
            can_use_volume: raw.can_use_volume,
            avg_price: raw.avg_price,
            divergent: Self::is_divergent(raw.market_value, reference_value, threshold),
            percent: percent_text(raw.market_value, total_asset),
            related_strategies,
            reference_value,
            stock_name,
            orig_index,
        }
    }

    /// 名称缺失或为 "未知股票" 时用代码表补全
    pub fn complete_name(raw: &RawPosition, names: &NameResolver) -> String {
        let current = raw.stock_name.as_deref().unwrap_or("");
        if current.is_empty() || current == UNKNOWN_STOCK_NAME {
            if let Some(resolved) = names.resolve(&raw.stock_code) {
                return resolved.to_string();
            }
        }
        current.to_string()
    }

    /// 包含该名称标的的所有策略（不论持有状态），按策略顺序
    pub fn related_strategies(store: &StrategyStore, stock_name: &str) -> Vec<RelatedStrategy> {
        store
            .iter()
            .filter_map(|s| {
                let mut matching = s.targets.iter().filter(|t| t.name == stock_name).peekable();
                matching.peek()?;
                Some(RelatedStrategy {
                    name: s.name.clone(),
                    held: matching.any(|t| t.hold),
                })
            })
            .collect()
    }

    /// 实际市值偏离参考市值超过阈值；参考市值为 0 时不标记
    pub fn is_divergent(actual: Option<f64>, reference: f64, threshold: f64) -> bool {
        match actual {
            Some(actual) if reference > 0.0 => (actual - reference).abs() / reference > threshold,
            _ => false,
        }
    }

    fn sort_rank(pos: &ReconciledPosition) -> u8 {
        if !pos.has_name() {
            2
        } else if pos.related_strategies.is_empty() {
            0
        } else {
            1
        }
    }
}
