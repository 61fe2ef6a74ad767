use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::utils::lenient::number_or_zero;

/// 策略中的单个标的
///
/// `id` 只存在于内存中（不落盘），用于调仓计划稳定地引用标的，
/// 改名或删除其他标的都不会让引用错位。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    #[serde(skip, default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub default_amount: f64,
    #[serde(default)]
    pub hold: bool,
}

impl Target {
    pub fn new(name: impl Into<String>, default_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            default_amount,
            hold: false,
        }
    }

    /// 深拷贝并分配新 id
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

// id 是会话内标识，不参与业务相等性比较
impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.default_amount == other.default_amount && self.hold == other.hold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub targets: Vec<Target>,
}

impl Strategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: Vec::new(),
        }
    }

    /// 构造时按名称去重（保留首个），保证策略内标的名称唯一
    pub fn with_targets(name: impl Into<String>, targets: Vec<Target>) -> Self {
        let mut strategy = Self::new(name);
        for target in targets {
            if strategy.position_of(&target.name).is_none() {
                strategy.targets.push(target);
            } else {
                log::debug!("策略 {} 中标的 {} 重复，已忽略", strategy.name, target.name);
            }
        }
        strategy
    }

    pub fn position_of(&self, target_name: &str) -> Option<usize> {
        self.targets.iter().position(|t| t.name == target_name)
    }

    pub fn find(&self, target_name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == target_name)
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: Uuid) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    /// 展示顺序：持有的在前，其余保持原顺序
    pub fn hold_first(&self) -> Vec<&Target> {
        let mut sorted: Vec<&Target> = self.targets.iter().collect();
        sorted.sort_by_key(|t| !t.hold);
        sorted
    }
}

/// 全部策略，按插入顺序保存；持久化格式为 `{策略名: [标的...]}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyStore {
    strategies: Vec<Strategy>,
}

impl StrategyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Strategy> {
        self.strategies.iter_mut().find(|s| s.name == name)
    }

    /// 同名策略覆盖原位置，否则追加到末尾
    pub fn insert(&mut self, strategy: Strategy) {
        match self.get_mut(&strategy.name) {
            Some(existing) => *existing = strategy,
            None => self.strategies.push(strategy),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Strategy> {
        let pos = self.strategies.iter().position(|s| s.name == name)?;
        Some(self.strategies.remove(pos))
    }

    pub(crate) fn strategies_mut(&mut self) -> impl Iterator<Item = &mut Strategy> {
        self.strategies.iter_mut()
    }
}

impl Serialize for StrategyStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.strategies.len()))?;
        for strategy in &self.strategies {
            map.serialize_entry(&strategy.name, &strategy.targets)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StrategyStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = StrategyStore;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of strategy name to target list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut store = StrategyStore::new();
                while let Some((name, targets)) = access.next_entry::<String, Vec<Target>>()? {
                    store.insert(Strategy::with_targets(name, targets));
                }
                Ok(store)
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}

/// 策略页的一行：标的 + 当前市值 + 持有状态 + 其他持有策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRow {
    /// 在策略中的实际位置（修改/删除标的用）
    pub index: usize,
    pub name: String,
    pub default_amount: f64,
    pub market_value: f64,
    pub hold: bool,
    pub other_holders: Vec<String>,
}

/// 内置默认策略
pub fn default_strategies() -> StrategyStore {
    let basket = |names: &[&str], amount: f64| -> Vec<Target> {
        names.iter().map(|n| Target::new(*n, amount)).collect()
    };

    let mut store = StrategyStore::new();
    store.insert(Strategy::with_targets(
        "美股策略",
        basket(
            &[
                "海外科技", "纳指9941", "纳指3100", "嘉实黄金", "美国消费", "嘉实原油",
                "黄金ETF", "黄金主题", "印度基金", "纳指生物科技", "原油易方达", "中概互联网",
            ],
            11000.0,
        ),
    ));
    store.insert(Strategy::with_targets(
        "黄金策略",
        basket(
            &[
                "黄金主题", "黄金ETF", "黄金LOF", "嘉实黄金", "标普医疗", "美国消费",
                "美国精选", "国泰商品", "嘉实原油", "标普信息科技", "印度基金", "黄金主题",
            ],
            11000.0,
        ),
    ));
    store.insert(Strategy::with_targets(
        "国债策略",
        vec![
            Target::new("30年国债", 190000.0),
            Target::new("30年国债指数", 130000.0),
            Target::new("可转债", 80000.0),
        ],
    ));
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_serializes_as_ordered_map() {
        let mut store = StrategyStore::new();
        store.insert(Strategy::with_targets("乙", vec![Target::new("A", 100.0)]));
        store.insert(Strategy::new("甲"));
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"乙":[{"name":"A","default_amount":100.0,"hold":false}],"甲":[]}"#);
    }

    #[test]
    fn test_store_deserialize_keeps_order_and_assigns_ids() {
        let json = r#"{"z":[{"name":"X","default_amount":"500","hold":true}],"a":[{"name":"Y","default_amount":10}]}"#;
        let store: StrategyStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.names(), vec!["z".to_string(), "a".to_string()]);
        let x = store.get("z").unwrap().find("X").unwrap();
        assert_eq!(x.default_amount, 500.0);
        assert!(x.hold);
        let y = store.get("a").unwrap().find("Y").unwrap();
        assert!(!y.hold);
        assert_ne!(x.id, y.id);
    }

    #[test]
    fn test_default_gold_strategy_has_unique_names() {
        let store = default_strategies();
        let gold = store.get("黄金策略").unwrap();
        assert_eq!(gold.targets.len(), 11);
        assert_eq!(store.get("美股策略").unwrap().targets.len(), 12);
        assert_eq!(store.get("国债策略").unwrap().targets[0].default_amount, 190000.0);
    }

    #[test]
    fn test_hold_first_is_stable() {
        let mut s = Strategy::with_targets(
            "s",
            vec![Target::new("a", 1.0), Target::new("b", 1.0), Target::new("c", 1.0)],
        );
        s.targets[2].hold = true;
        let order: Vec<&str> = s.hold_first().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
