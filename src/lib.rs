pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use db::database::Database;
use models::position::{AccountSnapshot, AccountView};
use models::settings::PlannerSettings;
use models::strategy::StrategyStore;
use services::account_data::AccountDataService;
use services::name_resolver::NameResolver;
use services::plan_builder::PlanList;
use services::reconciler::PositionReconciler;
use services::refresher::{run_auto_refresh, RefreshCoordinator};

/// 应用全局状态；加锁顺序固定为 store → plans → account → names
pub struct AppState {
    pub db: Database,
    pub settings: PlannerSettings,
    pub store: Mutex<StrategyStore>,
    pub plans: Mutex<PlanList>,
    pub account: RwLock<Option<AccountSnapshot>>,
    pub names: RwLock<NameResolver>,
    pub refresh: RefreshCoordinator,
}

impl AppState {
    pub fn new(db: Database) -> anyhow::Result<Self> {
        let settings = db.load_settings()?;
        let store = StrategyStore::load(&db);
        Ok(Self {
            db,
            settings,
            store: Mutex::new(store),
            plans: Mutex::new(PlanList::new()),
            account: RwLock::new(None),
            names: RwLock::new(NameResolver::empty()),
            refresh: RefreshCoordinator::new(),
        })
    }

    /// 持有快照写锁完成序号校验与替换，过期结果不会覆盖较新的数据
    pub fn commit_account(&self, ticket: u64, snapshot: AccountSnapshot) -> bool {
        let mut account = self.account.write().unwrap();
        if !self.refresh.try_commit(ticket) {
            return false;
        }
        *account = Some(snapshot);
        true
    }

    pub fn replace_names(&self, names: NameResolver) {
        *self.names.write().unwrap() = names;
    }

    /// 用当前策略重新对账最近一次快照；尚未拉取到账户数据时为 None
    pub fn account_view(&self, store: &StrategyStore) -> Option<AccountView> {
        let account = self.account.read().unwrap();
        let snapshot = account.as_ref()?;
        let names = self.names.read().unwrap();
        Some(PositionReconciler::reconcile(
            snapshot,
            &names,
            store,
            self.settings.divergence_threshold,
        ))
    }
}

fn data_dir() -> PathBuf {
    std::env::var("PLANNER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let database = Database::new(data_dir())?;
    let state = AppState::new(database)?;
    let service = AccountDataService::new(&state.settings)?;

    // 先加载代码映射表，再拉取账户信息
    commands::account_cmd::load_name_table(&state, &service).await;
    match commands::account_cmd::refresh_account(&state, &service).await {
        Ok(Some(view)) => {
            log::info!(
                "账户 {} 总资产 {:.2} 可用现金 {:.2} 持仓 {} 条 {}",
                view.asset.account_id,
                view.asset.total_asset,
                view.asset.cash,
                view.positions.len(),
                view.last_update
            );
            for pos in view.positions.iter().filter(|p| p.divergent) {
                log::warn!(
                    "{} 市值 {:.2} 偏离参考市值 {}",
                    pos.display_name(),
                    pos.market_value.unwrap_or(0.0),
                    pos.reference_value_text()
                );
            }
        }
        Ok(None) => {}
        Err(msg) => log::warn!("{}", msg),
    }

    if !state.settings.auto_refresh {
        return Ok(());
    }
    tokio::select! {
        _ = run_auto_refresh(&state, &service, state.settings.refresh_interval_secs) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("收到退出信号");
        }
    }
    Ok(())
}
