use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{PlannerError, PlannerResult};
use crate::services::account_data::AccountDataService;
use crate::AppState;

/// 刷新序号协调：每次拉取领取一个序号，只有比已应用序号更新的结果才会写入，
/// 重叠的慢请求返回时直接丢弃
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    issued: AtomicU64,
    applied: Mutex<u64>,
    remaining_secs: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 结果是否仍是最新，是则登记为已应用
    pub fn try_commit(&self, ticket: u64) -> bool {
        let mut applied = self.applied.lock().unwrap();
        if ticket > *applied {
            *applied = ticket;
            true
        } else {
            false
        }
    }

    pub fn last_applied(&self) -> u64 {
        *self.applied.lock().unwrap()
    }

    /// 距离下次自动刷新的秒数
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs.load(Ordering::Relaxed)
    }

    fn set_remaining(&self, secs: u64) {
        self.remaining_secs.store(secs, Ordering::Relaxed);
    }
}

/// 拉取一次账户数据并替换快照；返回 false 表示结果已被更新的刷新取代
pub async fn refresh_once(state: &AppState, service: &AccountDataService) -> PlannerResult<bool> {
    let ticket = state.refresh.begin();
    let snapshot = service.fetch_account().await.map_err(|e| {
        log::warn!("读取账户信息失败: {:#}", e);
        PlannerError::FetchFailure(format!("{:#}", e))
    })?;

    let count = snapshot.positions.positions.len();
    if !state.commit_account(ticket, snapshot) {
        log::debug!("刷新结果 #{} 已过期，丢弃", ticket);
        return Ok(false);
    }
    log::info!("账户信息已刷新 #{}: {} 条持仓", ticket, count);
    Ok(true)
}

/// 每秒倒计时，归零时刷新；刷新期间不会再发起新的请求
pub async fn run_auto_refresh(state: &AppState, service: &AccountDataService, interval_secs: u64) {
    let interval_secs = interval_secs.max(1);
    // 第一次倒计时在 1 秒后
    let period = Duration::from_secs(1);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    state.refresh.set_remaining(interval_secs);

    loop {
        ticker.tick().await;
        let remain = state.refresh.remaining_secs().saturating_sub(1);
        if remain == 0 {
            // 失败仅影响本轮，保留上次数据，下一轮自然重试
            let _ = refresh_once(state, service).await;
            state.refresh.set_remaining(interval_secs);
        } else {
            state.refresh.set_remaining(remain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_ticket_is_rejected() {
        let coord = RefreshCoordinator::new();
        let first = coord.begin();
        let second = coord.begin();
        assert!(coord.try_commit(second));
        // 先发出的慢请求后返回
        assert!(!coord.try_commit(first));
        assert_eq!(coord.last_applied(), second);
        let third = coord.begin();
        assert!(coord.try_commit(third));
    }
}
