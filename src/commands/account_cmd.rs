use crate::models::position::AccountView;
use crate::services::account_data::AccountDataService;
use crate::services::refresher::refresh_once;
use crate::AppState;

pub async fn load_name_table(state: &AppState, service: &AccountDataService) {
    let names = service.fetch_name_table().await;
    state.replace_names(names);
}

/// 刷新账户信息；结果被更新的刷新取代时返回 None
pub async fn refresh_account(
    state: &AppState,
    service: &AccountDataService,
) -> Result<Option<AccountView>, String> {
    let applied = refresh_once(state, service).await.map_err(|e| e.to_string())?;
    if !applied {
        return Ok(None);
    }
    Ok(get_account_view(state))
}

pub fn get_account_view(state: &AppState) -> Option<AccountView> {
    let store = state.store.lock().unwrap();
    state.account_view(&store)
}

pub fn refresh_countdown(state: &AppState) -> u64 {
    state.refresh.remaining_secs()
}
