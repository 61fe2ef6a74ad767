pub mod account_cmd;
pub mod plan_cmd;
pub mod strategy_cmd;
