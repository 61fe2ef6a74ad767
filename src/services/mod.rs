pub mod account_data;
pub mod name_resolver;
pub mod plan_builder;
pub mod plan_executor;
pub mod reconciler;
pub mod refresher;
pub mod strategy_store;
