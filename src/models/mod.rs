pub mod plan;
pub mod position;
pub mod settings;
pub mod strategy;
