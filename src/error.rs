use thiserror::Error;

/// 调仓助手的业务错误，均以提示形式展示给用户，不会导致进程退出
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    #[error("请输入名称")]
    InvalidName,

    #[error("请输入有效的默认买入金额")]
    InvalidAmount,

    #[error("名称已存在: {0}")]
    DuplicateName(String),

    #[error("未选择任何标的变更！")]
    NoChangeSelected,

    #[error("没有计划可导出")]
    EmptyPlan,

    #[error("策略不存在: {0}")]
    StrategyNotFound(String),

    #[error("标的不存在")]
    TargetNotFound,

    #[error("读取账户信息失败：{0}")]
    FetchFailure(String),

    #[error("保存失败：{0}")]
    Storage(String),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
