// ==========================================
// 媒体计划预算核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、层级配置规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod alert;
pub mod distribution;
pub mod hierarchy;
pub mod line;
pub mod plan;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use alert::PlanAlert;
pub use distribution::{BudgetDistribution, NewBudgetDistribution};
pub use hierarchy::{
    HierarchyChange, HierarchyConfigError, HierarchyLevelConfig, HierarchyOrder,
    MAX_HIERARCHY_LEVELS,
};
pub use line::{Creative, MediaLine, Moment, MonthlyBudget};
pub use plan::{MediaPlan, PlanSnapshot, PlanVersion};
pub use types::{AlertCategory, AlertLevel, HierarchyLevel};
