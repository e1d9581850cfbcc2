// ==========================================
// 媒体计划预算核心 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎, 不拼 SQL
// 红线: 分配树构建只经由 DistributionStore 访问存储
// 红线: 告警引擎为纯函数, 不访问存储
// ==========================================

pub mod alert;
pub mod distribution;
pub mod repositories;
pub mod snapshot_replay;

// 重导出核心引擎
pub use alert::{AlertThresholds, PlanAlertEngine, PlanAlertInput, PlanAlertReport};
pub use distribution::{
    BuildOptions, DistributionBuildResult, DistributionPlan, DistributionStore,
    DistributionTreeBuilder,
};
pub use repositories::PlanRepositories;
pub use snapshot_replay::{
    RestoreResult, SnapshotReplayEngine, SnapshotReplayError, SnapshotReplayResult,
};
