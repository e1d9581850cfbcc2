// ==========================================
// 媒体计划预算核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
mod codec;
pub mod distribution_repo;
pub mod error;
pub mod line_asset_repo;
pub mod line_repo;
pub mod plan_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use distribution_repo::BudgetDistributionRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use line_asset_repo::LineAssetRepository;
pub use line_repo::MediaLineRepository;
pub use plan_repo::{MediaPlanRepository, PlanVersionRepository};
