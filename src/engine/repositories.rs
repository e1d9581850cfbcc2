// ==========================================
// 媒体计划预算核心 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合快照回放与 API 所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ActionLogRepository, BudgetDistributionRepository, LineAssetRepository, MediaLineRepository,
    MediaPlanRepository, PlanVersionRepository,
};

/// 媒体计划仓储集合
///
/// 全部仓储共享同一个 SQLite 连接
#[derive(Clone)]
pub struct PlanRepositories {
    /// 计划仓储
    pub plan_repo: Arc<MediaPlanRepository>,
    /// 投放行仓储
    pub line_repo: Arc<MediaLineRepository>,
    /// 素材/月度预算/时段仓储
    pub asset_repo: Arc<LineAssetRepository>,
    /// 分配节点仓储
    pub distribution_repo: Arc<BudgetDistributionRepository>,
    /// 版本仓储
    pub version_repo: Arc<PlanVersionRepository>,
    /// 操作日志仓储
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl PlanRepositories {
    /// 基于共享连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            plan_repo: Arc::new(MediaPlanRepository::new(conn.clone())),
            line_repo: Arc::new(MediaLineRepository::new(conn.clone())),
            asset_repo: Arc::new(LineAssetRepository::new(conn.clone())),
            distribution_repo: Arc::new(BudgetDistributionRepository::new(conn.clone())),
            version_repo: Arc::new(PlanVersionRepository::new(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::new(conn)),
        }
    }
}
