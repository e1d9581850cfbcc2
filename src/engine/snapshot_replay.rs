// ==========================================
// 媒体计划预算核心 - 版本快照回放
// ==========================================
// 红线: 恢复时保留原始ID (投放行与分配节点), 不重新生成
// 红线: 恢复前后各记录一个版本, 恢复本身可逆
// 红线: 分配节点按深度插入 (先父后子)
// ==========================================
// 注: 跨仓储无事务, 中途失败由调用方重新恢复
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::distribution::sort_by_depth;
use crate::domain::plan::{PlanSnapshot, PlanVersion};
use crate::engine::repositories::PlanRepositories;
use crate::repository::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

// ==========================================
// SnapshotReplayError - 回放错误
// ==========================================
#[derive(Error, Debug)]
pub enum SnapshotReplayError {
    #[error("计划不存在: {0}")]
    PlanNotFound(String),

    #[error("版本不存在: {0}")]
    VersionNotFound(String),

    #[error("版本 {version_id} 不属于计划 {plan_id}")]
    VersionPlanMismatch { version_id: String, plan_id: String },

    #[error("快照解析失败: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type SnapshotReplayResult<T> = Result<T, SnapshotReplayError>;

// ==========================================
// RestoreResult - 恢复结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreResult {
    /// 被恢复的版本
    pub restored_version_id: String,
    /// 恢复前状态的版本
    pub before_version_id: String,
    /// 恢复后状态的版本
    pub after_version_id: String,
    pub lines_restored: usize,
    pub distributions_restored: usize,
}

// ==========================================
// SnapshotReplayEngine - 快照回放引擎
// ==========================================
pub struct SnapshotReplayEngine {
    repos: PlanRepositories,
}

impl SnapshotReplayEngine {
    pub fn new(repos: PlanRepositories) -> Self {
        Self { repos }
    }

    /// 记录计划当前状态为新版本
    pub fn capture_version(
        &self,
        plan_id: &str,
        note: Option<String>,
        operator: &str,
    ) -> SnapshotReplayResult<PlanVersion> {
        let version = self.capture(plan_id, note, operator)?;

        self.repos.action_log_repo.insert(&ActionLog::new(
            plan_id,
            ActionType::CaptureVersion,
            operator,
            Some(serde_json::json!({
                "version_id": version.version_id,
                "version_no": version.version_no,
            })),
            version.note.clone(),
        ))?;

        Ok(version)
    }

    /// 恢复计划到指定版本
    ///
    /// # 流程
    /// 1. 加载目标版本并校验归属
    /// 2. 记录当前状态 (恢复前)
    /// 3. 删除计划的分配节点与投放行
    /// 4. 按原始ID重建投放行, 再按深度重建分配节点
    /// 5. 恢复计划的预算/日期/层级顺序
    /// 6. 记录恢复后状态
    /// 7. 写入操作日志
    pub fn restore_version(
        &self,
        plan_id: &str,
        version_id: &str,
        operator: &str,
    ) -> SnapshotReplayResult<RestoreResult> {
        let target = self
            .repos
            .version_repo
            .find_by_id(version_id)?
            .ok_or_else(|| SnapshotReplayError::VersionNotFound(version_id.to_string()))?;

        if target.plan_id != plan_id {
            return Err(SnapshotReplayError::VersionPlanMismatch {
                version_id: version_id.to_string(),
                plan_id: plan_id.to_string(),
            });
        }

        let snapshot: PlanSnapshot = target
            .snapshot()
            .map_err(|e| SnapshotReplayError::InvalidSnapshot(e.to_string()))?;

        info!(
            plan_id = %plan_id,
            version_id = %version_id,
            version_no = target.version_no,
            "开始恢复计划版本"
        );

        let before = self.capture(
            plan_id,
            Some(format!("恢复前 (目标版本 v{})", target.version_no)),
            operator,
        )?;

        self.repos.distribution_repo.delete_plan_rows(plan_id)?;
        self.repos.line_repo.delete_by_plan(plan_id)?;

        let lines_restored = self.repos.line_repo.batch_insert(&snapshot.lines)?;
        let ordered = sort_by_depth(&snapshot.distributions);
        let distributions_restored = match self.repos.distribution_repo.insert_with_ids(&ordered) {
            Ok(count) => count,
            Err(e) => {
                warn!(plan_id = %plan_id, version_id = %version_id, error = %e, "分配节点恢复失败");
                return Err(e.into());
            }
        };

        self.repos.plan_repo.update_budget_fields(
            plan_id,
            snapshot.total_budget,
            snapshot.start_date,
            snapshot.end_date,
            &snapshot.hierarchy_order,
        )?;

        let after = self.capture(
            plan_id,
            Some(format!("恢复后 (目标版本 v{})", target.version_no)),
            operator,
        )?;

        self.repos.action_log_repo.insert(&ActionLog::new(
            plan_id,
            ActionType::RestoreVersion,
            operator,
            Some(serde_json::json!({
                "restored_version_id": target.version_id,
                "before_version_id": before.version_id,
                "after_version_id": after.version_id,
                "lines_restored": lines_restored,
                "distributions_restored": distributions_restored,
            })),
            Some(format!("恢复到版本 v{}", target.version_no)),
        ))?;

        info!(
            plan_id = %plan_id,
            lines = lines_restored,
            distributions = distributions_restored,
            "计划版本恢复完成"
        );

        Ok(RestoreResult {
            restored_version_id: target.version_id,
            before_version_id: before.version_id,
            after_version_id: after.version_id,
            lines_restored,
            distributions_restored,
        })
    }

    /// 计划的全部版本 (版本号降序)
    pub fn list_versions(&self, plan_id: &str) -> SnapshotReplayResult<Vec<PlanVersion>> {
        Ok(self.repos.version_repo.find_by_plan_id(plan_id)?)
    }

    fn capture(
        &self,
        plan_id: &str,
        note: Option<String>,
        operator: &str,
    ) -> SnapshotReplayResult<PlanVersion> {
        let plan = self
            .repos
            .plan_repo
            .find_by_id(plan_id)?
            .ok_or_else(|| SnapshotReplayError::PlanNotFound(plan_id.to_string()))?;
        let lines = self.repos.line_repo.find_by_plan(plan_id)?;
        let distributions = self.repos.distribution_repo.find_by_plan(plan_id)?;

        let now = chrono::Local::now().naive_local();
        let snapshot = PlanSnapshot::capture(&plan, lines, distributions, now);
        let snapshot_json = serde_json::to_string(&snapshot)
            .map_err(|e| SnapshotReplayError::InvalidSnapshot(e.to_string()))?;

        let mut version = PlanVersion {
            version_id: uuid::Uuid::new_v4().to_string(),
            plan_id: plan_id.to_string(),
            version_no: 0,
            snapshot_json,
            note,
            created_by: Some(operator.to_string()),
            created_at: now,
        };
        self.repos
            .version_repo
            .create_with_next_version_no(&mut version)?;

        Ok(version)
    }
}
